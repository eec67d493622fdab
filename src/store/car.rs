// Car record type and startup seed data

use serde::{Deserialize, Serialize};

/// A single car record, keyed by `id` in the store.
///
/// Missing fields deserialize to their zero value; no field is validated.
/// Field names are also accepted capitalised or upper-case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Car {
    #[serde(alias = "Id", alias = "ID")]
    pub id: String,
    #[serde(alias = "Manufacturer", alias = "MANUFACTURER")]
    pub manufacturer: String,
    #[serde(alias = "Model", alias = "MODEL")]
    pub model: String,
    #[serde(alias = "Year", alias = "YEAR")]
    pub year: i64,
    #[serde(alias = "Power", alias = "POWER")]
    pub power: i64,
    #[serde(alias = "Color", alias = "COLOR")]
    pub color: String,
}

impl Car {
    pub fn new(
        id: &str,
        manufacturer: &str,
        model: &str,
        year: i64,
        power: i64,
        color: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            manufacturer: manufacturer.to_string(),
            model: model.to_string(),
            year,
            power,
            color: color.to_string(),
        }
    }
}

/// Records loaded into the store at startup
pub fn seed_cars() -> Vec<Car> {
    vec![
        Car::new("1", "Tesla", "Model X", 2022, 1020, "Matte Black"),
        Car::new("2", "Ford", "Focus RS", 2016, 345, "Blue"),
        Car::new("3", "Subaru", "Impreza", 2010, 305, "Metalic Silver"),
    ]
}
