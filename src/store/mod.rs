//! Record store module
//!
//! In-memory mapping from car id to record. Every read and write goes
//! through a single mutex, held only for the map access itself.

mod car;

pub use car::{seed_cars, Car};

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Thread-safe in-memory car store
#[derive(Debug, Default)]
pub struct CarStore {
    cars: Mutex<HashMap<String, Car>>,
}

impl CarStore {
    /// Create a store holding the startup seed records
    pub fn with_seed() -> Self {
        let cars = seed_cars()
            .into_iter()
            .map(|car| (car.id.clone(), car))
            .collect();
        Self {
            cars: Mutex::new(cars),
        }
    }

    /// Snapshot of all records, copied under one lock acquisition.
    ///
    /// Order is unspecified.
    pub fn list(&self) -> Vec<Car> {
        self.lock().values().cloned().collect()
    }

    /// Look up a record by id
    pub fn get(&self, id: &str) -> Option<Car> {
        self.lock().get(id).cloned()
    }

    /// Insert or overwrite the record at `car.id`, returning the replaced one
    pub fn put(&self, car: Car) -> Option<Car> {
        self.lock().insert(car.id.clone(), car)
    }

    /// Number of distinct ids stored
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    // Writers never leave the map half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Car>> {
        self.cars.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
