//! `/cars` resource handler
//!
//! Dispatches on method and the `id` query parameter to list, get-by-id or
//! create. The store lock is taken only for the map access; JSON encoding and
//! body reads happen outside it.

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use percent_encoding::percent_decode_str;
use std::error::Error as StdError;

use crate::http;
use crate::logger;
use crate::store::{Car, CarStore};

/// Body of a successful create
pub const CREATED_MESSAGE: &str = "The item was added";

/// Request handler owning the record store
pub struct CarHandler {
    store: CarStore,
    max_body_size: u64,
}

impl CarHandler {
    pub const fn new(store: CarStore, max_body_size: u64) -> Self {
        Self {
            store,
            max_body_size,
        }
    }

    pub const fn store(&self) -> &CarStore {
        &self.store
    }

    /// Handle one request to the car resource
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        match *req.method() {
            Method::GET => match query_id(req.uri()).map(String::from_utf8) {
                Some(Ok(id)) => self.get_by_id(&id),
                // Stored ids are always UTF-8, so a non-UTF-8 id cannot match
                Some(Err(e)) => http::build_text_response(StatusCode::NOT_FOUND, e.into_bytes()),
                None => self.list(),
            },
            Method::POST => self.create(req).await,
            _ => {
                logger::log_warning(&format!("Method not allowed on /cars: {}", req.method()));
                http::build_405_response()
            }
        }
    }

    /// All records as a JSON array, ordered by id
    pub fn list(&self) -> Response<Full<Bytes>> {
        let mut cars = self.store.list();
        cars.sort_by(|a, b| a.id.cmp(&b.id));
        encode_json(&cars)
    }

    /// One record as a JSON object, or 404 with the id as body
    pub fn get_by_id(&self, id: &str) -> Response<Full<Bytes>> {
        match self.store.get(id) {
            Some(car) => encode_json(&car),
            None => http::build_text_response(StatusCode::NOT_FOUND, id.to_string()),
        }
    }

    /// Decode one record from the body and store it, overwriting any record
    /// with the same id
    pub async fn create<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        if let Some(resp) = check_body_size(req.headers(), self.max_body_size) {
            return resp;
        }

        let limit = usize::try_from(self.max_body_size).unwrap_or(usize::MAX);
        let body = match Limited::new(req.into_body(), limit).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.is::<LengthLimitError>() => {
                logger::log_warning(&format!("Request body exceeds {limit} bytes"));
                return http::build_413_response();
            }
            Err(e) => {
                logger::log_error(&format!("Failed to read request body: {e}"));
                return http::build_500_response(&e.to_string());
            }
        };

        // A JSON `null` body decodes to the zero record
        let car = match serde_json::from_slice::<Option<Car>>(&body) {
            Ok(car) => car.unwrap_or_default(),
            Err(e) => {
                logger::log_warning(&format!("Rejected car body: {e}"));
                return http::build_text_response(StatusCode::BAD_REQUEST, e.to_string());
            }
        };

        self.store.put(car);
        http::build_text_response(StatusCode::OK, CREATED_MESSAGE)
    }
}

/// Raw bytes of the first `id` query parameter, form-decoded; `None` when
/// absent or empty
fn query_id(uri: &Uri) -> Option<Vec<u8>> {
    uri.query()?
        .split('&')
        .find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (form_decode(key) == b"id").then(|| form_decode(value))
        })
        .filter(|id| !id.is_empty())
}

/// `application/x-www-form-urlencoded` decoding without UTF-8 replacement
fn form_decode(raw: &str) -> Vec<u8> {
    percent_decode_str(&raw.replace('+', " ")).collect()
}

/// Encode a JSON success response; an encoding failure is the whole response
fn encode_json<T: serde::Serialize>(value: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(value) {
        Ok(json) => http::build_json_response(StatusCode::OK, json),
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            http::build_500_response(&e.to_string())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = headers.get(hyper::header::CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}
