//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: path matching, dispatch to the
//! car handler, server header and access logging.

use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Request, Response};
use std::convert::Infallible;
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Path of the car resource
pub const CARS_PATH: &str = "/cars";

enum Route {
    Health,
    Cars,
    NotFound,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let started = Instant::now();
    let access_log = state.config.logging.access_log;
    let mut entry = access_log.then(|| AccessLogEntry::from_request(&req, peer_addr));

    let route = match_route(req.uri().path(), &state);
    let mut response = match route {
        Route::Health => http::build_health_response("ok"),
        Route::Cars => state.cars.handle(req).await,
        Route::NotFound => http::build_404_response(),
    };
    http::set_server_header(&mut response, &state.config.http.server_name);

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

fn match_route(path: &str, state: &AppState) -> Route {
    let health = &state.config.health;
    if health.enabled && path == health.liveness_path {
        Route::Health
    } else if path == CARS_PATH {
        Route::Cars
    } else {
        Route::NotFound
    }
}
