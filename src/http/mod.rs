//! HTTP protocol layer module
//!
//! Response builders shared by the request handlers, decoupled from the
//! record store.

pub mod response;

// Re-export commonly used builders
pub use response::{
    build_404_response, build_405_response, build_413_response, build_500_response,
    build_health_response, build_json_response, build_text_response, set_server_header,
};
