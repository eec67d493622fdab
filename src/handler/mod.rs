//! Request handler module
//!
//! Responsible for request routing dispatch and the car resource logic.

pub mod cars;
pub mod router;

// Re-export main entry points
pub use cars::CarHandler;
pub use router::handle_request;
