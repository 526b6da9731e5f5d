//! Request handler module
//!
//! Maps request paths to the configured sender and turns its result into a hyper
//! response.

pub mod router;

// Re-export main entry point
pub use router::{handle_request, BoxBody};
