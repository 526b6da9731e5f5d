//! HTTP layer
//!
//! The response handle the senders write into, and the file-backed byte source
//! that file sends stream from.

pub mod fs;
pub mod writer;

pub use fs::{FileSource, ReadOptions};
pub use writer::{Closed, Completion, PendingResponse, ResponseBody, ResponseWriter, Truncated};
