//! Response senders for hyper
//!
//! Small helpers that write JSON bodies, redirects, status replies, streamed byte
//! sources and files into an in-progress HTTP response.
//!
//! ```no_run
//! use respond::{http::ResponseWriter, send};
//!
//! # async fn demo() -> respond::Result<()> {
//! let (mut res, pending) = ResponseWriter::new();
//! tokio::spawn(async move {
//!     let _ = send::json(&mut res, &serde_json::json!({ "beep": "boop" })).await;
//! });
//! let response = pending.await?;
//! assert_eq!(response.status(), 200);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod http;
pub mod send;

pub use error::{Result, SendError};
pub use send::StreamOutcome;
