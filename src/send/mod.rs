//! Response senders
//!
//! Stateless helpers that fill a [`ResponseWriter`](crate::http::ResponseWriter).
//! `stream` is the shared primitive; `file` and `download` call through it.

mod file;
mod json;
mod redirect;
mod status;
mod stream;

pub use file::{content_disposition, download, file};
pub use json::{json, JSON_CONTENT_TYPE};
pub use redirect::{redirect, redirect_with_code};
pub use status::{reason_phrase, status};
pub use stream::{stream, StreamOutcome};

use crate::http::ResponseWriter;
use bytes::Bytes;

/// Write a complete body and end the response
///
/// A peer that left before the body went out is not a failure of the sender.
async fn end_body(res: &mut ResponseWriter, body: Bytes) {
    if res.end_with(body).await.is_err() {
        tracing::debug!("peer closed the response before the body was written");
    }
}
