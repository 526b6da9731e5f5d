//! Error type shared by every sender

use std::io;
use std::path::PathBuf;

/// Failure of a send operation
///
/// A peer closing the connection is not represented here; senders report it as a
/// successful [`StreamOutcome::PeerClosed`](crate::StreamOutcome::PeerClosed).
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The file could not be opened or its metadata could not be read
    #[error("failed to open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The byte source reported an error while being read
    #[error("byte source failed: {0}")]
    Source(#[source] io::Error),

    #[error("failed to serialize JSON body: {0}")]
    Json(#[from] serde_json::Error),

    /// No canonical reason phrase exists for this code
    #[error("unknown status code: {0}")]
    UnknownStatus(u16),

    /// Status or header changed after the response head was committed
    #[error("response head already sent")]
    HeadersSent,

    #[error("invalid header: {0}")]
    Header(#[from] hyper::http::Error),

    /// Download path without a final segment to use as the file name
    #[error("path '{}' has no file name", .0.display())]
    NoFileName(PathBuf),

    /// The writer was dropped before it committed a response head
    #[error("response writer dropped before sending a head")]
    Abandoned,
}

pub type Result<T, E = SendError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_error_names_path() {
        let err = SendError::Open {
            path: PathBuf::from("/srv/missing.txt"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let msg = err.to_string();
        assert!(msg.contains("/srv/missing.txt"), "got: {msg}");
    }

    #[test]
    fn test_unknown_status_message() {
        assert_eq!(
            SendError::UnknownStatus(599).to_string(),
            "unknown status code: 599"
        );
    }
}
