//! Stream-to-response bridging
//!
//! Copies a byte source into a response body while watching for the three ways a
//! transfer can end: the source runs dry and the response finishes, the source
//! fails, or the peer goes away. Whichever happens first decides the outcome; the
//! watchers for the other two are dropped with it.

use crate::error::{Result, SendError};
use crate::http::{Completion, ResponseWriter};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::io;

/// Successful end of a streamed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Every byte reached the transport
    Completed,
    /// The peer closed the connection; the source was dropped unread
    PeerClosed,
}

impl From<Completion> for StreamOutcome {
    fn from(completion: Completion) -> Self {
        match completion {
            Completion::Finished => Self::Completed,
            Completion::PeerClosed => Self::PeerClosed,
        }
    }
}

/// Stream every chunk of `source` into the response body, in order
///
/// The source is owned by this call and dropped as soon as the outcome is known,
/// which on peer close means no further reads and a released file handle. A source
/// error is returned as [`SendError::Source`] with the response left as it is: if no
/// chunk was written yet the head is still uncommitted and the caller may send
/// something else.
pub async fn stream<S>(res: &mut ResponseWriter, mut source: S) -> Result<StreamOutcome>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    loop {
        let next = tokio::select! {
            biased;
            () = res.closed() => None,
            item = source.next() => Some(item),
        };

        match next {
            None => return Ok(cancel(source)),
            Some(Some(Ok(chunk))) => {
                if res.write(chunk).await.is_err() {
                    return Ok(cancel(source));
                }
            }
            Some(Some(Err(err))) => {
                tracing::warn!(error = %err, "byte source failed while streaming response");
                return Err(SendError::Source(err));
            }
            Some(None) => break,
        }
    }

    drop(source);
    Ok(res.finish().await.into())
}

fn cancel<S>(source: S) -> StreamOutcome {
    drop(source);
    tracing::debug!("peer closed the response, byte source dropped");
    StreamOutcome::PeerClosed
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use http_body_util::BodyExt;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::{Context, Poll};

    /// Source that never ends and records reads and drop
    struct Endless {
        reads: Arc<AtomicUsize>,
        dropped: Arc<AtomicBool>,
    }

    impl Stream for Endless {
        type Item = io::Result<Bytes>;

        fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Poll::Ready(Some(Ok(Bytes::from_static(b"hi"))))
        }
    }

    impl Drop for Endless {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = io::Result<Bytes>> + Unpin {
        let items: Vec<io::Result<Bytes>> = parts.iter().map(|p| Ok(Bytes::from_static(p))).collect();
        stream::iter(items)
    }

    #[tokio::test]
    async fn test_stream_completes_in_order() {
        let (mut res, pending) = ResponseWriter::new();
        let task = tokio::spawn(async move {
            stream(&mut res, chunks(&[b"one ", b"two ", b"three"])).await
        });

        let body = pending.await.unwrap().into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"one two three");
        assert_eq!(task.await.unwrap().unwrap(), StreamOutcome::Completed);
    }

    #[tokio::test]
    async fn test_backpressure_limits_reads() {
        let reads = Arc::new(AtomicUsize::new(0));
        let dropped = Arc::new(AtomicBool::new(false));
        let source = Endless {
            reads: Arc::clone(&reads),
            dropped: Arc::clone(&dropped),
        };

        let (mut res, pending) = ResponseWriter::with_capacity(2);
        let task = tokio::spawn(async move { stream(&mut res, source).await });
        let response = pending.await.unwrap();

        // Nobody is draining the body, so the writer stalls once the channel is full.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let stalled = reads.load(Ordering::SeqCst);
        assert!(stalled <= 4, "source read {stalled} times without a consumer");

        drop(response);
        assert_eq!(task.await.unwrap().unwrap(), StreamOutcome::PeerClosed);
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_peer_close_cancels_source() {
        let reads = Arc::new(AtomicUsize::new(0));
        let dropped = Arc::new(AtomicBool::new(false));
        let source = Endless {
            reads: Arc::clone(&reads),
            dropped: Arc::clone(&dropped),
        };

        let (mut res, pending) = ResponseWriter::new();
        let task = tokio::spawn(async move { stream(&mut res, source).await });

        let mut body = pending.await.unwrap().into_body();
        let frame = body.frame().await.unwrap().unwrap();
        assert_eq!(frame.into_data().unwrap(), Bytes::from_static(b"hi"));
        drop(body);

        assert_eq!(task.await.unwrap().unwrap(), StreamOutcome::PeerClosed);
        assert!(dropped.load(Ordering::SeqCst));

        let after_cancel = reads.load(Ordering::SeqCst);
        tokio::task::yield_now().await;
        assert_eq!(reads.load(Ordering::SeqCst), after_cancel);
    }

    #[tokio::test]
    async fn test_peer_gone_before_head() {
        let dropped = Arc::new(AtomicBool::new(false));
        let source = Endless {
            reads: Arc::new(AtomicUsize::new(0)),
            dropped: Arc::clone(&dropped),
        };

        let (mut res, pending) = ResponseWriter::new();
        drop(pending);
        assert_eq!(stream(&mut res, source).await.unwrap(), StreamOutcome::PeerClosed);
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_error_before_data_fails_without_finishing() {
        let failing = stream::iter(vec![Err::<Bytes, _>(io::Error::other("boom"))]);
        let (mut res, pending) = ResponseWriter::new();

        let err = stream(&mut res, failing).await.unwrap_err();
        assert!(matches!(err, SendError::Source(_)));
        assert!(!res.headers_sent());

        // The caller still owns the response and decides what to send.
        res.end_with(Bytes::from_static(b"caught")).await.unwrap();
        let body = pending.await.unwrap().into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"caught");
    }

    #[tokio::test]
    async fn test_error_mid_stream_keeps_partial_body() {
        let items = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::other("disk went away")),
        ];
        let (mut res, pending) = ResponseWriter::new();

        let err = stream(&mut res, stream::iter(items)).await.unwrap_err();
        assert!(matches!(err, SendError::Source(_)));
        assert!(res.headers_sent());
        res.end();

        let body = pending.await.unwrap().into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"partial");
    }

    #[tokio::test]
    async fn test_empty_source_completes() {
        let (mut res, pending) = ResponseWriter::new();
        let task = tokio::spawn(async move { stream(&mut res, chunks(&[])).await });

        let body = pending.await.unwrap().into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
        assert_eq!(task.await.unwrap().unwrap(), StreamOutcome::Completed);
    }
}
