//! Response writer
//!
//! A writable handle over an outbound hyper response. The writer and its
//! [`PendingResponse`] are created together: the handler hands the pending half back
//! to hyper, the writer half goes to whatever produces the body. The head (status and
//! headers) is committed on the first body write or on `end`, after which status and
//! headers are frozen.
//!
//! Body chunks travel through a bounded channel, so a slow transport suspends the
//! writer instead of buffering the payload.

use crate::error::{Result, SendError};
use bytes::Bytes;
use hyper::body::{Body, Frame, SizeHint};
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH};
use hyper::{Response, StatusCode};
use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::sync::{mpsc, oneshot};

/// Number of body chunks buffered between writer and transport
pub const DEFAULT_CAPACITY: usize = 8;

/// The body can no longer accept data
///
/// Either the peer went away (the transport dropped the body) or the writer was
/// already ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("response body closed")]
pub struct Closed;

/// The writer went away after sending the head without ending the body
///
/// Yielded by [`ResponseBody`] so the transport aborts the response instead of
/// presenting a cut-off body as complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("response writer dropped before ending the body")]
pub struct Truncated;

/// How an ended response left the writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The transport pulled the final body frame
    Finished,
    /// The transport dropped the body before reaching its end
    PeerClosed,
}

struct Head {
    status: StatusCode,
    headers: HeaderMap,
}

/// Writable handle over an in-progress response
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    head_tx: Option<oneshot::Sender<Head>>,
    body_tx: Option<mpsc::Sender<Bytes>>,
    ended_tx: Option<oneshot::Sender<()>>,
    finished_rx: Option<oneshot::Receiver<()>>,
    completion: Option<Completion>,
}

impl ResponseWriter {
    /// Create a writer with the default channel capacity
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Self, PendingResponse) {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a writer buffering at most `chunks` body chunks
    pub fn with_capacity(chunks: usize) -> (Self, PendingResponse) {
        let (head_tx, head_rx) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::channel(chunks.max(1));
        let (ended_tx, ended_rx) = oneshot::channel();
        let (finished_tx, finished_rx) = oneshot::channel();

        let writer = Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            head_tx: Some(head_tx),
            body_tx: Some(body_tx),
            ended_tx: Some(ended_tx),
            finished_rx: Some(finished_rx),
            completion: None,
        };
        let pending = PendingResponse {
            head_rx,
            body: Some(ResponseBody {
                rx: body_rx,
                ended_rx,
                ended: false,
                remaining: None,
                finished_tx: Some(finished_tx),
            }),
        };
        (writer, pending)
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Whether the head has been handed to the transport
    pub const fn headers_sent(&self) -> bool {
        self.head_tx.is_none()
    }

    pub fn set_status(&mut self, status: StatusCode) -> Result<()> {
        if self.headers_sent() {
            return Err(SendError::HeadersSent);
        }
        self.status = status;
        Ok(())
    }

    /// Set (replace) a header
    pub fn set_header<V>(&mut self, name: HeaderName, value: V) -> Result<()>
    where
        V: TryInto<HeaderValue>,
        V::Error: Into<hyper::http::Error>,
    {
        if self.headers_sent() {
            return Err(SendError::HeadersSent);
        }
        let value = value.try_into().map_err(Into::<hyper::http::Error>::into)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Drop every header and restore status 200, as long as nothing was sent
    pub fn reset(&mut self) -> Result<()> {
        if self.headers_sent() {
            return Err(SendError::HeadersSent);
        }
        self.status = StatusCode::OK;
        self.headers.clear();
        Ok(())
    }

    /// Write one body chunk, waiting while the transport buffer is full
    pub async fn write(&mut self, chunk: Bytes) -> Result<(), Closed> {
        self.commit_head()?;
        let tx = self.body_tx.as_ref().ok_or(Closed)?;
        if chunk.is_empty() {
            return Ok(());
        }
        tx.send(chunk).await.map_err(|_| Closed)
    }

    /// Commit the head if needed and close the body
    pub fn end(&mut self) {
        // A peer that is already gone has nothing left to receive.
        let _ = self.commit_head();
        // Marked before the channel closes so the body sees it with the final `None`.
        if let Some(tx) = self.ended_tx.take() {
            let _ = tx.send(());
        }
        self.body_tx = None;
    }

    /// Write a final chunk and close the body
    pub async fn end_with(&mut self, chunk: Bytes) -> Result<(), Closed> {
        let written = self.write(chunk).await;
        self.end();
        written
    }

    /// End the body and wait until the transport finished it or dropped it
    pub async fn finish(&mut self) -> Completion {
        self.end();
        if let Some(completion) = self.completion {
            return completion;
        }
        let completion = match self.finished_rx.take() {
            Some(rx) => {
                if rx.await.is_ok() {
                    Completion::Finished
                } else {
                    Completion::PeerClosed
                }
            }
            None => Completion::PeerClosed,
        };
        self.completion = Some(completion);
        completion
    }

    /// Resolves once the transport has dropped the body
    ///
    /// Pending forever after `end`; use [`finish`](Self::finish) to observe the
    /// outcome of an ended body.
    pub async fn closed(&self) {
        match &self.body_tx {
            Some(tx) => tx.closed().await,
            None => std::future::pending().await,
        }
    }

    fn commit_head(&mut self) -> Result<(), Closed> {
        let Some(head_tx) = self.head_tx.take() else {
            return Ok(());
        };
        let head = Head {
            status: self.status,
            headers: self.headers.clone(),
        };
        head_tx.send(head).map_err(|_| Closed)
    }
}

/// Future resolving to the hyper response once the writer commits its head
///
/// Fails with [`SendError::Abandoned`] when the writer is dropped first.
pub struct PendingResponse {
    head_rx: oneshot::Receiver<Head>,
    body: Option<ResponseBody>,
}

impl Future for PendingResponse {
    type Output = Result<Response<ResponseBody>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        let Ok(head) = ready!(Pin::new(&mut this.head_rx).poll(cx)) else {
            return Poll::Ready(Err(SendError::Abandoned));
        };
        let Some(mut body) = this.body.take() else {
            return Poll::Ready(Err(SendError::Abandoned));
        };

        body.remaining = head
            .headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let mut response = Response::new(body);
        *response.status_mut() = head.status;
        *response.headers_mut() = head.headers;
        Poll::Ready(Ok(response))
    }
}

/// Body half of a [`ResponseWriter`]
///
/// Signals `finished` back to the writer when it yields its last frame: either the
/// declared `content-length` has been produced or the writer ended the body. A writer
/// dropped without ending the body yields [`Truncated`] instead of a clean end.
pub struct ResponseBody {
    rx: mpsc::Receiver<Bytes>,
    ended_rx: oneshot::Receiver<()>,
    ended: bool,
    remaining: Option<u64>,
    finished_tx: Option<oneshot::Sender<()>>,
}

impl ResponseBody {
    fn mark_finished(&mut self) {
        if let Some(tx) = self.finished_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Body for ResponseBody {
    type Data = Bytes;
    type Error = Truncated;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        if this.remaining == Some(0) {
            this.mark_finished();
            return Poll::Ready(None);
        }

        match ready!(this.rx.poll_recv(cx)) {
            Some(chunk) => {
                if let Some(remaining) = this.remaining.as_mut() {
                    let len = u64::try_from(chunk.len()).unwrap_or(u64::MAX);
                    *remaining = remaining.saturating_sub(len);
                    if *remaining == 0 {
                        this.mark_finished();
                    }
                }
                Poll::Ready(Some(Ok(Frame::data(chunk))))
            }
            None => {
                this.ended = this.ended || this.ended_rx.try_recv().is_ok();
                if !this.ended {
                    return Poll::Ready(Some(Err(Truncated)));
                }
                this.mark_finished();
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.remaining == Some(0)
    }

    fn size_hint(&self) -> SizeHint {
        self.remaining.map_or_else(SizeHint::default, SizeHint::with_exact)
    }
}
