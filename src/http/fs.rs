//! File-backed byte source
//!
//! Opens a file once and reads its size from the opened descriptor, so the size that
//! ends up in `content-length` belongs to the same file the bytes are read from.

use bytes::Bytes;
use futures_util::Stream;
use std::io::{self, SeekFrom};
use std::path::Path;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeekExt, ReadBuf};

/// Default read chunk size (64 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Options for reading a file into a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    start: u64,
    end: Option<u64>,
    chunk_size: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            start: 0,
            end: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict reading to bytes `start..=end` (`None` reads to the end of the file)
    #[must_use]
    pub const fn range(mut self, start: u64, end: Option<u64>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Largest chunk handed to the response in one write
    #[must_use]
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Resolve `(offset, length)` against the actual file size
    ///
    /// A range starting at or past the end of the file selects nothing, and an end
    /// beyond the file is clamped to its last byte.
    pub fn span(&self, file_size: u64) -> (u64, u64) {
        if self.start >= file_size {
            return (file_size, 0);
        }
        let last = self.end.map_or(file_size - 1, |e| e.min(file_size - 1));
        if last < self.start {
            return (self.start, 0);
        }
        (self.start, last - self.start + 1)
    }
}

/// Readable byte source over a file
///
/// Yields chunks of at most the configured chunk size. Dropping it closes the
/// file handle.
pub struct FileSource {
    file: File,
    remaining: u64,
    buf: Vec<u8>,
}

impl FileSource {
    pub async fn open(path: impl AsRef<Path>, opts: &ReadOptions) -> io::Result<Self> {
        let mut file = File::open(path).await?;
        let metadata = file.metadata().await?;
        if metadata.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "path is a directory",
            ));
        }

        let (offset, len) = opts.span(metadata.len());
        if offset > 0 && len > 0 {
            file.seek(SeekFrom::Start(offset)).await?;
        }

        Ok(Self {
            file,
            remaining: len,
            buf: vec![0; opts.chunk_size],
        })
    }

    /// Bytes left to read
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl Stream for FileSource {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.remaining == 0 {
            return Poll::Ready(None);
        }

        let want = usize::try_from(this.remaining).map_or(this.buf.len(), |r| r.min(this.buf.len()));
        let mut read_buf = ReadBuf::new(&mut this.buf[..want]);
        if let Err(e) = ready!(Pin::new(&mut this.file).poll_read(cx, &mut read_buf)) {
            this.remaining = 0;
            return Poll::Ready(Some(Err(e)));
        }

        let filled = read_buf.filled();
        if filled.is_empty() {
            // Truncated after open: the declared length can no longer be honoured.
            this.remaining = 0;
            return Poll::Ready(Some(Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "file shrank while streaming",
            ))));
        }

        this.remaining -= u64::try_from(filled.len()).unwrap_or(this.remaining);
        Poll::Ready(Some(Ok(Bytes::copy_from_slice(filled))))
    }
}
