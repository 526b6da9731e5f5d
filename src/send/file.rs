use super::stream::{stream, StreamOutcome};
use crate::error::{Result, SendError};
use crate::http::{FileSource, ReadOptions, ResponseWriter};
use hyper::header::{CONTENT_DISPOSITION, CONTENT_LENGTH};
use std::path::Path;

/// Stream a file as the response body, with `content-length` set
///
/// The length comes from the opened descriptor, not from a separate lookup of the
/// path. Failing to open the file returns [`SendError::Open`] before any header is
/// set; writing an error response is left to the caller.
pub async fn file(
    res: &mut ResponseWriter,
    path: impl AsRef<Path>,
    opts: ReadOptions,
) -> Result<StreamOutcome> {
    let path = path.as_ref();
    let source = FileSource::open(path, &opts)
        .await
        .map_err(|source| SendError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    res.set_header(CONTENT_LENGTH, source.remaining())?;
    stream(res, source).await
}

/// Send a file as an attachment named after its final path segment
pub async fn download(
    res: &mut ResponseWriter,
    path: impl AsRef<Path>,
    opts: ReadOptions,
) -> Result<StreamOutcome> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .ok_or_else(|| SendError::NoFileName(path.to_path_buf()))?;

    res.set_header(
        CONTENT_DISPOSITION,
        content_disposition(&name.to_string_lossy()),
    )?;
    file(res, path, opts).await
}

/// `attachment; filename="<name>"` with double quotes escaped
///
/// Only `"` is escaped. No percent-encoding or `filename*` parameter is produced.
pub fn content_disposition(filename: &str) -> String {
    format!("attachment; filename=\"{}\"", filename.replace('"', "\\\""))
}
