use super::end_body;
use crate::error::{Result, SendError};
use crate::http::ResponseWriter;
use bytes::Bytes;
use hyper::StatusCode;

/// Canonical reason phrase for a status code, if it has one
pub fn reason_phrase(code: u16) -> Option<&'static str> {
    StatusCode::from_u16(code).ok()?.canonical_reason()
}

/// Send a bare status with its reason phrase as the body
///
/// Codes without a canonical reason phrase fail with
/// [`SendError::UnknownStatus`] before the response is touched, and so do 1xx codes,
/// which cannot be a final response. For 204 and 304 the status goes out but hyper
/// drops the reason-phrase body.
pub async fn status(res: &mut ResponseWriter, code: u16) -> Result<()> {
    let status = StatusCode::from_u16(code)
        .ok()
        .filter(|s| !s.is_informational())
        .ok_or(SendError::UnknownStatus(code))?;
    let reason = status
        .canonical_reason()
        .ok_or(SendError::UnknownStatus(code))?;
    res.set_status(status)?;
    end_body(res, Bytes::from_static(reason.as_bytes())).await;
    Ok(())
}
