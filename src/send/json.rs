use super::end_body;
use crate::error::Result;
use crate::http::ResponseWriter;
use bytes::Bytes;
use hyper::header::CONTENT_TYPE;
use serde::Serialize;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Send `value` as a JSON body
///
/// The value is serialized before anything touches the response, so a
/// serialization failure leaves the response untouched.
pub async fn json<T>(res: &mut ResponseWriter, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(value)?;
    res.set_header(CONTENT_TYPE, JSON_CONTENT_TYPE)?;
    end_body(res, Bytes::from(body)).await;
    Ok(())
}
