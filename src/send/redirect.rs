use super::end_body;
use crate::error::Result;
use crate::http::ResponseWriter;
use bytes::Bytes;
use hyper::header::LOCATION;
use hyper::{Method, Request, StatusCode};

/// Redirect to `location` with 302 Found
pub async fn redirect<B>(req: &Request<B>, res: &mut ResponseWriter, location: &str) -> Result<()> {
    redirect_with_code(req, res, location, StatusCode::FOUND).await
}

/// Redirect to `location` with an explicit status code
///
/// The body is `-> <location>`, or empty when answering a HEAD request.
pub async fn redirect_with_code<B>(
    req: &Request<B>,
    res: &mut ResponseWriter,
    location: &str,
    code: StatusCode,
) -> Result<()> {
    res.set_header(LOCATION, location)?;
    res.set_status(code)?;
    let body = if req.method() == Method::HEAD {
        Bytes::new()
    } else {
        Bytes::from(format!("-> {location}"))
    };
    end_body(res, body).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn request(method: Method) -> Request<()> {
        Request::builder().method(method).uri("/redirect").body(()).unwrap()
    }

    #[tokio::test]
    async fn test_redirect_get() {
        let (mut res, pending) = ResponseWriter::new();
        redirect(&request(Method::GET), &mut res, "https://example.com/")
            .await
            .unwrap();

        let response = pending.await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "https://example.com/");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"-> https://example.com/");
    }

    #[tokio::test]
    async fn test_redirect_head_has_empty_body() {
        let (mut res, pending) = ResponseWriter::new();
        redirect(&request(Method::HEAD), &mut res, "https://example.com/")
            .await
            .unwrap();

        let response = pending.await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "https://example.com/");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_redirect_with_code() {
        let (mut res, pending) = ResponseWriter::new();
        redirect_with_code(
            &request(Method::GET),
            &mut res,
            "/moved",
            StatusCode::MOVED_PERMANENTLY,
        )
        .await
        .unwrap();

        let response = pending.await.unwrap();
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[LOCATION], "/moved");
    }

    #[tokio::test]
    async fn test_invalid_location_leaves_status_alone() {
        let (mut res, _pending) = ResponseWriter::new();
        let result = redirect(&request(Method::GET), &mut res, "/a\r\nb").await;
        assert!(result.is_err());
        assert_eq!(res.status(), StatusCode::OK);
        assert!(!res.headers_sent());
    }
}
