//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: finds the route for the request path,
//! runs its sender in a separate task and returns the response as soon as the
//! sender has committed a head.

use crate::config::{AppState, RouteAction};
use crate::logger::{self, AccessLogEntry};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response, StatusCode};
use respond::http::{ReadOptions, ResponseWriter, Truncated};
use respond::{send, SendError, StreamOutcome};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Body type handed to hyper
pub type BoxBody = UnsyncBoxBody<Bytes, Truncated>;

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>, Infallible> {
    let started = Instant::now();
    let (parts, _body) = req.into_parts();
    let mut entry = state
        .config
        .logging
        .access_log
        .then(|| AccessLogEntry::from_request(&parts, peer_addr));
    let req = Request::from_parts(parts, ());
    let action = state.routes.get(req.uri().path()).cloned();

    let (mut res, pending) = ResponseWriter::new();
    tokio::spawn(async move {
        if let Err(err) = dispatch(&req, &mut res, action.as_ref()).await {
            logger::log_error(&format!("{} {}: {err}", req.method(), req.uri().path()));
            send_internal_error(&mut res).await;
        }
    });

    let response = match pending.await {
        Ok(response) => response.map(BodyExt::boxed_unsync),
        Err(err) => {
            logger::log_error(&format!("No response produced: {err}"));
            build_500_response()
        }
    };

    if let Some(entry) = entry.as_mut() {
        entry.record_response(response.status().as_u16(), response.headers(), started.elapsed());
        logger::log_access(entry, state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Run the sender bound to a route; unmatched paths get a bare 404
async fn dispatch(
    req: &Request<()>,
    res: &mut ResponseWriter,
    action: Option<&RouteAction>,
) -> respond::Result<()> {
    let Some(action) = action else {
        return send::status(res, 404).await;
    };

    match action {
        RouteAction::Json { value } => send::json(res, value).await,
        RouteAction::Redirect { target, code } => {
            let code = StatusCode::from_u16(*code).map_err(|_| SendError::UnknownStatus(*code))?;
            send::redirect_with_code(req, res, target, code).await
        }
        RouteAction::Status { code } => send::status(res, *code).await,
        RouteAction::File { file, start, end } => {
            let opts = if start.is_some() || end.is_some() {
                ReadOptions::new().range(start.unwrap_or(0), *end)
            } else {
                ReadOptions::new()
            };
            let outcome = send::file(res, file, opts).await?;
            log_outcome(req, outcome);
            Ok(())
        }
        RouteAction::Download { file } => {
            let outcome = send::download(res, file, ReadOptions::new()).await?;
            log_outcome(req, outcome);
            Ok(())
        }
    }
}

fn log_outcome(req: &Request<()>, outcome: StreamOutcome) {
    if outcome == StreamOutcome::PeerClosed {
        logger::log_peer_closed(req.uri().path());
    }
}

/// Replace whatever the failed sender left behind with a 500, if nothing was sent yet
async fn send_internal_error(res: &mut ResponseWriter) {
    if res.reset().is_ok() {
        if let Err(err) = send::status(res, 500).await {
            logger::log_error(&format!("Failed to send 500 response: {err}"));
        }
    }
}

fn full(body: impl Into<Bytes>) -> BoxBody {
    Full::new(body.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Build 500 Internal Server Error response
fn build_500_response() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .body(full("Internal Server Error"))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build 500 response: {e}"));
            Response::new(full(Bytes::new()))
        })
}
