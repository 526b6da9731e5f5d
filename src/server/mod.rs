// Server module entry point
// Accept loop, per-connection serving and listener setup

pub mod connection;
pub mod listener;

use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::AppState;
use crate::logger;

pub use listener::create_reusable_listener;

/// Accept connections until Ctrl-C
///
/// Connections already being served keep running in their own tasks.
pub async fn run(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => match accept_result {
                Ok((stream, peer_addr)) => connection::accept_connection(stream, peer_addr, &state),
                Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
            },
            signal = &mut shutdown => {
                signal?;
                logger::log_shutdown();
                return Ok(());
            }
        }
    }
}
