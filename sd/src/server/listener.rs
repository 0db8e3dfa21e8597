//! HTTP listener for JSON-RPC requests
//!
//! Every path and method reach the same handler. The body is read by its
//! declared length and each response closes the connection.

use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, header};
use axum::middleware::map_response;
use axum::response::{Json, Response};
use eyre::{Context, Result};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use super::port::{RECLAIM_GRACE, reclaim_port};
use crate::rpc::{Dispatcher, RpcResponse};

/// Bind the listen address, optionally reclaiming a port in use
pub async fn bind(addr: SocketAddr, reclaim: bool) -> Result<TcpListener> {
    debug!(%addr, reclaim, "bind: called");
    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(e) if e.kind() == ErrorKind::AddrInUse && reclaim => {
            warn!(%addr, "Address in use, reclaiming port");
            let pids = reclaim_port(addr.port())?;
            if pids.is_empty() {
                return Err(e).context(format!("Address {} in use and no owning process found", addr));
            }
            tokio::time::sleep(RECLAIM_GRACE).await;
            TcpListener::bind(addr)
                .await
                .context(format!("Failed to bind {} after reclaiming port", addr))
        }
        Err(e) if e.kind() == ErrorKind::AddrInUse => Err(e).context(format!(
            "Address {} already in use (enable reclaim-port to take it over)",
            addr
        )),
        Err(e) => Err(e).context(format!("Failed to bind {}", addr)),
    }
}

async fn handle_rpc(State(dispatcher): State<Dispatcher>, body: Bytes) -> Json<RpcResponse> {
    debug!(len = body.len(), "handle_rpc: called");
    Json(dispatcher.handle_body(&body).await)
}

/// One request per connection, including rejected ones
async fn close_connection(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

/// Router sending every request to the dispatcher
pub fn router(dispatcher: Dispatcher, max_body_bytes: usize) -> Router {
    Router::new()
        .fallback(handle_rpc)
        .with_state(dispatcher)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(map_response(close_connection))
        .layer(TraceLayer::new_for_http())
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, dispatcher: Dispatcher, max_body_bytes: usize, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("Failed to read listener address")?;
    info!(%addr, "Listening for JSON-RPC requests");

    axum::serve(listener, router(dispatcher, max_body_bytes))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    info!("Listener stopped");
    Ok(())
}
