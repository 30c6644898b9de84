//! HTTP/1.1 server for the control plane.
//!
//! ```text
//! test harness                          process under test
//! ────────────                          ──────────────────
//! PUT /db::commit  "3*return(1)"  ──►   route() ──► ControlPlane::handle()
//!                                                        │
//!                  204 No Content ◄──   render() ◄───────┘
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, ACCEPT, ALLOW, CONTENT_TYPE};
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tripwire::{Bootstrap, ControlPlane, ControlRequest, ControlResponse, Registry};

use crate::error::{HttpError, HttpResult};
use crate::route::{route, RouteError};

const TEXT: &str = "text/plain; charset=utf-8";
const JSON: &str = "application/json";

/// Bind a listener for the control plane.
pub async fn bind(addr: &str) -> HttpResult<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| HttpError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Serve the control plane on `listener` until `shutdown` resolves.
///
/// Each connection runs on its own task; connections still open when
/// shutdown fires are left to finish on their own.
pub async fn serve<F>(listener: TcpListener, registry: Registry, shutdown: F) -> HttpResult<()>
where
    F: Future<Output = ()>,
{
    let plane = ControlPlane::new(registry);
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, "control plane listening");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!(addr = %local, "control plane shutting down");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                let plane = plane.clone();
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req| {
                        let plane = plane.clone();
                        async move { Ok::<_, Infallible>(handle(&plane, req).await) }
                    });
                    if let Err(e) = hyper::server::conn::http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        tracing::debug!(%peer, error = %e, "control connection ended with error");
                    }
                });
            }
        }
    }
}

/// A control plane running on a background task.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<HttpResult<()>>,
}

impl ServerHandle {
    /// The address the server is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for the accept loop to exit.
    pub async fn shutdown(self) -> HttpResult<()> {
        let _ = self.shutdown.send(());
        self.task.await?
    }
}

/// Run [`serve`] on a background task.
pub fn spawn(listener: TcpListener, registry: Registry) -> HttpResult<ServerHandle> {
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();
    let task = tokio::spawn(serve(listener, registry, async move {
        let _ = rx.await;
    }));
    Ok(ServerHandle {
        addr,
        shutdown: tx,
        task,
    })
}

/// Start the control plane if [`tripwire::HTTP_ENV`] names an address.
pub async fn spawn_from_env(registry: Registry) -> HttpResult<Option<ServerHandle>> {
    match Bootstrap::http_addr_from_env() {
        Some(addr) => {
            let listener = bind(&addr).await?;
            spawn(listener, registry).map(Some)
        }
        None => Ok(None),
    }
}

async fn handle(plane: &ControlPlane, req: Request<Incoming>) -> Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => return text(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let wants_json = parts
        .headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains(JSON));

    let request = match route(&parts.method, parts.uri.path(), &body, wants_json) {
        Ok(request) => request,
        Err(RouteError::MethodNotAllowed { allow }) => {
            let mut resp = text(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
            resp.headers_mut()
                .insert(ALLOW, HeaderValue::from_static(allow));
            return resp;
        }
        Err(RouteError::BadRequest(message)) => return text(StatusCode::BAD_REQUEST, message),
    };

    let json = request == ControlRequest::Snapshot;
    render(plane.handle(request), json)
}

fn render(response: ControlResponse, json: bool) -> Response<Full<Bytes>> {
    let status =
        StatusCode::from_u16(response.status.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut resp = Response::new(Full::new(Bytes::from(response.body)));
    *resp.status_mut() = status;
    if status != StatusCode::NO_CONTENT {
        let content_type = if json && status.is_success() { JSON } else { TEXT };
        resp.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    resp
}

fn text(status: StatusCode, body: impl Into<String>) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::from(body.into())));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT));
    resp
}
