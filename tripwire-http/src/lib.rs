//! # tripwire-http
//!
//! HTTP/1.1 control plane for [`tripwire`] failpoints, built on hyper.
//!
//! ```bash
//! curl -s localhost:1234/                          # name=term for every failpoint
//! curl -s -H 'accept: application/json' localhost:1234/
//! curl -X PUT -d '3*return("eio")' localhost:1234/wal::fsync
//! curl -s localhost:1234/wal::fsync                # 3*return("eio")
//! curl -s localhost:1234/wal::fsync/count          # hits since enable
//! curl -X DELETE localhost:1234/wal::fsync
//! curl -X PUT -d 'a=off;b=50%sleep(1s)' localhost:1234/
//! ```
//!
//! Status codes: 200/204 on success, 400 for a bad term or body, 404 for an
//! unknown or disabled failpoint, 405 for an unsupported method.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

/// Error types.
pub mod error;
/// HTTP to control request mapping.
pub mod route;
/// The hyper server.
pub mod server;

pub use error::{HttpError, HttpResult};
pub use route::{route, RouteError};
pub use server::{bind, serve, spawn, spawn_from_env, ServerHandle};
