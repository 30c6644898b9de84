//! Transport-agnostic control plane.
//!
//! Each [`ControlRequest`] maps to exactly one [`Registry`] call and the
//! result is rendered back as a status plus a text body. Transports (see
//! the `tripwire-http` crate) only translate their own requests into these.

use crate::error::Error;
use crate::registry::Registry;

/// An inbound control operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    /// Read the active term of a failpoint.
    Get {
        /// Failpoint name.
        name: String,
    },
    /// Enable a failpoint with a term.
    Put {
        /// Failpoint name.
        name: String,
        /// Term text.
        term: String,
    },
    /// Disable a failpoint.
    Delete {
        /// Failpoint name.
        name: String,
    },
    /// Every registered failpoint as `name=term` lines.
    List,
    /// Hit count of a failpoint.
    Count {
        /// Failpoint name.
        name: String,
    },
    /// Enable several failpoints from a `name=term;...` block.
    PutMany {
        /// The block.
        config: String,
    },
    /// Every failpoint as JSON.
    Snapshot,
}

/// Outcome class of a control operation, with conventional HTTP codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStatus {
    /// 200
    Ok,
    /// 204
    NoContent,
    /// 400
    BadRequest,
    /// 404
    NotFound,
    /// 500
    Internal,
}

impl ControlStatus {
    /// The HTTP-style status code.
    pub fn code(self) -> u16 {
        match self {
            ControlStatus::Ok => 200,
            ControlStatus::NoContent => 204,
            ControlStatus::BadRequest => 400,
            ControlStatus::NotFound => 404,
            ControlStatus::Internal => 500,
        }
    }
}

impl From<&Error> for ControlStatus {
    fn from(err: &Error) -> Self {
        match err {
            Error::NotFound { .. } | Error::NotEnabled { .. } => ControlStatus::NotFound,
            Error::InvalidTerm(_)
            | Error::MalformedBatch(_)
            | Error::FatalBootstrapConfig(_) => ControlStatus::BadRequest,
        }
    }
}

/// Status plus body of a handled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlResponse {
    /// Outcome class.
    pub status: ControlStatus,
    /// Text body.
    pub body: String,
}

impl ControlResponse {
    fn ok(body: impl Into<String>) -> Self {
        Self {
            status: ControlStatus::Ok,
            body: body.into(),
        }
    }

    fn no_content() -> Self {
        Self {
            status: ControlStatus::NoContent,
            body: String::new(),
        }
    }

    fn error(err: &Error) -> Self {
        Self {
            status: err.into(),
            body: err.to_string(),
        }
    }
}

/// Serves control requests against an injected registry.
#[derive(Debug, Clone)]
pub struct ControlPlane {
    registry: Registry,
}

impl ControlPlane {
    /// Control plane over `registry`.
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// The registry being controlled.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handle one request.
    pub fn handle(&self, request: ControlRequest) -> ControlResponse {
        tracing::debug!(?request, "control request");
        match request {
            ControlRequest::Get { name } => match self.registry.status(&name) {
                Ok(term) => ControlResponse::ok(term),
                Err(e) => ControlResponse::error(&e),
            },
            ControlRequest::Put { name, term } => match self.registry.enable(&name, &term) {
                Ok(()) => ControlResponse::no_content(),
                Err(e) => ControlResponse::error(&e),
            },
            ControlRequest::Delete { name } => match self.registry.disable(&name) {
                Ok(()) => ControlResponse::no_content(),
                Err(e) => ControlResponse::error(&e),
            },
            ControlRequest::List => {
                let body: String = self
                    .registry
                    .snapshot()
                    .into_iter()
                    .map(|s| format!("{}={}\n", s.name, s.term.unwrap_or_default()))
                    .collect();
                ControlResponse::ok(body)
            }
            ControlRequest::Count { name } => match self.registry.count(&name) {
                Ok(hits) => ControlResponse::ok(hits.to_string()),
                Err(e) => ControlResponse::error(&e),
            },
            ControlRequest::PutMany { config } => match self.registry.enable_many(&config) {
                Ok(_) => ControlResponse::no_content(),
                Err(e) => ControlResponse::error(&e),
            },
            ControlRequest::Snapshot => match serde_json::to_string(&self.registry.snapshot()) {
                Ok(json) => ControlResponse::ok(json),
                Err(e) => ControlResponse {
                    status: ControlStatus::Internal,
                    body: e.to_string(),
                },
            },
        }
    }
}
