//! Mapping between HTTP requests and control requests.
//!
//! | Method | Path            | Control request |
//! |--------|-----------------|-----------------|
//! | GET    | `/`             | `List` (or `Snapshot` with `Accept: application/json`) |
//! | PUT    | `/`             | `PutMany` with the body as `name=term;...` |
//! | GET    | `/{name}`       | `Get` |
//! | GET    | `/{name}/count` | `Count` |
//! | PUT    | `/{name}`       | `Put` with the body as the term |
//! | DELETE | `/{name}`       | `Delete` |

use hyper::Method;
use tripwire::ControlRequest;

const COUNT_SUFFIX: &str = "/count";

/// Why a request could not be turned into a control request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The method is not served on this path.
    MethodNotAllowed {
        /// Value for the `Allow` header.
        allow: &'static str,
    },
    /// The path or body is not usable.
    BadRequest(String),
}

/// Translate an HTTP request into a control request.
pub fn route(
    method: &Method,
    path: &str,
    body: &[u8],
    wants_json: bool,
) -> Result<ControlRequest, RouteError> {
    let raw = path.trim_start_matches('/');

    if raw.is_empty() {
        return match *method {
            Method::GET if wants_json => Ok(ControlRequest::Snapshot),
            Method::GET => Ok(ControlRequest::List),
            Method::PUT => Ok(ControlRequest::PutMany {
                config: body_text(body)?,
            }),
            _ => Err(RouteError::MethodNotAllowed { allow: "GET, PUT" }),
        };
    }

    // Matched before decoding so `%2Fcount` stays part of the name.
    if let Some(name) = raw.strip_suffix(COUNT_SUFFIX) {
        return match *method {
            Method::GET => Ok(ControlRequest::Count {
                name: decode_path(name)?,
            }),
            _ => Err(RouteError::MethodNotAllowed { allow: "GET" }),
        };
    }

    let key = decode_path(raw)?;
    match *method {
        Method::GET => Ok(ControlRequest::Get { name: key }),
        Method::PUT => Ok(ControlRequest::Put {
            name: key,
            term: body_text(body)?,
        }),
        Method::DELETE => Ok(ControlRequest::Delete { name: key }),
        _ => Err(RouteError::MethodNotAllowed {
            allow: "GET, PUT, DELETE",
        }),
    }
}

/// Body as UTF-8, without the line ending `curl --data-binary` tends to add.
fn body_text(body: &[u8]) -> Result<String, RouteError> {
    let text = std::str::from_utf8(body)
        .map_err(|_| RouteError::BadRequest("body is not valid UTF-8".to_string()))?;
    Ok(text.trim_end_matches(['\r', '\n']).to_string())
}

/// Decode `%XX` escapes in a path segment.
fn decode_path(raw: &str) -> Result<String, RouteError> {
    let bad = || RouteError::BadRequest(format!("malformed path {raw:?}"));
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3).ok_or_else(bad)?;
            let hex = std::str::from_utf8(hex).map_err(|_| bad())?;
            out.push(u8::from_str_radix(hex, 16).map_err(|_| bad())?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| bad())
}
