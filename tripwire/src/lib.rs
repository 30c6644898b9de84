//! # tripwire
//!
//! Failpoints you can flip at runtime.
//!
//! A failpoint is a named spot in production code where a test harness can
//! inject a failure: return early with a value, pause, panic, or just log.
//! What happens is described by a small [term language](term) and can be
//! changed while the process runs, from start-up configuration or through a
//! control plane.
//!
//! ## Core Components
//!
//! - [`Registry`]: owns every failpoint; enable, disable, status, list
//! - [`Failpoint`]: one injection point, fired from the call site
//! - [`ActionSequence`]: the stateful form of a term (counts, odds, chains)
//! - [`Bootstrap`]: `name=term;...` start-up configuration
//! - [`ControlPlane`]: request/response surface for remote control
//!
//! ## Quick Start
//!
//! ```rust
//! use tripwire::{Bootstrap, Outcome, Registry, Value};
//!
//! let registry = Registry::builder()
//!     .seed(7)
//!     .bootstrap(Bootstrap::parse("wal::fsync=2*return(\"eio\")").unwrap())
//!     .build();
//!
//! // Pending start-up terms apply as soon as the failpoint registers.
//! let fsync = registry.register("wal::fsync");
//! assert_eq!(fsync.fire(), Some(Outcome::Return(Value::Str("eio".into()))));
//!
//! registry.enable("wal::fsync", "25%sleep(10ms)").unwrap();
//! assert_eq!(registry.status("wal::fsync").unwrap(), "25%sleep(10ms)");
//!
//! registry.disable("wal::fsync").unwrap();
//! assert_eq!(fsync.fire(), None);
//! ```
//!
//! ## Outcomes
//!
//! | Outcome | Call site should |
//! |---------|------------------|
//! | `Return(v)` | return early, usually with an error built from `v` |
//! | `Delay(d)` | sleep for `d`, then carry on |
//! | `Panic(msg)` | panic |
//! | `Suppress` | carry on |
//! | `Exhausted` | carry on; the term ran out |
//!
//! The [`fail_point!`] and [`fail_point_async!`] macros do this handling.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

/// Start-up configuration.
pub mod bootstrap;
/// Transport-agnostic control requests.
pub mod control;
/// Error types.
pub mod error;
/// Individual failpoints.
pub mod failpoint;
/// Call-site macros.
mod macros;
/// The failpoint registry.
pub mod registry;
/// Stateful term evaluation.
pub mod sequence;
pub mod term;

pub use bootstrap::{Bootstrap, FAILPOINTS_ENV, HTTP_ENV};
pub use control::{ControlPlane, ControlRequest, ControlResponse, ControlStatus};
pub use error::{ConfigError, Error, Result};
pub use failpoint::Failpoint;
pub use registry::{FailpointStatus, Registry, RegistryBuilder};
pub use sequence::{ActionSequence, Outcome};
pub use term::{Action, Entry, Term, TermError, Value};
