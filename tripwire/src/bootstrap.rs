//! Start-up activation from configuration.
//!
//! The configuration is a single string:
//!
//! ```text
//! name=term[;name=term]*
//! ```
//!
//! usually taken from the `TRIPWIRE_FAILPOINTS` environment variable. Names
//! that are not registered yet stay pending and are enabled the moment they
//! register, so it does not matter which happens first.
//!
//! Terms cannot contain `;` or `=` in this form. Use the control plane to
//! install such terms.

use crate::error::{ConfigError, Error, Result};
use crate::term::Term;
use std::collections::HashMap;
use std::env::VarError;

/// Environment variable holding the start-up failpoint configuration.
pub const FAILPOINTS_ENV: &str = "TRIPWIRE_FAILPOINTS";

/// Environment variable holding the control plane listen address.
pub const HTTP_ENV: &str = "TRIPWIRE_HTTP";

/// Split a `name=term;...` string into pairs, in order.
///
/// Empty segments are skipped. A segment that does not split into exactly
/// one name and one term is an error.
pub fn parse_pairs(config: &str) -> std::result::Result<Vec<(String, String)>, ConfigError> {
    let mut pairs = Vec::new();
    for segment in config.split(';') {
        if segment.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = segment.split('=').collect();
        if parts.len() != 2 {
            return Err(ConfigError {
                entry: segment.to_string(),
                reason: format!("expected name=term, found {} '=' separated parts", parts.len()),
            });
        }
        let name = parts[0].trim();
        if name.is_empty() {
            return Err(ConfigError {
                entry: segment.to_string(),
                reason: "empty failpoint name".to_string(),
            });
        }
        pairs.push((name.to_string(), parts[1].trim().to_string()));
    }
    Ok(pairs)
}

/// Pending terms collected once at start-up.
#[derive(Debug, Clone, Default)]
pub struct Bootstrap {
    terms: HashMap<String, String>,
}

impl Bootstrap {
    /// No pending terms.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a configuration string.
    ///
    /// Every term is parsed here as well, so a broken term fails start-up
    /// instead of surfacing whenever its failpoint happens to register.
    /// When a name appears twice the last term wins.
    pub fn parse(config: &str) -> Result<Self> {
        let pairs = parse_pairs(config).map_err(Error::FatalBootstrapConfig)?;
        let mut terms = HashMap::with_capacity(pairs.len());
        for (name, term) in pairs {
            if let Err(e) = Term::parse(&term) {
                return Err(Error::FatalBootstrapConfig(ConfigError {
                    entry: format!("{name}={term}"),
                    reason: e.to_string(),
                }));
            }
            terms.insert(name, term);
        }
        Ok(Self { terms })
    }

    /// Read [`FAILPOINTS_ENV`]. An unset or blank variable means no terms;
    /// a value that is not UTF-8 is as fatal as a malformed one.
    pub fn from_env() -> Result<Self> {
        match std::env::var(FAILPOINTS_ENV) {
            Ok(config) if config.trim().is_empty() => Ok(Self::empty()),
            Ok(config) => {
                let bootstrap = Self::parse(&config)?;
                tracing::debug!(count = bootstrap.len(), "loaded failpoints from {FAILPOINTS_ENV}");
                Ok(bootstrap)
            }
            Err(VarError::NotPresent) => Ok(Self::empty()),
            Err(VarError::NotUnicode(raw)) => Err(Error::FatalBootstrapConfig(ConfigError {
                entry: raw.to_string_lossy().into_owned(),
                reason: format!("{FAILPOINTS_ENV} is not valid UTF-8"),
            })),
        }
    }

    /// Read [`HTTP_ENV`], the address the control plane should listen on.
    pub fn http_addr_from_env() -> Option<String> {
        std::env::var(HTTP_ENV)
            .ok()
            .filter(|addr| !addr.trim().is_empty())
    }

    /// The pending term for `name`.
    pub fn pending(&self, name: &str) -> Option<&str> {
        self.terms.get(name).map(String::as_str)
    }

    /// Number of pending terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
