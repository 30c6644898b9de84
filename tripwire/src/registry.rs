//! Process-wide map of failpoints.
//!
//! The map sits behind one `RwLock`; every failpoint sits behind its own
//! `Mutex`. Structural operations (register, enable, disable, status, list)
//! go through the map lock, so they are linearizable with each other.
//! Firing through a handle never touches the map lock, so a hot failpoint
//! does not serialize unrelated ones.

use crate::bootstrap::{self, Bootstrap};
use crate::error::{Error, Result};
use crate::failpoint::Failpoint;
use crate::sequence::Outcome;
use crate::term::Term;
use parking_lot::{Mutex, RwLock};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Point-in-time view of one failpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailpointStatus {
    /// Registered name.
    pub name: String,
    /// Active term text, `None` when disabled.
    pub term: Option<String>,
    /// Firings that applied an action since the last enable.
    pub hits: u64,
}

#[derive(Debug)]
struct Inner {
    failpoints: RwLock<HashMap<String, Arc<Failpoint>>>,
    bootstrap: Bootstrap,
    seeder: Mutex<ChaCha8Rng>,
}

/// Owner of every failpoint in the process.
///
/// Cloning is cheap and every clone sees the same failpoints. Build one at
/// start-up and hand clones to whatever needs it (call sites, the control
/// plane).
#[derive(Debug, Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Registry with no pending terms and a random seed.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Add a failpoint under `name`, replacing any previous one.
    ///
    /// If start-up configuration has a term for `name`, the failpoint is
    /// already enabled with it when it becomes visible in the map.
    pub fn register(&self, name: impl Into<String>) -> Arc<Failpoint> {
        let name = name.into();
        let seed: u64 = self.inner.seeder.lock().random();
        let failpoint = Failpoint::new(name.clone(), seed);

        if let Some(term) = self.inner.bootstrap.pending(&name) {
            match Term::parse(term) {
                Ok(parsed) => {
                    failpoint.install(term, parsed);
                    tracing::debug!(failpoint = %name, term, "applied start-up term");
                }
                Err(e) => tracing::error!(failpoint = %name, term, error = %e, "start-up term rejected"),
            }
        }

        let failpoint = Arc::new(failpoint);
        let replaced = self
            .inner
            .failpoints
            .write()
            .insert(name.clone(), Arc::clone(&failpoint))
            .is_some();
        tracing::debug!(failpoint = %name, replaced, "registered failpoint");

        failpoint
    }

    /// Handle to a registered failpoint.
    pub fn get(&self, name: &str) -> Option<Arc<Failpoint>> {
        self.inner.failpoints.read().get(name).cloned()
    }

    /// Set the term of `name`, replacing the active one.
    ///
    /// A term that does not parse leaves the failpoint exactly as it was.
    pub fn enable(&self, name: &str, term: &str) -> Result<()> {
        if !self.inner.failpoints.read().contains_key(name) {
            return Err(Error::not_found(name));
        }

        let parsed = Term::parse(term).map_err(|e| {
            tracing::warn!(failpoint = %name, term, error = %e, "rejected term");
            e
        })?;

        let failpoints = self.inner.failpoints.write();
        let failpoint = failpoints.get(name).ok_or_else(|| Error::not_found(name))?;
        failpoint.install(term, parsed);
        tracing::debug!(failpoint = %name, term, "enabled failpoint");
        Ok(())
    }

    /// Apply a whole `name=term;...` block.
    ///
    /// Every name is checked and every term parsed before anything changes;
    /// one bad entry means nothing is applied. Returns how many failpoints
    /// were enabled.
    pub fn enable_many(&self, config: &str) -> Result<usize> {
        let pairs = bootstrap::parse_pairs(config).map_err(Error::MalformedBatch)?;
        {
            let failpoints = self.inner.failpoints.read();
            if let Some((name, _)) = pairs.iter().find(|(name, _)| !failpoints.contains_key(name)) {
                return Err(Error::not_found(name));
            }
        }

        let mut parsed = Vec::with_capacity(pairs.len());
        for (name, term) in pairs {
            let t = Term::parse(&term)?;
            parsed.push((name, term, t));
        }

        let failpoints = self.inner.failpoints.write();
        let mut targets = Vec::with_capacity(parsed.len());
        for (name, term, t) in parsed {
            let failpoint = failpoints.get(&name).ok_or_else(|| Error::not_found(&name))?;
            targets.push((failpoint, term, t));
        }
        let count = targets.len();
        for (failpoint, term, t) in targets {
            failpoint.install(&term, t);
        }
        tracing::debug!(count, "enabled failpoint batch");
        Ok(count)
    }

    /// Clear the term of `name`.
    pub fn disable(&self, name: &str) -> Result<()> {
        let failpoints = self.inner.failpoints.write();
        let failpoint = failpoints.get(name).ok_or_else(|| Error::not_found(name))?;
        if !failpoint.disable() {
            return Err(Error::not_enabled(name));
        }
        tracing::debug!(failpoint = %name, "disabled failpoint");
        Ok(())
    }

    /// Clear every active term. Returns how many were active.
    pub fn disable_all(&self) -> usize {
        let failpoints = self.inner.failpoints.write();
        let cleared = failpoints.values().filter(|fp| fp.disable()).count();
        tracing::debug!(cleared, "disabled all failpoints");
        cleared
    }

    /// The active term of `name`, exactly as it was passed to enable.
    pub fn status(&self, name: &str) -> Result<String> {
        let failpoints = self.inner.failpoints.read();
        let failpoint = failpoints.get(name).ok_or_else(|| Error::not_found(name))?;
        failpoint.status().ok_or_else(|| Error::not_enabled(name))
    }

    /// Firings of `name` that applied an action since it was last enabled.
    pub fn count(&self, name: &str) -> Result<u64> {
        let failpoints = self.inner.failpoints.read();
        let failpoint = failpoints.get(name).ok_or_else(|| Error::not_found(name))?;
        if !failpoint.is_enabled() {
            return Err(Error::not_enabled(name));
        }
        Ok(failpoint.hits())
    }

    /// Every registered name, enabled or not, in no particular order.
    pub fn list(&self) -> Vec<String> {
        self.inner.failpoints.read().keys().cloned().collect()
    }

    /// Status of every failpoint, sorted by name.
    pub fn snapshot(&self) -> Vec<FailpointStatus> {
        let mut statuses: Vec<FailpointStatus> = self
            .inner
            .failpoints
            .read()
            .values()
            .map(|fp| FailpointStatus {
                name: fp.name().to_string(),
                term: fp.status(),
                hits: fp.hits(),
            })
            .collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }

    /// Fire `name` by lookup.
    ///
    /// Returns `None` if the failpoint is unregistered or disabled. Call
    /// sites that fire often should keep the handle from
    /// [`register`](Self::register) instead.
    pub fn fire(&self, name: &str) -> Option<Outcome> {
        let failpoint = self.get(name)?;
        failpoint.fire()
    }
}

/// Configuration for a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    seed: Option<u64>,
    bootstrap: Bootstrap,
}

impl RegistryBuilder {
    /// Seed for probability draws. Without it the seed is random.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Terms to enable as their failpoints register.
    pub fn bootstrap(mut self, bootstrap: Bootstrap) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Build the registry.
    pub fn build(self) -> Registry {
        let seed = self.seed.unwrap_or_else(rand::random);
        Registry {
            inner: Arc::new(Inner {
                failpoints: RwLock::new(HashMap::new()),
                bootstrap: self.bootstrap,
                seeder: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            }),
        }
    }
}
