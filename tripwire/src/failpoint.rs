//! A single named injection point.

use crate::sequence::{ActionSequence, Outcome};
use crate::term::{Term, TermError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Mixes the enable generation into the failpoint seed.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// A named slot holding at most one active [`ActionSequence`].
///
/// Call sites keep the `Arc<Failpoint>` returned by
/// [`Registry::register`](crate::Registry::register) and fire through it, so
/// the hot path only ever takes this failpoint's own lock.
#[derive(Debug)]
pub struct Failpoint {
    name: String,
    seed: u64,
    generation: AtomicU64,
    hits: AtomicU64,
    active: Mutex<Option<ActionSequence>>,
}

impl Failpoint {
    /// Create a disabled failpoint.
    pub fn new(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            seed,
            generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            active: Mutex::new(None),
        }
    }

    /// The name this failpoint was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parse `term` and make it the active sequence.
    ///
    /// On a parse error the current sequence stays in place.
    pub fn enable(&self, term: &str) -> Result<(), TermError> {
        let parsed = Term::parse(term)?;
        self.install(term, parsed);
        Ok(())
    }

    pub(crate) fn install(&self, desc: &str, term: Term) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let seed = self.seed ^ generation.wrapping_mul(SEED_STRIDE);
        let sequence = ActionSequence::new(desc, term, seed);
        let mut active = self.active.lock();
        *active = Some(sequence);
        self.hits.store(0, Ordering::Relaxed);
    }

    /// Drop the active sequence. Returns `false` if there was none.
    pub fn disable(&self) -> bool {
        self.active.lock().take().is_some()
    }

    /// Whether a term is active.
    pub fn is_enabled(&self) -> bool {
        self.active.lock().is_some()
    }

    /// The verbatim text of the active term.
    pub fn status(&self) -> Option<String> {
        self.active
            .lock()
            .as_ref()
            .map(|s| s.description().to_string())
    }

    /// Number of firings that applied an action since the last enable.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Evaluate the active term once.
    ///
    /// Returns `None` when disabled. The lock is released before anything
    /// is logged.
    pub fn fire(&self) -> Option<Outcome> {
        let step = {
            let mut active = self.active.lock();
            let step = active.as_mut()?.step();
            if step.is_hit() {
                self.hits.fetch_add(1, Ordering::Relaxed);
            }
            step
        };

        Some(step.into_outcome(Some(&self.name)))
    }
}
