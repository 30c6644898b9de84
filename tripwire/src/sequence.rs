//! Stateful evaluation of a parsed term.
//!
//! An [`ActionSequence`] walks the entries of a [`Term`] one firing at a time.
//! The cursor only moves when a counted entry uses up its count; an entry
//! without a count holds the cursor for good. Probability draws that miss
//! leave every counter where it was.

use crate::term::{Action, Entry, Term, TermError, Value};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// What a call site should do after firing its failpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Return early with this value.
    Return(Value),
    /// Pause for this long, then carry on.
    Delay(Duration),
    /// Panic with this message.
    Panic(String),
    /// Carry on as normal; the term fired but asked for nothing.
    Suppress,
    /// The term has run out of entries; behave as if disabled.
    Exhausted,
}

impl Outcome {
    /// Perform a delay or panic on the current thread.
    ///
    /// Returns the value of a `Return` outcome, `None` otherwise.
    pub fn apply_blocking(self) -> Option<Value> {
        match self {
            Outcome::Return(value) => Some(value),
            Outcome::Delay(d) => {
                std::thread::sleep(d);
                None
            }
            Outcome::Panic(msg) => panic!("{msg}"),
            Outcome::Suppress | Outcome::Exhausted => None,
        }
    }

    /// Like [`apply_blocking`](Self::apply_blocking), sleeping on the tokio timer.
    pub async fn apply_async(self) -> Option<Value> {
        match self {
            Outcome::Delay(d) => {
                tokio::time::sleep(d).await;
                None
            }
            other => other.apply_blocking(),
        }
    }
}

/// Result of one step, before the owning failpoint decorates it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Step {
    Applied(Outcome),
    Panicked(Option<String>),
    Printed(Option<String>),
    Missed,
    Exhausted,
}

impl Step {
    /// Whether an entry applied its action on this step.
    pub(crate) fn is_hit(&self) -> bool {
        !matches!(self, Step::Missed | Step::Exhausted)
    }

    /// Resolve into what the call site sees. `print` is logged here, so
    /// call it with no lock held.
    pub(crate) fn into_outcome(self, failpoint: Option<&str>) -> Outcome {
        let failpoint = failpoint.unwrap_or("<unnamed>");
        match self {
            Step::Applied(outcome) => outcome,
            Step::Panicked(msg) => {
                Outcome::Panic(msg.unwrap_or_else(|| format!("failpoint {failpoint} panicked")))
            }
            Step::Printed(msg) => {
                tracing::info!(failpoint, "{}", msg.as_deref().unwrap_or("failpoint fired"));
                Outcome::Suppress
            }
            Step::Missed => Outcome::Suppress,
            Step::Exhausted => Outcome::Exhausted,
        }
    }
}

/// A term plus the cursor, counters and RNG that drive it.
#[derive(Debug, Clone)]
pub struct ActionSequence {
    desc: String,
    entries: Vec<Entry>,
    remaining: Vec<Option<u64>>,
    cursor: usize,
    looping: bool,
    rng: ChaCha8Rng,
}

impl ActionSequence {
    /// Build a sequence from an already parsed term.
    ///
    /// `desc` is the text the term was parsed from; it is kept verbatim for
    /// status queries. `seed` drives probability draws.
    pub fn new(desc: impl Into<String>, term: Term, seed: u64) -> Self {
        let looping = term.is_looping();
        let entries = term.entries().to_vec();
        let remaining = entries.iter().map(|e| e.count).collect();
        Self {
            desc: desc.into(),
            entries,
            remaining,
            cursor: 0,
            looping,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Parse `desc` and build a sequence from it.
    pub fn parse(desc: &str, seed: u64) -> Result<Self, TermError> {
        Ok(Self::new(desc, Term::parse(desc)?, seed))
    }

    /// The original term text.
    pub fn description(&self) -> &str {
        &self.desc
    }

    /// Index of the current entry; equal to the entry count once exhausted.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Uses left on the current entry, `None` if it is uncounted or exhausted.
    pub fn remaining(&self) -> Option<u64> {
        self.remaining.get(self.cursor).copied().flatten()
    }

    /// Evaluate one firing.
    ///
    /// `print` entries are logged here and come back as
    /// [`Outcome::Suppress`].
    pub fn fire(&mut self) -> Outcome {
        self.step().into_outcome(None)
    }

    pub(crate) fn step(&mut self) -> Step {
        if self.cursor >= self.entries.len() {
            if !self.looping || self.entries.is_empty() {
                return Step::Exhausted;
            }
            self.rewind();
        }

        let entry = &self.entries[self.cursor];
        if let Some(p) = entry.probability {
            let draw: f64 = self.rng.random_range(0.0..100.0);
            if draw >= p {
                return Step::Missed;
            }
        }
        let action = entry.action.clone();

        if let Some(left) = self.remaining[self.cursor].as_mut() {
            *left -= 1;
            if *left == 0 {
                self.cursor += 1;
            }
        }

        match action {
            Action::Off => Step::Applied(Outcome::Suppress),
            Action::Return(value) => Step::Applied(Outcome::Return(value)),
            Action::Sleep(d) => Step::Applied(Outcome::Delay(d)),
            Action::Panic(msg) => Step::Panicked(msg),
            Action::Print(msg) => Step::Printed(msg),
        }
    }

    fn rewind(&mut self) {
        self.cursor = 0;
        for (left, entry) in self.remaining.iter_mut().zip(&self.entries) {
            *left = entry.count;
        }
    }
}
