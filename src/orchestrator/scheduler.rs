//! Build scheduling state machine.
//!
//! `Idle -> Building -> (Success | Failed) -> Idle`. Triggers arm a single
//! debounce slot; a new trigger replaces the pending deadline instead of
//! queuing another build. At most one build is in flight. A build whose
//! inputs were changed by a trigger that arrived while it ran is stale:
//! its artifact is never rendered and the pending rebuild takes over.

use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Observable build state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
    Idle,
    Building,
    Success,
    Failed,
}

/// What to do with a finished build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Latest build: render it (or report its failure).
    Current,
    /// Superseded by a later trigger; drop the result.
    Stale,
}

#[derive(Debug)]
pub struct BuildScheduler {
    debounce: Duration,
    state: BuildState,
    deadline: Option<Instant>,
    generation: u64,
    in_flight: Option<u64>,
    superseded: bool,
    last_failure: Option<String>,
}

impl BuildScheduler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            state: BuildState::Idle,
            deadline: None,
            generation: 0,
            in_flight: None,
            superseded: false,
            last_failure: None,
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Generation of the most recently started build (0 before the first).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_building(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Diagnostic text of the last failed build, kept until a build succeeds.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    /// An edit: rebuild once `debounce` has passed without another edit.
    pub fn edit(&mut self, now: Instant) {
        self.arm(now + self.debounce);
    }

    /// Applied operations or an explicit rebuild: no quiet period.
    pub fn request(&mut self, now: Instant) {
        self.arm(now);
    }

    fn arm(&mut self, deadline: Instant) {
        if self.in_flight.is_some() {
            self.superseded = true;
        } else {
            self.state = BuildState::Idle;
        }
        self.deadline = Some(deadline);
    }

    /// Whether a build should start now.
    pub fn is_due(&self, now: Instant) -> bool {
        self.in_flight.is_none() && self.deadline.map_or(false, |d| d <= now)
    }

    /// Start a build, returning its generation. Clears the debounce slot.
    pub fn start(&mut self) -> u64 {
        self.deadline = None;
        self.superseded = false;
        self.generation += 1;
        self.in_flight = Some(self.generation);
        self.state = BuildState::Building;
        self.generation
    }

    /// Record the end of build `generation`.
    ///
    /// `failure` is the diagnostic text of a failed build.
    pub fn finish(&mut self, generation: u64, failure: Option<String>) -> Completion {
        if self.in_flight != Some(generation) {
            debug!("Ignoring completion of unknown build {}", generation);
            return Completion::Stale;
        }
        self.in_flight = None;

        if self.superseded {
            self.superseded = false;
            self.state = BuildState::Idle;
            return Completion::Stale;
        }

        match failure {
            Some(text) => {
                self.state = BuildState::Failed;
                self.last_failure = Some(text);
            }
            None => {
                self.state = BuildState::Success;
                self.last_failure = None;
            }
        }
        Completion::Current
    }
}
