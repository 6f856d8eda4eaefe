//! Debounced re-flow after the canvas is resized.
//!
//! Every resize restarts a quiet period; the text is re-flowed only once no
//! resize arrived for [`RELAYOUT_DEBOUNCE_MS`]. Time is passed in so the state
//! machine can be driven deterministically.

use crate::constants::RELAYOUT_DEBOUNCE_MS;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
enum RelayoutState {
    /// Nothing to do
    Idle,
    /// A re-flow to `width` is due at `deadline`
    Pending {
        /// Width requested by the last resize
        width: f32,
        /// When the quiet period ends
        deadline: Instant,
    },
}

/// Resize debouncer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelayoutScheduler {
    state: RelayoutState,
    delay: Duration,
}

impl Default for RelayoutScheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(RELAYOUT_DEBOUNCE_MS))
    }
}

impl RelayoutScheduler {
    /// Creates an idle scheduler with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            state: RelayoutState::Idle,
            delay,
        }
    }

    /// Whether a re-flow is waiting.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, RelayoutState::Pending { .. })
    }

    /// Records a resize to `width`, restarting the quiet period.
    pub fn request(&mut self, width: f32, now: Instant) {
        self.state = RelayoutState::Pending {
            width,
            deadline: now + self.delay,
        };
    }

    /// Returns the width to re-flow to once the quiet period is over.
    pub fn poll(&mut self, now: Instant) -> Option<f32> {
        match self.state {
            RelayoutState::Pending { width, deadline } if now >= deadline => {
                self.state = RelayoutState::Idle;
                Some(width)
            }
            _ => None,
        }
    }

    /// Takes a pending width immediately, regardless of the deadline.
    pub fn flush(&mut self) -> Option<f32> {
        match std::mem::replace(&mut self.state, RelayoutState::Idle) {
            RelayoutState::Pending { width, .. } => Some(width),
            RelayoutState::Idle => None,
        }
    }

    /// Time left before the pending re-flow, if any.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        match self.state {
            RelayoutState::Pending { deadline, .. } => Some(deadline.saturating_duration_since(now)),
            RelayoutState::Idle => None,
        }
    }
}
