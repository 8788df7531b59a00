//! Load lifecycle of one replacement element, without side effects.

use std::time::Duration;

use serde::Serialize;

use super::policy::{RetryDecision, RetryPolicy};

/// Where a replacement element is in its load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPhase {
    /// Attempt with `n` retries used so far (0 = first load).
    Attempting(u32),
    Succeeded,
    Exhausted,
    /// The element left the document before a scheduled retry ran, or the
    /// engine was torn down.
    Abandoned,
}

impl RetryPhase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RetryPhase::Attempting(_))
    }
}

/// What the owner must do after feeding an event to [`RetryState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Event did not apply to the current state.
    Ignored,
    /// Schedule a retry after the delay.
    ScheduleRetry(Duration),
    /// Restart the load now; the value is the new retry count.
    Restart(u32),
    /// Terminal state reached.
    Finished(RetryPhase),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    phase: RetryPhase,
    /// False while waiting for a scheduled retry.
    attempt_in_flight: bool,
    attempts_started: u32,
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryState {
    /// `Attempting(0)` with the first load in flight.
    pub fn new() -> Self {
        Self {
            phase: RetryPhase::Attempting(0),
            attempt_in_flight: true,
            attempts_started: 1,
        }
    }

    pub fn phase(&self) -> RetryPhase {
        self.phase
    }

    pub fn attempt_in_flight(&self) -> bool {
        self.attempt_in_flight
    }

    pub fn attempts_started(&self) -> u32 {
        self.attempts_started
    }

    pub fn on_loaded(&mut self) -> Transition {
        match self.phase {
            RetryPhase::Attempting(_) => self.finish(RetryPhase::Succeeded),
            _ => Transition::Ignored,
        }
    }

    pub fn on_failed(&mut self, policy: &RetryPolicy) -> Transition {
        match self.phase {
            // A second failure for the same attempt is a duplicate event.
            RetryPhase::Attempting(n) if self.attempt_in_flight => match policy.decide(n) {
                RetryDecision::RetryAfter(delay) => {
                    self.attempt_in_flight = false;
                    Transition::ScheduleRetry(delay)
                }
                RetryDecision::GiveUp => self.finish(RetryPhase::Exhausted),
            },
            _ => Transition::Ignored,
        }
    }

    /// The scheduled delay elapsed. `attached` tells whether the element is
    /// still part of the document.
    pub fn on_retry_due(&mut self, attached: bool) -> Transition {
        match self.phase {
            RetryPhase::Attempting(n) if !self.attempt_in_flight => {
                if !attached {
                    return self.finish(RetryPhase::Abandoned);
                }
                self.phase = RetryPhase::Attempting(n + 1);
                self.attempt_in_flight = true;
                self.attempts_started += 1;
                Transition::Restart(n + 1)
            }
            _ => Transition::Ignored,
        }
    }

    pub fn abandon(&mut self) -> Transition {
        if self.phase.is_terminal() {
            Transition::Ignored
        } else {
            self.finish(RetryPhase::Abandoned)
        }
    }

    fn finish(&mut self, phase: RetryPhase) -> Transition {
        self.phase = phase;
        self.attempt_in_flight = false;
        Transition::Finished(phase)
    }
}
