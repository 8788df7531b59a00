//! Bounded retry of replacement media loads.
//!
//! Each replacement element gets a [`RetryController`] when it is created.
//! Failures are retried after a fixed delay until the [`RetryPolicy`] budget
//! runs out; the element is then removed from the document. The
//! [`InFlightTargets`] set guarantees at most one live controller per target
//! locator.

mod controller;
mod in_flight;
mod policy;
mod registry;
mod state;

use std::time::Duration;

use crate::dom::NodeId;

pub use controller::RetryController;
pub use in_flight::InFlightTargets;
pub use policy::{
    FailureKind, RetryDecision, RetryPolicy, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY,
};
pub use registry::{LoadOutcome, RetryOutcome, RetryRegistry, DEFAULT_HISTORY};
pub use state::{RetryPhase, RetryState, Transition};

/// Handle for a scheduled retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub(crate) u64);

/// Timer primitive the controllers schedule retries on.
pub trait RetryTimers {
    /// Arrange for a retry-due notification for `node` after `delay`.
    fn schedule_retry(&mut self, delay: Duration, node: NodeId) -> TimerId;

    /// Cancel a scheduled retry. Unknown or already fired ids are ignored.
    fn cancel(&mut self, id: TimerId);
}
