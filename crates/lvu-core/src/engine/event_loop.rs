//! Single-threaded event queue with a virtual-clock timer heap.

use std::collections::{BinaryHeap, HashSet, VecDeque};
use std::time::Duration;

use crate::dom::NodeId;
use crate::retry::{LoadOutcome, RetryTimers, TimerId};

/// Notification waiting to be handled by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Initial document is ready.
    DocumentReady,
    /// Batch of structural changes.
    Mutations { records: usize },
    /// Media element finished a load attempt.
    Load { node: NodeId, outcome: LoadOutcome },
    /// Retry delay for a media element elapsed.
    RetryDue { node: NodeId },
}

/// Timer waiting to fire.
#[derive(Debug, Clone)]
struct TimerEvent {
    deadline: Duration,
    id: TimerId,
    node: NodeId,
}

impl PartialEq for TimerEvent {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.id == other.id
    }
}

impl Eq for TimerEvent {}

impl PartialOrd for TimerEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Min-heap: earliest deadline first, then scheduling order.
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// FIFO of ready events plus timers ordered by (deadline, scheduling order).
///
/// Time only moves through [`EventLoop::advance`]. Cancelled timers stay in
/// the heap and are skipped when they come due.
#[derive(Debug, Default)]
pub struct EventLoop {
    now: Duration,
    next_timer: u64,
    ready: VecDeque<Event>,
    timers: BinaryHeap<TimerEvent>,
    cancelled: HashSet<TimerId>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn push(&mut self, event: Event) {
        self.ready.push_back(event);
    }

    /// Queue a mutation batch, folding it into a batch already at the back of
    /// the queue.
    pub fn push_mutations(&mut self, records: usize) {
        if let Some(Event::Mutations { records: queued }) = self.ready.back_mut() {
            *queued += records;
            return;
        }
        self.ready.push_back(Event::Mutations { records });
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.ready.pop_front()
    }

    pub fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }

    /// Timers scheduled and neither fired nor cancelled.
    pub fn pending_timers(&self) -> usize {
        self.timers
            .iter()
            .filter(|t| !self.cancelled.contains(&t.id))
            .count()
    }

    /// Deadline of the earliest live timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers
            .iter()
            .filter(|t| !self.cancelled.contains(&t.id))
            .map(|t| t.deadline)
            .min()
    }

    /// Move the clock forward and queue every timer that came due, in
    /// deadline order. Returns how many fired.
    pub fn advance(&mut self, by: Duration) -> usize {
        self.now += by;
        let mut fired = 0;
        while let Some(timer) = self.timers.peek() {
            if timer.deadline > self.now {
                break;
            }
            let Some(timer) = self.timers.pop() else {
                break;
            };
            if self.cancelled.remove(&timer.id) {
                continue;
            }
            self.ready.push_back(Event::RetryDue { node: timer.node });
            fired += 1;
        }
        fired
    }

    /// Drop every timer. Returns how many were live.
    pub fn clear_timers(&mut self) -> usize {
        let live = self.pending_timers();
        self.timers.clear();
        self.cancelled.clear();
        live
    }
}

impl RetryTimers for EventLoop {
    fn schedule_retry(&mut self, delay: Duration, node: NodeId) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.timers.push(TimerEvent {
            deadline: self.now + delay,
            id,
            node,
        });
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if self.timers.iter().any(|t| t.id == id) {
            self.cancelled.insert(id);
        }
    }
}
