//! Registry tests against the tree host and a recording timer.

use std::time::Duration;

use super::*;
use crate::dom::{MediaElement, MediaWidth, SelectorList, Tree};
use crate::retry::TimerId;

#[derive(Default)]
struct RecordingTimers {
    next: u64,
    scheduled: Vec<(TimerId, Duration, NodeId)>,
    cancelled: Vec<TimerId>,
}

impl RetryTimers for RecordingTimers {
    fn schedule_retry(&mut self, delay: Duration, node: NodeId) -> TimerId {
        self.next += 1;
        let id = TimerId(self.next);
        self.scheduled.push((id, delay, node));
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.cancelled.push(id);
    }
}

const TARGET: &str = "https://cdn-videos.lpsg.com/data/video/42/99-abc123.mp4";

fn attached_video(tree: &mut Tree) -> NodeId {
    let body = tree.query_all(&SelectorList::parse("body").unwrap())[0];
    let video = tree
        .create_media(&MediaElement {
            src: TARGET.to_string(),
            controls: true,
            width: MediaWidth::Fill,
        })
        .unwrap();
    tree.append_child(body, video).unwrap();
    video
}

#[test]
fn begin_marks_target_in_flight() {
    let mut tree = Tree::parse_html("<body></body>").unwrap();
    let mut timers = RecordingTimers::default();
    let mut reg = RetryRegistry::default();
    let video = attached_video(&mut tree);

    reg.begin(video, TARGET, &mut timers);
    assert!(reg.is_in_flight(TARGET));
    assert_eq!(reg.phase(video), Some(RetryPhase::Attempting(0)));
    assert_eq!(reg.active(), 1);
}

#[test]
fn two_failures_then_success() {
    let mut tree = Tree::parse_html("<body></body>").unwrap();
    let mut timers = RecordingTimers::default();
    let mut reg = RetryRegistry::default();
    let video = attached_video(&mut tree);
    reg.begin(video, TARGET, &mut timers);

    for retry in 1..=2 {
        assert!(reg
            .handle_load(video, LoadOutcome::Failed, &mut tree, &mut timers)
            .is_none());
        assert_eq!(timers.scheduled.len(), retry);
        assert_eq!(timers.scheduled[retry - 1].1, Duration::from_millis(500));
        assert!(reg.handle_retry_due(video, &mut tree).is_none());
        assert_eq!(reg.phase(video), Some(RetryPhase::Attempting(retry as u32)));
    }

    let outcome = reg
        .handle_load(video, LoadOutcome::Loaded, &mut tree, &mut timers)
        .expect("terminal");
    assert_eq!(outcome.phase, RetryPhase::Succeeded);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(tree.load_attempts(video), 3);
    assert!(tree.is_attached(video));
    assert!(!reg.is_in_flight(TARGET));
    assert_eq!(reg.phase(video), Some(RetryPhase::Succeeded));
    assert_eq!(reg.active(), 0);
}

#[test]
fn three_failures_remove_element() {
    let mut tree = Tree::parse_html("<body></body>").unwrap();
    let mut timers = RecordingTimers::default();
    let mut reg = RetryRegistry::default();
    let video = attached_video(&mut tree);
    reg.begin(video, TARGET, &mut timers);

    reg.handle_load(video, LoadOutcome::Failed, &mut tree, &mut timers);
    reg.handle_retry_due(video, &mut tree);
    reg.handle_load(video, LoadOutcome::Failed, &mut tree, &mut timers);
    reg.handle_retry_due(video, &mut tree);
    let outcome = reg
        .handle_load(video, LoadOutcome::Failed, &mut tree, &mut timers)
        .expect("terminal");

    assert_eq!(outcome.phase, RetryPhase::Exhausted);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(tree.load_attempts(video), 3);
    assert!(!tree.is_attached(video));
    assert!(!reg.is_in_flight(TARGET));
    assert_eq!(timers.scheduled.len(), 2);
}

#[test]
fn events_after_terminal_state_are_dropped() {
    let mut tree = Tree::parse_html("<body></body>").unwrap();
    let mut timers = RecordingTimers::default();
    let mut reg = RetryRegistry::default();
    let video = attached_video(&mut tree);
    reg.begin(video, TARGET, &mut timers);
    reg.handle_load(video, LoadOutcome::Loaded, &mut tree, &mut timers);

    assert!(reg
        .handle_load(video, LoadOutcome::Failed, &mut tree, &mut timers)
        .is_none());
    assert!(reg.handle_retry_due(video, &mut tree).is_none());
    assert!(tree.is_attached(video));
    assert_eq!(reg.phase(video), Some(RetryPhase::Succeeded));
}

#[test]
fn success_while_waiting_cancels_timer() {
    let mut tree = Tree::parse_html("<body></body>").unwrap();
    let mut timers = RecordingTimers::default();
    let mut reg = RetryRegistry::default();
    let video = attached_video(&mut tree);
    reg.begin(video, TARGET, &mut timers);
    reg.handle_load(video, LoadOutcome::Failed, &mut tree, &mut timers);
    let (id, _, _) = timers.scheduled[0];

    reg.handle_load(video, LoadOutcome::Loaded, &mut tree, &mut timers);
    assert_eq!(timers.cancelled, vec![id]);
    assert!(!reg.is_in_flight(TARGET));
}

#[test]
fn retry_for_detached_element_is_abandoned() {
    let mut tree = Tree::parse_html("<body></body>").unwrap();
    let mut timers = RecordingTimers::default();
    let mut reg = RetryRegistry::default();
    let video = attached_video(&mut tree);
    reg.begin(video, TARGET, &mut timers);
    reg.handle_load(video, LoadOutcome::Failed, &mut tree, &mut timers);

    tree.remove(video).unwrap();
    let outcome = reg.handle_retry_due(video, &mut tree).expect("terminal");
    assert_eq!(outcome.phase, RetryPhase::Abandoned);
    assert_eq!(tree.load_attempts(video), 1, "no reload for a detached element");
    assert!(!reg.is_in_flight(TARGET));
}

#[test]
fn begin_twice_on_same_node_keeps_one_controller() {
    let mut tree = Tree::parse_html("<body></body>").unwrap();
    let mut timers = RecordingTimers::default();
    let mut reg = RetryRegistry::default();
    let video = attached_video(&mut tree);
    reg.begin(video, TARGET, &mut timers);
    reg.handle_load(video, LoadOutcome::Failed, &mut tree, &mut timers);
    reg.begin(video, TARGET, &mut timers);

    assert_eq!(reg.active(), 1);
    assert_eq!(timers.cancelled.len(), 1, "old pending retry cancelled");
    assert!(reg.is_in_flight(TARGET));
    assert_eq!(reg.phase(video), Some(RetryPhase::Attempting(0)));

    // A single failure event schedules exactly one retry.
    reg.handle_load(video, LoadOutcome::Failed, &mut tree, &mut timers);
    assert_eq!(timers.scheduled.len(), 2);
}

#[test]
fn teardown_cancels_pending_and_clears_in_flight() {
    let mut tree = Tree::parse_html("<body></body>").unwrap();
    let mut timers = RecordingTimers::default();
    let mut reg = RetryRegistry::new(RetryPolicy {
        max_retries: 5,
        delay: Duration::from_millis(50),
    });
    let video = attached_video(&mut tree);
    reg.begin(video, TARGET, &mut timers);
    reg.handle_load(video, LoadOutcome::Failed, &mut tree, &mut timers);

    assert_eq!(reg.teardown(&mut timers), 1);
    assert_eq!(timers.cancelled.len(), 1);
    assert!(reg.in_flight().is_empty());
    assert_eq!(reg.phase(video), Some(RetryPhase::Abandoned));
}

#[test]
fn finished_history_is_bounded_and_drainable() {
    let mut tree = Tree::parse_html("<body></body>").unwrap();
    let mut timers = RecordingTimers::default();
    let mut reg = RetryRegistry::with_history(RetryPolicy::default(), 2);
    let videos: Vec<NodeId> = (0..3).map(|_| attached_video(&mut tree)).collect();
    for video in &videos {
        reg.begin(*video, TARGET, &mut timers);
        reg.handle_load(*video, LoadOutcome::Loaded, &mut tree, &mut timers);
    }

    assert_eq!(reg.outcomes().count(), 2);
    assert_eq!(reg.phase(videos[0]), None, "oldest outcome evicted");
    assert_eq!(reg.phase(videos[2]), Some(RetryPhase::Succeeded));

    let taken = reg.take_outcomes();
    assert_eq!(taken.iter().map(|o| o.node).collect::<Vec<_>>(), videos[1..].to_vec());
    assert_eq!(reg.outcomes().count(), 0);
    assert_eq!(reg.phase(videos[2]), None);
}
