//! Integration test: full engine runs over fixture pages.
//!
//! Each test parses a page, fires the ready notification, then answers media
//! loads and advances the virtual clock the way a browser would.

mod common;

use std::time::Duration;

use common::pages::{
    deliver, duplicate_page, lightbox_page, ready_engine, select, thread_page, videos,
    ATTACHMENT_VIDEO, GALLERY_VIDEO,
};
use lvu_core::dom::{Document, PROCESSED_ATTR};
use lvu_core::retry::{LoadOutcome, RetryPhase};

const DELAY: Duration = Duration::from_millis(500);

#[test]
fn ready_swaps_poster_and_removes_overlays() {
    let engine = ready_engine(&thread_page());
    let tree = engine.document();

    assert!(select(tree, ".video-easter-egg-blocker").is_empty());
    assert!(select(tree, ".video-easter-egg-overlay").is_empty());
    assert!(select(tree, "img").is_empty());

    let vids = videos(tree);
    assert_eq!(vids.len(), 1);
    let video = vids[0];
    assert_eq!(tree.attr(video, "src").as_deref(), Some(ATTACHMENT_VIDEO));
    assert_eq!(tree.attr(video, "controls").as_deref(), Some(""));
    assert_eq!(tree.attr(video, PROCESSED_ATTR).as_deref(), Some("true"));
    assert_eq!(tree.style(video, "width").as_deref(), Some("640px"));
    assert_eq!(tree.style(video, "max-width").as_deref(), Some("100%"));

    let article = select(tree, "article")[0];
    assert_eq!(tree.style(article, "font-weight").as_deref(), Some("bold"));

    assert_eq!(engine.retry_phase(video), Some(RetryPhase::Attempting(0)));
    assert!(engine.registry().is_in_flight(ATTACHMENT_VIDEO));
    assert_eq!(engine.stats().blockers_removed, 2);
}

#[test]
fn fail_fail_succeed_keeps_the_video() {
    let mut engine = ready_engine(&thread_page());
    let video = videos(engine.document())[0];

    assert_eq!(deliver(&mut engine, LoadOutcome::Failed), 1);
    assert_eq!(engine.retry_phase(video), Some(RetryPhase::Attempting(0)));
    engine.advance(DELAY);
    assert_eq!(engine.retry_phase(video), Some(RetryPhase::Attempting(1)));

    assert_eq!(deliver(&mut engine, LoadOutcome::Failed), 1);
    engine.advance(DELAY);
    assert_eq!(engine.retry_phase(video), Some(RetryPhase::Attempting(2)));

    assert_eq!(deliver(&mut engine, LoadOutcome::Loaded), 1);
    assert_eq!(engine.retry_phase(video), Some(RetryPhase::Succeeded));
    assert!(engine.document().is_attached(video));
    assert!(!engine.registry().is_in_flight(ATTACHMENT_VIDEO));
    assert_eq!(engine.document().load_attempts(video), 3);
    assert_eq!(engine.pending_timers(), 0);
    assert_eq!(engine.stats().succeeded, 1);
}

#[test]
fn three_failures_exhaust_and_remove_the_video() {
    let mut engine = ready_engine(&thread_page());
    let video = videos(engine.document())[0];
    let max_attempts = engine.settings().policy.max_attempts();

    for _ in 0..max_attempts {
        assert_eq!(deliver(&mut engine, LoadOutcome::Failed), 1);
        engine.advance(DELAY);
    }

    assert_eq!(engine.retry_phase(video), Some(RetryPhase::Exhausted));
    assert!(!engine.document().is_attached(video));
    assert!(videos(engine.document()).is_empty());
    assert!(engine.registry().in_flight().is_empty());
    assert_eq!(engine.document().load_attempts(video), 3);
    assert_eq!(max_attempts, 3);

    let outcome = engine.registry().outcome(video).unwrap();
    assert_eq!(outcome.target, ATTACHMENT_VIDEO);
    assert_eq!(outcome.attempts, 3);

    // Nothing else is ever started for an exhausted target.
    assert_eq!(deliver(&mut engine, LoadOutcome::Failed), 0);
    assert_eq!(engine.pending_timers(), 0);
}

#[test]
fn gallery_video_loads_first_time() {
    let mut engine = ready_engine(&lightbox_page());
    let video = videos(engine.document())[0];
    assert_eq!(engine.document().attr(video, "src").as_deref(), Some(GALLERY_VIDEO));

    deliver(&mut engine, LoadOutcome::Loaded);
    assert_eq!(engine.retry_phase(video), Some(RetryPhase::Succeeded));
    assert!(engine.registry().in_flight().is_empty());
}

#[test]
fn lightbox_poster_without_source_is_left_alone() {
    let engine = ready_engine(&lightbox_page());
    let tree = engine.document();

    let imgs = select(tree, "img");
    assert_eq!(imgs.len(), 1);
    assert_eq!(tree.attr(imgs[0], "alt").as_deref(), Some("loading"));
    assert_eq!(tree.attr(imgs[0], PROCESSED_ATTR), None);

    let video = videos(tree)[0];
    assert_eq!(tree.style(video, "width").as_deref(), Some("100%"));
    let slide = select(tree, ".fancybox-slide")[0];
    assert_eq!(tree.style(slide, "font-weight").as_deref(), Some("bold"));
    assert!(engine.report().skipped.missing_source >= 1);
}

#[test]
fn repeated_mutations_change_nothing() {
    let mut engine = ready_engine(&thread_page());
    let before = engine.document().to_html().unwrap();
    let active = engine.registry().active();

    for _ in 0..10 {
        engine.notify_mutations(1);
        engine.run_until_idle();
    }

    assert_eq!(engine.document().to_html().unwrap(), before);
    assert_eq!(engine.registry().active(), active);
    assert_eq!(videos(engine.document()).len(), 1);
    assert_eq!(engine.stats().replaced, 1);
}

#[test]
fn one_controller_per_target_under_many_scans() {
    let mut engine = ready_engine(&duplicate_page());
    assert_eq!(videos(engine.document()).len(), 1);
    assert_eq!(select(engine.document(), "img").len(), 1);
    assert_eq!(engine.registry().active(), 1);

    deliver(&mut engine, LoadOutcome::Failed);
    for _ in 0..5 {
        engine.notify_mutations(3);
        engine.run_until_idle();
        assert_eq!(engine.registry().active(), 1);
        assert_eq!(engine.registry().in_flight().len(), 1);
    }
    assert!(engine.report().skipped.duplicate_in_flight >= 5);

    let img = select(engine.document(), "img")[0];
    assert_eq!(engine.document().attr(img, PROCESSED_ATTR), None);

    // The waiting placeholder is picked up as soon as the first sequence
    // ends, without any further host mutation.
    engine.advance(DELAY);
    deliver(&mut engine, LoadOutcome::Loaded);
    assert_eq!(videos(engine.document()).len(), 2);
    assert!(select(engine.document(), "img").is_empty());
    assert_eq!(engine.registry().active(), 1);
}

#[test]
fn waiting_placeholder_follows_an_exhausted_target() {
    let mut engine = ready_engine(&duplicate_page());
    let max_attempts = engine.settings().policy.max_attempts();
    for _ in 0..max_attempts {
        deliver(&mut engine, LoadOutcome::Failed);
        engine.advance(DELAY);
    }
    // The first video is gone; the second placeholder now owns the target.
    let vids = videos(engine.document());
    assert_eq!(vids.len(), 1);
    assert_eq!(engine.retry_phase(vids[0]), Some(RetryPhase::Attempting(0)));
    assert!(select(engine.document(), "img").is_empty());
}

#[test]
fn late_blockers_are_removed_on_the_next_pass() {
    let mut engine = ready_engine(&thread_page());
    let body = select(engine.document(), "body")[0];

    let tree = engine.document_mut();
    let blocker = tree.create_element("div", &[("class", "video-easter-egg-overlay")]);
    tree.append_child(body, blocker).unwrap();

    engine.run_until_idle();
    assert!(!engine.document().is_attached(blocker));
    assert_eq!(engine.stats().blockers_removed, 3);
}

#[test]
fn inserted_poster_is_replaced_on_the_next_pass() {
    let mut engine = ready_engine("<html><body><div class=\"block\"></div></body></html>");
    assert!(videos(engine.document()).is_empty());

    let block = select(engine.document(), ".block")[0];
    let tree = engine.document_mut();
    let img = tree.create_element("img", &[("src", common::pages::GALLERY_POSTER)]);
    tree.append_child(block, img).unwrap();

    engine.run_until_idle();
    let vids = videos(engine.document());
    assert_eq!(vids.len(), 1);
    assert_eq!(engine.document().attr(vids[0], "src").as_deref(), Some(GALLERY_VIDEO));
}

#[test]
fn retry_for_detached_video_is_abandoned() {
    let mut engine = ready_engine(&thread_page());
    let video = videos(engine.document())[0];

    deliver(&mut engine, LoadOutcome::Failed);
    engine.document_mut().remove(video).unwrap();
    engine.run_until_idle();
    engine.advance(DELAY);

    assert_eq!(engine.retry_phase(video), Some(RetryPhase::Abandoned));
    assert_eq!(engine.document().load_attempts(video), 1);
    assert!(engine.registry().in_flight().is_empty());
    assert_eq!(engine.stats().abandoned, 1);
}

#[test]
fn teardown_cancels_pending_retries() {
    let mut engine = ready_engine(&thread_page());
    let video = videos(engine.document())[0];
    deliver(&mut engine, LoadOutcome::Failed);
    assert_eq!(engine.pending_timers(), 1);
    assert_eq!(engine.next_timer_in(), Some(DELAY));

    let mut tree = engine.teardown();
    assert!(tree.is_attached(video));
    assert_eq!(tree.load_attempts(video), 1);
    assert!(tree.take_started_loads().is_empty());
}
