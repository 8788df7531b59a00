//! Fixture pages and small drivers shared by the engine integration tests.

#![allow(dead_code)]

use lvu_core::dom::{Document, NodeId, SelectorList, Tree};
use lvu_core::engine::{Engine, EngineSettings};
use lvu_core::retry::LoadOutcome;

pub const ATTACHMENT_POSTER: &str =
    "https://www.lpsg.com/data/attachments/posters/42/99-abc123.jpg";
pub const ATTACHMENT_VIDEO: &str = "https://cdn-videos.lpsg.com/data/video/42/99-abc123.mp4";
pub const GALLERY_POSTER: &str = "https://www.lpsg.com/data/xfmg/poster/7/15-deadbeef.jpg";
pub const GALLERY_VIDEO: &str = "https://cdn-videos.lpsg.com/data/xfmg/video/7/15-deadbeef.mp4";

/// Forum thread with one attachment poster behind an overlay.
pub fn thread_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html><body>
  <article class="message">
    <div class="bbMediaWrapper">
      <div class="video-easter-egg-blocker"></div>
      <img src="{ATTACHMENT_POSTER}" width="640">
      <div class="video-easter-egg-overlay"></div>
    </div>
  </article>
</body></html>"#
    )
}

/// Gallery lightbox: one poster without a source, one gallery poster.
pub fn lightbox_page() -> String {
    format!(
        r#"<html><body>
  <div class="fancybox-container">
    <div class="fancybox-slide">
      <div class="video-easter-egg-poster"><img alt="loading"></div>
      <div class="video-easter-egg-poster"><img src="{GALLERY_POSTER}"></div>
    </div>
  </div>
</body></html>"#
    )
}

/// Two placeholders that resolve to the same target.
pub fn duplicate_page() -> String {
    format!(
        r#"<html><body>
  <article><img src="{ATTACHMENT_POSTER}"></article>
  <article><img src="{ATTACHMENT_POSTER}?quoted=1"></article>
</body></html>"#
    )
}

/// Engine over `html` with the initial ready notification already handled.
pub fn ready_engine(html: &str) -> Engine<Tree> {
    let tree = Tree::parse_html(html).expect("fixture parses");
    let mut engine = Engine::new(tree, EngineSettings::default());
    engine.notify_ready();
    engine.run_until_idle();
    engine
}

pub fn select(tree: &Tree, selector: &str) -> Vec<NodeId> {
    tree.query_all(&SelectorList::parse(selector).expect("fixture selector"))
}

pub fn videos(tree: &Tree) -> Vec<NodeId> {
    select(tree, "video")
}

/// Answer every load started since the last call with `outcome`, then run
/// to idle. Returns how many loads were answered.
pub fn deliver(engine: &mut Engine<Tree>, outcome: LoadOutcome) -> usize {
    let started = engine.document_mut().take_started_loads();
    for node in &started {
        engine.notify_load(*node, outcome);
    }
    engine.run_until_idle();
    started.len()
}
