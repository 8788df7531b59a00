//! Poster locator patterns and their media path templates.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Which naming convention produced a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternFamily {
    /// Video attached to a forum post.
    ThreadAttachment,
    /// Video item in the media gallery.
    GalleryMedia,
}

static THREAD_ATTACHMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/data/attachments/posters/(\d+)/(\d+)-([a-f0-9]+)\.jpg")
        .expect("thread attachment poster regex should compile")
});

static GALLERY_MEDIA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/data/xfmg/poster/(\d+)/(\d+)-([a-f0-9]+)\.jpg")
        .expect("gallery poster regex should compile")
});

/// Patterns in the order they are tried.
pub(super) const ORDER: [PatternFamily; 2] =
    [PatternFamily::ThreadAttachment, PatternFamily::GalleryMedia];

impl PatternFamily {
    fn regex(self) -> &'static Regex {
        match self {
            PatternFamily::ThreadAttachment => &THREAD_ATTACHMENT,
            PatternFamily::GalleryMedia => &GALLERY_MEDIA,
        }
    }

    /// Media path prefix on the media host.
    fn media_dir(self) -> &'static str {
        match self {
            PatternFamily::ThreadAttachment => "/data/video",
            PatternFamily::GalleryMedia => "/data/xfmg/video",
        }
    }

    /// Match `locator` and build the target path (without host).
    ///
    /// Captures are (container id, item id, hash); the hash is kept verbatim.
    pub(super) fn target_path(self, locator: &str) -> Option<String> {
        let caps = self.regex().captures(locator)?;
        Some(format!(
            "{}/{}/{}-{}.mp4",
            self.media_dir(),
            &caps[1],
            &caps[2],
            &caps[3]
        ))
    }
}
