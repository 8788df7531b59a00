//! Placeholder locator → media locator resolution.
//!
//! Pure and deterministic: the result depends only on the poster locator and
//! the configured media host. Patterns are tried in a fixed order and the
//! first match wins; their path prefixes are disjoint so order never changes
//! the outcome.

mod patterns;

use serde::Serialize;

pub use patterns::PatternFamily;

/// Host that serves the actual video files.
pub const DEFAULT_MEDIA_HOST: &str = "https://cdn-videos.lpsg.com";

/// Path segments of known-blocked thumbnail variants that must never be
/// substituted.
pub const EXCLUDED_SEGMENTS: &[&str] = &["/data/xfmg/thumbnail/", "/data/xfmg/album_thumbnail/"];

/// A media locator derived from a poster locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTarget {
    pub url: String,
    pub family: PatternFamily,
}

/// Outcome of resolving one locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolvedTarget),
    /// No pattern matched.
    Unresolved,
    /// A pattern matched but the target is a blocked thumbnail path.
    Excluded(ResolvedTarget),
}

impl Resolution {
    /// The target, if it may be used for a replacement.
    pub fn target(&self) -> Option<&ResolvedTarget> {
        match self {
            Resolution::Resolved(t) => Some(t),
            Resolution::Unresolved | Resolution::Excluded(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlResolver {
    media_host: String,
}

impl Default for UrlResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MEDIA_HOST)
    }
}

impl UrlResolver {
    /// `media_host` is scheme + authority (an optional path prefix is kept);
    /// a trailing `/` is dropped.
    pub fn new(media_host: &str) -> Self {
        Self {
            media_host: media_host.trim_end_matches('/').to_string(),
        }
    }

    pub fn media_host(&self) -> &str {
        &self.media_host
    }

    pub fn resolve(&self, locator: &str) -> Resolution {
        let Some((family, path)) = patterns::ORDER
            .iter()
            .find_map(|f| f.target_path(locator).map(|p| (*f, p)))
        else {
            return Resolution::Unresolved;
        };
        let target = ResolvedTarget {
            url: format!("{}{}", self.media_host, path),
            family,
        };
        if EXCLUDED_SEGMENTS.iter().any(|s| target.url.contains(s)) {
            Resolution::Excluded(target)
        } else {
            Resolution::Resolved(target)
        }
    }
}
