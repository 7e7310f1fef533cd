use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use super::error::RemoteError;

/// Matches the video id inside a share, watch, shorts or embed URL.
static VIDEO_ID_IN_URL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?:youtu\.be/|[?&]v=|/shorts/|/embed/)([A-Za-z0-9_-]+)").ok()
});

/// Address of a remote video, derived from a task's remote id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteLocator {
    pub video_id: String,
    pub url: String,
}

impl RemoteLocator {
    /// Builds a locator from a bare video id or a full URL.
    ///
    /// Bare ids are appended to `base`; URLs have their id extracted and are
    /// normalized onto `base` as well.
    pub fn parse(base: &str, raw: &str) -> Result<Self, RemoteError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RemoteError::InvalidLocator("empty remote id".to_string()));
        }

        let video_id = if raw.contains("://") {
            VIDEO_ID_IN_URL
                .as_ref()
                .and_then(|re| re.captures(raw))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .ok_or_else(|| RemoteError::InvalidLocator(raw.to_string()))?
        } else {
            raw.to_string()
        };

        let url = format!("{}{}", base, urlencoding::encode(&video_id));
        Ok(Self { video_id, url })
    }
}

impl fmt::Display for RemoteLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
