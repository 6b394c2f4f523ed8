//! Share payload for a single devotion.

use crate::model::devotion::{derive_excerpt, Devotion};
use crate::routes::Route;
use serde::Serialize;

/// Site name appended to shared titles.
pub const SITE_NAME: &str = "God's Voice Today";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareCard {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl ShareCard {
    /// Builds the share payload; `base_url` is the public site origin.
    pub fn for_devotion(devotion: &Devotion, base_url: &str) -> Self {
        let summary = if devotion.excerpt.trim().is_empty() {
            derive_excerpt(&devotion.content)
        } else {
            devotion.excerpt.clone()
        };
        Self {
            title: format!("{} - {SITE_NAME}", devotion.title),
            text: format!("{}\n\n{}...", devotion.bible_verse, summary),
            url: format!(
                "{}{}",
                base_url.trim_end_matches('/'),
                Route::Devotion(devotion.id).path()
            ),
        }
    }
}
