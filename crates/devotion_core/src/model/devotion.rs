//! Devotion domain model.
//!
//! # Responsibility
//! - Define the stored devotion record and its write-side inputs.
//! - Own excerpt derivation so every write path applies the same rule.
//!
//! # Invariants
//! - `id` is assigned once by the repository and never reused.
//! - `excerpt` is never blank once persisted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier assigned by the repository on creation.
pub type DevotionId = Uuid;

/// Maximum length, in characters, of a derived excerpt.
pub const EXCERPT_MAX_CHARS: usize = 150;

/// One dated devotional post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Devotion {
    pub id: DevotionId,
    pub title: String,
    /// Free-text scripture reference, e.g. `John 3:16`.
    pub bible_verse: String,
    /// Body text; paragraphs are separated by line breaks.
    pub content: String,
    pub excerpt: String,
    /// Plain calendar day the devotion belongs to.
    pub publish_date: NaiveDate,
    /// Public visibility gate.
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Devotion {
    /// Non-blank paragraphs of `content`, trimmed.
    pub fn paragraphs(&self) -> Vec<&str> {
        self.content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }

    /// Summary shown on gallery cards.
    ///
    /// Falls back to the head of `content` with a trailing ellipsis when the
    /// stored excerpt is empty (rows written by older importers).
    pub fn card_excerpt(&self) -> String {
        if self.excerpt.trim().is_empty() {
            format!("{}...", derive_excerpt(&self.content))
        } else {
            self.excerpt.clone()
        }
    }
}

/// Input for creating a devotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevotionDraft {
    pub title: String,
    pub bible_verse: String,
    pub content: String,
    /// `None` or blank means "derive from content".
    pub excerpt: Option<String>,
    pub publish_date: NaiveDate,
    pub is_published: bool,
}

impl DevotionDraft {
    /// Creates an unpublished draft without an explicit excerpt.
    pub fn new(
        title: impl Into<String>,
        bible_verse: impl Into<String>,
        content: impl Into<String>,
        publish_date: NaiveDate,
    ) -> Self {
        Self {
            title: title.into(),
            bible_verse: bible_verse.into(),
            content: content.into(),
            excerpt: None,
            publish_date,
            is_published: false,
        }
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    pub fn published(mut self, is_published: bool) -> Self {
        self.is_published = is_published;
        self
    }

    /// Excerpt that will actually be persisted.
    pub fn resolved_excerpt(&self) -> String {
        resolve_excerpt(self.excerpt.as_deref(), &self.content)
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevotionPatch {
    pub title: Option<String>,
    pub bible_verse: Option<String>,
    pub content: Option<String>,
    /// `Some("")` re-derives the excerpt from the effective content.
    pub excerpt: Option<String>,
    pub publish_date: Option<NaiveDate>,
    pub is_published: Option<bool>,
}

impl DevotionPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Patch that overwrites every editable field with the draft's values.
    pub fn from_draft(draft: &DevotionDraft) -> Self {
        Self {
            title: Some(draft.title.clone()),
            bible_verse: Some(draft.bible_verse.clone()),
            content: Some(draft.content.clone()),
            excerpt: Some(draft.excerpt.clone().unwrap_or_default()),
            publish_date: Some(draft.publish_date),
            is_published: Some(draft.is_published),
        }
    }
}

/// First `EXCERPT_MAX_CHARS` characters of `content`.
pub fn derive_excerpt(content: &str) -> String {
    content.chars().take(EXCERPT_MAX_CHARS).collect()
}

/// Keeps a non-blank `excerpt` verbatim, otherwise derives one from `content`.
pub fn resolve_excerpt(excerpt: Option<&str>, content: &str) -> String {
    match excerpt {
        Some(value) if !value.trim().is_empty() => value.to_string(),
        _ => derive_excerpt(content),
    }
}
