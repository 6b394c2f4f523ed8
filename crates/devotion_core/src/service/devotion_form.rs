//! Admin create/edit form and its validation.
//!
//! # Invariants
//! - `validate` is the only way to turn raw form input into a draft.
//! - A blank excerpt is passed on as `None` so the repository derives it.

use crate::model::devotion::{Devotion, DevotionDraft};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormField {
    Title,
    BibleVerse,
    Content,
    PublishDate,
}

impl FormField {
    /// Input name used by the form markup.
    pub fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::BibleVerse => "bibleVerse",
            Self::Content => "content",
            Self::PublishDate => "publishDate",
        }
    }
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", join_messages(.fields))]
pub struct FormErrors {
    fields: BTreeMap<FormField, &'static str>,
}

impl FormErrors {
    pub fn get(&self, field: FormField) -> Option<&'static str> {
        self.fields.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &'static str)> + '_ {
        self.fields.iter().map(|(field, message)| (*field, *message))
    }

    fn insert(&mut self, field: FormField, message: &'static str) {
        self.fields.insert(field, message);
    }
}

fn join_messages(fields: &BTreeMap<FormField, &'static str>) -> String {
    let messages: Vec<&str> = fields.values().copied().collect();
    messages.join("; ")
}

/// Raw admin form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevotionForm {
    pub title: String,
    pub bible_verse: String,
    pub content: String,
    pub excerpt: String,
    /// `YYYY-MM-DD` as typed into the date input.
    pub publish_date: String,
    pub is_published: bool,
}

impl DevotionForm {
    /// Empty form dated `today`, unpublished.
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            title: String::new(),
            bible_verse: String::new(),
            content: String::new(),
            excerpt: String::new(),
            publish_date: today.format(DATE_INPUT_FORMAT).to_string(),
            is_published: false,
        }
    }

    /// Form pre-filled for editing `devotion`.
    pub fn from_devotion(devotion: &Devotion) -> Self {
        Self {
            title: devotion.title.clone(),
            bible_verse: devotion.bible_verse.clone(),
            content: devotion.content.clone(),
            excerpt: devotion.excerpt.clone(),
            publish_date: devotion.publish_date.format(DATE_INPUT_FORMAT).to_string(),
            is_published: devotion.is_published,
        }
    }

    pub fn validate(&self) -> Result<DevotionDraft, FormErrors> {
        let mut errors = FormErrors::default();

        if self.title.trim().is_empty() {
            errors.insert(FormField::Title, "Title is required");
        }
        if self.bible_verse.trim().is_empty() {
            errors.insert(FormField::BibleVerse, "Bible verse is required");
        }
        if self.content.trim().is_empty() {
            errors.insert(FormField::Content, "Content is required");
        }

        let publish_date = match self.publish_date.trim() {
            "" => {
                errors.insert(FormField::PublishDate, "Publish date is required");
                None
            }
            raw => match NaiveDate::parse_from_str(raw, DATE_INPUT_FORMAT) {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.insert(FormField::PublishDate, "Publish date must be YYYY-MM-DD");
                    None
                }
            },
        };

        match publish_date {
            Some(publish_date) if errors.is_empty() => Ok(DevotionDraft {
                title: self.title.clone(),
                bible_verse: self.bible_verse.clone(),
                content: self.content.clone(),
                excerpt: Some(self.excerpt.clone()).filter(|value| !value.trim().is_empty()),
                publish_date,
                is_published: self.is_published,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DevotionForm, FormField};
    use chrono::NaiveDate;

    fn filled() -> DevotionForm {
        DevotionForm {
            title: "Grace".to_string(),
            bible_verse: "Ephesians 2:8".to_string(),
            content: "By grace you have been saved.".to_string(),
            excerpt: String::new(),
            publish_date: "2024-05-01".to_string(),
            is_published: true,
        }
    }

    #[test]
    fn blank_form_reports_every_required_field() {
        let mut form = DevotionForm::blank(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        form.publish_date.clear();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get(FormField::Title), Some("Title is required"));
        assert_eq!(
            errors.get(FormField::BibleVerse),
            Some("Bible verse is required")
        );
        assert_eq!(errors.get(FormField::Content), Some("Content is required"));
        assert_eq!(
            errors.get(FormField::PublishDate),
            Some("Publish date is required")
        );
    }

    #[test]
    fn whitespace_only_fields_are_rejected() {
        let mut form = filled();
        form.title = "   ".to_string();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.get(FormField::Title).is_some());
    }

    #[test]
    fn malformed_date_is_rejected() {
        let mut form = filled();
        form.publish_date = "05/01/2024".to_string();
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get(FormField::PublishDate),
            Some("Publish date must be YYYY-MM-DD")
        );
    }

    #[test]
    fn error_message_joins_fields_in_form_order() {
        let mut form = filled();
        form.publish_date = "soon".to_string();
        form.title.clear();
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.to_string(),
            "Title is required; Publish date must be YYYY-MM-DD"
        );
    }

    #[test]
    fn valid_form_yields_draft_with_blank_excerpt_left_for_derivation() {
        let draft = filled().validate().unwrap();
        assert_eq!(draft.excerpt, None);
        assert_eq!(
            draft.publish_date,
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
        assert!(draft.is_published);
        assert_eq!(draft.resolved_excerpt(), "By grace you have been saved.");
    }

    #[test]
    fn blank_form_defaults_to_given_day() {
        let form = DevotionForm::blank(NaiveDate::from_ymd_opt(2024, 12, 25).unwrap());
        assert_eq!(form.publish_date, "2024-12-25");
        assert!(!form.is_published);
        assert_eq!(FormField::BibleVerse.name(), "bibleVerse");
    }
}
