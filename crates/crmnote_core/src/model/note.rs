//! Contact note domain model.
//!
//! # Responsibility
//! - Define the plain value record shared by storage, grouping and callers.
//! - Validate and canonicalize note fields before they reach persistence.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `labels` on a `Note` are already normalized (lowercase, sorted, unique).
//! - A `Note` carries no lazy relations; everything it needs is materialized.
//! - A stored `custom_date` is a real calendar date in canonical
//!   `YYYY-MM-DD` form (ASCII digits, no surrounding whitespace).

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one contact note.
pub type NoteId = Uuid;

const NAME_MAX_CHARS: usize = 100;
const EMAIL_MAX_CHARS: usize = 100;
const TELEPHONE_MAX_CHARS: usize = 100;
const ADDRESS_MAX_CHARS: usize = 200;
const NOTE_TEXT_MAX_CHARS: usize = 1000;
const GENDER_MAX_CHARS: usize = 10;
const LABEL_MAX_CHARS: usize = 50;

const CUSTOM_DATE_FORMAT: &str = "%Y-%m-%d";

static CANONICAL_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid iso date regex"));

/// Contact note as stored and as consumed by the grouping engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub address: Option<String>,
    pub note_text: String,
    /// Free calendar date attached by the user, `YYYY-MM-DD`.
    pub custom_date: Option<String>,
    pub gender: Option<String>,
    pub is_done: bool,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
    pub labels: Vec<String>,
}

impl Note {
    /// Builds a new note from a draft with a generated id.
    pub fn from_draft(draft: NoteDraft, created_at: i64) -> Self {
        Self::with_id(Uuid::new_v4(), draft, created_at)
    }

    /// Builds a note with a caller-provided id.
    ///
    /// Used by import paths and tests where identity already exists.
    pub fn with_id(id: NoteId, draft: NoteDraft, created_at: i64) -> Self {
        Self {
            id,
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            telephone: draft.telephone,
            address: draft.address,
            note_text: draft.note_text,
            custom_date: draft.custom_date,
            gender: draft.gender,
            is_done: false,
            created_at,
            labels: draft
                .labels
                .as_deref()
                .map(normalize_labels)
                .unwrap_or_default(),
        }
    }

    /// Checks field widths, the canonical date form and label names.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        Fields {
            first_name: self.first_name.as_deref(),
            last_name: self.last_name.as_deref(),
            email: self.email.as_deref(),
            telephone: self.telephone.as_deref(),
            address: self.address.as_deref(),
            note_text: self.note_text.as_str(),
            custom_date: self.custom_date.as_deref(),
            gender: self.gender.as_deref(),
            labels: &self.labels,
        }
        .check()
    }
}

/// Caller input for creating or replacing a note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub address: Option<String>,
    pub note_text: String,
    pub custom_date: Option<String>,
    pub gender: Option<String>,
    /// Raw label names; normalized on write.
    ///
    /// On update, `None` keeps the stored labels and `Some` replaces them
    /// (`Some(vec![])` clears them).
    pub labels: Option<Vec<String>>,
}

/// Validation failures for note input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// A text field exceeds its storage width.
    FieldTooLong {
        field: &'static str,
        max_chars: usize,
    },
    /// `custom_date` is not a real `YYYY-MM-DD` calendar date.
    InvalidCustomDate(String),
    /// A label is blank after trimming.
    BlankLabel,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FieldTooLong { field, max_chars } => {
                write!(f, "field `{field}` exceeds {max_chars} characters")
            }
            Self::InvalidCustomDate(value) => {
                write!(f, "custom_date must be a YYYY-MM-DD date, got `{value}`")
            }
            Self::BlankLabel => write!(f, "label names cannot be blank"),
        }
    }
}

impl Error for NoteValidationError {}

impl NoteDraft {
    /// Checks field widths, the canonical date form and label names.
    ///
    /// Dates must already be canonical; run `normalize` on raw input first.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        Fields {
            first_name: self.first_name.as_deref(),
            last_name: self.last_name.as_deref(),
            email: self.email.as_deref(),
            telephone: self.telephone.as_deref(),
            address: self.address.as_deref(),
            note_text: self.note_text.as_str(),
            custom_date: self.custom_date.as_deref(),
            gender: self.gender.as_deref(),
            labels: self.labels.as_deref().unwrap_or_default(),
        }
        .check()
    }

    /// Canonicalizes `custom_date` (trimmed, zero-padded) and validates.
    ///
    /// # Errors
    /// - `InvalidCustomDate` when the value is not a real calendar date.
    /// - Any other `validate` failure.
    pub fn normalize(mut self) -> Result<Self, NoteValidationError> {
        if let Some(raw) = self.custom_date.take() {
            self.custom_date = Some(canonical_custom_date(&raw)?);
        }
        self.validate()?;
        Ok(self)
    }
}

/// Borrowed view over the fields shared by `Note` and `NoteDraft`.
struct Fields<'a> {
    first_name: Option<&'a str>,
    last_name: Option<&'a str>,
    email: Option<&'a str>,
    telephone: Option<&'a str>,
    address: Option<&'a str>,
    note_text: &'a str,
    custom_date: Option<&'a str>,
    gender: Option<&'a str>,
    labels: &'a [String],
}

impl Fields<'_> {
    fn check(&self) -> Result<(), NoteValidationError> {
        check_len("first_name", self.first_name, NAME_MAX_CHARS)?;
        check_len("last_name", self.last_name, NAME_MAX_CHARS)?;
        check_len("email", self.email, EMAIL_MAX_CHARS)?;
        check_len("telephone", self.telephone, TELEPHONE_MAX_CHARS)?;
        check_len("address", self.address, ADDRESS_MAX_CHARS)?;
        check_len("note_text", Some(self.note_text), NOTE_TEXT_MAX_CHARS)?;
        check_len("gender", self.gender, GENDER_MAX_CHARS)?;

        if let Some(date) = self.custom_date {
            if !is_canonical_date(date) {
                return Err(NoteValidationError::InvalidCustomDate(date.to_string()));
            }
        }

        for label in self.labels {
            let normalized = normalize_label(label).ok_or(NoteValidationError::BlankLabel)?;
            check_len("label", Some(&normalized), LABEL_MAX_CHARS)?;
        }

        Ok(())
    }
}

fn check_len(
    field: &'static str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<(), NoteValidationError> {
    match value {
        Some(text) if text.chars().count() > max_chars => {
            Err(NoteValidationError::FieldTooLong { field, max_chars })
        }
        _ => Ok(()),
    }
}

fn is_canonical_date(value: &str) -> bool {
    CANONICAL_DATE_RE.is_match(value)
        && NaiveDate::parse_from_str(value, CUSTOM_DATE_FORMAT).is_ok()
}

fn canonical_custom_date(raw: &str) -> Result<String, NoteValidationError> {
    NaiveDate::parse_from_str(raw.trim(), CUSTOM_DATE_FORMAT)
        .map(|date| date.format(CUSTOM_DATE_FORMAT).to_string())
        .map_err(|_| NoteValidationError::InvalidCustomDate(raw.to_string()))
}

/// Normalizes one label name: trimmed and lowercased, `None` when blank.
pub fn normalize_label(label: &str) -> Option<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes, deduplicates and sorts label names.
pub fn normalize_labels(labels: &[String]) -> Vec<String> {
    let mut unique = BTreeSet::new();
    for label in labels {
        if let Some(value) = normalize_label(label) {
            unique.insert(value);
        }
    }
    unique.into_iter().collect()
}
