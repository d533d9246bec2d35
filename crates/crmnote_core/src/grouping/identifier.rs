//! Match identifiers derived from contact notes.
//!
//! # Invariants
//! - Normalization is total: any text input yields a value, never an error.
//! - Blank fields (empty or whitespace-only) contribute no identifier.
//! - Email and name are case-folded; telephone keeps its case.

use crate::model::note::Note;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Set of identifiers contributed by one note (0 to 3 entries).
pub type IdentifierSet = BTreeSet<Identifier>;

/// Normalized, kind-tagged match key.
///
/// Two notes are linked when they share at least one identifier. The name
/// variant holds `first_last` already joined, so equality follows the tagged
/// string form `name:<first>_<last>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Identifier {
    Email(String),
    Tel(String),
    Name(String),
}

impl Identifier {
    /// Builds an email identifier, `None` when the value is blank.
    pub fn email(raw: &str) -> Option<Self> {
        non_blank(raw).map(|value| Self::Email(value.to_lowercase()))
    }

    /// Builds a telephone identifier, `None` when the value is blank.
    pub fn tel(raw: &str) -> Option<Self> {
        non_blank(raw).map(|value| Self::Tel(value.to_string()))
    }

    /// Builds a name identifier; both parts must be non-blank.
    pub fn name(first: &str, last: &str) -> Option<Self> {
        let first = non_blank(first)?;
        let last = non_blank(last)?;
        Some(Self::Name(format!(
            "{}_{}",
            first.to_lowercase(),
            last.to_lowercase()
        )))
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Email(value) => write!(f, "email:{value}"),
            Self::Tel(value) => write!(f, "tel:{value}"),
            Self::Name(value) => write!(f, "name:{value}"),
        }
    }
}

/// Derives the identifier set of one note.
pub fn identifiers(note: &Note) -> IdentifierSet {
    let mut set = IdentifierSet::new();
    if let Some(id) = note.email.as_deref().and_then(Identifier::email) {
        set.insert(id);
    }
    if let Some(id) = note.telephone.as_deref().and_then(Identifier::tel) {
        set.insert(id);
    }
    if let (Some(first), Some(last)) = (note.first_name.as_deref(), note.last_name.as_deref()) {
        if let Some(id) = Identifier::name(first, last) {
            set.insert(id);
        }
    }
    set
}

fn non_blank(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
