//! Selector records produced by elaborating option clauses.
//!
//! Each selector holds the raw payload text from the query. Resolving that
//! text against the live system (login lookup, place ids, date expression
//! parsing) is collaborator work declared in [`resolve`](crate::resolve);
//! nothing here touches the network.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A run of free-form payload text: plain words interleaved with quoted
/// phrases.
///
/// Phrases keep their quoting through serialization so a round-tripped query
/// preserves exact-phrase matching (`in-prj "arthropods on snow"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    parts: Vec<TextPart>,
}

/// One element of a [`TextRun`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextPart {
    /// A bare word.
    Word(String),
    /// A double-quoted phrase (stored without the quotes).
    Phrase(String),
}

impl TextRun {
    pub fn new(parts: Vec<TextPart>) -> Self {
        Self { parts }
    }

    /// A run consisting of a single bare word.
    pub fn word(word: impl Into<String>) -> Self {
        Self {
            parts: vec![TextPart::Word(word.into())],
        }
    }

    pub fn push(&mut self, part: TextPart) {
        self.parts.push(part);
    }

    pub fn parts(&self) -> &[TextPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The payload as plain text, quoting dropped. This is what resolver
    /// collaborators receive.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            if !out.is_empty() {
                out.push(' ');
            }
            match part {
                TextPart::Word(w) | TextPart::Phrase(w) => out.push_str(w),
            }
        }
        out
    }
}

impl fmt::Display for TextRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match part {
                TextPart::Word(w) => write!(f, "{w}")?,
                TextPart::Phrase(p) => write!(f, "\"{p}\"")?,
            }
        }
        Ok(())
    }
}

/// The role a user plays relative to the selected observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    /// `by` - the user observed the records.
    ObservedBy,
    /// `not-by` - records the user has not observed.
    UnobservedBy,
    /// `id-by` - records the user identified.
    IdentifiedBy,
    /// `except-by` - records by anyone but the user.
    ExceptBy,
}

impl UserRole {
    /// The canonical (hyphenated) keyword spelling.
    pub fn keyword(&self) -> &'static str {
        match self {
            UserRole::ObservedBy => "by",
            UserRole::UnobservedBy => "not-by",
            UserRole::IdentifiedBy => "id-by",
            UserRole::ExceptBy => "except-by",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "by" => Some(UserRole::ObservedBy),
            "not-by" => Some(UserRole::UnobservedBy),
            "id-by" => Some(UserRole::IdentifiedBy),
            "except-by" => Some(UserRole::ExceptBy),
            _ => None,
        }
    }
}

/// Which date a date clause constrains.
///
/// `on`/`since`/`until` refer to the date the record was observed; the
/// `added-` forms refer to the date it entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateField {
    ObservedOn,
    ObservedSince,
    ObservedUntil,
    AddedOn,
    AddedSince,
    AddedUntil,
}

impl DateField {
    pub fn keyword(&self) -> &'static str {
        match self {
            DateField::ObservedOn => "on",
            DateField::ObservedSince => "since",
            DateField::ObservedUntil => "until",
            DateField::AddedOn => "added-on",
            DateField::AddedSince => "added-since",
            DateField::AddedUntil => "added-until",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "on" => Some(DateField::ObservedOn),
            "since" => Some(DateField::ObservedSince),
            "until" => Some(DateField::ObservedUntil),
            "added-on" => Some(DateField::AddedOn),
            "added-since" => Some(DateField::AddedSince),
            "added-until" => Some(DateField::AddedUntil),
            _ => None,
        }
    }
}

/// A typed entry of the query's option map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Setting {
    SortBy,
    QualityGrade,
    HasPhotos,
    HasSounds,
    PerPage,
}

impl Setting {
    pub fn keyword(&self) -> &'static str {
        match self {
            Setting::SortBy => "sort-by",
            Setting::QualityGrade => "quality-grade",
            Setting::HasPhotos => "has-photos",
            Setting::HasSounds => "has-sounds",
            Setting::PerPage => "per-page",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "sort-by" => Some(Setting::SortBy),
            "quality-grade" => Some(Setting::QualityGrade),
            "has-photos" => Some(Setting::HasPhotos),
            "has-sounds" => Some(Setting::HasSounds),
            "per-page" => Some(Setting::PerPage),
            _ => None,
        }
    }
}

/// A person-scoped selector: role plus the identifier text as typed.
///
/// Aliases such as `me` pass through untouched; expanding them needs the
/// caller's identity context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSelector {
    pub role: UserRole,
    pub who: TextRun,
}

/// A date constraint: target field plus the unparsed date expression.
///
/// The expression may be relative natural language (`last week`); parsing it
/// is the [`DateExpressionParser`](crate::resolve::DateExpressionParser)
/// collaborator's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSelector {
    pub field: DateField,
    pub expression: TextRun,
}

/// A place selector (`from nova scotia`). The alias `home` passes through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceSelector {
    pub place: TextRun,
}

/// A project selector (`in-prj "arthropods on snow"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSelector {
    pub project: TextRun,
}

/// A controlled-term selector (`with sex f`): the term label plus its value,
/// split at the first blank of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlledTermSelector {
    pub term: String,
    pub value: Option<TextRun>,
}
