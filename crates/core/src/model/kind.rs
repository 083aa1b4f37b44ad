use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// Pedagogical category of a question.
///
/// The set is open: kinds the engine does not know about are carried through as
/// `Other` with their upstream spelling intact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    Novice,
    Factual,
    Mcq,
    FillBlanks,
    Other(String),
}

impl QuestionKind {
    /// Wire spelling used by the upstream API.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            QuestionKind::Novice => "novice",
            QuestionKind::Factual => "factual",
            QuestionKind::Mcq => "mcq",
            QuestionKind::FillBlanks => "fill_blanks",
            QuestionKind::Other(raw) => raw,
        }
    }

    /// Human-readable label for catalog titles and headings.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            QuestionKind::Novice => "Novice".to_string(),
            QuestionKind::Factual => "Factual".to_string(),
            QuestionKind::Mcq => "Multiple Choice".to_string(),
            QuestionKind::FillBlanks => "Fill in Blanks".to_string(),
            QuestionKind::Other(raw) => capitalize_first(raw),
        }
    }

    /// Whether answers are chosen from `options` rather than typed.
    #[must_use]
    pub fn is_choice(&self) -> bool {
        matches!(self, QuestionKind::Mcq)
    }
}

fn capitalize_first(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl From<&str> for QuestionKind {
    fn from(raw: &str) -> Self {
        match raw {
            "novice" => QuestionKind::Novice,
            "factual" => QuestionKind::Factual,
            "mcq" => QuestionKind::Mcq,
            "fill_blanks" => QuestionKind::FillBlanks,
            other => QuestionKind::Other(other.to_string()),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(QuestionKind::from(s.trim()))
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for QuestionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for QuestionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(QuestionKind::from(raw.as_str()))
    }
}

//
// ─── KIND POLICY ───────────────────────────────────────────────────────────────
//

/// Administrative on/off table for question kinds.
///
/// Kinds not listed as disabled are enabled, including kinds the engine has never
/// heard of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindPolicy {
    disabled: HashSet<QuestionKind>,
}

impl KindPolicy {
    /// Every kind enabled.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            disabled: HashSet::new(),
        }
    }

    /// Policy with the given kinds switched off.
    #[must_use]
    pub fn with_disabled(kinds: impl IntoIterator<Item = QuestionKind>) -> Self {
        Self {
            disabled: kinds.into_iter().collect(),
        }
    }

    /// Parses a comma separated list such as `"mcq,factual"`; blank entries are skipped.
    #[must_use]
    pub fn from_disabled_list(list: &str) -> Self {
        Self::with_disabled(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(QuestionKind::from),
        )
    }

    #[must_use]
    pub fn is_enabled(&self, kind: &QuestionKind) -> bool {
        !self.disabled.contains(kind)
    }

    pub fn disable(&mut self, kind: QuestionKind) {
        self.disabled.insert(kind);
    }

    pub fn enable(&mut self, kind: &QuestionKind) {
        self.disabled.remove(kind);
    }
}

impl Default for KindPolicy {
    /// factual, novice and fill_blanks on; multiple choice off.
    fn default() -> Self {
        Self::with_disabled([QuestionKind::Mcq])
    }
}
