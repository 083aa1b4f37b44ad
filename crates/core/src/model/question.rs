use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::ids::QuestionId;
use crate::model::kind::QuestionKind;

/// Minimum run of underscores that counts as a fill-in-the-blank marker.
const BLANK_MARKER_MIN: usize = 3;

//
// ─── CANONICAL QUESTION ────────────────────────────────────────────────────────
//

/// Schema-unified practice question used everywhere inside the engine.
///
/// Serializes under the field names the normalizer reads first, so a serialized
/// `Question` normalizes back to itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    #[serde(rename = "question_text")]
    text: String,
    #[serde(rename = "question_type")]
    kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    answer: Option<String>,
    #[serde(default, rename = "video_title", skip_serializing_if = "Option::is_none")]
    video_title_hint: Option<String>,
}

impl Question {
    #[must_use]
    pub fn new(id: QuestionId, text: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            id,
            text: text.into(),
            kind,
            options: Vec::new(),
            answer: None,
            video_title_hint: None,
        }
    }

    #[must_use]
    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_video_title_hint(mut self, title: impl Into<String>) -> Self {
        self.video_title_hint = Some(title.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    #[must_use]
    pub fn video_title_hint(&self) -> Option<&str> {
        self.video_title_hint.as_deref()
    }

    pub(crate) fn set_id(&mut self, id: QuestionId) {
        self.id = id;
    }

    /// `options` is non-empty exactly when the question is multiple choice.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.kind.is_choice() != self.options.is_empty()
    }

    /// Splits a fill-in-the-blank prompt around its blank marker.
    ///
    /// Returns `None` for other kinds or when the prompt carries no marker.
    #[must_use]
    pub fn blank_parts(&self) -> Option<(&str, &str)> {
        if self.kind != QuestionKind::FillBlanks {
            return None;
        }
        let (start, end) = find_blank_marker(&self.text)?;
        Some((&self.text[..start], &self.text[end..]))
    }
}

fn find_blank_marker(text: &str) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'_' {
            let start = i;
            while i < bytes.len() && bytes[i] == b'_' {
                i += 1;
            }
            if i - start >= BLANK_MARKER_MIN {
                return Some((start, i));
            }
        } else {
            i += 1;
        }
    }
    None
}

//
// ─── RAW UPSTREAM RECORD ───────────────────────────────────────────────────────
//

/// Question record as it arrives from either upstream store.
///
/// The document store uses `_id`/`question`/`type`; the relational store uses
/// `id`/`question_text`/`question_type`. Any mix of the two is accepted. Fields are
/// kept loose so one odd record cannot fail the batch it arrives in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawQuestion {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_text: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_type: Option<Value>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_title: Option<Value>,
}

impl From<&Question> for RawQuestion {
    fn from(question: &Question) -> Self {
        Self {
            document_id: None,
            id: Some(Value::String(question.id.as_str().to_owned())),
            question_text: Some(Value::String(question.text.clone())),
            question: None,
            question_type: Some(Value::String(question.kind.as_str().to_owned())),
            kind: None,
            options: (!question.options.is_empty()).then(|| {
                Value::Array(question.options.iter().cloned().map(Value::String).collect())
            }),
            answer: question.answer.clone().map(Value::String),
            video_title: question.video_title_hint.clone().map(Value::String),
        }
    }
}

//
// ─── NORMALIZER ────────────────────────────────────────────────────────────────
//

/// Maps an upstream record onto the canonical `Question`.
///
/// Never fails. Blank strings count as absent, so `question_text: ""` falls through to
/// `question`. `requested` fills in the kind when the record carries none.
#[must_use]
pub fn normalize(raw: RawQuestion, requested: &QuestionKind) -> Question {
    let id = raw
        .document_id
        .as_ref()
        .and_then(id_from_value)
        .or_else(|| raw.id.as_ref().and_then(id_from_value))
        .unwrap_or_default();

    let text = first_present(raw.question_text, raw.question).unwrap_or_default();

    let kind = first_present(raw.question_type, raw.kind)
        .map_or_else(|| requested.clone(), |k| QuestionKind::from(k.as_str()));

    let options = if kind.is_choice() {
        raw.options.map(string_list).unwrap_or_default()
    } else {
        Vec::new()
    };

    let answer = raw.answer.and_then(answer_from_value);
    let video_title_hint = text_value(raw.video_title);

    Question {
        id: QuestionId::new(id),
        text,
        kind,
        options,
        answer,
        video_title_hint,
    }
}

/// Normalizes a batch, preserving upstream order.
#[must_use]
pub fn normalize_all(raw: Vec<RawQuestion>, requested: &QuestionKind) -> Vec<Question> {
    raw.into_iter().map(|r| normalize(r, requested)).collect()
}

fn first_present(primary: Option<Value>, fallback: Option<Value>) -> Option<String> {
    text_value(primary).or_else(|| text_value(fallback))
}

/// Non-empty string content; any other JSON type counts as absent.
fn text_value(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        // extended JSON: {"$oid": "..."}
        Value::Object(map) => map.get("$oid").and_then(id_from_value),
        _ => None,
    }
}

fn answer_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_list(value: Value) -> Vec<String> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => out.push(s),
            _ => return Vec::new(),
        }
    }
    out
}
