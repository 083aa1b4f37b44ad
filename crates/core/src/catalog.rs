//! Builds the browsable practice catalog from the raw set feed.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};

use crate::model::{KindPolicy, PracticeSet, QuestionKind, RawPracticeSet, VideoId};

/// Transcript-derived titles keep this many characters of the first line.
pub const TITLE_MAX_CHARS: usize = 30;

/// Placeholder title upstream assigns when the learner gave none.
pub const UNTITLED: &str = "Untitled";

const DISPLAY_ID_LEN: usize = 6;

/// Groups raw rows by video and kind and titles every row.
///
/// Rows of disabled kinds are dropped. Videos and kinds keep their first-seen order,
/// and rows sharing a (video, kind) are enumerated rather than merged. A video
/// missing from `transcripts` falls back to the row title, then to `Practice {n}`.
#[must_use]
pub fn aggregate(
    raw_sets: &[RawPracticeSet],
    transcripts: &HashMap<VideoId, String>,
    policy: &KindPolicy,
) -> Vec<PracticeSet> {
    let mut groups: IndexMap<&VideoId, IndexMap<&QuestionKind, Vec<&RawPracticeSet>>> =
        IndexMap::new();
    for raw in raw_sets.iter().filter(|raw| policy.is_enabled(&raw.kind)) {
        groups
            .entry(&raw.video_id)
            .or_default()
            .entry(&raw.kind)
            .or_default()
            .push(raw);
    }

    let mut sets = Vec::with_capacity(raw_sets.len());
    for (rank, (video_id, kinds)) in groups.into_iter().enumerate() {
        let transcript_title = transcripts
            .get(video_id)
            .and_then(|text| title_from_transcript(text));

        for (kind, rows) in kinds {
            for (index, row) in rows.into_iter().enumerate() {
                let video_title = transcript_title
                    .clone()
                    .or_else(|| usable_title(row.title.as_deref()))
                    .unwrap_or_else(|| format!("Practice {}", rank + 1));

                sets.push(PracticeSet {
                    video_id: video_id.clone(),
                    kind: kind.clone(),
                    title: format!("{video_title} - {}", kind.display_name()),
                    question_count: row.question_count,
                    progress: clamp_progress(row.progress),
                    ordinal: index + 1,
                    original_title: row.title.clone(),
                    display_id: video_id.short(DISPLAY_ID_LEN),
                });
            }
        }
    }
    sets
}

/// First line of a transcript cut to `TITLE_MAX_CHARS`, with `...` when cut.
///
/// `None` when the first line is blank.
#[must_use]
pub fn title_from_transcript(text: &str) -> Option<String> {
    let first_line = text.lines().next().unwrap_or_default().trim();
    if first_line.is_empty() {
        return None;
    }
    let mut chars = first_line.chars();
    let short: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        Some(format!("{short}..."))
    } else {
        Some(short)
    }
}

fn usable_title(title: Option<&str>) -> Option<String> {
    title
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != UNTITLED)
        .map(str::to_owned)
}

fn clamp_progress(progress: Option<f64>) -> f64 {
    match progress {
        Some(p) if p.is_finite() => p.clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// Distinct video ids in feed order; the transcripts to fetch before aggregating.
#[must_use]
pub fn video_ids(raw_sets: &[RawPracticeSet]) -> Vec<VideoId> {
    raw_sets
        .iter()
        .map(|raw| raw.video_id.clone())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Kinds present in the catalog, first-seen order. Drives the kind tabs.
#[must_use]
pub fn available_kinds(sets: &[PracticeSet]) -> Vec<QuestionKind> {
    sets.iter()
        .map(|set| set.kind.clone())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Search box plus kind tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub query: String,
    /// `None` shows all kinds.
    pub kind: Option<QuestionKind>,
}

impl CatalogFilter {
    #[must_use]
    pub fn matches(&self, set: &PracticeSet) -> bool {
        let query = self.query.trim().to_lowercase();
        let title_matches = query.is_empty() || set.title.to_lowercase().contains(&query);
        let kind_matches = self.kind.as_ref().is_none_or(|kind| *kind == set.kind);
        title_matches && kind_matches
    }

    #[must_use]
    pub fn apply<'a>(&self, sets: &'a [PracticeSet]) -> Vec<&'a PracticeSet> {
        sets.iter().filter(|set| self.matches(set)).collect()
    }
}
