use practice_core::PracticeSession;
use practice_core::catalog::{UNTITLED, title_from_transcript};
use practice_core::model::QuestionSource;

const FALLBACK_TITLE: &str = "Practice Set";

/// A session as handed to the presentation layer, plus the context fetched with it.
#[derive(Debug)]
pub struct OpenedSession {
    pub session: PracticeSession,
    pub transcript: Option<String>,
}

impl OpenedSession {
    /// Title for the session header.
    ///
    /// Prefers the video title carried on the first question, then the transcript's
    /// first line, then a generic label. Practice sets append their kind.
    #[must_use]
    pub fn heading(&self) -> String {
        let title = self
            .session
            .questions()
            .first()
            .and_then(|q| q.video_title_hint())
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != UNTITLED)
            .map(str::to_owned)
            .or_else(|| self.transcript.as_deref().and_then(title_from_transcript))
            .unwrap_or_else(|| FALLBACK_TITLE.to_string());

        match self.session.source() {
            QuestionSource::PracticeSet { kind, .. } => {
                format!("{title} - {}", kind.display_name())
            }
            QuestionSource::Transcript(_) => title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use practice_core::model::{
        KindPolicy, Question, QuestionId, QuestionKind, TranscriptId, VideoId,
    };

    fn opened(source: QuestionSource, hint: Option<&str>, transcript: Option<&str>) -> OpenedSession {
        let mut session = PracticeSession::open(source, &KindPolicy::default());
        let mut question = Question::new(QuestionId::new("q1"), "?", QuestionKind::Novice);
        if let Some(hint) = hint {
            question = question.with_video_title_hint(hint);
        }
        session.load_questions(vec![question.with_answer("a")]);
        OpenedSession {
            session,
            transcript: transcript.map(str::to_owned),
        }
    }

    #[test]
    fn question_hint_wins() {
        let source = QuestionSource::practice_set(VideoId::new("v1"), QuestionKind::Factual);
        let opened = opened(source, Some("Market Day"), Some("Transcript line"));
        assert_eq!(opened.heading(), "Market Day - Factual");
    }

    #[test]
    fn untitled_hint_falls_back_to_transcript() {
        let source = QuestionSource::practice_set(VideoId::new("v1"), QuestionKind::Novice);
        let opened = opened(source, Some(UNTITLED), Some("Transcript line\nrest"));
        assert_eq!(opened.heading(), "Transcript line - Novice");
    }

    #[test]
    fn transcript_panel_has_no_kind_suffix() {
        let source = QuestionSource::Transcript(TranscriptId::new("t1"));
        let opened = opened(source, None, None);
        assert_eq!(opened.heading(), FALLBACK_TITLE);
    }
}
