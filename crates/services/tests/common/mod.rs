#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};

use practice_core::model::{
    QuestionKind, QuestionSource, RawPracticeSet, RawQuestion, VideoId,
};
use practice_services::{ApiError, PracticeApi, QuestionBatch, SubmitAck, SubmitRequest, Transcript};

/// Failure the fake should produce on its next call.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Status(u16),
    AuthExpired,
}

impl Failure {
    fn into_error(self) -> ApiError {
        match self {
            Failure::Status(code) => ApiError::HttpStatus {
                status: StatusCode::from_u16(code).unwrap(),
                message: Some("fake failure".into()),
            },
            Failure::AuthExpired => ApiError::AuthExpired,
        }
    }
}

/// Scripted in-memory backend.
#[derive(Default)]
pub struct FakeApi {
    pub batches: Mutex<HashMap<QuestionSource, QuestionBatch>>,
    pub fetch_failure: Mutex<Option<Failure>>,
    pub generated: Mutex<Vec<RawQuestion>>,
    pub generate_failure: Mutex<Option<Failure>>,
    pub submit_failures: Mutex<VecDeque<Failure>>,
    pub ack_is_correct: Mutex<Option<bool>>,
    pub submissions: Mutex<Vec<SubmitRequest>>,
    pub sets: Mutex<Vec<RawPracticeSet>>,
    pub sets_failure: Mutex<Option<Failure>>,
    pub transcripts: Mutex<HashMap<VideoId, String>>,
    pub transcript_requests: Mutex<Vec<VideoId>>,
    pub fetch_calls: AtomicUsize,
    pub generate_calls: AtomicUsize,
}

impl FakeApi {
    pub fn with_batch(self, source: QuestionSource, batch: QuestionBatch) -> Self {
        self.batches.lock().unwrap().insert(source, batch);
        self
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<SubmitRequest> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn fail_next_submit(&self, failure: Failure) {
        self.submit_failures.lock().unwrap().push_back(failure);
    }
}

#[async_trait]
impl PracticeApi for FakeApi {
    async fn fetch_questions(&self, source: &QuestionSource) -> Result<QuestionBatch, ApiError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = *self.fetch_failure.lock().unwrap() {
            return Err(failure.into_error());
        }
        Ok(self
            .batches
            .lock()
            .unwrap()
            .get(source)
            .cloned()
            .unwrap_or_default())
    }

    async fn generate_questions(
        &self,
        _source: &QuestionSource,
        _kind: &QuestionKind,
    ) -> Result<Vec<RawQuestion>, ApiError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = *self.generate_failure.lock().unwrap() {
            return Err(failure.into_error());
        }
        Ok(self.generated.lock().unwrap().clone())
    }

    async fn submit_answer(&self, request: &SubmitRequest) -> Result<SubmitAck, ApiError> {
        if let Some(failure) = self.submit_failures.lock().unwrap().pop_front() {
            return Err(failure.into_error());
        }
        self.submissions.lock().unwrap().push(request.clone());
        Ok(SubmitAck {
            success: Some(true),
            is_correct: *self.ack_is_correct.lock().unwrap(),
            ..SubmitAck::default()
        })
    }

    async fn fetch_transcript(&self, video_id: &VideoId) -> Option<Transcript> {
        self.transcript_requests.lock().unwrap().push(video_id.clone());
        self.transcripts
            .lock()
            .unwrap()
            .get(video_id)
            .map(|content| Transcript {
                content: content.clone(),
                title: None,
            })
    }

    async fn fetch_practice_sets(&self) -> Result<Vec<RawPracticeSet>, ApiError> {
        if let Some(failure) = *self.sets_failure.lock().unwrap() {
            return Err(failure.into_error());
        }
        Ok(self.sets.lock().unwrap().clone())
    }
}

pub fn raw_question(id: &str, text: &str, answer: &str) -> RawQuestion {
    raw(json!({"_id": id, "question_text": text, "answer": answer}))
}

pub fn raw(value: Value) -> RawQuestion {
    serde_json::from_value(value).unwrap()
}
