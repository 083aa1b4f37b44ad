use std::collections::HashMap;
use std::sync::Arc;

use practice_core::catalog::{aggregate, video_ids};
use practice_core::model::{KindPolicy, PracticeSet, RawPracticeSet, VideoId};

use crate::api::PracticeApi;
use crate::error::ApiError;

/// Loads the practice catalog and titles it from transcripts.
#[derive(Clone)]
pub struct CatalogService {
    api: Arc<dyn PracticeApi>,
    policy: KindPolicy,
}

impl CatalogService {
    #[must_use]
    pub fn new(api: Arc<dyn PracticeApi>, policy: KindPolicy) -> Self {
        Self { api, policy }
    }

    /// Fetches the set feed, then one transcript per video that survives the kind
    /// policy, and aggregates the lot.
    ///
    /// A missing transcript only costs its video the transcript title.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the set feed itself cannot be fetched.
    pub async fn load(&self) -> Result<Vec<PracticeSet>, ApiError> {
        let raw = self.api.fetch_practice_sets().await?;
        let enabled: Vec<RawPracticeSet> = raw
            .iter()
            .filter(|row| self.policy.is_enabled(&row.kind))
            .cloned()
            .collect();

        let mut transcripts: HashMap<VideoId, String> = HashMap::new();
        for video_id in video_ids(&enabled) {
            match self.api.fetch_transcript(&video_id).await {
                Some(transcript) if !transcript.content.trim().is_empty() => {
                    transcripts.insert(video_id, transcript.content);
                }
                _ => log::debug!("no transcript for {video_id}, using fallback title"),
            }
        }

        let sets = aggregate(&raw, &transcripts, &self.policy);
        log::info!(
            "catalog: {} sets from {} feed rows ({} transcripts)",
            sets.len(),
            raw.len(),
            transcripts.len()
        );
        Ok(sets)
    }
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
