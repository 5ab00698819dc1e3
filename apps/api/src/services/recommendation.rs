use crate::{
    error::Result,
    ml::{cosine_similarity, Embedding, FeatureExtractor},
    models::{Gender, OutfitRecord, Preferences, Recommendation, UserProfile},
    services::{
        candidate_store::{CandidateFilter, CandidateStore},
        scorer::PreferenceScorer,
    },
};
use futures::stream::{self, StreamExt};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{debug, info, warn};

/// Upper bound on the length of a recommendation list
pub const MAX_RECOMMENDATIONS: usize = 5;

const DEFAULT_EXTRACTION_CONCURRENCY: usize = 4;

/// Ranks catalog outfits for a user by visual similarity and preference fit.
#[derive(Clone)]
pub struct RecommendationService {
    extractor: Arc<dyn FeatureExtractor>,
    store: Arc<dyn CandidateStore>,
    scorer: PreferenceScorer,
    extraction_concurrency: usize,
    prewarmed: Arc<AtomicBool>,
}

impl RecommendationService {
    pub fn new(
        extractor: Arc<dyn FeatureExtractor>,
        store: Arc<dyn CandidateStore>,
        scorer: PreferenceScorer,
    ) -> Self {
        Self {
            extractor,
            store,
            scorer,
            extraction_concurrency: DEFAULT_EXTRACTION_CONCURRENCY,
            prewarmed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_extraction_concurrency(mut self, concurrency: usize) -> Self {
        self.extraction_concurrency = concurrency.max(1);
        self
    }

    /// Warms up the feature extractor and the store connection.
    ///
    /// Loads the extractor's model, issues a gender-neutral probe query and
    /// embeds the first usable image it returns. Returns true if this was the
    /// first warm-up.
    pub async fn prewarm(&self) -> Result<bool> {
        if self.prewarmed.load(Ordering::Acquire) {
            debug!("RecommendationService already prewarmed, skipping");
            return Ok(false);
        }

        info!("Warming up RecommendationService...");

        let model_warmed = self.extractor.prewarm().await?;
        debug!("Feature extractor warm-up did work: {}", model_warmed);

        let probe = CandidateFilter::gender_only(Gender::GenderNeutral);
        let candidates = self.store.query(&probe).await?;
        debug!("Prewarm probe returned {} candidates", candidates.len());

        if let Some(image_url) = candidates.iter().find_map(OutfitRecord::usable_image) {
            self.extractor.extract(image_url).await?;
        } else {
            warn!("Prewarm probe found no outfit image; feature extractor stays cold");
        }

        self.prewarmed.store(true, Ordering::Release);
        info!("RecommendationService successfully warmed up");
        Ok(true)
    }

    /// Top outfits for `profile` and `preferences`, best first, at most
    /// [`MAX_RECOMMENDATIONS`] long. An empty list is a valid answer.
    pub async fn rank(
        &self,
        profile: &UserProfile,
        preferences: &Preferences,
    ) -> Result<Vec<Recommendation>> {
        let activities = self.scorer.expand_activity(&preferences.activity);
        let primary = CandidateFilter::primary(profile.gender, &activities, &preferences.formality);
        info!(
            gender = %profile.gender,
            activity = %preferences.activity,
            formality = %preferences.formality,
            "Ranking outfits"
        );

        let candidates = self.retrieve_candidates(&primary).await;
        if candidates.is_empty() {
            info!("No candidates after fallback; returning empty recommendations");
            return Ok(Vec::new());
        }

        let Some((reference_index, reference)) = self.reference_embedding(&candidates).await
        else {
            warn!(
                "No candidate out of {} yielded a reference embedding",
                candidates.len()
            );
            return Ok(Vec::new());
        };

        let mut recommendations = self
            .score_candidates(&primary, candidates, reference_index, &reference, preferences)
            .await;

        // Vec::sort_by is stable, so ties keep retrieval order
        recommendations.sort_by(|a, b| {
            b.confidence_score
                .partial_cmp(&a.confidence_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        recommendations.truncate(MAX_RECOMMENDATIONS);

        info!(
            "Returning {} recommendations. Top score: {:?}",
            recommendations.len(),
            recommendations.first().map(|r| r.confidence_score)
        );

        Ok(recommendations)
    }

    /// Primary query, then a single gender-only fallback when the primary
    /// query yields nothing or fails.
    async fn retrieve_candidates(&self, primary: &CandidateFilter) -> Vec<OutfitRecord> {
        match self.store.query(primary).await {
            Ok(candidates) if !candidates.is_empty() => {
                info!("Primary filter returned {} candidates", candidates.len());
                return candidates;
            }
            Ok(_) => info!("Primary filter returned no candidates, relaxing to gender only"),
            Err(e) => warn!("Primary candidate query failed: {}. Relaxing to gender only", e),
        }

        let fallback = CandidateFilter::gender_only(primary.gender);
        match self.store.query(&fallback).await {
            Ok(candidates) => {
                info!("Gender-only fallback returned {} candidates", candidates.len());
                candidates
            }
            Err(e) => {
                warn!("Fallback candidate query failed: {}", e);
                Vec::new()
            }
        }
    }

    /// First candidate, in retrieval order, whose image embeds successfully.
    async fn reference_embedding(&self, candidates: &[OutfitRecord]) -> Option<(usize, Embedding)> {
        for (index, candidate) in candidates.iter().enumerate() {
            let Some(image_url) = candidate.usable_image() else {
                debug!("Candidate {} has no image, skipping", candidate.id);
                continue;
            };

            match self.extractor.extract(image_url).await {
                Ok(embedding) => {
                    debug!("Using candidate {} as reference", candidate.id);
                    return Some((index, embedding));
                }
                Err(e) => warn!(
                    "Reference extraction failed for candidate {}: {}",
                    candidate.id, e
                ),
            }
        }

        None
    }

    /// Score every candidate from the reference onwards. Candidates before
    /// the reference already failed extraction or had no image.
    async fn score_candidates(
        &self,
        filter: &CandidateFilter,
        candidates: Vec<OutfitRecord>,
        reference_index: usize,
        reference: &Embedding,
        preferences: &Preferences,
    ) -> Vec<Recommendation> {
        let extractor = &self.extractor;

        let embedded: Vec<(OutfitRecord, String, Result<Embedding>)> =
            stream::iter(candidates.into_iter().enumerate().skip(reference_index))
                .filter_map(|(index, candidate)| async move {
                    if !filter.gender.admits(&candidate.gender) {
                        warn!(
                            "Candidate {} has gender '{}' outside the filter, dropping",
                            candidate.id, candidate.gender
                        );
                        return None;
                    }
                    let image_url = candidate.usable_image()?.to_string();
                    Some((index, candidate, image_url))
                })
                .map(|(index, candidate, image_url)| async move {
                    let embedding = if index == reference_index {
                        Ok(reference.clone())
                    } else {
                        extractor.extract(&image_url).await
                    };
                    (candidate, image_url, embedding)
                })
                .buffered(self.extraction_concurrency)
                .collect()
                .await;

        embedded
            .into_iter()
            .filter_map(|(candidate, image_url, embedding)| {
                let similarity = embedding
                    .and_then(|embedding| cosine_similarity(reference, &embedding))
                    .map_err(|e| warn!("Skipping candidate {}: {}", candidate.id, e))
                    .ok()?;

                let confidence = self.scorer.score(&candidate, similarity, preferences);
                debug!(
                    "Candidate {}: similarity {:.4}, confidence {:.4}",
                    candidate.id, similarity, confidence
                );

                Some(Recommendation::from_record(candidate, image_url, confidence))
            })
            .collect()
    }
}
