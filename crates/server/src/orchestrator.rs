//! # Recommendation Service
//!
//! Coordinates one recommendation request:
//! 1. Build the user context (rated set)
//! 2. Take the candidate universe from the catalog source
//! 3. Filter out movies the user already rated
//! 4. Score every remaining candidate with the model
//! 5. Rank by estimated rating and keep the top N
//! 6. Attach titles from the movies table
//!
//! The service is built once at startup around an immutable snapshot of the
//! tables and the loaded model, then cloned into every request handler.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use data_loader::{DataIndex, MovieId, UserId};
use model::{FactorModel, Prediction, Recommender};
use pipeline::filters::AlreadyRatedFilter;
use pipeline::{Candidate, CandidateUniverse, CatalogSource, FilterPipeline, UserContext};

use crate::error::{RecommendError, StartupError};

/// Result count used by both front-ends
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 5;

/// One entry of the final, ranked result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieRecommendation {
    pub movie_id: MovieId,
    pub title: String,
    pub estimated_rating: f32,
}

/// What to do with a user id that has no row in the ratings table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownUserPolicy {
    /// Treat the user as having rated nothing and score the whole universe
    #[default]
    ColdStart,
    /// Fail the request with `RecommendError::UnknownUser`
    Reject,
}

/// Knobs fixed at construction time
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceConfig {
    pub universe: CandidateUniverse,
    pub unknown_user_policy: UnknownUserPolicy,
}

/// Service object holding the loaded model and tables
#[derive(Clone)]
pub struct RecommendationService {
    data_index: Arc<DataIndex>,
    model: Arc<dyn Recommender>,
    catalog: CatalogSource,
    filter_pipeline: Arc<FilterPipeline>,
    config: ServiceConfig,
}

impl RecommendationService {
    /// Create a service with the default configuration
    pub fn new(data_index: Arc<DataIndex>, model: Arc<dyn Recommender>) -> Self {
        Self::with_config(data_index, model, ServiceConfig::default())
    }

    pub fn with_config(
        data_index: Arc<DataIndex>,
        model: Arc<dyn Recommender>,
        config: ServiceConfig,
    ) -> Self {
        let catalog = CatalogSource::new(&data_index, config.universe);
        let filter_pipeline = Arc::new(FilterPipeline::new().add_filter(AlreadyRatedFilter));

        info!(
            model = model.name(),
            universe = ?catalog.universe(),
            candidates = catalog.len(),
            filters = ?filter_pipeline.filter_names(),
            unknown_users = ?config.unknown_user_policy,
            "Recommendation service ready"
        );

        Self {
            data_index,
            model,
            catalog,
            filter_pipeline,
            config,
        }
    }

    /// Load the model artifact and both tables, then build the service.
    ///
    /// Any failure here is a startup failure: nothing has been served yet.
    pub fn load(
        data_dir: &Path,
        model_path: &Path,
        config: ServiceConfig,
    ) -> Result<Self, StartupError> {
        let model = FactorModel::load(model_path)?;
        let data_index = DataIndex::load_from_dir(data_dir)?;
        Ok(Self::with_config(Arc::new(data_index), Arc::new(model), config))
    }

    pub fn data_index(&self) -> &Arc<DataIndex> {
        &self.data_index
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Main entry point: top-`n` unrated movies for a user.
    ///
    /// # Returns
    /// At most `n` recommendations, highest estimated rating first. Equal
    /// estimates are ordered by ascending movie id.
    #[instrument(skip(self), fields(model = self.model.name()))]
    pub fn recommend(
        &self,
        user_id: UserId,
        n: usize,
    ) -> Result<Vec<MovieRecommendation>, RecommendError> {
        if n == 0 {
            return Err(RecommendError::InvalidInput(
                "number of recommendations must be at least 1".to_string(),
            ));
        }
        let start_time = Instant::now();

        let context = self.build_user_context(user_id)?;

        let candidates = self
            .filter_pipeline
            .apply(self.catalog.get_candidates(), &context)
            .context("Failed to build candidate set")?;
        debug!(
            universe = self.catalog.len(),
            rated = context.rated_movies.len(),
            avg_rating = context.avg_rating,
            candidates = candidates.len(),
            "Built candidate set"
        );

        let predictions = self.score_candidates(user_id, &candidates)?;
        let top = rank_predictions(predictions, n);
        let recommendations = self.attach_titles(top)?;

        info!(
            user_id,
            candidates = candidates.len(),
            returned = recommendations.len(),
            elapsed = ?start_time.elapsed(),
            "Computed recommendations"
        );
        Ok(recommendations)
    }

    /// Run [`Self::recommend`] on the blocking pool.
    ///
    /// Scoring is a synchronous O(movies) scan, so async handlers must not run
    /// it on a runtime worker.
    pub async fn recommend_blocking(
        &self,
        user_id: UserId,
        n: usize,
    ) -> Result<Vec<MovieRecommendation>, RecommendError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.recommend(user_id, n))
            .await
            .context("Recommendation task panicked")?
    }

    /// Build the user context and apply the unknown-user policy
    fn build_user_context(&self, user_id: UserId) -> Result<UserContext, RecommendError> {
        let context = pipeline::build_user_context(&self.data_index, user_id);
        if !context.is_known() {
            match self.config.unknown_user_policy {
                UnknownUserPolicy::Reject => return Err(RecommendError::UnknownUser(user_id)),
                UnknownUserPolicy::ColdStart => {
                    info!(user_id, "User has no ratings, scoring the whole universe")
                }
            }
        }
        Ok(context)
    }

    /// One synchronous `predict` call per candidate
    fn score_candidates(
        &self,
        user_id: UserId,
        candidates: &[Candidate],
    ) -> Result<Vec<Prediction>, RecommendError> {
        let mut predictions = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            predictions.push(self.model.predict(user_id, candidate.movie_id)?);
        }
        Ok(predictions)
    }

    /// Pair each prediction with its title, by exact movie id
    fn attach_titles(
        &self,
        predictions: Vec<Prediction>,
    ) -> Result<Vec<MovieRecommendation>, RecommendError> {
        predictions
            .into_iter()
            .map(|prediction| {
                let title = self.data_index.get_title(prediction.movie_id).ok_or_else(|| {
                    error!(
                        movie_id = prediction.movie_id,
                        "Recommended movie is missing from the movies table"
                    );
                    RecommendError::DataConsistency {
                        movie_id: prediction.movie_id,
                    }
                })?;
                Ok(MovieRecommendation {
                    movie_id: prediction.movie_id,
                    title: title.to_string(),
                    estimated_rating: prediction.estimate,
                })
            })
            .collect()
    }
}

/// Sort by estimate descending and keep the first `n`.
///
/// Ties are broken by ascending movie id; NaN estimates sort last.
pub fn rank_predictions(mut predictions: Vec<Prediction>, n: usize) -> Vec<Prediction> {
    predictions.sort_by(compare_predictions);
    predictions.truncate(n);
    predictions
}

fn compare_predictions(a: &Prediction, b: &Prediction) -> Ordering {
    let by_estimate = match (a.estimate.is_nan(), b.estimate.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b
            .estimate
            .partial_cmp(&a.estimate)
            .unwrap_or(Ordering::Equal),
    };
    by_estimate.then_with(|| a.movie_id.cmp(&b.movie_id))
}

/// Parse a raw `user_id` parameter.
///
/// Missing, blank, negative, non-numeric and out-of-range values are all
/// `InvalidInput`.
pub fn parse_user_id(raw: Option<&str>) -> Result<UserId, RecommendError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RecommendError::InvalidInput("user_id is required".to_string()))?;

    raw.parse::<UserId>().map_err(|e| {
        RecommendError::InvalidInput(format!(
            "user_id must be a non-negative integer, got '{raw}' ({e})"
        ))
    })
}
