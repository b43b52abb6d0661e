//! Pre-trained recommendation model and the capability the service scores with.
//!
//! This crate provides:
//! - The [`Recommender`] trait: anything that maps a (user, movie) pair to an
//!   estimated rating
//! - [`FactorModel`], the model shipped as a JSON artifact and loaded once at
//!   process start
//!
//! Training is out of scope: the artifact is produced elsewhere and treated as
//! read-only input.

use serde::Serialize;
use thiserror::Error;

use data_loader::{MovieId, UserId};

pub mod factor;

pub use factor::{Algorithm, FactorModel, LatentEntry, ModelArtifact};

/// Conventional file name of the model artifact
pub const DEFAULT_MODEL_FILE: &str = "recommendation_model.json";

/// Errors that can occur when loading or querying a model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model artifact not found: {path}")]
    ArtifactNotFound { path: String },

    #[error("I/O error reading model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed model artifact: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Prediction failed for user {user_id}, movie {movie_id}: {reason}")]
    Prediction {
        user_id: UserId,
        movie_id: MovieId,
        reason: String,
    },
}

/// One model output for a (user, candidate movie) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Estimated rating, used purely for ranking
    pub estimate: f32,
}

/// A recommender capability: estimates how a user would rate a movie.
///
/// `Send + Sync` lets one loaded model be shared read-only by every request.
pub trait Recommender: Send + Sync {
    /// Returns the name of this model (for logging)
    fn name(&self) -> &str;

    /// Estimate the rating `user_id` would give `movie_id`.
    ///
    /// Unknown users and movies are not an error; how they are scored is up
    /// to the implementation.
    fn predict(&self, user_id: UserId, movie_id: MovieId) -> Result<Prediction, ModelError>;
}
