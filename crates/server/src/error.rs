//! Error taxonomy for the recommendation service.
//!
//! `RecommendError` is scoped to a single request and knows how to turn itself
//! into an HTTP response. `StartupError` is scoped to the process: any of its
//! variants means the server never starts listening.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use data_loader::{DataLoadError, MovieId, UserId};
use model::ModelError;

/// Errors that end a single recommendation request
#[derive(Error, Debug)]
pub enum RecommendError {
    /// Missing, blank or non-numeric user id, or a zero result count
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The user has no ratings and the service rejects unknown users
    #[error("User {0} has no ratings")]
    UnknownUser(UserId),

    /// The ratings table references a movie the movies table does not have
    #[error("Movie {movie_id} has no title in the movies table")]
    DataConsistency { movie_id: MovieId },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl RecommendError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RecommendError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RecommendError::UnknownUser(_) => StatusCode::NOT_FOUND,
            RecommendError::DataConsistency { .. }
            | RecommendError::Model(_)
            | RecommendError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable tag for the JSON error body
    pub fn kind(&self) -> &'static str {
        match self {
            RecommendError::InvalidInput(_) => "invalid_input",
            RecommendError::UnknownUser(_) => "unknown_user",
            RecommendError::DataConsistency { .. } => "data_consistency",
            RecommendError::Model(_) => "model",
            RecommendError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for RecommendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(kind = self.kind(), "Recommendation request failed: {}", self);
        } else {
            warn!(kind = self.kind(), "Rejected recommendation request: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }));

        (status, body).into_response()
    }
}

/// Errors that prevent the process from serving at all
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Failed to load ratings/movies tables: {0}")]
    Data(#[from] DataLoadError),

    #[error("Failed to load recommendation model: {0}")]
    Model(#[from] ModelError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
