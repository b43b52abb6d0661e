//! Server crate for the ReelRecs recommendation engine.
//!
//! This crate contains the recommendation service that coordinates the data
//! tables, the candidate pipeline and the model, plus the two front-ends that
//! expose it: a JSON endpoint and a form page.

pub mod error;
pub mod http;
pub mod orchestrator;
pub mod ui;

pub use error::{RecommendError, StartupError};
pub use http::create_router;
pub use orchestrator::{
    DEFAULT_RECOMMENDATION_COUNT, MovieRecommendation, RecommendationService, ServiceConfig,
    UnknownUserPolicy, parse_user_id, rank_predictions,
};
