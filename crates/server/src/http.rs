use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::error::RecommendError;
use crate::orchestrator::{DEFAULT_RECOMMENDATION_COUNT, RecommendationService, parse_user_id};
use crate::ui;

/// Raw `user_id` query parameter, validated by [`parse_user_id`]
#[derive(Debug, Default, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Option<String>,
}

impl UserIdQuery {
    /// Unwrap the extractor result, turning a malformed query string into
    /// `InvalidInput`
    pub fn from_extracted(
        query: Result<Query<UserIdQuery>, QueryRejection>,
    ) -> Result<Self, RecommendError> {
        query
            .map(|Query(params)| params)
            .map_err(|rejection| RecommendError::InvalidInput(rejection.body_text()))
    }
}

/// Creates the application router with all routes
pub fn create_router(service: RecommendationService) -> Router {
    Router::new()
        .route("/", get(ui::recommendation_page))
        .route("/predict", get(predict))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Top recommendations as `[["Title", 4.31], ...]`
#[instrument(skip_all)]
async fn predict(
    State(service): State<RecommendationService>,
    query: Result<Query<UserIdQuery>, QueryRejection>,
) -> Result<Json<Vec<(String, f32)>>, RecommendError> {
    let params = UserIdQuery::from_extracted(query)?;
    let user_id = parse_user_id(params.user_id.as_deref())?;
    let recommendations = service
        .recommend_blocking(user_id, DEFAULT_RECOMMENDATION_COUNT)
        .await?;

    Ok(Json(
        recommendations
            .into_iter()
            .map(|r| (r.title, r.estimated_rating))
            .collect(),
    ))
}

/// Health check endpoint
async fn health_check(State(service): State<RecommendationService>) -> (StatusCode, Json<Value>) {
    let (users, movies, ratings) = service.data_index().counts();
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "model": service.model_name(),
            "users": users,
            "movies": movies,
            "ratings": ratings,
        })),
    )
}
