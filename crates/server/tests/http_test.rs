//! End-to-end tests for the HTTP surface.
//!
//! The router is driven with `tower::ServiceExt::oneshot`, so no socket is
//! bound. The main fixture is written to a temp directory and loaded through
//! `RecommendationService::load`, the same path the binary takes.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use data_loader::{DataIndex, Movie, Rating};
use model::{Algorithm, FactorModel, LatentEntry, ModelArtifact, ModelError};
use server::{
    RecommendationService, ServiceConfig, StartupError, UnknownUserPolicy, create_router,
};

// ============================================================================
// Fixtures
// ============================================================================

const RATINGS_CSV: &str = "userId,movieId,rating,timestamp
1,10,4.0,964982703
1,20,3.0,964981247
2,10,5.0,964982224
2,30,2.5,964983815
";

const MOVIES_CSV: &str = "movieId,title,genres
10,Alpha (1990),Action
20,Beta (1991),Comedy|Drama
30,Gamma (1992),Drama
40,Tom & Jerry <Special> (1993),Animation|Children
";

// User 1 has not rated 30 (est 4.05) or 40 (est 4.40)
const MODEL_JSON: &str = r#"{
  "algorithm": "svd",
  "global_mean": 3.5,
  "rating_scale": [0.5, 5.0],
  "n_factors": 2,
  "users": [
    {"id": 1, "bias": 0.1, "factors": [0.2, 0.1]},
    {"id": 2, "bias": -0.1, "factors": [0.0, 0.3]}
  ],
  "items": [
    {"id": 10, "bias": 0.2, "factors": [0.1, 0.1]},
    {"id": 20, "bias": -0.3, "factors": [0.2, 0.0]},
    {"id": 30, "bias": 0.3, "factors": [0.5, 0.5]},
    {"id": 40, "bias": 0.5, "factors": [1.0, 1.0]}
  ]
}"#;

fn write_fixture(dir: &Path) {
    fs::write(dir.join("ratings.csv"), RATINGS_CSV).unwrap();
    fs::write(dir.join("movies.csv"), MOVIES_CSV).unwrap();
    fs::write(dir.join("recommendation_model.json"), MODEL_JSON).unwrap();
}

fn fixture_service(config: ServiceConfig) -> (TempDir, RecommendationService) {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    let service = RecommendationService::load(
        dir.path(),
        &dir.path().join("recommendation_model.json"),
        config,
    )
    .unwrap();
    (dir, service)
}

fn fixture_router() -> (TempDir, Router) {
    let (dir, service) = fixture_service(ServiceConfig::default());
    (dir, create_router(service))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn get_html(app: Router, uri: &str) -> (StatusCode, String) {
    let (status, body) = get(app, uri).await;
    (status, String::from_utf8(body).unwrap())
}

// ============================================================================
// /predict
// ============================================================================

#[tokio::test]
async fn predict_returns_title_rating_pairs() {
    let (_dir, app) = fixture_router();

    let (status, json) = get_json(app, "/predict?user_id=1").await;

    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0][0], "Tom & Jerry <Special> (1993)");
    assert!((rows[0][1].as_f64().unwrap() - 4.40).abs() < 1e-4);
    assert_eq!(rows[1][0], "Gamma (1992)");
    assert!((rows[1][1].as_f64().unwrap() - 4.05).abs() < 1e-4);
}

#[tokio::test]
async fn predict_never_returns_rated_movies() {
    let (_dir, app) = fixture_router();

    let (_, json) = get_json(app, "/predict?user_id=2").await;

    let titles: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row[0].as_str().unwrap())
        .collect();
    assert_eq!(titles.len(), 2);
    assert!(!titles.contains(&"Alpha (1990)"));
    assert!(!titles.contains(&"Gamma (1992)"));
}

#[tokio::test]
async fn predict_without_user_id_is_bad_request() {
    let (_dir, app) = fixture_router();

    let (status, json) = get_json(app, "/predict").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "invalid_input");
    assert!(json["error"].as_str().unwrap().contains("user_id"));
}

#[tokio::test]
async fn predict_with_non_numeric_user_id_is_bad_request() {
    let (_dir, app) = fixture_router();

    for uri in ["/predict?user_id=abc", "/predict?user_id=", "/predict?user_id=-4"] {
        let (status, json) = get_json(app.clone(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["kind"], "invalid_input");
    }
}

#[tokio::test]
async fn predict_cold_starts_unknown_user() {
    let (_dir, app) = fixture_router();

    let (status, json) = get_json(app, "/predict?user_id=999").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn predict_rejects_unknown_user_when_configured() {
    let config = ServiceConfig {
        unknown_user_policy: UnknownUserPolicy::Reject,
        ..Default::default()
    };
    let (_dir, service) = fixture_service(config);

    let (status, json) = get_json(create_router(service), "/predict?user_id=999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "unknown_user");
}

#[tokio::test]
async fn predict_reports_missing_title_as_server_error() {
    let mut index = DataIndex::new();
    index.insert_movie(Movie {
        id: 10,
        title: "Alpha (1990)".to_string(),
        genres: vec![],
    });
    for (user_id, movie_id) in [(1, 10), (2, 99)] {
        index.insert_rating(Rating {
            user_id,
            movie_id,
            rating: 4.0,
            timestamp: None,
        });
    }
    let model = FactorModel::from_artifact(ModelArtifact {
        algorithm: Algorithm::Baseline,
        global_mean: 3.0,
        rating_scale: (0.5, 5.0),
        n_factors: 0,
        users: vec![],
        items: vec![LatentEntry {
            id: 99,
            bias: 1.0,
            factors: vec![],
        }],
    })
    .unwrap();
    let service = RecommendationService::new(Arc::new(index), Arc::new(model));

    let (status, json) = get_json(create_router(service), "/predict?user_id=1").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["kind"], "data_consistency");
    assert!(json["error"].as_str().unwrap().contains("99"));
}

#[tokio::test]
async fn predict_with_repeated_user_id_is_structured_bad_request() {
    let (_dir, app) = fixture_router();

    let (status, json) = get_json(app, "/predict?user_id=1&user_id=2").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "invalid_input");
    assert!(json["error"].as_str().unwrap().contains("user_id"));
}

fn fully_rated_router() -> Router {
    let mut index = DataIndex::new();
    index.insert_movie(Movie {
        id: 10,
        title: "Alpha (1990)".to_string(),
        genres: vec![],
    });
    index.insert_rating(Rating {
        user_id: 1,
        movie_id: 10,
        rating: 4.0,
        timestamp: None,
    });
    let model = FactorModel::from_artifact(ModelArtifact {
        algorithm: Algorithm::Baseline,
        global_mean: 3.0,
        rating_scale: (0.5, 5.0),
        n_factors: 0,
        users: vec![],
        items: vec![],
    })
    .unwrap();
    create_router(RecommendationService::new(Arc::new(index), Arc::new(model)))
}

#[tokio::test]
async fn predict_with_nothing_left_to_recommend_is_ok_and_empty() {
    let (status, json) = get_json(fully_rated_router(), "/predict?user_id=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!([]));
}

// ============================================================================
// /health
// ============================================================================

#[tokio::test]
async fn health_reports_table_sizes() {
    let (_dir, app) = fixture_router();

    let (status, json) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["model"], "svd");
    assert_eq!(json["users"], 2);
    assert_eq!(json["movies"], 4);
    assert_eq!(json["ratings"], 4);
}

// ============================================================================
// Form page
// ============================================================================

#[tokio::test]
async fn form_without_input_shows_prompt() {
    let (_dir, app) = fixture_router();

    for uri in ["/", "/?user_id=", "/?user_id=%20%20"] {
        let (status, html) = get_html(app.clone(), uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(html.contains("Please enter your user id for your next movie recommendation :)"));
        assert!(html.contains("User Id"));
        assert!(!html.contains("Top Movie Recommendations:"));
    }
}

#[tokio::test]
async fn form_renders_escaped_results_table() {
    let (_dir, app) = fixture_router();

    let (status, html) = get_html(app, "/?user_id=1").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Top Movie Recommendations:"));
    assert!(html.contains("<th>Movies</th><th>Ratings</th>"));
    assert!(html.contains("<td>Tom &amp; Jerry &lt;Special&gt; (1993)</td><td>4.40</td>"));
    assert!(html.contains("<td>Gamma (1992)</td><td>4.05</td>"));
    assert!(!html.contains("<Special>"));
}

#[tokio::test]
async fn form_with_bad_input_is_bad_request() {
    let (_dir, app) = fixture_router();

    let (status, html) = get_html(app, "/?user_id=abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(html.contains("user_id must be a non-negative integer"));
    assert!(html.contains("value=\"abc\""));
}

#[tokio::test]
async fn form_with_repeated_user_id_renders_error_page() {
    let (_dir, app) = fixture_router();

    let (status, html) = get_html(app, "/?user_id=1&user_id=2").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(html.contains("<form"));
    assert!(html.contains("Invalid input"));
    assert!(!html.contains("Top Movie Recommendations:"));
}

#[tokio::test]
async fn form_with_nothing_left_to_recommend_renders_empty_table() {
    let (status, html) = get_html(fully_rated_router(), "/?user_id=1").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Top Movie Recommendations:"));
    assert!(html.contains("<th>Movies</th><th>Ratings</th>"));
    assert!(!html.contains("<td>"));
}

// ============================================================================
// Startup
// ============================================================================

#[test]
fn load_fails_without_model_artifact() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());

    let result = RecommendationService::load(
        dir.path(),
        &dir.path().join("missing.json"),
        ServiceConfig::default(),
    );

    assert!(matches!(
        result,
        Err(StartupError::Model(ModelError::ArtifactNotFound { .. }))
    ));
}

#[test]
fn load_fails_without_ratings_table() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    fs::remove_file(dir.path().join("ratings.csv")).unwrap();

    let result = RecommendationService::load(
        dir.path(),
        &dir.path().join("recommendation_model.json"),
        ServiceConfig::default(),
    );

    assert!(matches!(result, Err(StartupError::Data(_))));
}
