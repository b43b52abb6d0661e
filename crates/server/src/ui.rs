//! Form-based page served at `/`.
//!
//! A single `User Id` input submits back to the same page with GET. The page
//! is rendered server-side from plain strings; every title is escaped before
//! it reaches the markup.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::{Html, IntoResponse, Response},
};
use tracing::warn;

use crate::error::RecommendError;
use crate::http::UserIdQuery;
use crate::orchestrator::{
    DEFAULT_RECOMMENDATION_COUNT, MovieRecommendation, RecommendationService, parse_user_id,
};

pub const PROMPT: &str = "Please enter your user id for your next movie recommendation :)";
pub const RESULTS_HEADING: &str = "Top Movie Recommendations:";

pub async fn recommendation_page(
    State(service): State<RecommendationService>,
    query: Result<Query<UserIdQuery>, QueryRejection>,
) -> Response {
    let params = match UserIdQuery::from_extracted(query) {
        Ok(params) => params,
        Err(e) => return error_page("", e),
    };
    let raw = params.user_id.as_deref().map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Html(render_page(raw, &prompt_section())).into_response();
    }

    let result = match parse_user_id(Some(raw)) {
        Ok(user_id) => {
            service
                .recommend_blocking(user_id, DEFAULT_RECOMMENDATION_COUNT)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(recommendations) => {
            Html(render_page(raw, &results_section(&recommendations))).into_response()
        }
        Err(e) => error_page(raw, e),
    }
}

fn error_page(raw: &str, err: RecommendError) -> Response {
    let status = err.status_code();
    warn!(status = status.as_u16(), kind = err.kind(), "Form request failed: {}", err);

    let body = format!(
        "<p class=\"error\">{} ({})</p>",
        escape_html(&err.to_string()),
        status.as_u16()
    );
    (status, Html(render_page(raw, &body))).into_response()
}

fn prompt_section() -> String {
    format!("<p>{PROMPT}</p>")
}

fn results_section(recommendations: &[MovieRecommendation]) -> String {
    let mut html = format!("<h2>{RESULTS_HEADING}</h2>\n");
    html.push_str("<table style=\"margin: 0 auto; text-align: center;\">\n");
    html.push_str("  <tr><th>Movies</th><th>Ratings</th></tr>\n");
    for rec in recommendations {
        html.push_str(&format!(
            "  <tr><td>{}</td><td>{:.2}</td></tr>\n",
            escape_html(&rec.title),
            rec.estimated_rating
        ));
    }
    html.push_str("</table>");
    html
}

fn render_page(user_id: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Movie Recommendations</title>
</head>
<body style="text-align: center;">
  <h1>Movie Recommendations</h1>
  <form method="get" action="/">
    <label for="user_id">User Id</label>
    <input type="text" id="user_id" name="user_id" value="{}">
    <button type="submit">Recommend</button>
  </form>
  {}
</body>
</html>
"#,
        escape_html(user_id),
        body
    )
}

/// Escape the five characters that are significant in HTML text and attributes
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
