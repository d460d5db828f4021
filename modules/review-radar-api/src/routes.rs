use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use review_radar_common::{
    AnalysisResult, AnalysisSummary, AuthenticityMetrics, AverageConfidence, Grade,
    KeywordWeight, Result, ReviewRadarError,
};
use review_radar_scraper::parse_product_url;

use crate::auth::ApiKey;
use crate::jobs::JobState;
use crate::AppState;

// --- Request / response types ---

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Review texts to analyse directly.
    pub reviews: Option<Vec<String>>,
    /// Product page to scrape instead.
    pub url: Option<String>,
    pub max_reviews: Option<usize>,
    pub aspects: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct DoneResponse<'a> {
    job_id: Uuid,
    status: &'static str,
    #[serde(flatten)]
    summary: AnalysisSummary,
    top_positive: &'a [KeywordWeight],
    top_negative: &'a [KeywordWeight],
    overall_rating_stars: f64,
    positive_percent: f64,
    grade: Grade,
    average_confidence: AverageConfidence,
    authenticity_metrics: AuthenticityMetrics,
    generated_at: DateTime<Utc>,
}

/// What a job starts from.
#[derive(Debug, Clone)]
pub enum JobInput {
    Reviews(Vec<String>),
    Url { url: String, max_reviews: usize },
}

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({"code": code, "message": message.into()})),
    )
        .into_response()
}

// --- Handlers ---

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

pub async fn analyze(
    _key: ApiKey,
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalyzeRequest>,
) -> Response {
    let input = match (body.reviews, body.url) {
        (Some(reviews), None) => {
            if reviews.iter().all(|r| r.trim().is_empty()) {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "invalid_input",
                    "reviews must contain at least one non-empty text",
                );
            }
            JobInput::Reviews(reviews)
        }
        (None, Some(url)) => {
            if let Err(e) = parse_product_url(&url) {
                return error_response(StatusCode::BAD_REQUEST, "invalid_input", e.to_string());
            }
            if state.source.is_none() {
                return error_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "invalid_config",
                    "URL scraping is not configured on this server",
                );
            }
            JobInput::Url {
                url,
                max_reviews: state.config.clamp_max_reviews(body.max_reviews),
            }
        }
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid_input",
                "provide exactly one of `reviews` or `url`",
            )
        }
    };

    let aspects = body
        .aspects
        .filter(|a| a.iter().any(|s| !s.trim().is_empty()))
        .unwrap_or_else(|| state.config.default_aspects.clone());

    let job_id = state.jobs.create().await;
    info!(%job_id, aspects = aspects.len(), "Analysis job accepted");
    tokio::spawn(run_job(state.clone(), job_id, input, aspects));

    (StatusCode::ACCEPTED, Json(json!({"job_id": job_id}))).into_response()
}

pub async fn results(State(state): State<Arc<AppState>>, Path(job_id): Path<String>) -> Response {
    let Some((id, job)) = lookup(&state, &job_id).await else {
        return not_found(&job_id);
    };

    match job.state {
        JobState::Pending => (
            StatusCode::ACCEPTED,
            Json(json!({"job_id": id, "status": "pending"})),
        )
            .into_response(),
        JobState::Error(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"job_id": id, "status": "error", "error": error})),
        )
            .into_response(),
        JobState::Done(result) => {
            let body = DoneResponse {
                job_id: id,
                status: "done",
                summary: result.summary(),
                top_positive: &result.top_positive,
                top_negative: &result.top_negative,
                overall_rating_stars: result.overall_rating_stars,
                positive_percent: result.positive_percent,
                grade: result.grade,
                average_confidence: result.average_confidence,
                authenticity_metrics: result.authenticity,
                generated_at: job.updated_at,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
    }
}

pub async fn status(State(state): State<Arc<AppState>>, Path(job_id): Path<String>) -> Response {
    match lookup(&state, &job_id).await {
        Some((_, job)) => Json(json!({"status": job.state.as_str()})).into_response(),
        None => not_found(&job_id),
    }
}

async fn lookup(state: &AppState, job_id: &str) -> Option<(Uuid, crate::jobs::Job)> {
    let id = Uuid::parse_str(job_id).ok()?;
    state.jobs.get(&id).await.map(|job| (id, job))
}

fn not_found(job_id: &str) -> Response {
    let err = ReviewRadarError::JobNotFound(job_id.to_string());
    error_response(StatusCode::NOT_FOUND, err.code(), err.to_string())
}

// --- Background job ---

/// Run one job to completion and commit exactly one outcome.
pub async fn run_job(state: Arc<AppState>, job_id: Uuid, input: JobInput, aspects: Vec<String>) {
    let limit = Duration::from_secs(state.config.analysis_timeout_secs);
    let outcome = match tokio::time::timeout(limit, execute(&state, input, &aspects)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ReviewRadarError::Analysis(format!(
            "analysis timed out after {}s",
            limit.as_secs()
        ))),
    };

    match &outcome {
        Ok(result) => info!(%job_id, n_reviews = result.n_reviews, "Job done"),
        Err(e) => warn!(%job_id, code = e.code(), error = %e, "Job failed"),
    }
    state.jobs.finish(job_id, outcome).await;
}

async fn execute(state: &AppState, input: JobInput, aspects: &[String]) -> Result<AnalysisResult> {
    let reviews = match input {
        JobInput::Reviews(reviews) => reviews,
        JobInput::Url { url, max_reviews } => {
            let source = state.source.as_ref().ok_or_else(|| {
                ReviewRadarError::Config("URL scraping is not configured".to_string())
            })?;
            let limit = Duration::from_secs(state.config.scrape_timeout_secs);
            tokio::time::timeout(limit, source.fetch(&url, max_reviews))
                .await
                .map_err(|_| {
                    ReviewRadarError::Scraping(format!(
                        "scrape timed out after {}s",
                        limit.as_secs()
                    ))
                })??
        }
    };

    state.pipeline.run(&reviews, aspects, &state.analysis).await
}
