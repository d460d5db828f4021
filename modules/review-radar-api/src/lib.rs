pub mod auth;
pub mod jobs;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use review_radar_analysis::AnalysisPipeline;
use review_radar_common::{AnalysisConfig, ServiceConfig};
use review_radar_scraper::ReviewSource;

pub use jobs::{ErrorDetail, Job, JobState, JobStore};

pub struct AppState {
    pub config: ServiceConfig,
    pub analysis: AnalysisConfig,
    pub pipeline: AnalysisPipeline,
    /// Absent when no scraper backend is configured; URL jobs are refused.
    pub source: Option<Arc<dyn ReviewSource>>,
    pub jobs: JobStore,
}

impl AppState {
    pub fn new(config: ServiceConfig, analysis: AnalysisConfig, pipeline: AnalysisPipeline) -> Self {
        let jobs = JobStore::with_ttl(Duration::from_secs(config.job_ttl_secs));
        Self {
            config,
            analysis,
            pipeline,
            source: None,
            jobs,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn ReviewSource>) -> Self {
        self.source = Some(source);
        self
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(routes::health))
        .route("/analyze", post(routes::analyze))
        .route("/results/{job_id}", get(routes::results))
        .route("/status/{job_id}", get(routes::status))
        .with_state(state)
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Method and path only; request bodies carry user text.
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    if parsed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(parsed))
    }
}
