pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::jobs::handlers as jobs;
use crate::matching::handlers as matching;
use crate::resume::handlers as resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Matching API
        .route("/match", post(matching::handle_match))
        .route("/extract-skills", get(matching::handle_extract_skills))
        .route("/recommendations", get(matching::handle_recommendations))
        .route("/jobs/match-all", post(matching::handle_match_all))
        // Jobs API
        .route("/crawl", post(jobs::handle_crawl))
        .route("/jobs", get(jobs::handle_list_jobs))
        .route("/jobs/:id", get(jobs::handle_get_job))
        .route("/categories", get(jobs::handle_list_categories))
        // Resume API
        .route(
            "/resume/analyze",
            post(resume::handle_analyze_resume)
                .layer(DefaultBodyLimit::max(resume::MAX_RESUME_BYTES)),
        )
        .with_state(state)
}
