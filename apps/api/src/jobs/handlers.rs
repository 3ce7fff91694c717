use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::jobs::crawler::CrawlRequest;
use crate::jobs::store;
use crate::models::job::{CategoryRow, JobWithCategories};
use crate::state::AppState;

pub const DEFAULT_LIST_LIMIT: i64 = 100;
pub const MAX_LIST_LIMIT: i64 = 500;

#[derive(Deserialize)]
pub struct ListJobsQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct CrawlResponse {
    pub ok: bool,
    pub saved: u32,
    pub db_count: i64,
    pub pages_visited: u32,
}

#[derive(Serialize)]
pub struct JobListResponse {
    pub ok: bool,
    pub count: i64,
    pub jobs: Vec<JobWithCategories>,
}

#[derive(Serialize)]
pub struct JobResponse {
    pub ok: bool,
    pub job: JobWithCategories,
}

#[derive(Serialize)]
pub struct CategoryListResponse {
    pub ok: bool,
    pub categories: Vec<CategoryRow>,
}

/// POST /crawl
pub async fn handle_crawl(
    State(state): State<AppState>,
    Json(req): Json<CrawlRequest>,
) -> Result<Json<CrawlResponse>, AppError> {
    let summary = state.crawler.run(&state.db, &req).await?;
    Ok(Json(CrawlResponse {
        ok: true,
        saved: summary.saved,
        db_count: summary.db_count,
        pages_visited: summary.pages_visited,
    }))
}

/// GET /jobs?limit=100
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListJobsQuery>,
) -> Result<Json<JobListResponse>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let count = store::count_jobs(&state.db).await?;
    let jobs = store::list_jobs(&state.db, limit).await?;
    Ok(Json(JobListResponse {
        ok: true,
        count,
        jobs,
    }))
}

/// GET /jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<JobResponse>, AppError> {
    let job = store::get_job(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    Ok(Json(JobResponse { ok: true, job }))
}

/// GET /categories
pub async fn handle_list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, AppError> {
    let categories = store::list_categories(&state.db).await?;
    Ok(Json(CategoryListResponse {
        ok: true,
        categories,
    }))
}
