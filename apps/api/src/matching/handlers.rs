//! Axum route handlers for the Matching API.

use axum::{
    extract::{Query, RawQuery, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::jobs::store;
use crate::matching::overlap::{rank_jobs, JobRecommendation};
use crate::matching::scoring::{compute_match, MatchResult};
use crate::models::candidate::CandidateSkill;
use crate::state::AppState;

/// Upper bound on stored jobs scanned by the ranking endpoints.
pub const RANKING_SCAN_LIMIT: i64 = 500;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub job_url: Option<String>,
    /// Used instead of scraping when present and non-empty.
    pub skills_override: Option<Vec<String>>,
    pub candidate_skills: Vec<CandidateSkill>,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub ok: bool,
    pub result: MatchResult,
}

#[derive(Debug, Deserialize)]
pub struct ExtractSkillsQuery {
    pub job_url: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractSkillsResponse {
    pub ok: bool,
    pub job_url: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub ok: bool,
    pub recommendations: Vec<JobRecommendation>,
}

#[derive(Debug, Deserialize)]
pub struct MatchAllRequest {
    pub candidate_skills: Vec<CandidateSkill>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct JobMatch {
    pub id: i64,
    pub job_title: String,
    pub url: String,
    pub categories: Vec<String>,
    pub required_skills: Vec<String>,
    pub match_percentage: f64,
    pub result: MatchResult,
}

#[derive(Debug, Serialize)]
pub struct MatchAllResponse {
    pub ok: bool,
    pub jobs: Vec<JobMatch>,
}

// ────────────────────────────────────────────────────────────────────────────
// Shared helpers
// ────────────────────────────────────────────────────────────────────────────

/// Resolves the required skills for a match: an explicit override wins,
/// otherwise the posting at `job_url` is scraped.
pub async fn resolve_required_skills(
    state: &AppState,
    job_url: Option<&str>,
    skills_override: Option<Vec<String>>,
) -> Result<Vec<String>, AppError> {
    if let Some(skills) = skills_override.filter(|s| !s.is_empty()) {
        return Ok(skills);
    }

    match job_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => {
            let skills = state.skills.required_skills(url).await?;
            if skills.is_empty() {
                return Err(AppError::Validation("failed_to_extract_skills".to_string()));
            }
            Ok(skills)
        }
        None => Err(AppError::Validation(
            "provide job_url or skills_override".to_string(),
        )),
    }
}

/// Collects every `skills` value from a query string, allowing repeats
/// (`?skills=python&skills=sql`). Each value is one skill, commas included.
pub fn skills_from_query(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    url::form_urlencoded::parse(raw.as_bytes())
        .filter(|(k, _)| k == "skills")
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /match
///
/// Scores the candidate against a posting's required skills, taken from
/// `skills_override` or scraped from `job_url`.
pub async fn handle_match(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    let required =
        resolve_required_skills(&state, request.job_url.as_deref(), request.skills_override)
            .await?;

    let result = compute_match(
        &required,
        &request.candidate_skills,
        state.config.fuzzy_threshold,
    );

    Ok(Json(MatchResponse { ok: true, result }))
}

/// GET /extract-skills?job_url=...
pub async fn handle_extract_skills(
    State(state): State<AppState>,
    Query(query): Query<ExtractSkillsQuery>,
) -> Result<Json<ExtractSkillsResponse>, AppError> {
    let url = state.skills.validate(&query.job_url)?;
    let skills = state.skills.required_skills(url.as_str()).await?;
    if skills.is_empty() {
        return Err(AppError::NotFound("no_skills_found".to_string()));
    }

    Ok(Json(ExtractSkillsResponse {
        ok: true,
        job_url: url.to_string(),
        skills,
    }))
}

/// GET /recommendations?skills=python&skills=sql
///
/// Ranks stored jobs by plain overlap with the given skills.
pub async fn handle_recommendations(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<RecommendationsResponse>, AppError> {
    let skills = skills_from_query(raw.as_deref());
    if skills.is_empty() {
        return Err(AppError::Validation(
            "at least one skills parameter is required".to_string(),
        ));
    }

    let jobs = store::list_jobs(&state.db, RANKING_SCAN_LIMIT).await?;
    Ok(Json(RecommendationsResponse {
        ok: true,
        recommendations: rank_jobs(jobs, &skills),
    }))
}

/// POST /jobs/match-all
///
/// Runs the weighted match against every stored job, best first.
pub async fn handle_match_all(
    State(state): State<AppState>,
    Json(request): Json<MatchAllRequest>,
) -> Result<Json<MatchAllResponse>, AppError> {
    if request.candidate_skills.is_empty() {
        return Err(AppError::Validation(
            "candidate_skills cannot be empty".to_string(),
        ));
    }
    let limit = request
        .limit
        .unwrap_or(RANKING_SCAN_LIMIT)
        .clamp(1, RANKING_SCAN_LIMIT);

    let jobs = store::list_jobs(&state.db, limit).await?;
    let mut matches: Vec<JobMatch> = jobs
        .into_iter()
        .map(|job| {
            let result = compute_match(
                &job.skills,
                &request.candidate_skills,
                state.config.fuzzy_threshold,
            );
            JobMatch {
                id: job.id,
                job_title: job.job_title,
                url: job.url,
                categories: job.categories,
                required_skills: job.skills,
                match_percentage: result.percentage,
                result,
            }
        })
        .collect();

    matches.sort_by(|a, b| b.match_percentage.total_cmp(&a.match_percentage));
    Ok(Json(MatchAllResponse { ok: true, jobs: matches }))
}
