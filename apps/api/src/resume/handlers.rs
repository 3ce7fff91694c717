//! Axum route handlers for the Resume API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::matching::handlers::resolve_required_skills;
use crate::matching::scoring::{compute_match, MatchResult};
use crate::models::candidate::CandidateSkill;
use crate::resume::upload::text_from_upload;
use crate::state::AppState;

/// Upload size accepted by `/resume/analyze`.
pub const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct AnalyzeResumeResponse {
    pub ok: bool,
    pub extractor: &'static str,
    pub candidate_skills: Vec<CandidateSkill>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<MatchResult>,
}

/// Fields collected from the multipart body.
#[derive(Debug, Default)]
struct AnalyzeForm {
    file: Option<(Option<String>, Bytes)>,
    job_url: Option<String>,
    skills: Option<Vec<String>>,
}

async fn read_form(mut multipart: Multipart) -> Result<AnalyzeForm, AppError> {
    let mut form = AnalyzeForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let read_err = |e: axum::extract::multipart::MultipartError| {
            AppError::Validation(format!("failed to read field '{name}': {e}"))
        };
        match name.as_str() {
            "file" => {
                let filename = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(read_err)?;
                form.file = Some((filename, bytes));
            }
            "job_url" => {
                let url = field.text().await.map_err(read_err)?;
                form.job_url = Some(url).filter(|u| !u.trim().is_empty());
            }
            "skills" => {
                let raw = field.text().await.map_err(read_err)?;
                let skills: Vec<String> = raw
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                form.skills = Some(skills).filter(|s| !s.is_empty());
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST /resume/analyze
///
/// Multipart fields: `file` (required), `job_url` and `skills` (optional,
/// comma separated). With either of the latter the extracted skills are also
/// scored against the job.
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResumeResponse>, AppError> {
    let form = read_form(multipart).await?;
    let (filename, bytes) = form
        .file
        .ok_or_else(|| AppError::Validation("missing 'file' field".to_string()))?;

    let text = text_from_upload(filename.as_deref(), bytes).await?;
    let candidate_skills = state.resume_extractor.extract(&text).await?;
    info!(
        extractor = state.resume_extractor.backend(),
        skills = candidate_skills.len(),
        "Resume analyzed"
    );

    let (required_skills, result) = if form.job_url.is_some() || form.skills.is_some() {
        let required =
            resolve_required_skills(&state, form.job_url.as_deref(), form.skills).await?;
        let result = compute_match(&required, &candidate_skills, state.config.fuzzy_threshold);
        (Some(required), Some(result))
    } else {
        (None, None)
    };

    Ok(Json(AnalyzeResumeResponse {
        ok: true,
        extractor: state.resume_extractor.backend(),
        candidate_skills,
        required_skills,
        result,
    }))
}
