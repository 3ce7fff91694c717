use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A job posting as scraped from a detail page, before it is stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_title: String,
    /// Category path as shown on the page, segments joined with " > ".
    pub category: String,
    pub min_education: String,
    pub location: String,
    pub work_type: String,
    pub skills: Vec<String>,
    pub url: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: i64,
    pub job_title: String,
    pub min_education: String,
    pub location: String,
    pub work_type: String,
    /// JSON array of skill names.
    pub skills: String,
    pub url: String,
    pub fetched_at: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

/// A stored job joined with its category names, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct JobWithCategories {
    pub id: i64,
    pub job_title: String,
    pub min_education: String,
    pub location: String,
    pub work_type: String,
    pub skills: Vec<String>,
    pub url: String,
    pub fetched_at: i64,
    pub fetched_at_iso: Option<DateTime<Utc>>,
    pub categories: Vec<String>,
}

impl JobWithCategories {
    pub fn from_row(row: JobRow, categories: Vec<String>) -> Self {
        // Rows written by older tools may hold comma-joined skills instead of JSON.
        let skills = serde_json::from_str::<Vec<String>>(&row.skills).unwrap_or_else(|_| {
            row.skills
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        });

        Self {
            id: row.id,
            job_title: row.job_title,
            min_education: row.min_education,
            location: row.location,
            work_type: row.work_type,
            skills,
            url: row.url,
            fetched_at: row.fetched_at,
            fetched_at_iso: Utc.timestamp_opt(row.fetched_at, 0).single(),
            categories,
        }
    }
}
