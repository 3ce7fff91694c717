//! SQLite persistence for scraped jobs and their category hierarchy.

use anyhow::Result;
use chrono::Utc;
use regex::Regex;
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::OnceLock;

use crate::models::job::{CategoryRow, JobRecord, JobRow, JobWithCategories};

const JOB_COLUMNS: &str =
    "id, job_title, min_education, location, work_type, skills, url, fetched_at";

/// Removes every job and category. A crawl replaces the previous snapshot.
pub async fn clear_all(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM job_categories")
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM categories").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM jobs").execute(&mut *tx).await?;
    tx.commit().await?;
    Ok(())
}

/// Stores a job (ignored if its URL is already present) and links it to each
/// segment of its category path. Each segment's parent is the one before it.
/// Returns the job id.
pub async fn save_job_with_categories(pool: &SqlitePool, record: &JobRecord) -> Result<i64> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO jobs
            (job_title, min_education, location, work_type, skills, url, fetched_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.job_title)
    .bind(&record.min_education)
    .bind(&record.location)
    .bind(&record.work_type)
    .bind(serde_json::to_string(&record.skills)?)
    .bind(&record.url)
    .bind(Utc::now().timestamp())
    .execute(&mut *tx)
    .await?;

    let job_id: i64 = sqlx::query_scalar("SELECT id FROM jobs WHERE url = ?")
        .bind(&record.url)
        .fetch_one(&mut *tx)
        .await?;

    let mut parent_id = None;
    for name in split_category_path(&record.category) {
        let category_id = get_or_create_category(&mut *tx, &name, parent_id).await?;
        sqlx::query("INSERT OR IGNORE INTO job_categories (job_id, category_id) VALUES (?, ?)")
            .bind(job_id)
            .bind(category_id)
            .execute(&mut *tx)
            .await?;
        parent_id = Some(category_id);
    }

    tx.commit().await?;
    Ok(job_id)
}

async fn get_or_create_category(
    conn: &mut SqliteConnection,
    name: &str,
    parent_id: Option<i64>,
) -> Result<i64> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let result = sqlx::query("INSERT INTO categories (name, parent_id) VALUES (?, ?)")
        .bind(name)
        .bind(parent_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Splits "IT > Backend، Python" into trimmed, non-empty segments.
pub fn split_category_path(category: &str) -> Vec<String> {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let separators = SEPARATORS.get_or_init(|| Regex::new(r"[>,،]").expect("valid regex"));

    separators
        .split(category)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub async fn count_jobs(pool: &SqlitePool) -> Result<i64> {
    let n = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

/// Lists the newest `limit` jobs, each with its category names.
pub async fn list_jobs(pool: &SqlitePool, limit: i64) -> Result<Vec<JobWithCategories>> {
    let rows: Vec<JobRow> = sqlx::query_as(&format!(
        "SELECT {JOB_COLUMNS} FROM jobs ORDER BY id DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut jobs = Vec::with_capacity(rows.len());
    for row in rows {
        let categories = categories_for_job(pool, row.id).await?;
        jobs.push(JobWithCategories::from_row(row, categories));
    }
    Ok(jobs)
}

pub async fn get_job(pool: &SqlitePool, id: i64) -> Result<Option<JobWithCategories>> {
    let row: Option<JobRow> =
        sqlx::query_as(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

    match row {
        Some(row) => {
            let categories = categories_for_job(pool, row.id).await?;
            Ok(Some(JobWithCategories::from_row(row, categories)))
        }
        None => Ok(None),
    }
}

async fn categories_for_job(pool: &SqlitePool, job_id: i64) -> Result<Vec<String>> {
    let names = sqlx::query_scalar(
        r#"
        SELECT c.name FROM categories c
        JOIN job_categories jc ON c.id = jc.category_id
        WHERE jc.job_id = ?
        ORDER BY c.id
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;
    Ok(names)
}

pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<CategoryRow>> {
    let rows = sqlx::query_as("SELECT id, name, parent_id FROM categories ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Sample postings used by `--seed` and tests.
pub fn seed_jobs() -> Vec<JobRecord> {
    let job = |title: &str, slug: &str, category: &str, skills: &[&str]| JobRecord {
        job_title: title.to_string(),
        category: category.to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        url: format!("https://jobinja.ir/seed/{slug}"),
        ..Default::default()
    };

    vec![
        job(
            "Data Analyst",
            "data-analyst",
            "Data > Analytics",
            &["sql", "python", "excel"],
        ),
        job(
            "Backend Developer",
            "backend-developer",
            "IT > Backend",
            &["python", "django", "rest", "api"],
        ),
        job(
            "Frontend Developer",
            "frontend-developer",
            "IT > Frontend",
            &["javascript", "vue", "html", "css"],
        ),
    ]
}

pub async fn insert_seed_jobs(pool: &SqlitePool) -> Result<usize> {
    let jobs = seed_jobs();
    for job in &jobs {
        save_job_with_categories(pool, job).await?;
    }
    Ok(jobs.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn record(url: &str, category: &str) -> JobRecord {
        JobRecord {
            job_title: "Python Developer".to_string(),
            category: category.to_string(),
            skills: vec!["Python".to_string(), "Django".to_string()],
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_split_category_path() {
        assert_eq!(
            split_category_path(" IT > Backend،Python , "),
            vec!["IT", "Backend", "Python"]
        );
        assert!(split_category_path("").is_empty());
    }

    #[tokio::test]
    async fn test_save_and_list_with_categories() {
        let pool = test_pool().await;
        let id = save_job_with_categories(&pool, &record("https://jobinja.ir/a", "IT > Backend"))
            .await
            .unwrap();

        let jobs = list_jobs(&pool, 10).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, id);
        assert_eq!(jobs[0].skills, vec!["Python", "Django"]);
        assert_eq!(jobs[0].categories, vec!["IT", "Backend"]);
    }

    #[tokio::test]
    async fn test_duplicate_url_is_ignored() {
        let pool = test_pool().await;
        let first = save_job_with_categories(&pool, &record("https://jobinja.ir/a", "IT"))
            .await
            .unwrap();
        let second = save_job_with_categories(&pool, &record("https://jobinja.ir/a", "IT"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(count_jobs(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_category_parent_chain() {
        let pool = test_pool().await;
        save_job_with_categories(&pool, &record("https://jobinja.ir/a", "IT > Backend > Rust"))
            .await
            .unwrap();
        save_job_with_categories(&pool, &record("https://jobinja.ir/b", "IT > Frontend"))
            .await
            .unwrap();

        let categories = list_categories(&pool).await.unwrap();
        let by_name = |n: &str| categories.iter().find(|c| c.name == n).unwrap();

        assert_eq!(categories.len(), 4);
        assert_eq!(by_name("IT").parent_id, None);
        assert_eq!(by_name("Backend").parent_id, Some(by_name("IT").id));
        assert_eq!(by_name("Rust").parent_id, Some(by_name("Backend").id));
        assert_eq!(by_name("Frontend").parent_id, Some(by_name("IT").id));
    }

    #[tokio::test]
    async fn test_list_newest_first_and_limit() {
        let pool = test_pool().await;
        insert_seed_jobs(&pool).await.unwrap();

        let jobs = list_jobs(&pool, 2).await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].job_title, "Frontend Developer");
        assert_eq!(jobs[1].job_title, "Backend Developer");
    }

    #[tokio::test]
    async fn test_get_job_missing_returns_none() {
        let pool = test_pool().await;
        assert!(get_job(&pool, 42).await.unwrap().is_none());

        let id = save_job_with_categories(&pool, &record("https://jobinja.ir/a", ""))
            .await
            .unwrap();
        let job = get_job(&pool, id).await.unwrap().unwrap();
        assert!(job.categories.is_empty());
    }

    #[tokio::test]
    async fn test_clear_all() {
        let pool = test_pool().await;
        insert_seed_jobs(&pool).await.unwrap();
        clear_all(&pool).await.unwrap();

        assert_eq!(count_jobs(&pool).await.unwrap(), 0);
        assert!(list_categories(&pool).await.unwrap().is_empty());
    }
}
