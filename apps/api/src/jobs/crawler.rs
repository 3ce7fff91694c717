//! Crawler: walks Jobinja list pages and stores every posting it finds.
//!
//! Algorithm:
//! 1. Validate the start URL, take the crawl lock, then clear the job store.
//!    Only one crawl runs at a time; a second one is rejected.
//! 2. For each list page: collect unseen job links (capped at what is still
//!    needed), fetch and parse them concurrently under a semaphore, and save
//!    each successful record. Failed postings are logged and skipped.
//! 3. Advance by incrementing the `page` query parameter when the start URL
//!    has one, otherwise by following the page's "next" link.
//! 4. Stop at `max_jobs`, on an empty page, on a page with no new links, or
//!    when there is no next page.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, warn};
use url::Url;

use crate::errors::AppError;
use crate::jobs::store;
use crate::models::job::JobRecord;
use crate::scraper::fetch::{FetchError, HtmlFetcher};
use crate::scraper::guard::validate_job_url;
use crate::scraper::parse::{extract_job_details, extract_job_links, find_next_page_link};

pub const MAX_JOBS_LIMIT: u32 = 500;
pub const MAX_DELAY_MS: u64 = 10_000;
pub const CRAWL_IN_PROGRESS: &str = "crawl_in_progress";

#[derive(Debug, Clone, Deserialize)]
pub struct CrawlRequest {
    pub start_url: String,
    #[serde(default = "default_max_jobs")]
    pub max_jobs: u32,
    /// Pause between list pages.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_max_jobs() -> u32 {
    30
}

fn default_delay_ms() -> u64 {
    100
}

impl CrawlRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_jobs == 0 || self.max_jobs > MAX_JOBS_LIMIT {
            return Err(AppError::Validation(format!(
                "max_jobs must be between 1 and {MAX_JOBS_LIMIT}"
            )));
        }
        if self.delay_ms > MAX_DELAY_MS {
            return Err(AppError::Validation(format!(
                "delay_ms must be at most {MAX_DELAY_MS}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub saved: u32,
    pub db_count: i64,
    pub pages_visited: u32,
}

#[derive(Clone)]
pub struct Crawler {
    fetcher: HtmlFetcher,
    allowed_domain: String,
    concurrency: usize,
    /// Held for a whole run; clones share it.
    run_lock: Arc<Mutex<()>>,
}

impl Crawler {
    pub fn new(fetcher: HtmlFetcher, allowed_domain: String, concurrency: usize) -> Self {
        Self {
            fetcher,
            allowed_domain,
            concurrency: concurrency.max(1),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn run(&self, pool: &SqlitePool, req: &CrawlRequest) -> Result<CrawlSummary, AppError> {
        req.validate()?;
        let start_url = validate_job_url(&req.start_url, &self.allowed_domain)?;

        let _running = self
            .run_lock
            .try_lock()
            .map_err(|_| AppError::Validation(CRAWL_IN_PROGRESS.to_string()))?;

        store::clear_all(pool).await?;
        info!("Crawl started at {start_url} (max_jobs={})", req.max_jobs);

        let follow_page_param = page_param(&start_url).is_some();
        let mut page_url = start_url;
        let mut visited: HashSet<Url> = HashSet::new();
        let mut saved = 0u32;
        let mut pages_visited = 0u32;

        while saved < req.max_jobs {
            let list_html = match self.fetcher.fetch(&page_url).await {
                Ok(html) => html,
                Err(e) if pages_visited == 0 => {
                    return Err(AppError::Upstream(format!("failed to fetch list page: {e}")));
                }
                Err(e) => {
                    warn!("Stopping crawl, list page {page_url} failed: {e}");
                    break;
                }
            };
            pages_visited += 1;

            let links = extract_job_links(&list_html, &page_url);
            if links.is_empty() {
                info!("No job links on {page_url}; crawl finished");
                break;
            }

            let remaining = (req.max_jobs - saved) as usize;
            let to_process: Vec<Url> = links
                .into_iter()
                .filter(|l| !visited.contains(l))
                .take(remaining)
                .collect();
            if to_process.is_empty() {
                info!("No new job links on {page_url}; crawl finished");
                break;
            }

            for result in self.fetch_details(&to_process).await {
                match result {
                    Ok(record) => {
                        store::save_job_with_categories(pool, &record).await?;
                        saved += 1;
                        info!("[{saved}] saved: {}", record.job_title);
                    }
                    Err((url, e)) => warn!("failed to fetch job {url}: {e}"),
                }
            }
            visited.extend(to_process);

            if saved >= req.max_jobs {
                break;
            }

            let next = if follow_page_param {
                next_page_by_param(&page_url)
            } else {
                find_next_page_link(&list_html, &page_url)
            };
            // Pagination links are untrusted page content; re-check the host.
            let next = next.filter(|u| validate_job_url(u.as_str(), &self.allowed_domain).is_ok());
            page_url = match next {
                Some(url) => url,
                None => break,
            };

            if req.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(req.delay_ms)).await;
            }
        }

        let db_count = store::count_jobs(pool).await?;
        info!("Crawl finished: saved={saved} pages={pages_visited} db_count={db_count}");

        Ok(CrawlSummary {
            saved,
            db_count,
            pages_visited,
        })
    }

    /// Fetches and parses job pages with at most `concurrency` requests in flight.
    /// Results come back in completion order.
    async fn fetch_details(&self, urls: &[Url]) -> Vec<Result<JobRecord, (Url, FetchError)>> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for url in urls.iter().cloned() {
            let fetcher = self.fetcher.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                match fetcher.fetch(&url).await {
                    Ok(html) => Ok(extract_job_details(&html, &url)),
                    Err(e) => Err((url, e)),
                }
            });
        }

        let mut results = Vec::with_capacity(urls.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => warn!("Job fetch task failed: {e}"),
            }
        }
        results
    }
}

fn page_param(url: &Url) -> Option<u32> {
    url.query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
}

/// Same URL with its `page` query parameter incremented; other parameters keep
/// their order.
pub fn next_page_by_param(url: &Url) -> Option<Url> {
    let current = page_param(url)?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            if k == "page" {
                (k.into_owned(), (current + 1).to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();

    let mut next = url.clone();
    next.query_pairs_mut().clear().extend_pairs(pairs);
    Some(next)
}
