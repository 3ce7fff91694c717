use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::errors::AppError;
use crate::scraper::cache::SkillsCache;
use crate::scraper::fetch::HtmlFetcher;
use crate::scraper::guard::validate_job_url;
use crate::scraper::parse::extract_required_skills;

/// Looks up the required skills of a job posting: validate, cache, fetch, parse.
#[derive(Clone)]
pub struct SkillService {
    fetcher: HtmlFetcher,
    cache: Arc<dyn SkillsCache>,
    allowed_domain: String,
}

impl SkillService {
    pub fn new(fetcher: HtmlFetcher, cache: Arc<dyn SkillsCache>, allowed_domain: String) -> Self {
        Self {
            fetcher,
            cache,
            allowed_domain,
        }
    }

    pub fn validate(&self, raw_url: &str) -> Result<Url, AppError> {
        validate_job_url(raw_url, &self.allowed_domain)
    }

    /// Returns the posting's skills; an empty list means none could be found.
    /// Only non-empty results are cached.
    pub async fn required_skills(&self, raw_url: &str) -> Result<Vec<String>, AppError> {
        let url = self.validate(raw_url)?;
        let key = url.as_str();

        if let Some(skills) = self.cache.get(key).await {
            debug!("Skills cache hit for {key}");
            return Ok(skills);
        }

        let html = self
            .fetcher
            .fetch(&url)
            .await
            .map_err(|e| AppError::Upstream(format!("failed_fetching_job_page: {e}")))?;

        let skills = extract_required_skills(&html);
        info!("Extracted {} skills from {key}", skills.len());

        if !skills.is_empty() {
            self.cache.put(key, &skills).await;
        }
        Ok(skills)
    }
}
