use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

use crate::config::Config;
use crate::jobs::crawler::Crawler;
use crate::llm_client::LlmClient;
use crate::resume::extractor::{KeywordSkillExtractor, LlmSkillExtractor, ResumeSkillExtractor};
use crate::scraper::cache::{MemorySkillsCache, RedisSkillsCache, SkillsCache};
use crate::scraper::fetch::HtmlFetcher;
use crate::scraper::skills::SkillService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    /// Job-page skill lookup, cached in Redis when `REDIS_URL` is set.
    pub skills: SkillService,
    pub crawler: Crawler,
    /// Pluggable resume extractor. Default: KeywordSkillExtractor. Swap via LLM_API_KEY.
    pub resume_extractor: Arc<dyn ResumeSkillExtractor>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Result<Self> {
        let fetcher = HtmlFetcher::new(
            &config.user_agent,
            config.scraper_timeout_secs,
            &config.allowed_domain,
        )?;

        let cache: Arc<dyn SkillsCache> = match &config.redis_url {
            Some(url) => {
                info!("Skills cache: redis");
                Arc::new(RedisSkillsCache::new(url, config.skills_cache_ttl_secs)?)
            }
            None => {
                info!(
                    "Skills cache: in-memory (capacity {})",
                    config.skills_cache_capacity
                );
                Arc::new(MemorySkillsCache::new(
                    Duration::from_secs(config.skills_cache_ttl_secs),
                    config.skills_cache_capacity,
                ))
            }
        };

        let resume_extractor: Arc<dyn ResumeSkillExtractor> = match &config.llm_api_key {
            Some(key) => {
                let llm = LlmClient::new(key.clone(), &config.llm_base_url, config.llm_model.clone())?;
                info!("Resume extractor: llm (model: {})", llm.model());
                Arc::new(LlmSkillExtractor(llm))
            }
            None => {
                info!("Resume extractor: keyword");
                Arc::new(KeywordSkillExtractor::new(config.fuzzy_threshold))
            }
        };

        let skills = SkillService::new(fetcher.clone(), cache, config.allowed_domain.clone());
        let crawler = Crawler::new(
            fetcher,
            config.allowed_domain.clone(),
            config.crawl_concurrency,
        );

        Ok(Self {
            db,
            config,
            skills,
            crawler,
            resume_extractor,
        })
    }
}
