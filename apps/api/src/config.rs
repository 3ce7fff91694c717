use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every value has a default so the service runs against a local SQLite file
/// with no setup; only unparseable values abort startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Only host (and its subdomains) the scraper may contact.
    pub allowed_domain: String,
    pub user_agent: String,
    pub scraper_timeout_secs: u64,
    pub crawl_concurrency: usize,
    pub skills_cache_ttl_secs: u64,
    pub skills_cache_capacity: usize,
    /// When set, extracted skills are cached in Redis instead of in memory.
    pub redis_url: Option<String>,
    pub fuzzy_threshold: f64,
    /// When set, resume analysis goes through the LLM extractor.
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: env_or("DATABASE_URL", "sqlite://jobs.db?mode=rwc"),
            port: parse_env("PORT", 8000)?,
            rust_log: env_or("RUST_LOG", "info"),
            allowed_domain: env_or("ALLOWED_DOMAIN", "jobinja.ir").to_lowercase(),
            user_agent: env_or(
                "SCRAPER_USER_AGENT",
                "Mozilla/5.0 (JobCrawler/1.0; +https://example.com/bot)",
            ),
            scraper_timeout_secs: parse_env("SCRAPER_TIMEOUT_SECS", 10)?,
            crawl_concurrency: parse_env::<usize>("CRAWL_CONCURRENCY", 10)?.max(1),
            skills_cache_ttl_secs: parse_env("SKILLS_CACHE_TTL_SECS", 60 * 60)?,
            skills_cache_capacity: parse_env::<usize>("SKILLS_CACHE_CAPACITY", 1000)?.max(1),
            redis_url: optional_env("REDIS_URL"),
            fuzzy_threshold: parse_env("FUZZY_THRESHOLD", 75.0)?,
            llm_api_key: optional_env("LLM_API_KEY"),
            llm_base_url: env_or("LLM_BASE_URL", "https://api.openai.com/v1"),
            llm_model: env_or("LLM_MODEL", "openai/gpt-4o-mini"),
        })
    }

    /// Defaults without reading the environment; scraping limited to `allowed_domain`.
    #[cfg(test)]
    pub fn for_tests(allowed_domain: &str) -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            allowed_domain: allowed_domain.to_string(),
            user_agent: "AfrozTest/1.0".to_string(),
            scraper_timeout_secs: 5,
            crawl_concurrency: 4,
            skills_cache_ttl_secs: 60,
            skills_cache_capacity: 16,
            redis_url: None,
            fuzzy_threshold: 75.0,
            llm_api_key: None,
            llm_base_url: "http://127.0.0.1:1".to_string(),
            llm_model: "test-model".to_string(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_falls_back_to_default() {
        let port: u16 = parse_env("AFROZ_TEST_UNSET_PORT", 8000).unwrap();
        assert_eq!(port, 8000);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("AFROZ_TEST_BAD_PORT", "not-a-port");
        let result: Result<u16> = parse_env("AFROZ_TEST_BAD_PORT", 8000);
        assert!(result.is_err());
    }

    #[test]
    fn test_optional_env_ignores_blank_values() {
        std::env::set_var("AFROZ_TEST_BLANK", "   ");
        assert!(optional_env("AFROZ_TEST_BLANK").is_none());
    }
}
