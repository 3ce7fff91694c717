// Jobinja scraping: URL allowlist, page fetching, HTML extraction and the
// skills cache. Crawling (which also writes to the job store) lives in jobs::crawler.

pub mod cache;
pub mod fetch;
pub mod guard;
pub mod parse;
pub mod skills;
