use std::time::Duration;

use reqwest::{redirect, Client};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::scraper::guard::host_is_allowed;

const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
}

/// HTTP client for job board pages. Sends the configured User-Agent and
/// refuses to follow redirects that leave the allowed domain.
#[derive(Clone)]
pub struct HtmlFetcher {
    client: Client,
}

impl HtmlFetcher {
    pub fn new(user_agent: &str, timeout_secs: u64, allowed_domain: &str) -> anyhow::Result<Self> {
        let domain = allowed_domain.to_string();
        let policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if attempt
                .url()
                .host_str()
                .is_some_and(|host| host_is_allowed(host, &domain))
            {
                attempt.follow()
            } else {
                attempt.stop()
            }
        });

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .redirect(policy)
            .build()?;

        Ok(Self { client })
    }

    /// GETs `url` and returns the body text. Non-2xx statuses are errors.
    pub async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        debug!("Fetching {url}");
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_returns_body_and_sends_user_agent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/jobs")
                .header("user-agent", "AfrozTest/1.0");
            then.status(200).body("<html>ok</html>");
        });

        let fetcher = HtmlFetcher::new("AfrozTest/1.0", 5, "127.0.0.1").unwrap();
        let url = Url::parse(&server.url("/jobs")).unwrap();
        let body = fetcher.fetch(&url).await.unwrap();

        mock.assert();
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_fetch_non_success_is_status_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/gone");
            then.status(404);
        });

        let fetcher = HtmlFetcher::new("AfrozTest/1.0", 5, "127.0.0.1").unwrap();
        let url = Url::parse(&server.url("/gone")).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_redirect_off_domain_is_not_followed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/hop");
            then.status(302)
                .header("Location", "http://169.254.169.254/latest/meta-data");
        });

        let fetcher = HtmlFetcher::new("AfrozTest/1.0", 5, "127.0.0.1").unwrap();
        let url = Url::parse(&server.url("/hop")).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        // The redirect is returned as-is rather than followed.
        assert!(matches!(err, FetchError::Status { status: 302, .. }));
    }
}
