//! Outbound URL allowlist. Every URL the scraper touches passes through here.

use url::Url;

use crate::errors::AppError;

/// True when `host` is `domain` itself or one of its subdomains.
/// `jobinja.ir.evil.com` and `notjobinja.ir` are rejected.
pub fn host_is_allowed(host: &str, domain: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Parses and validates a URL before anything is fetched from it.
pub fn validate_job_url(raw: &str, allowed_domain: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw.trim()).map_err(|_| AppError::Validation("invalid_url".to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Validation("invalid_url_scheme".to_string()));
    }

    match url.host_str() {
        Some(host) if host_is_allowed(host, allowed_domain) => Ok(url),
        _ => Err(AppError::ForbiddenHost(format!(
            "only {allowed_domain} domain is allowed for scraping"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_subdomain_hosts_allowed() {
        assert!(host_is_allowed("jobinja.ir", "jobinja.ir"));
        assert!(host_is_allowed("WWW.Jobinja.ir", "jobinja.ir"));
        assert!(host_is_allowed("jobinja.ir.", "jobinja.ir"));
    }

    #[test]
    fn test_lookalike_hosts_rejected() {
        assert!(!host_is_allowed("jobinja.ir.evil.com", "jobinja.ir"));
        assert!(!host_is_allowed("notjobinja.ir", "jobinja.ir"));
        assert!(!host_is_allowed("localhost", "jobinja.ir"));
    }

    #[test]
    fn test_validate_accepts_job_url() {
        let url = validate_job_url("https://jobinja.ir/companies/x/jobs/abc", "jobinja.ir").unwrap();
        assert_eq!(url.host_str(), Some("jobinja.ir"));
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let err = validate_job_url("ftp://jobinja.ir/file", "jobinja.ir").unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "invalid_url_scheme"));
    }

    #[test]
    fn test_validate_rejects_unparseable() {
        let err = validate_job_url("not a url", "jobinja.ir").unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "invalid_url"));
    }

    #[test]
    fn test_validate_rejects_foreign_host() {
        let err = validate_job_url("http://169.254.169.254/latest", "jobinja.ir").unwrap_err();
        assert!(matches!(err, AppError::ForbiddenHost(_)));
    }
}
