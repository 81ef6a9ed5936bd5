//! Environment and connectivity smoke check

use crate::Result;
use reqwest::Client;
use tracing::info;

pub const DEFAULT_PROBE_URL: &str = "https://api.github.com";

/// Result of probing the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeReport {
    /// Masked value of the probed variable, or `not-set`
    pub api_key: String,
    pub probe_url: String,
    pub status: u16,
}

impl std::fmt::Display for SmokeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Packages loaded")?;
        writeln!(f, "API_KEY: {}", self.api_key)?;
        write!(f, "{} status: {}", self.probe_url, self.status)
    }
}

/// Show only the first four characters of a secret
pub fn mask_secret(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => {
            let head: String = v.chars().take(4).collect();
            format!("{}… ({} chars)", head, v.chars().count())
        }
        _ => "not-set".to_string(),
    }
}

/// GET the probe URL and report its status code
pub async fn run_smoke_check(client: &Client, api_key: Option<&str>, probe_url: &str) -> Result<SmokeReport> {
    let response = client
        .get(probe_url)
        .header("User-Agent", concat!("rolling-chat/", env!("CARGO_PKG_VERSION")))
        .send()
        .await?;

    let status = response.status().as_u16();
    info!("Probe {} answered {}", probe_url, status);

    Ok(SmokeReport {
        api_key: mask_secret(api_key),
        probe_url: probe_url.to_string(),
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(None), "not-set");
        assert_eq!(mask_secret(Some("")), "not-set");
        assert_eq!(mask_secret(Some("sk-or-123456")), "sk-o… (12 chars)");
    }

    #[tokio::test]
    async fn test_smoke_check_reports_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_header("user-agent", mockito::Matcher::Regex("^rolling-chat/".into()))
            .with_status(200)
            .create_async()
            .await;

        let report = run_smoke_check(&Client::new(), Some("abcdef"), &format!("{}/", server.url()))
            .await
            .unwrap();

        assert_eq!(report.status, 200);
        assert_eq!(report.api_key, "abcd… (6 chars)");
        assert!(report.to_string().contains("status: 200"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_smoke_check_passes_through_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/").with_status(503).create_async().await;

        let report = run_smoke_check(&Client::new(), None, &format!("{}/", server.url()))
            .await
            .unwrap();
        assert_eq!(report.status, 503);
        assert_eq!(report.api_key, "not-set");
    }
}
