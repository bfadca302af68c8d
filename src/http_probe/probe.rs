use std::time::Instant;

use reqwest::Client;
use unicode_truncate::UnicodeTruncateStr;

use super::prelude::*;
use super::report;
use crate::config::ProbeConfig;

/// Width of the body excerpt logged for failed checks.
pub const BODY_PREVIEW_WIDTH: usize = 300;

fn body_preview(body: &[u8]) -> String {
    // a char is at most 4 bytes, no need to decode more than that
    let head = &body[..body.len().min(BODY_PREVIEW_WIDTH * 4)];
    let text = String::from_utf8_lossy(head);
    let (truncated, _) = text.unicode_truncate(BODY_PREVIEW_WIDTH);
    truncated.to_string()
}

/// Issue one GET against the configured target and check the status code.
/// Never fails: transport errors become a failed [`ProbeResult`].
pub async fn probe_url(client: &Client, config: &ProbeConfig) -> ProbeResult {
    let start = Instant::now();
    let status_result = client
        .get(config.target_url().clone())
        .headers(config.headers().clone())
        .send()
        .await;

    let response = match status_result {
        Ok(resp) => resp,
        Err(e) => return ProbeResult::from_error(None, report(&e), start.elapsed().as_secs_f64()),
    };

    let http_status = response.status().as_u16();
    let body = response.bytes().await;
    let http_time = start.elapsed().as_secs_f64();

    match body {
        Ok(body) => ProbeResult::from_response(
            http_status,
            body_preview(&body),
            config.expected_status(),
            http_time,
        ),
        Err(e) => ProbeResult::from_error(Some(http_status), report(&e), http_time),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::build_client;
    use crate::test_server::{TestServer, unused_port};

    const LOGO_PATH: &str = "/static/images/NoteTube-logo.png";

    fn config_for(url: &str) -> ProbeConfig {
        ProbeConfig::builder(url)
            .iterations(1)
            .request_timeout(Duration::from_secs(5))
            .build()
            .expect("valid config")
    }

    #[test]
    fn test_body_preview_is_truncated() {
        let body = "x".repeat(1000);
        assert_eq!(body_preview(body.as_bytes()).len(), BODY_PREVIEW_WIDTH);
        assert_eq!(body_preview(b"Not Found"), "Not Found");
        assert_eq!(body_preview(b""), "");
    }

    #[test]
    fn test_body_preview_handles_binary() {
        let png_header = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
        let preview = body_preview(&png_header);
        assert!(preview.contains("PNG"));
    }

    #[tokio::test]
    async fn test_probe_passes_on_expected_status() {
        let server = TestServer::start(200, "png bytes").await;
        let config = config_for(&server.url(LOGO_PATH));
        let client = build_client(&config).expect("client");

        let result = probe_url(&client, &config).await;
        assert!(result.passed);
        assert_eq!(result.http_status, Some(200));
        assert_eq!(result.body_preview, "png bytes");
        assert!(result.error.is_none());
        assert_eq!(server.hits(), 1);
        assert_eq!(server.last_path().as_deref(), Some(LOGO_PATH));
    }

    #[tokio::test]
    async fn test_probe_fails_on_other_status() {
        let server = TestServer::start(404, "<h1>Not Found</h1>").await;
        let config = config_for(&server.url(LOGO_PATH));
        let client = build_client(&config).expect("client");

        let result = probe_url(&client, &config).await;
        assert!(!result.passed);
        assert_eq!(result.http_status, Some(404));
        assert_eq!(result.body_preview, "<h1>Not Found</h1>");
    }

    #[tokio::test]
    async fn test_probe_records_transport_error() {
        let port = unused_port().await;
        let config = config_for(&format!("http://127.0.0.1:{port}{LOGO_PATH}"));
        let client = build_client(&config).expect("client");

        let result = probe_url(&client, &config).await;
        assert!(!result.passed);
        assert_eq!(result.http_status, None);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_header_overrides_replace_defaults() {
        let server = TestServer::start(200, "").await;
        let config = ProbeConfig::builder(server.url(LOGO_PATH))
            .iterations(1)
            .header("Host", "54.167.105.59")
            .header("User-Agent", "k6/0.49")
            .build()
            .expect("valid config");
        let client = build_client(&config).expect("client");

        let result = probe_url(&client, &config).await;
        assert!(result.passed);

        let headers = server.last_headers().expect("request seen");
        assert_eq!(headers.get_all("host").iter().count(), 1);
        assert_eq!(headers["host"], "54.167.105.59");
        assert_eq!(headers.get_all("user-agent").iter().count(), 1);
        assert_eq!(headers["user-agent"], "k6/0.49");
    }
}
