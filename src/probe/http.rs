//! HTTP probe implementation.

use super::{ProbeOutcome, Prober};
use chrono::Utc;
use std::future::Future;
use std::time::{Duration, Instant};

/// Prober backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Prober for HttpProber {
    fn probe(&self, url: &str, timeout: Duration) -> impl Future<Output = ProbeOutcome> + Send {
        run_http_probe(&self.client, url, timeout)
    }
}

/// Issue a GET against the given address.
///
/// The response time covers the round-trip up to the response headers.
/// Connection failures and timeouts yield an unreachable outcome.
pub async fn run_http_probe(client: &reqwest::Client, address: &str, timeout: Duration) -> ProbeOutcome {
    let url = normalize_url(address);
    let start = Instant::now();

    match client.get(&url).timeout(timeout).send().await {
        Ok(response) => {
            let elapsed = start.elapsed().as_secs_f64();
            ProbeOutcome::responded(response.status().as_u16(), elapsed, Utc::now())
        }
        Err(e) => {
            if e.is_timeout() {
                tracing::debug!("Probe of {} timed out after {:?}", url, timeout);
            } else {
                tracing::debug!("Probe of {} failed: {}", url, e);
            }
            ProbeOutcome::unreachable(Utc::now())
        }
    }
}

fn normalize_url(address: &str) -> String {
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("example.com"), "http://example.com");
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
    }

    #[tokio::test]
    async fn test_http_probe_ok() {
        let url = serve(Router::new().route("/", get(|| async { "ok" }))).await;

        let outcome = HttpProber::new().probe(&url, Duration::from_secs(1)).await;
        assert!(outcome.available());
        assert_eq!(outcome.status_code(), Some(200));
        assert!(outcome.response_time().unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn test_http_probe_error_status() {
        let app = Router::new().route("/", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let url = serve(app).await;

        let outcome = HttpProber::new().probe(&url, Duration::from_secs(1)).await;
        assert!(!outcome.available());
        assert_eq!(outcome.status_code(), Some(503));
        assert!(outcome.response_time().is_some());
    }

    #[tokio::test]
    async fn test_http_probe_timeout() {
        let app = Router::new().route(
            "/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "late"
            }),
        );
        let url = serve(app).await;

        let outcome = HttpProber::new().probe(&url, Duration::from_millis(100)).await;
        assert!(!outcome.available());
        assert_eq!(outcome.status_code(), None);
        assert_eq!(outcome.response_time(), None);
    }

    #[tokio::test]
    async fn test_http_probe_connection_refused() {
        let outcome = HttpProber::new()
            .probe("http://127.0.0.1:1", Duration::from_millis(100))
            .await;
        assert!(!outcome.available());
        assert_eq!(outcome.status_code(), None);
    }
}
