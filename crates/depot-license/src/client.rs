//! License server client

use async_trait::async_trait;
use depot_core::{LicenseVerifier, VerifyError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::LicenseClientError;

/// Path of the verification endpoint, relative to the server URL
const VERIFY_PATH: &str = "api/licenses/verify";

/// Longest error body kept from a failed response
const MAX_ERROR_BODY: usize = 512;

/// License client configuration
#[derive(Clone, Debug)]
pub struct LicenseClientConfig {
    /// Base URL of the license server
    pub server_url: String,
    /// Timeout for a single verification request
    pub timeout: Duration,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    license: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    valid: bool,
}

/// License server API client
pub struct LicenseClient {
    endpoint: Url,
    client: Client,
}

impl LicenseClient {
    /// Create a new license client
    pub fn new(config: LicenseClientConfig) -> Result<Self, LicenseClientError> {
        let mut base = Url::parse(&config.server_url)?;
        // Url::join replaces the last segment unless the path ends with '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join(VERIFY_PATH)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("depot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!("Created license client for {}", endpoint);

        Ok(Self { endpoint, client })
    }

    /// The verification endpoint this client posts to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Ask the license server whether `license` is valid
    pub async fn verify_key(&self, license: &str) -> Result<bool, LicenseClientError> {
        debug!("Verifying license with {}", self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&VerifyRequest { license })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut message = response.text().await.unwrap_or_default();
            if message.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !message.is_char_boundary(cut) {
                    cut -= 1;
                }
                message.truncate(cut);
            }
            return Err(LicenseClientError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        let body: VerifyResponse = response.json().await?;
        debug!("License server verdict: {}", body.valid);
        Ok(body.valid)
    }
}

#[async_trait]
impl LicenseVerifier for LicenseClient {
    async fn verify(&self, license: &str) -> Result<bool, VerifyError> {
        self.verify_key(license).await.map_err(VerifyError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::{Value, json};

    #[derive(Deserialize)]
    struct Submitted {
        license: String,
    }

    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(server_url: &str, timeout: Duration) -> LicenseClient {
        LicenseClient::new(LicenseClientConfig {
            server_url: server_url.to_string(),
            timeout,
        })
        .unwrap()
    }

    async fn verify_handler(Json(req): Json<Submitted>) -> Json<Value> {
        Json(json!({ "valid": req.license == "GOOD-KEY" }))
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let c = client("https://licenses.example.com/base", Duration::from_secs(1));
        assert_eq!(
            c.endpoint().as_str(),
            "https://licenses.example.com/base/api/licenses/verify"
        );

        let c = client("https://licenses.example.com", Duration::from_secs(1));
        assert_eq!(
            c.endpoint().as_str(),
            "https://licenses.example.com/api/licenses/verify"
        );
    }

    #[test]
    fn test_invalid_server_url() {
        let result = LicenseClient::new(LicenseClientConfig {
            server_url: "not a url".to_string(),
            timeout: Duration::from_secs(1),
        });
        assert!(matches!(result, Err(LicenseClientError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_verdicts() {
        let app = Router::new().route("/api/licenses/verify", post(verify_handler));
        let url = spawn_server(app).await;
        let c = client(&url, Duration::from_secs(5));

        assert!(c.verify_key("GOOD-KEY").await.unwrap());
        assert!(!c.verify_key("BAD-KEY").await.unwrap());
        assert_eq!(c.verify("GOOD-KEY").await, Ok(true));
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let app = Router::new().route(
            "/api/licenses/verify",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );
        let url = spawn_server(app).await;
        let c = client(&url, Duration::from_secs(5));

        let err = c.verify_key("GOOD-KEY").await.unwrap_err();
        assert!(matches!(
            err,
            LicenseClientError::ServerError { status: 503, .. }
        ));
        assert!(matches!(
            c.verify("GOOD-KEY").await,
            Err(VerifyError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_client_error_is_unexpected_response() {
        let app = Router::new().route(
            "/api/licenses/verify",
            post(|| async { (StatusCode::NOT_FOUND, "no such endpoint") }),
        );
        let url = spawn_server(app).await;
        let c = client(&url, Duration::from_secs(5));

        assert!(matches!(
            c.verify("GOOD-KEY").await,
            Err(VerifyError::UnexpectedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_verdict() {
        let app = Router::new().route(
            "/api/licenses/verify",
            post(|| async { Json(json!({ "status": "ok" })) }),
        );
        let url = spawn_server(app).await;
        let c = client(&url, Duration::from_secs(5));

        assert!(matches!(
            c.verify("GOOD-KEY").await,
            Err(VerifyError::UnexpectedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let c = client(&format!("http://{}", addr), Duration::from_secs(2));
        assert!(matches!(
            c.verify("GOOD-KEY").await,
            Err(VerifyError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_timeout() {
        let app = Router::new().route(
            "/api/licenses/verify",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "valid": true }))
            }),
        );
        let url = spawn_server(app).await;
        let c = client(&url, Duration::from_millis(100));

        assert!(matches!(
            c.verify("GOOD-KEY").await,
            Err(VerifyError::Unavailable(_))
        ));
    }
}
