//! In-memory stand-in for the referral backend.
//!
//! `refer-earn sandbox` serves the same three endpoints the popup calls so
//! the whole flow can be exercised locally. There is no mail delivery: each
//! issued code is written to the log instead.
//!
//! | Method | Path               | Behaviour                                         |
//! |--------|--------------------|---------------------------------------------------|
//! | POST   | `/verify/generate` | issue a 6-digit code for `mail` (replaces any old)|
//! | POST   | `/verify/otp`      | 200 `{data:{referrerName,referrerEmail}}` or 401  |
//! | POST   | `/refer`           | 201 `{id}` or 400 on a malformed/invalid record   |
//! | GET    | `/referrals`       | everything stored so far                          |
//! | GET    | `/health`          | `ok`                                              |
//!
//! Referrals are accepted whether or not the referrer verified in this
//! session; the stored entry records which it was.

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rand::Rng;
use refer_common::{CodeRequest, OtpCheck, ReferralRecord};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{RwLock, oneshot};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::referral::ReferralForm;
use crate::validate::check_identity;

/// A referral the sandbox accepted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReferral {
    pub id: Uuid,
    pub received_at: DateTime<Utc>,
    pub referrer_verified: bool,
    pub record: ReferralRecord,
}

#[derive(Debug, Clone)]
struct IssuedCode {
    name: String,
    code: String,
}

#[derive(Debug, Default)]
pub(crate) struct SandboxState {
    codes: HashMap<String, IssuedCode>,
    verified: HashSet<String>,
    referrals: Vec<StoredReferral>,
    running: bool,
}

type SharedState = Arc<RwLock<SandboxState>>;

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Error)]
enum SandboxError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
}

impl IntoResponse for SandboxError {
    fn into_response(self) -> Response {
        let status = match self {
            SandboxError::BadRequest(_) => StatusCode::BAD_REQUEST,
            SandboxError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        };
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

/// Local referral backend bound to a TCP port.
pub struct SandboxServer {
    state: SharedState,
    shutdown_tx: Option<oneshot::Sender<()>>,
    addr: Option<SocketAddr>,
}

impl Default for SandboxServer {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxServer {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(SandboxState::default())),
            shutdown_tx: None,
            addr: None,
        }
    }

    /// Bind to `bind` (e.g. `127.0.0.1:8787`, port 0 for a dynamic one) and
    /// serve in the background. Returns the base URL.
    pub async fn start(&mut self, bind: &str, cors: bool) -> Result<String> {
        let listener = TcpListener::bind(bind)
            .await
            .with_context(|| format!("Failed to bind sandbox backend to {}", bind))?;
        let addr = listener
            .local_addr()
            .context("Failed to get sandbox address")?;
        self.addr = Some(addr);

        self.state.write().await.running = true;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let app = build_router(self.state.clone(), cors);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!("Sandbox server error: {}", e);
            }
        });

        let base_url = format!("http://{}", addr);
        info!(%base_url, "Sandbox backend listening");
        Ok(base_url)
    }

    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.state.write().await.running = false;
        self.addr = None;
    }

    pub async fn is_running(&self) -> bool {
        self.state.read().await.running
    }

    pub fn addr(&self) -> Option<SocketAddr> {
        self.addr
    }

    pub fn base_url(&self) -> Option<String> {
        self.addr.map(|addr| format!("http://{}", addr))
    }

    /// The code currently outstanding for `email`.
    pub async fn issued_code(&self, email: &str) -> Option<String> {
        self.state
            .read()
            .await
            .codes
            .get(&email_key(email))
            .map(|c| c.code.clone())
    }

    pub async fn referrals(&self) -> Vec<StoredReferral> {
        self.state.read().await.referrals.clone()
    }
}

/// Build the sandbox router. `cors` allows any origin, for browser front
/// ends served from a dev server.
pub(crate) fn build_router(state: SharedState, cors: bool) -> Router {
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/verify/generate", post(generate_handler))
        .route("/verify/otp", post(verify_handler))
        .route("/refer", post(refer_handler))
        .route("/referrals", get(list_handler))
        .with_state(state);

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn generate_handler(
    State(state): State<SharedState>,
    Json(request): Json<CodeRequest>,
) -> Result<StatusCode, SandboxError> {
    check_identity(&request.name, &request.mail)
        .map_err(|e| SandboxError::BadRequest(e.to_string()))?;

    let code = rand::rng().random_range(100_000..1_000_000).to_string();
    info!(email = %request.mail, %code, "Issued one-time code");

    state.write().await.codes.insert(
        email_key(&request.mail),
        IssuedCode {
            name: request.name.trim().to_string(),
            code,
        },
    );
    Ok(StatusCode::OK)
}

async fn verify_handler(
    State(state): State<SharedState>,
    Json(check): Json<OtpCheck>,
) -> Result<Json<Value>, SandboxError> {
    let key = email_key(&check.mail);
    let mut state = state.write().await;

    let matches = state
        .codes
        .get(&key)
        .is_some_and(|issued| issued.code == check.otp.trim());
    if !matches {
        warn!(email = %check.mail, "Rejected one-time code");
        return Err(SandboxError::Unauthorized("Invalid OTP".to_string()));
    }

    let issued = state
        .codes
        .remove(&key)
        .ok_or_else(|| SandboxError::Unauthorized("Invalid OTP".to_string()))?;
    state.verified.insert(key);
    info!(email = %check.mail, "Email verified");

    Ok(Json(json!({
        "data": {
            "referrerName": issued.name,
            "referrerEmail": check.mail.trim(),
        }
    })))
}

async fn refer_handler(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), SandboxError> {
    let record: ReferralRecord =
        serde_json::from_value(body).map_err(|e| SandboxError::BadRequest(e.to_string()))?;
    ReferralForm::from(&record)
        .validate()
        .map_err(|e| SandboxError::BadRequest(e.to_string()))?;

    let mut state = state.write().await;
    let referrer_verified = state.verified.contains(&email_key(&record.referrer_email));
    if !referrer_verified {
        warn!(referrer = %record.referrer_email, "Accepting referral from an unverified referrer");
    }

    let id = Uuid::new_v4();
    info!(%id, referee = %record.referee_email, course = %record.course, "Stored referral");
    state.referrals.push(StoredReferral {
        id,
        received_at: Utc::now(),
        referrer_verified,
        record,
    });

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn list_handler(State(state): State<SharedState>) -> Json<Vec<StoredReferral>> {
    Json(state.read().await.referrals.clone())
}
