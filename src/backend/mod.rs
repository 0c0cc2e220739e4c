//! The seam between the popup and the referral backend.
//!
//! [`ReferralBackend`] covers the three calls the popup makes. [`HttpBackend`]
//! is the real implementation; tests substitute in-memory fakes.

mod http;

pub use http::HttpBackend;

use async_trait::async_trait;
use refer_common::{CodeRequest, OtpCheck, ReferralRecord, VerifiedIdentity};

use crate::errors::BackendError;

/// Backend endpoints, relative to the configured base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `POST /verify/generate`: send a one-time code to the referrer.
    GenerateCode,
    /// `POST /verify/otp`: check a code, returns the verified identity.
    VerifyOtp,
    /// `POST /refer`: store a referral.
    Refer,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::GenerateCode => "/verify/generate",
            Endpoint::VerifyOtp => "/verify/otp",
            Endpoint::Refer => "/refer",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Request/response contract of the referral backend.
///
/// Callers only distinguish success from failure, except for
/// [`verify_code`](Self::verify_code) whose identity payload seeds the
/// referral form.
#[async_trait]
pub trait ReferralBackend: Send + Sync {
    async fn generate_code(&self, request: &CodeRequest) -> Result<(), BackendError>;

    async fn verify_code(&self, check: &OtpCheck) -> Result<VerifiedIdentity, BackendError>;

    async fn create_referral(&self, record: &ReferralRecord) -> Result<(), BackendError>;
}

#[async_trait]
impl<B: ReferralBackend + ?Sized> ReferralBackend for std::sync::Arc<B> {
    async fn generate_code(&self, request: &CodeRequest) -> Result<(), BackendError> {
        (**self).generate_code(request).await
    }

    async fn verify_code(&self, check: &OtpCheck) -> Result<VerifiedIdentity, BackendError> {
        (**self).verify_code(check).await
    }

    async fn create_referral(&self, record: &ReferralRecord) -> Result<(), BackendError> {
        (**self).create_referral(record).await
    }
}
