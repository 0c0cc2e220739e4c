//! The email verification step.
//!
//! ```text
//! CollectingIdentity --code sent--> OtpRequested --code accepted--> Verified
//!        ^   |                         ^   |
//!        +---+ send failed             +---+ check failed (any number of times)
//! ```
//!
//! The flow only decides what may be sent and records outcomes; the
//! controller performs the network calls in between.

use refer_common::{CodeRequest, OtpCheck, VerifiedIdentity};

use crate::backend::Endpoint;
use crate::errors::FlowError;
use crate::validate::{check_code, check_identity};

/// Where the referrer is in proving ownership of their email.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum VerificationStage {
    /// Waiting for a name and email.
    #[default]
    CollectingIdentity,
    /// A code was sent to `email`; waiting for the user to enter it.
    OtpRequested { name: String, email: String },
    /// The backend accepted a code for `email`.
    Verified {
        email: String,
        identity: VerifiedIdentity,
    },
}

impl VerificationStage {
    pub fn name(&self) -> &'static str {
        match self {
            VerificationStage::CollectingIdentity => "collecting identity",
            VerificationStage::OtpRequested { .. } => "waiting for a code",
            VerificationStage::Verified { .. } => "verified",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VerificationFlow {
    stage: VerificationStage,
    in_flight: Option<Endpoint>,
}

impl VerificationFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> &VerificationStage {
        &self.stage
    }

    pub fn is_verified(&self) -> bool {
        matches!(self.stage, VerificationStage::Verified { .. })
    }

    pub fn identity(&self) -> Option<&VerifiedIdentity> {
        match &self.stage {
            VerificationStage::Verified { identity, .. } => Some(identity),
            _ => None,
        }
    }

    /// Email the outstanding code was sent to.
    pub fn pending_email(&self) -> Option<&str> {
        match &self.stage {
            VerificationStage::OtpRequested { email, .. } => Some(email),
            _ => None,
        }
    }

    pub fn in_flight(&self) -> Option<Endpoint> {
        self.in_flight
    }

    fn ensure_idle(&self) -> Result<(), FlowError> {
        match self.in_flight {
            Some(endpoint) => Err(FlowError::Busy(endpoint)),
            None => Ok(()),
        }
    }

    /// Validate `name` and `email` and build the code request.
    ///
    /// Only allowed while collecting identity. Both values are trimmed.
    pub fn begin_code_request(&mut self, name: &str, email: &str) -> Result<CodeRequest, FlowError> {
        self.ensure_idle()?;
        if self.stage != VerificationStage::CollectingIdentity {
            return Err(FlowError::InvalidState {
                action: "request a code",
                stage: self.stage.name(),
            });
        }
        check_identity(name, email)?;

        self.in_flight = Some(Endpoint::GenerateCode);
        Ok(CodeRequest {
            mail: email.trim().to_string(),
            name: name.trim().to_string(),
        })
    }

    /// The backend accepted `request`; wait for the code.
    pub fn code_sent(&mut self, request: CodeRequest) {
        self.in_flight = None;
        self.stage = VerificationStage::OtpRequested {
            name: request.name,
            email: request.mail,
        };
    }

    /// Sending failed; the identity inputs stay editable.
    pub fn code_request_failed(&mut self) {
        self.in_flight = None;
    }

    /// Validate `code` and build the check for `email`.
    ///
    /// Only allowed once a code has been requested and not yet accepted.
    pub fn begin_code_check(&mut self, email: &str, code: &str) -> Result<OtpCheck, FlowError> {
        self.ensure_idle()?;
        if !matches!(self.stage, VerificationStage::OtpRequested { .. }) {
            return Err(FlowError::InvalidState {
                action: "verify a code",
                stage: self.stage.name(),
            });
        }
        check_code(code)?;

        self.in_flight = Some(Endpoint::VerifyOtp);
        Ok(OtpCheck {
            mail: email.trim().to_string(),
            otp: code.trim().to_string(),
        })
    }

    /// The backend accepted the code for `check.mail`.
    pub fn code_verified(&mut self, check: OtpCheck, identity: VerifiedIdentity) {
        self.in_flight = None;
        self.stage = VerificationStage::Verified {
            email: check.mail,
            identity,
        };
    }

    /// The backend rejected the code; the user may try again.
    pub fn code_check_failed(&mut self) {
        self.in_flight = None;
    }
}
