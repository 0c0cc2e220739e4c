//! The Refer & Earn popup.
//!
//! [`ReferralController`] owns all popup state: whether it is open, the
//! verification step and the referral form. Front ends render
//! [`ReferralController::current_view`] and call the three operations; the
//! controller performs the backend call, records the outcome and raises a
//! notification.
//!
//! State lives behind a mutex that is released before every `.await`, so
//! the controller can be shared (`Arc`) between a UI task and anything else
//! that wants to observe it. While a call is pending the same operation is
//! refused with [`FlowError::Busy`].

use refer_common::VerifiedIdentity;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::backend::ReferralBackend;
use crate::errors::FlowError;
use crate::notify::{Notification, Notifier};
use crate::referral::{ReferralForm, ReferralSubmission};
use crate::verification::{VerificationFlow, VerificationStage};

pub const CODE_SENT: &str = "OTP sent to your email";
pub const CODE_SEND_FAILED: &str = "Failed to send OTP";
pub const CODE_VERIFIED: &str = "OTP Verified Successfully";
pub const CODE_INVALID: &str = "Invalid OTP";
pub const REFERRAL_SUBMITTED: &str = "Referral Submitted Successfully";
pub const REFERRAL_FAILED: &str = "Failed to Submit Referral";

/// What the popup is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Closed,
    /// Name and email inputs with a "Send OTP" action.
    CollectIdentity,
    /// Code input with a "Verify OTP" action.
    EnterCode,
    /// The referral form, seeded from the verified identity.
    ReferralForm,
}

#[derive(Debug, Default)]
struct PopupState {
    open: bool,
    verification: VerificationFlow,
    referral: ReferralSubmission,
}

impl PopupState {
    fn ensure_open(&self) -> Result<(), FlowError> {
        if self.open {
            Ok(())
        } else {
            Err(FlowError::PopupClosed)
        }
    }

    fn view(&self) -> View {
        if !self.open {
            return View::Closed;
        }
        match self.verification.stage() {
            VerificationStage::CollectingIdentity => View::CollectIdentity,
            VerificationStage::OtpRequested { .. } => View::EnterCode,
            VerificationStage::Verified { .. } => View::ReferralForm,
        }
    }
}

pub struct ReferralController<B, N> {
    backend: B,
    notifier: N,
    state: Mutex<PopupState>,
}

impl<B: ReferralBackend, N: Notifier> ReferralController<B, N> {
    /// A closed popup with nothing verified.
    pub fn new(backend: B, notifier: N) -> Self {
        Self {
            backend,
            notifier,
            state: Mutex::new(PopupState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PopupState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn open(&self) {
        self.lock().open = true;
        debug!("Popup opened");
    }

    /// Close without submitting. Verification and the draft are kept for
    /// the next time the popup opens.
    pub fn close(&self) {
        self.lock().open = false;
        debug!("Popup closed");
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    pub fn current_view(&self) -> View {
        self.lock().view()
    }

    pub fn verified_identity(&self) -> Option<VerifiedIdentity> {
        self.lock().verification.identity().cloned()
    }

    /// Email the outstanding code was sent to, while one is outstanding.
    pub fn pending_email(&self) -> Option<String> {
        self.lock().verification.pending_email().map(str::to_string)
    }

    /// Current referral form values.
    pub fn draft(&self) -> ReferralForm {
        self.lock().referral.draft().clone()
    }

    /// True while any backend call is pending.
    pub fn is_busy(&self) -> bool {
        let state = self.lock();
        state.verification.in_flight().is_some() || state.referral.is_submitting()
    }

    /// Ask the backend to send a one-time code to `email`.
    pub async fn request_code(&self, name: &str, email: &str) -> Result<(), FlowError> {
        let request = {
            let mut state = self.lock();
            state.ensure_open()?;
            state.verification.begin_code_request(name, email)?
        };

        debug!(email = %request.mail, "Requesting one-time code");
        let outcome = self.backend.generate_code(&request).await;

        match outcome {
            Ok(()) => {
                info!(email = %request.mail, "One-time code sent");
                self.lock().verification.code_sent(request);
                self.notifier.notify(Notification::success(CODE_SENT));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Code request failed");
                self.lock().verification.code_request_failed();
                self.notifier.notify(Notification::error(CODE_SEND_FAILED));
                Err(e.into())
            }
        }
    }

    /// Check `code` for `email`. On success the returned identity also
    /// seeds the referral form, which becomes the current view.
    pub async fn verify_code(&self, email: &str, code: &str) -> Result<VerifiedIdentity, FlowError> {
        let check = {
            let mut state = self.lock();
            state.ensure_open()?;
            state.verification.begin_code_check(email, code)?
        };

        debug!(email = %check.mail, "Checking one-time code");
        let outcome = self.backend.verify_code(&check).await;

        match outcome {
            Ok(identity) => {
                info!(email = %check.mail, fields = identity.as_map().len(), "Email verified");
                {
                    let mut state = self.lock();
                    state.referral.seed(&identity);
                    state.verification.code_verified(check, identity.clone());
                }
                self.notifier.notify(Notification::success(CODE_VERIFIED));
                Ok(identity)
            }
            Err(e) => {
                warn!(error = %e, "Code check failed");
                self.lock().verification.code_check_failed();
                self.notifier.notify(Notification::error(CODE_INVALID));
                Err(e.into())
            }
        }
    }

    /// Validate and submit a referral. Success closes the popup and
    /// discards the draft; failure leaves both as they were.
    pub async fn submit(&self, form: ReferralForm) -> Result<(), FlowError> {
        let record = {
            let mut state = self.lock();
            state.ensure_open()?;
            if !state.verification.is_verified() {
                return Err(FlowError::InvalidState {
                    action: "submit a referral",
                    stage: state.verification.stage().name(),
                });
            }
            state.referral.begin_submit(form)?
        };

        debug!(referee = %record.referee_email, course = %record.course, "Submitting referral");
        let outcome = self.backend.create_referral(&record).await;

        match outcome {
            Ok(()) => {
                info!(referee = %record.referee_email, "Referral submitted");
                {
                    let mut state = self.lock();
                    state.referral.submit_succeeded();
                    state.open = false;
                }
                self.notifier.notify(Notification::success(REFERRAL_SUBMITTED));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Referral submission failed");
                self.lock().referral.submit_failed();
                self.notifier.notify(Notification::error(REFERRAL_FAILED));
                Err(e.into())
            }
        }
    }
}
