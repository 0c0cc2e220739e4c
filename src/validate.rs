//! Client-side field validation.
//!
//! Every check here runs before a request is built, so input that fails
//! never reaches the backend. Messages are the ones shown next to the
//! offending field.

use regex::Regex;
use std::sync::LazyLock;

// Same shape as the browser form library's email check: local part, then
// one or more dot-separated DNS labels.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap()
});

/// Length of a one-time code.
pub const OTP_LENGTH: usize = 6;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 100;
pub const MAX_PHONE_LEN: usize = 15;
pub const MAX_HOW_DID_YOU_HEAR_LEN: usize = 100;
pub const MAX_RELATIONSHIP_LEN: usize = 50;

/// Wire names of the verification step's inputs.
pub const OTP_FIELD: &str = "otp";

/// One failed check on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All failed checks for a form, first failure per field only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    /// Record a failure unless `field` already has one.
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        if self.get(field).is_none() {
            self.errors.push(FieldError {
                field,
                message: message.into(),
            });
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// `Ok(())` when nothing failed.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for e in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
            first = false;
        }
        Ok(())
    }
}

/// True when `email` matches the standard address pattern.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Character count, so multi-byte names are capped the way users count them.
pub fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Check the referrer's name and email before a code is requested.
pub fn check_identity(name: &str, email: &str) -> Result<(), FieldErrors> {
    use refer_common::field;

    let mut errors = FieldErrors::default();
    let name = name.trim();
    let email = email.trim();

    if name.is_empty() {
        errors.push(field::REFERRER_NAME, "Referrer Name is required");
    }
    if email.is_empty() {
        errors.push(field::REFERRER_EMAIL, "Referrer Email is required");
    } else if !is_valid_email(email) {
        errors.push(field::REFERRER_EMAIL, "Invalid email");
    }

    errors.into_result()
}

/// Check a one-time code: present and exactly [`OTP_LENGTH`] characters.
/// The characters themselves are not constrained.
pub fn check_code(code: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    let code = code.trim();

    if code.is_empty() {
        errors.push(OTP_FIELD, "OTP is required");
    } else if char_len(code) != OTP_LENGTH {
        errors.push(OTP_FIELD, "OTP must be 6 digits");
    }

    errors.into_result()
}
