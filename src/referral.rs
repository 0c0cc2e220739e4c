//! The referral step: the editable form, its validation, and the
//! submission state that gates `POST /refer`.

use chrono::NaiveDate;
use refer_common::{Course, ReferralRecord, Relationship, VerifiedIdentity, field};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::backend::Endpoint;
use crate::errors::FlowError;
use crate::validate::{
    FieldErrors, MAX_EMAIL_LEN, MAX_HOW_DID_YOU_HEAR_LEN, MAX_NAME_LEN, MAX_PHONE_LEN,
    MAX_RELATIONSHIP_LEN, char_len, is_valid_email,
};

/// The referral form as the user edits it.
///
/// Every text input is a plain string, possibly empty or invalid. Keys the
/// verified identity carried that are not form fields are kept in `extra`
/// and submitted alongside the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferralForm {
    pub referrer_name: String,
    pub referrer_email: String,
    pub referrer_phone: String,
    pub referral_message: String,
    pub how_did_you_hear: String,
    pub referee_name: String,
    pub referee_email: String,
    pub referee_phone: String,
    pub course: String,
    pub start_date: String,
    pub relationship: String,
    pub terms_accepted: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReferralForm {
    /// Mutable access to a text field by its wire name.
    pub fn text_field_mut(&mut self, name: &str) -> Option<&mut String> {
        let slot = match name {
            field::REFERRER_NAME => &mut self.referrer_name,
            field::REFERRER_EMAIL => &mut self.referrer_email,
            field::REFERRER_PHONE => &mut self.referrer_phone,
            field::REFERRAL_MESSAGE => &mut self.referral_message,
            field::HOW_DID_YOU_HEAR => &mut self.how_did_you_hear,
            field::REFEREE_NAME => &mut self.referee_name,
            field::REFEREE_EMAIL => &mut self.referee_email,
            field::REFEREE_PHONE => &mut self.referee_phone,
            field::COURSE => &mut self.course,
            field::START_DATE => &mut self.start_date,
            field::RELATIONSHIP => &mut self.relationship,
            _ => return None,
        };
        Some(slot)
    }

    /// This form with `identity` merged over it and `termsAccepted` cleared.
    ///
    /// Identity values for known text fields replace the current value as
    /// text: strings as-is, `null` as empty, numbers and booleans in their
    /// JSON spelling. Unknown keys are carried verbatim in `extra`.
    pub fn with_identity(&self, identity: &VerifiedIdentity) -> Self {
        let mut merged = self.clone();
        for (key, value) in identity.iter() {
            if key == field::TERMS_ACCEPTED {
                continue;
            }
            match merged.text_field_mut(key) {
                Some(slot) => *slot = value_as_text(value),
                None => {
                    merged.extra.insert(key.clone(), value.clone());
                }
            }
        }
        merged.terms_accepted = false;
        merged
    }

    /// Check every field and build the typed record.
    ///
    /// Text is trimmed; optional fields that end up empty are omitted.
    pub fn validate(&self) -> Result<ReferralRecord, FieldErrors> {
        let mut errors = FieldErrors::default();

        let referrer_name = required_text(
            &mut errors,
            field::REFERRER_NAME,
            &self.referrer_name,
            "Your name is required",
            MAX_NAME_LEN,
            "Name must be 100 characters or less",
        );
        let referrer_email = required_email(
            &mut errors,
            field::REFERRER_EMAIL,
            &self.referrer_email,
            "Your email is required",
        );
        let referrer_phone = optional_text(
            &mut errors,
            field::REFERRER_PHONE,
            &self.referrer_phone,
            MAX_PHONE_LEN,
            "Phone number must be 15 characters or less",
        );
        let referral_message = non_empty(&self.referral_message);
        let how_did_you_hear = optional_text(
            &mut errors,
            field::HOW_DID_YOU_HEAR,
            &self.how_did_you_hear,
            MAX_HOW_DID_YOU_HEAR_LEN,
            "Must be 100 characters or less",
        );
        let referee_name = required_text(
            &mut errors,
            field::REFEREE_NAME,
            &self.referee_name,
            "Friend's name is required",
            MAX_NAME_LEN,
            "Name must be 100 characters or less",
        );
        let referee_email = required_email(
            &mut errors,
            field::REFEREE_EMAIL,
            &self.referee_email,
            "Friend's email is required",
        );
        let referee_phone = optional_text(
            &mut errors,
            field::REFEREE_PHONE,
            &self.referee_phone,
            MAX_PHONE_LEN,
            "Phone number must be 15 characters or less",
        );

        let course = match self.course.trim() {
            "" => {
                errors.push(field::COURSE, "Course selection is required");
                None
            }
            raw => match raw.parse::<Course>() {
                Ok(c) => Some(c),
                Err(_) => {
                    errors.push(field::COURSE, "Please select a valid course");
                    None
                }
            },
        };

        let start_date = match self.start_date.trim() {
            "" => None,
            raw => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(d) => Some(d),
                Err(_) => {
                    errors.push(field::START_DATE, "Start date must be a valid date (YYYY-MM-DD)");
                    None
                }
            },
        };

        let relationship = match self.relationship.trim() {
            "" => {
                errors.push(field::RELATIONSHIP, "Relationship to friend is required");
                None
            }
            raw if char_len(raw) > MAX_RELATIONSHIP_LEN => {
                errors.push(field::RELATIONSHIP, "Relationship must be 50 characters or less");
                None
            }
            raw => match raw.parse::<Relationship>() {
                Ok(r) => Some(r),
                Err(_) => {
                    errors.push(field::RELATIONSHIP, "Please select a valid relationship");
                    None
                }
            },
        };

        if !self.terms_accepted {
            errors.push(
                field::TERMS_ACCEPTED,
                "You must accept the terms and conditions",
            );
        }

        match (course, relationship) {
            (Some(course), Some(relationship)) if errors.is_empty() => Ok(ReferralRecord {
                referrer_name,
                referrer_email,
                referrer_phone,
                referral_message,
                how_did_you_hear,
                referee_name,
                referee_email,
                referee_phone,
                course,
                start_date,
                relationship,
                terms_accepted: true,
                extra: self.extra.clone(),
            }),
            _ => Err(errors),
        }
    }
}

impl From<&ReferralRecord> for ReferralForm {
    fn from(record: &ReferralRecord) -> Self {
        Self {
            referrer_name: record.referrer_name.clone(),
            referrer_email: record.referrer_email.clone(),
            referrer_phone: record.referrer_phone.clone().unwrap_or_default(),
            referral_message: record.referral_message.clone().unwrap_or_default(),
            how_did_you_hear: record.how_did_you_hear.clone().unwrap_or_default(),
            referee_name: record.referee_name.clone(),
            referee_email: record.referee_email.clone(),
            referee_phone: record.referee_phone.clone().unwrap_or_default(),
            course: record.course.token().to_string(),
            start_date: record
                .start_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            relationship: record.relationship.as_str().to_string(),
            terms_accepted: record.terms_accepted,
            extra: record.extra.clone(),
        }
    }
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn required_text(
    errors: &mut FieldErrors,
    name: &'static str,
    value: &str,
    missing: &str,
    max: usize,
    too_long: &str,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(name, missing);
    } else if char_len(value) > max {
        errors.push(name, too_long);
    }
    value.to_string()
}

fn required_email(
    errors: &mut FieldErrors,
    name: &'static str,
    value: &str,
    missing: &str,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(name, missing);
    } else if !is_valid_email(value) {
        errors.push(name, "Invalid email format");
    } else if char_len(value) > MAX_EMAIL_LEN {
        errors.push(name, "Email must be 100 characters or less");
    }
    value.to_string()
}

fn optional_text(
    errors: &mut FieldErrors,
    name: &'static str,
    value: &str,
    max: usize,
    too_long: &str,
) -> Option<String> {
    let value = non_empty(value)?;
    if char_len(&value) > max {
        errors.push(name, too_long);
    }
    Some(value)
}

/// Submission state of the referral form.
///
/// `initial` is what the form resets to: the defaults with every verified
/// identity merged in. `draft` is what the user last submitted or was
/// seeded with.
#[derive(Debug, Clone, Default)]
pub struct ReferralSubmission {
    initial: ReferralForm,
    draft: ReferralForm,
    in_flight: bool,
}

impl ReferralSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the initial values with `identity` merged over them and reset
    /// the draft to match. Consent is always cleared.
    pub fn seed(&mut self, identity: &VerifiedIdentity) {
        self.initial = self.initial.with_identity(identity);
        self.draft = self.initial.clone();
    }

    pub fn draft(&self) -> &ReferralForm {
        &self.draft
    }

    pub fn initial(&self) -> &ReferralForm {
        &self.initial
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    /// Validate `form` and mark a submission as in flight.
    ///
    /// The form becomes the draft either way, so a rejected form keeps its
    /// values. Refused while another submission is pending.
    pub fn begin_submit(&mut self, form: ReferralForm) -> Result<ReferralRecord, FlowError> {
        if self.in_flight {
            return Err(FlowError::Busy(Endpoint::Refer));
        }
        let validated = form.validate();
        self.draft = form;
        let record = validated?;
        self.in_flight = true;
        Ok(record)
    }

    /// The backend stored the referral: discard the draft.
    pub fn submit_succeeded(&mut self) {
        self.in_flight = false;
        self.draft = self.initial.clone();
    }

    /// The backend call failed: keep the draft for another attempt.
    pub fn submit_failed(&mut self) {
        self.in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_form() -> ReferralForm {
        ReferralForm {
            referrer_name: "Asha".to_string(),
            referrer_email: "asha@x.com".to_string(),
            referee_name: "Ravi".to_string(),
            referee_email: "ravi@y.com".to_string(),
            course: "WEB_DEVELOPMENT".to_string(),
            relationship: "Friend".to_string(),
            terms_accepted: true,
            ..Default::default()
        }
    }

    fn identity(value: Value) -> VerifiedIdentity {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_complete_form_validates() {
        let record = complete_form().validate().unwrap();
        assert_eq!(record.referrer_name, "Asha");
        assert_eq!(record.course, Course::WebDevelopment);
        assert_eq!(record.relationship, Relationship::Friend);
        assert!(record.terms_accepted);
        assert_eq!(record.referrer_phone, None);
        assert_eq!(record.start_date, None);
    }

    #[test]
    fn test_each_required_field_is_reported() {
        let errors = ReferralForm::default().validate().unwrap_err();
        assert_eq!(errors.get(field::REFERRER_NAME), Some("Your name is required"));
        assert_eq!(errors.get(field::REFERRER_EMAIL), Some("Your email is required"));
        assert_eq!(errors.get(field::REFEREE_NAME), Some("Friend's name is required"));
        assert_eq!(errors.get(field::REFEREE_EMAIL), Some("Friend's email is required"));
        assert_eq!(errors.get(field::COURSE), Some("Course selection is required"));
        assert_eq!(
            errors.get(field::RELATIONSHIP),
            Some("Relationship to friend is required")
        );
        assert_eq!(
            errors.get(field::TERMS_ACCEPTED),
            Some("You must accept the terms and conditions")
        );
        assert_eq!(errors.len(), 7);
    }

    #[test]
    fn test_terms_must_be_accepted() {
        let mut form = complete_form();
        form.terms_accepted = false;
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.get(field::TERMS_ACCEPTED).is_some());
    }

    #[test]
    fn test_email_format_and_length() {
        let mut form = complete_form();
        form.referee_email = "ravi-at-y.com".to_string();
        assert_eq!(
            form.validate().unwrap_err().get(field::REFEREE_EMAIL),
            Some("Invalid email format")
        );

        form.referee_email = format!("{}@y.com", "r".repeat(100));
        assert_eq!(
            form.validate().unwrap_err().get(field::REFEREE_EMAIL),
            Some("Email must be 100 characters or less")
        );
    }

    #[test]
    fn test_phone_is_length_capped_when_present() {
        let mut form = complete_form();
        form.referrer_phone = "+91 98765 43210".to_string();
        assert_eq!(
            form.validate().unwrap().referrer_phone.as_deref(),
            Some("+91 98765 43210")
        );

        form.referee_phone = "0123456789012345".to_string();
        assert_eq!(
            form.validate().unwrap_err().get(field::REFEREE_PHONE),
            Some("Phone number must be 15 characters or less")
        );
    }

    #[test]
    fn test_unknown_course_and_relationship_rejected() {
        let mut form = complete_form();
        form.course = "Underwater Basket Weaving".to_string();
        form.relationship = "Rival".to_string();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get(field::COURSE), Some("Please select a valid course"));
        assert_eq!(
            errors.get(field::RELATIONSHIP),
            Some("Please select a valid relationship")
        );
    }

    #[test]
    fn test_course_label_is_accepted() {
        let mut form = complete_form();
        form.course = "UI/UX Design".to_string();
        assert_eq!(form.validate().unwrap().course, Course::UiUxDesign);
    }

    #[test]
    fn test_start_date_must_parse() {
        let mut form = complete_form();
        form.start_date = "2026-11-02".to_string();
        assert_eq!(
            form.validate().unwrap().start_date,
            NaiveDate::from_ymd_opt(2026, 11, 2)
        );

        form.start_date = "next monday".to_string();
        assert!(form.validate().unwrap_err().get(field::START_DATE).is_some());
    }

    #[test]
    fn test_text_is_trimmed_and_blank_optionals_dropped() {
        let mut form = complete_form();
        form.referrer_name = "  Asha  ".to_string();
        form.referral_message = "   ".to_string();
        let record = form.validate().unwrap();
        assert_eq!(record.referrer_name, "Asha");
        assert_eq!(record.referral_message, None);
    }

    #[test]
    fn test_with_identity_merges_and_clears_terms() {
        let mut form = complete_form();
        form.referee_name = "Ravi".to_string();
        let merged = form.with_identity(&identity(json!({
            "referrerName": "Asha K",
            "referrerEmail": "asha.k@x.com",
            "referrerPhone": 9876543210u64,
            "userId": "u-17",
            "termsAccepted": true
        })));

        assert_eq!(merged.referrer_name, "Asha K");
        assert_eq!(merged.referrer_email, "asha.k@x.com");
        assert_eq!(merged.referrer_phone, "9876543210");
        assert_eq!(merged.referee_name, "Ravi");
        assert_eq!(merged.extra.get("userId"), Some(&json!("u-17")));
        assert!(!merged.terms_accepted);
    }

    #[test]
    fn test_with_identity_renders_non_string_values_as_text() {
        let merged = complete_form().with_identity(&identity(json!({
            "referrerPhone": null,
            "howDidYouHear": false,
            "refereePhone": 12.5,
            "userId": 42
        })));

        assert_eq!(merged.referrer_phone, "");
        assert_eq!(merged.how_did_you_hear, "false");
        assert_eq!(merged.referee_phone, "12.5");
        // Non-form keys keep their JSON type.
        assert_eq!(merged.extra.get("userId"), Some(&json!(42)));
    }

    #[test]
    fn test_extra_identity_keys_reach_the_record() {
        let form = complete_form().with_identity(&identity(json!({"userId": 7})));
        let mut form = form;
        form.terms_accepted = true;
        let record = form.validate().unwrap();
        assert_eq!(record.extra.get("userId"), Some(&json!(7)));
    }

    #[test]
    fn test_form_round_trips_through_record() {
        let mut form = complete_form();
        form.start_date = "2026-11-02".to_string();
        form.referee_phone = "12345".to_string();
        let record = form.validate().unwrap();
        assert_eq!(ReferralForm::from(&record), form);
    }

    #[test]
    fn test_form_deserializes_camel_case_with_defaults() {
        let form: ReferralForm = serde_json::from_value(json!({
            "referrerName": "Asha",
            "termsAccepted": true
        }))
        .unwrap();
        assert_eq!(form.referrer_name, "Asha");
        assert!(form.terms_accepted);
        assert!(form.course.is_empty());
        assert!(form.extra.is_empty());
    }

    #[test]
    fn test_submission_seed_replaces_initial_values() {
        let mut submission = ReferralSubmission::new();
        submission.seed(&identity(json!({"referrerName": "Asha", "referrerEmail": "asha@x.com"})));
        assert_eq!(submission.draft().referrer_name, "Asha");
        assert!(!submission.draft().terms_accepted);

        submission.seed(&identity(json!({"referrerEmail": "asha@new.com"})));
        assert_eq!(submission.initial().referrer_name, "Asha");
        assert_eq!(submission.draft().referrer_email, "asha@new.com");
    }

    #[test]
    fn test_invalid_submit_keeps_values_and_is_not_in_flight() {
        let mut submission = ReferralSubmission::new();
        let mut form = complete_form();
        form.terms_accepted = false;

        let err = submission.begin_submit(form.clone()).unwrap_err();
        assert!(matches!(err, FlowError::Validation(_)));
        assert!(!submission.is_submitting());
        assert_eq!(submission.draft(), &form);
    }

    #[test]
    fn test_second_submit_while_in_flight_is_busy() {
        let mut submission = ReferralSubmission::new();
        submission.begin_submit(complete_form()).unwrap();
        assert!(submission.is_submitting());

        let err = submission.begin_submit(complete_form()).unwrap_err();
        assert!(matches!(err, FlowError::Busy(Endpoint::Refer)));
    }

    #[test]
    fn test_failed_submit_keeps_draft_and_success_discards_it() {
        let mut submission = ReferralSubmission::new();
        submission.seed(&identity(json!({"referrerName": "Asha"})));
        let mut form = submission.draft().clone();
        form.referrer_email = "asha@x.com".to_string();
        form.referee_name = "Ravi".to_string();
        form.referee_email = "ravi@y.com".to_string();
        form.course = "DATA_SCIENCE".to_string();
        form.relationship = "Colleague".to_string();
        form.terms_accepted = true;

        submission.begin_submit(form.clone()).unwrap();
        submission.submit_failed();
        assert!(!submission.is_submitting());
        assert_eq!(submission.draft(), &form);

        submission.begin_submit(form).unwrap();
        submission.submit_succeeded();
        assert_eq!(submission.draft().referrer_name, "Asha");
        assert!(submission.draft().referee_name.is_empty());
        assert!(!submission.draft().terms_accepted);
    }
}
