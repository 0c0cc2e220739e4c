//! The referral record posted to `POST /refer`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::options::{Course, Relationship};

/// Wire names of every referral field.
pub mod field {
    pub const REFERRER_NAME: &str = "referrerName";
    pub const REFERRER_EMAIL: &str = "referrerEmail";
    pub const REFERRER_PHONE: &str = "referrerPhone";
    pub const REFERRAL_MESSAGE: &str = "referralMessage";
    pub const HOW_DID_YOU_HEAR: &str = "howDidYouHear";
    pub const REFEREE_NAME: &str = "refereeName";
    pub const REFEREE_EMAIL: &str = "refereeEmail";
    pub const REFEREE_PHONE: &str = "refereePhone";
    pub const COURSE: &str = "course";
    pub const START_DATE: &str = "startDate";
    pub const RELATIONSHIP: &str = "relationship";
    pub const TERMS_ACCEPTED: &str = "termsAccepted";

    pub const ALL: [&str; 12] = [
        REFERRER_NAME,
        REFERRER_EMAIL,
        REFERRER_PHONE,
        REFERRAL_MESSAGE,
        HOW_DID_YOU_HEAR,
        REFEREE_NAME,
        REFEREE_EMAIL,
        REFEREE_PHONE,
        COURSE,
        START_DATE,
        RELATIONSHIP,
        TERMS_ACCEPTED,
    ];
}

/// A complete, validated referral.
///
/// Optional fields that were left empty are omitted from the JSON body.
/// Keys the verified identity contributed beyond the known fields travel
/// in `extra` and are flattened into the same object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralRecord {
    pub referrer_name: String,
    pub referrer_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub how_did_you_hear: Option<String>,
    pub referee_name: String,
    pub referee_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referee_phone: Option<String>,
    pub course: Course,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    pub relationship: Relationship,
    pub terms_accepted: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
