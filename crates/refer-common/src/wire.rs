//! Request and response bodies exchanged with the referral backend.
//!
//! | Endpoint                | Request       | Response                      |
//! |-------------------------|---------------|-------------------------------|
//! | `POST /verify/generate` | [`CodeRequest`] | ignored                     |
//! | `POST /verify/otp`      | [`OtpCheck`]    | [`OtpResponse`]             |
//! | `POST /refer`           | `ReferralRecord` | ignored                    |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /verify/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRequest {
    pub mail: String,
    pub name: String,
}

/// Body of `POST /verify/otp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpCheck {
    pub mail: String,
    pub otp: String,
}

/// Success body of `POST /verify/otp`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OtpResponse {
    #[serde(default)]
    pub data: Option<Value>,
}

impl OtpResponse {
    /// The identity carried in `data`. Anything other than a JSON object
    /// yields an empty identity.
    pub fn into_identity(self) -> VerifiedIdentity {
        match self.data {
            Some(Value::Object(map)) => VerifiedIdentity(map),
            _ => VerifiedIdentity::default(),
        }
    }
}

/// Whatever the backend returned about the referrer after a successful
/// code check. The shape is owned by the backend, so it stays an open map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerifiedIdentity(pub Map<String, Value>);

impl VerifiedIdentity {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value for `key`, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}
