//! Shared domain types for the Refer & Earn client and its sandbox backend.
//!
//! Everything here is plain data: the request bodies sent to the referral
//! backend, the verified identity it returns, and the typed referral record
//! with its fixed course and relationship vocabularies.

pub mod options;
pub mod record;
pub mod wire;

pub use options::{Course, ParseOptionError, Relationship};
pub use record::{ReferralRecord, field};
pub use wire::{CodeRequest, OtpCheck, OtpResponse, VerifiedIdentity};
