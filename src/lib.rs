pub mod backend;
pub mod config;
pub mod controller;
pub mod errors;
pub mod logging;
pub mod notify;
pub mod referral;
pub mod sandbox;
pub mod ui;
pub mod validate;
pub mod verification;

pub use refer_common as common;
