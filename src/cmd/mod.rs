//! CLI command implementations.
//!
//! | Module     | Commands handled |
//! |------------|------------------|
//! | `refer`    | `Refer`          |
//! | `options`  | `Options`        |
//! | `sandbox`  | `Sandbox`        |
//! | `config`   | `Config`         |

pub mod config;
pub mod options;
pub mod refer;
pub mod sandbox;

pub use config::cmd_config;
pub use options::cmd_options;
pub use refer::cmd_refer;
pub use sandbox::cmd_sandbox;
