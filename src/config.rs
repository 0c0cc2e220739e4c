//! Configuration for refer-earn, read from `refer.toml`.
//!
//! Values are layered file → environment → CLI:
//!
//! ```toml
//! [backend]
//! base_url = "http://127.0.0.1:8787"
//! timeout_secs = 30
//!
//! [rewards]
//! referrer = "₹500"
//! referee = "₹250"
//!
//! [sandbox]
//! host = "127.0.0.1"
//! port = 8787
//! ```
//!
//! The file is looked up at `--config <path>`, then `./refer.toml`, then
//! `<config dir>/refer-earn/refer.toml`. With none present the defaults
//! apply. `REFER_BACKEND_URL` and `REFER_TIMEOUT_SECS` override the
//! `[backend]` section, and `--backend-url` overrides both.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = "refer.toml";
pub const ENV_BACKEND_URL: &str = "REFER_BACKEND_URL";
pub const ENV_TIMEOUT_SECS: &str = "REFER_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8787";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SANDBOX_HOST: &str = "127.0.0.1";
const DEFAULT_SANDBOX_PORT: u16 = 8787;

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_referrer_reward() -> String {
    "₹500".to_string()
}

fn default_referee_reward() -> String {
    "₹250".to_string()
}

fn default_sandbox_host() -> String {
    DEFAULT_SANDBOX_HOST.to_string()
}

fn default_sandbox_port() -> u16 {
    DEFAULT_SANDBOX_PORT
}

/// Where the referral API lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Reward amounts shown in the banner. Display strings, not numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardsSection {
    #[serde(default = "default_referrer_reward")]
    pub referrer: String,
    #[serde(default = "default_referee_reward")]
    pub referee: String,
}

impl Default for RewardsSection {
    fn default() -> Self {
        Self {
            referrer: default_referrer_reward(),
            referee: default_referee_reward(),
        }
    }
}

/// Bind address for `refer-earn sandbox`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxSection {
    #[serde(default = "default_sandbox_host")]
    pub host: String,
    #[serde(default = "default_sandbox_port")]
    pub port: u16,
}

impl Default for SandboxSection {
    fn default() -> Self {
        Self {
            host: default_sandbox_host(),
            port: default_sandbox_port(),
        }
    }
}

impl SandboxSection {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Contents of `refer.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferToml {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub rewards: RewardsSection,
    #[serde(default)]
    pub sandbox: SandboxSection,
}

impl ReferToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse refer.toml")
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize refer.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(warning) = check_base_url(&self.backend.base_url) {
            warnings.push(warning);
        }
        if self.backend.timeout_secs == 0 {
            warnings.push("backend.timeout_secs is 0: every request would time out".to_string());
        }
        if self.sandbox.port == 0 {
            warnings.push(
                "sandbox.port is 0: the sandbox would listen on a random port".to_string(),
            );
        }
        if self.rewards.referrer.trim().is_empty() || self.rewards.referee.trim().is_empty() {
            warnings.push("rewards amounts should not be empty".to_string());
        }

        warnings
    }
}

fn check_base_url(url: &str) -> Option<String> {
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => None,
        Ok(parsed) => Some(format!(
            "Invalid backend.base_url '{}': scheme '{}' should be http or https",
            url,
            parsed.scheme()
        )),
        Err(e) => Some(format!("Invalid backend.base_url '{}': {}", url, e)),
    }
}

/// Path of the per-user config file, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("refer-earn").join(CONFIG_FILE_NAME))
}

/// Find the config file to read.
///
/// An explicit path is returned as-is even if missing, so that loading it
/// reports the error instead of silently falling back to defaults.
pub fn locate(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = cwd.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    user_config_path().filter(|p| p.is_file())
}

/// Effective configuration after all layers are applied.
#[derive(Debug, Clone)]
pub struct ReferConfig {
    /// File the values came from; `None` when running on defaults.
    pub source: Option<PathBuf>,
    pub toml: ReferToml,
    pub backend_url: String,
    pub timeout: Duration,
}

impl ReferConfig {
    /// Resolve configuration from the process environment.
    pub fn load(config_path: Option<&Path>, cli_backend_url: Option<&str>) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to resolve current directory")?;
        let source = locate(config_path, &cwd);
        Self::resolve(source, cli_backend_url, |key| std::env::var(key).ok())
    }

    /// Resolve configuration with an injectable environment lookup.
    pub fn resolve<F>(source: Option<PathBuf>, cli_backend_url: Option<&str>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let toml = match &source {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration");
                ReferToml::load(path)?
            }
            None => ReferToml::default(),
        };

        let mut backend_url = toml.backend.base_url.clone();
        let mut timeout_secs = toml.backend.timeout_secs;

        if let Some(url) = env(ENV_BACKEND_URL).filter(|v| !v.trim().is_empty()) {
            backend_url = url.trim().to_string();
        }
        if let Some(raw) = env(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => timeout_secs = secs,
                Err(_) => warn!(value = %raw, "Ignoring invalid {}", ENV_TIMEOUT_SECS),
            }
        }
        if let Some(url) = cli_backend_url {
            backend_url = url.to_string();
        }

        Ok(Self {
            source,
            toml,
            backend_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Warnings for the file values plus the effective backend URL.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.toml.validate();
        if self.backend_url != self.toml.backend.base_url
            && let Some(warning) = check_base_url(&self.backend_url)
        {
            warnings.push(warning);
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let toml = ReferToml::default();
        assert_eq!(toml.backend.base_url, "http://127.0.0.1:8787");
        assert_eq!(toml.backend.timeout_secs, 30);
        assert_eq!(toml.rewards.referrer, "₹500");
        assert_eq!(toml.rewards.referee, "₹250");
        assert_eq!(toml.sandbox.bind_addr(), "127.0.0.1:8787");
        assert!(toml.validate().is_empty());
    }

    #[test]
    fn test_parse_partial_file_keeps_defaults() {
        let content = r#"
[backend]
base_url = "https://api.example.com"
"#;
        let toml = ReferToml::parse(content).unwrap();
        assert_eq!(toml.backend.base_url, "https://api.example.com");
        assert_eq!(toml.backend.timeout_secs, 30);
        assert_eq!(toml.sandbox.port, 8787);
    }

    #[test]
    fn test_parse_invalid_toml() {
        let err = ReferToml::parse("[backend\nbase_url = 1").unwrap_err();
        assert!(err.to_string().contains("refer.toml"));
    }

    #[test]
    fn test_save_and_load_preserves_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut toml = ReferToml::default();
        toml.rewards.referrer = "$50".to_string();
        toml.sandbox.port = 9000;
        toml.save(&path).unwrap();

        assert_eq!(ReferToml::load(&path).unwrap(), toml);
    }

    #[test]
    fn test_validate_reports_problems() {
        let content = r#"
[backend]
base_url = "ftp://files.example.com"
timeout_secs = 0

[sandbox]
port = 0
"#;
        let warnings = ReferToml::parse(content).unwrap().validate();
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("scheme 'ftp'"));
        assert!(warnings[1].contains("timeout_secs"));
        assert!(warnings[2].contains("sandbox.port"));
    }

    #[test]
    fn test_validate_unparseable_url() {
        let mut toml = ReferToml::default();
        toml.backend.base_url = "not a url".to_string();
        let warnings = toml.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Invalid backend.base_url"));
    }

    #[test]
    fn test_locate_prefers_explicit_path() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "").unwrap();
        let explicit = dir.path().join("other.toml");

        assert_eq!(locate(Some(&explicit), dir.path()), Some(explicit));
    }

    #[test]
    fn test_locate_finds_local_file() {
        let dir = tempdir().unwrap();
        let local = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&local, "").unwrap();

        assert_eq!(locate(None, dir.path()), Some(local));
    }

    #[test]
    fn test_resolve_without_file_uses_defaults() {
        let config = ReferConfig::resolve(None, None, no_env).unwrap();
        assert!(config.source.is_none());
        assert_eq!(config.backend_url, "http://127.0.0.1:8787");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_resolve_missing_explicit_file_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let err = ReferConfig::resolve(Some(missing), None, no_env).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }

    #[test]
    fn test_layering_file_env_cli() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[backend]\nbase_url = \"http://file:1\"\ntimeout_secs = 5\n",
        )
        .unwrap();

        let config = ReferConfig::resolve(Some(path.clone()), None, no_env).unwrap();
        assert_eq!(config.backend_url, "http://file:1");
        assert_eq!(config.timeout, Duration::from_secs(5));

        let env: HashMap<&str, &str> = [
            (ENV_BACKEND_URL, "http://env:2"),
            (ENV_TIMEOUT_SECS, "12"),
        ]
        .into_iter()
        .collect();
        let lookup = |key: &str| env.get(key).map(|v| v.to_string());

        let config = ReferConfig::resolve(Some(path.clone()), None, lookup).unwrap();
        assert_eq!(config.backend_url, "http://env:2");
        assert_eq!(config.timeout, Duration::from_secs(12));

        let config = ReferConfig::resolve(Some(path), Some("http://cli:3"), lookup).unwrap();
        assert_eq!(config.backend_url, "http://cli:3");
        assert_eq!(config.timeout, Duration::from_secs(12));
    }

    #[test]
    fn test_invalid_env_timeout_is_ignored() {
        let lookup = |key: &str| (key == ENV_TIMEOUT_SECS).then(|| "soon".to_string());
        let config = ReferConfig::resolve(None, None, lookup).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_validate_checks_effective_url() {
        let config = ReferConfig::resolve(None, Some("localhost:8787"), no_env).unwrap();
        let warnings = config.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("localhost:8787"));
    }
}
