mod archive;
mod error;

pub use archive::ArchivePolicy;
pub use error::ConfigError;

use crate::classifier::{ClassificationPolicy, DEFAULT_UNAVAILABLE_STATUS};
use crate::composer::{DisplayZone, LocationFormat, MessageComposer};
use crate::status::StatusCode;
use chrono::Utc;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// Re-export existing config types
pub use crate::snapshot::config::{SnapshotBackend, SnapshotConfig};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Complete fmswatch configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Divera access key, used for the status source and the push sink.
    /// Overridable via `FMSWATCH_API_KEY`.
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub classification: ClassificationConfig,
    #[serde(default)]
    pub message: MessageConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Status source (Divera API) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://app.divera247.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    AnyChange,
    AvailabilityEdge,
}

/// Transition classification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationConfig {
    #[serde(default = "default_policy")]
    pub policy: PolicyKind,
    /// Status code treated as "unavailable" by the availability-edge policy
    #[serde(default = "default_unavailable_status")]
    pub unavailable_status: StatusCode,
}

fn default_policy() -> PolicyKind {
    PolicyKind::AnyChange
}

fn default_unavailable_status() -> StatusCode {
    DEFAULT_UNAVAILABLE_STATUS
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            unavailable_status: default_unavailable_status(),
        }
    }
}

impl ClassificationConfig {
    pub fn policy(&self) -> ClassificationPolicy {
        match self.policy {
            PolicyKind::AnyChange => ClassificationPolicy::AnyChange,
            PolicyKind::AvailabilityEdge => ClassificationPolicy::AvailabilityEdge {
                unavailable: self.unavailable_status,
            },
        }
    }
}

/// Message rendering configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MessageConfig {
    #[serde(default)]
    pub location: LocationFormat,
    /// `local`, `UTC` or a fixed offset such as `+01:00`
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "local".to_string()
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            location: LocationFormat::default(),
            timezone: default_timezone(),
        }
    }
}

impl MessageConfig {
    pub fn composer(&self) -> Result<MessageComposer, ConfigError> {
        let zone: DisplayZone = self
            .timezone
            .parse()
            .map_err(|e: crate::composer::InvalidZone| ConfigError::Invalid(e.to_string()))?;
        Ok(MessageComposer::new(self.location, zone))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushBackend {
    /// `POST /api/v2/news` with a JSON payload
    NewsV2,
    /// `GET /api/news` with query parameters
    Legacy,
    Disabled,
}

/// Push notification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    #[serde(default = "default_push_backend")]
    pub backend: PushBackend,
    /// User foreign keys (mutually exclusive with `groups`)
    #[serde(default)]
    pub users: Vec<String>,
    /// Group titles (mutually exclusive with `users`)
    #[serde(default)]
    pub groups: Vec<String>,
    /// Pager identifiers (RICs), sent in addition to users/groups
    #[serde(default)]
    pub pager_ids: Vec<String>,
    #[serde(default)]
    pub archive: ArchivePolicy,
}

fn default_push_backend() -> PushBackend {
    PushBackend::NewsV2
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            backend: default_push_backend(),
            users: Vec::new(),
            groups: Vec::new(),
            pager_ids: Vec::new(),
            archive: ArchivePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmtpSecurity {
    /// Plain connection upgraded via STARTTLS
    Starttls,
    /// Implicit TLS (SMTPS)
    Tls,
    /// Unencrypted (local relays only)
    None,
}

/// Email notification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default = "default_smtp_security")]
    pub security: SmtpSecurity,
    #[serde(default)]
    pub username: Option<String>,
    /// Overridable via `FMSWATCH_SMTP_PASSWORD`
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_security() -> SmtpSecurity {
    SmtpSecurity::Starttls
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: None,
            smtp_port: default_smtp_port(),
            security: default_smtp_security(),
            username: None,
            password: None,
            from: None,
            recipients: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Transition history log
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryConfig {
    /// Append one line per transition to this file
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Apply secrets from the environment, falling back to file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("FMSWATCH_API_KEY") {
            if !key.trim().is_empty() {
                self.api_key = key;
            }
        }
        if let Ok(password) = std::env::var("FMSWATCH_SMTP_PASSWORD") {
            if !password.is_empty() {
                self.email.password = Some(password);
            }
        }
    }

    /// Resolve relative snapshot/history paths against `base_dir`.
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        if self.snapshot.path.is_relative() {
            self.snapshot.path = base_dir.join(&self.snapshot.path);
        }
        if let Some(path) = self.snapshot.import_from.as_mut() {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        }
        if let Some(path) = self.history.path.as_mut() {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        }
    }

    /// Checks the configuration before any network activity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        if !self.push.users.is_empty() && !self.push.groups.is_empty() {
            return Err(ConfigError::ConflictingRecipients);
        }

        if self.source.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("source.base_url must not be empty".to_string()));
        }

        self.message.composer()?;

        let archive = &self.push.archive;
        if archive.is_active() && archive.archive_at(Utc::now()).is_none() {
            return Err(ConfigError::Invalid(format!(
                "push.archive offset of {} seconds is out of range",
                archive.total_seconds()
            )));
        }

        if self.email.enabled {
            let email = &self.email;
            if email.smtp_host.as_deref().map_or(true, |h| h.trim().is_empty()) {
                return Err(ConfigError::Email("smtp_host is required".to_string()));
            }
            if email.from.as_deref().map_or(true, |f| !f.contains('@')) {
                return Err(ConfigError::Email(
                    "from must be set to a valid address".to_string(),
                ));
            }
            if email.username.is_some() != email.password.is_some() {
                return Err(ConfigError::Email(
                    "username and password must be set together".to_string(),
                ));
            }
            if let Some(bad) = email.recipients.iter().find(|r| !r.contains('@')) {
                return Err(ConfigError::Email(format!("invalid recipient '{}'", bad)));
            }
        }

        Ok(())
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let mut config: AppConfig =
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;

    if let Some(base_dir) = path.parent() {
        config.resolve_paths(base_dir);
    }

    Ok(config)
}
