use std::fmt;

/// Fatal configuration problems, detected before any network activity.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Read { path: String, reason: String },
    Parse(String),
    MissingApiKey,
    ConflictingRecipients,
    Email(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, reason } => {
                write!(f, "cannot read config file '{}': {}", path, reason)
            }
            ConfigError::Parse(reason) => write!(f, "invalid config file: {}", reason),
            ConfigError::MissingApiKey => {
                write!(f, "api_key is required (config file or FMSWATCH_API_KEY)")
            }
            ConfigError::ConflictingRecipients => write!(
                f,
                "push.users and push.groups are mutually exclusive; configure only one"
            ),
            ConfigError::Email(reason) => write!(f, "invalid email settings: {}", reason),
            ConfigError::Invalid(reason) => write!(f, "{}", reason),
        }
    }
}

impl std::error::Error for ConfigError {}
