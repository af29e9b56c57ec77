use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Engine + collaborator configuration, loaded from TOML.
#[derive(Debug, Deserialize, Clone)]
pub struct ReviserConfig {
    pub service: ServiceConfig,
    #[serde(default)]
    pub limits: Limits,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    /// Rewrite endpoint: either a proxy `/content/modify` route or an
    /// OpenAI-compatible chat-completions URL, depending on the adapter.
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name for the chat adapter; ignored by the proxy adapter.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Limits {
    /// Upper bound on instruction length, in bytes.
    #[serde(default = "default_max_instruction_len")]
    pub max_instruction_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_instruction_len: default_max_instruction_len(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_instruction_len() -> usize {
    2_000
}

impl ReviserConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.service.endpoint.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "service.endpoint",
            });
        }
        if self.service.timeout_secs == 0 {
            issues.push(ValidationIssue::InvalidValue {
                field: "service.timeout_secs",
                message: "timeout must be at least 1 second".to_string(),
            });
        }
        if self.limits.max_instruction_len == 0 {
            issues.push(ValidationIssue::InvalidValue {
                field: "limits.max_instruction_len",
                message: "instruction cap must be nonzero".to_string(),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read reviser config from {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse reviser config TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse reviser config TOML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(
                    f,
                    "invalid reviser config ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "invalid reviser config: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    MissingField { field: &'static str },
    InvalidValue { field: &'static str, message: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { field } => {
                write!(f, "config missing required field '{field}'")
            }
            ValidationIssue::InvalidValue { field, message } => {
                write!(f, "config field '{field}' is invalid: {message}")
            }
        }
    }
}

/// Parse and validate a config from a TOML string.
pub fn load_from_str(content: &str) -> Result<ReviserConfig, ConfigError> {
    let config: ReviserConfig =
        toml_edit::de::from_str(content).map_err(|source| ConfigError::Toml {
            path: None,
            source,
        })?;

    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;

    Ok(config)
}

/// Read, parse, and validate a config file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ReviserConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    load_from_str(&content).map_err(|err| err.with_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let config = load_from_str(
            r#"
[service]
endpoint = "https://api.example.com/content/modify"
"#,
        )
        .unwrap();

        assert_eq!(
            config.service.endpoint,
            "https://api.example.com/content/modify"
        );
        assert_eq!(config.service.timeout_secs, 30);
        assert!(config.service.api_key.is_none());
        assert_eq!(config.limits.max_instruction_len, 2_000);
    }

    #[test]
    fn full_config_parses() {
        let config = load_from_str(
            r#"
[service]
endpoint = "https://llm.internal/v1/chat/completions"
api_key = "sk-test"
model = "gpt-4o"
timeout_secs = 10

[limits]
max_instruction_len = 500
"#,
        )
        .unwrap();

        assert_eq!(config.service.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.service.timeout_secs, 10);
        assert_eq!(config.limits.max_instruction_len, 500);
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let err = load_from_str(
            r#"
[service]
endpoint = "  "
"#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("service.endpoint"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = load_from_str(
            r#"
[service]
endpoint = "https://api.example.com"
timeout_secs = 0
"#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn malformed_toml_reports_parse_error() {
        let err = load_from_str("[service").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }
}
