//! Configuration models for trivia-quiz.
//!
//! All I^R (resolvable ignorance) is parameterized here.
//! The user resolves these unknowns at runtime via config file or flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for trivia-quiz.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Trivia API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Presentation settings
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Trivia API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL; `/questions` and `/checkanswers` are appended to it.
    /// Values can contain ${ENV_VAR} for environment variable expansion
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds. Unset means requests never time out.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    concat!("trivia-quiz/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Presentation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Decode HTML entities (`&#039;`, `&quot;`) in question and answer text
    #[serde(default = "default_true")]
    pub decode_html_entities: bool,

    /// How many diagnostic records to keep
    #[serde(default = "default_debug_capacity")]
    pub debug_capacity: usize,
}

fn default_true() -> bool {
    true
}

fn default_debug_capacity() -> usize {
    20
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            decode_html_entities: true,
            debug_capacity: default_debug_capacity(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// B_i(file exists) → Result
    /// B_i(file is valid TOML) → Result
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the API base: expand env vars, strip the trailing slash, and
    /// check that it is an http(s) URL.
    pub fn resolve_base_url(&self) -> Result<String, ConfigError> {
        normalize_base_url(&expand_env_vars(&self.api.base_url))
    }
}

/// Trim whitespace and one trailing `/`, then validate the scheme.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let base = trimmed.strip_suffix('/').unwrap_or(trimmed);

    let url = reqwest::Url::parse(base).map_err(|e| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    Ok(base.to_string())
}

/// Expand environment variables in a string.
///
/// Supports ${VAR_NAME} syntax.
/// If the variable is not set, the placeholder is left unchanged.
pub fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let Ok(re) = regex::Regex::new(r"\$\{([^}]+)\}") else {
        return result;
    };

    for cap in re.captures_iter(s) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_file_missing() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_file_or_default(&temp_dir.path().join("trivia.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.resolve_base_url().unwrap(), DEFAULT_BASE_URL);
        assert!(config.display.decode_html_entities);
        assert_eq!(config.api.timeout_secs, None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("trivia.toml");
        fs::write(
            &path,
            r#"
[api]
base_url = "https://quiz.example.com/api/"
timeout_secs = 15
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.api.timeout_secs, Some(15));
        assert_eq!(config.display, DisplayConfig::default());
        assert_eq!(
            config.resolve_base_url().unwrap(),
            "https://quiz.example.com/api"
        );
    }

    #[test]
    fn test_parse_error_names_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        fs::write(&path, "[api\nbase_url = 1").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("http://localhost:8080/api/").unwrap(),
            "http://localhost:8080/api"
        );
        assert_eq!(
            normalize_base_url("  http://localhost:8080/api ").unwrap(),
            "http://localhost:8080/api"
        );
        assert!(matches!(
            normalize_base_url("ftp://localhost/api"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn test_expand_env_vars_leaves_unknown_placeholder() {
        assert_eq!(
            expand_env_vars("http://${TRIVIA_TEST_SURELY_UNSET_VAR}/api"),
            "http://${TRIVIA_TEST_SURELY_UNSET_VAR}/api"
        );
    }
}
