//! Application-level configuration loading, including the default question
//! set used to seed implicitly created sessions.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZBOX_BACK_CONFIG_PATH";
/// Bound on storage lock waits when the config does not specify one.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 3000;

/// A question definition as it appears in the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionSeed {
    /// Question text.
    pub text: String,
    /// Answer options (at least two).
    pub options: Vec<String>,
    /// Position of the correct option.
    pub correct_index: usize,
    /// Optional illustration reference.
    #[serde(default)]
    pub image_ref: Option<String>,
    /// Optional explanation shown after the reveal.
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    busy_timeout: Duration,
    default_questions: Vec<QuestionSeed>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to
    /// built-in defaults when the file is absent or malformed.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        default_questions = config.default_questions.len(),
                        busy_timeout_ms = config.busy_timeout.as_millis() as u64,
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Bound on how long a request waits for the storage lock.
    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    /// Question set seeded into sessions created on first reference.
    /// Empty when no default set is configured.
    pub fn default_questions(&self) -> &[QuestionSeed] {
        &self.default_questions
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            default_questions: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    busy_timeout_ms: Option<u64>,
    #[serde(default)]
    default_questions: Vec<QuestionSeed>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        Self {
            busy_timeout: Duration::from_millis(
                raw.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
            ),
            default_questions: raw.default_questions,
        }
    }
}

fn resolve_config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_config_parses_question_seeds() {
        let raw: RawConfig = serde_json::from_str(
            r#"{
                "busy_timeout_ms": 500,
                "default_questions": [
                    {"text": "2+2?", "options": ["3", "4"], "correct_index": 1}
                ]
            }"#,
        )
        .unwrap();

        let config: AppConfig = raw.into();
        assert_eq!(config.busy_timeout(), Duration::from_millis(500));
        assert_eq!(config.default_questions().len(), 1);
        assert_eq!(config.default_questions()[0].correct_index, 1);
        assert!(config.default_questions()[0].explanation.is_none());
    }

    #[test]
    fn defaults_apply_when_fields_missing() {
        let raw: RawConfig = serde_json::from_str("{}").unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(
            config.busy_timeout(),
            Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS)
        );
        assert!(config.default_questions().is_empty());
    }
}
