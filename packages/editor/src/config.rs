use std::path::Path;

use folio_transform::RecreateOptions;
use serde::{Deserialize, Serialize};

use crate::errors::{EditorError, EditorResult};
use crate::history::DEFAULT_DEPTH;

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Undo levels kept; 0 keeps everything
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,

    #[serde(default)]
    pub diff: DiffOptions,

    /// Platform string used for shortcut normalization when the surface
    /// does not report one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

fn default_history_depth() -> usize {
    DEFAULT_DEPTH
}

/// How change-tracking diffs are derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffOptions {
    #[serde(default = "default_true")]
    pub allow_non_replace_steps: bool,

    #[serde(default)]
    pub word_granularity: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            allow_non_replace_steps: true,
            word_granularity: false,
        }
    }
}

impl From<DiffOptions> for RecreateOptions {
    fn from(options: DiffOptions) -> Self {
        RecreateOptions {
            allow_non_replace_steps: options.allow_non_replace_steps,
            word_granularity: options.word_granularity,
        }
    }
}

impl EditorConfig {
    /// Load config from a directory, defaulting when there is no config file
    pub fn load(dir: impl AsRef<Path>) -> EditorResult<Self> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json(content: &str) -> EditorResult<Self> {
        serde_json::from_str(content).map_err(|err| EditorError::Config(err.to_string()))
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: DEFAULT_DEPTH,
            diff: DiffOptions::default(),
            platform: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "historyDepth": 20,
            "diff": { "wordGranularity": true },
            "platform": "MacIntel"
        }"#;

        let config = EditorConfig::from_json(json).unwrap();
        assert_eq!(config.history_depth, 20);
        assert!(config.diff.allow_non_replace_steps);
        assert!(config.diff.word_granularity);
        assert_eq!(config.platform.as_deref(), Some("MacIntel"));
    }

    #[test]
    fn test_defaults() {
        let config = EditorConfig::from_json("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.history_depth, 100);

        let options: RecreateOptions = config.diff.into();
        assert_eq!(options, RecreateOptions::default());
    }

    #[test]
    fn test_invalid_config() {
        let err = EditorConfig::from_json(r#"{"historyDepth": "many"}"#).unwrap_err();
        assert!(matches!(err, EditorError::Config(_)));
    }

    #[test]
    fn test_missing_file_defaults() {
        let dir = std::env::temp_dir().join("folio-config-missing");
        let config = EditorConfig::load(&dir).unwrap();
        assert_eq!(config, EditorConfig::default());
    }
}
