// Grid settings
// Loaded from ~/.config/cellgrid/settings.json (or settings.toml)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid settings TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Where a committed edit lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitMode {
    /// Edits write the committed value immediately
    #[default]
    Direct,
    /// Edits go to the pending overlay until flushed
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    // History
    #[serde(rename = "history.capacity")]
    pub history_capacity: usize,

    // Editing
    #[serde(rename = "edit.commitMode")]
    pub commit_mode: CommitMode,

    // Fill
    #[serde(rename = "fill.languages")]
    pub fill_languages: Vec<String>,

    // Input
    #[serde(rename = "input.compositionGraceMs")]
    pub composition_grace_ms: u64,

    // Auto-scroll
    #[serde(rename = "autoScroll.edgeMargin")]
    pub auto_scroll_edge_margin: f32,

    #[serde(rename = "autoScroll.rowsPerTick")]
    pub auto_scroll_rows_per_tick: usize,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            commit_mode: CommitMode::Direct,
            fill_languages: vec!["en".to_string()],
            composition_grace_ms: 50,
            auto_scroll_edge_margin: 24.0,
            auto_scroll_rows_per_tick: 1,
        }
    }
}

impl GridSettings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cellgrid")
            .join("settings.json")
    }

    /// Parse JSON settings. Lines starting with `//` are comments.
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(serde_json::from_str(&cleaned)?)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Read and parse a settings file; `.toml` files are parsed as TOML,
    /// anything else as JSON.
    pub fn read_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml")) {
            Self::from_toml_str(&contents)
        } else {
            Self::from_json_str(&contents)
        }
    }

    /// Load settings from `path`, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::read_from(path) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    /// Load from the default config path
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Clamp values that would disable a subsystem outright.
    fn sanitized(mut self) -> Self {
        if self.history_capacity == 0 {
            log::warn!("history.capacity must be at least 1");
            self.history_capacity = 1;
        }
        if self.fill_languages.is_empty() {
            self.fill_languages = Self::default().fill_languages;
        }
        if !self.auto_scroll_edge_margin.is_finite() || self.auto_scroll_edge_margin < 0.0 {
            self.auto_scroll_edge_margin = Self::default().auto_scroll_edge_margin;
        }
        self
    }
}
