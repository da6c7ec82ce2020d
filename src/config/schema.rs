use std::path::PathBuf;

use serde::Deserialize;

use super::load::{default_data_dir, default_state_dir};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/record/config.toml` or `~/.config/record/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `RECORD__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub search: SearchSettings,
    pub ui: UiSettings,
    pub export: ExportSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// SQLite database holding the catalog.
    pub database_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_path: default_data_dir()
                .map(|d| d.join("record.db"))
                .unwrap_or_else(|| PathBuf::from("record.db")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Search endpoint speaking the iTunes Search API response format.
    pub endpoint: String,
    /// Maximum number of candidates per query.
    pub limit: u32,
    /// Optional two-letter storefront code, e.g. "KR" or "US".
    pub country: Option<String>,
    /// Per-request timeout (milliseconds).
    pub timeout_ms: u64,
    /// Edge length requested for album art (pixels).
    pub artwork_size: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://itunes.apple.com/search".to_string(),
            limit: 25,
            country: None,
            timeout_ms: 10_000,
            artwork_size: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Shortest CD spin before the detail view opens (frames).
    pub spin_frames_min: u32,
    /// Longest CD spin before the detail view opens (frames).
    pub spin_frames_max: u32,
    /// Redraw/tick interval (milliseconds).
    pub tick_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ songs worth keeping ~ ".to_string(),
            spin_frames_min: 10,
            spin_frames_max: 20,
            tick_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Where exported snapshots are written.
    pub directory: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            directory: default_data_dir()
                .map(|d| d.join("exports"))
                .unwrap_or_else(|| PathBuf::from("exports")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is unset, e.g. "info" or "record=debug".
    pub level: String,
    /// Log file. The terminal belongs to the UI, so logs never go to stdout.
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: default_state_dir().map(|d| d.join("record.log")),
        }
    }
}
