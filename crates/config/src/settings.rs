// User settings
// Loaded from ~/.config/dealdesk/settings.json

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How imported rows meet rows already in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Update existing keys, insert new ones (default)
    #[default]
    Upsert,
    /// Insert every row as-is
    Append,
}

impl FromStr for ImportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "upsert" => Ok(Self::Upsert),
            "append" => Ok(Self::Append),
            other => Err(format!("unknown import mode '{other}' (expected upsert or append)")),
        }
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Upsert => "upsert",
            Self::Append => "append",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Store
    #[serde(rename = "db.path")]
    pub db_path: Option<PathBuf>,

    // Import
    #[serde(rename = "import.config")]
    pub import_config: Option<PathBuf>,

    #[serde(rename = "import.mode")]
    pub import_mode: ImportMode,

    #[serde(rename = "preview.limit")]
    pub preview_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: None,       // None = ./dealdesk.db
            import_config: None, // None = built-in workbook layout
            import_mode: ImportMode::Upsert,
            preview_limit: 10,
        }
    }
}

const DEFAULT_FILE: &str = r#"{
    // SQLite database the import writes to (null = ./dealdesk.db)
    // Overridden by --db or the DEALDESK_DB environment variable
    "db.path": null,

    // TOML file describing sheet, header row and column labels
    // (null = the standard "Official Deal" layout)
    "import.config": null,

    // "upsert" updates existing deals, "append" inserts every row
    "import.mode": "upsert",

    // Rows shown by `dealdesk preview`
    "preview.limit": 10
}
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dealdesk");
        config_dir.join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            if let Err(e) = Self::create_default_file(&path) {
                log::warn!("cannot write default {}: {}", path.display(), e);
            }
            return Self::default();
        }

        Self::load_from(&path)
    }

    /// Load settings from a specific file, falling back to defaults on error
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("error parsing {}: {}; using default settings", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON, ignoring `//` comment lines
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Create default settings file with comments
    fn create_default_file(path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        fs::write(path, DEFAULT_FILE).map_err(|e| e.to_string())?;
        log::debug!("wrote default settings to {}", path.display());
        Ok(())
    }

    /// Database path: the configured one, or `dealdesk.db` in the working directory
    pub fn effective_db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(|| PathBuf::from("dealdesk.db"))
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}
