//! Persisted operator defaults using local JSON storage.

use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// Settings file name.
const SETTINGS_FILE: &str = "report_settings.json";

/// Operator defaults remembered between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    /// Recipient used for the last successfully sent report.
    pub last_recipient: Option<String>,

    /// Directory the last CSV was written to.
    pub last_output_dir: Option<PathBuf>,
}

/// Get the path to the report settings file.
pub fn get_settings_path() -> Option<PathBuf> {
    ProjectDirs::from("io", "orgreport", "orgreport")
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
}

/// Load report settings from disk.
///
/// Returns default settings if the file doesn't exist or is corrupted.
pub fn load_report_settings() -> ReportSettings {
    let path = match get_settings_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine config directory, using default settings");
            return ReportSettings::default();
        }
    };

    if !path.exists() {
        debug!("Report settings file does not exist, using defaults");
        return ReportSettings::default();
    }

    match fs::read_to_string(&path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded report settings from {:?}", path);
                settings
            }
            Err(e) => {
                error!("Failed to parse report settings: {}, using defaults", e);
                ReportSettings::default()
            }
        },
        Err(e) => {
            error!("Failed to read report settings file: {}, using defaults", e);
            ReportSettings::default()
        }
    }
}

/// Save report settings to disk.
pub fn save_report_settings(settings: &ReportSettings) -> Result<(), std::io::Error> {
    let path = get_settings_path().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine config directory",
        )
    })?;

    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(settings)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

    fs::write(&path, content)?;

    debug!("Saved report settings to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_settings_path() {
        let path = get_settings_path();
        assert!(path.is_some());
        assert!(path.unwrap().ends_with("report_settings.json"));
    }

    #[test]
    fn test_settings_roundtrip() {
        let temp_dir = env::temp_dir().join("orgreport_test");
        let _ = fs::create_dir_all(&temp_dir);
        let test_file = temp_dir.join("test_settings.json");

        let settings = ReportSettings {
            last_recipient: Some("admin@x.com".into()),
            last_output_dir: Some(PathBuf::from("/tmp/reports")),
        };

        let content = serde_json::to_string_pretty(&settings).unwrap();
        fs::write(&test_file, content).unwrap();

        let loaded: ReportSettings =
            serde_json::from_str(&fs::read_to_string(&test_file).unwrap()).unwrap();

        assert_eq!(loaded, settings);

        let _ = fs::remove_file(&test_file);
    }

    #[test]
    fn test_corrupt_settings_degrade_to_default() {
        let parsed: Result<ReportSettings, _> = serde_json::from_str("not json");
        assert!(parsed.is_err());
        // load_report_settings maps this case to defaults
        assert_eq!(ReportSettings::default().last_recipient, None);
    }
}
