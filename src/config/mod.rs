use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::imaging::DEFAULT_MAX_DIMENSION;
use crate::template::DEFAULT_ENDPOINTS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "memegen";
const APP_CONFIG_FILE: &str = "config.json";

/// Application-level settings from `config.json`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub max_dimension: Option<u32>,
    #[serde(default)]
    pub template_endpoints: Option<Vec<String>>,
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
    #[serde(default)]
    pub debug_logging: bool,
}

impl AppConfig {
    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_MAX_DIMENSION)
    }

    pub fn template_endpoints(&self) -> Vec<String> {
        match &self.template_endpoints {
            Some(endpoints) if endpoints.iter().any(|url| !url.trim().is_empty()) => endpoints
                .iter()
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .collect(),
            _ => DEFAULT_ENDPOINTS.iter().map(|url| url.to_string()).collect(),
        }
    }

    pub fn export_dir(&self) -> Option<&Path> {
        self.export_dir
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }
}

pub fn load_app_config() -> AppConfig {
    let xdg_config_home = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
    let home = std::env::var_os("HOME").map(PathBuf::from);
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let Ok(path) = config_file_path(xdg_config_home, home) else {
        tracing::debug!("no config directory; using defaults");
        return AppConfig::default();
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

/// `$XDG_CONFIG_HOME/memegen/config.json`, else `$HOME/.config/memegen/config.json`.
fn config_file_path(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let root = match xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        Some(xdg) => xdg.to_path_buf(),
        None => home
            .ok_or(ConfigPathError::MissingHomeDirectory)?
            .join(".config"),
    };
    Ok(root.join(APP_DIR).join(APP_CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_root(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("memegen-config-{name}-{nanos}"))
    }

    fn write_config(root: &Path, contents: &str) {
        let dir = root.join(APP_DIR);
        std::fs::create_dir_all(&dir).expect("create config dir");
        std::fs::write(dir.join(APP_CONFIG_FILE), contents).expect("write config");
    }

    #[test]
    fn xdg_config_wins_over_home_config() {
        let xdg = temp_config_root("xdg");
        let home = temp_config_root("home");
        write_config(&xdg, r#"{"max_dimension": 640}"#);
        write_config(&home.join(".config"), r#"{"max_dimension": 320}"#);

        let config = load_app_config_with(Some(&xdg), Some(&home));
        assert_eq!(config.max_dimension(), 640);
        let _ = std::fs::remove_dir_all(xdg);
        let _ = std::fs::remove_dir_all(home);
    }

    #[test]
    fn home_dot_config_is_used_when_xdg_is_unset_or_empty() {
        let home = temp_config_root("home-fallback");
        write_config(
            &home.join(".config"),
            r#"{"export_dir": "/tmp/home-memes", "debug_logging": true}"#,
        );

        for xdg in [None, Some(Path::new(""))] {
            let config = load_app_config_with(xdg, Some(&home));
            assert_eq!(config.export_dir(), Some(Path::new("/tmp/home-memes")));
            assert!(config.debug_logging);
        }
        let _ = std::fs::remove_dir_all(home);
    }

    #[test]
    fn no_config_directory_yields_defaults() {
        assert_eq!(
            config_file_path(None, None),
            Err(ConfigPathError::MissingHomeDirectory)
        );
        let config = load_app_config_with(None, None);
        assert_eq!(config.max_dimension(), DEFAULT_MAX_DIMENSION);
        assert!(config.export_dir().is_none());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let root = temp_config_root("missing");
        let config = load_app_config_with(Some(&root), None);
        assert_eq!(config.max_dimension(), DEFAULT_MAX_DIMENSION);
        assert_eq!(config.template_endpoints().len(), DEFAULT_ENDPOINTS.len());
        assert!(config.export_dir().is_none());
        assert!(!config.debug_logging);
    }

    #[test]
    fn fields_are_read_from_config_json() {
        let root = temp_config_root("fields");
        write_config(
            &root,
            r#"{
                "max_dimension": 1024,
                "template_endpoints": [" https://example.test/templates ", ""],
                "export_dir": "/tmp/memes",
                "debug_logging": true
            }"#,
        );
        let config = load_app_config_with(Some(&root), None);
        assert_eq!(config.max_dimension(), 1024);
        assert_eq!(
            config.template_endpoints(),
            vec!["https://example.test/templates".to_string()]
        );
        assert_eq!(config.export_dir(), Some(Path::new("/tmp/memes")));
        assert!(config.debug_logging);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn malformed_file_and_zero_dimension_fall_back_to_defaults() {
        let root = temp_config_root("malformed");
        write_config(&root, "{ not json");
        let config = load_app_config_with(Some(&root), None);
        assert_eq!(config.max_dimension(), DEFAULT_MAX_DIMENSION);

        let zero = AppConfig {
            max_dimension: Some(0),
            template_endpoints: Some(vec!["  ".to_string()]),
            ..AppConfig::default()
        };
        assert_eq!(zero.max_dimension(), DEFAULT_MAX_DIMENSION);
        assert_eq!(zero.template_endpoints().len(), DEFAULT_ENDPOINTS.len());
        let _ = std::fs::remove_dir_all(root);
    }
}
