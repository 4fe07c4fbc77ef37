use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "assets/config/portfolio.json";

fn default_web_root() -> PathBuf {
    PathBuf::from("public")
}

fn default_content_location() -> String {
    "photovr.json".to_string()
}

fn default_environment() -> String {
    "images/pond_bridge_night_1k.hdr".to_string()
}

fn default_bgm() -> String {
    "mp3/photobgm.mp3".to_string()
}

fn default_bubble_count() -> usize {
    5
}

fn default_page_size() -> usize {
    8
}

fn default_sphere_segments() -> u32 {
    32
}

/// Runtime settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory that relative asset references resolve against.
    #[serde(default = "default_web_root")]
    pub web_root: PathBuf,
    /// Gallery content list, a URL or a path under the web root.
    #[serde(default = "default_content_location")]
    pub content_location: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_bgm")]
    pub bgm: String,
    #[serde(default = "default_bubble_count")]
    pub bubble_count: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_sphere_segments")]
    pub sphere_segments: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            web_root: default_web_root(),
            content_location: default_content_location(),
            environment: default_environment(),
            bgm: default_bgm(),
            bubble_count: default_bubble_count(),
            page_size: default_page_size(),
            sphere_segments: default_sphere_segments(),
        }
    }
}

impl AppConfig {
    pub fn resolve(&self, reference: &str) -> PathBuf {
        self.web_root.join(reference.trim_start_matches('/'))
    }
}

pub fn load_config_from_path(path: &Path) -> Result<AppConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
    let config: AppConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// A missing file is not an error; a broken one is.
pub fn load_or_default(path: &Path) -> Result<AppConfig, String> {
    if !path.exists() {
        log::info!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }
    load_config_from_path(path)
}

fn validate_config(config: &AppConfig) -> Result<(), String> {
    if config.page_size == 0 {
        return Err("Config validation failed: page_size must be at least 1".to_string());
    }
    if config.bubble_count > 256 {
        return Err(format!(
            "Config validation failed: bubble_count {} exceeds 256",
            config.bubble_count
        ));
    }
    if !(3..=256).contains(&config.sphere_segments) {
        return Err(format!(
            "Config validation failed: sphere_segments {} outside 3..=256",
            config.sphere_segments
        ));
    }
    for (name, value) in [
        ("content_location", &config.content_location),
        ("environment", &config.environment),
        ("bgm", &config.bgm),
    ] {
        if value.trim().is_empty() {
            return Err(format!("Config validation failed: {name} is empty"));
        }
    }
    if config.bubble_count == 0 {
        log::warn!("bubble_count is 0, the bubbles scene will be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "pf_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn empty_object_gives_defaults() {
        let path = temp_file_path("empty");
        fs::write(&path, "{}").expect("write temp config");
        let config = load_config_from_path(&path).expect("defaults should load");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.page_size, 8);
        assert_eq!(config.bubble_count, 5);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn fields_override_defaults() {
        let path = temp_file_path("override");
        fs::write(
            &path,
            r#"{ "web_root": "site", "bubble_count": 12, "content_location": "https://cdn.example/photovr.json" }"#,
        )
        .expect("write temp config");
        let config = load_config_from_path(&path).expect("config should load");
        assert_eq!(config.web_root, PathBuf::from("site"));
        assert_eq!(config.bubble_count, 12);
        assert_eq!(config.content_location, "https://cdn.example/photovr.json");
        assert_eq!(config.resolve("/mp3/photobgm.mp3"), PathBuf::from("site/mp3/photobgm.mp3"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let path = temp_file_path("zero_page");
        fs::write(&path, r#"{ "page_size": 0 }"#).expect("write temp config");
        let err = load_config_from_path(&path).expect_err("page_size 0 should fail");
        assert!(err.contains("page_size"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn blank_asset_reference_is_rejected() {
        let path = temp_file_path("blank");
        fs::write(&path, r#"{ "bgm": "  " }"#).expect("write temp config");
        let err = load_config_from_path(&path).expect_err("blank bgm should fail");
        assert!(err.contains("bgm is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_falls_back_but_broken_file_fails() {
        let missing = temp_file_path("missing");
        assert_eq!(load_or_default(&missing).expect("defaults"), AppConfig::default());

        let broken = temp_file_path("broken");
        fs::write(&broken, "{ nope").expect("write temp config");
        let err = load_or_default(&broken).expect_err("broken JSON should fail");
        assert!(err.contains("Failed to parse config JSON"));
        let _ = fs::remove_file(broken);
    }
}
