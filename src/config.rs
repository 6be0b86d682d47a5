use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "transcript-notes.json";
const MIN_POLL_INTERVAL_MS: u64 = 250;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;

pub const ENV_CONFIG_PATH: &str = "TRANSCRIPT_NOTES_CONFIG";
pub const ENV_BACKEND_URL: &str = "TRANSCRIPT_NOTES_BACKEND_URL";
pub const ENV_ANNOTATION_URL: &str = "TRANSCRIPT_NOTES_ANNOTATION_URL";
pub const ENV_POLL_INTERVAL_MS: &str = "TRANSCRIPT_NOTES_POLL_INTERVAL_MS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Host serving `/transcriptions`, capture control and the summary.
    pub backend_url: String,
    /// Host serving the comment endpoints, when it differs from `backend_url`.
    pub annotation_url: Option<String>,
    pub poll_interval_ms: u64,
    /// Unset means the HTTP client's default (no explicit timeout).
    pub request_timeout_secs: Option<u64>,
    pub summary_on_stop: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            annotation_url: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_secs: None,
            summary_on_stop: true,
        }
    }
}

impl AppConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

pub fn config_path() -> PathBuf {
    env::var(ENV_CONFIG_PATH)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_BACKEND_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn normalize_poll_interval(ms: u64) -> u64 {
    if ms == 0 {
        DEFAULT_POLL_INTERVAL_MS
    } else {
        ms.max(MIN_POLL_INTERVAL_MS)
    }
}

pub fn load_or_create(path: &Path) -> Result<AppConfig, String> {
    if !path.exists() {
        let config = AppConfig::default();
        save(path, &config)?;
        return Ok(config);
    }

    let raw = fs::read_to_string(path).map_err(|e| format!("Failed to read config: {}", e))?;
    match serde_json::from_str::<AppConfig>(&raw) {
        Ok(mut config) => {
            normalize_config(&mut config);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!("Config at {} is unreadable ({}), resetting", path.display(), e);
            let backup = path.with_extension("json.bak");
            let _ = fs::copy(path, backup);
            let config = AppConfig::default();
            save(path, &config)?;
            Ok(config)
        }
    }
}

pub fn save(path: &Path, config: &AppConfig) -> Result<(), String> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| format!("Failed to create config dir: {}", e))?;
    }
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, json).map_err(|e| format!("Failed to save config: {}", e))
}

/// Load the config file, then let `TRANSCRIPT_NOTES_*` variables override it.
pub fn load() -> Result<AppConfig, String> {
    let mut config = load_or_create(&config_path())?;
    apply_env_overrides(&mut config, |key| env::var(key).ok());
    Ok(config)
}

pub fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup(ENV_BACKEND_URL) {
        config.backend_url = url;
    }

    if let Some(url) = lookup(ENV_ANNOTATION_URL) {
        config.annotation_url = Some(url);
    }

    if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
        match raw.trim().parse::<u64>() {
            Ok(ms) => config.poll_interval_ms = ms,
            Err(_) => tracing::warn!("Ignoring invalid {}='{}'", ENV_POLL_INTERVAL_MS, raw),
        }
    }

    normalize_config(config);
}

fn normalize_config(config: &mut AppConfig) {
    config.backend_url = normalize_url(&config.backend_url);
    config.annotation_url = config.annotation_url.take().and_then(|url| {
        let trimmed = url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    });
    config.poll_interval_ms = normalize_poll_interval(config.poll_interval_ms);
    config.request_timeout_secs = config.request_timeout_secs.filter(|secs| *secs > 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn temp_config(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("transcript_notes_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir.join("config.json")
    }

    #[test]
    fn test_missing_file_writes_default() {
        let path = temp_config("missing");

        let config = load_or_create(&path).unwrap();

        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_corrupt_file_is_backed_up_and_reset() {
        let path = temp_config("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let config = load_or_create(&path).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(
            fs::read_to_string(path.with_extension("json.bak")).unwrap(),
            "{ not json"
        );
    }

    #[test]
    fn test_partial_file_is_normalized() {
        let path = temp_config("partial");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{"backend_url":" http://10.0.0.2:5000/ ","annotation_url":"  ","poll_interval_ms":10}"#,
        )
        .unwrap();

        let config = load_or_create(&path).unwrap();

        assert_eq!(config.backend_url, "http://10.0.0.2:5000");
        assert_eq!(config.annotation_url, None);
        assert_eq!(config.poll_interval_ms, 250);
        assert!(config.summary_on_stop);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_BACKEND_URL, "https://api.example.test/"),
            (ENV_ANNOTATION_URL, "https://comments.example.test"),
            (ENV_POLL_INTERVAL_MS, "1500"),
        ]);
        let mut config = AppConfig::default();

        apply_env_overrides(&mut config, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.backend_url, "https://api.example.test");
        assert_eq!(
            config.annotation_url.as_deref(),
            Some("https://comments.example.test")
        );
        assert_eq!(config.poll_interval(), Duration::from_millis(1500));
    }

    #[test]
    fn test_invalid_interval_override_is_ignored() {
        let mut config = AppConfig::default();

        apply_env_overrides(&mut config, |key| {
            (key == ENV_POLL_INTERVAL_MS).then(|| "soon".to_string())
        });

        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }
}
