use anyhow::Context;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Placeholder shipped in sample `.env` files
const PLACEHOLDER_MAPS_KEY: &str = "YOUR_API_KEY";

#[derive(Debug)]
pub struct Config {
    pub base_url: String,
    pub maps_api_key: Option<String>,
    pub session_dir: PathBuf,
    pub http_timeout: Duration,
    pub map_debounce: Duration,
    pub map_change_threshold: f64,
}

impl Config {
    /// Read configuration from the environment, after loading `.env` if present
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: lookup("MAEMUL_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            maps_api_key: lookup("MAEMUL_MAPS_API_KEY")
                .filter(|key| !key.is_empty() && key != PLACEHOLDER_MAPS_KEY),
            session_dir: lookup("MAEMUL_SESSION_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".maemul")),
            http_timeout: Duration::from_secs(parse_var(&lookup, "MAEMUL_HTTP_TIMEOUT_SECS", 30)?),
            map_debounce: Duration::from_millis(parse_var(&lookup, "MAEMUL_MAP_DEBOUNCE_MS", 300)?),
            map_change_threshold: parse_var(&lookup, "MAEMUL_MAP_CHANGE_THRESHOLD", 0.05)?,
        })
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", name, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.maps_api_key, None);
        assert_eq!(config.session_dir, PathBuf::from(".maemul"));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.map_debounce, Duration::from_millis(300));
        assert_eq!(config.map_change_threshold, 0.05);
    }

    #[test]
    fn values_override_defaults() {
        let config = config_from(&[
            ("MAEMUL_API_BASE_URL", "https://api.example.com"),
            ("MAEMUL_MAPS_API_KEY", "abc123"),
            ("MAEMUL_MAP_DEBOUNCE_MS", " 150 "),
            ("MAEMUL_MAP_CHANGE_THRESHOLD", "0.1"),
        ])
        .unwrap();

        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.maps_api_key.as_deref(), Some("abc123"));
        assert_eq!(config.map_debounce, Duration::from_millis(150));
        assert_eq!(config.map_change_threshold, 0.1);
    }

    #[test]
    fn malformed_number_is_an_error() {
        let err = config_from(&[("MAEMUL_MAP_DEBOUNCE_MS", "soon")]).unwrap_err();

        assert!(err.to_string().contains("MAEMUL_MAP_DEBOUNCE_MS"));
    }

    #[test]
    fn placeholder_or_blank_maps_key_is_ignored() {
        let placeholder = config_from(&[("MAEMUL_MAPS_API_KEY", "YOUR_API_KEY")]).unwrap();
        let blank = config_from(&[("MAEMUL_MAPS_API_KEY", "")]).unwrap();

        assert_eq!(placeholder.maps_api_key, None);
        assert_eq!(blank.maps_api_key, None);
    }
}
