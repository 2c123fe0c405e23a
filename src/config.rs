// Runtime configuration. Everything comes from environment variables with
// working-directory defaults, the same way the API client used to read
// its gateway URL.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.deezer.com/search";
pub const DEFAULT_HISTORY_FILE: &str = "search-history.txt";
pub const DEFAULT_PLAYLISTS_DIR: &str = "playlists";
pub const DEFAULT_LOG_DIR: &str = ".logs";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings shared by the API client, the file library and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub history_file: PathBuf,
    pub playlists_dir: PathBuf,
    pub log_dir: PathBuf,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.into(),
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            playlists_dir: PathBuf::from(DEFAULT_PLAYLISTS_DIR),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Build the configuration from the process environment.
    ///
    /// Recognised variables: `SOUND_FINDER_API_URL`,
    /// `SOUND_FINDER_HISTORY_FILE`, `SOUND_FINDER_PLAYLISTS_DIR`,
    /// `SOUND_FINDER_LOG_DIR` and `SOUND_FINDER_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads values through `lookup`, so callers
    /// (and tests) can supply their own source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let timeout = match lookup("SOUND_FINDER_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid SOUND_FINDER_TIMEOUT_SECS value {:?}", raw))?;
                Duration::from_secs(secs)
            }
            None => defaults.timeout,
        };

        Ok(Config {
            api_url: lookup("SOUND_FINDER_API_URL").unwrap_or(defaults.api_url),
            history_file: lookup("SOUND_FINDER_HISTORY_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.history_file),
            playlists_dir: lookup("SOUND_FINDER_PLAYLISTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.playlists_dir),
            log_dir: lookup("SOUND_FINDER_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api_url, "https://api.deezer.com/search");
        assert_eq!(config.history_file, PathBuf::from("search-history.txt"));
        assert_eq!(config.playlists_dir, PathBuf::from("playlists"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("SOUND_FINDER_API_URL", "http://localhost:9000/search"),
            ("SOUND_FINDER_PLAYLISTS_DIR", "/tmp/lists"),
            ("SOUND_FINDER_TIMEOUT_SECS", " 5 "),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "http://localhost:9000/search");
        assert_eq!(config.playlists_dir, PathBuf::from("/tmp/lists"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.history_file, PathBuf::from("search-history.txt"));
    }

    #[test]
    fn test_bad_timeout_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("SOUND_FINDER_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("SOUND_FINDER_TIMEOUT_SECS"));
    }
}
