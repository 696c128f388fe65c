use crate::codec::DEFAULT_MAX_DEPTH;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory under the user's home that holds caches and logs.
pub const DEFAULT_BASE_DIR: &str = ".stubscope";

pub const CACHE_DIR_ENV: &str = "STUBSCOPE_CACHE_DIR";
pub const COMPRESS_ENV: &str = "STUBSCOPE_COMPRESS";

pub fn base_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_BASE_DIR)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StubConfig {
    /// Where persisted stub trees live.
    pub cache_dir: PathBuf,
    /// zstd-compress persisted trees.
    pub compress: bool,
    pub compression_level: i32,
    /// Deepest node nesting the codec writes or accepts.
    pub max_depth: usize,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            cache_dir: base_dir().join("stub_cache"),
            compress: true,
            compression_level: 3,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl StubConfig {
    /// Defaults, overridden by `STUBSCOPE_CACHE_DIR` and `STUBSCOPE_COMPRESS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
            if !dir.is_empty() {
                config.cache_dir = PathBuf::from(dir);
            }
        }
        if let Ok(flag) = std::env::var(COMPRESS_ENV) {
            config.compress = parse_flag(&flag).unwrap_or(config.compress);
        }
        config
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = StubConfig::default();
        assert!(config.compress);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.cache_dir.ends_with(".stubscope/stub_cache"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("stubscope.json");
        std::fs::write(&path, r#"{ "compress": false, "cache_dir": "/tmp/stubs" }"#).unwrap();

        let config = StubConfig::from_json_file(&path).unwrap();
        assert!(!config.compress);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/stubs"));
        assert_eq!(config.compression_level, 3);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.json");
        std::fs::write(&path, "{ compress").unwrap();
        assert!(matches!(
            StubConfig::from_json_file(&path),
            Err(crate::error::StubError::Json(_))
        ));
    }

    #[test]
    fn test_flag_parsing() {
        assert_eq!(parse_flag("OFF"), Some(false));
        assert_eq!(parse_flag(" 1 "), Some(true));
        assert_eq!(parse_flag("maybe"), None);
    }
}
