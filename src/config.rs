use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cache::DEFAULT_PREFIX;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// Custom title for header (defaults to the API host if not set)
  pub title: Option<String>,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub log: LogConfig,
  /// Where downloaded invoice PDFs are written
  pub downloads_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  pub url: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
  30
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Keep responses across restarts
  pub persist: bool,
  /// SQLite file for the durable tier
  pub path: Option<PathBuf>,
  pub key_prefix: String,
  /// Age after which cached data is marked stale in the UI
  pub stale_after_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      persist: true,
      path: None,
      key_prefix: DEFAULT_PREFIX.to_string(),
      stale_after_secs: 300,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// Default filter directive, overridden by RUST_LOG
  pub level: String,
  pub file: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      file: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./fieldops.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/fieldops/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/fieldops/config.yaml\n\
                 with at least:\n\n  api:\n    url: https://dispatch.example.com/api"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("fieldops.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("fieldops").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  /// Get the API token from the environment, if set.
  pub fn get_api_token() -> Option<String> {
    std::env::var("FIELDOPS_API_TOKEN")
      .ok()
      .filter(|token| !token.trim().is_empty())
  }

  /// Header label: configured title or the API host.
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    extract_host(&self.api.url).to_string()
  }

  pub fn downloads_dir(&self) -> PathBuf {
    self
      .downloads_dir
      .clone()
      .or_else(dirs::download_dir)
      .unwrap_or_else(|| PathBuf::from("."))
  }

  pub fn log_file(&self) -> Option<PathBuf> {
    self.log.file.clone().or_else(|| {
      dirs::data_dir().map(|dir| dir.join("fieldops").join("fieldops.log"))
    })
  }
}

/// Extract host (and port) from a URL
pub fn extract_host(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_uses_defaults() {
    let config = Config::parse("api:\n  url: https://ops.example.com/api\n").unwrap();
    assert_eq!(config.api.timeout_secs, 30);
    assert!(config.cache.persist);
    assert_eq!(config.cache.key_prefix, "fieldops_cache:");
    assert_eq!(config.cache.stale_after_secs, 300);
    assert_eq!(config.log.level, "info");
    assert_eq!(config.display_title(), "ops.example.com");
  }

  #[test]
  fn test_full_config() {
    let yaml = r#"
api:
  url: http://localhost:8080
  timeout_secs: 5
title: Acme Field Ops
cache:
  persist: false
  key_prefix: "acme:"
  stale_after_secs: 60
log:
  level: debug
  file: /tmp/fieldops.log
downloads_dir: /tmp/invoices
"#;
    let config = Config::parse(yaml).unwrap();
    assert_eq!(config.api.timeout_secs, 5);
    assert!(!config.cache.persist);
    assert_eq!(config.cache.key_prefix, "acme:");
    assert_eq!(config.display_title(), "Acme Field Ops");
    assert_eq!(config.downloads_dir(), PathBuf::from("/tmp/invoices"));
    assert_eq!(config.log_file(), Some(PathBuf::from("/tmp/fieldops.log")));
  }

  #[test]
  fn test_missing_api_url_is_error() {
    assert!(Config::parse("title: x\n").is_err());
  }

  #[test]
  fn test_missing_explicit_file() {
    let err = Config::load(Some(Path::new("/nonexistent/fieldops.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }

  #[test]
  fn test_extract_host() {
    assert_eq!(extract_host("https://ops.example.com/api"), "ops.example.com");
    assert_eq!(extract_host("http://localhost:8080"), "localhost:8080");
  }
}
