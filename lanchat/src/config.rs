//! Load config from file and environment.

use serde::Deserialize;
use std::path::PathBuf;

use lanchat_core::crypto::DEFAULT_KEY_FILE;

/// Default port shared by the datagram and stream listeners.
pub const DEFAULT_PORT: u16 = 4000;

/// Daemon configuration. File: ~/.config/lanchat/config.toml or
/// /etc/lanchat/config.toml. Env override: LANCHAT_PORT.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Listen port, one numeric value for both TCP and UDP (default 4000).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory where received files are stored (default: working directory).
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    /// Path of the shared secret key file.
    #[serde(default = "default_key_file")]
    pub key_file: PathBuf,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_key_file() -> PathBuf {
    PathBuf::from(DEFAULT_KEY_FILE)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            download_dir: default_download_dir(),
            key_file: default_key_file(),
        }
    }
}

/// Load config: merge default, then config file (if present), then env.
pub fn load() -> Config {
    let mut c = load_file().unwrap_or_default();
    if let Ok(s) = std::env::var("LANCHAT_PORT") {
        if let Ok(p) = s.parse::<u16>() {
            c.port = p;
        }
    }
    c
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/lanchat/config.toml"));
    }
    out.push(PathBuf::from("/etc/lanchat/config.toml"));
    out
}

fn load_file() -> Option<Config> {
    for p in config_paths() {
        if p.exists() {
            if let Ok(s) = std::fs::read_to_string(&p) {
                if let Ok(c) = toml::from_str::<Config>(&s) {
                    return Some(c);
                }
            }
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.port, 4000);
        assert_eq!(c.key_file, PathBuf::from("secret.key"));
    }

    #[test]
    fn parse_partial_file() {
        let c: Config = toml::from_str("port = 4100").unwrap();
        assert_eq!(c.port, 4100);
        assert_eq!(c.download_dir, PathBuf::from("."));
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(toml::from_str::<Config>("bogus = 1").is_err());
    }
}
