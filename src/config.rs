//! Service configuration
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | PORT | 8083 | HTTP listen port |
//! | DATABASE_URL | unset | Postgres URL; the in-memory store is used when unset |
//! | DATABASE_MAX_CONNECTIONS | 10 | Pool size |
//! | NATS_URL | unset | Event bus; events are dropped when unset |
//! | MEDIA_DIR | ./media | Where uploaded images are written |
//! | MEDIA_BASE_URL | /media | Public URL prefix for uploaded images |
//! | MAX_UPLOAD_BYTES | 10485760 | Request body limit for product submissions |

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub nats_url: Option<String>,
    pub media_dir: PathBuf,
    pub media_base_url: String,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8083,
            database_url: None,
            database_max_connections: 10,
            nats_url: None,
            media_dir: PathBuf::from("./media"),
            media_base_url: "/media".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable numbers fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            port: non_empty("PORT").and_then(|p| p.parse().ok()).unwrap_or(defaults.port),
            database_url: non_empty("DATABASE_URL"),
            database_max_connections: non_empty("DATABASE_MAX_CONNECTIONS")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.database_max_connections),
            nats_url: non_empty("NATS_URL"),
            media_dir: non_empty("MEDIA_DIR").map(PathBuf::from).unwrap_or(defaults.media_dir),
            media_base_url: non_empty("MEDIA_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.media_base_url),
            max_upload_bytes: non_empty("MAX_UPLOAD_BYTES")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
        }
    }
}
