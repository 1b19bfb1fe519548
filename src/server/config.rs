use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Who may read events. Writes always require an approved group admin.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventAccessPolicy {
    /// Anonymous requesters may read public events.
    #[default]
    AuthenticatedOrReadOnly,
    /// Every event read requires an authenticated requester.
    Authenticated,
}

/// Resolved configuration; built by `merge` from the file and environment layers.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub log_dir: String,
    pub db_max_connections: u32,
    pub event_access_policy: EventAccessPolicy,
    pub seed_tags: Vec<String>,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
pub struct PartialServerConfig {
    pub listen_addr: Option<String>,
    pub database_url: Option<String>,
    pub jwt_secret: Option<String>,
    pub jwt_ttl_hours: Option<i64>,
    pub log_dir: Option<String>,
    pub db_max_connections: Option<u32>,
    pub event_access_policy: Option<EventAccessPolicy>,
    pub seed_tags: Option<Vec<String>>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_jwt_ttl_hours() -> i64 {
    24
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config: PartialServerConfig = match config_path {
            Some(path_str) if Path::new(path_str).exists() => {
                let path = Path::new(path_str);
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                toml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))?
            }
            _ => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        Self::merge(env_config, file_config)
    }

    /// Environment values win over file values; defaults fill the rest.
    pub fn merge(env_config: PartialServerConfig, file_config: PartialServerConfig) -> Result<Self, String> {
        let config = ServerConfig {
            listen_addr: env_config.listen_addr.or(file_config.listen_addr)
                .unwrap_or_else(default_listen_addr),
            database_url: env_config.database_url.or(file_config.database_url)
                .ok_or("DATABASE_URL is required")?,
            jwt_secret: env_config.jwt_secret.or(file_config.jwt_secret)
                .ok_or("JWT_SECRET is required")?,
            jwt_ttl_hours: env_config.jwt_ttl_hours.or(file_config.jwt_ttl_hours)
                .unwrap_or_else(default_jwt_ttl_hours),
            log_dir: env_config.log_dir.or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
            db_max_connections: env_config.db_max_connections.or(file_config.db_max_connections)
                .unwrap_or_else(default_db_max_connections),
            event_access_policy: env_config.event_access_policy.or(file_config.event_access_policy)
                .unwrap_or_default(),
            seed_tags: env_config.seed_tags.or(file_config.seed_tags)
                .unwrap_or_default(),
        };

        if config.jwt_ttl_hours <= 0 {
            return Err("JWT_TTL_HOURS must be positive".to_string());
        }

        Ok(config)
    }
}
