use std::{fmt::Display, path::PathBuf, time::Duration};

use cinedex_app::{decode::DEFAULT_MAX_BODY_SIZE, state::AppConfig};
use cinedex_dal::PoolConfig;
pub use clap::Parser;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, clap::Parser)]
#[command(version, about = "Movie catalogue JSON API server")]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 4000,
        env = "CINEDEX_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,

    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "CINEDEX_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[arg(
        long = "env",
        value_enum,
        default_value_t = Environment::Development,
        env = "CINEDEX_ENV",
        help = "Deployment environment, reported by health check"
    )]
    pub environment: Environment,

    #[arg(
        long,
        env = "CINEDEX_DATA_DIR",
        help = "Data directory for the database, default is system default like ~/.local/share/cinedex",
        default_value_t = default_data_dir()
    )]
    data_dir: String,

    #[arg(
        long,
        env = "CINEDEX_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db, default is sqlite://[data-dir]/cinedex.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "CINEDEX_DB_MAX_OPEN_CONNS",
        default_value_t = 25,
        help = "Maximum number of open database connections"
    )]
    pub db_max_open_conns: u32,

    #[arg(
        long,
        env = "CINEDEX_DB_MIN_CONNS",
        default_value_t = 0,
        help = "Number of database connections kept open even when idle"
    )]
    pub db_min_conns: u32,

    #[arg(
        long,
        env = "CINEDEX_DB_MAX_IDLE_TIME",
        default_value = "15m",
        help = "Idle time after which database connection is closed, in human friendly format (e.g. 15m, 1h30m)",
        value_parser = humantime::parse_duration
    )]
    pub db_max_idle_time: Duration,

    #[arg(
        long,
        env = "CINEDEX_MAX_BODY_SIZE",
        default_value_t = DEFAULT_MAX_BODY_SIZE,
        help = "Maximum size of JSON request body in bytes"
    )]
    pub max_body_size: usize,

    #[arg(long, env = "CINEDEX_CORS", help = "Enable permissive CORS")]
    pub cors: bool,
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("cinedex"))
        .unwrap_or_else(|| PathBuf::from("cinedex"))
        .to_string_lossy()
        .to_string()
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/cinedex.db", self.data_dir))
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_connections: self.db_max_open_conns,
            min_connections: self.db_min_conns,
            idle_timeout: Some(self.db_max_idle_time),
        }
    }
}

impl From<&ServerConfig> for AppConfig {
    fn from(config: &ServerConfig) -> Self {
        AppConfig {
            environment: config.environment.to_string(),
            max_body_size: config.max_body_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config =
            ServerConfig::try_parse_from(["cinedex-server", "--data-dir", "/tmp/cdx"]).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.listen_address, "127.0.0.1");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.database_url(), "sqlite:///tmp/cdx/cinedex.db");
        assert_eq!(config.db_max_idle_time, Duration::from_secs(15 * 60));
        assert_eq!(config.max_body_size, 1_048_576);
        assert!(!config.cors);

        let pool = config.pool_config();
        assert_eq!(pool.max_connections, 25);
        assert_eq!(pool.min_connections, 0);
    }

    #[test]
    fn test_explicit_values() {
        let config = ServerConfig::try_parse_from([
            "cinedex-server",
            "--port",
            "8080",
            "--env",
            "production",
            "--database-url",
            "sqlite::memory:",
            "--db-max-idle-time",
            "1h 30m",
            "--max-body-size",
            "1024",
            "--cors",
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert_eq!(config.db_max_idle_time, Duration::from_secs(90 * 60));
        assert!(config.cors);

        let app_config = AppConfig::from(&config);
        assert_eq!(app_config.environment, "production");
        assert_eq!(app_config.max_body_size, 1024);
    }

    #[test]
    fn test_invalid_environment() {
        let res = ServerConfig::try_parse_from(["cinedex-server", "--env", "testing"]);
        assert!(res.is_err());
    }
}
