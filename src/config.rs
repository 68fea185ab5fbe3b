use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::constants::{
    DEFAULT_OUTPUT_DIR, DEFAULT_OUTPUT_FILE, DEFAULT_RESTART_DELAY, DEFAULT_STARTUP_DELAY,
    ENV_DATABASE_HOST, ENV_DATABASE_NAME, ENV_DATABASE_PASSWORD, ENV_DATABASE_PORT,
    ENV_DATABASE_USERNAME,
};

/// Process-level settings. Database credentials are resolved separately
/// through [`ConfigProvider`] so they are re-read on every restart.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub export: ExportConfig,
    pub supervisor: SupervisorConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub output_file: String,
}

impl ExportConfig {
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Warm-up pause before bootstrap, giving a co-located database time to start.
    pub startup_delay: Duration,
    /// Cool-down pause between a fault and the next restart.
    pub restart_delay: Duration,
    pub output_path: PathBuf,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            startup_delay: DEFAULT_STARTUP_DELAY,
            restart_delay: DEFAULT_RESTART_DELAY,
            output_path: ExportConfig::default().output_path(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let export = ExportConfig {
            output_dir: PathBuf::from(env_or("EXPORT_OUTPUT_DIR", DEFAULT_OUTPUT_DIR)),
            output_file: env_or("EXPORT_OUTPUT_FILE", DEFAULT_OUTPUT_FILE),
        };
        let supervisor = SupervisorConfig {
            startup_delay: Duration::from_secs(env_or_parse(
                "STARTUP_DELAY_SECS",
                DEFAULT_STARTUP_DELAY.as_secs(),
            )),
            restart_delay: Duration::from_secs(env_or_parse(
                "RESTART_DELAY_SECS",
                DEFAULT_RESTART_DELAY.as_secs(),
            )),
            output_path: export.output_path(),
        };

        Self {
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            export,
            supervisor,
        }
    }
}

/// The five settings needed to reach the database. Every field is non-empty
/// once constructed.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    host: String,
    port: String,
    username: String,
    password: String,
    database: String,
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***REDACTED***")
            .field("database", &self.database)
            .finish()
    }
}

impl ConnectionDescriptor {
    pub fn new(
        host: impl Into<String>,
        port: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Result<Self, Unconfigured> {
        let parts = [
            (ENV_DATABASE_HOST, host.into()),
            (ENV_DATABASE_PORT, port.into()),
            (ENV_DATABASE_USERNAME, username.into()),
            (ENV_DATABASE_PASSWORD, password.into()),
            (ENV_DATABASE_NAME, database.into()),
        ];

        let missing: Vec<&'static str> = parts
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(key, _)| *key)
            .collect();
        if !missing.is_empty() {
            return Err(Unconfigured { missing });
        }

        let [host, port, username, password, database] = parts.map(|(_, value)| value);
        Ok(Self {
            host,
            port,
            username,
            password,
            database,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

/// One or more database settings are absent or empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("database configuration missing: {}", .missing.join(", "))]
pub struct Unconfigured {
    pub missing: Vec<&'static str>,
}

pub trait ConfigProvider {
    fn resolve(&self) -> Result<ConnectionDescriptor, Unconfigured>;
}

/// Where [`EnvConfigProvider`] reloads `.env` from before reading the
/// environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DotenvSource {
    #[default]
    Disabled,
    /// `.env` in the working directory or one of its parents.
    Discover,
    Path(PathBuf),
}

/// Reads `DATABASE_*` from the process environment. Values from `.env`
/// override variables already set, so edits apply on the next restart.
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    pub dotenv: DotenvSource,
}

impl EnvConfigProvider {
    pub fn new() -> Self {
        Self {
            dotenv: DotenvSource::Discover,
        }
    }

    pub fn without_dotenv() -> Self {
        Self {
            dotenv: DotenvSource::Disabled,
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            dotenv: DotenvSource::Path(path.into()),
        }
    }

    fn reload_dotenv(&self) {
        let result = match &self.dotenv {
            DotenvSource::Disabled => return,
            DotenvSource::Discover => dotenvy::dotenv_override().map(|_| ()),
            DotenvSource::Path(path) => dotenvy::from_path_override(path),
        };
        if let Err(e) = result {
            if !e.not_found() {
                tracing::warn!(error = %e, "Failed to load .env file");
            }
        }
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn resolve(&self) -> Result<ConnectionDescriptor, Unconfigured> {
        self.reload_dotenv();

        ConnectionDescriptor::new(
            env_or(ENV_DATABASE_HOST, ""),
            env_or(ENV_DATABASE_PORT, ""),
            env_or(ENV_DATABASE_USERNAME, ""),
            env_or(ENV_DATABASE_PASSWORD, ""),
            env_or(ENV_DATABASE_NAME, ""),
        )
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
