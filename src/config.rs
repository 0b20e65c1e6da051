//! Configuration module for reply-server.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values, which take
//! precedence over the built-in defaults.

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

/// Command-line arguments for the reply server
#[derive(Parser, Debug, Default)]
#[command(name = "reply-server")]
#[command(author = "reply-server authors")]
#[command(version = "0.1.0")]
#[command(about = "A TCP server that answers every connection with a fixed reply", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 127.0.0.1:8989)
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Reply written to every connection after the first read
    #[arg(short = 'r', long)]
    pub reply: Option<String>,

    /// Size of the single read buffer in bytes
    #[arg(short = 'b', long)]
    pub buffer_size: Option<usize>,

    /// Number of runtime worker threads (defaults to number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Log level (trace, debug, info, warn, error) [default: info]
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Number of runtime worker threads
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            workers: None,
        }
    }
}

/// Per-connection behavior
#[derive(Debug, Deserialize)]
pub struct ConnectionConfig {
    /// Literal reply payload
    #[serde(default = "default_reply")]
    pub reply: String,
    /// Read buffer size in bytes
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            reply: default_reply(),
            buffer_size: default_buffer_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:8989".to_string()
}

fn default_reply() -> String {
    "hellohellohello".to_string()
}

fn default_buffer_size() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: String,
    pub reply: String,
    pub buffer_size: usize,
    pub workers: Option<usize>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            reply: default_reply(),
            buffer_size: default_buffer_size(),
            workers: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from the process arguments and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_cli(CliArgs::parse())
    }

    /// Merge parsed CLI args with the TOML file they point at, if any.
    /// CLI arguments take precedence over TOML file values.
    pub fn from_cli(cli: CliArgs) -> Result<Self, ConfigError> {
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        let config = Config {
            listen: cli.listen.unwrap_or(toml_config.server.listen),
            reply: cli.reply.unwrap_or(toml_config.connection.reply),
            buffer_size: cli
                .buffer_size
                .unwrap_or(toml_config.connection.buffer_size),
            workers: cli.workers.or(toml_config.server.workers),
            log_level: cli.log_level.unwrap_or(toml_config.logging.level),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.listen.trim().is_empty() {
            return Err(ConfigError::Invalid("listen address must not be empty"));
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid("buffer_size must be greater than zero"));
        }
        if self.workers == Some(0) {
            return Err(ConfigError::Invalid("workers must be greater than zero"));
        }
        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    Invalid(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::Invalid(reason) => write!(f, "Invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}
