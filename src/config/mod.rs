mod file_config;

pub use file_config::{EmailFileConfig, FileConfig, GithubFileConfig, SpotifyFileConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_EMAIL_FROM: &str = "Portfolio <onboarding@resend.dev>";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub spotify_api_url: String,
    pub spotify_token_url: String,
    pub email_api_url: String,
    pub github_api_url: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_dir: None,
            port: 3001,
            logging_level: RequestsLoggingLevel::default(),
            spotify_api_url: DEFAULT_SPOTIFY_API_URL.to_string(),
            spotify_token_url: DEFAULT_SPOTIFY_TOKEN_URL.to_string(),
            email_api_url: DEFAULT_EMAIL_API_URL.to_string(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub spotify: SpotifySettings,
    pub email: EmailSettings,
    pub github: GithubSettings,
}

#[derive(Debug, Clone)]
pub struct SpotifySettings {
    pub client_id: String,
    pub client_secret: String,
    pub api_url: String,
    pub token_url: String,
}

#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub api_key: String,
    pub from_address: String,
    pub to_address: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct GithubSettings {
    pub api_token: String,
    pub api_url: String,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present; secrets fall back to
    /// environment variables.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let spotify_file = file.spotify.unwrap_or_default();
        let spotify = SpotifySettings {
            client_id: required_secret(spotify_file.client_id, "SPOTIFY_CLIENT_ID")?,
            client_secret: required_secret(spotify_file.client_secret, "SPOTIFY_CLIENT_SECRET")?,
            api_url: spotify_file
                .api_url
                .unwrap_or_else(|| cli.spotify_api_url.clone()),
            token_url: spotify_file
                .token_url
                .unwrap_or_else(|| cli.spotify_token_url.clone()),
        };

        let email_file = file.email.unwrap_or_default();
        let email = EmailSettings {
            api_key: required_secret(email_file.api_key, "RESEND_API_KEY")?,
            from_address: email_file
                .from_address
                .unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string()),
            to_address: required_secret(email_file.to_address, "CONTACT_TO_ADDRESS")?,
            api_url: email_file
                .api_url
                .unwrap_or_else(|| cli.email_api_url.clone()),
        };

        let github_file = file.github.unwrap_or_default();
        let github = GithubSettings {
            api_token: required_secret(github_file.api_token, "GITHUB_API_TOKEN")?,
            api_url: github_file
                .api_url
                .unwrap_or_else(|| cli.github_api_url.clone()),
        };

        Ok(Self {
            db_dir,
            port,
            logging_level,
            spotify,
            email,
            github,
        })
    }

    pub fn mirror_db_path(&self) -> PathBuf {
        self.db_dir.join("mirror.db")
    }

    pub fn state_db_path(&self) -> PathBuf {
        self.db_dir.join("state.db")
    }
}

fn required_secret(file_value: Option<String>, env_var: &str) -> Result<String> {
    match file_value.or_else(|| std::env::var(env_var).ok()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => bail!(
            "Missing required setting: set it in the config file or via the {} environment variable",
            env_var
        ),
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
