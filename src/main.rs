use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use catalog_mirror_server::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_EMAIL_API_URL, DEFAULT_GITHUB_API_URL,
    DEFAULT_SPOTIFY_API_URL, DEFAULT_SPOTIFY_TOKEN_URL,
};
use catalog_mirror_server::contact::{ContactService, Mailer, ResendMailer};
use catalog_mirror_server::github::GithubClient;
use catalog_mirror_server::mirror::MirrorService;
use catalog_mirror_server::spotify::{SpotifyAuthClient, SpotifyClient};
use catalog_mirror_server::token_cache::TokenCache;
use catalog_mirror_server::{
    run_server, RequestsLoggingLevel, ServerConfig, SqliteMirrorStore, SqliteStateStore,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the directory holding the SQLite database files.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Path to a TOML configuration file.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Base URL of the upstream catalog API.
    #[clap(long, default_value = DEFAULT_SPOTIFY_API_URL)]
    pub spotify_api_url: String,

    /// URL of the upstream token endpoint.
    #[clap(long, default_value = DEFAULT_SPOTIFY_TOKEN_URL)]
    pub spotify_token_url: String,

    /// Base URL of the email provider API.
    #[clap(long, default_value = DEFAULT_EMAIL_API_URL)]
    pub email_api_url: String,

    /// Base URL of the GitHub API.
    #[clap(long, default_value = DEFAULT_GITHUB_API_URL)]
    pub github_api_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };

    let cli_config = CliConfig {
        db_dir: cli_args.db_dir,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        spotify_api_url: cli_args.spotify_api_url,
        spotify_token_url: cli_args.spotify_token_url,
        email_api_url: cli_args.email_api_url,
        github_api_url: cli_args.github_api_url,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!(
        "Opening SQLite mirror database at {:?}...",
        config.mirror_db_path()
    );
    let mirror_store = Arc::new(SqliteMirrorStore::new(config.mirror_db_path())?);
    let state_store = Arc::new(SqliteStateStore::new(config.state_db_path())?);

    let auth = SpotifyAuthClient::new(
        config.spotify.token_url.clone(),
        config.spotify.client_id.clone(),
        config.spotify.client_secret.clone(),
    );
    let token_cache = TokenCache::new(state_store, auth);
    let spotify = SpotifyClient::new(config.spotify.api_url.clone());
    let mirror = Arc::new(MirrorService::new(
        mirror_store.clone(),
        spotify,
        token_cache,
    ));

    let mailer: Arc<dyn Mailer> = Arc::new(ResendMailer::new(
        config.email.api_url.clone(),
        config.email.api_key.clone(),
        config.email.from_address.clone(),
        config.email.to_address.clone(),
    ));
    let contact = Arc::new(ContactService::new(mirror_store, mailer));

    let github = Arc::new(GithubClient::new(
        config.github.api_url.clone(),
        config.github.api_token.clone(),
    ));

    info!("Ready to serve at port {}!", config.port);
    run_server(
        ServerConfig {
            requests_logging_level: config.logging_level.clone(),
            port: config.port,
        },
        mirror,
        contact,
        github,
    )
    .await
}
