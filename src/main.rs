use anyhow::Result;
use clap::{Parser, Subcommand};
use hlbridge_auth::{OAuthClientConfig, TokenLifecycleManager};
use hlbridge_config::Config;
use hlbridge_store::SqliteTokenStore;
use hlbridge_types::TokenStore as _;
use hlbridge_web::AppState;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hlbridge", about = "hlbridge: OAuth bridge and contact updater for GoHighLevel locations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server.
    Serve {
        /// Path to the YAML configuration file.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Override the listening port (default: 8000).
        #[arg(short, long)]
        port: Option<u16>,
        /// Override the listening address (default: 127.0.0.1).
        #[arg(long)]
        host: Option<String>,
        /// SQLite database path (default: ~/.hlbridge/tokens.db).
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,
    },
    /// Print a valid access token for a stored location, refreshing it if expired.
    Token {
        location_id: String,
        /// Path to the YAML configuration file.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// SQLite database path (default: ~/.hlbridge/tokens.db).
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,
    },
    /// List the locations with a stored token.
    Locations {
        /// SQLite database path (default: ~/.hlbridge/tokens.db).
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            port,
            host,
            db,
        } => cmd_serve(config, port, host, db).await,
        Commands::Token {
            location_id,
            config,
            db,
        } => cmd_token(location_id, config, db).await,
        Commands::Locations { db } => cmd_locations(db).await,
    }
}

async fn cmd_serve(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    host: Option<String>,
    db: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(config_path.as_deref())?;
    if let Some(p) = port {
        config.port = p;
    }
    if let Some(h) = host {
        config.host = h;
    }
    if db.is_some() {
        config.database = db;
    }

    let addr = format!("{}:{}", config.host, config.port);
    let config = Arc::new(config);
    let http = hlbridge_web::build_http_client(config.http_timeout())?;
    let auth = Arc::new(lifecycle(&config, http.clone()).await?);
    let state = AppState::new(config, auth, http);
    let app = hlbridge_web::make_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "hlbridge listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn cmd_token(location_id: String, config_path: Option<PathBuf>, db: Option<PathBuf>) -> Result<()> {
    let mut config = load_config(config_path.as_deref())?;
    if db.is_some() {
        config.database = db;
    }
    let http = hlbridge_web::build_http_client(config.http_timeout())?;
    let auth = lifecycle(&config, http).await?;
    let token = auth
        .get_valid_access_token(&location_id)
        .await
        .map_err(|e| anyhow::anyhow!("{location_id}: {e}"))?;
    println!("{token}");
    Ok(())
}

async fn cmd_locations(db: Option<PathBuf>) -> Result<()> {
    let store = open_store(db).await?;
    let locations = store
        .list_locations()
        .await
        .map_err(|e| anyhow::anyhow!("database error: {e}"))?;
    if locations.is_empty() {
        eprintln!("no locations stored");
    }
    for location_id in locations {
        println!("{location_id}");
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path.filter(|p| !p.exists()) {
        anyhow::bail!("config file not found: {}", path.display());
    }
    let config = Config::load(path).map_err(|e| anyhow::anyhow!("config error: {e}"))?;
    config.validate()?;
    Ok(config)
}

async fn lifecycle(config: &Config, http: reqwest::Client) -> Result<TokenLifecycleManager> {
    let store = open_store(config.database.clone()).await?;
    Ok(TokenLifecycleManager::new(
        OAuthClientConfig::from_config(config),
        Arc::new(store),
        http,
    ))
}

async fn open_store(db: Option<PathBuf>) -> Result<SqliteTokenStore> {
    let path = db.unwrap_or_else(default_db_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let url = format!("sqlite://{}", path.display());
    SqliteTokenStore::new(&url)
        .await
        .map_err(|e| anyhow::anyhow!("database error: {e}"))
}

fn default_db_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".hlbridge").join("tokens.db")
}
