use arrrg::CommandLine;
use arrrg_derive::CommandLine;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use distance_counter::{AppState, Config, create_router, sql};

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Args {
    #[arrrg(optional, "Path to a YAML configuration file")]
    config: Option<String>,
    #[arrrg(optional, "Host to bind the HTTP server")]
    host: Option<String>,
    #[arrrg(optional, "Port to bind the HTTP server")]
    port: Option<u16>,
    #[arrrg(optional, "SQLite database URL")]
    database_url: Option<String>,
    #[arrrg(flag, "Enable verbose logging")]
    verbose: bool,
}

const HELP_TEXT: &str = r#"distanced - distance-counter web server

USAGE:
    distanced [OPTIONS]

OPTIONS:
    --config <PATH>         YAML configuration file
    --host <HOST>           Host to bind the HTTP server [default: 127.0.0.1]
    --port <PORT>           Port to bind the HTTP server [default: 8000]
    --database-url <URL>    SQLite database URL [default: sqlite://distance.db]
    --verbose               Enable debug logging

DESCRIPTION:
    Serves the distance log. Command-line options override the configuration
    file, which overrides the defaults. RUST_LOG takes precedence over
    --verbose when set.

    The server supports graceful shutdown via Ctrl+C.

PAGES:
    /                   Logged distances
    /log                Log a distance
    /offices/           Offices
    /people/            People
    /units/             Units of measurement
    /login/             Sign in
    /register/          Create an account
    /logout/            Sign out"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, free) = Args::from_command_line("USAGE: distanced [OPTIONS]");

    if !free.is_empty() && free[0] == "help" {
        println!("{}", HELP_TEXT);
        return Ok(());
    }

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    }
    .with_overrides(args.host, args.port, args.database_url);

    tracing::debug!(?config, "configuration loaded");

    let pool = sql::connect(&config.database_url, config.max_connections).await?;
    sql::migrate(&pool).await?;
    tracing::info!(database_url = %config.database_url, "database ready");

    let app = create_router(AppState::new(pool, config.session_max_age()));

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;
    tracing::info!(%addr, "listening");

    let shutdown_signal = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
        tracing::info!("shutdown signal received, stopping");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    tracing::info!("distanced stopped");
    Ok(())
}
