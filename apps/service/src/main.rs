#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use clap::Parser;
use tracing::{info, warn};

use uptime_service::config::Config;
use uptime_service::storage::{self, LibsqlStatusSink};
use uptime_service::{AppError, Engine, health, mail};

/// Grace period for the HTTP server and the monitor tasks on shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(version, about = "Website uptime monitor")]
struct Cli {
    /// Path to the config file (defaults to $XDG_CONFIG_HOME/uptime/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the resolved configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Do not start the health check HTTP server
    #[arg(long)]
    no_server: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Development configuration comes from .env
    if std::env::var("ENV").as_deref() != Ok("prod") {
        dotenvy::dotenv().ok();
    }

    let cli = Cli::parse();

    let mut config = Config::from_config(cli.config.as_ref())?;
    let env_warnings = config.apply_env();

    logger::init_with_format(config.logging.format.parse().unwrap_or_default());
    for warning in env_warnings {
        warn!("{}", warning);
    }

    if cli.print_config {
        println!("{config}");
        return Ok(());
    }

    let pool = storage::open_pool(&config.storage.db_path).await.map_err(AppError::Storage)?;
    let sink = Arc::new(LibsqlStatusSink::new_from_pool(pool));
    let notifier = mail::notifier_from_settings(&config.mailgun).map_err(AppError::Notifier)?;

    let engine = Arc::new(Engine::new(config.monitor.clone(), sink, notifier)?);
    engine.start().map_err(AppError::Engine)?;

    let served = if config.server.enabled && !cli.no_server {
        let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
        run_server(addr, Arc::clone(&engine)).await
    } else {
        info!("Waiting for shutdown signal...");
        shutdown_signal().await;
        Ok(())
    };

    engine.stop();
    engine.join(SHUTDOWN_GRACE).await;
    info!("Monitor stopped. Exiting now.");

    served
}

/// Serve the health route until a shutdown signal arrives
async fn run_server(addr: SocketAddr, engine: Arc<Engine>) -> Result<(), AppError> {
    let data = web::Data::from(engine);

    let server = HttpServer::new(move || App::new().app_data(data.clone()).configure(health::routes))
        .disable_signals()
        .bind(addr)?
        .run();
    let handle = server.handle();
    tokio::pin!(server);

    info!("Health server listening on {}", addr);

    tokio::select! {
        result = &mut server => return Ok(result?),
        () = shutdown_signal() => {}
    }

    info!("Shutting down server...");
    let stopped = tokio::time::timeout(SHUTDOWN_GRACE, async {
        let (_, result) = tokio::join!(handle.stop(true), &mut server);
        result
    })
    .await;

    match stopped {
        Ok(result) => {
            result?;
            info!("Server gracefully stopped");
        }
        Err(_) => warn!("Server did not stop within {:?}", SHUTDOWN_GRACE),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
