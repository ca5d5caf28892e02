//! Relays webhooks onwards to wherever their payload says, keeping a copy at
//! a secondary endpoint and a record in Slack.
//!
//! See [relay] for the forwarding rules and [slack] for notifications.

use config::Config;
use dotenvy::dotenv;
use router::Deps;
use std::{future::Future, io, net::SocketAddr, process};
use tokio::net::TcpListener;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

mod config;
mod de;
mod relay;
mod router;
mod slack;

/// Application entrypoint. Initialises tracing, checks for environment
/// variables, binds to 0.0.0.0, and starts the server.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    let has_dotenv = dotenv().is_ok();
    if !has_dotenv {
        warn!("No .env found");
    }

    let config = match Config::from_env() {
        Ok(x) => x,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let res = match TcpListener::bind(addr).await {
        Ok(listener) => server(listener, &config, shutdown_signal()).await,
        Err(e) => Err(e),
    };

    if let Err(e) = res {
        error!("Server failed: {}", e);
        process::exit(1);
    }
}

/// Resolves on Ctrl-C. If the handler can't be installed we'll never resolve,
/// leaving the process to be killed externally.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Serve until `shutdown` resolves, then wait for outstanding background
/// tasks before returning.
async fn server<F>(listener: TcpListener, config: &Config, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Listening on {}", listener.local_addr()?);

    let tasks = TaskTracker::new();
    let deps = Deps::new(config, tasks.clone());

    axum::serve(listener, router::new(deps))
        .with_graceful_shutdown(shutdown)
        .await?;

    tasks.close();
    if !tasks.is_empty() {
        info!("Waiting on {} background task(s)", tasks.len());
    }
    tasks.wait().await;

    info!("Shut down");
    Ok(())
}
