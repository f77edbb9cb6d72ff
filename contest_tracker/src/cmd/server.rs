use crate::modules::handlers::{list_contests, liveness};
use anyhow::{Context, Result};
use axum::{extract::Extension, routing, Router, Server};
use clap::Args;
use contest_tracker_libs::clist::{client::DEFAULT_CLIST_URL, ClistClient, ContestSource, Credentials};
use std::{env, net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};

const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Args)]
pub struct ServerArgs {
    #[arg(long)]
    port: Option<u16>,
}

pub async fn run(args: ServerArgs) -> Result<()> {
    let user = env::var("CLIST_USER").with_context(|| {
        let message = "CLIST_USER environment variable must be set";
        tracing::error!(message);
        message
    })?;
    let key = env::var("CLIST_KEY").with_context(|| {
        let message = "CLIST_KEY environment variable must be set";
        tracing::error!(message);
        message
    })?;
    let clist_url = env::var("CLIST_URL").unwrap_or_else(|_| String::from(DEFAULT_CLIST_URL));

    let source = ClistClient::new(&clist_url, Credentials::new(user, key)).with_context(|| {
        let message = format!("couldn't create clist client for {}", clist_url);
        tracing::error!(message);
        message
    })?;

    let app = create_router(source);
    let port = match args.port {
        Some(port) => port,
        None => match env::var("PORT") {
            Ok(port) => port.parse::<u16>().with_context(|| {
                let message = format!("PORT must be a port number, got `{}`", port);
                tracing::error!(message);
                message
            })?,
            Err(_) => {
                tracing::warn!("API server will be launched at default port number {}", DEFAULT_PORT);
                DEFAULT_PORT
            }
        },
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server start at port {}", port);
    Server::try_bind(&addr)
        .with_context(|| {
            let message = format!("failed to bind port {}", port);
            tracing::error!(message);
            message
        })?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub fn create_router<S>(source: S) -> Router
where
    S: ContestSource + Send + Sync + 'static,
{
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

    Router::new()
        .route("/api/contests", routing::get(list_contests::<S>))
        .route("/api/liveness", routing::get(liveness))
        .layer(Extension(Arc::new(source)))
        .layer(cors)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {:?}", e);
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
                tracing::error!("failed to install signal handler: {:?}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown.");
}
