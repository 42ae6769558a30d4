use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tonic::transport::Server;
use tracing::{info, warn};

use crate::application::post_store::PostStore;
use crate::data::post_repository::PostStorage;
use crate::infrastructure::settings::Settings;
use crate::presentation::AppState;
use crate::presentation::grpc::service::GrpcBlogService;
use crate::presentation::http;

/// Serves the gRPC API and the health endpoint until Ctrl-C.
pub(crate) async fn run<S: PostStorage>(settings: &Settings, storage: S) -> anyhow::Result<()> {
    let state = AppState::new(Arc::new(PostStore::new(storage)));

    tokio::try_join!(run_grpc(settings, state), run_http(settings))?;

    info!("servers stopped");
    Ok(())
}

pub(crate) async fn run_grpc<S: PostStorage>(
    settings: &Settings,
    state: AppState<S>,
) -> anyhow::Result<()> {
    let addr: SocketAddr = settings
        .grpc_addr
        .parse()
        .with_context(|| format!("invalid GRPC_ADDR '{}'", settings.grpc_addr))?;

    let service = GrpcBlogService::new(state)
        .into_server()
        .max_decoding_message_size(settings.grpc_max_decoding_message_size_bytes)
        .max_encoding_message_size(settings.grpc_max_encoding_message_size_bytes);

    info!("gRPC server listening on {}", addr);
    Server::builder()
        .concurrency_limit_per_connection(settings.grpc_concurrency_limit)
        .timeout(Duration::from_secs(settings.grpc_request_timeout_secs))
        .add_service(service)
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;
    Ok(())
}

pub(crate) async fn run_http(settings: &Settings) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&settings.http_addr)
        .await
        .with_context(|| format!("failed to bind HTTP_ADDR '{}'", settings.http_addr))?;

    info!("HTTP server listening on {}", settings.http_addr);
    axum::serve(listener, http::routes())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
