//! VRF oracle for the `vrf_sol` randomness queue.
//!
//! Startup verifies the deployment (queue configuration PDA, oracle
//! authority, served callback programs) and refuses to run against a queue
//! it cannot sign for. It then runs:
//!
//! - **Fulfiller**: turns request events into fulfillment transactions.
//! - **Catch-up**: one scan for requests left pending while offline.
//! - **Listener**: WebSocket log subscription for new requests.
//! - **HTTP**: `/health`, `/status` and `/metrics` (see [`http`]).

use actix_web::{web, App, HttpServer};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::signature::Signer;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

mod accounts;
mod config;
mod fulfiller;
mod http;
mod listener;
mod metrics;
mod vrf;

use config::AppConfig;
use http::AppState;
use metrics::Metrics;

/// Buffered request events between the listener and the fulfiller.
const EVENT_CHANNEL_CAPACITY: usize = 256;

fn startup_error(context: &str, err: anyhow::Error) -> std::io::Error {
    std::io::Error::other(format!("{context}: {err:#}"))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,solana_client=warn,solana_rpc_client=warn,hyper=warn")),
        )
        .with_target(true)
        .with_ansi(true)
        .init();

    let config = AppConfig::from_env().map_err(|e| startup_error("invalid configuration", e))?;
    let authority = config.authority_keypair.pubkey();
    info!(
        program = %config.program_id,
        vrf_config = %config.vrf_config,
        %authority,
        callbacks = config.callback_programs.len(),
        rpc = %config.rpc_url,
        ws = %config.ws_url,
        "Starting VRF oracle"
    );

    let rpc = RpcClient::new_with_commitment(config.rpc_url.clone(), CommitmentConfig::confirmed());
    config
        .verify_deployment(&rpc)
        .await
        .map_err(|e| startup_error("deployment check failed", e))?;

    let pending_count = Arc::new(AtomicU64::new(0));
    let shared_metrics = Arc::new(Metrics::new());
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    tokio::spawn(fulfiller::run_fulfiller(
        config.clone(),
        rx,
        pending_count.clone(),
        shared_metrics.clone(),
    ));

    listener::catch_up_pending_requests(&config, &tx).await;
    tokio::spawn(listener::listen_for_events(config.clone(), tx));

    let state = web::Data::new(AppState {
        pending_count,
        metrics: shared_metrics,
        vrf_config: config.vrf_config,
        authority,
    });

    info!(port = config.http_port, "Serving HTTP");
    HttpServer::new(move || App::new().app_data(state.clone()).configure(http::routes))
        .bind(("0.0.0.0", config.http_port))?
        .run()
        .await
}
