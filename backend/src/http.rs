//! Operational HTTP endpoints.
//!
//! - `GET /health`: liveness, always 200 while the process runs.
//! - `GET /status`: in-flight fulfillments and the queue this oracle serves.
//! - `GET /metrics`: [`MetricsSnapshot`](crate::metrics::MetricsSnapshot) as JSON.

use actix_web::{web, HttpResponse};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::metrics::Metrics;

/// Shared state handed to every handler.
pub struct AppState {
    /// Fulfillment tasks currently in flight.
    pub pending_count: Arc<AtomicU64>,
    pub metrics: Arc<Metrics>,
    pub vrf_config: Pubkey,
    pub authority: Pubkey,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: &'static str,
    pending_fulfillments: u64,
    vrf_config: String,
    authority: String,
}

/// Registers the routes on an actix `App`.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/status", web::get().to(status))
        .route("/metrics", web::get().to(metrics));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

async fn status(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(StatusBody {
        status: "running",
        pending_fulfillments: data.pending_count.load(Ordering::Relaxed),
        vrf_config: data.vrf_config.to_string(),
        authority: data.authority.to_string(),
    })
}

async fn metrics(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(data.metrics.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState {
            pending_count: Arc::new(AtomicU64::new(2)),
            metrics: Arc::new(Metrics::new()),
            vrf_config: Pubkey::new_unique(),
            authority: Pubkey::new_unique(),
        })
    }

    #[actix_web::test]
    async fn status_reports_in_flight_and_queue() {
        let data = state();
        let vrf_config = data.vrf_config;
        let app = test::init_service(App::new().app_data(data).configure(routes)).await;

        let req = test::TestRequest::get().uri("/status").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "running");
        assert_eq!(body["pending_fulfillments"], 2);
        assert_eq!(body["vrf_config"], vrf_config.to_string());
    }

    #[actix_web::test]
    async fn metrics_serve_current_counters() {
        let data = state();
        data.metrics.record_request();
        data.metrics.record_fulfillment(40);
        let app = test::init_service(App::new().app_data(data).configure(routes)).await;

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["requests_received"], 1);
        assert_eq!(body["requests_fulfilled"], 1);
        assert_eq!(body["avg_fulfillment_latency_ms"], 40);
    }

    #[actix_web::test]
    async fn health_is_ok() {
        let app = test::init_service(App::new().app_data(state()).configure(routes)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }
}
