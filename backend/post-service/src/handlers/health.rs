/// Health endpoints for orchestrator probes
use crate::services::PostService;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::time::Instant;

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    storage: String,
    latency_ms: u64,
    timestamp: String,
}

pub async fn health_summary(service: web::Data<PostService>) -> HttpResponse {
    match service.repository().ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "post-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": e.to_string(),
            "service": "post-service"
        })),
    }
}

pub async fn readiness_summary(service: web::Data<PostService>) -> HttpResponse {
    let start = Instant::now();
    let result = service.repository().ping().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (ready, status, storage) = match result {
        Ok(()) => (true, ComponentStatus::Healthy, "storage reachable".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (false, ComponentStatus::Unhealthy, e.to_string())
        }
    };

    let response = ReadinessResponse {
        ready,
        status,
        storage,
        latency_ms,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}
