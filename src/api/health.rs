use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::warn;

use crate::PayrollEngine;

/// Liveness plus a storage round trip. Public, not rate limited.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Storage reachable", body = Object, example = json!({"status": "ok"})),
        (status = 503, description = "Storage unreachable", body = Object, example = json!({"status": "unavailable"}))
    ),
    tag = "Health"
)]
pub async fn health(engine: web::Data<PayrollEngine>) -> impl Responder {
    match engine.health().await {
        Ok(()) => HttpResponse::Ok().json(json!({ "status": "ok" })),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            HttpResponse::ServiceUnavailable().json(json!({ "status": "unavailable" }))
        }
    }
}
