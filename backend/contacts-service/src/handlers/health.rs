/// Health endpoints for liveness and readiness probes
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::error::Result;
use crate::AppState;

pub async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "contacts-service",
    })))
}

pub async fn health_live() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "alive",
    })))
}

/// Ready only when the database answers.
pub async fn health_ready(state: web::Data<AppState>) -> Result<HttpResponse> {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => Ok(HttpResponse::Ok().json(json!({
            "status": "ready",
        }))),
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            Ok(HttpResponse::ServiceUnavailable().json(json!({
                "status": "not ready",
            })))
        }
    }
}
