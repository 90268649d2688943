//! Liveness and database readiness

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct HealthState {
    pub db: DatabaseConnection,
    pub started_at: Arc<Instant>,
}

impl HealthState {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            started_at: Arc::new(Instant::now()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Error,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DatabaseHealth {
    pub status: HealthStatus,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

async fn ping(db: &DatabaseConnection) -> DatabaseHealth {
    let backend = db.get_database_backend();
    let started = Instant::now();
    let result = db
        .execute(Statement::from_string(backend, "SELECT 1".to_string()))
        .await;

    match result {
        Ok(_) => DatabaseHealth {
            status: HealthStatus::Ok,
            backend: format!("{:?}", backend).to_lowercase(),
            latency_ms: Some(started.elapsed().as_millis() as u64),
        },
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            DatabaseHealth {
                status: HealthStatus::Error,
                backend: format!("{:?}", backend).to_lowercase(),
                latency_ms: None,
            }
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service and database are up", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = ping(&state.db).await;
    let (status, code) = match database.status {
        HealthStatus::Ok => (HealthStatus::Ok, StatusCode::OK),
        _ => (HealthStatus::Degraded, StatusCode::SERVICE_UNAVAILABLE),
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            database,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::testing::memory_db;

    #[tokio::test]
    async fn healthy_database_reports_ok() {
        let state = HealthState::new(memory_db().await);
        let (code, Json(body)) = health_check(State(state)).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body.status, HealthStatus::Ok);
        assert_eq!(body.database.backend, "sqlite");
        assert!(body.database.latency_ms.is_some());
    }
}
