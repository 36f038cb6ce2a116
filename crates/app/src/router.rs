use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use jobdesk_storage::Database;

use crate::employees::{self, EmployeeService};
use crate::jobs::{self, JobService};
use crate::mailer::EmailSender;
use crate::telemetry;

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    storage: Database,
    clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>,
    jobs: JobService,
    employees: EmployeeService,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle, storage: Database, mailer: Arc<dyn EmailSender>) -> Self {
        Self {
            jobs: JobService::new(storage.clone()),
            employees: EmployeeService::new(storage.clone(), mailer),
            metrics,
            storage,
            clock: Arc::new(Utc::now),
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn storage(&self) -> &Database {
        &self.storage
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn jobs(&self) -> &JobService {
        &self.jobs
    }

    pub fn employees(&self) -> &EmployeeService {
        &self.employees
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/api/job", get(jobs::list).patch(jobs::add_employee))
        .route("/api/job/:job_id/indicative-tax", get(jobs::indicative_tax))
        .route("/api/employee", post(employees::create))
        .with_state(state)
}

async fn healthz(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(state.storage().pool()).await {
        Ok(_) => StatusCode::OK,
        Err(err) => {
            tracing::error!(stage = "api", error = %err, "database health check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}
