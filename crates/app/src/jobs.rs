use std::str::FromStr;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use jobdesk_core::types::{
    EmployeeResponse, IndicativeTaxResponse, JobCategoryResponse, JobDetails, JobResponse,
};
use jobdesk_core::{TaxCalculator, TaxError};
use jobdesk_storage::{AssignmentOutcome, Database, EmployeeError, JobError};

use crate::problem::ProblemResponse;
use crate::router::AppState;
use crate::telemetry::record_api_request;

/// Reads jobs and maintains their employee assignments.
#[derive(Clone)]
pub struct JobService {
    database: Database,
    calculator: TaxCalculator,
}

impl JobService {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            calculator: TaxCalculator::new(),
        }
    }

    /// Every job with its category, tax liabilities and employees.
    pub async fn get_all_jobs(&self) -> Result<Vec<JobResponse>, JobServiceError> {
        let jobs = self.database.jobs().list_details().await?;
        Ok(jobs.iter().map(|job| self.to_response(job)).collect())
    }

    pub async fn exists(&self, job_id: i64) -> Result<bool, JobServiceError> {
        Ok(self.database.jobs().exists(job_id).await?)
    }

    /// Assigns the employee to the job. The job is checked first; an unknown job
    /// fails without looking the employee up.
    pub async fn add_employee_to_job(
        &self,
        job_id: i64,
        employee_id: i64,
    ) -> Result<AssignmentOutcome, JobServiceError> {
        if !self.exists(job_id).await? {
            return Err(JobServiceError::JobNotFound(job_id));
        }
        if !self.database.employees().exists(employee_id).await? {
            return Err(JobServiceError::EmployeeNotFound(employee_id));
        }

        Ok(self
            .database
            .jobs()
            .assign_employee(job_id, employee_id)
            .await?)
    }

    /// Indicative tax percentage of `reference_value` across the regimes the job is taxed under.
    pub async fn indicative_tax_percentage(
        &self,
        job_id: i64,
        reference_value: Decimal,
    ) -> Result<Decimal, JobServiceError> {
        if !self.exists(job_id).await? {
            return Err(JobServiceError::JobNotFound(job_id));
        }

        let regimes = self.database.jobs().tax_regimes(job_id).await?;
        Ok(self
            .calculator
            .indicative_tax_percentage(reference_value, &regimes)?)
    }

    fn to_response(&self, job: &JobDetails) -> JobResponse {
        JobResponse {
            id: job.id,
            description: job.description.clone(),
            category: JobCategoryResponse {
                id: job.category.id,
                description: job.category.description.clone(),
            },
            tax_liabilities: self.calculator.tax_liabilities(job),
            employees: job
                .employees
                .iter()
                .map(|employee| EmployeeResponse {
                    id: employee.id,
                    name: employee.name.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JobServiceError {
    #[error("unable to find job {0}")]
    JobNotFound(i64),
    #[error("unable to find employee {0}")]
    EmployeeNotFound(i64),
    #[error(transparent)]
    Tax(#[from] TaxError),
    #[error(transparent)]
    Jobs(#[from] JobError),
    #[error(transparent)]
    Employees(#[from] EmployeeError),
}

#[derive(Debug, Deserialize)]
pub struct AddEmployeeQuery {
    #[serde(rename = "jobId")]
    job_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct IndicativeTaxQuery {
    #[serde(rename = "referenceValue")]
    reference_value: String,
}

/// `GET /api/job`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<JobResponse>>, ProblemResponse> {
    match state.jobs().get_all_jobs().await {
        Ok(jobs) => {
            record_api_request("jobs.list", "ok");
            Ok(Json(jobs))
        }
        Err(err) => {
            error!(stage = "api", error = %err, "failed to load jobs");
            record_api_request("jobs.list", "error");
            Err(ProblemResponse::internal())
        }
    }
}

/// `PATCH /api/job?jobId={id}` with the employee id as the JSON body.
///
/// The job is part of the addressed resource, so a missing job is a 404; the
/// employee comes from the body, so a missing employee is a 422.
pub async fn add_employee(
    State(state): State<AppState>,
    query: Result<Query<AddEmployeeQuery>, QueryRejection>,
    body: Result<Json<i64>, JsonRejection>,
) -> Result<StatusCode, ProblemResponse> {
    let Query(AddEmployeeQuery { job_id }) = query.map_err(|rejection| {
        record_api_request("jobs.add_employee", "bad_request");
        ProblemResponse::new(rejection.status(), "invalid_query", rejection.body_text())
    })?;

    match state.jobs().exists(job_id).await {
        Ok(true) => {}
        Ok(false) => {
            record_api_request("jobs.add_employee", "job_not_found");
            return Err(job_not_found(job_id));
        }
        Err(err) => return Err(internal("jobs.add_employee", &err)),
    }

    let Json(employee_id) = body.map_err(|rejection| {
        record_api_request("jobs.add_employee", "bad_request");
        ProblemResponse::new(rejection.status(), "invalid_body", rejection.body_text())
    })?;

    match state.employees().exists(employee_id).await {
        Ok(true) => {}
        Ok(false) => {
            record_api_request("jobs.add_employee", "employee_not_found");
            return Err(unknown_employee());
        }
        Err(err) => return Err(internal("jobs.add_employee", &err)),
    }

    match state.jobs().add_employee_to_job(job_id, employee_id).await {
        Ok(outcome) => {
            info!(stage = "api", job_id, employee_id, ?outcome, "employee assigned to job");
            record_api_request("jobs.add_employee", "ok");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(JobServiceError::JobNotFound(_)) => {
            record_api_request("jobs.add_employee", "job_not_found");
            Err(job_not_found(job_id))
        }
        Err(JobServiceError::EmployeeNotFound(_)) => {
            record_api_request("jobs.add_employee", "employee_not_found");
            Err(unknown_employee())
        }
        Err(err) => Err(internal("jobs.add_employee", &err)),
    }
}

/// `GET /api/job/{jobId}/indicative-tax?referenceValue={value}`
pub async fn indicative_tax(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
    query: Result<Query<IndicativeTaxQuery>, QueryRejection>,
) -> Result<Response, ProblemResponse> {
    let Query(query) = query.map_err(|rejection| {
        record_api_request("jobs.indicative_tax", "bad_request");
        ProblemResponse::new(rejection.status(), "invalid_query", rejection.body_text())
    })?;
    let reference_value = Decimal::from_str(query.reference_value.trim()).map_err(|err| {
        record_api_request("jobs.indicative_tax", "bad_request");
        ProblemResponse::new(
            StatusCode::BAD_REQUEST,
            "invalid_reference_value",
            format!("referenceValue must be a decimal number: {err}"),
        )
    })?;

    match state
        .jobs()
        .indicative_tax_percentage(job_id, reference_value)
        .await
    {
        Ok(percentage) => {
            record_api_request("jobs.indicative_tax", "ok");
            Ok(Json(IndicativeTaxResponse {
                job_id,
                reference_value,
                indicative_tax_percentage: percentage,
            })
            .into_response())
        }
        Err(JobServiceError::JobNotFound(_)) => {
            record_api_request("jobs.indicative_tax", "job_not_found");
            Err(job_not_found(job_id))
        }
        Err(JobServiceError::Tax(err)) => {
            record_api_request("jobs.indicative_tax", "unprocessable");
            Err(ProblemResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_reference_value",
                err.to_string(),
            ))
        }
        Err(err) => Err(internal("jobs.indicative_tax", &err)),
    }
}

fn job_not_found(job_id: i64) -> ProblemResponse {
    ProblemResponse::new(
        StatusCode::NOT_FOUND,
        "job_not_found",
        format!("job {job_id} does not exist"),
    )
}

fn unknown_employee() -> ProblemResponse {
    ProblemResponse::new(
        StatusCode::UNPROCESSABLE_ENTITY,
        "unknown_employee",
        "Unknown employee",
    )
}

fn internal(route: &'static str, err: &dyn std::error::Error) -> ProblemResponse {
    error!(stage = "api", route, error = %err, "request failed");
    record_api_request(route, "error");
    ProblemResponse::internal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn empty_store_yields_empty_list() {
        let service = JobService::new(test_support::database(false).await);
        let jobs = service.get_all_jobs().await.expect("jobs");
        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn seeded_jobs_carry_liabilities_and_employees() {
        let service = JobService::new(test_support::database(true).await);
        let jobs = service.get_all_jobs().await.expect("jobs");

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].tax_liabilities, vec!["GBR"]);
        assert_eq!(jobs[1].tax_liabilities, vec!["GBR", "USA", "FRA", "JPN"]);
        assert_eq!(jobs[1].category.description, "Management");
        assert_eq!(
            jobs[1].employees,
            vec![EmployeeResponse {
                id: 2,
                name: "Betty Black".into()
            }]
        );
    }

    #[tokio::test]
    async fn unknown_job_wins_over_unknown_employee() {
        let service = JobService::new(test_support::database(true).await);
        let err = service
            .add_employee_to_job(404, 9999)
            .await
            .expect_err("unknown job");
        assert!(matches!(err, JobServiceError::JobNotFound(404)));
    }

    #[tokio::test]
    async fn unknown_employee_is_reported() {
        let service = JobService::new(test_support::database(true).await);
        let err = service
            .add_employee_to_job(1, 9999)
            .await
            .expect_err("unknown employee");
        assert!(matches!(err, JobServiceError::EmployeeNotFound(9999)));
    }

    #[tokio::test]
    async fn assignment_appears_in_listing_once() {
        let service = JobService::new(test_support::database(true).await);

        let first = service.add_employee_to_job(1, 5).await.expect("assign");
        let second = service.add_employee_to_job(1, 5).await.expect("assign again");
        assert_eq!(first, AssignmentOutcome::Assigned);
        assert_eq!(second, AssignmentOutcome::AlreadyAssigned);

        let jobs = service.get_all_jobs().await.expect("jobs");
        let ids: Vec<i64> = jobs[0].employees.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 5]);
    }

    #[tokio::test]
    async fn indicative_tax_uses_job_regimes() {
        let service = JobService::new(test_support::database(true).await);

        // Job 1 is only taxed under GBR: (20000 - 10000) * 0.2 / 20000.
        let percentage = service
            .indicative_tax_percentage(1, dec!(20000))
            .await
            .expect("percentage");
        assert_eq!(percentage, dec!(0.1));

        let err = service
            .indicative_tax_percentage(1, Decimal::ZERO)
            .await
            .expect_err("zero reference");
        assert!(matches!(
            err,
            JobServiceError::Tax(TaxError::ZeroReferenceValue)
        ));
    }
}
