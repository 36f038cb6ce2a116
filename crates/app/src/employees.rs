use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use thiserror::Error;
use tracing::{error, info, warn};

use jobdesk_core::notification::{new_employee_message, NEW_EMPLOYEE_SUBJECT};
use jobdesk_core::types::{CreateEmployeeRequest, NewEmployeeResponse, SpecialUser};
use jobdesk_core::{validate_create_employee, ValidationFailure};
use jobdesk_storage::{Database, EmployeeError, NewEmployee};

use crate::communication::{CommunicationError, CommunicationService};
use crate::mailer::EmailSender;
use crate::problem::ProblemResponse;
use crate::router::AppState;
use crate::telemetry::record_api_request;

/// Creates employees and sends their welcome mail.
#[derive(Clone)]
pub struct EmployeeService {
    database: Database,
    communication: CommunicationService,
    sender: Arc<dyn EmailSender>,
}

impl EmployeeService {
    pub fn new(database: Database, sender: Arc<dyn EmailSender>) -> Self {
        Self {
            communication: CommunicationService::new(database.clone()),
            database,
            sender,
        }
    }

    pub async fn exists(&self, employee_id: i64) -> Result<bool, EmployeeError> {
        self.database.employees().exists(employee_id).await
    }

    /// Stores the employee, then mails them with HR on blind copy.
    ///
    /// The request must already be validated. A failed send is logged and
    /// counted but the stored record stays and its id is still returned.
    pub async fn create_employee(
        &self,
        request: &CreateEmployeeRequest,
    ) -> Result<i64, EmployeeServiceError> {
        let employee_id = self.create_employee_record(request).await?;
        counter!("employees_created_total").increment(1);

        let hr_address = SpecialUser::HrManager.email_address();
        let email = self
            .communication
            .create_email(
                employee_id,
                &new_employee_message(&request.forenames, &request.surname),
                NEW_EMPLOYEE_SUBJECT,
                None,
                Some(hr_address),
            )
            .await?;

        match self.sender.send(&email).await {
            Ok(()) => {
                counter!("notifications_dispatched_total", "result" => "sent").increment(1);
                info!(stage = "onboarding", employee_id, "welcome mail dispatched");
            }
            Err(err) => {
                counter!("notifications_dispatched_total", "result" => "failed").increment(1);
                warn!(stage = "onboarding", employee_id, error = %err, "welcome mail could not be dispatched");
            }
        }

        Ok(employee_id)
    }

    async fn create_employee_record(
        &self,
        request: &CreateEmployeeRequest,
    ) -> Result<i64, EmployeeError> {
        self.database
            .employees()
            .insert(&NewEmployee {
                name: format!("{} {}", request.forenames, request.surname),
                email: &request.email_address,
                date_of_birth: Some(request.date_of_birth),
                job_role_id: request.job_role_id,
            })
            .await
    }
}

#[derive(Debug, Error)]
pub enum EmployeeServiceError {
    #[error(transparent)]
    Storage(#[from] EmployeeError),
    #[error(transparent)]
    Communication(#[from] CommunicationError),
}

/// `POST /api/employee`
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreateEmployeeRequest>, JsonRejection>,
) -> Result<Response, ProblemResponse> {
    let Json(request) = body.map_err(|rejection| {
        record_api_request("employees.create", "bad_request");
        ProblemResponse::new(rejection.status(), "invalid_body", rejection.body_text())
    })?;

    if let Err(failures) = validate_create_employee(&request, state.now().date_naive()) {
        record_api_request("employees.create", "invalid");
        return Ok(unprocessable(failures));
    }

    let employee_id = match state.employees().create_employee(&request).await {
        Ok(id) => id,
        Err(EmployeeServiceError::Storage(EmployeeError::UnknownJobRole(role_id))) => {
            record_api_request("employees.create", "invalid");
            return Ok(unprocessable(vec![ValidationFailure {
                property_name: "JobRoleId".into(),
                error_message: format!("Job role {role_id} does not exist."),
            }]));
        }
        Err(err) => {
            error!(stage = "api", error = %err, "failed to create employee");
            record_api_request("employees.create", "error");
            return Err(ProblemResponse::internal());
        }
    };

    if employee_id <= 0 {
        error!(stage = "api", employee_id, "store returned a non-positive employee id");
        record_api_request("employees.create", "error");
        return Err(ProblemResponse::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "employee_not_created",
            "An error occurred while creating the employee.",
        ));
    }

    record_api_request("employees.create", "created");
    Ok((
        StatusCode::CREATED,
        Json(NewEmployeeResponse { id: employee_id }),
    )
        .into_response())
}

fn unprocessable(failures: Vec<ValidationFailure>) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(failures)).into_response()
}
