use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::CreateEmployeeRequest;

pub const MAX_FORENAMES_LENGTH: usize = 500;
pub const MAX_SURNAME_LENGTH: usize = 200;

/// A single failed rule, reported back to the client as part of a 422 body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    pub property_name: String,
    pub error_message: String,
}

impl ValidationFailure {
    fn new(property_name: &str, error_message: impl Into<String>) -> Self {
        Self {
            property_name: property_name.to_string(),
            error_message: error_message.into(),
        }
    }
}

/// Checks every rule on a new employee request and returns all failures.
///
/// `today` is the caller's current date. A date of birth reads as midnight of that day,
/// which has already passed, so only dates after `today` are rejected.
pub fn validate_create_employee(
    request: &CreateEmployeeRequest,
    today: NaiveDate,
) -> Result<(), Vec<ValidationFailure>> {
    let mut failures = Vec::new();

    if request.forenames.chars().count() > MAX_FORENAMES_LENGTH {
        failures.push(ValidationFailure::new(
            "Forenames",
            format!("Employee forenames cannot exceed {MAX_FORENAMES_LENGTH} characters."),
        ));
    }

    if request.surname.trim().is_empty() {
        failures.push(ValidationFailure::new(
            "Surname",
            "Employee surname cannot be empty.",
        ));
    }
    if request.surname.chars().count() > MAX_SURNAME_LENGTH {
        failures.push(ValidationFailure::new(
            "Surname",
            format!("Employee surname cannot exceed {MAX_SURNAME_LENGTH} characters."),
        ));
    }

    if request.email_address.trim().is_empty() {
        failures.push(ValidationFailure::new(
            "EmailAddress",
            "Email address cannot be empty.",
        ));
    }
    if !is_email_like(&request.email_address) {
        failures.push(ValidationFailure::new(
            "EmailAddress",
            "Email address must be a valid email format.",
        ));
    }

    if request.date_of_birth > today {
        failures.push(ValidationFailure::new(
            "DateOfBirth",
            "Date of birth must be in the past.",
        ));
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}

/// Exactly one `@`, with something on both sides of it.
fn is_email_like(value: &str) -> bool {
    match (value.find('@'), value.rfind('@')) {
        (Some(first), Some(last)) => first == last && first > 0 && first < value.len() - 1,
        _ => false,
    }
}
