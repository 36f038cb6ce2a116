use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category a job is filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCategory {
    pub id: i64,
    pub description: String,
}

/// Role an employee holds within the company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRole {
    pub id: i64,
    pub description: String,
}

/// Persisted employee record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub date_of_birth: Option<NaiveDate>,
    pub job_role_id: i64,
}

/// Id and display name of an employee assigned to a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeSummary {
    pub id: i64,
    pub name: String,
}

/// A jurisdiction's tax rule: income above `minimum_threshold` is taxed at `tax_rate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxRegime {
    pub id: i64,
    pub country_code: String,
    pub description: String,
    pub minimum_threshold: Decimal,
    /// Fraction, e.g. `0.2` for 20%.
    pub tax_rate: Decimal,
}

/// Record tying a job to the regime it is taxed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxInformation {
    pub id: i64,
    pub description: String,
    pub job_id: i64,
    pub regime: TaxRegime,
}

/// A job loaded together with its category, tax records and assigned employees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDetails {
    pub id: i64,
    pub description: String,
    pub category: JobCategory,
    pub tax_information: Vec<TaxInformation>,
    pub employees: Vec<EmployeeSummary>,
}

/// Body of `POST /api/employee`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    #[serde(default)]
    pub forenames: String,
    #[serde(default)]
    pub surname: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub email_address: String,
    pub job_role_id: i64,
}

/// Item of the `GET /api/job` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub id: i64,
    pub description: String,
    pub category: JobCategoryResponse,
    pub tax_liabilities: Vec<String>,
    pub employees: Vec<EmployeeResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCategoryResponse {
    pub id: i64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeResponse {
    pub id: i64,
    pub name: String,
}

/// Body returned after an employee has been created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployeeResponse {
    pub id: i64,
}

/// Body of `GET /api/job/{jobId}/indicative-tax`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicativeTaxResponse {
    pub job_id: i64,
    pub reference_value: Decimal,
    pub indicative_tax_percentage: Decimal,
}

/// An email ready to be handed to a sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailCommunication {
    pub to_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcc_address: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Fixed company mailboxes that are copied on generated mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialUser {
    Ceo,
    Cfo,
    HrManager,
}

impl SpecialUser {
    pub fn email_address(self) -> &'static str {
        match self {
            Self::Ceo => "ceo@company.com",
            Self::Cfo => "cfo@company.com",
            Self::HrManager => "hr@company.com",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_response_serializes_camel_case_with_empty_arrays() {
        let response = JobResponse {
            id: 1,
            description: "Year end accounts".into(),
            category: JobCategoryResponse {
                id: 1,
                description: "Management".into(),
            },
            tax_liabilities: Vec::new(),
            employees: Vec::new(),
        };

        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(
            value,
            json!({
                "id": 1,
                "description": "Year end accounts",
                "category": { "id": 1, "description": "Management" },
                "taxLiabilities": [],
                "employees": []
            })
        );
    }

    #[test]
    fn email_omits_missing_copies() {
        let email = EmailCommunication {
            to_address: "jd@company.com".into(),
            cc_address: None,
            bcc_address: Some("hr@company.com".into()),
            subject: "Subject".into(),
            body: "Body".into(),
        };

        let value = serde_json::to_value(&email).expect("serialize");
        assert!(value.get("ccAddress").is_none());
        assert_eq!(value["bccAddress"], "hr@company.com");
    }

    #[test]
    fn create_request_parses_iso_date() {
        let request: CreateEmployeeRequest = serde_json::from_value(json!({
            "forenames": "John",
            "surname": "Doe",
            "dateOfBirth": "1990-04-01",
            "emailAddress": "jd@company.com",
            "jobRoleId": 3
        }))
        .expect("deserialize");

        assert_eq!(
            request.date_of_birth,
            NaiveDate::from_ymd_opt(1990, 4, 1).expect("date")
        );
        assert_eq!(request.job_role_id, 3);
    }

    #[test]
    fn special_users_map_to_company_mailboxes() {
        assert_eq!(SpecialUser::HrManager.email_address(), "hr@company.com");
        assert_eq!(SpecialUser::Ceo.email_address(), "ceo@company.com");
        assert_eq!(SpecialUser::Cfo.email_address(), "cfo@company.com");
    }
}
