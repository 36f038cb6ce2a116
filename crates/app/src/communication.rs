use thiserror::Error;

use jobdesk_core::types::EmailCommunication;
use jobdesk_storage::{Database, EmployeeError};

/// Builds mail addressed to existing employees.
#[derive(Clone)]
pub struct CommunicationService {
    database: Database,
}

impl CommunicationService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Composes a message to the employee's stored address.
    pub async fn create_email(
        &self,
        employee_id: i64,
        message: &str,
        header: &str,
        cc: Option<&str>,
        bcc: Option<&str>,
    ) -> Result<EmailCommunication, CommunicationError> {
        let employee = self
            .database
            .employees()
            .find(employee_id)
            .await?
            .ok_or(CommunicationError::EmployeeNotFound(employee_id))?;

        Ok(EmailCommunication {
            to_address: employee.email,
            cc_address: cc.map(str::to_string),
            bcc_address: bcc.map(str::to_string),
            subject: header.to_string(),
            body: message.to_string(),
        })
    }
}

#[derive(Debug, Error)]
pub enum CommunicationError {
    #[error("unable to find employee {0}")]
    EmployeeNotFound(i64),
    #[error(transparent)]
    Storage(#[from] EmployeeError),
}
