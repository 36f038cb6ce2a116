/// Subject line of the welcome mail sent to new employees.
pub const NEW_EMPLOYEE_SUBJECT: &str = "New Employee Confirmation";

/// Body of the welcome mail sent to new employees.
pub fn new_employee_message(forenames: &str, surname: &str) -> String {
    format!("Dear {forenames} {surname},\n\nWelcome to the company!\nYours Sincerely\nThe CEO")
}
