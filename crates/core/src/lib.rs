//! Domain types and pure business rules shared by the storage layer and the HTTP app.

pub mod notification;
pub mod tax;
pub mod types;
pub mod validation;

pub use tax::{TaxCalculator, TaxError};
pub use validation::{validate_create_employee, ValidationFailure};
