mod seed;

use std::{collections::HashMap, str::FromStr, time::Duration};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use thiserror::Error;

use jobdesk_core::types::{
    Employee, EmployeeSummary, JobCategory, JobDetails, TaxInformation, TaxRegime,
};

/// SQLite extended result code for a failed foreign key constraint.
const SQLITE_CONSTRAINT_FOREIGNKEY: &str = "787";

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    ///
    /// One connection is kept open for the lifetime of the pool so that
    /// `sqlite::memory:` databases survive idle periods.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StorageError::Connect)?
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns a handle for reading and assigning jobs.
    pub fn jobs(&self) -> JobRepository {
        JobRepository {
            pool: self.pool.clone(),
        }
    }

    /// Returns a handle for employee records.
    pub fn employees(&self) -> EmployeeRepository {
        EmployeeRepository {
            pool: self.pool.clone(),
        }
    }

    /// Returns a handle for categories, roles, regimes and tax records.
    pub fn reference_data(&self) -> ReferenceDataRepository {
        ReferenceDataRepository {
            pool: self.pool.clone(),
        }
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some(SQLITE_CONSTRAINT_FOREIGNKEY)
        }
        _ => false,
    }
}

fn parse_decimal(column: &'static str, raw: &str) -> Result<Decimal, DecimalColumnError> {
    Decimal::from_str(raw).map_err(|source| DecimalColumnError {
        column,
        value: raw.to_string(),
        source,
    })
}

/// A decimal column held text that does not parse as a decimal.
#[derive(Debug, Error)]
#[error("column {column} holds invalid decimal {value:?}: {source}")]
pub struct DecimalColumnError {
    pub column: &'static str,
    pub value: String,
    #[source]
    pub source: rust_decimal::Error,
}

/// Repository for jobs and their employee assignments.
#[derive(Clone)]
pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
    /// Loads every job with its category, tax records and assigned employees, ordered by id.
    ///
    /// Tax records keep their insertion order; employees keep assignment order.
    pub async fn list_details(&self) -> Result<Vec<JobDetails>, JobError> {
        let jobs = sqlx::query_as::<_, JobRow>(
            r#"
SELECT j.id,
       j.description,
       c.id AS category_id,
       c.description AS category_description
  FROM jobs AS j
  JOIN job_categories AS c ON c.id = j.job_category_id
 ORDER BY j.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let tax_rows = sqlx::query_as::<_, TaxInformationRow>(
            r#"
SELECT ti.id,
       ti.description,
       ti.job_id,
       r.id AS regime_id,
       r.country_code,
       r.description AS regime_description,
       r.minimum_threshold,
       r.tax_rate
  FROM tax_information AS ti
  JOIN tax_regimes AS r ON r.id = ti.tax_regime_id
 ORDER BY ti.job_id, ti.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut tax_by_job: HashMap<i64, Vec<TaxInformation>> = HashMap::new();
        for row in tax_rows {
            let info = row.into_domain()?;
            tax_by_job.entry(info.job_id).or_default().push(info);
        }

        let employee_rows = sqlx::query_as::<_, AssignedEmployeeRow>(
            r#"
SELECT je.job_id,
       e.id,
       e.name
  FROM job_employees AS je
  JOIN employees AS e ON e.id = je.employee_id
 ORDER BY je.job_id, je.rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut employees_by_job: HashMap<i64, Vec<EmployeeSummary>> = HashMap::new();
        for row in employee_rows {
            employees_by_job
                .entry(row.job_id)
                .or_default()
                .push(EmployeeSummary {
                    id: row.id,
                    name: row.name,
                });
        }

        Ok(jobs
            .into_iter()
            .map(|row| JobDetails {
                tax_information: tax_by_job.remove(&row.id).unwrap_or_default(),
                employees: employees_by_job.remove(&row.id).unwrap_or_default(),
                id: row.id,
                description: row.description,
                category: JobCategory {
                    id: row.category_id,
                    description: row.category_description,
                },
            })
            .collect())
    }

    /// Returns `true` when a job with the id exists.
    pub async fn exists(&self, job_id: i64) -> Result<bool, JobError> {
        let found = sqlx::query_scalar::<_, i64>("SELECT EXISTS(SELECT 1 FROM jobs WHERE id = ?)")
            .bind(job_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found != 0)
    }

    /// Inserts a job and returns its id.
    pub async fn insert(&self, job: &NewJob<'_>) -> Result<i64, JobError> {
        let result = sqlx::query("INSERT INTO jobs (description, job_category_id) VALUES (?, ?)")
            .bind(job.description)
            .bind(job.job_category_id)
            .execute(&self.pool)
            .await
            .map_err(JobError::from_insert)?;
        Ok(result.last_insert_rowid())
    }

    /// Records that the employee works on the job. Assigning twice is a no-op.
    pub async fn assign_employee(
        &self,
        job_id: i64,
        employee_id: i64,
    ) -> Result<AssignmentOutcome, JobError> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO job_employees (job_id, employee_id) VALUES (?, ?)")
                .bind(job_id)
                .bind(employee_id)
                .execute(&self.pool)
                .await
                .map_err(JobError::from_insert)?;

        if result.rows_affected() == 0 {
            Ok(AssignmentOutcome::AlreadyAssigned)
        } else {
            Ok(AssignmentOutcome::Assigned)
        }
    }

    /// Regimes referenced by the job's tax records, in record order.
    pub async fn tax_regimes(&self, job_id: i64) -> Result<Vec<TaxRegime>, JobError> {
        let rows = sqlx::query_as::<_, TaxRegimeRow>(
            r#"
SELECT r.id,
       r.country_code,
       r.description,
       r.minimum_threshold,
       r.tax_rate
  FROM tax_information AS ti
  JOIN tax_regimes AS r ON r.id = ti.tax_regime_id
 WHERE ti.job_id = ?
 ORDER BY ti.id
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| row.into_domain().map_err(JobError::from))
            .collect()
    }
}

/// Data required to create a job.
pub struct NewJob<'a> {
    pub description: &'a str,
    pub job_category_id: i64,
}

/// Result of assigning an employee to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOutcome {
    Assigned,
    AlreadyAssigned,
}

/// Errors that can occur while reading or mutating jobs.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("referenced category, job or employee does not exist")]
    MissingReference,
    #[error(transparent)]
    Decimal(#[from] DecimalColumnError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl JobError {
    fn from_insert(err: sqlx::Error) -> Self {
        if is_foreign_key_violation(&err) {
            Self::MissingReference
        } else {
            Self::Database(err)
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: i64,
    description: String,
    category_id: i64,
    category_description: String,
}

#[derive(Debug, sqlx::FromRow)]
struct TaxInformationRow {
    id: i64,
    description: String,
    job_id: i64,
    regime_id: i64,
    country_code: String,
    regime_description: String,
    minimum_threshold: String,
    tax_rate: String,
}

impl TaxInformationRow {
    fn into_domain(self) -> Result<TaxInformation, DecimalColumnError> {
        Ok(TaxInformation {
            id: self.id,
            description: self.description,
            job_id: self.job_id,
            regime: TaxRegime {
                id: self.regime_id,
                country_code: self.country_code,
                description: self.regime_description,
                minimum_threshold: parse_decimal("minimum_threshold", &self.minimum_threshold)?,
                tax_rate: parse_decimal("tax_rate", &self.tax_rate)?,
            },
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TaxRegimeRow {
    id: i64,
    country_code: String,
    description: String,
    minimum_threshold: String,
    tax_rate: String,
}

impl TaxRegimeRow {
    fn into_domain(self) -> Result<TaxRegime, DecimalColumnError> {
        Ok(TaxRegime {
            id: self.id,
            country_code: self.country_code,
            description: self.description,
            minimum_threshold: parse_decimal("minimum_threshold", &self.minimum_threshold)?,
            tax_rate: parse_decimal("tax_rate", &self.tax_rate)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AssignedEmployeeRow {
    job_id: i64,
    id: i64,
    name: String,
}

/// Repository for employee records.
#[derive(Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    /// Inserts an employee and returns the generated id.
    pub async fn insert(&self, employee: &NewEmployee<'_>) -> Result<i64, EmployeeError> {
        let result = sqlx::query(
            "INSERT INTO employees (name, email, date_of_birth, job_role_id) VALUES (?, ?, ?, ?)",
        )
        .bind(&employee.name)
        .bind(employee.email)
        .bind(employee.date_of_birth)
        .bind(employee.job_role_id)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_foreign_key_violation(&err) {
                EmployeeError::UnknownJobRole(employee.job_role_id)
            } else {
                EmployeeError::Database(err)
            }
        })?;

        Ok(result.last_insert_rowid())
    }

    /// Returns `true` when an employee with the id exists.
    pub async fn exists(&self, employee_id: i64) -> Result<bool, EmployeeError> {
        let found =
            sqlx::query_scalar::<_, i64>("SELECT EXISTS(SELECT 1 FROM employees WHERE id = ?)")
                .bind(employee_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(found != 0)
    }

    /// Loads a single employee.
    pub async fn find(&self, employee_id: i64) -> Result<Option<Employee>, EmployeeError> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            "SELECT id, name, email, date_of_birth, job_role_id FROM employees WHERE id = ?",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(EmployeeRow::into_domain))
    }
}

/// Data required to create an employee.
pub struct NewEmployee<'a> {
    pub name: String,
    pub email: &'a str,
    pub date_of_birth: Option<NaiveDate>,
    pub job_role_id: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct EmployeeRow {
    id: i64,
    name: String,
    email: String,
    date_of_birth: Option<NaiveDate>,
    job_role_id: i64,
}

impl EmployeeRow {
    fn into_domain(self) -> Employee {
        Employee {
            id: self.id,
            name: self.name,
            email: self.email,
            date_of_birth: self.date_of_birth,
            job_role_id: self.job_role_id,
        }
    }
}

/// Errors that can occur while reading or writing employees.
#[derive(Debug, Error)]
pub enum EmployeeError {
    #[error("job role {0} does not exist")]
    UnknownJobRole(i64),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository for the small lookup tables jobs and employees hang off.
#[derive(Clone)]
pub struct ReferenceDataRepository {
    pool: SqlitePool,
}

impl ReferenceDataRepository {
    pub async fn insert_category(&self, description: &str) -> Result<i64, ReferenceDataError> {
        let result = sqlx::query("INSERT INTO job_categories (description) VALUES (?)")
            .bind(description)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn insert_job_role(&self, description: &str) -> Result<i64, ReferenceDataError> {
        let result = sqlx::query("INSERT INTO job_roles (description) VALUES (?)")
            .bind(description)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Inserts a regime; threshold and rate are stored as decimal text.
    pub async fn insert_tax_regime(
        &self,
        regime: &NewTaxRegime<'_>,
    ) -> Result<i64, ReferenceDataError> {
        let result = sqlx::query(
            "INSERT INTO tax_regimes (country_code, description, minimum_threshold, tax_rate) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(regime.country_code)
        .bind(regime.description)
        .bind(regime.minimum_threshold.normalize().to_string())
        .bind(regime.tax_rate.normalize().to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Ties a job to a regime.
    pub async fn insert_tax_information(
        &self,
        record: &NewTaxInformation<'_>,
    ) -> Result<i64, ReferenceDataError> {
        let result = sqlx::query(
            "INSERT INTO tax_information (description, job_id, tax_regime_id) VALUES (?, ?, ?)",
        )
        .bind(record.description)
        .bind(record.job_id)
        .bind(record.tax_regime_id)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_foreign_key_violation(&err) {
                ReferenceDataError::MissingReference
            } else {
                ReferenceDataError::Database(err)
            }
        })?;
        Ok(result.last_insert_rowid())
    }

    /// Lists all regimes ordered by id.
    pub async fn list_tax_regimes(&self) -> Result<Vec<TaxRegime>, ReferenceDataError> {
        let rows = sqlx::query_as::<_, TaxRegimeRow>(
            "SELECT id, country_code, description, minimum_threshold, tax_rate \
             FROM tax_regimes ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| row.into_domain().map_err(ReferenceDataError::from))
            .collect()
    }
}

/// Data required to create a tax regime.
pub struct NewTaxRegime<'a> {
    pub country_code: &'a str,
    pub description: &'a str,
    pub minimum_threshold: Decimal,
    pub tax_rate: Decimal,
}

/// Data required to tie a job to a tax regime.
pub struct NewTaxInformation<'a> {
    pub description: &'a str,
    pub job_id: i64,
    pub tax_regime_id: i64,
}

/// Errors raised by [`ReferenceDataRepository`].
#[derive(Debug, Error)]
pub enum ReferenceDataError {
    #[error("referenced job or tax regime does not exist")]
    MissingReference,
    #[error(transparent)]
    Decimal(#[from] DecimalColumnError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
