use tracing::info;

use crate::{Database, StorageError};

const TAX_REGIMES: [(i64, &str, &str, &str, &str); 4] = [
    (1, "GBR", "Under British tax", "10000", "0.2"),
    (2, "USA", "Overseas - United States", "1000", "0.14"),
    (3, "FRA", "Overseas - France", "5000", "0.24"),
    (4, "JPN", "Overseas - Japan", "7000", "0.18"),
];

const JOB_CATEGORIES: [(i64, &str); 3] = [
    (1, "Management"),
    (2, "Account Management"),
    (3, "Printing"),
];

const JOB_ROLES: [(i64, &str); 9] = [
    (1, "CEO"),
    (2, "CFO"),
    (3, "Senior Account Manager"),
    (4, "Regional Account Manager"),
    (5, "Account Manager"),
    (6, "Digital Printer"),
    (7, "Lithographic Printer"),
    (8, "Ink Technician"),
    (9, "Maintenance"),
];

/// (id, name, email, job role id)
const EMPLOYEES: [(i64, &str, &str, i64); 13] = [
    (1, "Adam Appleby", "aa@company.com", 1),
    (2, "Betty Black", "bb@company.com", 2),
    (3, "Catherine Chatsworth", "cc@company.com", 3),
    (4, "Dennis Drupt", "dd@company.com", 4),
    (5, "Eric Enest", "ee@company.com", 5),
    (6, "Fiona Flough", "ff@company.com", 5),
    (7, "Gina Gerry", "gg@company.com", 6),
    (8, "Henry Hatter", "hh@company.com", 6),
    (9, "Ingrid Irvine", "ii@company.com", 7),
    (10, "John Jacks", "jj@company.com", 7),
    (11, "Kiara Klive", "kk@company.com", 7),
    (12, "Liam Lovegood", "ll@company.com", 8),
    (13, "Marge Mavis", "mm@company.com", 9),
];

/// (id, description, category id)
const JOBS: [(i64, &str, i64); 2] = [
    (1, "Organise company culture meeting", 1),
    (2, "Year end accounts", 1),
];

/// (job id, employee id)
const ASSIGNMENTS: [(i64, i64); 2] = [(1, 1), (2, 2)];

/// (id, description, job id, tax regime id)
const TAX_INFORMATION: [(i64, &str, i64, i64); 5] = [
    (1, "Internal", 1, 1),
    (2, "UK", 2, 1),
    (3, "US", 2, 2),
    (4, "EU", 2, 3),
    (5, "JP", 2, 4),
];

impl Database {
    /// Inserts the fixed reference dataset. Rows that already exist are left untouched,
    /// so the call is safe on every startup.
    pub async fn seed_reference_data(&self) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for (id, code, description, threshold, rate) in TAX_REGIMES {
            inserted += sqlx::query(
                "INSERT OR IGNORE INTO tax_regimes \
                 (id, country_code, description, minimum_threshold, tax_rate) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(code)
            .bind(description)
            .bind(threshold)
            .bind(rate)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        for (id, description) in JOB_CATEGORIES {
            inserted += sqlx::query(
                "INSERT OR IGNORE INTO job_categories (id, description) VALUES (?, ?)",
            )
            .bind(id)
            .bind(description)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        for (id, description) in JOB_ROLES {
            inserted += sqlx::query("INSERT OR IGNORE INTO job_roles (id, description) VALUES (?, ?)")
                .bind(id)
                .bind(description)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        for (id, name, email, job_role_id) in EMPLOYEES {
            inserted += sqlx::query(
                "INSERT OR IGNORE INTO employees (id, name, email, job_role_id) VALUES (?, ?, ?, ?)",
            )
            .bind(id)
            .bind(name)
            .bind(email)
            .bind(job_role_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        for (id, description, category_id) in JOBS {
            inserted += sqlx::query(
                "INSERT OR IGNORE INTO jobs (id, description, job_category_id) VALUES (?, ?, ?)",
            )
            .bind(id)
            .bind(description)
            .bind(category_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        for (job_id, employee_id) in ASSIGNMENTS {
            inserted += sqlx::query(
                "INSERT OR IGNORE INTO job_employees (job_id, employee_id) VALUES (?, ?)",
            )
            .bind(job_id)
            .bind(employee_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        for (id, description, job_id, regime_id) in TAX_INFORMATION {
            inserted += sqlx::query(
                "INSERT OR IGNORE INTO tax_information (id, description, job_id, tax_regime_id) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(id)
            .bind(description)
            .bind(job_id)
            .bind(regime_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        info!(stage = "seed", rows = inserted, "reference data seeded");
        Ok(())
    }
}
