use jobdesk_storage::Database;

/// Fresh migrated in-memory database, optionally loaded with the reference dataset.
pub async fn database(seed: bool) -> Database {
    let database = Database::connect("sqlite::memory:")
        .await
        .expect("connect");
    database.run_migrations().await.expect("migrations");
    if seed {
        database.seed_reference_data().await.expect("seed");
    }
    database
}
