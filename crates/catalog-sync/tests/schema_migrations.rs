//! Migration guard
//!
//! Migration names must be unique and follow `mYYYYMMDD_NNNNNN_description`,
//! and applying them must produce the three engine tables.

mod common;

use std::collections::HashSet;

use sea_orm::{ConnectionTrait, Statement};
use sea_orm_migration::MigratorTrait;

use catalog_sync::database::migrations::Migrator;
use common::create_test_database;

#[test]
fn migration_names_are_unique_and_well_formed() {
    let mut seen = HashSet::new();
    let mut problems = Vec::new();

    for migration in Migrator::migrations() {
        let name = migration.name().to_string();
        if !is_valid_migration_name(&name) {
            problems.push(format!("badly formed: {name}"));
        }
        if !seen.insert(name.clone()) {
            problems.push(format!("duplicate: {name}"));
        }
    }

    assert!(problems.is_empty(), "Migration naming guard failed: {problems:?}");
}

fn is_valid_migration_name(name: &str) -> bool {
    let Some(rest) = name.strip_prefix('m') else {
        return false;
    };
    let mut parts = rest.splitn(3, '_');
    let (Some(date), Some(sequence), Some(description)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    date.len() == 8
        && date.chars().all(|c| c.is_ascii_digit())
        && sequence.len() == 6
        && sequence.chars().all(|c| c.is_ascii_digit())
        && !description.is_empty()
        && description
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[tokio::test]
async fn migrations_create_engine_tables() {
    let database = create_test_database().await;
    let connection = database.connection();

    let rows = connection
        .query_all(Statement::from_string(
            connection.get_database_backend(),
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        ))
        .await
        .unwrap();
    let tables: Vec<String> = rows
        .iter()
        .map(|row| row.try_get::<String>("", "name").unwrap())
        .collect();

    for expected in ["integrations", "executions", "execution_responses"] {
        assert!(
            tables.iter().any(|t| t == expected),
            "missing table {expected}, found {tables:?}"
        );
    }

    // Re-running is a no-op
    database.migrate().await.unwrap();
}
