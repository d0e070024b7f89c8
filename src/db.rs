use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use crate::migration::Migrator;

/// Create a SeaORM connection.
pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url);
    // An in-memory SQLite database lives and dies with its connection.
    if database_url.starts_with("sqlite::memory:") {
        options.max_connections(1).min_connections(1);
    }
    let conn = Database::connect(options).await?;
    Ok(conn)
}

/// Apply every pending schema migration.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    Migrator::up(conn, None).await?;
    Ok(())
}

/// True when the store rejected a write because of a unique constraint.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Prefixed random identifier, e.g. `order_3f2a9c01bd`.
pub fn generate_id(prefix: &str, len: usize) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    let len = len.min(hex.len());
    format!("{prefix}_{}", &hex[..len])
}

#[cfg(test)]
mod tests {
    use super::generate_id;

    #[test]
    fn generated_ids_carry_prefix_and_length() {
        let id = generate_id("order", 10);
        assert!(id.starts_with("order_"));
        assert_eq!(id.len(), "order_".len() + 10);
        assert_ne!(id, generate_id("order", 10));
    }
}
