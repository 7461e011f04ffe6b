//! Dialect-specific DDL generation.
//!
//! Every statement a dialect emits is idempotent: running the same script
//! twice against the same database leaves it unchanged.

mod mysql;
mod postgres;

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;

use std::collections::HashMap;

use crate::error::{DdlError, DdlResult};

use super::model::{ColumnMetadata, TableMetadata};

/// Trait for dialect-specific DDL generation.
pub trait SqlDialect {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Statements dropping a table if it exists.
    fn drop_table(&self, table: &TableMetadata) -> Vec<String>;

    /// Suffix appended after the closing parenthesis of CREATE TABLE.
    fn table_options(&self) -> &'static str {
        ""
    }

    /// Generates CREATE TABLE IF NOT EXISTS.
    ///
    /// Foreign key columns are left out; they are added by
    /// [`add_foreign_key`](Self::add_foreign_key) once every table exists.
    fn create_table(&self, table: &TableMetadata) -> String {
        let mut defs: Vec<String> = table
            .columns
            .iter()
            .filter(|c| !c.is_foreign_key())
            .map(|c| format!("\t{}", self.column_definition(c)))
            .collect();

        let keys: Vec<&str> = table
            .primary_key_columns()
            .filter(|c| !c.is_foreign_key())
            .map(|c| c.name.as_str())
            .collect();
        if !keys.is_empty() {
            defs.push(format!("\tPRIMARY KEY ({})", keys.join(", ")));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n){}",
            table.table_name,
            defs.join(",\n"),
            self.table_options()
        )
    }

    /// Generates a column definition: name, type, nullability, default.
    fn column_definition(&self, column: &ColumnMetadata) -> String;

    /// Inline CHECK pinning the version digit of a UUID v7 text key.
    fn uuid_v7_check(&self, column: &ColumnMetadata) -> String {
        format!(
            "CONSTRAINT {0}_v7_chk CHECK (SUBSTRING({0}, 15, 1) = '7')",
            column.name
        )
    }

    /// Adds a column only when it is missing.
    fn add_column_if_not_exists(&self, table: &str, column: &ColumnMetadata) -> String;

    /// Adds a foreign key column and its constraint.
    ///
    /// `parent_key_types` maps each table name to its primary key types;
    /// the first one of the parent table types the new column.
    ///
    /// # Errors
    ///
    /// [`DdlError::MissingParentKey`] when the parent has no key type.
    fn add_foreign_key(
        &self,
        table: &str,
        column: &ColumnMetadata,
        parent_key_types: &HashMap<String, Vec<String>>,
    ) -> DdlResult<Vec<String>>;

    /// Creates the plain and unique indexes a table asks for.
    fn create_indexes(&self, table: &TableMetadata) -> Vec<String>;
}

/// Looks up the SQL type of the parent key a foreign key column points at.
///
/// # Errors
///
/// [`DdlError::MissingParentKey`] when the column is not a foreign key,
/// the parent is unknown, or every parent key type is blank.
pub fn parent_key_type(
    table: &str,
    column: &ColumnMetadata,
    parent_key_types: &HashMap<String, Vec<String>>,
) -> DdlResult<String> {
    let parent = column
        .foreign_key
        .as_ref()
        .map(|fk| fk.table.as_str())
        .unwrap_or_default();

    parent_key_types
        .get(parent)
        .and_then(|types| types.iter().find(|t| !t.trim().is_empty()))
        .cloned()
        .ok_or_else(|| DdlError::MissingParentKey {
            table: table.to_string(),
            column: column.name.clone(),
            parent: parent.to_string(),
        })
}

/// Name of the constraint backing a foreign key.
#[must_use]
pub fn foreign_key_name(table: &str, column: &str) -> String {
    format!("fk_{table}_{column}")
}

/// Name of an index; unique indexes use a separate prefix.
#[must_use]
pub fn index_name(table: &str, column: &ColumnMetadata) -> String {
    if column.unique {
        format!("uk_{table}_{}", column.name)
    } else {
        format!("idx_{table}_{}", column.name)
    }
}

/// Returns the dialect registered under `name` (case-insensitive).
#[must_use]
pub fn dialect_for(name: &str) -> Option<&'static dyn SqlDialect> {
    match name.trim().to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" | "pg" => Some(&PostgresDialect),
        "mysql" | "mariadb" => Some(&MySqlDialect),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::model::OnDeleteAction;
    use super::*;

    #[test]
    fn test_parent_key_type() {
        let col = ColumnMetadata::new("user_id", "BIGINT").references(
            "users",
            "id",
            OnDeleteAction::Cascade,
        );
        let mut types = HashMap::new();
        types.insert("users".to_string(), vec![String::new(), "BIGINT".to_string()]);
        assert_eq!(parent_key_type("orders", &col, &types).unwrap(), "BIGINT");

        types.insert("users".to_string(), vec![" ".to_string()]);
        assert_eq!(
            parent_key_type("orders", &col, &types),
            Err(DdlError::MissingParentKey {
                table: "orders".into(),
                column: "user_id".into(),
                parent: "users".into(),
            })
        );
    }

    #[test]
    fn test_names() {
        let col = ColumnMetadata::new("email", "TEXT").unique();
        assert_eq!(index_name("users", &col), "uk_users_email");
        let col = ColumnMetadata::new("email", "TEXT").indexed();
        assert_eq!(index_name("users", &col), "idx_users_email");
        assert_eq!(foreign_key_name("orders", "user_id"), "fk_orders_user_id");
    }

    #[test]
    fn test_dialect_for() {
        assert_eq!(dialect_for("PostgreSQL").map(|d| d.name()), Some("postgres"));
        assert_eq!(dialect_for("mysql").map(|d| d.name()), Some("mysql"));
        assert!(dialect_for("oracle").is_none());
    }
}
