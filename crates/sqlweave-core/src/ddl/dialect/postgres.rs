//! PostgreSQL dialect.

use std::collections::HashMap;

use super::{foreign_key_name, index_name, parent_key_type, SqlDialect};
use crate::ddl::model::{ColumnMetadata, TableMetadata};
use crate::error::DdlResult;

/// PostgreSQL dialect for DDL generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Maps an auto-incremented integer type to its SERIAL pseudo-type.
    fn serial_type(column: &ColumnMetadata) -> String {
        match column.base_type().as_str() {
            "BIGINT" | "INT8" => "BIGSERIAL".to_string(),
            "INT" | "INTEGER" | "INT4" => "SERIAL".to_string(),
            "SMALLINT" | "INT2" => "SMALLSERIAL".to_string(),
            _ => column.sql_type.clone(),
        }
    }

    /// SERIAL pseudo-types cannot type a referencing column.
    fn referencing_type(parent_type: &str) -> String {
        match parent_type.trim().to_ascii_uppercase().as_str() {
            "BIGSERIAL" | "SERIAL8" => "BIGINT".to_string(),
            "SERIAL" | "SERIAL4" => "INTEGER".to_string(),
            "SMALLSERIAL" | "SERIAL2" => "SMALLINT".to_string(),
            _ => parent_type.trim().to_string(),
        }
    }
}

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn drop_table(&self, table: &TableMetadata) -> Vec<String> {
        vec![format!("DROP TABLE IF EXISTS {} CASCADE", table.table_name)]
    }

    fn column_definition(&self, column: &ColumnMetadata) -> String {
        let data_type = if column.auto_increment {
            Self::serial_type(column)
        } else {
            column.sql_type.clone()
        };

        let mut sql = format!("{} {data_type}", column.name);
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = column.default_clause() {
            sql.push(' ');
            sql.push_str(&default);
        }
        if column.uuid_v7 {
            sql.push(' ');
            sql.push_str(&self.uuid_v7_check(column));
        }
        sql
    }

    fn uuid_v7_check(&self, column: &ColumnMetadata) -> String {
        format!(
            "CONSTRAINT {0}_v7_chk CHECK (SUBSTRING({0}::text, 15, 1) = '7')",
            column.name
        )
    }

    fn add_column_if_not_exists(&self, table: &str, column: &ColumnMetadata) -> String {
        format!(
            "ALTER TABLE {table} ADD COLUMN IF NOT EXISTS {}",
            self.column_definition(column)
        )
    }

    fn add_foreign_key(
        &self,
        table: &str,
        column: &ColumnMetadata,
        parent_key_types: &HashMap<String, Vec<String>>,
    ) -> DdlResult<Vec<String>> {
        let parent_type = Self::referencing_type(&parent_key_type(table, column, parent_key_types)?);
        let Some(target) = column.foreign_key.as_ref() else {
            return Ok(Vec::new());
        };
        let constraint = foreign_key_name(table, &column.name);

        Ok(vec![
            format!(
                "ALTER TABLE {table} ADD COLUMN IF NOT EXISTS {} {parent_type}",
                column.name
            ),
            format!("ALTER TABLE {table} DROP CONSTRAINT IF EXISTS {constraint}"),
            format!(
                "ALTER TABLE {table} ADD CONSTRAINT {constraint} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {}",
                column.name,
                target.table,
                target.column,
                target.on_delete.as_sql()
            ),
        ])
    }

    fn create_indexes(&self, table: &TableMetadata) -> Vec<String> {
        table
            .columns
            .iter()
            .filter(|c| c.index || c.unique)
            .map(|c| {
                format!(
                    "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
                    if c.unique { "UNIQUE " } else { "" },
                    index_name(&table.table_name, c),
                    table.table_name,
                    c.name
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ddl::model::OnDeleteAction;

    fn users() -> TableMetadata {
        TableMetadata::new("users")
            .column(ColumnMetadata::new("id", "BIGINT").primary_key().auto_increment())
            .column(ColumnMetadata::new("name", "VARCHAR(255)").not_null())
            .column(ColumnMetadata::new("score", "INTEGER").default_value("0"))
            .column(ColumnMetadata::new("email", "TEXT").unique())
            .column(ColumnMetadata::new("city", "TEXT").indexed())
    }

    #[test]
    fn test_create_table_with_serial() {
        let sql = PostgresDialect::new().create_table(&users());
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS users (\n\
             \tid BIGSERIAL NOT NULL,\n\
             \tname VARCHAR(255) NOT NULL,\n\
             \tscore INTEGER DEFAULT 0,\n\
             \temail TEXT,\n\
             \tcity TEXT,\n\
             \tPRIMARY KEY (id)\n\
             )"
        );
    }

    #[test]
    fn test_uuid_v7_check_casts_to_text() {
        let col = ColumnMetadata::new("id", "UUID").primary_key().uuid_v7();
        assert_eq!(
            PostgresDialect::new().column_definition(&col),
            "id UUID NOT NULL CONSTRAINT id_v7_chk CHECK (SUBSTRING(id::text, 15, 1) = '7')"
        );
    }

    #[test]
    fn test_create_table_skips_foreign_keys() {
        let orders = TableMetadata::new("orders")
            .column(ColumnMetadata::new("id", "INTEGER").primary_key().auto_increment())
            .column(ColumnMetadata::new("user_id", "BIGINT").references(
                "users",
                "id",
                OnDeleteAction::Cascade,
            ));
        let sql = PostgresDialect.create_table(&orders);
        assert!(sql.contains("id SERIAL NOT NULL"));
        assert!(!sql.contains("user_id"));
    }

    #[test]
    fn test_add_column_if_not_exists() {
        let col = ColumnMetadata::new("score", "INTEGER").default_value("0");
        assert_eq!(
            PostgresDialect.add_column_if_not_exists("users", &col),
            "ALTER TABLE users ADD COLUMN IF NOT EXISTS score INTEGER DEFAULT 0"
        );
    }

    #[test]
    fn test_add_foreign_key_uses_parent_type() {
        let col = ColumnMetadata::new("user_id", "BIGINT").references(
            "users",
            "id",
            OnDeleteAction::SetNull,
        );
        let mut types = HashMap::new();
        types.insert("users".to_string(), vec!["BIGSERIAL".to_string()]);

        let sql = PostgresDialect.add_foreign_key("orders", &col, &types).unwrap();
        assert_eq!(
            sql,
            vec![
                "ALTER TABLE orders ADD COLUMN IF NOT EXISTS user_id BIGINT".to_string(),
                "ALTER TABLE orders DROP CONSTRAINT IF EXISTS fk_orders_user_id".to_string(),
                "ALTER TABLE orders ADD CONSTRAINT fk_orders_user_id FOREIGN KEY (user_id) \
                 REFERENCES users (id) ON DELETE SET NULL"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_add_foreign_key_missing_parent() {
        let col = ColumnMetadata::new("user_id", "BIGINT").references(
            "users",
            "id",
            OnDeleteAction::Cascade,
        );
        assert!(PostgresDialect
            .add_foreign_key("orders", &col, &HashMap::new())
            .is_err());
    }

    #[test]
    fn test_create_indexes() {
        assert_eq!(
            PostgresDialect.create_indexes(&users()),
            vec![
                "CREATE UNIQUE INDEX IF NOT EXISTS uk_users_email ON users (email)".to_string(),
                "CREATE INDEX IF NOT EXISTS idx_users_city ON users (city)".to_string(),
            ]
        );
    }

    #[test]
    fn test_drop_table() {
        assert_eq!(
            PostgresDialect.drop_table(&users()),
            vec!["DROP TABLE IF EXISTS users CASCADE".to_string()]
        );
    }
}
