//! MySQL dialect.
//!
//! MySQL has no `IF NOT EXISTS` for columns, constraints or indexes, so each
//! of those is wrapped in a throwaway stored procedure that checks
//! `information_schema` first.

use std::collections::HashMap;

use super::{foreign_key_name, index_name, parent_key_type, SqlDialect};
use crate::ddl::model::{ColumnMetadata, TableMetadata};
use crate::error::DdlResult;

/// MySQL dialect for DDL generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Wraps `statement` in a procedure that runs it only when no row of
/// `information_schema.<view>` matches `checks`.
fn guarded(procedure: &str, view: &str, checks: &[(&str, &str)], statement: &str) -> String {
    let mut sql = format!(
        "DROP PROCEDURE IF EXISTS {procedure};\n\
         CREATE PROCEDURE {procedure}() BEGIN\n\
         \tIF NOT EXISTS (\n\
         \t\tSELECT * FROM information_schema.{view}\n\
         \t\tWHERE TABLE_SCHEMA = DATABASE()\n"
    );
    for (column, value) in checks {
        sql.push_str(&format!("\t\tAND {column} = '{value}'\n"));
    }
    sql.push_str(&format!(
        "\t) THEN\n\
         \t\t{statement};\n\
         \tEND IF;\n\
         END;\n\
         CALL {procedure}();\n\
         DROP PROCEDURE {procedure};"
    ));
    sql
}

impl SqlDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn drop_table(&self, table: &TableMetadata) -> Vec<String> {
        vec![
            "SET FOREIGN_KEY_CHECKS = 0".to_string(),
            format!("DROP TABLE IF EXISTS {}", table.table_name),
            "SET FOREIGN_KEY_CHECKS = 1".to_string(),
        ]
    }

    fn table_options(&self) -> &'static str {
        " ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
    }

    fn column_definition(&self, column: &ColumnMetadata) -> String {
        let mut sql = format!("{} {}", column.name, column.sql_type);
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        if column.auto_increment {
            sql.push_str(" AUTO_INCREMENT");
        } else if let Some(default) = column.default_clause() {
            sql.push(' ');
            sql.push_str(&default);
        }
        if column.uuid_v7 {
            sql.push(' ');
            sql.push_str(&self.uuid_v7_check(column));
        }
        sql
    }

    fn add_column_if_not_exists(&self, table: &str, column: &ColumnMetadata) -> String {
        guarded(
            &format!("AddCol_{table}_{}", column.name),
            "COLUMNS",
            &[("TABLE_NAME", table), ("COLUMN_NAME", &column.name)],
            &format!(
                "ALTER TABLE {table} ADD COLUMN {}",
                self.column_definition(column)
            ),
        )
    }

    fn add_foreign_key(
        &self,
        table: &str,
        column: &ColumnMetadata,
        parent_key_types: &HashMap<String, Vec<String>>,
    ) -> DdlResult<Vec<String>> {
        let parent_type = parent_key_type(table, column, parent_key_types)?;
        let Some(target) = column.foreign_key.as_ref() else {
            return Ok(Vec::new());
        };
        let constraint = foreign_key_name(table, &column.name);

        let add_column = guarded(
            &format!("AddCol_{table}_{}", column.name),
            "COLUMNS",
            &[("TABLE_NAME", table), ("COLUMN_NAME", &column.name)],
            &format!(
                "ALTER TABLE {table} ADD COLUMN {} {}",
                column.name,
                parent_type.trim()
            ),
        );
        let add_constraint = guarded(
            &format!("AddFk_{table}_{}", column.name),
            "TABLE_CONSTRAINTS",
            &[("TABLE_NAME", table), ("CONSTRAINT_NAME", &constraint)],
            &format!(
                "ALTER TABLE {table} ADD CONSTRAINT {constraint} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {}",
                column.name,
                target.table,
                target.column,
                target.on_delete.as_sql()
            ),
        );

        Ok(vec![add_column, add_constraint])
    }

    fn create_indexes(&self, table: &TableMetadata) -> Vec<String> {
        let name = &table.table_name;
        table
            .columns
            .iter()
            .filter(|c| c.index || c.unique)
            .map(|c| {
                let index = index_name(name, c);
                guarded(
                    &format!("AddIdx_{name}_{}", c.name),
                    "STATISTICS",
                    &[("TABLE_NAME", name), ("INDEX_NAME", &index)],
                    &format!(
                        "CREATE {}INDEX {index} ON {name} ({})",
                        if c.unique { "UNIQUE " } else { "" },
                        c.name
                    ),
                )
            })
            .collect()
    }
}
