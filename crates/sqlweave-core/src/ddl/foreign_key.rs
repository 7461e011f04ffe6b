//! Foreign key statements for a batch of tables.

use std::collections::HashMap;

use tracing::debug;

use super::dialect::SqlDialect;
use super::model::TableMetadata;
use crate::error::{DdlError, DdlResult};

/// Emits the foreign key columns and constraints of a batch of tables.
///
/// Parent key types are looked up within the batch, so a foreign key may
/// only point at a table generated alongside it.
pub struct ForeignKeyGenerator<'a> {
    dialect: &'a dyn SqlDialect,
    tables: &'a [TableMetadata],
    key_types: HashMap<String, Vec<String>>,
}

impl<'a> ForeignKeyGenerator<'a> {
    /// Indexes the primary key types of every table in the batch.
    ///
    /// When two tables share a name the first one wins.
    #[must_use]
    pub fn new(dialect: &'a dyn SqlDialect, tables: &'a [TableMetadata]) -> Self {
        let mut key_types: HashMap<String, Vec<String>> = HashMap::new();
        for table in tables {
            key_types
                .entry(table.table_name.clone())
                .or_insert_with(|| table.primary_key_types());
        }
        Self {
            dialect,
            tables,
            key_types,
        }
    }

    /// Returns the statements for every foreign key column, in table then
    /// column order.
    ///
    /// # Errors
    ///
    /// [`DdlError::MissingParentKey`] when a parent table is not part of the
    /// batch or has no primary key.
    pub fn generate(&self) -> DdlResult<Vec<String>> {
        let mut statements = Vec::new();
        for table in self.tables {
            for column in table.columns.iter().filter(|c| c.is_foreign_key()) {
                let parent = column
                    .foreign_key
                    .as_ref()
                    .map(|fk| fk.table.as_str())
                    .unwrap_or_default();
                if self.key_types.get(parent).is_none_or(Vec::is_empty) {
                    return Err(DdlError::MissingParentKey {
                        table: table.table_name.clone(),
                        column: column.name.clone(),
                        parent: parent.to_string(),
                    });
                }
                debug!(
                    table = %table.table_name,
                    column = %column.name,
                    parent,
                    "Generating foreign key"
                );
                statements.extend(self.dialect.add_foreign_key(
                    &table.table_name,
                    column,
                    &self.key_types,
                )?);
            }
        }
        Ok(statements)
    }
}
