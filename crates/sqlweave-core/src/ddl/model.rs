//! Physical table and column metadata for DDL generation.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{DdlError, DdlResult};

/// Referential action for `ON DELETE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnDeleteAction {
    /// `NO ACTION`.
    #[default]
    #[serde(alias = "no_action", alias = "NO ACTION")]
    NoAction,
    /// `RESTRICT`.
    #[serde(alias = "restrict")]
    Restrict,
    /// `CASCADE`.
    #[serde(alias = "cascade")]
    Cascade,
    /// `SET NULL`.
    #[serde(alias = "set_null", alias = "SET NULL")]
    SetNull,
    /// `SET DEFAULT`.
    #[serde(alias = "set_default", alias = "SET DEFAULT")]
    SetDefault,
}

impl OnDeleteAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// The table and column a foreign key points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyTarget {
    /// Parent table.
    pub table: String,
    /// Parent column.
    #[serde(default = "default_fk_column")]
    pub column: String,
    /// `ON DELETE` action.
    #[serde(default)]
    pub on_delete: OnDeleteAction,
}

fn default_fk_column() -> String {
    "id".to_string()
}

const fn default_true() -> bool {
    true
}

/// One physical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name.
    pub name: String,
    /// SQL type as written, e.g. `BIGINT` or `VARCHAR(255)`.
    pub sql_type: String,
    /// Part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Auto-incremented by the database.
    #[serde(default)]
    pub auto_increment: bool,
    /// Accepts NULL.
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Default value text, with or without a leading `DEFAULT`.
    #[serde(default)]
    pub default_value: Option<String>,
    /// Foreign key target.
    #[serde(default)]
    pub foreign_key: Option<ForeignKeyTarget>,
    /// Gets a plain index.
    #[serde(default)]
    pub index: bool,
    /// Gets a unique index.
    #[serde(default)]
    pub unique: bool,
    /// Holds a UUID v7 text key, enforced by a CHECK on the version digit.
    #[serde(default)]
    pub uuid_v7: bool,
}

impl ColumnMetadata {
    /// Creates a nullable column with no flags.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            primary_key: false,
            auto_increment: false,
            nullable: true,
            default_value: None,
            foreign_key: None,
            index: false,
            unique: false,
            uuid_v7: false,
        }
    }

    /// Marks the column as part of the primary key (and NOT NULL).
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Marks the column as auto-incremented.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Marks the column as NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Makes the column a foreign key.
    #[must_use]
    pub fn references(
        mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        on_delete: OnDeleteAction,
    ) -> Self {
        self.foreign_key = Some(ForeignKeyTarget {
            table: table.into(),
            column: column.into(),
            on_delete,
        });
        self
    }

    /// Requests a plain index.
    #[must_use]
    pub const fn indexed(mut self) -> Self {
        self.index = true;
        self
    }

    /// Requests a unique index.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the column as a UUID v7 key.
    #[must_use]
    pub const fn uuid_v7(mut self) -> Self {
        self.uuid_v7 = true;
        self
    }

    /// Returns whether the column is a foreign key.
    #[must_use]
    pub const fn is_foreign_key(&self) -> bool {
        self.foreign_key.is_some()
    }

    /// Returns the upper-case base type, without length or precision.
    #[must_use]
    pub fn base_type(&self) -> String {
        self.sql_type
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_uppercase()
    }

    /// Returns the `DEFAULT ...` clause, if one applies.
    ///
    /// Auto-incremented primary keys never get one. A value already
    /// starting with `DEFAULT` is used as is.
    #[must_use]
    pub fn default_clause(&self) -> Option<String> {
        if self.primary_key && self.auto_increment {
            return None;
        }
        let value = self.default_value.as_deref()?.trim();
        if value.is_empty() {
            return None;
        }
        if has_default_keyword(value) {
            Some(value.to_string())
        } else {
            Some(format!("DEFAULT {value}"))
        }
    }

    /// Checks the column for internal consistency.
    ///
    /// # Errors
    ///
    /// [`DdlError::InvalidColumn`] for auto-increment on a non-integer or
    /// foreign key column, or a UUID v7 column outside the primary key;
    /// [`DdlError::InvalidDefault`] for a default that does not parse as
    /// the column's numeric, boolean, date or timestamp type.
    pub fn validate(&self, table: &str) -> DdlResult<()> {
        if self.uuid_v7 && !self.primary_key {
            return Err(self.invalid(table, "a UUID v7 column must be part of the primary key"));
        }
        if self.uuid_v7 && self.auto_increment {
            return Err(self.invalid(table, "a UUID v7 column cannot be auto-incremented"));
        }
        if self.auto_increment && self.is_foreign_key() {
            return Err(self.invalid(table, "a foreign key column cannot be auto-incremented"));
        }
        if self.auto_increment && !is_integer_type(&self.base_type()) {
            return Err(self.invalid(
                table,
                &format!("auto-increment requires an integer type, found {}", self.sql_type),
            ));
        }
        if self.primary_key && self.auto_increment {
            return Ok(());
        }

        let Some(raw) = self.default_value.as_deref() else {
            return Ok(());
        };
        let stripped = strip_default_keyword(raw.trim());
        let value = stripped.trim_matches('\'');
        if value.is_empty() || value.eq_ignore_ascii_case("NULL") {
            return Ok(());
        }
        let quoted = value.len() != stripped.len();

        let base = self.base_type();
        let valid = if is_integer_type(&base) {
            is_integer_literal(value)
        } else if is_decimal_type(&base) {
            value.parse::<f64>().is_ok()
        } else if is_boolean_type(&base) {
            matches!(
                value.to_ascii_lowercase().as_str(),
                "true" | "false" | "0" | "1"
            )
        } else if is_date_type(&base) {
            (!quoted && is_sql_expression(value))
                || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        } else if is_timestamp_type(&base) {
            (!quoted && is_sql_expression(value)) || is_timestamp_literal(value)
        } else {
            true
        };

        if valid {
            Ok(())
        } else {
            Err(DdlError::InvalidDefault {
                table: table.to_string(),
                column: self.name.clone(),
                value: raw.to_string(),
                sql_type: self.sql_type.clone(),
            })
        }
    }

    fn invalid(&self, table: &str, reason: &str) -> DdlError {
        DdlError::InvalidColumn {
            table: table.to_string(),
            column: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}

/// One physical table; columns keep declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Table name.
    pub table_name: String,
    /// Columns in declaration order.
    #[serde(default)]
    pub columns: Vec<ColumnMetadata>,
}

impl TableMetadata {
    /// Creates a table with no columns.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: ColumnMetadata) -> Self {
        self.columns.push(column);
        self
    }

    /// Returns the primary key columns.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &ColumnMetadata> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    /// Returns the SQL types of the primary key columns.
    #[must_use]
    pub fn primary_key_types(&self) -> Vec<String> {
        self.primary_key_columns()
            .map(|c| c.sql_type.clone())
            .filter(|t| !t.trim().is_empty())
            .collect()
    }

    /// Validates every column.
    ///
    /// # Errors
    ///
    /// Returns the first column error found.
    pub fn validate(&self) -> DdlResult<()> {
        self.columns
            .iter()
            .try_for_each(|c| c.validate(&self.table_name))
    }
}

fn has_default_keyword(value: &str) -> bool {
    value
        .get(..8)
        .is_some_and(|head| head.eq_ignore_ascii_case("DEFAULT "))
}

fn strip_default_keyword(value: &str) -> &str {
    if has_default_keyword(value) {
        value[8..].trim()
    } else {
        value
    }
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Returns whether an upper-case base type is an integer type.
#[must_use]
pub fn is_integer_type(base: &str) -> bool {
    matches!(
        base,
        "INT"
            | "INTEGER"
            | "BIGINT"
            | "SMALLINT"
            | "TINYINT"
            | "MEDIUMINT"
            | "INT2"
            | "INT4"
            | "INT8"
            | "SERIAL"
            | "BIGSERIAL"
            | "SMALLSERIAL"
    )
}

fn is_decimal_type(base: &str) -> bool {
    matches!(
        base,
        "DECIMAL" | "NUMERIC" | "FLOAT" | "DOUBLE" | "DOUBLE PRECISION" | "REAL"
    )
}

fn is_boolean_type(base: &str) -> bool {
    matches!(base, "BOOLEAN" | "BOOL")
}

fn is_date_type(base: &str) -> bool {
    base == "DATE"
}

fn is_timestamp_type(base: &str) -> bool {
    matches!(
        base,
        "DATETIME" | "TIMESTAMP" | "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE"
            | "TIMESTAMP WITHOUT TIME ZONE"
    )
}

/// `CURRENT_TIMESTAMP`, `NOW()` and other unquoted SQL expressions.
fn is_sql_expression(value: &str) -> bool {
    value.starts_with(|c: char| c.is_ascii_alphabetic())
}

fn is_timestamp_literal(value: &str) -> bool {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(value, format).is_ok())
        || DateTime::parse_from_rfc3339(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_clause() {
        let col = ColumnMetadata::new("count", "INTEGER").default_value("0");
        assert_eq!(col.default_clause().as_deref(), Some("DEFAULT 0"));

        let col = ColumnMetadata::new("count", "INTEGER").default_value("default 0");
        assert_eq!(col.default_clause().as_deref(), Some("default 0"));

        let col = ColumnMetadata::new("id", "BIGINT")
            .primary_key()
            .auto_increment()
            .default_value("1");
        assert_eq!(col.default_clause(), None);

        let col = ColumnMetadata::new("name", "TEXT").default_value("  ");
        assert_eq!(col.default_clause(), None);
    }

    #[test]
    fn test_validate_auto_increment() {
        let col = ColumnMetadata::new("id", "VARCHAR(36)").primary_key().auto_increment();
        assert!(matches!(
            col.validate("users"),
            Err(DdlError::InvalidColumn { .. })
        ));

        let col = ColumnMetadata::new("user_id", "BIGINT")
            .auto_increment()
            .references("users", "id", OnDeleteAction::Cascade);
        assert!(col.validate("orders").is_err());

        let col = ColumnMetadata::new("id", "bigint").primary_key().auto_increment();
        assert!(col.validate("users").is_ok());
    }

    #[test]
    fn test_validate_defaults() {
        let ok = [
            ("INTEGER", "0"),
            ("BIGINT", "DEFAULT -5"),
            ("DECIMAL(10,2)", "1.25"),
            ("BOOLEAN", "false"),
            ("VARCHAR(20)", "'hello'"),
            ("INTEGER", "NULL"),
            ("DATE", "'2024-02-29'"),
            ("DATE", "CURRENT_DATE"),
            ("TIMESTAMP", "'2024-01-01T10:30:00'"),
            ("TIMESTAMP(3)", "'2024-01-01 10:30:00.250'"),
            ("TIMESTAMPTZ", "'2024-01-01T10:30:00+09:00'"),
            ("DATETIME", "DEFAULT CURRENT_TIMESTAMP"),
        ];
        for (ty, value) in ok {
            let col = ColumnMetadata::new("c", ty).default_value(value);
            assert!(col.validate("t").is_ok(), "{ty} {value}");
        }

        let bad = [
            ("INTEGER", "2L"),
            ("INTEGER", "2.0"),
            ("BOOLEAN", "yes"),
            ("NUMERIC", "abc"),
            ("DATE", "'2024-13-01'"),
            ("DATE", "'yesterday'"),
            ("TIMESTAMP", "'2024-01-01 25:00:00'"),
            ("DATETIME", "'01/02/2024'"),
        ];
        for (ty, value) in bad {
            let col = ColumnMetadata::new("c", ty).default_value(value);
            assert!(
                matches!(col.validate("t"), Err(DdlError::InvalidDefault { .. })),
                "{ty} {value}"
            );
        }
    }

    #[test]
    fn test_validate_uuid_v7() {
        let col = ColumnMetadata::new("id", "CHAR(36)").primary_key().uuid_v7();
        assert!(col.validate("events").is_ok());

        let col = ColumnMetadata::new("ref", "CHAR(36)").uuid_v7();
        assert!(matches!(
            col.validate("events"),
            Err(DdlError::InvalidColumn { .. })
        ));
    }

    #[test]
    fn test_primary_key_types() {
        let table = TableMetadata::new("users")
            .column(ColumnMetadata::new("id", "BIGINT").primary_key())
            .column(ColumnMetadata::new("name", "TEXT"));
        assert_eq!(table.primary_key_types(), vec!["BIGINT".to_string()]);
    }

    #[test]
    fn test_deserialize_column_defaults() {
        let json = r#"{
            "name": "user_id",
            "sql_type": "BIGINT",
            "foreign_key": { "table": "users", "on_delete": "CASCADE" }
        }"#;
        let col: ColumnMetadata = serde_json::from_str(json).unwrap();
        assert!(col.nullable);
        assert!(col.is_foreign_key());
        let fk = col.foreign_key.unwrap();
        assert_eq!(fk.column, "id");
        assert_eq!(fk.on_delete, OnDeleteAction::Cascade);
    }
}
