//! Error types for query compilation and DDL generation.

/// Errors raised while compiling a statement list into SQL.
///
/// Every variant aborts the compilation unit it was raised in. Callers
/// that compile many units in one pass are expected to collect these and
/// carry on with the remaining units.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// A `...Group` statement was never closed by `endGroup`.
    #[error("Group opened by '{command}' is never closed by endGroup")]
    UnclosedGroup {
        /// The command that opened the group.
        command: String,
    },

    /// An `endGroup` statement without a matching opener.
    #[error("endGroup at statement {index} has no matching group opener")]
    UnmatchedEndGroup {
        /// Position of the stray `endGroup` in its statement list.
        index: usize,
    },

    /// The left-hand join column does not belong to the joined table.
    #[error(
        "Join target '{target}' does not own left-hand column '{left_column}' (owned by '{owner}'); \
         the first join column must belong to the joined table"
    )]
    JoinTargetMismatch {
        /// Table being joined.
        target: String,
        /// The left-hand column as written.
        left_column: String,
        /// Table the left-hand column resolved to.
        owner: String,
    },

    /// A condition compares a field against a literal of another type.
    #[error(
        "Type mismatch on {entity}.{field}: declared {declared}, compared against {literal} literal"
    )]
    TypeMismatch {
        /// Entity owning the field.
        entity: String,
        /// Field name.
        field: String,
        /// Declared field type class.
        declared: String,
        /// Classified literal type.
        literal: String,
    },

    /// A statement is missing a positional argument it requires.
    #[error("'{command}' requires an argument at position {position}")]
    MissingArgument {
        /// The statement command.
        command: String,
        /// Zero-based argument position.
        position: usize,
    },
}

/// Errors raised while generating a DDL script.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DdlError {
    /// A foreign key points at a table with no discoverable key type.
    #[error(
        "Foreign key {table}.{column} references '{parent}', which has no discoverable primary key type"
    )]
    MissingParentKey {
        /// Referencing table.
        table: String,
        /// Foreign key column.
        column: String,
        /// Referenced (parent) table.
        parent: String,
    },

    /// A column definition is internally inconsistent.
    #[error("Invalid column {table}.{column}: {reason}")]
    InvalidColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A default value does not fit the column type.
    #[error("Default value '{value}' of {table}.{column} does not match type {sql_type}")]
    InvalidDefault {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// The offending default.
        value: String,
        /// Declared SQL type.
        sql_type: String,
    },
}

/// Result type for query compilation.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Result type for DDL generation.
pub type DdlResult<T> = std::result::Result<T, DdlError>;
