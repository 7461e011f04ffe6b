//! DDL script generation from table metadata.
//!
//! Given a batch of [`TableMetadata`], [`DdlScriptBuilder`] emits an
//! idempotent script for one [`SqlDialect`]:
//!
//! 1. tables, optionally dropped first;
//! 2. missing columns, unless tables were dropped;
//! 3. foreign key columns and constraints;
//! 4. plain and unique indexes.

mod dialect;
mod foreign_key;
mod model;
mod policy;
mod script;

pub use dialect::{
    dialect_for, foreign_key_name, index_name, parent_key_type, MySqlDialect, PostgresDialect,
    SqlDialect,
};
pub use foreign_key::ForeignKeyGenerator;
pub use model::{is_integer_type, ColumnMetadata, ForeignKeyTarget, OnDeleteAction, TableMetadata};
pub use policy::DdlPolicy;
pub use script::{DdlScript, DdlScriptBuilder, ScriptSection};
