//! # sqlweave-core
//!
//! Compiles an entity-oriented statement DSL into SQL, and table metadata
//! into idempotent DDL migration scripts.
//!
//! This crate provides:
//! - An entity metadata registry, filled once and read by every compilation
//! - A query compiler turning `(command, args)` statement lists into
//!   SELECT/INSERT/UPDATE/DELETE text, with joins, nested condition groups
//!   and EXISTS sub-queries
//! - A DDL script builder with PostgreSQL and MySQL dialects
//!
//! ## Compiling a query
//!
//! ```rust
//! use sqlweave_core::{DslStatement, EntityMeta, EntityRegistry, FieldType, QueryCompiler};
//!
//! let mut registry = EntityRegistry::new();
//! registry.register_meta(
//!     "Users",
//!     EntityMeta::new("users").field_type("name", FieldType::String),
//! );
//!
//! let statements = vec![
//!     DslStatement::new("insertInto", ["Users"]),
//!     DslStatement::new("value", ["Users::getName", "\"Alice\""]),
//! ];
//! let query = QueryCompiler::new(&registry).compile(&statements, "Users").unwrap();
//! assert_eq!(query.sql, "INSERT INTO users (name)\nVALUES ('Alice')");
//! ```
//!
//! ## Generating DDL
//!
//! ```rust
//! use sqlweave_core::ddl::{ColumnMetadata, DdlPolicy, DdlScriptBuilder, PostgresDialect, TableMetadata};
//!
//! let users = TableMetadata::new("users")
//!     .column(ColumnMetadata::new("id", "BIGINT").primary_key().auto_increment())
//!     .column(ColumnMetadata::new("name", "VARCHAR(255)"));
//!
//! let script = DdlScriptBuilder::new(&PostgresDialect, DdlPolicy::Create)
//!     .build(&[users])
//!     .unwrap();
//! assert!(script.plain().contains("CREATE TABLE IF NOT EXISTS users"));
//! ```

pub mod ddl;
pub mod error;
pub mod metadata;
pub mod query;
pub mod statement;

pub use error::{CompileError, DdlError, DdlResult, Result};
pub use metadata::{EntityMeta, EntityRegistry, FieldType, Relation, TypeClass};
pub use query::{CompiledQuery, MapJoin, MapJoinKind, QueryCompiler, StatementKind};
pub use statement::{Command, DslStatement, StatementTree};
