//! Batch generation on top of `sqlweave-core`.
//!
//! `sqlweave-migrate` reads JSON input documents, compiles every query unit
//! against the entity registry, writes the results as a mapper document and
//! generates (and optionally executes) the DDL script for the table batch.
//!
//! # Architecture
//!
//! - **Config** - Policy, dialect and connection parameters from key/value options
//! - **Input** - Entities, tables and queries documents
//! - **Pass** - Compiles every unit; a failing unit does not stop the others
//! - **Mapper** - Renders compiled units as an XML mapper document
//! - **Executor** - Runs the DDL script against PostgreSQL or MySQL
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use sqlweave_migrate::prelude::*;
//! use sqlweave_core::DslStatement;
//!
//! let registry = build_registry(&[EntityDoc {
//!     entity: "Users".into(),
//!     table: "users".into(),
//!     fields: vec![],
//!     relations: vec![],
//! }]);
//! let config = GeneratorConfig::from_options(&HashMap::new()).unwrap();
//! let queries = vec![QueryDoc {
//!     name: "findAll".into(),
//!     entity: "Users".into(),
//!     statements: vec![DslStatement::new("from", ["Users"])],
//! }];
//!
//! let report = GenerationPass::new(&registry, &config).run(&queries, &[]);
//! assert!(report.is_complete());
//! let xml = MapperWriter::new("app.UserMapper").render(&report.units);
//! assert!(xml.contains("<select id=\"findAll\""));
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Compile queries into a mapper document
//! sqlweave compile --entities entities.json --queries queries.json --out UserMapper.xml
//!
//! # Print the DDL script for a table batch
//! sqlweave ddl --tables tables.json -o auto=CREATE -o dbType=mysql
//!
//! # Drop, recreate and execute against a live database
//! sqlweave ddl --tables tables.json -o auto=DROP_N_CREATE_EXE \
//!     --url postgres://localhost:5432/shop --username app
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod input;
pub mod mapper;
pub mod pass;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{ConnectionParams, DbType, GeneratorConfig};
    pub use crate::error::{GenerateError, Result};
    pub use crate::executor::ScriptExecutor;
    pub use crate::input::{
        build_registry, load_queries, load_registry, load_tables, EntityDoc, FieldDoc, QueryDoc,
        RelationDoc,
    };
    pub use crate::mapper::MapperWriter;
    pub use crate::pass::{CompiledUnit, GenerationPass, GenerationReport};
}
