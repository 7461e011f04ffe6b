#![allow(dead_code)]

use sqlweave_core::{
    CompileError, CompiledQuery, DslStatement, EntityMeta, EntityRegistry, FieldType,
    QueryCompiler,
};

/// A registry with `Users` and `Orders`, where a user has many orders.
pub fn registry() -> EntityRegistry {
    let mut registry = EntityRegistry::new();
    registry.register_meta(
        "Users",
        EntityMeta::new("users")
            .field_type("id", FieldType::Long)
            .field_type("name", FieldType::String)
            .field_type("active", FieldType::Boolean)
            .relation("orders", "Orders", true),
    );
    registry.register_meta(
        "Orders",
        EntityMeta::new("orders")
            .field_type("id", FieldType::Long)
            .field_type("userId", FieldType::Fk)
            .field_type("status", FieldType::String)
            .field_type("total", FieldType::Double)
            .relation("user", "Users", false),
    );
    registry
}

pub fn stmt(command: &str, args: &[&str]) -> DslStatement {
    DslStatement::new(command, args.iter().copied())
}

pub fn compile(statements: &[DslStatement], main_entity: &str) -> CompiledQuery {
    let registry = registry();
    QueryCompiler::new(&registry)
        .compile(statements, main_entity)
        .unwrap_or_else(|e| panic!("Failed to compile: {e}"))
}

pub fn compile_err(statements: &[DslStatement], main_entity: &str) -> CompileError {
    let registry = registry();
    QueryCompiler::new(&registry)
        .compile(statements, main_entity)
        .expect_err("Expected a compile error")
}

/// Collapses every whitespace run to one space.
pub fn normalize(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}
