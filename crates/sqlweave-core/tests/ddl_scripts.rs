//! Integration tests for DDL script generation.
//!
//! These tests build a small `users`/`orders` schema, render it through
//! both dialects under each policy, and check statement order and shape.

mod common;
use common::normalize;

use sqlweave_core::ddl::{
    ColumnMetadata, DdlPolicy, DdlScriptBuilder, MySqlDialect, OnDeleteAction, PostgresDialect,
    SqlDialect, TableMetadata,
};
use sqlweave_core::DdlError;

fn schema() -> Vec<TableMetadata> {
    vec![
        TableMetadata::new("orders")
            .column(ColumnMetadata::new("id", "BIGINT").primary_key().auto_increment())
            .column(ColumnMetadata::new("status", "VARCHAR(32)").not_null().default_value("'NEW'"))
            .column(ColumnMetadata::new("total", "DECIMAL(10,2)").default_value("0"))
            .column(
                ColumnMetadata::new("user_id", "BIGINT")
                    .references("users", "id", OnDeleteAction::Cascade)
                    .indexed(),
            ),
        TableMetadata::new("users")
            .column(ColumnMetadata::new("id", "BIGINT").primary_key().auto_increment())
            .column(ColumnMetadata::new("email", "VARCHAR(255)").not_null().unique())
            .column(ColumnMetadata::new("login_count", "INTEGER").default_value("0")),
    ]
}

fn build(dialect: &dyn SqlDialect, policy: DdlPolicy) -> String {
    DdlScriptBuilder::new(dialect, policy)
        .build(&schema())
        .unwrap_or_else(|e| panic!("Failed to build script: {e}"))
        .plain()
}

// =============================================================================
// Policies
// =============================================================================

#[test]
fn create_policy_adds_missing_columns_without_dropping() {
    let sql = build(&PostgresDialect, DdlPolicy::Create);
    assert!(!sql.contains("DROP TABLE"));
    assert!(sql.contains("ALTER TABLE users ADD COLUMN IF NOT EXISTS login_count INTEGER DEFAULT 0;"));
    assert!(sql.contains("/* --- 2. UPDATE COLUMNS (If Not Exists) --- */"));
}

#[test]
fn drop_policy_drops_before_creating() {
    let sql = build(&PostgresDialect, DdlPolicy::DropAndCreate);
    let drop = sql.find("DROP TABLE IF EXISTS users CASCADE;");
    let create = sql.find("CREATE TABLE IF NOT EXISTS users");
    assert!(drop.is_some() && create.is_some());
    assert!(drop < create);
    assert!(!sql.contains("ADD COLUMN IF NOT EXISTS login_count"));
}

#[test]
fn sections_run_in_order() {
    let sql = build(&MySqlDialect, DdlPolicy::Create);
    let positions: Vec<usize> = [
        "1. TABLES (DROP & CREATE)",
        "2. UPDATE COLUMNS (If Not Exists)",
        "3. FOREIGN KEYS",
        "4. INDEXES",
    ]
    .iter()
    .map(|title| sql.find(title).unwrap_or_else(|| panic!("missing section {title}")))
    .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

// =============================================================================
// Column rendering
// =============================================================================

#[test]
fn defaults_render_with_keyword() {
    let sql = build(&PostgresDialect, DdlPolicy::Create);
    assert!(sql.contains("login_count INTEGER DEFAULT 0"));
    assert!(sql.contains("status VARCHAR(32) NOT NULL DEFAULT 'NEW'"));
    assert!(sql.contains("id BIGSERIAL NOT NULL,"));
    assert!(!sql.contains("BIGSERIAL NOT NULL DEFAULT"));
}

#[test]
fn postgres_create_table_shape() {
    let sql = build(&PostgresDialect, DdlPolicy::Create);
    assert!(normalize(&sql).contains(
        "CREATE TABLE IF NOT EXISTS users ( id BIGSERIAL NOT NULL, \
         email VARCHAR(255) NOT NULL, login_count INTEGER DEFAULT 0, PRIMARY KEY (id) );"
    ));
}

#[test]
fn mysql_create_table_shape() {
    let sql = build(&MySqlDialect, DdlPolicy::Create);
    assert!(normalize(&sql).contains(
        "CREATE TABLE IF NOT EXISTS users ( id BIGINT NOT NULL AUTO_INCREMENT, \
         email VARCHAR(255) NOT NULL, login_count INTEGER DEFAULT 0, PRIMARY KEY (id) ) \
         ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;"
    ));
}

// =============================================================================
// Foreign keys and indexes
// =============================================================================

#[test]
fn foreign_key_column_takes_parent_key_type() {
    let sql = build(&PostgresDialect, DdlPolicy::Create);
    assert!(sql.contains("ALTER TABLE orders ADD COLUMN IF NOT EXISTS user_id BIGINT;"));
    assert!(sql.contains(
        "ALTER TABLE orders ADD CONSTRAINT fk_orders_user_id FOREIGN KEY (user_id) \
         REFERENCES users (id) ON DELETE CASCADE;"
    ));
    let create_orders = sql.find("CREATE TABLE IF NOT EXISTS orders").unwrap_or_default();
    let create_block = &sql[create_orders..];
    let end = create_block.find(';').unwrap_or(create_block.len());
    assert!(!create_block[..end].contains("user_id"));
}

#[test]
fn indexes_are_named_by_kind() {
    let sql = build(&PostgresDialect, DdlPolicy::Create);
    assert!(sql.contains("CREATE UNIQUE INDEX IF NOT EXISTS uk_users_email ON users (email);"));
    assert!(sql.contains("CREATE INDEX IF NOT EXISTS idx_orders_user_id ON orders (user_id);"));
}

#[test]
fn missing_parent_aborts_the_script() {
    let tables = vec![TableMetadata::new("orders")
        .column(ColumnMetadata::new("id", "BIGINT").primary_key())
        .column(ColumnMetadata::new("shop_id", "BIGINT").references(
            "shops",
            "id",
            OnDeleteAction::NoAction,
        ))];
    let err = DdlScriptBuilder::new(&MySqlDialect, DdlPolicy::Create)
        .build(&tables)
        .unwrap_err();
    assert_eq!(
        err,
        DdlError::MissingParentKey {
            table: "orders".to_string(),
            column: "shop_id".to_string(),
            parent: "shops".to_string(),
        }
    );
}

#[test]
fn script_is_deterministic() {
    assert_eq!(
        build(&MySqlDialect, DdlPolicy::Create),
        build(&MySqlDialect, DdlPolicy::Create)
    );
}

#[test]
fn invalid_date_default_aborts_the_script() {
    let tables = vec![TableMetadata::new("events")
        .column(ColumnMetadata::new("id", "CHAR(36)").primary_key().uuid_v7())
        .column(ColumnMetadata::new("starts_on", "DATE").default_value("'2024-02-30'"))];
    let err = DdlScriptBuilder::new(&PostgresDialect, DdlPolicy::Create)
        .build(&tables)
        .unwrap_err();
    assert!(matches!(err, DdlError::InvalidDefault { ref column, .. } if column == "starts_on"));
}

#[test]
fn uuid_v7_key_gets_a_version_check() {
    let tables = vec![TableMetadata::new("events")
        .column(ColumnMetadata::new("id", "CHAR(36)").primary_key().uuid_v7())
        .column(ColumnMetadata::new("created_at", "DATETIME").default_value("CURRENT_TIMESTAMP"))];
    let sql = DdlScriptBuilder::new(&MySqlDialect, DdlPolicy::Create)
        .build(&tables)
        .unwrap_or_else(|e| panic!("Failed to build script: {e}"))
        .plain();
    assert!(normalize(&sql).contains(
        "id CHAR(36) NOT NULL CONSTRAINT id_v7_chk CHECK (SUBSTRING(id, 15, 1) = '7'), \
         created_at DATETIME DEFAULT CURRENT_TIMESTAMP,"
    ));
}
