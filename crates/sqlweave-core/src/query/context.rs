//! The per-compilation build context.

use std::fmt;

use serde::Serialize;

use super::alias::AliasMap;
use super::operand::{accessor_to_field, clean_entity_name, is_identifier, strip_quotes};
use crate::metadata::EntityRegistry;
use crate::statement::DslStatement;

/// The kind of SQL statement being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    /// `SELECT`.
    #[default]
    Select,
    /// `INSERT`.
    Insert,
    /// `UPDATE`.
    Update,
    /// `DELETE`.
    Delete,
}

impl StatementKind {
    /// Returns the lower-case keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Detects the kind from the first keyword of a SQL text.
    #[must_use]
    pub fn detect(sql: &str) -> Self {
        let first = sql
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        match first.as_str() {
            "INSERT" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            _ => Self::Select,
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result-shape hint recorded by `mapJoin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MapJoinKind {
    /// A single related record.
    Association,
    /// Many related records.
    Collection,
    /// Decided from the relation declaration.
    Auto,
}

impl MapJoinKind {
    fn parse(token: &str) -> Self {
        match strip_quotes(token).to_ascii_lowercase().as_str() {
            "association" | "one" => Self::Association,
            "collection" | "many" => Self::Collection,
            _ => Self::Auto,
        }
    }
}

/// One `mapJoin` record: how a parent field is filled from aliased columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapJoin {
    /// Entity owning the field.
    pub parent_entity: String,
    /// Field on the parent entity.
    pub field: String,
    /// Alias whose columns feed the field.
    pub alias: String,
    /// Related entity, when the relation is declared.
    pub target: Option<String>,
    /// Requested shape.
    pub kind: MapJoinKind,
    /// Collection flag from the relation declaration.
    #[serde(skip)]
    declared_collection: Option<bool>,
}

impl MapJoin {
    /// Reads `mapJoin(Entity::getField[, alias[, kind]])`.
    ///
    /// Without an explicit alias the alias is `mj<n>`, `n` being the number
    /// of joins declared before the statement.
    #[must_use]
    pub fn from_statement(
        stmt: &DslStatement,
        registry: &EntityRegistry,
        main_entity: &str,
        joins_before: usize,
    ) -> Option<Self> {
        let raw = strip_quotes(stmt.arg(0)?);
        let (parent_entity, field) = match raw.split_once("::") {
            Some((entity, accessor)) => (clean_entity_name(entity), accessor_to_field(accessor)),
            None => (main_entity.to_string(), accessor_to_field(raw)),
        };
        let alias = stmt
            .arg(1)
            .map(strip_quotes)
            .filter(|a| is_identifier(a))
            .map_or_else(|| format!("mj{joins_before}"), str::to_string);
        let kind = stmt.arg(2).map_or(MapJoinKind::Auto, MapJoinKind::parse);
        let relation = registry
            .lookup(&parent_entity)
            .and_then(|meta| meta.relation_of(&field));

        Some(Self {
            target: relation.map(|r| r.target.clone()),
            declared_collection: relation.map(|r| r.collection),
            parent_entity,
            field,
            alias,
            kind,
        })
    }

    /// Returns the shape to use, resolving [`MapJoinKind::Auto`] from the
    /// relation declaration.
    #[must_use]
    pub fn effective_kind(&self) -> MapJoinKind {
        match (self.kind, self.declared_collection) {
            (MapJoinKind::Auto, Some(true)) => MapJoinKind::Collection,
            (MapJoinKind::Auto, _) => MapJoinKind::Association,
            (kind, _) => kind,
        }
    }
}

/// Mutable accumulator for one compilation.
///
/// Nodes write fragments into it; the assembler renders it. Every nested
/// sub-query gets its own context.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    /// Statement kind.
    pub kind: StatementKind,
    /// Target table of INSERT/UPDATE/DELETE.
    pub target: Option<String>,
    /// SELECT list fragments.
    pub columns: Vec<String>,
    /// FROM items, deduplicated in insertion order.
    pub tables: Vec<String>,
    /// Rendered JOIN clauses.
    pub joins: Vec<String>,
    /// WHERE fragments, AND-joined on assembly.
    pub wheres: Vec<String>,
    /// `col = value` assignments.
    pub sets: Vec<String>,
    /// INSERT column list.
    pub insert_columns: Vec<String>,
    /// INSERT value list.
    pub insert_values: Vec<String>,
    /// GROUP BY items.
    pub group_bys: Vec<String>,
    /// ORDER BY items.
    pub order_bys: Vec<String>,
    /// LIMIT value.
    pub limit: Option<String>,
    /// OFFSET value.
    pub offset: Option<String>,
    /// Table used when nothing else names one.
    pub table_prefix: String,
    /// Aliases visible in this compilation.
    pub aliases: AliasMap,
    /// Whether every column reference must be alias-qualified.
    pub requires_prefix: bool,
    /// Recorded `mapJoin` hints.
    pub map_joins: Vec<MapJoin>,
}

impl BuildContext {
    /// Creates a context whose fallback table is `main_table`.
    #[must_use]
    pub fn new(main_table: impl Into<String>) -> Self {
        Self {
            table_prefix: main_table.into(),
            ..Self::default()
        }
    }

    /// Adds a FROM item unless it is already present.
    pub fn add_table(&mut self, table: String) {
        if !self.tables.contains(&table) {
            self.tables.push(table);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::EntityMeta;

    #[test]
    fn test_detect_kind() {
        assert_eq!(StatementKind::detect("  insert into t"), StatementKind::Insert);
        assert_eq!(StatementKind::detect("UPDATE t SET a = 1"), StatementKind::Update);
        assert_eq!(StatementKind::detect("DELETE FROM t"), StatementKind::Delete);
        assert_eq!(StatementKind::detect("SELECT 1"), StatementKind::Select);
        assert_eq!(StatementKind::detect(""), StatementKind::Select);
    }

    #[test]
    fn test_tables_are_deduplicated() {
        let mut ctx = BuildContext::new("users");
        ctx.add_table("users u".to_string());
        ctx.add_table("users u".to_string());
        assert_eq!(ctx.tables, vec!["users u".to_string()]);
    }

    #[test]
    fn test_map_join_resolution() {
        let mut registry = EntityRegistry::new();
        registry.register_meta(
            "Users",
            EntityMeta::new("users").relation("orders", "Orders", true),
        );

        let stmt = DslStatement::new("mapJoin", ["Users::getOrders", "o"]);
        let map_join = MapJoin::from_statement(&stmt, &registry, "Users", 0).unwrap();
        assert_eq!(map_join.field, "orders");
        assert_eq!(map_join.alias, "o");
        assert_eq!(map_join.target.as_deref(), Some("Orders"));
        assert_eq!(map_join.effective_kind(), MapJoinKind::Collection);

        let stmt = DslStatement::new("mapJoin", ["profile"]);
        let map_join = MapJoin::from_statement(&stmt, &registry, "Users", 2).unwrap();
        assert_eq!(map_join.alias, "mj2");
        assert_eq!(map_join.target, None);
        assert_eq!(map_join.effective_kind(), MapJoinKind::Association);
    }
}
