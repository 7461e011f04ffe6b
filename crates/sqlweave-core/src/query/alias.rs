//! Alias bookkeeping and the alias pre-scan.

use std::collections::HashMap;

use tracing::debug;

use super::context::MapJoin;
use super::operand::{clean_entity_name, is_identifier, strip_quotes, FieldTarget, Operand};
use crate::metadata::EntityRegistry;
use crate::statement::{Command, DslStatement, Item};

/// A table together with the alias it is known by in one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Physical table name.
    pub table: String,
    /// Alias, when different from the table name.
    pub alias: Option<String>,
}

impl TableRef {
    /// Creates a reference. An alias equal to the table name is dropped.
    #[must_use]
    pub fn new(table: impl Into<String>, alias: Option<String>) -> Self {
        let table = table.into();
        let alias = alias.filter(|a| !a.is_empty() && *a != table);
        Self { table, alias }
    }

    /// Returns the name columns are qualified with.
    #[must_use]
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    /// Renders `table alias`, or just `table`.
    #[must_use]
    pub fn render(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} {alias}", self.table),
            None => self.table.clone(),
        }
    }
}

/// Bidirectional alias registry for one compilation.
///
/// Aliases and table names live in separate maps, so a table that happens
/// to share its name with another table's alias cannot shadow it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    alias_to_table: HashMap<String, String>,
    table_to_alias: HashMap<String, String>,
    entity_to_alias: HashMap<String, String>,
}

impl AliasMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an entity and its table to the reference's qualifier.
    pub fn register(&mut self, entity: &str, table_ref: &TableRef) {
        let qualifier = table_ref.qualifier().to_string();
        debug!(entity, table = %table_ref.table, alias = %qualifier, "Registered alias");
        self.alias_to_table
            .insert(qualifier.clone(), table_ref.table.clone());
        self.table_to_alias
            .insert(table_ref.table.clone(), qualifier.clone());
        if !entity.is_empty() {
            self.entity_to_alias.insert(entity.to_string(), qualifier);
        }
    }

    /// Returns the table an alias stands for.
    #[must_use]
    pub fn table_for_alias(&self, alias: &str) -> Option<&str> {
        self.alias_to_table.get(alias).map(String::as_str)
    }

    /// Returns the alias registered for a table.
    #[must_use]
    pub fn alias_for_table(&self, table: &str) -> Option<&str> {
        self.table_to_alias.get(table).map(String::as_str)
    }

    /// Returns the alias registered for an entity.
    #[must_use]
    pub fn alias_for_entity(&self, entity: &str) -> Option<&str> {
        self.entity_to_alias.get(entity).map(String::as_str)
    }

    /// Returns whether no alias has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alias_to_table.is_empty()
    }

    /// Registers every alias declared by `from`, joins, join groups and
    /// `mapJoin`, descending into group bodies.
    ///
    /// Runs before any node is compiled so that references resolve no
    /// matter where the alias is declared.
    pub fn prescan(&mut self, items: &[Item], registry: &EntityRegistry, main_entity: &str) {
        let mut joins = 0usize;
        for item in items {
            let stmt = item.statement();
            match item.command() {
                Command::From => {
                    if let Some((entity, table_ref)) = from_ref(stmt, registry) {
                        self.register(&entity, &table_ref);
                    }
                }
                Command::InnerJoin | Command::LeftJoin => {
                    if let Some((entity, table_ref)) = join_ref(stmt, registry) {
                        self.register(&entity, &table_ref);
                    }
                    joins += 1;
                }
                Command::InnerJoinGroup | Command::LeftJoinGroup => {
                    if let Some((entity, table_ref)) = join_group_ref(stmt, registry) {
                        self.register(&entity, &table_ref);
                    }
                    joins += 1;
                }
                Command::MapJoin => {
                    if let Some(map_join) = MapJoin::from_statement(stmt, registry, main_entity, joins)
                    {
                        if let Some(target) = &map_join.target {
                            let table = registry.table_name(target).to_string();
                            self.register(target, &TableRef::new(table, Some(map_join.alias)));
                        }
                    }
                }
                _ => {}
            }
            if let Item::Group { body, .. } = item {
                if item.command() != Command::Unknown {
                    self.prescan(body, registry, main_entity);
                }
            }
        }
    }
}

/// Resolves `from(Entity[, alias])`.
#[must_use]
pub fn from_ref(stmt: &DslStatement, registry: &EntityRegistry) -> Option<(String, TableRef)> {
    let entity = clean_entity_name(stmt.arg(0)?);
    let table = registry.table_name(&entity).to_string();
    let alias = stmt.arg(1).map(|a| strip_quotes(a).to_string());
    Some((entity, TableRef::new(table, alias)))
}

/// Resolves `innerJoin(Entity, left, right[, alias])`.
///
/// The alias is the fourth argument when given, otherwise the qualifier
/// written on the left-hand column, which must belong to the joined table.
/// Without either the table name itself is used.
#[must_use]
pub fn join_ref(stmt: &DslStatement, registry: &EntityRegistry) -> Option<(String, TableRef)> {
    let entity = clean_entity_name(stmt.arg(0)?);
    let table = registry.table_name(&entity).to_string();
    let alias = explicit_alias(stmt.arg(3))
        .or_else(|| stmt.arg(1).and_then(column_alias).filter(|a| *a != entity));
    Some((entity, TableRef::new(table, alias)))
}

/// Resolves `innerJoinGroup(Entity, left, right[, alias])`.
///
/// The sub-query alias is the fourth argument, or the qualifier on the
/// right-hand column, or `<table>_sub`.
#[must_use]
pub fn join_group_ref(
    stmt: &DslStatement,
    registry: &EntityRegistry,
) -> Option<(String, TableRef)> {
    let entity = clean_entity_name(stmt.arg(0)?);
    let table = registry.table_name(&entity).to_string();
    let alias = explicit_alias(stmt.arg(3))
        .or_else(|| stmt.arg(2).and_then(column_alias))
        .unwrap_or_else(|| format!("{table}_sub"));
    Some((entity, TableRef::new(table, Some(alias))))
}

fn explicit_alias(arg: Option<&str>) -> Option<String> {
    arg.map(strip_quotes)
        .filter(|a| is_identifier(a))
        .map(str::to_string)
}

fn column_alias(token: &str) -> Option<String> {
    match Operand::parse(token) {
        Operand::Column(column) => match column.target {
            FieldTarget::Entity { alias, .. } => alias,
            FieldTarget::Alias { alias, .. } => Some(alias),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::EntityMeta;
    use crate::statement::StatementTree;

    fn registry() -> EntityRegistry {
        let mut registry = EntityRegistry::new();
        registry.register_meta("Users", EntityMeta::new("users"));
        registry.register_meta("Orders", EntityMeta::new("orders"));
        registry
    }

    #[test]
    fn test_table_ref() {
        assert_eq!(TableRef::new("orders", Some("o".into())).render(), "orders o");
        assert_eq!(TableRef::new("orders", Some("orders".into())).render(), "orders");
        assert_eq!(TableRef::new("orders", None).qualifier(), "orders");
    }

    #[test]
    fn test_prescan_is_bidirectional() {
        let stmts = vec![
            DslStatement::new("from", ["Users", "\"u\""]),
            DslStatement::new("innerJoin", ["Orders", "o.userId", "u.id"]),
        ];
        let tree = StatementTree::parse(&stmts).unwrap();
        let mut aliases = AliasMap::new();
        aliases.prescan(tree.items(), &registry(), "Users");

        assert_eq!(aliases.table_for_alias("u"), Some("users"));
        assert_eq!(aliases.alias_for_table("users"), Some("u"));
        assert_eq!(aliases.alias_for_entity("Users"), Some("u"));
        assert_eq!(aliases.table_for_alias("o"), Some("orders"));
        assert_eq!(aliases.alias_for_entity("Orders"), Some("o"));
    }

    #[test]
    fn test_prescan_descends_into_groups() {
        let stmts = vec![
            DslStatement::new("whereExistsGroup", Vec::<String>::new()),
            DslStatement::new("from", ["Orders", "o"]),
            DslStatement::new("endGroup", Vec::<String>::new()),
        ];
        let tree = StatementTree::parse(&stmts).unwrap();
        let mut aliases = AliasMap::new();
        aliases.prescan(tree.items(), &registry(), "Users");
        assert_eq!(aliases.table_for_alias("o"), Some("orders"));
    }

    #[test]
    fn test_join_group_default_alias() {
        let stmt = DslStatement::new("innerJoinGroup", ["Orders", "Users::getId", "Orders::getUserId"]);
        let (_, table_ref) = join_group_ref(&stmt, &registry()).unwrap();
        assert_eq!(table_ref.qualifier(), "orders_sub");

        let stmt = DslStatement::new("innerJoinGroup", ["Orders", "u.id", "summary.userId"]);
        let (_, table_ref) = join_group_ref(&stmt, &registry()).unwrap();
        assert_eq!(table_ref.qualifier(), "summary");
    }
}
