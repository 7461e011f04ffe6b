//! The entity metadata registry.
//!
//! A registry is filled once by a single writer (the metadata loader) and
//! then handed by shared reference to every compilation. It has no
//! interior mutability; concurrent readers are safe once population is
//! finished, and the borrow checker rules out writes during compilation.

use std::collections::HashMap;

use super::entity::EntityMeta;

/// Process-wide table of entity metadata, passed explicitly.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    metas: HashMap<String, EntityMeta>,
    tables: HashMap<String, String>,
    entities_by_table: HashMap<String, String>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps an entity to a table name. The last registration wins.
    pub fn register_table(&mut self, entity: impl Into<String>, table: impl Into<String>) {
        let entity = entity.into();
        let table = strip_quotes(&table.into()).to_string();
        self.entities_by_table.insert(table.clone(), entity.clone());
        self.tables.insert(entity, table);
    }

    /// Registers the metadata of an entity. The last registration wins.
    ///
    /// The entity's table is registered as well, unless a table was
    /// already registered explicitly.
    pub fn register_meta(&mut self, entity: impl Into<String>, meta: EntityMeta) {
        let entity = entity.into();
        if !self.tables.contains_key(&entity) {
            self.register_table(entity.clone(), meta.table_name());
        } else {
            self.entities_by_table
                .insert(meta.table_name().to_string(), entity.clone());
        }
        self.metas.insert(entity, meta);
    }

    /// Looks up the metadata of an entity.
    #[must_use]
    pub fn lookup(&self, entity: &str) -> Option<&EntityMeta> {
        self.metas.get(entity)
    }

    /// Looks up metadata by physical table name.
    #[must_use]
    pub fn lookup_by_table(&self, table: &str) -> Option<&EntityMeta> {
        self.entities_by_table
            .get(table)
            .and_then(|entity| self.metas.get(entity))
    }

    /// Returns the entity registered for a table name.
    #[must_use]
    pub fn entity_for_table(&self, table: &str) -> Option<&str> {
        self.entities_by_table.get(table).map(String::as_str)
    }

    /// Returns the table name of an entity.
    ///
    /// Unregistered entities map to their own name so generation degrades
    /// instead of failing on partial metadata.
    #[must_use]
    pub fn table_name<'a>(&'a self, entity: &'a str) -> &'a str {
        self.tables
            .get(entity)
            .map(String::as_str)
            .or_else(|| self.metas.get(entity).map(EntityMeta::table_name))
            .unwrap_or(entity)
    }

    /// Returns whether the name is a registered entity.
    #[must_use]
    pub fn contains(&self, entity: &str) -> bool {
        self.metas.contains_key(entity) || self.tables.contains_key(entity)
    }

    /// Returns the number of entities with metadata.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metas.len()
    }

    /// Returns whether no metadata has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }
}

fn strip_quotes(s: &str) -> &str {
    s.trim().trim_matches(|c| c == '"' || c == '\'')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_entity_falls_back_to_its_name() {
        let registry = EntityRegistry::new();
        assert_eq!(registry.table_name("Ghost"), "Ghost");
        assert!(registry.lookup("Ghost").is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = EntityRegistry::new();
        registry.register_table("Users", "users_v1");
        registry.register_table("Users", "\"users\"");
        assert_eq!(registry.table_name("Users"), "users");
    }

    #[test]
    fn test_register_meta_indexes_by_table() {
        let mut registry = EntityRegistry::new();
        registry.register_meta("Orders", EntityMeta::new("orders"));
        assert_eq!(registry.table_name("Orders"), "orders");
        assert_eq!(
            registry.lookup_by_table("orders").map(EntityMeta::table_name),
            Some("orders")
        );
        assert_eq!(registry.entity_for_table("orders"), Some("Orders"));
    }
}
