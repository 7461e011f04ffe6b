//! JSON input documents: entities, tables and queries.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlweave_core::ddl::TableMetadata;
use sqlweave_core::{DslStatement, EntityMeta, EntityRegistry, FieldType};
use tracing::{debug, info};

use crate::error::{GenerateError, Result};

/// One field of an entity document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDoc {
    /// Field name as used in accessors.
    pub name: String,
    /// Declared type token, e.g. `Long` or `LocalDateTime`.
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,
    /// Explicit column name.
    #[serde(default)]
    pub column: Option<String>,
}

/// One relation of an entity document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDoc {
    /// Field holding the related record(s).
    pub field: String,
    /// Related entity.
    pub target: String,
    /// Whether the field holds many records.
    #[serde(default)]
    pub collection: bool,
}

/// One entity document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDoc {
    /// Entity name.
    pub entity: String,
    /// Table name.
    pub table: String,
    /// Fields.
    #[serde(default)]
    pub fields: Vec<FieldDoc>,
    /// Relations.
    #[serde(default)]
    pub relations: Vec<RelationDoc>,
}

impl EntityDoc {
    /// Converts the document into registry metadata.
    #[must_use]
    pub fn to_meta(&self) -> EntityMeta {
        let mut meta = EntityMeta::new(self.table.clone());
        for field in &self.fields {
            if let Some(column) = field.column.as_deref().filter(|c| !c.is_empty()) {
                meta.add_column(field.name.clone(), column);
            }
            if let Some(ty) = field.field_type.as_deref() {
                meta.add_type(field.name.clone(), FieldType::parse(ty));
            }
        }
        for relation in &self.relations {
            meta.add_relation(relation.field.clone(), relation.target.clone(), relation.collection);
        }
        meta
    }
}

/// One query unit: a named statement list and its main entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDoc {
    /// Unit name; becomes the mapper element id.
    pub name: String,
    /// Main entity.
    pub entity: String,
    /// Statements in program order.
    #[serde(default)]
    pub statements: Vec<DslStatement>,
}

/// Fills a registry from entity documents.
#[must_use]
pub fn build_registry(docs: &[EntityDoc]) -> EntityRegistry {
    let mut registry = EntityRegistry::new();
    for doc in docs {
        debug!(entity = %doc.entity, table = %doc.table, "Registering entity");
        registry.register_meta(doc.entity.clone(), doc.to_meta());
    }
    registry
}

/// Reads and parses a JSON document.
///
/// # Errors
///
/// [`GenerateError::Io`] when the file cannot be read and
/// [`GenerateError::Serialization`] when it does not parse.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| GenerateError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads an entities document into a registry.
///
/// # Errors
///
/// See [`read_json`].
pub fn load_registry(path: &Path) -> Result<EntityRegistry> {
    let docs: Vec<EntityDoc> = read_json(path)?;
    let registry = build_registry(&docs);
    info!(path = %path.display(), entities = registry.len(), "Loaded entity metadata");
    Ok(registry)
}

/// Loads a tables document.
///
/// # Errors
///
/// See [`read_json`].
pub fn load_tables(path: &Path) -> Result<Vec<TableMetadata>> {
    let tables: Vec<TableMetadata> = read_json(path)?;
    info!(path = %path.display(), tables = tables.len(), "Loaded table metadata");
    Ok(tables)
}

/// Loads a queries document.
///
/// # Errors
///
/// See [`read_json`].
pub fn load_queries(path: &Path) -> Result<Vec<QueryDoc>> {
    let queries: Vec<QueryDoc> = read_json(path)?;
    info!(path = %path.display(), queries = queries.len(), "Loaded query units");
    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_doc_to_registry() {
        let json = r#"[
            {
                "entity": "Users",
                "table": "app_users",
                "fields": [
                    { "name": "id", "type": "Long" },
                    { "name": "displayName", "type": "String", "column": "display" }
                ],
                "relations": [{ "field": "orders", "target": "Orders", "collection": true }]
            }
        ]"#;
        let docs: Vec<EntityDoc> = serde_json::from_str(json).unwrap();
        let registry = build_registry(&docs);

        let meta = registry.lookup("Users").unwrap();
        assert_eq!(meta.table_name(), "app_users");
        assert_eq!(meta.column_for("displayName"), "display");
        assert_eq!(meta.type_of("id"), Some(&FieldType::Long));
        assert!(meta.relation_of("orders").unwrap().collection);
        assert_eq!(registry.entity_for_table("app_users"), Some("Users"));
    }

    #[test]
    fn test_query_doc_defaults() {
        let json = r#"{ "name": "findAll", "entity": "Users" }"#;
        let doc: QueryDoc = serde_json::from_str(json).unwrap();
        assert!(doc.statements.is_empty());

        let json = r##"{
            "name": "findById",
            "entity": "Users",
            "statements": [
                { "command": "from", "args": ["Users"] },
                { "command": "where", "args": ["Users::getId", "=", "#{id}"] },
                { "command": "endGroup" }
            ]
        }"##;
        let doc: QueryDoc = serde_json::from_str(json).unwrap();
        assert_eq!(doc.statements.len(), 3);
        assert!(doc.statements[2].args.is_empty());
    }
}
