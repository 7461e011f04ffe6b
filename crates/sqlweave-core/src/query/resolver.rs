//! Column and value resolution.
//!
//! Turns [`Operand`]s into SQL fragments using the entity registry and the
//! aliases visible in the current compilation. Column positions never get
//! quoted; value positions quote bare strings.

use heck::ToSnakeCase;
use tracing::warn;

use super::alias::AliasMap;
use super::context::BuildContext;
use super::operand::{ColumnRef, FieldTarget, Literal, Operand};
use crate::metadata::{EntityRegistry, FieldType};

/// Resolves operands against one compilation's aliases.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a EntityRegistry,
    aliases: &'a AliasMap,
    main_table: &'a str,
    requires_prefix: bool,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver reading from the given context.
    #[must_use]
    pub fn new(registry: &'a EntityRegistry, ctx: &'a BuildContext) -> Self {
        Self {
            registry,
            aliases: &ctx.aliases,
            main_table: &ctx.table_prefix,
            requires_prefix: ctx.requires_prefix,
        }
    }

    /// Resolves a token in a column position.
    #[must_use]
    pub fn column_token(&self, token: &str) -> String {
        self.column(&Operand::parse(token))
    }

    /// Resolves a token in a value position.
    #[must_use]
    pub fn value_token(&self, token: &str) -> String {
        self.value(&Operand::parse(token))
    }

    /// Resolves a token to an unqualified column name.
    #[must_use]
    pub fn bare_column_token(&self, token: &str) -> String {
        self.bare_column(&Operand::parse(token))
    }

    /// Resolves an operand in a column position.
    #[must_use]
    pub fn column(&self, op: &Operand) -> String {
        match op {
            Operand::Column(column) => self.column_ref(column, false),
            Operand::Raw(inner) => self.column(inner),
            Operand::Literal(Literal::Text(text)) => self.column(&Operand::parse(text)),
            Operand::Literal(Literal::Bare(s)) => s.clone(),
            other => self.value(other),
        }
    }

    /// Resolves an operand in a value position.
    #[must_use]
    pub fn value(&self, op: &Operand) -> String {
        match op {
            Operand::Raw(inner) => self.column(inner),
            Operand::Quoted(text) => quote(text),
            Operand::Bind(name) => format!("#{{{name}}}"),
            Operand::Column(column) => self.column_ref(column, false),
            Operand::Literal(literal) => match literal {
                Literal::Text(text) => quote(text),
                Literal::SqlString(s)
                | Literal::Integer(s)
                | Literal::Long(s)
                | Literal::Decimal(s)
                | Literal::Placeholder(s) => s.clone(),
                Literal::Boolean(true) => "TRUE".to_string(),
                Literal::Boolean(false) => "FALSE".to_string(),
                Literal::Null => "NULL".to_string(),
                Literal::Bare(s) if s.starts_with('(') && s.ends_with(')') => s.clone(),
                Literal::Bare(s) => quote(s),
            },
        }
    }

    /// Resolves an operand to a column name without any qualifier.
    #[must_use]
    pub fn bare_column(&self, op: &Operand) -> String {
        match op {
            Operand::Column(column) => self.column_ref(column, true),
            Operand::Literal(Literal::Text(text)) => self.bare_column(&Operand::parse(text)),
            Operand::Literal(Literal::Bare(s)) => s.clone(),
            other => self.column(other),
        }
    }

    /// Returns the table an operand's column belongs to, when it can be
    /// determined.
    #[must_use]
    pub fn owner_table(&self, op: &Operand) -> Option<String> {
        match op {
            Operand::Column(column) => match &column.target {
                FieldTarget::Entity { entity, .. } => {
                    Some(self.registry.table_name(entity).to_string())
                }
                FieldTarget::Alias { alias, .. } => self.alias_table(alias),
            },
            Operand::Raw(inner) => self.owner_table(inner),
            _ => None,
        }
    }

    /// Returns the owning entity and declared type of a referenced field.
    #[must_use]
    pub fn field_type(&self, column: &ColumnRef) -> Option<(String, &'a FieldType)> {
        let registry = self.registry;
        match &column.target {
            FieldTarget::Entity { entity, field, .. } => registry
                .lookup(entity)
                .and_then(|meta| meta.type_of(field))
                .map(|ty| (entity.clone(), ty)),
            FieldTarget::Alias { alias, field } => {
                let table = self.alias_table(alias)?;
                let entity = registry.entity_for_table(&table)?;
                registry
                    .lookup(entity)
                    .and_then(|meta| meta.type_of(field))
                    .map(|ty| (entity.to_string(), ty))
            }
        }
    }

    fn column_ref(&self, column: &ColumnRef, bare: bool) -> String {
        let rendered = match &column.target {
            FieldTarget::Entity {
                alias,
                entity,
                field,
            } => self.entity_column(alias.as_deref(), entity, field, bare),
            FieldTarget::Alias { alias, field } => self.alias_column(alias, field, bare),
        };
        match &column.as_name {
            Some(name) => format!("{rendered} AS {name}"),
            None => rendered,
        }
    }

    fn entity_column(&self, alias: Option<&str>, entity: &str, field: &str, bare: bool) -> String {
        let column = if let Some(meta) = self.registry.lookup(entity) {
            meta.column_for(field)
        } else {
            warn!(entity, field, "No metadata for entity, using the snake_case field name as column");
            field.to_snake_case()
        };
        if bare {
            return column;
        }

        let table = self.registry.table_name(entity);
        let qualifier = alias
            .or_else(|| self.aliases.alias_for_entity(entity))
            .or_else(|| self.aliases.alias_for_table(table))
            .unwrap_or(table);

        if alias.is_none() && !self.requires_prefix && table == self.main_table && qualifier == table
        {
            column
        } else {
            format!("{qualifier}.{column}")
        }
    }

    fn alias_column(&self, alias: &str, field: &str, bare: bool) -> String {
        let (qualifier, table) = if let Some(table) = self.aliases.table_for_alias(alias) {
            (alias, Some(table))
        } else if self.registry.contains(alias) {
            let table = self.registry.table_name(alias);
            let qualifier = self
                .aliases
                .alias_for_entity(alias)
                .or_else(|| self.aliases.alias_for_table(table))
                .unwrap_or(table);
            (qualifier, Some(table))
        } else if self.registry.lookup_by_table(alias).is_some() {
            (self.aliases.alias_for_table(alias).unwrap_or(alias), Some(alias))
        } else {
            (alias, None)
        };

        let column = table
            .and_then(|t| self.registry.lookup_by_table(t))
            .map_or_else(|| field.to_snake_case(), |meta| meta.column_for(field));

        if bare {
            column
        } else {
            format!("{qualifier}.{column}")
        }
    }

    fn alias_table(&self, alias: &str) -> Option<String> {
        if let Some(table) = self.aliases.table_for_alias(alias) {
            return Some(table.to_string());
        }
        if self.registry.contains(alias) {
            return Some(self.registry.table_name(alias).to_string());
        }
        self.registry
            .lookup_by_table(alias)
            .map(|meta| meta.table_name().to_string())
    }
}

/// Wraps text in single quotes, doubling embedded quotes.
#[must_use]
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
