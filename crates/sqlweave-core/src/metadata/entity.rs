//! Per-entity metadata: table name, field columns, declared types and
//! relations.

use std::collections::HashMap;
use std::fmt;

use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};

/// Declared type of an entity field.
///
/// Parsed from the declaration token the metadata extractor hands over
/// (`"LONG"`, `"LOCAL_DATE_TIME"`, `"MLong"`, ...). Tokens that match none
/// of the known types are kept verbatim in [`FieldType::Other`] and are
/// never type-checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    Long,
    /// Single precision float.
    Float,
    /// Double precision float.
    Double,
    /// Boolean.
    Boolean,
    /// Short string.
    String,
    /// Long text.
    Text,
    /// Calendar date.
    LocalDate,
    /// Date and time.
    LocalDateTime,
    /// Time-ordered UUID.
    UuidV7,
    /// JSON document.
    Json,
    /// Enumeration stored by name.
    Enum,
    /// Foreign key to another entity.
    Fk,
    /// Anything else, kept as written.
    Other(String),
}

impl FieldType {
    /// Parses a declared type token.
    ///
    /// Matching ignores case and underscores, and tolerates a leading `M`
    /// wrapper prefix (`MLong`, `MLocalDate`).
    #[must_use]
    pub fn parse(token: &str) -> Self {
        let trimmed = token.trim();
        let unwrapped = match trimmed.strip_prefix('M') {
            Some(rest) if rest.starts_with(|c: char| c.is_ascii_uppercase()) => rest,
            _ => trimmed,
        };
        let normalized: String = unwrapped
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        match normalized.as_str() {
            "INT" | "INTEGER" => Self::Integer,
            "LONG" | "BIGINT" => Self::Long,
            "FLOAT" => Self::Float,
            "DOUBLE" | "NUMBER" | "DECIMAL" => Self::Double,
            "BOOL" | "BOOLEAN" => Self::Boolean,
            "STRING" | "VARCHAR" => Self::String,
            "TEXT" => Self::Text,
            "LOCALDATE" | "DATE" => Self::LocalDate,
            "LOCALDATETIME" | "DATETIME" | "TIMESTAMP" => Self::LocalDateTime,
            "UUIDV7" | "UUID" => Self::UuidV7,
            "JSON" => Self::Json,
            "ENUM" | "ENUMTYPE" => Self::Enum,
            "FK" => Self::Fk,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Returns the comparison class of this type, or `None` when the type
    /// is unknown and must not be checked.
    ///
    /// Dates, UUIDs and JSON collapse to `String`; foreign keys to `Long`.
    #[must_use]
    pub fn class(&self) -> Option<TypeClass> {
        match self {
            Self::Integer => Some(TypeClass::Integer),
            Self::Long | Self::Fk => Some(TypeClass::Long),
            Self::Float | Self::Double => Some(TypeClass::Double),
            Self::Boolean => Some(TypeClass::Boolean),
            Self::String
            | Self::Text
            | Self::LocalDate
            | Self::LocalDateTime
            | Self::UuidV7
            | Self::Json
            | Self::Enum => Some(TypeClass::String),
            Self::Other(_) => None,
        }
    }
}

/// The five classes operands are compared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    /// Integer.
    Integer,
    /// Long integer.
    Long,
    /// Floating point.
    Double,
    /// Boolean.
    Boolean,
    /// Anything string-shaped.
    String,
}

impl TypeClass {
    /// Returns whether a value of class `literal` may be compared against
    /// a field of this class.
    ///
    /// Only `Integer -> Long` widening is allowed.
    #[must_use]
    pub fn accepts(self, literal: Self) -> bool {
        self == literal || (self == Self::Long && literal == Self::Integer)
    }

    /// Returns the upper-case name of this class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Long => "LONG",
            Self::Double => "DOUBLE",
            Self::Boolean => "BOOLEAN",
            Self::String => "STRING",
        }
    }
}

impl fmt::Display for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relation from a field to another entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Name of the related entity.
    pub target: String,
    /// Whether the field holds many related records.
    pub collection: bool,
}

/// Metadata describing one logical entity and the table it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntityMeta {
    table_name: String,
    columns: HashMap<String, String>,
    types: HashMap<String, FieldType>,
    relations: HashMap<String, Relation>,
}

impl EntityMeta {
    /// Creates metadata for the given table with no fields.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Self::default()
        }
    }

    /// Maps a field to an explicit column name.
    #[must_use]
    pub fn column(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.add_column(field, column);
        self
    }

    /// Declares the type of a field.
    #[must_use]
    pub fn field_type(mut self, field: impl Into<String>, ty: FieldType) -> Self {
        self.add_type(field, ty);
        self
    }

    /// Declares a relation from a field to another entity.
    #[must_use]
    pub fn relation(
        mut self,
        field: impl Into<String>,
        target: impl Into<String>,
        collection: bool,
    ) -> Self {
        self.add_relation(field, target, collection);
        self
    }

    /// Maps a field to an explicit column name in place.
    pub fn add_column(&mut self, field: impl Into<String>, column: impl Into<String>) {
        self.columns.insert(field.into(), column.into());
    }

    /// Declares the type of a field in place.
    pub fn add_type(&mut self, field: impl Into<String>, ty: FieldType) {
        self.types.insert(field.into(), ty);
    }

    /// Declares a relation in place.
    pub fn add_relation(
        &mut self,
        field: impl Into<String>,
        target: impl Into<String>,
        collection: bool,
    ) {
        self.relations.insert(
            field.into(),
            Relation {
                target: target.into(),
                collection,
            },
        );
    }

    /// Returns the physical table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns the explicitly mapped column of a field, if any.
    #[must_use]
    pub fn mapped_column(&self, field: &str) -> Option<&str> {
        self.columns.get(field).map(String::as_str)
    }

    /// Returns the column for a field, falling back to the snake_case
    /// form of the field name when no column was mapped.
    #[must_use]
    pub fn column_for(&self, field: &str) -> String {
        self.mapped_column(field)
            .filter(|c| !c.is_empty())
            .map_or_else(|| field.to_snake_case(), str::to_string)
    }

    /// Returns the declared type of a field.
    #[must_use]
    pub fn type_of(&self, field: &str) -> Option<&FieldType> {
        self.types.get(field)
    }

    /// Returns the relation declared on a field.
    #[must_use]
    pub fn relation_of(&self, field: &str) -> Option<&Relation> {
        self.relations.get(field)
    }

    /// Returns every explicitly mapped column name.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.values().map(String::as_str)
    }
}
