//! Entity metadata consumed by the query compiler.

mod entity;
mod registry;

pub use entity::{EntityMeta, FieldType, Relation, TypeClass};
pub use registry::EntityRegistry;
