//! Operand type-consistency checks for conditions.

use tracing::debug;

use super::operand::Operand;
use super::resolver::Resolver;
use crate::error::{CompileError, Result};

/// Checks that `right` may be compared against the field named by `left`.
///
/// Only a field reference on the left and a classified literal on the
/// right are checked. Column-to-column comparisons, placeholders, raw
/// fragments and fields without a declared type pass.
///
/// # Errors
///
/// Returns [`CompileError::TypeMismatch`] when the literal's class is not
/// accepted by the field's declared class.
pub fn check_condition(resolver: &Resolver<'_>, left: &Operand, right: &Operand) -> Result<()> {
    let Some(column) = left.as_column() else {
        return Ok(());
    };
    let Operand::Literal(literal) = right else {
        return Ok(());
    };
    let Some(literal_class) = literal.class() else {
        return Ok(());
    };
    let Some((entity, declared)) = resolver.field_type(column) else {
        return Ok(());
    };
    let Some(declared_class) = declared.class() else {
        return Ok(());
    };

    if declared_class.accepts(literal_class) {
        debug!(
            entity = %entity,
            field = column.target.field(),
            declared = %declared_class,
            literal = %literal_class,
            "Condition types agree"
        );
        return Ok(());
    }

    Err(CompileError::TypeMismatch {
        entity,
        field: column.target.field().to_string(),
        declared: declared_class.to_string(),
        literal: literal_class.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{EntityMeta, EntityRegistry, FieldType};
    use crate::query::context::BuildContext;

    fn registry() -> EntityRegistry {
        let mut registry = EntityRegistry::new();
        registry.register_meta(
            "Users",
            EntityMeta::new("users")
                .field_type("id", FieldType::Long)
                .field_type("name", FieldType::String)
                .field_type("score", FieldType::Double)
                .field_type("birthday", FieldType::LocalDate)
                .field_type("shape", FieldType::Other("GEOMETRY".into())),
        );
        registry
    }

    fn check(left: &str, right: &str) -> Result<()> {
        let registry = registry();
        let ctx = BuildContext::new("users");
        let resolver = Resolver::new(&registry, &ctx);
        check_condition(&resolver, &Operand::parse(left), &Operand::parse(right))
    }

    #[test]
    fn test_long_accepts_integer() {
        assert!(check("Users::getId", "1").is_ok());
        assert!(check("Users::getId", "1L").is_ok());
    }

    #[test]
    fn test_string_rejects_integer() {
        let err = check("Users::getName", "1").unwrap_err();
        assert_eq!(
            err,
            CompileError::TypeMismatch {
                entity: "Users".to_string(),
                field: "name".to_string(),
                declared: "STRING".to_string(),
                literal: "INTEGER".to_string(),
            }
        );
    }

    #[test]
    fn test_double_rejects_integer() {
        assert!(check("Users::getScore", "1").is_err());
        assert!(check("Users::getScore", "1.5").is_ok());
    }

    #[test]
    fn test_unchecked_operands() {
        assert!(check("Users::getName", "?").is_ok());
        assert!(check("Users::getName", "#{name}").is_ok());
        assert!(check("Users::getName", "null").is_ok());
        assert!(check("Users::getName", "Users::getId").is_ok());
        assert!(check("Users::getShape", "1").is_ok());
        assert!(check("Users::getMissing", "1").is_ok());
        assert!(check("Users::getBirthday", "\"2024-01-01\"").is_ok());
    }
}
