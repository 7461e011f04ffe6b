//! Mapper document writer.
//!
//! Renders compiled units as one XML mapper: a `<select|insert|update|delete>`
//! element per unit with the SQL in a CDATA section, and for SELECT units a
//! `resultMap` whose nested entries come from the unit's `mapJoin` records.

use std::fs;
use std::path::Path;

use sqlweave_core::{MapJoin, MapJoinKind, StatementKind};
use tracing::info;

use crate::error::{GenerateError, Result};
use crate::pass::CompiledUnit;

const HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n\
<!DOCTYPE mapper PUBLIC \"-//mybatis.org//DTD Mapper 3.0//EN\" \
\"http://mybatis.org/dtd/mybatis-3-mapper.dtd\">\n\n";

/// Writes compiled units as a mapper document.
#[derive(Debug, Clone)]
pub struct MapperWriter {
    namespace: String,
}

impl MapperWriter {
    /// Creates a writer for the given namespace.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Renders the document.
    #[must_use]
    pub fn render(&self, units: &[CompiledUnit]) -> String {
        let mut xml = String::from(HEADER);
        xml.push_str(&format!(
            "<mapper namespace=\"{}\">\n\n",
            escape_attr(&self.namespace)
        ));

        for unit in units {
            let kind = StatementKind::detect(&unit.query.sql);
            let tag = kind.as_str();
            let result_map = format!("{}ResultMap", unit.name);

            if kind == StatementKind::Select {
                xml.push_str(&format!(
                    "    <resultMap id=\"{}\" type=\"{}\" autoMapping=\"true\">\n",
                    escape_attr(&result_map),
                    escape_attr(&unit.entity)
                ));
                for map_join in &unit.query.map_joins {
                    xml.push_str(&nested_mapping(map_join));
                }
                xml.push_str("    </resultMap>\n\n");
                xml.push_str(&format!(
                    "    <{tag} id=\"{}\" resultMap=\"{}\">\n",
                    escape_attr(&unit.name),
                    escape_attr(&result_map)
                ));
            } else {
                xml.push_str(&format!("    <{tag} id=\"{}\">\n", escape_attr(&unit.name)));
            }

            xml.push_str("        <![CDATA[\n");
            for line in cdata_safe(&unit.query.sql).lines() {
                xml.push_str(&format!("            {line}\n"));
            }
            xml.push_str("        ]]>\n");
            xml.push_str(&format!("    </{tag}>\n\n"));
        }

        xml.push_str("</mapper>\n");
        xml
    }

    /// Renders the document and writes it to `path`.
    ///
    /// # Errors
    ///
    /// [`GenerateError::Io`] when the file cannot be written.
    pub fn write_to(&self, path: &Path, units: &[CompiledUnit]) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| GenerateError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, self.render(units)).map_err(|source| GenerateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), units = units.len(), "Wrote mapper document");
        Ok(())
    }
}

fn nested_mapping(map_join: &MapJoin) -> String {
    let target = map_join
        .target
        .clone()
        .unwrap_or_else(|| capitalize(&map_join.field));
    let (element, type_attr) = match map_join.effective_kind() {
        MapJoinKind::Collection => ("collection", "ofType"),
        _ => ("association", "javaType"),
    };
    format!(
        "        <{element} property=\"{}\" {type_attr}=\"{}\" autoMapping=\"true\" columnPrefix=\"{}.\"/>\n",
        escape_attr(&map_join.field),
        escape_attr(&target),
        escape_attr(&map_join.alias)
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Splits any `]]>` so it cannot close the CDATA section early.
fn cdata_safe(sql: &str) -> String {
    sql.replace("]]>", "]]]]><![CDATA[>")
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlweave_core::{DslStatement, EntityMeta, EntityRegistry, QueryCompiler};

    fn compiled(name: &str, statements: &[DslStatement]) -> CompiledUnit {
        let mut registry = EntityRegistry::new();
        registry.register_meta(
            "Users",
            EntityMeta::new("users").relation("orders", "Orders", true),
        );
        registry.register_meta("Orders", EntityMeta::new("orders"));
        CompiledUnit {
            name: name.to_string(),
            entity: "Users".to_string(),
            query: QueryCompiler::new(&registry)
                .compile(statements, "Users")
                .unwrap(),
        }
    }

    #[test]
    fn test_select_with_collection() {
        let unit = compiled(
            "findWithOrders",
            &[
                DslStatement::new("from", ["Users", "u"]),
                DslStatement::new("leftJoin", ["Orders", "o.userId", "u.id"]),
                DslStatement::new("mapJoin", ["Users::getOrders", "o"]),
            ],
        );
        let xml = MapperWriter::new("app.UserMapper").render(&[unit]);

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n"));
        assert!(xml.contains("<mapper namespace=\"app.UserMapper\">"));
        assert!(xml.contains(
            "<resultMap id=\"findWithOrdersResultMap\" type=\"Users\" autoMapping=\"true\">"
        ));
        assert!(xml.contains(
            "<collection property=\"orders\" ofType=\"Orders\" autoMapping=\"true\" columnPrefix=\"o.\"/>"
        ));
        assert!(xml.contains("<select id=\"findWithOrders\" resultMap=\"findWithOrdersResultMap\">"));
        assert!(xml.contains("            SELECT *\n            FROM users u\n"));
        assert!(xml.trim_end().ends_with("</mapper>"));
    }

    #[test]
    fn test_insert_has_no_result_map() {
        let unit = compiled(
            "insertUser",
            &[
                DslStatement::new("insertInto", ["Users"]),
                DslStatement::new("value", ["Users::getName", "#{name}"]),
            ],
        );
        let xml = MapperWriter::new("app.UserMapper").render(&[unit]);
        assert!(!xml.contains("resultMap"));
        assert!(xml.contains("<insert id=\"insertUser\">"));
        assert!(xml.contains("</insert>"));
    }

    #[test]
    fn test_document_layout() {
        let unit = compiled(
            "deleteByName",
            &[
                DslStatement::new("deleteFrom", ["Users"]),
                DslStatement::new("where", ["Users::getName", "=", "#{name}"]),
            ],
        );
        let xml = MapperWriter::new("app.UserMapper").render(&[unit]);
        let body = xml.strip_prefix(HEADER).unwrap();
        assert_eq!(
            body,
            "<mapper namespace=\"app.UserMapper\">\n\n\
             \x20   <delete id=\"deleteByName\">\n\
             \x20       <![CDATA[\n\
             \x20           DELETE FROM users\n\
             \x20           WHERE name = #{name}\n\
             \x20       ]]>\n\
             \x20   </delete>\n\n\
             </mapper>\n"
        );
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape_attr("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
        assert_eq!(cdata_safe("x ]]> y"), "x ]]]]><![CDATA[> y");
        assert_eq!(capitalize("address"), "Address");
        assert_eq!(capitalize(""), "");
    }
}
