//! Assembling a full DDL script.

use serde::Serialize;
use tracing::info;

use super::dialect::SqlDialect;
use super::foreign_key::ForeignKeyGenerator;
use super::model::TableMetadata;
use super::policy::DdlPolicy;
use crate::error::DdlResult;

/// One titled block of a DDL script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptSection {
    /// Section title, e.g. `1. TABLES (DROP & CREATE)`.
    pub title: &'static str,
    /// Statements, each terminated by `;`.
    pub statements: Vec<String>,
}

/// A generated DDL script, split into sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DdlScript {
    /// Sections in execution order.
    pub sections: Vec<ScriptSection>,
}

impl DdlScript {
    /// Returns whether the script has no statement at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.statements.is_empty())
    }

    /// Iterates over every statement in execution order.
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .flat_map(|s| s.statements.iter().map(String::as_str))
    }

    /// Renders the script as section comments and statements, ready to run.
    #[must_use]
    pub fn plain(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str(&format!("\t/* --- {} --- */\n", section.title));
            for statement in &section.statements {
                out.push('\t');
                out.push_str(statement);
                out.push('\n');
            }
        }
        out
    }

    /// Renders the script wrapped in a CDATA block for embedding in XML.
    #[must_use]
    pub fn render(&self) -> String {
        format!("<![CDATA[\n{}]]>", self.plain())
    }
}

/// Builds a [`DdlScript`] for a batch of tables under a policy.
pub struct DdlScriptBuilder<'d> {
    dialect: &'d dyn SqlDialect,
    policy: DdlPolicy,
}

impl<'d> DdlScriptBuilder<'d> {
    /// Creates a builder.
    #[must_use]
    pub fn new(dialect: &'d dyn SqlDialect, policy: DdlPolicy) -> Self {
        Self { dialect, policy }
    }

    /// Generates the script.
    ///
    /// Sections are tables, missing columns (skipped when tables are
    /// dropped first), foreign keys and indexes. A disabled policy yields
    /// an empty script.
    ///
    /// # Errors
    ///
    /// Any column validation error, or a foreign key whose parent has no
    /// key type. Nothing is emitted when an error is returned.
    pub fn build(&self, tables: &[TableMetadata]) -> DdlResult<DdlScript> {
        if !self.policy.is_enabled() {
            return Ok(DdlScript::default());
        }
        for table in tables {
            table.validate()?;
        }

        let drops = self.policy.drops_tables();
        let mut sections = Vec::new();

        let mut create = Vec::new();
        for table in tables {
            if drops {
                for statement in self.dialect.drop_table(table) {
                    push_statement(&mut create, &statement);
                }
            }
            push_statement(&mut create, &self.dialect.create_table(table));
        }
        sections.push(ScriptSection {
            title: "1. TABLES (DROP & CREATE)",
            statements: create,
        });

        if !drops {
            let mut columns = Vec::new();
            for table in tables {
                for column in table.columns.iter().filter(|c| !c.is_foreign_key()) {
                    push_statement(
                        &mut columns,
                        &self.dialect.add_column_if_not_exists(&table.table_name, column),
                    );
                }
            }
            sections.push(ScriptSection {
                title: "2. UPDATE COLUMNS (If Not Exists)",
                statements: columns,
            });
        }

        let mut foreign_keys = Vec::new();
        for statement in ForeignKeyGenerator::new(self.dialect, tables).generate()? {
            push_statement(&mut foreign_keys, &statement);
        }
        sections.push(ScriptSection {
            title: "3. FOREIGN KEYS",
            statements: foreign_keys,
        });

        let mut indexes = Vec::new();
        for table in tables {
            for statement in self.dialect.create_indexes(table) {
                push_statement(&mut indexes, &statement);
            }
        }
        sections.push(ScriptSection {
            title: "4. INDEXES",
            statements: indexes,
        });

        let script = DdlScript { sections };
        info!(
            dialect = self.dialect.name(),
            policy = %self.policy,
            tables = tables.len(),
            statements = script.statements().count(),
            "Generated DDL script"
        );
        Ok(script)
    }
}

/// Trims, terminates with `;` and skips empty statements.
fn push_statement(out: &mut Vec<String>, statement: &str) {
    let trimmed = statement.trim();
    if trimmed.is_empty() {
        return;
    }
    if trimmed.ends_with(';') {
        out.push(trimmed.to_string());
    } else {
        out.push(format!("{trimmed};"));
    }
}
