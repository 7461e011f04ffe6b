//! One generation pass over every query unit and the table batch.
//!
//! A failing unit is recorded and skipped; the remaining units still
//! compile, so the pass always produces a (possibly partial) report.

use sqlweave_core::ddl::{DdlScript, DdlScriptBuilder, TableMetadata};
use sqlweave_core::{CompiledQuery, EntityRegistry, QueryCompiler};
use tracing::{error, info};

use crate::config::GeneratorConfig;
use crate::error::GenerateError;
use crate::input::QueryDoc;

/// A successfully compiled query unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledUnit {
    /// Unit name.
    pub name: String,
    /// Main entity.
    pub entity: String,
    /// Compilation output.
    pub query: CompiledQuery,
}

/// Outcome of a generation pass.
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Units that compiled, in input order.
    pub units: Vec<CompiledUnit>,
    /// DDL script; `None` when disabled or failed.
    pub ddl: Option<DdlScript>,
    /// Per-unit failures, in input order.
    pub failures: Vec<GenerateError>,
}

impl GenerationReport {
    /// Returns whether every unit succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Moves the failures out as one error, if there are any.
    pub fn take_failures(&mut self) -> Option<GenerateError> {
        match self.failures.len() {
            0 => None,
            1 => self.failures.pop(),
            _ => Some(GenerateError::Multiple(std::mem::take(&mut self.failures))),
        }
    }
}

/// Drives compilation of a batch against a populated registry.
pub struct GenerationPass<'a> {
    registry: &'a EntityRegistry,
    config: &'a GeneratorConfig,
}

impl<'a> GenerationPass<'a> {
    /// Creates a pass; the registry must be fully populated.
    #[must_use]
    pub const fn new(registry: &'a EntityRegistry, config: &'a GeneratorConfig) -> Self {
        Self { registry, config }
    }

    /// Compiles every query unit, then the DDL script if the policy asks
    /// for one.
    #[must_use]
    pub fn run(&self, queries: &[QueryDoc], tables: &[TableMetadata]) -> GenerationReport {
        let mut report = GenerationReport::default();
        let compiler = QueryCompiler::new(self.registry);

        for doc in queries {
            match compiler.compile(&doc.statements, &doc.entity) {
                Ok(query) => report.units.push(CompiledUnit {
                    name: doc.name.clone(),
                    entity: doc.entity.clone(),
                    query,
                }),
                Err(source) => {
                    error!(unit = %doc.name, error = %source, "Query unit failed to compile");
                    report.failures.push(GenerateError::Compile {
                        unit: doc.name.clone(),
                        source,
                    });
                }
            }
        }

        if self.config.policy.is_enabled() {
            let builder = DdlScriptBuilder::new(self.config.dialect(), self.config.policy);
            match builder.build(tables) {
                Ok(script) => report.ddl = Some(script),
                Err(err) => {
                    error!(error = %err, "DDL generation failed");
                    report.failures.push(GenerateError::Ddl(err));
                }
            }
        }

        info!(
            compiled = report.units.len(),
            failed = report.failures.len(),
            ddl = report.ddl.is_some(),
            "Generation pass finished"
        );
        report
    }
}
