//! sqlweave CLI
//!
//! Command-line tool for compiling query units and generating DDL scripts.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use sqlweave_core::EntityRegistry;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use sqlweave_migrate::config::{AUTO_KEY, DB_TYPE_KEY, PASSWORD_KEY, URL_KEY, USERNAME_KEY};
use sqlweave_migrate::prelude::*;

/// Compiles entity-oriented query statements to SQL and generates DDL.
#[derive(Parser)]
#[command(name = "sqlweave")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile query units into a mapper document.
    Compile {
        /// Entities document (JSON).
        #[arg(short, long)]
        entities: PathBuf,

        /// Queries document (JSON).
        #[arg(short, long)]
        queries: PathBuf,

        /// Mapper namespace.
        #[arg(short, long, default_value = "sqlweave.Mapper")]
        namespace: String,

        /// Output file (stdout if not specified).
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Generate the DDL script for a table batch, and optionally run it.
    Ddl {
        /// Tables document (JSON).
        #[arg(short, long)]
        tables: PathBuf,

        /// Wrap the script in a CDATA block for embedding in a template.
        #[arg(long)]
        template: bool,

        /// Output file (stdout if not specified).
        #[arg(long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        options: GeneratorOptions,
    },
}

/// Generator options; explicit flags override `-o key=value` pairs.
#[derive(Args)]
struct GeneratorOptions {
    /// Extra option as `key=value` (e.g. `auto=CREATE`, `dbType=mysql`).
    #[arg(short = 'o', long = "option", value_parser = parse_key_val)]
    extra: Vec<(String, String)>,

    /// DDL policy.
    #[arg(long)]
    auto: Option<String>,

    /// Database type (postgres, mysql).
    #[arg(long)]
    db_type: Option<String>,

    /// Connection URL.
    #[arg(long, env = "SQLWEAVE_DB_URL")]
    url: Option<String>,

    /// Connection user.
    #[arg(long, env = "SQLWEAVE_DB_USERNAME")]
    username: Option<String>,

    /// Connection password.
    #[arg(long, env = "SQLWEAVE_DB_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

impl GeneratorOptions {
    fn into_map(self) -> HashMap<String, String> {
        let mut options: HashMap<String, String> = self.extra.into_iter().collect();
        let flags = [
            (AUTO_KEY, self.auto),
            (DB_TYPE_KEY, self.db_type),
            (URL_KEY, self.url),
            (USERNAME_KEY, self.username),
            (PASSWORD_KEY, self.password),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                options.insert(key.to_string(), value);
            }
        }
        options
    }
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid option '{s}': expected key=value"))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Compile {
            entities,
            queries,
            namespace,
            out,
        } => {
            let registry = load_registry(&entities)?;
            let queries = load_queries(&queries)?;
            let config = GeneratorConfig::default();

            let mut report = GenerationPass::new(&registry, &config).run(&queries, &[]);
            let writer = MapperWriter::new(namespace);
            match out {
                Some(path) => writer.write_to(&path, &report.units)?,
                None => println!("{}", writer.render(&report.units)),
            }

            if let Some(failures) = report.take_failures() {
                error!("{failures}");
                bail!("{} of {} query units failed", queries.len() - report.units.len(), queries.len());
            }
            info!(units = report.units.len(), "All query units compiled");
        }

        Commands::Ddl {
            tables,
            template,
            out,
            options,
        } => {
            let config = GeneratorConfig::from_options(&options.into_map())?;
            if !config.policy.is_enabled() {
                warn!("DDL policy is DISABLED, nothing to generate");
                return Ok(());
            }
            let tables = load_tables(&tables)?;

            let registry = EntityRegistry::new();
            let mut report = GenerationPass::new(&registry, &config).run(&[], &tables);
            if let Some(failure) = report.take_failures() {
                return Err(failure.into());
            }
            let Some(script) = report.ddl else {
                bail!("No DDL script was produced");
            };

            let text = if template { script.render() } else { script.plain() };
            match out {
                Some(path) => std::fs::write(&path, text)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => println!("{text}"),
            }

            if config.policy.executes() {
                let params = config
                    .connection
                    .as_ref()
                    .context("an executing DDL policy needs connection parameters")?;
                let executor = ScriptExecutor::new(config.db_type, params);
                executor.bootstrap().await?;
                let executed = executor.execute(&script).await?;
                info!(statements = executed, "DDL applied");
            }
        }
    }

    Ok(())
}
