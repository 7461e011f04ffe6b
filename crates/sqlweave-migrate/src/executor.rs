//! Script executor.
//!
//! Runs a generated DDL script against a live PostgreSQL or MySQL database,
//! creating the target database first when it does not exist yet.

use std::str::FromStr;

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPoolOptions};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPoolOptions};
use sqlx::Connection;
use sqlweave_core::ddl::DdlScript;
use tracing::{debug, info};

use crate::config::{ConnectionParams, DbType};
use crate::error::{GenerateError, Result};

/// Executes DDL scripts for one connection.
pub struct ScriptExecutor<'a> {
    db_type: DbType,
    params: &'a ConnectionParams,
}

impl<'a> ScriptExecutor<'a> {
    /// Creates an executor.
    #[must_use]
    pub const fn new(db_type: DbType, params: &'a ConnectionParams) -> Self {
        Self { db_type, params }
    }

    /// Creates the target database when it is missing.
    ///
    /// Returns whether the database was created.
    ///
    /// # Errors
    ///
    /// [`GenerateError::InvalidUrl`] when the URL carries no usable
    /// database name, or any connection error.
    pub async fn bootstrap(&self) -> Result<bool> {
        let database = self.params.database_name()?;
        if !is_plain_identifier(&database) {
            return Err(GenerateError::InvalidUrl(self.params.url.clone()));
        }
        let server_url = self.params.server_url(self.db_type)?;

        let created = match self.db_type {
            DbType::Postgres => {
                let mut conn = PgConnection::connect_with(&self.pg_options(&server_url)?).await?;
                let exists: Option<i32> =
                    sqlx::query_scalar("SELECT 1 FROM pg_database WHERE datname = $1")
                        .bind(&database)
                        .fetch_optional(&mut conn)
                        .await?;
                if exists.is_none() {
                    sqlx::raw_sql(&format!("CREATE DATABASE {database}"))
                        .execute(&mut conn)
                        .await?;
                }
                conn.close().await?;
                exists.is_none()
            }
            DbType::MySql => {
                let mut conn =
                    MySqlConnection::connect_with(&self.mysql_options(&server_url)?).await?;
                let exists: Option<String> = sqlx::query_scalar(
                    "SELECT SCHEMA_NAME FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = ?",
                )
                .bind(&database)
                .fetch_optional(&mut conn)
                .await?;
                if exists.is_none() {
                    sqlx::raw_sql(&format!("CREATE DATABASE IF NOT EXISTS {database}"))
                        .execute(&mut conn)
                        .await?;
                }
                conn.close().await?;
                exists.is_none()
            }
        };

        if created {
            info!(database = %database, "Created database");
        } else {
            debug!(database = %database, "Database already exists");
        }
        Ok(created)
    }

    /// Runs every statement of the script in one transaction.
    ///
    /// Returns the number of statements executed.
    ///
    /// # Errors
    ///
    /// Any connection or statement error; the transaction is rolled back.
    pub async fn execute(&self, script: &DdlScript) -> Result<usize> {
        let url = self.params.normalized_url();
        let mut executed = 0;

        match self.db_type {
            DbType::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(self.pg_options(url)?)
                    .await?;
                let mut tx = pool.begin().await?;
                for statement in script.statements() {
                    debug!(sql = %statement, "Executing SQL");
                    sqlx::raw_sql(statement).execute(&mut *tx).await?;
                    executed += 1;
                }
                tx.commit().await?;
                pool.close().await;
            }
            DbType::MySql => {
                let pool = MySqlPoolOptions::new()
                    .max_connections(1)
                    .connect_with(self.mysql_options(url)?)
                    .await?;
                let mut tx = pool.begin().await?;
                for statement in script.statements() {
                    debug!(sql = %statement, "Executing SQL");
                    sqlx::raw_sql(statement).execute(&mut *tx).await?;
                    executed += 1;
                }
                tx.commit().await?;
                pool.close().await;
            }
        }

        info!(db_type = %self.db_type, statements = executed, "DDL script executed");
        Ok(executed)
    }

    fn pg_options(&self, url: &str) -> Result<PgConnectOptions> {
        let options = PgConnectOptions::from_str(url)?.username(&self.params.username);
        Ok(match &self.params.password {
            Some(password) => options.password(password),
            None => options,
        })
    }

    fn mysql_options(&self, url: &str) -> Result<MySqlConnectOptions> {
        let options = MySqlConnectOptions::from_str(url)?.username(&self.params.username);
        Ok(match &self.params.password {
            Some(password) => options.password(password),
            None => options,
        })
    }
}

/// Database names are interpolated into `CREATE DATABASE`, so only
/// letters, digits and underscores are accepted.
fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
