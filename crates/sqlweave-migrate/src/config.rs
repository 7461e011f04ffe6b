//! Generator configuration from opaque key/value options.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use sqlweave_core::ddl::{DdlPolicy, MySqlDialect, PostgresDialect, SqlDialect};
use tracing::debug;
use url::Url;

use crate::error::{GenerateError, Result};

/// Option key selecting the DDL policy.
pub const AUTO_KEY: &str = "auto";
/// Option key selecting the dialect.
pub const DB_TYPE_KEY: &str = "dbType";
/// Option key for the connection URL.
pub const URL_KEY: &str = "url";
/// Option key for the connection user.
pub const USERNAME_KEY: &str = "username";
/// Option key for the connection password.
pub const PASSWORD_KEY: &str = "password";

/// Supported database families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DbType {
    /// PostgreSQL.
    #[default]
    Postgres,
    /// MySQL and MariaDB.
    MySql,
}

impl DbType {
    /// Parses a `dbType` value, case-insensitively.
    ///
    /// # Errors
    ///
    /// [`GenerateError::UnsupportedDatabase`] for any other value.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "POSTGRES" | "POSTGRESQL" | "PG" => Ok(Self::Postgres),
            "MYSQL" | "MARIADB" => Ok(Self::MySql),
            _ => Err(GenerateError::UnsupportedDatabase(value.to_string())),
        }
    }

    /// Returns the DDL dialect for this database.
    #[must_use]
    pub fn dialect(self) -> &'static dyn SqlDialect {
        match self {
            Self::Postgres => &PostgresDialect,
            Self::MySql => &MySqlDialect,
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postgres => f.write_str("POSTGRES"),
            Self::MySql => f.write_str("MYSQL"),
        }
    }
}

/// Connection parameters for the execution collaborator.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    /// Connection URL; a leading `jdbc:` is ignored.
    pub url: String,
    /// User name.
    pub username: String,
    /// Password, if any.
    pub password: Option<String>,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl ConnectionParams {
    /// Returns the URL without a `jdbc:` prefix.
    #[must_use]
    pub fn normalized_url(&self) -> &str {
        let url = self.url.trim();
        url.strip_prefix("jdbc:").unwrap_or(url)
    }

    /// Parses the normalized URL.
    ///
    /// # Errors
    ///
    /// [`GenerateError::InvalidUrl`] when the URL does not parse.
    pub fn parsed_url(&self) -> Result<Url> {
        Url::parse(self.normalized_url()).map_err(|_| GenerateError::InvalidUrl(self.url.clone()))
    }

    /// Returns the database name: the last path segment of the URL.
    ///
    /// # Errors
    ///
    /// [`GenerateError::InvalidUrl`] when the URL does not parse or has no
    /// database in its path.
    pub fn database_name(&self) -> Result<String> {
        let url = self.parsed_url()?;
        url.path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .ok_or_else(|| GenerateError::InvalidUrl(self.url.clone()))
    }

    /// Returns the URL of the server-level database used to create the
    /// target one: `postgres` for PostgreSQL, no database for MySQL.
    ///
    /// # Errors
    ///
    /// [`GenerateError::InvalidUrl`] when the URL does not parse.
    pub fn server_url(&self, db_type: DbType) -> Result<String> {
        let mut url = self.parsed_url()?;
        url.set_path(match db_type {
            DbType::Postgres => "/postgres",
            DbType::MySql => "/",
        });
        url.set_fragment(None);
        Ok(url.into())
    }
}

/// Resolved generator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// DDL policy.
    pub policy: DdlPolicy,
    /// Target database family.
    pub db_type: DbType,
    /// Connection parameters; present whenever the policy executes.
    pub connection: Option<ConnectionParams>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            policy: DdlPolicy::Disabled,
            db_type: DbType::Postgres,
            connection: None,
        }
    }
}

impl GeneratorConfig {
    /// Builds the configuration from `auto`, `dbType`, `url`, `username`
    /// and `password` options. Other keys are ignored.
    ///
    /// # Errors
    ///
    /// [`GenerateError::UnsupportedDatabase`] for an unknown `dbType`;
    /// [`GenerateError::MissingParameter`] when an executing policy lacks
    /// `url` or `username`.
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            options
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let policy = DdlPolicy::from_option(get(AUTO_KEY));
        let db_type = get(DB_TYPE_KEY).map_or(Ok(DbType::Postgres), DbType::parse)?;

        let connection = match (get(URL_KEY), get(USERNAME_KEY)) {
            (Some(url), Some(username)) => Some(ConnectionParams {
                url: url.to_string(),
                username: username.to_string(),
                password: get(PASSWORD_KEY).map(str::to_string),
            }),
            (url, _) if policy.executes() => {
                return Err(GenerateError::MissingParameter {
                    key: if url.is_none() { URL_KEY } else { USERNAME_KEY },
                    policy: policy.to_string(),
                });
            }
            _ => None,
        };

        debug!(%policy, %db_type, execute = policy.executes(), "Resolved generator configuration");
        Ok(Self {
            policy,
            db_type,
            connection,
        })
    }

    /// Returns the DDL dialect.
    #[must_use]
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        self.db_type.dialect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::from_options(&HashMap::new()).unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.dialect().name(), "postgres");
    }

    #[test]
    fn test_unknown_policy_disables() {
        let config = GeneratorConfig::from_options(&options(&[("auto", "whenever")])).unwrap();
        assert_eq!(config.policy, DdlPolicy::Disabled);
    }

    #[test]
    fn test_unsupported_database_is_fatal() {
        let err = GeneratorConfig::from_options(&options(&[("dbType", "oracle")])).unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedDatabase(ref v) if v == "oracle"));
    }

    #[test]
    fn test_execute_policy_requires_connection() {
        let err = GeneratorConfig::from_options(&options(&[("auto", "CREATE_N_EXE")])).unwrap_err();
        assert!(matches!(err, GenerateError::MissingParameter { key: "url", .. }));

        let err = GeneratorConfig::from_options(&options(&[
            ("auto", "DROP_N_CREATE_EXE"),
            ("url", "postgres://localhost/app"),
        ]))
        .unwrap_err();
        assert!(matches!(err, GenerateError::MissingParameter { key: "username", .. }));

        let config = GeneratorConfig::from_options(&options(&[
            ("auto", "create_n_exe"),
            ("dbType", "mysql"),
            ("url", "mysql://localhost:3306/app"),
            ("username", "root"),
        ]))
        .unwrap();
        assert_eq!(config.db_type, DbType::MySql);
        assert_eq!(config.connection.unwrap().password, None);
    }

    #[test]
    fn test_database_name() {
        let params = ConnectionParams {
            url: "jdbc:postgresql://localhost:5432/shop?sslmode=disable".to_string(),
            username: "app".to_string(),
            password: Some("secret".to_string()),
        };
        assert_eq!(params.database_name().unwrap(), "shop");
        assert_eq!(
            params.server_url(DbType::Postgres).unwrap(),
            "postgresql://localhost:5432/postgres?sslmode=disable"
        );
        assert_eq!(
            params.server_url(DbType::MySql).unwrap(),
            "postgresql://localhost:5432/?sslmode=disable"
        );
        assert!(!format!("{params:?}").contains("secret"));

        let params = ConnectionParams {
            url: "mysql://localhost:3306".to_string(),
            username: "root".to_string(),
            password: None,
        };
        assert!(params.database_name().is_err());
    }

    #[test]
    fn test_database_name_ignores_fragment_and_credentials() {
        let params = ConnectionParams {
            url: "postgres://app:pw@db.internal/shop#replica".to_string(),
            username: "app".to_string(),
            password: None,
        };
        assert_eq!(params.database_name().unwrap(), "shop");
        assert_eq!(
            params.server_url(DbType::Postgres).unwrap(),
            "postgres://app:pw@db.internal/postgres"
        );

        let params = ConnectionParams {
            url: "not a url".to_string(),
            username: "app".to_string(),
            password: None,
        };
        assert!(matches!(params.database_name(), Err(GenerateError::InvalidUrl(_))));
    }
}
