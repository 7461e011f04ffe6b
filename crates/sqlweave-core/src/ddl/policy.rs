//! DDL generation policy.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// What the generator does with table metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DdlPolicy {
    /// No DDL is generated.
    #[default]
    Disabled,
    /// Create missing tables and columns.
    Create,
    /// Drop every table, then create it again.
    DropAndCreate,
    /// `Create`, then run the script against the database.
    CreateAndExecute,
    /// `DropAndCreate`, then run the script against the database.
    DropAndCreateAndExecute,
}

impl DdlPolicy {
    /// Parses a policy name, case-insensitively.
    ///
    /// Accepts the canonical upper-snake names plus a few short forms
    /// (`none`, `drop`, `create_n_exe`, `drop_n_create_exe`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "DISABLED" | "NONE" | "OFF" | "FALSE" => Some(Self::Disabled),
            "CREATE" => Some(Self::Create),
            "DROP_AND_CREATE" | "DROP_CREATE" | "DROP" => Some(Self::DropAndCreate),
            "CREATE_AND_EXECUTE" | "CREATE_N_EXE" | "CREATE_EXE" => Some(Self::CreateAndExecute),
            "DROP_AND_CREATE_AND_EXECUTE" | "DROP_N_CREATE_EXE" | "DROP_CREATE_EXE" => {
                Some(Self::DropAndCreateAndExecute)
            }
            _ => None,
        }
    }

    /// Parses an optional policy name, falling back to `Disabled`.
    ///
    /// An unrecognized name is logged and treated as `Disabled`.
    #[must_use]
    pub fn from_option(value: Option<&str>) -> Self {
        let Some(raw) = value.filter(|v| !v.trim().is_empty()) else {
            return Self::Disabled;
        };
        Self::parse(raw).unwrap_or_else(|| {
            warn!(value = raw, "Unknown DDL policy, DDL generation disabled");
            Self::Disabled
        })
    }

    /// Returns whether any DDL is generated.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// Returns whether tables are dropped before creation.
    #[must_use]
    pub const fn drops_tables(self) -> bool {
        matches!(self, Self::DropAndCreate | Self::DropAndCreateAndExecute)
    }

    /// Returns whether the script is run against a database.
    #[must_use]
    pub const fn executes(self) -> bool {
        matches!(self, Self::CreateAndExecute | Self::DropAndCreateAndExecute)
    }

    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "DISABLED",
            Self::Create => "CREATE",
            Self::DropAndCreate => "DROP_AND_CREATE",
            Self::CreateAndExecute => "CREATE_AND_EXECUTE",
            Self::DropAndCreateAndExecute => "DROP_AND_CREATE_AND_EXECUTE",
        }
    }
}

impl fmt::Display for DdlPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
