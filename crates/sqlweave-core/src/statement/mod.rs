//! The DSL statement stream.
//!
//! A [`DslStatement`] is one call site of the query DSL: a command name and
//! its positional string arguments. The compiler never sees the flat list
//! directly; it is first parsed into a [`StatementTree`] in which every
//! `...Group` opener owns the statements up to its matching `endGroup`.

mod tree;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use tree::{Item, StatementTree};

/// One DSL call site: `(command, args)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DslStatement {
    /// The command name as written (`from`, `innerJoin`, `andGroup`, ...).
    pub command: String,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

impl DslStatement {
    /// Creates a statement.
    pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the classified command.
    #[must_use]
    pub fn kind(&self) -> Command {
        Command::parse(&self.command)
    }

    /// Returns whether this statement opens a group closed by `endGroup`.
    ///
    /// Every command ending in `Group` other than `endGroup` opens one,
    /// including commands the compiler does not know.
    #[must_use]
    pub fn opens_group(&self) -> bool {
        let name = self.command.trim();
        self.kind().opens_group() || (name.ends_with("Group") && name != "endGroup")
    }

    /// Returns the argument at `position`, trimmed.
    #[must_use]
    pub fn arg(&self, position: usize) -> Option<&str> {
        self.args.get(position).map(|a| a.trim())
    }

    /// Returns the argument at `position` or a `MissingArgument` error.
    pub fn require(&self, position: usize) -> crate::Result<&str> {
        self.arg(position)
            .ok_or_else(|| crate::CompileError::MissingArgument {
                command: self.command.clone(),
                position,
            })
    }
}

impl fmt::Display for DslStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.command, self.args.join(", "))
    }
}

/// Commands understood by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `select`: columns to project.
    Select,
    /// `selectRaw`: projection text used verbatim.
    SelectRaw,
    /// `from`: the source table and its alias.
    From,
    /// `fromGroup`: a derived table built from the group body.
    FromGroup,
    /// `innerJoin` or `join`.
    InnerJoin,
    /// `leftJoin`.
    LeftJoin,
    /// `innerJoinGroup` or `joinGroup`: an inner join on a sub-query.
    InnerJoinGroup,
    /// `leftJoinGroup`: a left join on a sub-query.
    LeftJoinGroup,
    /// `where`.
    Where,
    /// `and`.
    And,
    /// `or`.
    Or,
    /// `group`, `whereGroup` or `andGroup`.
    AndGroup,
    /// `orGroup`.
    OrGroup,
    /// `endGroup`: closes the innermost open group.
    EndGroup,
    /// `whereExistsGroup` or `whereExists`.
    WhereExistsGroup,
    /// `whereNotExistsGroup` or `whereNotExists`.
    WhereNotExistsGroup,
    /// `insertInto` or `insert`.
    InsertInto,
    /// `update`.
    Update,
    /// `deleteFrom` or `delete`.
    DeleteFrom,
    /// `value` or `values`: one inserted column and its value.
    Value,
    /// `set`: one updated column and its value.
    Set,
    /// `setRaw`: an assignment used verbatim.
    SetRaw,
    /// `groupBy`.
    GroupBy,
    /// `orderBy`.
    OrderBy,
    /// `limit`.
    Limit,
    /// `offset`.
    Offset,
    /// `mapJoin`: maps joined columns onto a relation of the result.
    MapJoin,
    /// Anything else. Unknown commands are skipped, never rejected.
    Unknown,
}

impl Command {
    /// Classifies a command name.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "select" => Self::Select,
            "selectRaw" => Self::SelectRaw,
            "from" => Self::From,
            "fromGroup" => Self::FromGroup,
            "innerJoin" | "join" => Self::InnerJoin,
            "leftJoin" => Self::LeftJoin,
            "innerJoinGroup" | "joinGroup" => Self::InnerJoinGroup,
            "leftJoinGroup" => Self::LeftJoinGroup,
            "where" => Self::Where,
            "and" => Self::And,
            "or" => Self::Or,
            "group" | "whereGroup" | "andGroup" => Self::AndGroup,
            "orGroup" => Self::OrGroup,
            "endGroup" => Self::EndGroup,
            "whereExistsGroup" | "whereExists" => Self::WhereExistsGroup,
            "whereNotExistsGroup" | "whereNotExists" => Self::WhereNotExistsGroup,
            "insertInto" | "insert" => Self::InsertInto,
            "update" => Self::Update,
            "deleteFrom" | "delete" => Self::DeleteFrom,
            "value" | "values" => Self::Value,
            "set" => Self::Set,
            "setRaw" => Self::SetRaw,
            "groupBy" => Self::GroupBy,
            "orderBy" => Self::OrderBy,
            "limit" => Self::Limit,
            "offset" => Self::Offset,
            "mapJoin" => Self::MapJoin,
            _ => Self::Unknown,
        }
    }

    /// Returns whether this command opens a group closed by `endGroup`.
    #[must_use]
    pub const fn opens_group(self) -> bool {
        matches!(
            self,
            Self::FromGroup
                | Self::InnerJoinGroup
                | Self::LeftJoinGroup
                | Self::AndGroup
                | Self::OrGroup
                | Self::WhereExistsGroup
                | Self::WhereNotExistsGroup
        )
    }

    /// Returns whether this command contributes a join.
    #[must_use]
    pub const fn is_join(self) -> bool {
        matches!(
            self,
            Self::InnerJoin | Self::LeftJoin | Self::InnerJoinGroup | Self::LeftJoinGroup
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("innerJoinGroup"), Command::InnerJoinGroup);
        assert_eq!(Command::parse("orGroup"), Command::OrGroup);
        assert_eq!(Command::parse("group"), Command::AndGroup);
        assert_eq!(Command::parse("whereNotExists"), Command::WhereNotExistsGroup);
        assert_eq!(Command::parse("frobnicate"), Command::Unknown);
    }

    #[test]
    fn test_group_openers() {
        assert!(Command::FromGroup.opens_group());
        assert!(Command::WhereExistsGroup.opens_group());
        assert!(!Command::EndGroup.opens_group());
        assert!(!Command::Where.opens_group());
    }

    #[test]
    fn test_unknown_group_still_opens() {
        assert!(DslStatement::new("whereInGroup", ["Users::getId"]).opens_group());
        assert!(DslStatement::new("group", Vec::<String>::new()).opens_group());
        assert!(!DslStatement::new("endGroup", Vec::<String>::new()).opens_group());
        assert!(!DslStatement::new("groupBy", ["id"]).opens_group());
    }

    #[test]
    fn test_require_argument() {
        let stmt = DslStatement::new("limit", Vec::<String>::new());
        let err = stmt.require(0).unwrap_err();
        assert_eq!(
            err,
            crate::CompileError::MissingArgument {
                command: "limit".to_string(),
                position: 0
            }
        );
        let stmt = DslStatement::new("limit", [" 10 "]);
        assert_eq!(stmt.require(0), Ok("10"));
    }
}
