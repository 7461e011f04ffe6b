//! Parsing the flat statement list into a nested tree.

use super::{Command, DslStatement};
use crate::error::{CompileError, Result};

/// A node of the statement tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// A statement that opens nothing.
    Leaf(DslStatement),
    /// A `...Group` opener and everything up to its `endGroup`.
    Group {
        /// The opening statement.
        opener: DslStatement,
        /// The enclosed statements, already nested.
        body: Vec<Item>,
    },
}

impl Item {
    /// Returns the statement that produced this item.
    #[must_use]
    pub fn statement(&self) -> &DslStatement {
        match self {
            Self::Leaf(stmt) | Self::Group { opener: stmt, .. } => stmt,
        }
    }

    /// Returns the classified command of this item.
    #[must_use]
    pub fn command(&self) -> Command {
        self.statement().kind()
    }
}

/// A statement list parsed into nested groups.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatementTree {
    items: Vec<Item>,
}

impl StatementTree {
    /// Parses a flat statement list in one pass with an explicit stack.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnmatchedEndGroup`] for an `endGroup` with
    /// no open group and [`CompileError::UnclosedGroup`] when input ends
    /// with a group still open.
    pub fn parse(statements: &[DslStatement]) -> Result<Self> {
        let mut root: Vec<Item> = Vec::new();
        let mut stack: Vec<(DslStatement, Vec<Item>)> = Vec::new();

        for (index, stmt) in statements.iter().enumerate() {
            if stmt.opens_group() {
                stack.push((stmt.clone(), Vec::new()));
                continue;
            }
            if stmt.kind() == Command::EndGroup {
                let (opener, body) = stack
                    .pop()
                    .ok_or(CompileError::UnmatchedEndGroup { index })?;
                let group = Item::Group { opener, body };
                match stack.last_mut() {
                    Some((_, parent)) => parent.push(group),
                    None => root.push(group),
                }
                continue;
            }
            let leaf = Item::Leaf(stmt.clone());
            match stack.last_mut() {
                Some((_, parent)) => parent.push(leaf),
                None => root.push(leaf),
            }
        }

        if let Some((opener, _)) = stack.pop() {
            return Err(CompileError::UnclosedGroup {
                command: opener.command,
            });
        }

        Ok(Self { items: root })
    }

    /// Builds a tree from already nested items.
    #[must_use]
    pub fn from_items(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// Returns the top-level items.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Returns the number of group openers anywhere in the tree.
    #[must_use]
    pub fn group_count(&self) -> usize {
        fn count(items: &[Item]) -> usize {
            items
                .iter()
                .map(|item| match item {
                    Item::Leaf(_) => 0,
                    Item::Group { body, .. } => 1 + count(body),
                })
                .sum()
        }
        count(&self.items)
    }

    /// Returns the deepest group nesting in the tree.
    #[must_use]
    pub fn depth(&self) -> usize {
        fn depth(items: &[Item]) -> usize {
            items
                .iter()
                .map(|item| match item {
                    Item::Leaf(_) => 0,
                    Item::Group { body, .. } => 1 + depth(body),
                })
                .max()
                .unwrap_or(0)
        }
        depth(&self.items)
    }
}
