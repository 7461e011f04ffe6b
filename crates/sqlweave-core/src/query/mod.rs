//! Query compilation: statement list to SQL text.
//!
//! The pipeline for one compilation unit is:
//!
//! 1. parse the flat statement list into a [`StatementTree`](crate::statement::StatementTree);
//! 2. pre-scan every `from`/join/`mapJoin` to fill the [`AliasMap`];
//! 3. turn each statement into a [`Node`] and apply it to a [`BuildContext`];
//!    conditions collect into a [`ConditionGroup`], and EXISTS bodies,
//!    join groups and `fromGroup` bodies compile recursively into their
//!    own contexts;
//! 4. [`assemble`] the context into SQL.

mod alias;
mod assemble;
mod compiler;
mod condition;
mod context;
mod node;
mod operand;
mod resolver;
mod typecheck;

pub use alias::{AliasMap, TableRef};
pub use assemble::assemble;
pub use compiler::{CompiledQuery, QueryCompiler};
pub use condition::{ConditionGroup, ConditionItem, Logic};
pub use context::{BuildContext, MapJoin, MapJoinKind, StatementKind};
pub use node::Node;
pub use operand::{accessor_to_field, ColumnRef, FieldTarget, Literal, Operand};
pub use resolver::{quote, Resolver};
pub use typecheck::check_condition;
