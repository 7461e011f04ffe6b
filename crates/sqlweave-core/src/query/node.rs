//! Compiled fragments and how they land in the build context.

use super::context::{BuildContext, MapJoin, StatementKind};

/// One compiled fragment of a statement list.
///
/// Every variant is fully resolved at construction; applying it only
/// copies text into the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A SELECT list fragment.
    Select(String),
    /// A FROM item: `orders o` or `(...) AS sub`.
    Table(String),
    /// A rendered JOIN clause.
    Join(String),
    /// A rendered WHERE fragment.
    Where(String),
    /// Switches the statement kind, optionally naming the target table.
    Action {
        /// New statement kind.
        kind: StatementKind,
        /// Target table, when given.
        target: Option<String>,
    },
    /// A `col = value` assignment.
    Assign(String),
    /// An INSERT column and its value.
    InsertValue {
        /// Unqualified column.
        column: String,
        /// Formatted value.
        value: String,
    },
    /// GROUP BY items.
    GroupBy(Vec<String>),
    /// One ORDER BY item list, direction included.
    OrderBy(String),
    /// LIMIT value.
    Limit(String),
    /// OFFSET value.
    Offset(String),
    /// A result-shape hint; emits no SQL.
    MapJoin(MapJoin),
}

impl Node {
    /// Writes the fragment into the context.
    pub fn apply(self, ctx: &mut BuildContext) {
        match self {
            Self::Select(columns) => ctx.columns.push(columns),
            Self::Table(table) => ctx.add_table(table),
            Self::Join(join) => ctx.joins.push(join),
            Self::Where(condition) => ctx.wheres.push(condition),
            Self::Action { kind, target } => {
                ctx.kind = kind;
                if target.is_some() {
                    ctx.target = target;
                }
            }
            Self::Assign(assignment) => ctx.sets.push(assignment),
            Self::InsertValue { column, value } => {
                ctx.insert_columns.push(column);
                ctx.insert_values.push(value);
            }
            Self::GroupBy(items) => ctx.group_bys.extend(items),
            Self::OrderBy(item) => ctx.order_bys.push(item),
            Self::Limit(limit) => ctx.limit = Some(limit),
            Self::Offset(offset) => ctx.offset = Some(offset),
            Self::MapJoin(map_join) => ctx.map_joins.push(map_join),
        }
    }
}
