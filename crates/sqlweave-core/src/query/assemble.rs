//! Rendering a populated build context to SQL text.

use super::context::{BuildContext, StatementKind};

/// Renders the context as one SQL statement, one clause per line.
///
/// Clause order is fixed per statement kind; empty clauses are omitted.
#[must_use]
pub fn assemble(ctx: &BuildContext) -> String {
    let mut clauses: Vec<String> = Vec::new();
    let target = ctx.target.as_deref().unwrap_or(&ctx.table_prefix);

    match ctx.kind {
        StatementKind::Select => {
            if ctx.columns.is_empty() {
                clauses.push("SELECT *".to_string());
            } else {
                clauses.push(format!("SELECT {}", ctx.columns.join(", ")));
            }
            if ctx.tables.is_empty() {
                clauses.push(format!("FROM {}", ctx.table_prefix));
            } else {
                clauses.push(format!("FROM {}", ctx.tables.join(", ")));
            }
            clauses.extend(ctx.joins.iter().cloned());
            push_where(ctx, &mut clauses);
            if !ctx.group_bys.is_empty() {
                clauses.push(format!("GROUP BY {}", ctx.group_bys.join(", ")));
            }
            if !ctx.order_bys.is_empty() {
                clauses.push(format!("ORDER BY {}", ctx.order_bys.join(", ")));
            }
            if let Some(limit) = &ctx.limit {
                clauses.push(format!("LIMIT {limit}"));
            }
            if let Some(offset) = &ctx.offset {
                clauses.push(format!("OFFSET {offset}"));
            }
        }
        StatementKind::Insert => {
            if ctx.insert_columns.is_empty() {
                clauses.push(format!("INSERT INTO {target}"));
            } else {
                clauses.push(format!(
                    "INSERT INTO {target} ({})",
                    ctx.insert_columns.join(", ")
                ));
            }
            if !ctx.insert_values.is_empty() {
                clauses.push(format!("VALUES ({})", ctx.insert_values.join(", ")));
            }
        }
        StatementKind::Update => {
            clauses.push(format!("UPDATE {target}"));
            if !ctx.sets.is_empty() {
                clauses.push(format!("SET {}", ctx.sets.join(", ")));
            }
            push_where(ctx, &mut clauses);
        }
        StatementKind::Delete => {
            clauses.push(format!("DELETE FROM {target}"));
            push_where(ctx, &mut clauses);
        }
    }

    clauses.join("\n")
}

fn push_where(ctx: &BuildContext, clauses: &mut Vec<String>) {
    if !ctx.wheres.is_empty() {
        clauses.push(format!("WHERE {}", ctx.wheres.join(" AND ")));
    }
}
