//! The statement-to-node compiler.

use serde::Serialize;
use tracing::{debug, warn};

use super::alias::{from_ref, join_group_ref, join_ref, AliasMap, TableRef};
use super::assemble::assemble;
use super::condition::{ConditionGroup, ConditionItem, Logic};
use super::context::{BuildContext, MapJoin, StatementKind};
use super::node::Node;
use super::operand::{clean_entity_name, strip_quotes, Operand};
use super::resolver::Resolver;
use super::typecheck::check_condition;
use crate::error::{CompileError, Result};
use crate::metadata::EntityRegistry;
use crate::statement::{Command, DslStatement, Item, StatementTree};

/// The output of one compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledQuery {
    /// SQL text, one clause per line.
    pub sql: String,
    /// Statement kind.
    pub kind: StatementKind,
    /// `mapJoin` hints for the result-mapping writer.
    pub map_joins: Vec<MapJoin>,
}

/// Compiles statement lists against a populated registry.
///
/// # Example
///
/// ```rust
/// use sqlweave_core::{DslStatement, EntityMeta, EntityRegistry, QueryCompiler};
///
/// let mut registry = EntityRegistry::new();
/// registry.register_meta("Orders", EntityMeta::new("orders"));
///
/// let statements = vec![
///     DslStatement::new("from", ["Orders", "o"]),
///     DslStatement::new("where", ["Orders::getUserId", "=", "1"]),
/// ];
/// let query = QueryCompiler::new(&registry)
///     .compile(&statements, "Orders")
///     .unwrap();
/// assert_eq!(query.sql, "SELECT *\nFROM orders o\nWHERE o.user_id = 1");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct QueryCompiler<'r> {
    registry: &'r EntityRegistry,
}

impl<'r> QueryCompiler<'r> {
    /// Creates a compiler reading from `registry`.
    #[must_use]
    pub const fn new(registry: &'r EntityRegistry) -> Self {
        Self { registry }
    }

    /// Compiles a flat statement list whose main entity is `main_entity`.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] for unbalanced groups, backwards joins,
    /// condition type mismatches and missing arguments.
    pub fn compile(&self, statements: &[DslStatement], main_entity: &str) -> Result<CompiledQuery> {
        let tree = StatementTree::parse(statements)?;
        self.compile_tree(&tree, main_entity)
    }

    /// Compiles an already parsed statement tree.
    ///
    /// # Errors
    ///
    /// See [`QueryCompiler::compile`].
    pub fn compile_tree(&self, tree: &StatementTree, main_entity: &str) -> Result<CompiledQuery> {
        self.compile_items(tree.items(), main_entity, None)
    }

    fn compile_items(
        &self,
        items: &[Item],
        main_entity: &str,
        inherited: Option<&AliasMap>,
    ) -> Result<CompiledQuery> {
        let main_table = self.registry.table_name(main_entity).to_string();
        let mut ctx = BuildContext::new(main_table.clone());
        if let Some(parent) = inherited {
            ctx.aliases = parent.clone();
        }
        ctx.aliases
            .register(main_entity, &TableRef::new(main_table, None));
        ctx.aliases.prescan(items, self.registry, main_entity);
        ctx.requires_prefix = requires_prefix(items);

        let mut conditions = ConditionGroup::new(Logic::And);
        for item in items {
            self.compile_item(item, main_entity, &mut ctx, &mut conditions)?;
        }
        if !conditions.is_empty() {
            Node::Where(conditions.render()).apply(&mut ctx);
        }

        let sql = assemble(&ctx);
        debug!(entity = main_entity, kind = %ctx.kind, sql = %sql, "Compiled query");
        Ok(CompiledQuery {
            sql,
            kind: ctx.kind,
            map_joins: ctx.map_joins,
        })
    }

    fn compile_item(
        &self,
        item: &Item,
        main_entity: &str,
        ctx: &mut BuildContext,
        conditions: &mut ConditionGroup,
    ) -> Result<()> {
        match item {
            Item::Leaf(stmt) => match stmt.kind() {
                Command::Where | Command::And | Command::Or => {
                    let logic = leaf_logic(stmt.kind(), Logic::And);
                    let condition = self.condition(stmt, ctx)?;
                    conditions.push(logic, ConditionItem::Leaf(condition));
                }
                Command::MapJoin => {
                    if let Some(map_join) =
                        MapJoin::from_statement(stmt, self.registry, main_entity, ctx.joins.len())
                    {
                        if map_join.target.is_none() {
                            warn!(
                                entity = %map_join.parent_entity,
                                field = %map_join.field,
                                "mapJoin target entity has no declared relation"
                            );
                        }
                        Node::MapJoin(map_join).apply(ctx);
                    }
                }
                Command::Unknown => {
                    debug!(command = %stmt.command, "Skipping unknown command");
                }
                _ => {
                    if let Some(node) = self.leaf_node(stmt, ctx)? {
                        node.apply(ctx);
                    }
                }
            },
            Item::Group { opener, body } => match opener.kind() {
                Command::FromGroup => {
                    let sub_entity = self.sub_entity(body, main_entity);
                    let sub = self.compile_items(body, &sub_entity, Some(&ctx.aliases))?;
                    let alias = opener
                        .arg(0)
                        .map(strip_quotes)
                        .filter(|a| !a.is_empty())
                        .unwrap_or("sub");
                    Node::Table(format!("(\n{}\n) AS {alias}", indent(&sub.sql))).apply(ctx);
                }
                Command::InnerJoinGroup | Command::LeftJoinGroup => {
                    let node = self.join_group(opener, body, main_entity, ctx)?;
                    node.apply(ctx);
                }
                Command::AndGroup | Command::OrGroup => {
                    let logic = Logic::of_command(&opener.command);
                    let group = self.condition_group(body, logic, main_entity, ctx)?;
                    conditions.push_group(group);
                }
                Command::WhereExistsGroup | Command::WhereNotExistsGroup => {
                    let exists = self.exists(opener, body, main_entity, ctx)?;
                    conditions.push(Logic::And, ConditionItem::Exists(exists));
                }
                _ => {
                    debug!(command = %opener.command, "Skipping unknown group");
                }
            },
        }
        Ok(())
    }

    fn leaf_node(&self, stmt: &DslStatement, ctx: &BuildContext) -> Result<Option<Node>> {
        let resolver = Resolver::new(self.registry, ctx);
        let node = match stmt.kind() {
            Command::Select => Node::Select(
                stmt.args
                    .iter()
                    .map(|arg| resolver.column_token(arg))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Command::SelectRaw => Node::Select(
                stmt.args
                    .iter()
                    .map(|arg| strip_quotes(arg).to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Command::From => {
                let (_, table_ref) =
                    from_ref(stmt, self.registry).ok_or_else(|| missing(stmt, 0))?;
                Node::Table(table_ref.render())
            }
            Command::InnerJoin | Command::LeftJoin => self.join(stmt, &resolver)?,
            Command::InsertInto => self.action(stmt, StatementKind::Insert),
            Command::Update => self.action(stmt, StatementKind::Update),
            Command::DeleteFrom => self.action(stmt, StatementKind::Delete),
            Command::Value => Node::InsertValue {
                column: resolver.bare_column_token(stmt.require(0)?),
                value: resolver.value_token(stmt.require(1)?),
            },
            Command::Set => Node::Assign(format!(
                "{} = {}",
                resolver.bare_column_token(stmt.require(0)?),
                resolver.value_token(stmt.require(1)?)
            )),
            Command::SetRaw => match stmt.arg(1) {
                Some(expr) => Node::Assign(format!(
                    "{} = {}",
                    resolver.bare_column_token(stmt.require(0)?),
                    resolver.column_token(expr)
                )),
                None => Node::Assign(strip_quotes(stmt.require(0)?).to_string()),
            },
            Command::GroupBy => Node::GroupBy(
                stmt.args
                    .iter()
                    .map(|arg| resolver.column_token(arg))
                    .collect(),
            ),
            Command::OrderBy => order_by(stmt, &resolver)?,
            Command::Limit => Node::Limit(resolver.column_token(stmt.require(0)?)),
            Command::Offset => Node::Offset(resolver.column_token(stmt.require(0)?)),
            _ => return Ok(None),
        };
        Ok(Some(node))
    }

    fn action(&self, stmt: &DslStatement, kind: StatementKind) -> Node {
        let target = stmt
            .arg(0)
            .map(clean_entity_name)
            .filter(|e| !e.is_empty())
            .map(|entity| self.registry.table_name(&entity).to_string());
        Node::Action { kind, target }
    }

    fn join(&self, stmt: &DslStatement, resolver: &Resolver<'_>) -> Result<Node> {
        let (_, table_ref) = join_ref(stmt, self.registry).ok_or_else(|| missing(stmt, 0))?;
        let left_token = stmt.require(1)?;
        let right_token = stmt.require(2)?;
        let left = Operand::parse(left_token);

        if let Some(owner) = resolver.owner_table(&left) {
            if owner != table_ref.table {
                return Err(CompileError::JoinTargetMismatch {
                    target: table_ref.table,
                    left_column: left_token.to_string(),
                    owner,
                });
            }
        }

        let keyword = join_keyword(stmt.kind());
        Ok(Node::Join(format!(
            "{keyword} {} ON {} = {}",
            table_ref.render(),
            resolver.column(&left),
            resolver.column_token(right_token)
        )))
    }

    fn join_group(
        &self,
        opener: &DslStatement,
        body: &[Item],
        main_entity: &str,
        ctx: &BuildContext,
    ) -> Result<Node> {
        let (entity, table_ref) =
            join_group_ref(opener, self.registry).ok_or_else(|| missing(opener, 0))?;
        let sub_entity = if self.registry.lookup(&entity).is_some() {
            entity.as_str()
        } else {
            main_entity
        };
        let sub = self.compile_items(body, sub_entity, Some(&ctx.aliases))?;

        let resolver = Resolver::new(self.registry, ctx);
        let left = resolver.column_token(opener.require(1)?);
        let right = resolver.column_token(opener.require(2)?);
        Ok(Node::Join(format!(
            "{} (\n{}\n) AS {} ON {left} = {right}",
            join_keyword(opener.kind()),
            indent(&sub.sql),
            table_ref.qualifier()
        )))
    }

    fn exists(
        &self,
        opener: &DslStatement,
        body: &[Item],
        main_entity: &str,
        ctx: &BuildContext,
    ) -> Result<String> {
        let keyword = if opener.kind() == Command::WhereNotExistsGroup {
            "NOT EXISTS"
        } else {
            "EXISTS"
        };
        if body.is_empty() {
            return Ok(format!("{keyword} (SELECT 1)"));
        }
        let sub_entity = self.sub_entity(body, main_entity);
        let sub = self.compile_items(body, &sub_entity, Some(&ctx.aliases))?;
        Ok(format!("{keyword} (\n{}\n)", sub.sql))
    }

    fn condition_group(
        &self,
        body: &[Item],
        logic: Logic,
        main_entity: &str,
        ctx: &BuildContext,
    ) -> Result<ConditionGroup> {
        let mut group = ConditionGroup::new(logic);
        for item in body {
            match (item, item.command()) {
                (Item::Leaf(stmt), Command::Where | Command::And | Command::Or) => {
                    let condition = self.condition(stmt, ctx)?;
                    group.push(leaf_logic(stmt.kind(), logic), ConditionItem::Leaf(condition));
                }
                (Item::Group { body, .. }, command @ (Command::AndGroup | Command::OrGroup)) => {
                    let nested_logic = if command == Command::OrGroup {
                        Logic::Or
                    } else {
                        Logic::And
                    };
                    group.push_group(self.condition_group(body, nested_logic, main_entity, ctx)?);
                }
                (
                    Item::Group { opener, body },
                    Command::WhereExistsGroup | Command::WhereNotExistsGroup,
                ) => {
                    let exists = self.exists(opener, body, main_entity, ctx)?;
                    group.push(logic, ConditionItem::Exists(exists));
                }
                _ => {
                    debug!(
                        command = %item.statement().command,
                        "Ignoring non-condition statement inside a condition group"
                    );
                }
            }
        }
        Ok(group)
    }

    fn condition(&self, stmt: &DslStatement, ctx: &BuildContext) -> Result<String> {
        let resolver = Resolver::new(self.registry, ctx);
        let left_token = stmt.require(0)?;
        let left = Operand::parse(left_token);
        let Some(operator) = stmt.arg(1) else {
            return Ok(resolver.column(&left));
        };
        let operator = strip_quotes(operator);
        let Some(right_token) = stmt.arg(2) else {
            return Ok(format!("{} {operator}", resolver.column(&left)));
        };

        let right = Operand::parse(right_token);
        check_condition(&resolver, &left, &right)?;
        Ok(format!(
            "{} {operator} {}",
            resolver.column(&left),
            resolver.value(&right)
        ))
    }

    fn sub_entity(&self, body: &[Item], main_entity: &str) -> String {
        body.iter()
            .find(|item| item.command() == Command::From)
            .and_then(|item| item.statement().arg(0))
            .map(clean_entity_name)
            .filter(|entity| self.registry.contains(entity))
            .unwrap_or_else(|| main_entity.to_string())
    }
}

fn order_by(stmt: &DslStatement, resolver: &Resolver<'_>) -> Result<Node> {
    let mut args: Vec<&str> = stmt.args.iter().map(|a| strip_quotes(a)).collect();
    let direction = match args.last() {
        Some(last) if last.eq_ignore_ascii_case("ASC") || last.eq_ignore_ascii_case("DESC") => {
            let direction = last.to_ascii_uppercase();
            args.pop();
            Some(direction)
        }
        _ => None,
    };
    if args.is_empty() {
        return Err(missing(stmt, 0));
    }
    let columns = args
        .iter()
        .map(|arg| resolver.column_token(arg))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(Node::OrderBy(match direction {
        Some(direction) => format!("{columns} {direction}"),
        None => columns,
    }))
}

fn leaf_logic(command: Command, enclosing: Logic) -> Logic {
    match command {
        Command::And => Logic::And,
        Command::Or => Logic::Or,
        _ => enclosing,
    }
}

const fn join_keyword(command: Command) -> &'static str {
    match command {
        Command::LeftJoin | Command::LeftJoinGroup => "LEFT JOIN",
        _ => "INNER JOIN",
    }
}

fn requires_prefix(items: &[Item]) -> bool {
    items.iter().any(|item| {
        let command = item.command();
        command.is_join()
            || matches!(
                command,
                Command::WhereExistsGroup | Command::WhereNotExistsGroup
            )
            || matches!(item, Item::Group { body, .. }
                if command != Command::Unknown && requires_prefix(body))
    })
}

fn indent(sql: &str) -> String {
    sql.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn missing(stmt: &DslStatement, position: usize) -> CompileError {
    CompileError::MissingArgument {
        command: stmt.command.clone(),
        position,
    }
}
