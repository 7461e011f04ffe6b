//! Boolean condition trees.

use std::fmt;

/// Logical connective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Logic {
    /// `AND`.
    #[default]
    And,
    /// `OR`.
    Or,
}

impl Logic {
    /// Returns the logic a command implies: `OR` for commands starting
    /// with `or`, `AND` otherwise.
    #[must_use]
    pub fn of_command(command: &str) -> Self {
        if command.starts_with("or") {
            Self::Or
        } else {
            Self::And
        }
    }

    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One entry of a condition group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionItem {
    /// A rendered comparison such as `o.user_id = 1`.
    Leaf(String),
    /// A rendered `EXISTS (...)` / `NOT EXISTS (...)` predicate.
    Exists(String),
    /// A parenthesized sub-group.
    Group(ConditionGroup),
}

/// An ordered list of conditions, each joined to its predecessor by its
/// own connective.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConditionGroup {
    /// The group's own logic, used as the connective in front of it.
    pub logic: Logic,
    children: Vec<(Logic, ConditionItem)>,
}

impl ConditionGroup {
    /// Creates an empty group.
    #[must_use]
    pub fn new(logic: Logic) -> Self {
        Self {
            logic,
            children: Vec::new(),
        }
    }

    /// Appends an entry joined by `logic`.
    pub fn push(&mut self, logic: Logic, item: ConditionItem) {
        self.children.push((logic, item));
    }

    /// Appends a sub-group, joined by the sub-group's own logic.
    pub fn push_group(&mut self, group: Self) {
        let logic = group.logic;
        self.children.push((logic, ConditionItem::Group(group)));
    }

    /// Returns whether the group renders to nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.iter().all(|(_, item)| match item {
            ConditionItem::Group(group) => group.is_empty(),
            ConditionItem::Leaf(_) | ConditionItem::Exists(_) => false,
        })
    }

    /// Returns the number of nested group levels below this group.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .filter_map(|(_, item)| match item {
                ConditionItem::Group(group) => Some(1 + group.depth()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Renders the group left to right. The first rendered entry carries
    /// no connective; sub-groups are parenthesized; empty sub-groups are
    /// skipped.
    #[must_use]
    pub fn render(&self) -> String {
        let mut sql = String::new();
        for (logic, item) in &self.children {
            let fragment = match item {
                ConditionItem::Leaf(s) | ConditionItem::Exists(s) => s.clone(),
                ConditionItem::Group(group) if group.is_empty() => continue,
                ConditionItem::Group(group) => format!("({})", group.render()),
            };
            if !sql.is_empty() {
                sql.push(' ');
                sql.push_str(logic.as_sql());
                sql.push(' ');
            }
            sql.push_str(&fragment);
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(s: &str) -> ConditionItem {
        ConditionItem::Leaf(s.to_string())
    }

    #[test]
    fn test_render_flat() {
        let mut group = ConditionGroup::new(Logic::And);
        group.push(Logic::And, leaf("a = 1"));
        group.push(Logic::Or, leaf("b = 2"));
        assert_eq!(group.render(), "a = 1 OR b = 2");
        assert_eq!(group.depth(), 0);
    }

    #[test]
    fn test_render_nested() {
        let mut inner = ConditionGroup::new(Logic::Or);
        inner.push(Logic::And, leaf("b = 2"));
        inner.push(Logic::Or, leaf("c = 3"));

        let mut outer = ConditionGroup::new(Logic::And);
        outer.push(Logic::And, leaf("a = 1"));
        outer.push_group(inner);

        assert_eq!(outer.render(), "a = 1 OR (b = 2 OR c = 3)");
        assert_eq!(outer.depth(), 1);
    }

    #[test]
    fn test_empty_groups_are_skipped() {
        let mut outer = ConditionGroup::new(Logic::And);
        outer.push_group(ConditionGroup::new(Logic::Or));
        assert!(outer.is_empty());
        outer.push(Logic::And, leaf("a = 1"));
        assert_eq!(outer.render(), "a = 1");
    }

    #[test]
    fn test_logic_of_command() {
        assert_eq!(Logic::of_command("orGroup"), Logic::Or);
        assert_eq!(Logic::of_command("andGroup"), Logic::And);
        assert_eq!(Logic::of_command("group"), Logic::And);
    }
}
