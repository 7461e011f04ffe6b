//! Typed operands parsed from DSL argument tokens.
//!
//! Arguments arrive as source text. This module classifies each token once
//! into an [`Operand`] so the resolver can dispatch on variants instead of
//! re-inspecting strings.

use crate::metadata::TypeClass;

/// A parsed argument token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// `raw(x)`: `x` resolved as a column expression, never quoted.
    Raw(Box<Operand>),
    /// `quoted(x)`: the field name or text of `x` in single quotes.
    Quoted(String),
    /// `bind(x)`: a named placeholder `#{x}`.
    Bind(String),
    /// A reference to an entity field or an alias-qualified field.
    Column(ColumnRef),
    /// A literal or an opaque fragment.
    Literal(Literal),
}

/// A field reference with an optional `AS` name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    /// What the reference points at.
    pub target: FieldTarget,
    /// Output name appended as `AS name`.
    pub as_name: Option<String>,
}

/// The two ways of naming a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTarget {
    /// `Entity::getField`, `alias|Entity::getField` or `col(alias, ...)`.
    Entity {
        /// Explicit qualifier, overriding the registered alias.
        alias: Option<String>,
        /// Entity name.
        entity: String,
        /// Field name with the accessor prefix removed.
        field: String,
    },
    /// `alias.field`.
    Alias {
        /// Alias or table name.
        alias: String,
        /// Field name.
        field: String,
    },
}

impl FieldTarget {
    /// Returns the field name.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Entity { field, .. } | Self::Alias { field, .. } => field,
        }
    }

    /// Returns the explicitly written qualifier, if any.
    #[must_use]
    pub fn explicit_alias(&self) -> Option<&str> {
        match self {
            Self::Entity { alias, .. } => alias.as_deref(),
            Self::Alias { alias, .. } => Some(alias),
        }
    }
}

/// Literal tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// A double-quoted source string, content unescaped.
    Text(String),
    /// A single-quoted SQL string, kept verbatim including its quotes.
    SqlString(String),
    /// `42`, `-7`.
    Integer(String),
    /// `42L`; stored without the suffix.
    Long(String),
    /// `3.14`.
    Decimal(String),
    /// `true` / `false`.
    Boolean(bool),
    /// `null` or an empty token.
    Null,
    /// `?` or a `#{...}` placeholder.
    Placeholder(String),
    /// Anything else, kept verbatim.
    Bare(String),
}

impl Literal {
    /// Classifies the literal for type checking.
    ///
    /// Placeholders, `NULL` and opaque fragments have no class and are
    /// never checked.
    #[must_use]
    pub const fn class(&self) -> Option<TypeClass> {
        match self {
            Self::Text(_) | Self::SqlString(_) => Some(TypeClass::String),
            Self::Integer(_) => Some(TypeClass::Integer),
            Self::Long(_) => Some(TypeClass::Long),
            Self::Decimal(_) => Some(TypeClass::Double),
            Self::Boolean(_) => Some(TypeClass::Boolean),
            Self::Null | Self::Placeholder(_) | Self::Bare(_) => None,
        }
    }
}

impl Operand {
    /// Parses an argument token.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        let t = token.trim();
        if t.is_empty() {
            return Self::Literal(Literal::Null);
        }

        if let Some(op) = parse_wrapper(t) {
            return op;
        }

        if let Some(inner) = unquote(t, '"') {
            return Self::Literal(Literal::Text(inner.to_string()));
        }
        if t.len() >= 2 && t.starts_with('\'') && t.ends_with('\'') {
            return Self::Literal(Literal::SqlString(t.to_string()));
        }
        if t == "?" || t.contains("#{") {
            return Self::Literal(Literal::Placeholder(t.to_string()));
        }
        if t.eq_ignore_ascii_case("null") {
            return Self::Literal(Literal::Null);
        }
        if t.eq_ignore_ascii_case("true") {
            return Self::Literal(Literal::Boolean(true));
        }
        if t.eq_ignore_ascii_case("false") {
            return Self::Literal(Literal::Boolean(false));
        }
        if let Some(number) = parse_number(t) {
            return Self::Literal(number);
        }

        if let Some(column) = parse_entity_field(t) {
            return Self::Column(column);
        }
        if let Some(column) = parse_alias_field(t) {
            return Self::Column(column);
        }

        Self::Literal(Literal::Bare(t.to_string()))
    }

    /// Returns the column reference if this operand is one.
    #[must_use]
    pub const fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            Self::Column(c) => Some(c),
            _ => None,
        }
    }
}

/// Strips the `get`/`is` accessor prefix and lower-cases the next letter.
///
/// The prefix is only removed when followed by an upper-case letter, so
/// plain field names such as `userId` or `issuer` pass through unchanged.
#[must_use]
pub fn accessor_to_field(accessor: &str) -> String {
    let accessor = accessor.trim().trim_end_matches("()");
    for prefix in ["get", "is"] {
        if let Some(rest) = accessor.strip_prefix(prefix) {
            let mut chars = rest.chars();
            if let Some(first) = chars.next().filter(char::is_ascii_uppercase) {
                return first.to_ascii_lowercase().to_string() + chars.as_str();
            }
        }
    }
    accessor.to_string()
}

/// Normalizes an entity token: drops `class ` and `.class` decorations and
/// any package qualification.
#[must_use]
pub fn clean_entity_name(raw: &str) -> String {
    let raw = raw.trim();
    let raw = unquote(raw, '"').unwrap_or(raw);
    let raw = raw.strip_prefix("class ").unwrap_or(raw);
    let raw = raw.strip_suffix(".class").unwrap_or(raw);
    raw.rsplit('.').next().unwrap_or(raw).trim().to_string()
}

/// Removes one level of surrounding single or double quotes.
#[must_use]
pub fn strip_quotes(raw: &str) -> &str {
    let raw = raw.trim();
    unquote(raw, '"')
        .or_else(|| unquote(raw, '\''))
        .unwrap_or(raw)
}

fn unquote(s: &str, quote: char) -> Option<&str> {
    if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

fn parse_wrapper(t: &str) -> Option<Operand> {
    if !t.ends_with(')') {
        return None;
    }

    // Postfix `.as(name)` binds loosest.
    if let Some(idx) = t.rfind(".as(") {
        let base = &t[..idx];
        let name = strip_quotes(&t[idx + 4..t.len() - 1]);
        if balanced(base) && !name.is_empty() {
            return Some(with_as_name(Operand::parse(base), name));
        }
    }

    let open = t.find('(')?;
    let name = &t[..open];
    let inner = &t[open + 1..t.len() - 1];
    if !balanced(inner) {
        return None;
    }

    match name {
        "raw" => Some(Operand::Raw(Box::new(Operand::parse(inner)))),
        "quoted" => Some(Operand::Quoted(field_or_text(inner))),
        "bind" => Some(Operand::Bind(field_or_text(inner))),
        "col" => {
            let (alias, field) = split_top_level_comma(inner)?;
            Some(qualified(strip_quotes(alias), field))
        }
        "as" => {
            let (expr, name) = split_top_level_comma(inner)?;
            Some(with_as_name(Operand::parse(expr), strip_quotes(name)))
        }
        _ => None,
    }
}

fn qualified(alias: &str, field: &str) -> Operand {
    match Operand::parse(field) {
        Operand::Column(ColumnRef {
            target: FieldTarget::Entity { entity, field, .. },
            as_name,
        }) => Operand::Column(ColumnRef {
            target: FieldTarget::Entity {
                alias: Some(alias.to_string()),
                entity,
                field,
            },
            as_name,
        }),
        Operand::Column(ColumnRef {
            target: FieldTarget::Alias { field, .. },
            as_name,
        }) => Operand::Column(ColumnRef {
            target: FieldTarget::Alias {
                alias: alias.to_string(),
                field,
            },
            as_name,
        }),
        _ => Operand::Column(ColumnRef {
            target: FieldTarget::Alias {
                alias: alias.to_string(),
                field: accessor_to_field(strip_quotes(field)),
            },
            as_name: None,
        }),
    }
}

fn with_as_name(op: Operand, name: &str) -> Operand {
    match op {
        Operand::Column(mut column) => {
            column.as_name = Some(name.to_string());
            Operand::Column(column)
        }
        Operand::Literal(Literal::Bare(expr)) => {
            Operand::Literal(Literal::Bare(format!("{expr} AS {name}")))
        }
        Operand::Raw(inner) => {
            Operand::Raw(Box::new(with_as_name(*inner, name)))
        }
        other => other,
    }
}

fn field_or_text(inner: &str) -> String {
    let inner = strip_quotes(inner);
    match inner.split_once("::") {
        Some((_, accessor)) => accessor_to_field(accessor),
        None => inner.to_string(),
    }
}

fn parse_number(t: &str) -> Option<Literal> {
    let digits = t.strip_prefix('-').unwrap_or(t);
    if digits.is_empty() {
        return None;
    }
    if digits.bytes().all(|b| b.is_ascii_digit()) {
        return Some(Literal::Integer(t.to_string()));
    }
    if let Some(long) = digits.strip_suffix(|c| c == 'L' || c == 'l') {
        if !long.is_empty() && long.bytes().all(|b| b.is_ascii_digit()) {
            return Some(Literal::Long(t[..t.len() - 1].to_string()));
        }
    }
    if let Some((whole, frac)) = digits.split_once('.') {
        if !whole.is_empty()
            && !frac.is_empty()
            && whole.bytes().all(|b| b.is_ascii_digit())
            && frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Some(Literal::Decimal(t.to_string()));
        }
    }
    None
}

fn parse_entity_field(t: &str) -> Option<ColumnRef> {
    let (left, right) = t.split_once("::")?;
    let (accessor, as_name) = match right.split_once('|') {
        Some((accessor, name)) => (accessor, Some(name.trim().to_string())),
        None => (right, None),
    };
    let (alias, entity) = match left.split_once('|') {
        Some((alias, entity)) => (Some(alias.trim().to_string()), entity),
        None => (None, left),
    };
    let entity = clean_entity_name(entity);
    let field = accessor_to_field(accessor);
    if entity.is_empty() || field.is_empty() {
        return None;
    }
    Some(ColumnRef {
        target: FieldTarget::Entity {
            alias,
            entity,
            field,
        },
        as_name,
    })
}

fn parse_alias_field(t: &str) -> Option<ColumnRef> {
    let (body, as_name) = match t.split_once('|') {
        Some((body, name)) => (body, Some(name.trim().to_string())),
        None => (t, None),
    };
    let (alias, field) = body.split_once('.')?;
    if !is_identifier(alias) || !is_identifier(field) {
        return None;
    }
    Some(ColumnRef {
        target: FieldTarget::Alias {
            alias: alias.to_string(),
            field: accessor_to_field(field),
        },
        as_name,
    })
}

/// Returns whether `s` is a plain identifier.
#[must_use]
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn balanced(s: &str) -> bool {
    let mut depth = 0i32;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn split_top_level_comma(s: &str) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth -= 1,
            (None, ',') if depth == 0 => return Some((s[..i].trim(), s[i + 1..].trim())),
            _ => {}
        }
    }
    None
}
