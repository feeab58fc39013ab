/// A statement produced by the statement reader.
///
/// Only SELECT statements carry a body; every other statement kind is
/// recorded by name so the translator can report it.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `SELECT ... FROM ...`
    Select(SelectStatement),

    /// Any other statement, e.g. `DELETE`
    Other { kind: String },
}

impl Statement {
    /// Upper-case statement kind (`SELECT`, `DELETE`, ...).
    pub fn kind(&self) -> &str {
        match self {
            Statement::Select(_) => "SELECT",
            Statement::Other { kind } => kind,
        }
    }
}

/// Parsed SELECT statement.
///
/// Field texts are kept as written in the source; WHERE and HAVING are flat
/// condition lists whose parenthesized groups are recovered from the bracket
/// depth of each node (see [`Condition::bracket_depth`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectStatement {
    /// Tables named in `FROM` (only the first is used)
    pub from: Vec<TableReference>,

    /// Select list
    pub expr: Vec<SelectExpression>,

    /// `WHERE` condition list
    pub where_conditions: Vec<Condition>,

    /// `GROUP BY` items
    pub group: Vec<GroupItem>,

    /// `HAVING` condition list
    pub having: Vec<Condition>,

    /// `ORDER BY` items
    pub order: Vec<OrderItem>,

    pub limit: Option<Limit>,

    /// `USE INDEX (...)` style hints
    pub index_hints: Vec<IndexHint>,
}

/// Table reference of a `FROM` clause.
///
/// # Examples
/// ```text
/// users
/// shop.users u
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TableReference {
    pub table: String,
    pub database: Option<String>,
    pub alias: Option<String>,
}

/// One item of the select list.
///
/// # Examples
/// ```text
/// user_id                      -> expr "user_id"
/// count(*)                     -> expr "count(*)", function "count"
/// sum(cost) / count(*) as avg  -> function "sum", alias "avg"
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SelectExpression {
    /// Source text of the expression (without the alias)
    pub expr: String,

    /// Name of the first function called in the expression
    pub function: Option<String>,

    pub alias: Option<String>,
}

impl SelectExpression {
    pub fn field(expr: impl Into<String>) -> Self {
        SelectExpression {
            expr: expr.into(),
            function: None,
            alias: None,
        }
    }

    pub fn function(
        expr: impl Into<String>,
        function: impl Into<String>,
        alias: Option<&str>,
    ) -> Self {
        SelectExpression {
            expr: expr.into(),
            function: Some(function.into()),
            alias: alias.map(str::to_string),
        }
    }
}

/// A node of a flat WHERE/HAVING condition list.
///
/// A node is either a connective (`AND` / `OR`) or a leaf comparison such as
/// `age > 12`. Parentheses that group several nodes stay in the leaf texts:
/// `(a = 1 or b = 2)` becomes the nodes `(a = 1`, `OR`, `b = 2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub is_operator: bool,

    /// Connective keyword or the leaf's source text
    pub expr: String,

    /// Literal sub-strings of the leaf: identifier words, back-quoted names and
    /// unquoted string literal contents, in order of first appearance
    pub identifiers: Vec<String>,
}

impl Condition {
    pub fn connective(keyword: &str) -> Self {
        Condition {
            is_operator: true,
            expr: keyword.to_ascii_uppercase(),
            identifiers: vec![],
        }
    }

    pub fn leaf(expr: impl Into<String>, identifiers: Vec<String>) -> Self {
        Condition {
            is_operator: false,
            expr: expr.into(),
            identifiers,
        }
    }

    pub fn is_or(&self) -> bool {
        self.is_operator && self.expr.eq_ignore_ascii_case("or")
    }

    /// Net number of parentheses this node opens (positive) or closes
    /// (negative), not counting parentheses inside its literals.
    pub fn bracket_depth(&self) -> i32 {
        let count = |text: &str, bracket: char| text.matches(bracket).count() as i32;

        let (literal_open, literal_close) = self
            .identifiers
            .iter()
            .fold((0, 0), |(open, close), identifier| {
                (open + count(identifier, '('), close + count(identifier, ')'))
            });

        (count(&self.expr, '(') - literal_open) - (count(&self.expr, ')') - literal_close)
    }
}

/// `GROUP BY` item.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupItem {
    pub expr: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// `ORDER BY` item.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub expr: String,
    pub direction: SortDirection,
}

/// `LIMIT offset, row_count`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limit {
    pub offset: u64,
    pub row_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexHintKind {
    Use,
    Force,
    Ignore,
}

/// Index hint clause, e.g. `USE INDEX (created_at_idx)`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHint {
    pub kind: IndexHintKind,
    pub indexes: Vec<String>,
}
