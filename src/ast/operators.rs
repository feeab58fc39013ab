/// Arithmetic operators of select-list expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    /// Addition (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`)
    Divide,
    /// Modulo (`%`)
    Mod,
}

impl ArithmeticOp {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(ArithmeticOp::Add),
            '-' => Some(ArithmeticOp::Subtract),
            '*' => Some(ArithmeticOp::Multiply),
            '/' => Some(ArithmeticOp::Divide),
            '%' => Some(ArithmeticOp::Mod),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            ArithmeticOp::Add => '+',
            ArithmeticOp::Subtract => '-',
            ArithmeticOp::Multiply => '*',
            ArithmeticOp::Divide => '/',
            ArithmeticOp::Mod => '%',
        }
    }

    /// Aggregation expression operator, e.g. `$multiply`.
    pub fn mongo_operator(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "$add",
            ArithmeticOp::Subtract => "$subtract",
            ArithmeticOp::Multiply => "$multiply",
            ArithmeticOp::Divide => "$divide",
            ArithmeticOp::Mod => "$mod",
        }
    }

    /// Shunting-yard priority; higher binds tighter.
    pub fn priority(self) -> u8 {
        match self {
            ArithmeticOp::Multiply | ArithmeticOp::Divide | ArithmeticOp::Mod => 2,
            ArithmeticOp::Add | ArithmeticOp::Subtract => 1,
        }
    }
}

/// SQL comparison of a WHERE/HAVING leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// `=` or the null-safe `<=>`
    Eq,
    /// `<>` or `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `IS [NOT]`
    Is,
    /// `[NOT] LIKE`
    Like,
    /// `[NOT] IN`
    In,
    /// `[NOT] BETWEEN low AND high`
    Between,
}

impl ComparisonOp {
    pub fn parse(token: &str) -> Option<Self> {
        let op = match token.to_ascii_lowercase().as_str() {
            "=" | "<=>" => ComparisonOp::Eq,
            "<>" | "!=" => ComparisonOp::NotEq,
            "<" => ComparisonOp::Lt,
            "<=" => ComparisonOp::Lte,
            ">" => ComparisonOp::Gt,
            ">=" => ComparisonOp::Gte,
            "is" => ComparisonOp::Is,
            "like" => ComparisonOp::Like,
            "in" => ComparisonOp::In,
            "between" => ComparisonOp::Between,
            _ => return None,
        };
        Some(op)
    }

    /// The comparison seen from the other operand: `12 < age` is `age > 12`.
    pub fn reversed(self) -> Self {
        match self {
            ComparisonOp::Lt => ComparisonOp::Gt,
            ComparisonOp::Lte => ComparisonOp::Gte,
            ComparisonOp::Gt => ComparisonOp::Lt,
            ComparisonOp::Gte => ComparisonOp::Lte,
            other => other,
        }
    }
}

/// Query operators a filter predicate can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Gt,
    Gte,
    Lt,
    Lte,
    Ne,
    In,
    Nin,
    Not,
}

impl QueryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryOperator::Gt => "$gt",
            QueryOperator::Gte => "$gte",
            QueryOperator::Lt => "$lt",
            QueryOperator::Lte => "$lte",
            QueryOperator::Ne => "$ne",
            QueryOperator::In => "$in",
            QueryOperator::Nin => "$nin",
            QueryOperator::Not => "$not",
        }
    }
}

/// Group-level aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl AggregateFunction {
    /// Case-insensitive lookup by SQL name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sum" => Some(AggregateFunction::Sum),
            "avg" => Some(AggregateFunction::Avg),
            "min" => Some(AggregateFunction::Min),
            "max" => Some(AggregateFunction::Max),
            "count" => Some(AggregateFunction::Count),
            _ => None,
        }
    }

    pub fn mongo_operator(self) -> &'static str {
        match self {
            AggregateFunction::Sum | AggregateFunction::Count => "$sum",
            AggregateFunction::Avg => "$avg",
            AggregateFunction::Min => "$min",
            AggregateFunction::Max => "$max",
        }
    }
}
