use serde_json::{Value as Json, json};

use crate::ast::ArithmeticOp;

/// Arithmetic expression tree built from a postfix token sequence.
///
/// Leaves keep their source text: `sum(cost)`, `1000`, `clicks`. Numbers are
/// only converted when the tree is turned into an aggregation expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprTree {
    /// Operand: field name, number or atomic call such as `sum(cost)`
    Leaf(String),

    /// Binary arithmetic operation
    ///
    /// # Example
    /// ```text
    /// sum(cost) / 1000  ->  Binary { op: Divide, left: sum(cost), right: 1000 }
    /// ```
    Binary {
        op: ArithmeticOp,
        left: Box<ExprTree>,
        right: Box<ExprTree>,
    },

    /// Function applied to a sub-expression
    ///
    /// # Example
    /// ```text
    /// sum(impressions + clicks)  ->  Call { function: "sum", argument: impressions + clicks }
    /// ```
    Call {
        function: String,
        argument: Box<ExprTree>,
    },
}

impl ExprTree {
    pub fn leaf(text: impl Into<String>) -> Self {
        ExprTree::Leaf(text.into())
    }

    pub fn binary(op: ArithmeticOp, left: ExprTree, right: ExprTree) -> Self {
        ExprTree::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(function: impl Into<String>, argument: ExprTree) -> Self {
        ExprTree::Call {
            function: function.into(),
            argument: Box::new(argument),
        }
    }

    /// Operator-document rendering with leaves as plain strings:
    /// `{"$divide": ["sum(cost)", "1000"]}`.
    pub fn to_json(&self) -> Json {
        match self {
            ExprTree::Leaf(text) => Json::String(text.clone()),
            ExprTree::Binary { op, left, right } => single_key(
                op.mongo_operator().to_string(),
                json!([left.to_json(), right.to_json()]),
            ),
            ExprTree::Call { function, argument } => single_key(
                format!("${}", function.to_ascii_lowercase()),
                argument.to_json(),
            ),
        }
    }
}

fn single_key(key: String, value: Json) -> Json {
    let mut object = serde_json::Map::new();
    object.insert(key, value);
    Json::Object(object)
}
