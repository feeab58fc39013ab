use crate::{
    ast::ExprTree,
    error::{Error, Result},
    postfix::{self, PostfixToken},
};

/// Builds an expression tree from a postfix sequence.
///
/// Operators take the two topmost entries (the deeper one is the left
/// operand); a call marker applies the name below its argument.
pub fn build_tree(tokens: &[PostfixToken]) -> Result<ExprTree> {
    let mut stack: Vec<ExprTree> = Vec::new();

    for token in tokens {
        match token {
            PostfixToken::Operand(text) => stack.push(ExprTree::leaf(text.clone())),
            PostfixToken::Operator(op) => {
                let right = pop(&mut stack, token)?;
                let left = pop(&mut stack, token)?;
                stack.push(ExprTree::binary(*op, left, right));
            }
            PostfixToken::Call => {
                let argument = pop(&mut stack, token)?;
                let function = match pop(&mut stack, token)? {
                    ExprTree::Leaf(name) => name,
                    other => {
                        return Err(Error::MalformedExpression(format!(
                            "call target is not a name: {:?}",
                            other
                        )));
                    }
                };
                stack.push(ExprTree::call(function, argument));
            }
        }
    }

    let root = stack
        .pop()
        .ok_or_else(|| Error::MalformedExpression("empty expression".to_string()))?;

    if !stack.is_empty() {
        return Err(Error::MalformedExpression(format!(
            "{} operand(s) left without an operator",
            stack.len()
        )));
    }

    Ok(root)
}

fn pop(stack: &mut Vec<ExprTree>, token: &PostfixToken) -> Result<ExprTree> {
    stack
        .pop()
        .ok_or_else(|| Error::MalformedExpression(format!("missing operand for '{}'", token)))
}

/// Parses an infix arithmetic expression into a tree.
///
/// # Examples
///
/// ```
/// use sql_to_mongodb_query::ast::{ArithmeticOp, ExprTree};
/// use sql_to_mongodb_query::expression::parse_expression;
///
/// let tree = parse_expression("sum(cost) / 1000").unwrap();
/// assert_eq!(
///     tree,
///     ExprTree::binary(ArithmeticOp::Divide, ExprTree::leaf("sum(cost)"), ExprTree::leaf("1000"))
/// );
/// ```
pub fn parse_expression(expression: &str) -> Result<ExprTree> {
    build_tree(&postfix::convert(expression)?)
}
