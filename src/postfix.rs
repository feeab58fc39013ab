//! Infix → postfix conversion for select-list arithmetic.
//!
//! A name directly followed by `(` is a call. When the call's argument holds
//! no operator the whole call collapses into one operand (`sum(cost)`);
//! otherwise the argument stays a bracket group and the call is emitted as a
//! [`PostfixToken::Call`] after it:
//!
//! ```text
//! sum(cost) / (sum(impressions) / 1000)  ->  sum(cost) sum(impressions) 1000 / /
//! sum(impressions + clicks) / 1000       ->  sum impressions clicks + @call 1000 /
//! ```

use std::fmt;

use tracing::trace;

use crate::{
    ast::ArithmeticOp,
    error::{Error, Result},
};

/// Priority of the call marker; higher than every arithmetic operator.
const CALL_PRIORITY: u8 = 3;

/// A token of the postfix sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum PostfixToken {
    /// Field, number or collapsed call such as `sum(cost)`
    Operand(String),
    Operator(ArithmeticOp),
    /// Applies the preceding name operand to the preceding argument
    Call,
}

impl fmt::Display for PostfixToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostfixToken::Operand(text) => write!(f, "{}", text),
            PostfixToken::Operator(op) => write!(f, "{}", op.symbol()),
            PostfixToken::Call => write!(f, "@call"),
        }
    }
}

/// Working token of the intermediate passes.
#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Operand(String),
    Operator(ArithmeticOp),
    Call,
    Open,
    Close,
}

impl Piece {
    fn priority(&self) -> u8 {
        match self {
            Piece::Operator(op) => op.priority(),
            Piece::Call => CALL_PRIORITY,
            _ => 0,
        }
    }

    fn text(&self) -> String {
        match self {
            Piece::Operand(text) => text.clone(),
            Piece::Operator(op) => op.symbol().to_string(),
            Piece::Call => String::new(),
            Piece::Open => "(".to_string(),
            Piece::Close => ")".to_string(),
        }
    }
}

/// Converts an arithmetic expression to postfix order.
///
/// # Examples
///
/// ```
/// use sql_to_mongodb_query::postfix::convert;
///
/// let tokens = convert("(a + (b - c)) * d / e % f").unwrap();
/// let text: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
/// assert_eq!(text, ["a", "b", "c", "-", "+", "d", "*", "e", "/", "f", "%"]);
/// ```
pub fn convert(expression: &str) -> Result<Vec<PostfixToken>> {
    let pieces = mark_calls(split(expression));
    let pieces = collapse_groups(pieces)?;
    let output = shunting_yard(pieces)?;

    trace!(
        expression,
        postfix = %output.iter().map(ToString::to_string).collect::<Vec<_>>().join(" "),
        "converted expression to postfix"
    );

    Ok(output)
}

/// Returns true when `expression` holds an arithmetic operator outside a
/// `(*)` group.
pub fn is_math_expression(expression: &str) -> bool {
    split(expression)
        .iter()
        .any(|piece| matches!(piece, Piece::Operator(_)))
}

/// Splits on operators and brackets, ignoring whitespace. A `*` enclosed
/// directly by brackets is an operand.
fn split(expression: &str) -> Vec<Piece> {
    let chars: Vec<char> = expression.chars().filter(|c| !c.is_whitespace()).collect();
    let mut pieces = Vec::new();
    let mut operand = String::new();

    let flush = |operand: &mut String, pieces: &mut Vec<Piece>| {
        if !operand.is_empty() {
            pieces.push(Piece::Operand(std::mem::take(operand)));
        }
    };

    for (index, &ch) in chars.iter().enumerate() {
        let star_operand = ch == '*'
            && index > 0
            && chars[index - 1] == '('
            && chars.get(index + 1) == Some(&')');

        match ch {
            '(' => {
                flush(&mut operand, &mut pieces);
                pieces.push(Piece::Open);
            }
            ')' => {
                flush(&mut operand, &mut pieces);
                pieces.push(Piece::Close);
            }
            c => match ArithmeticOp::from_symbol(c) {
                Some(op) if !star_operand => {
                    flush(&mut operand, &mut pieces);
                    pieces.push(Piece::Operator(op));
                }
                _ => operand.push(c),
            },
        }
    }
    flush(&mut operand, &mut pieces);

    pieces
}

/// Inserts a call marker between a name and its opening bracket.
fn mark_calls(pieces: Vec<Piece>) -> Vec<Piece> {
    let mut marked = Vec::with_capacity(pieces.len());
    let mut previous_operand = false;

    for piece in pieces {
        if piece == Piece::Open && previous_operand {
            marked.push(Piece::Call);
        }
        previous_operand = matches!(piece, Piece::Operand(_));
        marked.push(piece);
    }

    marked
}

/// Removes bracket groups that hold no operator. Such a group either
/// belongs to a call, which is joined into one operand, or only wraps an
/// operand and is dropped.
fn collapse_groups(pieces: Vec<Piece>) -> Result<Vec<Piece>> {
    let mut stack: Vec<Piece> = Vec::new();

    for piece in pieces {
        if piece != Piece::Close {
            stack.push(piece);
            continue;
        }

        let mut group = Vec::new();
        let mut depth = 0;
        let mut has_operator = false;

        loop {
            let item = stack
                .pop()
                .ok_or_else(|| Error::MalformedExpression("unbalanced ')'".to_string()))?;
            match item {
                Piece::Open if depth == 0 => break,
                Piece::Open => depth -= 1,
                Piece::Close => depth += 1,
                Piece::Operator(_) | Piece::Call => has_operator = true,
                Piece::Operand(_) => {}
            }
            group.push(item);
        }
        group.reverse();

        if has_operator {
            stack.push(Piece::Open);
            stack.extend(group);
            stack.push(Piece::Close);
            continue;
        }

        let content: String = group.iter().map(Piece::text).collect();

        if stack.last() == Some(&Piece::Call) {
            stack.pop();
            match stack.pop() {
                Some(Piece::Operand(name)) => {
                    stack.push(Piece::Operand(format!("{}({})", name, content)));
                }
                _ => {
                    return Err(Error::MalformedExpression(format!(
                        "call without a name before ({})",
                        content
                    )));
                }
            }
        } else if !content.is_empty() {
            stack.push(Piece::Operand(content));
        }
    }

    Ok(stack)
}

fn shunting_yard(pieces: Vec<Piece>) -> Result<Vec<PostfixToken>> {
    let mut output = Vec::new();
    let mut operators: Vec<Piece> = Vec::new();

    let emit = |piece: Piece, output: &mut Vec<PostfixToken>| match piece {
        Piece::Operator(op) => output.push(PostfixToken::Operator(op)),
        Piece::Call => output.push(PostfixToken::Call),
        _ => {}
    };

    for piece in pieces {
        match piece {
            Piece::Operand(text) => output.push(PostfixToken::Operand(text)),
            Piece::Open => operators.push(Piece::Open),
            Piece::Close => loop {
                match operators.pop() {
                    Some(Piece::Open) => break,
                    Some(item) => emit(item, &mut output),
                    None => {
                        return Err(Error::MalformedExpression("unbalanced ')'".to_string()));
                    }
                }
            },
            current => {
                while operators
                    .last()
                    .is_some_and(|top| *top != Piece::Open && top.priority() >= current.priority())
                {
                    if let Some(top) = operators.pop() {
                        emit(top, &mut output);
                    }
                }
                operators.push(current);
            }
        }
    }

    while let Some(item) = operators.pop() {
        if item == Piece::Open {
            return Err(Error::MalformedExpression("unbalanced '('".to_string()));
        }
        emit(item, &mut output);
    }

    Ok(output)
}
