//! Parser for the filter language using chumsky.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! filter     := or_expr EOF
//! or_expr    := and_expr ( "||" and_expr )*
//! and_expr   := atom ( "&&" atom )*
//! atom       := comparison | "(" or_expr ")"
//! comparison := left_value op literal
//! left_value := ident | ident "." ident
//! ```

use chumsky::input::ValueInput;
use chumsky::prelude::*;

use super::ast::*;
use super::lexer::Token;

/// Create the filter parser.
///
/// Generic over any `ValueInput` producing lexer tokens with `SimpleSpan`
/// spans. Input must be consumed completely: a second top-level
/// expression is an error.
pub fn parser<'tokens, 'src: 'tokens, I>(
) -> impl Parser<'tokens, I, FilterExpr, extra::Err<Rich<'tokens, Token<'src>, SimpleSpan>>>
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = SimpleSpan>,
{
    let expr = recursive(|expr| {
        let ident = select! {
            Token::Ident(s) => s.to_string(),
        }
        .labelled("identifier");

        let left_value = ident
            .clone()
            .then(just(Token::Dot).ignore_then(ident).or_not())
            .map(|(first, second)| match second {
                Some(field) => LeftValue::DotAccessor {
                    relation: first,
                    field,
                },
                None => LeftValue::Field(first),
            })
            .labelled("field");

        let compare_op = select! {
            Token::EqEq => CompareOp::Equal,
            Token::EqEqEq => CompareOp::StrictEqual,
            Token::NotEq => CompareOp::NotEqual,
            Token::NotEqEq => CompareOp::NotStrictEqual,
            Token::Gt => CompareOp::Greater,
            Token::Gte => CompareOp::GreaterOrEqual,
            Token::Lt => CompareOp::Less,
            Token::Lte => CompareOp::LessOrEqual,
        }
        .labelled("comparison operator");

        let number = select! {
            Token::Number(n) => n,
        }
        .try_map(|n: &str, span| {
            parse_number(n).ok_or_else(|| Rich::custom(span, format!("invalid number '{}'", n)))
        });

        let literal = select! {
            Token::Str(s) => FilterLiteral::String(s.to_string()),
            Token::True => FilterLiteral::Bool(true),
            Token::False => FilterLiteral::Bool(false),
            Token::Null => FilterLiteral::Null,
        }
        .or(number)
        .labelled("literal");

        let comparison = left_value
            .then(compare_op)
            .then(literal)
            .map(|((left, op), right)| FilterExpr::Comparison(Comparison { left, op, right }));

        let atom = comparison.or(expr
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map(|inner| FilterExpr::Paren(Box::new(inner))));

        let and_expr = atom.clone().foldl(
            just(Token::AndAnd).ignore_then(atom).repeated(),
            |left, right| FilterExpr::And(Box::new(left), Box::new(right)),
        );

        and_expr.clone().foldl(
            just(Token::OrOr).ignore_then(and_expr).repeated(),
            |left, right| FilterExpr::Or(Box::new(left), Box::new(right)),
        )
    });

    expr.then_ignore(end())
}

fn parse_number(text: &str) -> Option<FilterLiteral> {
    if text.contains('.') {
        text.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(FilterLiteral::Float)
    } else {
        text.parse::<i64>().ok().map(FilterLiteral::Integer)
    }
}
