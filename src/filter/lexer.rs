//! Lexer for the filter language.
//!
//! Converts filter text such as `street == 'x' && user.email != null` into a
//! sequence of tokens with span information.

use chumsky::prelude::*;

/// A token in the filter language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // ========================================================================
    // Keywords
    // ========================================================================
    True,
    False,
    Null,

    // ========================================================================
    // Literals
    // ========================================================================
    /// An identifier (not a keyword).
    Ident(&'src str),
    /// A string literal (contents without quotes).
    Str(&'src str),
    /// A number: optional sign, digits, optional fraction.
    Number(&'src str),

    // ========================================================================
    // Operators
    // ========================================================================
    /// `==`
    EqEq,
    /// `===`
    EqEqEq,
    /// `!=`
    NotEq,
    /// `!==`
    NotEqEq,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,

    // ========================================================================
    // Symbols
    // ========================================================================
    LParen,
    RParen,
    Dot,
}

impl<'src> std::fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Null => write!(f, "null"),

            Token::Ident(s) => write!(f, "{}", s),
            Token::Str(s) => write!(f, "'{}'", s),
            Token::Number(s) => write!(f, "{}", s),

            Token::EqEq => write!(f, "=="),
            Token::EqEqEq => write!(f, "==="),
            Token::NotEq => write!(f, "!="),
            Token::NotEqEq => write!(f, "!=="),
            Token::Lt => write!(f, "<"),
            Token::Lte => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Gte => write!(f, ">="),
            Token::AndAnd => write!(f, "&&"),
            Token::OrOr => write!(f, "||"),

            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Dot => write!(f, "."),
        }
    }
}

fn keyword_or_ident(s: &str) -> Token<'_> {
    match s {
        "true" => Token::True,
        "false" => Token::False,
        "null" => Token::Null,
        _ => Token::Ident(s),
    }
}

/// Create the lexer parser.
///
/// Returns a parser that tokenizes the input string into a sequence of
/// tokens with span information, skipping whitespace.
pub fn lexer<'src>(
) -> impl Parser<'src, &'src str, Vec<(Token<'src>, SimpleSpan)>, extra::Err<Rich<'src, char>>> {
    let ident = text::ident().map(keyword_or_ident);

    // Strings: '...' or "..."; no escapes
    let single_quoted = just('\'')
        .ignore_then(none_of('\'').repeated().to_slice())
        .then_ignore(just('\''));
    let double_quoted = just('"')
        .ignore_then(none_of('"').repeated().to_slice())
        .then_ignore(just('"'));
    let string_lit = single_quoted.or(double_quoted).map(Token::Str);

    let number = just('-')
        .or_not()
        .then(text::digits(10))
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .map(Token::Number);

    // Longest operators first
    let operator = choice((
        just("===").to(Token::EqEqEq),
        just("!==").to(Token::NotEqEq),
        just("==").to(Token::EqEq),
        just("!=").to(Token::NotEq),
        just("<=").to(Token::Lte),
        just(">=").to(Token::Gte),
        just("&&").to(Token::AndAnd),
        just("||").to(Token::OrOr),
        just('<').to(Token::Lt),
        just('>').to(Token::Gt),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('.').to(Token::Dot),
    ));

    let token = choice((ident, string_lit, number, operator)).map_with(|tok, e| (tok, e.span()));

    token.padded().repeated().collect().padded().then_ignore(end())
}

/// Lex a filter string into tokens.
pub fn lex(source: &str) -> Result<Vec<(Token<'_>, SimpleSpan)>, Vec<Rich<'_, char>>> {
    let (tokens, errs) = lexer().parse(source).into_output_errors();
    if errs.is_empty() {
        Ok(tokens.unwrap_or_default())
    } else {
        Err(errs)
    }
}
