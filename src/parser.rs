// ABOUTME: Parser module turning source text into Form trees using nom combinators

use nom::{
    branch::alt,
    bytes::complete::{escaped, take_while},
    character::complete::{char, digit1, multispace1, none_of, one_of, satisfy},
    combinator::{opt, recognize, value},
    multi::many0,
    IResult, Parser,
};

use crate::error::ErrorKind;
use crate::form::Form;

// ============================================================================
// Whitespace and comments
// ============================================================================

/// Parse a comment (from ; to end of line)
fn parse_comment(input: &str) -> IResult<&str, ()> {
    let (input, _) = char(';')(input)?;
    let (input, _) = take_while(|c| c != '\n')(input)?;
    Ok((input, ()))
}

/// Skip whitespace and comments
fn ws_and_comments(input: &str) -> IResult<&str, ()> {
    many0(alt((value((), multispace1), parse_comment)))
        .map(|_| ())
        .parse(input)
}

// ============================================================================
// Atoms
// ============================================================================

/// Parse a number. Integers stay integers; anything with a decimal
/// point (or an integer literal too large for i64) becomes a float.
/// Handles: 42, -42, 3.14, -3.14, .5, -.5, 42.
fn parse_number(input: &str) -> IResult<&str, Form> {
    recognize((
        opt(char('-')),
        alt((
            // digits first: 123, 123.456, 42.
            recognize((digit1, opt((char('.'), opt(digit1))))),
            // leading decimal point: .5
            recognize((char('.'), digit1)),
        )),
    ))
    .map(|text: &str| {
        if text.contains('.') {
            Form::Float(text.parse().unwrap_or(f64::NAN))
        } else {
            text.parse::<i64>()
                .map(Form::Int)
                .unwrap_or_else(|_| Form::Float(text.parse().unwrap_or(f64::NAN)))
        }
    })
    .parse(input)
}

fn is_symbol_start(c: char) -> bool {
    c.is_alphabetic() || "+-*/%<>=!?_&$#.".contains(c)
}

fn is_symbol_continue(c: char) -> bool {
    c.is_alphanumeric() || "+-*/%<>=!?_&$#.".contains(c)
}

/// Parse a symbol or a reserved word (`true`, `false`, `None`).
/// Placeholders like %0, the markers & $ # ., and dotted module names
/// are ordinary symbols.
fn parse_symbolish(input: &str) -> IResult<&str, Form> {
    let (input, first) = satisfy(is_symbol_start)(input)?;
    let (input, tail) =
        take_while::<_, _, nom::error::Error<_>>(is_symbol_continue)(input)?;

    let mut name = String::with_capacity(tail.len() + 1);
    name.push(first);
    name.push_str(tail);

    let form = match name.as_str() {
        "true" => Form::Bool(true),
        "false" => Form::Bool(false),
        "None" => Form::Nil,
        _ => Form::Symbol(name),
    };
    Ok((input, form))
}

/// Parse a string with escape sequences: \" \\ \n \t
fn parse_string(input: &str) -> IResult<&str, Form> {
    let (input, _) = char('"')(input)?;

    // Handle empty strings
    if let Ok((input, _)) = char::<_, nom::error::Error<_>>('"')(input) {
        return Ok((input, Form::Str(String::new())));
    }

    let (input, content) = escaped(none_of("\"\\"), '\\', one_of("\"\\nt"))(input)?;
    let (input, _) = char('"')(input)?;

    // Process escape sequences
    let mut result = String::new();
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }

    Ok((input, Form::Str(result)))
}

// ============================================================================
// Quoting
// ============================================================================

/// Parse a quote mark. Attached to the next token it wraps that
/// expression: 'x -> Quoted(x). Detached (followed by whitespace or a
/// closing paren) it is the symbol `quote`, so (' a b) is the
/// multi-operand quote form.
fn parse_quote(input: &str) -> IResult<&str, Form> {
    let (rest, _) = char('\'')(input)?;
    match rest.chars().next() {
        None => Ok((rest, Form::symbol("quote"))),
        Some(c) if c.is_whitespace() || c == ')' => Ok((rest, Form::symbol("quote"))),
        _ => {
            let (rest, inner) = parse_expr(rest)?;
            Ok((rest, Form::Quoted(Box::new(inner))))
        }
    }
}

/// Parse an unquote escape: ~x or ~ x -> Unquoted(x)
fn parse_unquote(input: &str) -> IResult<&str, Form> {
    let (input, _) = char('~')(input)?;
    let (input, inner) = parse_expr(input)?;
    Ok((input, Form::Unquoted(Box::new(inner))))
}

// ============================================================================
// Lists
// ============================================================================

/// Parse a list: (expr1 expr2 ...)
fn parse_list(input: &str) -> IResult<&str, Form> {
    let (input, _) = char('(')(input)?;
    let (input, _) = ws_and_comments(input)?;

    let mut items = Vec::new();
    let mut remaining = input;

    loop {
        if let Ok((rest, _)) = char::<_, nom::error::Error<_>>(')')(remaining) {
            return Ok((rest, Form::List(items)));
        }

        let (rest, expr) = parse_expr(remaining)?;
        items.push(expr);

        let (rest, _) = ws_and_comments(rest)?;
        remaining = rest;
    }
}

/// Main expression parser - tries all alternatives
fn parse_expr(input: &str) -> IResult<&str, Form> {
    let (input, _) = ws_and_comments(input)?;
    alt((
        parse_quote,
        parse_unquote,
        parse_list,
        parse_string,
        parse_number,
        parse_symbolish,
    ))
    .parse(input)
}

// ============================================================================
// Entry points
// ============================================================================

/// Parses exactly one expression; trailing input is an error.
pub fn parse(input: &str) -> Result<Form, ErrorKind> {
    match parse_expr(input) {
        Ok((rest, form)) => {
            let (rest, _) = ws_and_comments(rest).unwrap_or((rest, ()));
            if rest.is_empty() {
                Ok(form)
            } else {
                Err(ErrorKind::Parse(format!(
                    "unexpected trailing input: '{}'",
                    rest
                )))
            }
        }
        Err(e) => Err(ErrorKind::Parse(format!("{:?}", e))),
    }
}

/// Parses a whole program: a sequence of top-level forms. The driver
/// evaluates them in order, as if wrapped in `(do ...)`.
pub fn parse_program(input: &str) -> Result<Vec<Form>, ErrorKind> {
    let mut forms = Vec::new();
    let mut remaining = input;

    loop {
        let (rest, _) = ws_and_comments(remaining).unwrap_or((remaining, ()));
        if rest.is_empty() {
            return Ok(forms);
        }
        match parse_expr(rest) {
            Ok((rest, form)) => {
                forms.push(form);
                remaining = rest;
            }
            Err(e) => return Err(ErrorKind::Parse(format!("{:?}", e))),
        }
    }
}
