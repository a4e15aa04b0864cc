/*
    Copyright Michael Lodder. All Rights Reserved.
    SPDX-License-Identifier: Apache-2.0
*/
//! Recursive-descent parser for access formula text.
//!
//! ```text
//! expression  := or
//! or          := and ("|" and)*
//! and         := term ("&" term)*
//! term        := "(" expression ")" | threshold | name
//! threshold   := "T" number "(" expression ("," expression)* ")"
//! number      := [0-9]+
//! name        := any run of characters excluding '&', '|', '(', ')', ','
//!                with trailing whitespace trimmed; must be non-empty
//! ```
//!
//! `&` binds tighter than `|`; both are left-associative, but the AST's
//! smart constructors flatten same-kind runs so associativity is not
//! observable in the resulting tree. A name beginning with `T` followed by
//! digits is only a threshold if a `(` follows the digits; otherwise it is
//! an ordinary variable name (`T & T9000(a,b)`: the first `T` is a
//! variable, the second opens a threshold).

use crate::ast::Formula;
use crate::error::{Error, Result};

/// Parse formula text into an AST. The entire input must be consumed;
/// trailing non-whitespace is a [`Error::ParseError`].
pub fn parse(input: &str) -> Result<Formula<String>> {
    let cur = Cursor { input };
    let (formula, pos) = parse_expression(&cur, 0)?;
    let pos = skip_ws(cur.input, pos);
    if pos < cur.input.len() {
        return Err(cur.error("end of input", pos));
    }
    Ok(formula)
}

struct Cursor<'a> {
    input: &'a str,
}

impl<'a> Cursor<'a> {
    fn error(&self, expected: impl Into<String>, pos: usize) -> Error {
        const CONTEXT_SIZE: usize = 35;
        let begin = floor_boundary(self.input, pos.saturating_sub(CONTEXT_SIZE));
        let end = ceil_boundary(self.input, (pos + CONTEXT_SIZE).min(self.input.len()));
        let context = &self.input[begin..end];
        let caret_offset = self.input[begin..pos].chars().count();
        let pointer = format!("{}^", " ".repeat(caret_offset));
        Error::ParseError {
            expected: expected.into(),
            position: pos,
            context: format!("> {}\n> {}", context, pointer),
        }
    }
}

fn floor_boundary(s: &str, mut pos: usize) -> usize {
    while pos > 0 && !s.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

fn ceil_boundary(s: &str, mut pos: usize) -> usize {
    while pos < s.len() && !s.is_char_boundary(pos) {
        pos += 1;
    }
    pos
}

fn skip_ws(input: &str, pos: usize) -> usize {
    let mut p = pos;
    for ch in input[pos..].chars() {
        if ch.is_whitespace() {
            p += ch.len_utf8();
        } else {
            break;
        }
    }
    p
}

fn parse_literal(cur: &Cursor, pos: usize, needle: &str) -> Result<usize> {
    let p = skip_ws(cur.input, pos);
    if cur.input[p..].starts_with(needle) {
        Ok(p + needle.len())
    } else {
        Err(cur.error(format!("`{}`", needle), p))
    }
}

fn parse_number(cur: &Cursor, pos: usize) -> Result<(usize, usize)> {
    let p = skip_ws(cur.input, pos);
    let digits: String = cur.input[p..].chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(cur.error("number", p));
    }
    let new_pos = p + digits.len();
    let value = digits.parse::<usize>().map_err(|_| cur.error("number", p))?;
    Ok((value, new_pos))
}

fn parse_name(cur: &Cursor, pos: usize) -> Result<(String, usize)> {
    let p = skip_ws(cur.input, pos);
    let mut end = p;
    for ch in cur.input[p..].chars() {
        if matches!(ch, '&' | '|' | '(' | ')' | ',') {
            break;
        }
        end += ch.len_utf8();
    }
    let raw = &cur.input[p..end];
    let trimmed = raw.trim_end();
    if trimmed.is_empty() {
        return Err(cur.error("name", p));
    }
    Ok((trimmed.to_string(), p + trimmed.len()))
}

/// Peeks whether a threshold operator starts at `pos` without consuming it:
/// `T`, then digits, then `(`.
fn looks_like_threshold(cur: &Cursor, pos: usize) -> bool {
    parse_literal(cur, pos, "T")
        .and_then(|p| parse_number(cur, p))
        .and_then(|(_, p)| parse_literal(cur, p, "("))
        .is_ok()
}

fn parse_splitted<T>(
    cur: &Cursor,
    pos: usize,
    separator: &str,
    parser: impl Fn(&Cursor, usize) -> Result<(T, usize)>,
) -> Result<(Vec<T>, usize)> {
    let (first, mut p) = parser(cur, pos)?;
    let mut result = vec![first];
    loop {
        match parse_literal(cur, p, separator).and_then(|after_sep| parser(cur, after_sep)) {
            Ok((child, new_p)) => {
                result.push(child);
                p = new_p;
            }
            Err(_) => break,
        }
    }
    Ok((result, p))
}

fn parse_threshold(cur: &Cursor, pos: usize) -> Result<(Formula<String>, usize)> {
    let p = parse_literal(cur, pos, "T")?;
    let (k, p) = parse_number(cur, p)?;
    let p = parse_literal(cur, p, "(")?;
    let (children, p) = parse_splitted(cur, p, ",", parse_expression)?;
    let p = parse_literal(cur, p, ")")?;
    Ok((Formula::threshold(k, children)?, p))
}

fn parse_brackets(cur: &Cursor, pos: usize) -> Result<(Formula<String>, usize)> {
    let p = parse_literal(cur, pos, "(")?;
    let (inner, p) = parse_expression(cur, p)?;
    let p = parse_literal(cur, p, ")")?;
    Ok((inner, p))
}

fn parse_var(cur: &Cursor, pos: usize) -> Result<(Formula<String>, usize)> {
    let (name, p) = parse_name(cur, pos)?;
    Ok((Formula::var(name), p))
}

fn parse_term(cur: &Cursor, pos: usize) -> Result<(Formula<String>, usize)> {
    let p = skip_ws(cur.input, pos);
    if cur.input[p..].starts_with('(') {
        return parse_brackets(cur, pos);
    }
    if looks_like_threshold(cur, pos) {
        return parse_threshold(cur, pos);
    }
    parse_var(cur, pos)
}

fn parse_and(cur: &Cursor, pos: usize) -> Result<(Formula<String>, usize)> {
    let (children, p) = parse_splitted(cur, pos, "&", parse_term)?;
    Ok((Formula::and(children)?, p))
}

fn parse_or(cur: &Cursor, pos: usize) -> Result<(Formula<String>, usize)> {
    let (children, p) = parse_splitted(cur, pos, "|", parse_and)?;
    Ok((Formula::or(children)?, p))
}

fn parse_expression(cur: &Cursor, pos: usize) -> Result<(Formula<String>, usize)> {
    parse_or(cur, pos)
}
