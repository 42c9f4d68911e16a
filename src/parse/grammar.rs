use winnow::ascii::digit1;
use winnow::combinator::{alt, cut_err, delimited, not, opt, preceded, repeat, terminated};
use winnow::error::{ContextError, ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::take_while;

use crate::{Expr, RuleId};

// -- Whitespace & word boundaries -------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_ascii_whitespace())
        .void()
        .parse_next(input)
}

/// Succeeds only when the next character cannot continue a word, so that
/// `not1` or `12abc` are rejected instead of being split.
fn word_end(input: &mut &str) -> ModalResult<()> {
    not(take_while(1, |c: char| c.is_alphanumeric() || c == '_')).parse_next(input)
}

fn keyword<'i>(kw: &'static str) -> impl Parser<&'i str, (), ErrMode<ContextError>> {
    terminated(kw, word_end).void()
}

// -- Terms ------------------------------------------------------------------

/// Decimal literal without leading zeros (`0` and `00` are fine, `007` is not).
fn rule_id(input: &mut &str) -> ModalResult<RuleId> {
    terminated(digit1, word_end)
        .verify(|digits: &str| !digits.starts_with('0') || digits.bytes().all(|b| b == b'0'))
        .try_map(str::parse::<RuleId>)
        .context(StrContext::Expected(StrContextValue::Description("rule id")))
        .parse_next(input)
}

fn term(input: &mut &str) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    alt((
        delimited('(', cut_err(or_expr), (ws, cut_err(')'))),
        rule_id.map(Expr::Rule),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "rule id or parenthesised expression",
    )))
    .parse_next(input)
}

// -- Expressions (precedence: OR < AND < NOT < term) ------------------------

fn negatable(input: &mut &str) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    if opt(keyword("not")).parse_next(input)?.is_some() {
        let inner = cut_err(term).parse_next(input)?;
        Ok(Expr::Not(Box::new(inner)))
    } else {
        term(input)
    }
}

fn and_expr(input: &mut &str) -> ModalResult<Expr> {
    let first = negatable(input)?;
    let rest: Vec<Expr> =
        repeat(0.., preceded((ws, keyword("and")), cut_err(negatable))).parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |acc, r| Expr::And(Box::new(acc), Box::new(r))))
}

fn or_expr(input: &mut &str) -> ModalResult<Expr> {
    let first = and_expr(input)?;
    let rest: Vec<Expr> =
        repeat(0.., preceded((ws, keyword("or")), cut_err(and_expr))).parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |acc, r| Expr::Or(Box::new(acc), Box::new(r))))
}

// -- Top-level parser -------------------------------------------------------

pub fn expression(input: &mut &str) -> ModalResult<Expr> {
    let expr = or_expr(input)?;
    ws.parse_next(input)?;
    Ok(expr)
}
