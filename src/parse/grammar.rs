use winnow::ascii::{dec_int, till_line_ending};
use winnow::combinator::{alt, cut_err, opt, preceded, repeat, separated};
use winnow::error::{ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take_while};

use crate::Value;

use super::parser::ParsedRule;

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

fn ws1(input: &mut &str) -> ModalResult<()> {
    take_while(1.., |c: char| c.is_ascii_whitespace())
        .void()
        .parse_next(input)
}

// -- Names ------------------------------------------------------------------

fn name<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| {
            c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'
        }),
    )
        .take()
        .parse_next(input)
}

fn name_or_string(input: &mut &str) -> ModalResult<String> {
    alt((string_literal, name.map(str::to_owned))).parse_next(input)
}

// -- Values -----------------------------------------------------------------

fn string_literal(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn negative_number(input: &mut &str) -> ModalResult<Value> {
    let neg_str = (
        '-',
        take_while(1.., |c: char| c.is_ascii_digit() || c == '.'),
    )
        .take()
        .parse_next(input)?;
    if neg_str.contains('.') {
        let f: f64 = neg_str
            .parse()
            .map_err(|_| ErrMode::from_input(input).cut())?;
        Ok(Value::Float(f))
    } else {
        let i: i64 = neg_str
            .parse()
            .map_err(|_| ErrMode::from_input(input).cut())?;
        Ok(Value::Int(i))
    }
}

fn float_literal(input: &mut &str) -> ModalResult<f64> {
    // Only match floats that contain a decimal point
    (
        take_while(1.., |c: char| c.is_ascii_digit()),
        '.',
        take_while(1.., |c: char| c.is_ascii_digit()),
    )
        .take()
        .try_map(|s: &str| s.parse::<f64>())
        .parse_next(input)
}

fn value(input: &mut &str) -> ModalResult<Value> {
    ws.parse_next(input)?;
    alt((
        string_literal.map(Value::String),
        "null".value(Value::Null),
        "true".value(Value::Bool(true)),
        "false".value(Value::Bool(false)),
        negative_number,
        float_literal.map(Value::Float),
        dec_int::<_, i64, _>.map(Value::Int),
    ))
    .context(StrContext::Expected(StrContextValue::Description("value")))
    .parse_next(input)
}

fn value_list(input: &mut &str) -> ModalResult<Vec<Value>> {
    '['.parse_next(input)?;
    let values: Vec<Value> = separated(0.., value, (ws, ',')).parse_next(input)?;
    (ws, opt(','), ws, cut_err(']')).parse_next(input)?;
    Ok(values)
}

// -- Conditions -------------------------------------------------------------

fn condition(input: &mut &str) -> ModalResult<(String, Vec<Value>)> {
    ws.parse_next(input)?;
    let property = name_or_string
        .context(StrContext::Expected(StrContextValue::Description(
            "property",
        )))
        .parse_next(input)?;
    ws.parse_next(input)?;
    let values = cut_err(alt((
        preceded(("in", ws), cut_err(value_list)),
        preceded("==", cut_err(value)).map(|v| vec![v]),
    )))
    .context(StrContext::Expected(StrContextValue::Description(
        "`in [...]` or `== value`",
    )))
    .parse_next(input)?;
    Ok((property, values))
}

fn conditions(input: &mut &str) -> ModalResult<Vec<(String, Vec<Value>)>> {
    let first = condition(input)?;
    let rest: Vec<(String, Vec<Value>)> = repeat(
        0..,
        preceded((ws, alt(("AND", "and")), ws1), cut_err(condition)),
    )
    .parse_next(input)?;
    let mut all = Vec::with_capacity(rest.len() + 1);
    all.push(first);
    all.extend(rest);
    Ok(all)
}

// -- Rule definitions -------------------------------------------------------

fn rule_def(input: &mut &str) -> ModalResult<ParsedRule> {
    ws.parse_next(input)?;
    ("rule", ws1).parse_next(input)?;

    let outcome = cut_err(name_or_string)
        .context(StrContext::Expected(StrContextValue::Description(
            "rule outcome",
        )))
        .parse_next(input)?;

    let conditions = opt(preceded((ws, ':'), cut_err(conditions)))
        .context(StrContext::Expected(StrContextValue::Description(
            "rule conditions",
        )))
        .parse_next(input)?
        .unwrap_or_default();

    Ok(ParsedRule {
        outcome,
        conditions,
    })
}

// -- Top-level parser -------------------------------------------------------

pub fn parse_rules(input: &mut &str) -> ModalResult<Vec<ParsedRule>> {
    let rules: Vec<ParsedRule> = repeat(0.., rule_def).parse_next(input)?;
    ws.parse_next(input)?;
    Ok(rules)
}
