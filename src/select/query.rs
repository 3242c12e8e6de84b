use crate::select::predicate::{CmpOp, Predicate, Value};
use anyhow::{anyhow, bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*(==|!=|>=|<=|>|<)\s*(.+?)\s*$")
        .expect("clause pattern is valid")
});
// Quoted literals match first so a connective inside quotes is never a split
// point; group 1 is the connective itself.
static OR_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""[^"]*"|'[^']*'|(\s+(?:or|\|)\s+)"#).expect("or pattern is valid")
});
static AND_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""[^"]*"|'[^']*'|(\s+(?:and|&)\s+)"#).expect("and pattern is valid")
});

/// Pieces of `text` between matches of `sep`'s first group.
fn split_unquoted<'a>(text: &'a str, sep: &Regex) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for caps in sep.captures_iter(text) {
        if let Some(m) = caps.get(1) {
            parts.push(&text[start..m.start()]);
            start = m.end();
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Parse a small query expression such as
/// `Revenue > @min_revenue and Region == "North"`.
///
/// Clauses are `column op literal`; literals are numbers, quoted strings,
/// `True`/`False` or `@name` looked up in `vars`. `and` binds tighter than
/// `or`; there are no parentheses.
pub fn parse_query(expr: &str, vars: &HashMap<String, Value>) -> Result<Predicate> {
    let mut disjunction: Option<Predicate> = None;
    for alt in split_unquoted(expr.trim(), &OR_SPLIT) {
        let mut conjunction: Option<Predicate> = None;
        for clause in split_unquoted(alt, &AND_SPLIT) {
            let p = parse_clause(clause, vars)?;
            conjunction = Some(match conjunction {
                Some(acc) => acc.and(p),
                None => p,
            });
        }
        let c = conjunction.ok_or_else(|| anyhow!("empty query"))?;
        disjunction = Some(match disjunction {
            Some(acc) => acc.or(c),
            None => c,
        });
    }
    disjunction.ok_or_else(|| anyhow!("empty query"))
}

fn parse_clause(clause: &str, vars: &HashMap<String, Value>) -> Result<Predicate> {
    let caps = CLAUSE
        .captures(clause)
        .ok_or_else(|| anyhow!("cannot parse query clause `{}`", clause.trim()))?;
    let column = caps[1].to_string();
    let op = match &caps[2] {
        "==" => CmpOp::Eq,
        "!=" => CmpOp::Ne,
        ">=" => CmpOp::Ge,
        "<=" => CmpOp::Le,
        ">" => CmpOp::Gt,
        _ => CmpOp::Lt,
    };
    let value = parse_literal(&caps[3], vars)?;
    Ok(Predicate::Compare { column, op, value })
}

fn parse_literal(raw: &str, vars: &HashMap<String, Value>) -> Result<Value> {
    if let Some(name) = raw.strip_prefix('@') {
        return vars
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("query variable `@{}` is not defined", name));
    }
    let quoted = |q: char| raw.len() >= 2 && raw.starts_with(q) && raw.ends_with(q);
    if quoted('"') || quoted('\'') {
        return Ok(Value::Text(raw[1..raw.len() - 1].to_string()));
    }
    match raw {
        "True" | "true" => return Ok(Value::Bool(true)),
        "False" | "false" => return Ok(Value::Bool(false)),
        _ => {}
    }
    match raw.parse::<f64>() {
        Ok(n) => Ok(Value::Number(n)),
        Err(_) => bail!("`{}` is not a number, quoted string or @variable", raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> HashMap<String, Value> {
        HashMap::from([("min_revenue".to_string(), Value::Number(100000.0))])
    }

    #[test]
    fn parses_and_binding_tighter_than_or() -> Result<()> {
        let p = parse_query(
            "Revenue > @min_revenue and Region == \"North\" or Product == 'Mouse'",
            &vars(),
        )?;
        let expected = Predicate::Compare {
            column: "Revenue".into(),
            op: CmpOp::Gt,
            value: Value::Number(100000.0),
        }
        .and(Predicate::Compare {
            column: "Region".into(),
            op: CmpOp::Eq,
            value: Value::Text("North".into()),
        })
        .or(Predicate::Compare {
            column: "Product".into(),
            op: CmpOp::Eq,
            value: Value::Text("Mouse".into()),
        });
        assert_eq!(p, expected);
        Ok(())
    }

    #[test]
    fn connectives_inside_quotes_stay_literal() -> Result<()> {
        let text = |column: &str, v: &str| Predicate::Compare {
            column: column.into(),
            op: CmpOp::Eq,
            value: Value::Text(v.into()),
        };
        assert_eq!(
            parse_query("Category == \"Home and Kitchen\"", &vars())?,
            text("Category", "Home and Kitchen")
        );
        assert_eq!(
            parse_query("Product == 'Mouse & Pad' or Sector == 'Oil or Gas'", &vars())?,
            text("Product", "Mouse & Pad").or(text("Sector", "Oil or Gas"))
        );
        assert_eq!(
            parse_query("Sector == 'Oil or Gas' and Product != 'Mouse | Pad'", &vars())?,
            text("Sector", "Oil or Gas").and(Predicate::Compare {
                column: "Product".into(),
                op: CmpOp::Ne,
                value: Value::Text("Mouse | Pad".into()),
            })
        );
        Ok(())
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_query("Revenue >", &vars()).is_err());
        assert!(parse_query("Revenue > @missing", &vars()).is_err());
        assert!(parse_query("Region == North", &vars()).is_err());
    }
}
