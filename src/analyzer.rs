//! 把读取得到的 form 分析为表达式树
//!
//! 只识别字面量：自求值的原子、`(quote x)`、以及元素全为常量的向量和映射。

use crate::ast::{Expr, FALSE_EXPR, NIL_EXPR, TRUE_EXPR};
use crate::error::{CloveError, CloveResult, analyzer_error};
use crate::reader::first_duplicate;
use crate::value::Value;

pub fn analyze(form: &Value) -> CloveResult<Expr> {
    match form {
        Value::Nil => Ok(NIL_EXPR),
        Value::Bool(true) => Ok(TRUE_EXPR),
        Value::Bool(false) => Ok(FALSE_EXPR),
        Value::Int(_)
        | Value::Float(_)
        | Value::Char(_)
        | Value::String(_)
        | Value::Keyword(_)
        | Value::Object(_) => Ok(Expr::literal(form.clone())),
        Value::Symbol(name) => Err(analyzer_error(format!(
            "Unable to resolve symbol: {} in this context",
            name
        ))),
        Value::List(items) => analyze_list(items),
        Value::Vector(_) | Value::Map(_) => constant_value(form).map(Expr::literal),
    }
}

fn analyze_list(items: &[Value]) -> CloveResult<Expr> {
    let Some(head) = items.first() else {
        return Ok(Expr::literal(Value::List(Vec::new())));
    };
    match head {
        Value::Symbol(op) if op == "quote" => {
            if items.len() != 2 {
                return Err(analyzer_error(format!(
                    "Wrong number of args ({}) passed to quote",
                    items.len() - 1
                )));
            }
            Ok(Expr::literal(items[1].clone()))
        }
        Value::Symbol(op) => Err(analyzer_error(format!("Unsupported form: ({} ...)", op))),
        other => Err(analyzer_error(format!("{} cannot be invoked", other.type_name()))),
    }
}

fn not_constant(form: &Value) -> CloveError {
    analyzer_error(format!("Collection element is not a constant: {}", form))
}

/// 元素全为常量的集合折叠为一个字面量值（嵌套的 quote 被剥去）
fn constant_value(form: &Value) -> CloveResult<Value> {
    match form {
        Value::Symbol(_) => Err(not_constant(form)),
        Value::List(items) => match items.first() {
            None => Ok(Value::List(Vec::new())),
            Some(Value::Symbol(op)) if op == "quote" && items.len() == 2 => Ok(items[1].clone()),
            Some(_) => Err(not_constant(form)),
        },
        Value::Vector(items) => items
            .iter()
            .map(constant_value)
            .collect::<CloveResult<Vec<_>>>()
            .map(Value::Vector),
        Value::Map(entries) => {
            let entries = entries
                .iter()
                .map(|(k, v)| -> CloveResult<(Value, Value)> { Ok((constant_value(k)?, constant_value(v)?)) })
                .collect::<CloveResult<Vec<_>>>()?;
            if let Some(key) = first_duplicate(entries.iter().map(|(k, _)| k)) {
                return Err(analyzer_error(format!("Duplicate key: {}", key)));
            }
            Ok(Value::Map(entries))
        }
        _ => Ok(form.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CloveError;
    use crate::reader::read_string;
    use pretty_assertions::assert_eq;

    fn analyze_str(source: &str) -> CloveResult<Expr> {
        analyze(&read_string(source).unwrap())
    }

    #[test]
    fn test_atoms_become_literals() {
        assert_eq!(analyze_str("nil").unwrap(), NIL_EXPR);
        assert_eq!(analyze_str("true").unwrap(), TRUE_EXPR);
        assert_eq!(analyze_str("42").unwrap(), Expr::literal(Value::Int(42)));
        assert_eq!(analyze_str("\"s\"").unwrap(), Expr::literal(Value::string("s")));
        assert_eq!(analyze_str(":k").unwrap(), Expr::literal(Value::keyword("k")));
    }

    #[test]
    fn test_quote_yields_literal_of_form() {
        assert_eq!(analyze_str("'sym").unwrap(), Expr::literal(Value::symbol("sym")));
        assert_eq!(
            analyze_str("'(def x 1)").unwrap(),
            Expr::literal(Value::List(vec![
                Value::symbol("def"),
                Value::symbol("x"),
                Value::Int(1),
            ]))
        );
        assert_eq!(analyze_str("()").unwrap(), Expr::literal(Value::List(vec![])));
    }

    #[test]
    fn test_constant_collections_fold() {
        let expr = analyze_str("[1 :a {\"k\" 'v}]").unwrap();
        assert_eq!(
            expr.eval().unwrap(),
            Value::Vector(vec![
                Value::Int(1),
                Value::keyword("a"),
                Value::Map(vec![(Value::string("k"), Value::symbol("v"))]),
            ])
        );
    }

    #[test]
    fn test_non_literal_forms_rejected() {
        assert!(matches!(analyze_str("x"), Err(CloveError::Analyzer(_))));
        assert!(matches!(analyze_str("(def x 1)"), Err(CloveError::Analyzer(m)) if m.contains("def")));
        assert!(matches!(analyze_str("[1 x]"), Err(CloveError::Analyzer(m)) if m.ends_with(": x")));
        assert!(matches!(analyze_str("(quote a b)"), Err(CloveError::Analyzer(_))));
        assert!(matches!(analyze_str("(1 2)"), Err(CloveError::Analyzer(_))));
    }

    #[test]
    fn test_quoted_keys_that_collide_are_rejected() {
        let err = analyze_str("{:a 1 ':a 2}").unwrap_err();
        assert_eq!(err, CloveError::Analyzer("Duplicate key: :a".to_string()));
        assert!(analyze_str("{'a 1 :a 2}").is_ok());
    }
}
