use tracing::trace;

use crate::types::{
    Classification, ClassifyError, DecisionGraph, Edge, EvalError, Expr, KeyConfig, Record,
    RuleSet,
};

/// Evaluate `expr` left to right, skipping the right operand of `and`/`or`
/// once the left one decides the result. `source` is quoted in errors.
pub(crate) fn eval_expr(
    expr: &Expr,
    rules: &RuleSet,
    record: &Record,
    source: &str,
) -> Result<bool, EvalError> {
    match expr {
        Expr::Rule(id) => rules
            .get(*id)
            .ok_or_else(|| EvalError::UndefinedRule {
                id: *id,
                expression: source.to_owned(),
            })?
            .apply(record),
        Expr::Not(inner) => Ok(!eval_expr(inner, rules, record, source)?),
        Expr::And(a, b) => {
            Ok(eval_expr(a, rules, record, source)? && eval_expr(b, rules, record, source)?)
        }
        Expr::Or(a, b) => {
            Ok(eval_expr(a, rules, record, source)? || eval_expr(b, rules, record, source)?)
        }
    }
}

fn eval_edge(edge: &Edge, rules: &RuleSet, record: &Record) -> Result<bool, EvalError> {
    let expr = edge.compiled.as_ref().map_err(|e| EvalError::Syntax(e.clone()))?;
    eval_expr(expr.tree(), rules, record, expr.source())
}

pub(crate) fn classify(
    graph: &DecisionGraph,
    rules: &RuleSet,
    record: &Record,
    config: &KeyConfig,
) -> Result<Classification, ClassifyError> {
    let record_id = config.id_field().and_then(|f| record.get(f)).cloned();
    let limit = config
        .max_steps()
        .unwrap_or_else(|| graph.node_count().saturating_mul(2));

    let mut node = 0;
    let mut path = vec![graph.couplets[node].clone()];

    loop {
        let current = &graph.couplets[node];
        if current.is_terminal() {
            return Ok(Classification::new(current.clone(), path, record_id));
        }
        if path.len() > limit {
            return Err(ClassifyError::TraversalLimit {
                record: Box::new(record.clone()),
                record_id,
                path,
                limit,
            });
        }

        let mut matched = Vec::new();
        for &e in &graph.outgoing[node] {
            let edge = &graph.edges[e];
            match eval_edge(edge, rules, record) {
                Ok(true) => matched.push(edge),
                Ok(false) => {}
                Err(source) => {
                    return Err(ClassifyError::Eval {
                        record: Box::new(record.clone()),
                        record_id,
                        path,
                        source,
                    });
                }
            }
        }

        match matched.as_slice() {
            [] => {
                return Err(ClassifyError::NoMatch {
                    record: Box::new(record.clone()),
                    record_id,
                    path,
                });
            }
            [edge] => {
                node = edge.to;
                trace!(
                    from = %current.id(),
                    to = %graph.couplets[node].id(),
                    rules = %edge.expression,
                    step = path.len(),
                    "followed edge"
                );
                path.push(graph.couplets[node].clone());
            }
            _ => {
                return Err(ClassifyError::AmbiguousMatch {
                    record: Box::new(record.clone()),
                    record_id,
                    path,
                    couplet: current.clone(),
                    expressions: matched.iter().map(|e| e.expression.clone()).collect(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Couplet, CoupletId, CoupletKind, Rule, Value};

    fn rules() -> RuleSet {
        RuleSet::builder()
            .rule(1, Rule::new("x", "a", "in", "has x", "").unwrap())
            .rule(2, Rule::new("y", "a", "in", "has y", "").unwrap())
            .rule(3, Rule::new("5", "b", ">", "b over 5", "").unwrap())
            .build()
            .unwrap()
    }

    fn eval(source: &str, record: &Record) -> Result<bool, EvalError> {
        let expr = crate::parse::parse(source).unwrap();
        eval_expr(&expr, &rules(), record, source)
    }

    fn classes() -> DecisionGraph {
        DecisionGraph::builder("Test")
            .edge(0, "1", Couplet::new(1, CoupletKind::Couplet, "X"))
            .edge(0, "not 1", Couplet::new(90, CoupletKind::Class, "NotX"))
            .edge(1, "2", Couplet::new(91, CoupletKind::Class, "XY"))
            .edge(1, "3", Couplet::new(92, CoupletKind::Class, "XBig"))
            .build(true)
            .unwrap()
    }

    #[test]
    fn eval_precedence_and_negation() {
        let rec = Record::new().set("a", "x").set("b", 1_i64);
        assert!(eval("1", &rec).unwrap());
        assert!(!eval("2", &rec).unwrap());
        assert!(eval("2 and 3 or 1", &rec).unwrap());
        assert!(!eval("2 and (3 or 1)", &rec).unwrap());
        assert!(eval("not 2 and 1", &rec).unwrap());
        assert!(!eval("not (2 or 1)", &rec).unwrap());
    }

    #[test]
    fn eval_short_circuits_missing_attributes() {
        let rec = Record::new().set("a", "y");
        // rule 3 needs attribute b, which is absent
        assert!(!eval("1 and 3", &rec).unwrap());
        assert!(eval("2 or 3", &rec).unwrap());
        assert!(matches!(
            eval("2 and 3", &rec),
            Err(EvalError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn eval_reports_undefined_rule_with_source() {
        let rec = Record::new().set("a", "x");
        match eval("1 and 42", &rec) {
            Err(EvalError::UndefinedRule { id, expression }) => {
                assert_eq!(id, 42);
                assert_eq!(expression, "1 and 42");
            }
            other => panic!("expected UndefinedRule, got {other:?}"),
        }
    }

    #[test]
    fn classify_reaches_class() {
        let config = KeyConfig::default();
        let rec = Record::new().set("a", "xy").set("b", 1_i64);
        let outcome = classify(&classes(), &rules(), &rec, &config).unwrap();
        assert_eq!(outcome.result().id(), &CoupletId::Int(91));
        assert_eq!(outcome.steps().len(), 3);
        assert_eq!(outcome.record_id(), None);
    }

    #[test]
    fn classify_no_match_keeps_path() {
        let config = KeyConfig::default().with_id_field("site");
        let rec = Record::new().set("site", "S1").set("a", "x").set("b", 2_i64);
        let err = classify(&classes(), &rules(), &rec, &config).unwrap_err();
        assert!(matches!(err, ClassifyError::NoMatch { .. }));
        let ids: Vec<&CoupletId> = err.path().iter().map(Couplet::id).collect();
        assert_eq!(ids, vec![&CoupletId::Int(0), &CoupletId::Int(1)]);
        assert_eq!(err.record_id(), Some(&Value::from("S1")));
        assert_eq!(
            err.to_string(),
            "unable to classify record \"S1\": no rule set matched at couplet 1 (visited 0 -> 1)"
        );
    }

    #[test]
    fn classify_ambiguous_lists_matching_expressions() {
        let rec = Record::new().set("a", "xy").set("b", 9_i64);
        let err = classify(&classes(), &rules(), &rec, &KeyConfig::default()).unwrap_err();
        match err {
            ClassifyError::AmbiguousMatch {
                couplet,
                expressions,
                path,
                ..
            } => {
                assert_eq!(couplet.id(), &CoupletId::Int(1));
                assert_eq!(expressions, vec!["2".to_owned(), "3".to_owned()]);
                assert_eq!(path.len(), 2);
            }
            other => panic!("expected AmbiguousMatch, got {other:?}"),
        }
    }

    #[test]
    fn classify_surfaces_syntax_error_on_first_use() {
        let graph = DecisionGraph::builder("Test")
            .edge(0, "1", Couplet::new(90, CoupletKind::Class, "X"))
            .edge(0, "1 or or 2", Couplet::new(91, CoupletKind::Class, "Broken"))
            .build(true)
            .unwrap();
        let err = classify(&graph, &rules(), &Record::new().set("a", "x"), &KeyConfig::default())
            .unwrap_err();
        match err {
            ClassifyError::Eval {
                source: EvalError::Syntax(syntax),
                ..
            } => assert_eq!(syntax.expression(), "1 or or 2"),
            other => panic!("expected a syntax error, got {other:?}"),
        }
    }

    #[test]
    fn classify_bounded_on_cyclic_key() {
        let graph = DecisionGraph::builder("Loop")
            .edge(0, "1", Couplet::new(1, CoupletKind::Couplet, "A"))
            .edge(1, "1", Couplet::new(2, CoupletKind::Couplet, "B"))
            .edge(2, "1", Couplet::new(1, CoupletKind::Couplet, "A"))
            .edge(2, "not 1", Couplet::new(9, CoupletKind::Class, "Out"))
            .build(false)
            .unwrap();
        let rec = Record::new().set("a", "x");

        let err = classify(&graph, &rules(), &rec, &KeyConfig::default()).unwrap_err();
        match &err {
            ClassifyError::TraversalLimit { limit, path, .. } => {
                assert_eq!(*limit, 8);
                assert_eq!(path.len(), 9);
            }
            other => panic!("expected TraversalLimit, got {other:?}"),
        }

        let config = KeyConfig::default().with_max_steps(2);
        match classify(&graph, &rules(), &rec, &config).unwrap_err() {
            ClassifyError::TraversalLimit { limit, path, .. } => {
                assert_eq!(limit, 2);
                assert_eq!(path.len(), 3);
            }
            other => panic!("expected TraversalLimit, got {other:?}"),
        }
    }
}
