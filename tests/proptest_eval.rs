use clavis::parse::parse;
use clavis::{EvalError, Expr, Record, Rule, RuleSet};
use proptest::prelude::*;

const IDS: &[u32] = &[1, 2, 3, 4, 5];
const OPERATORS: &[&str] = &["=", "in", ">=", ">", "<=", "<", "regex"];
const LITERALS: &[&str] = &["a", "b", "ab", "1", "2.5", "10", "^a"];

/// A rule set with ids 1..=5 over the attributes `x` and `y`.
fn arb_ruleset() -> impl Strategy<Value = RuleSet> {
    prop::collection::vec(
        (
            prop::sample::select(&["x", "y"][..]),
            prop::sample::select(OPERATORS),
            prop::sample::select(LITERALS),
        ),
        IDS.len(),
    )
    .prop_map(|definitions| {
        let mut builder = RuleSet::builder();
        for (&id, (attribute, operator, value)) in IDS.iter().zip(definitions) {
            let rule = Rule::new(value, attribute, operator, &format!("r{id}"), "").unwrap();
            builder = builder.rule(id, rule);
        }
        builder.build().unwrap()
    })
}

fn arb_attribute() -> impl Strategy<Value = clavis::Value> {
    prop_oneof![
        (-20_i64..20).prop_map(clavis::Value::Int),
        (-20.0_f64..20.0).prop_map(clavis::Value::Float),
        "[a-c]{0,3}".prop_map(clavis::Value::String),
        any::<bool>().prop_map(clavis::Value::Bool),
    ]
}

fn arb_record() -> impl Strategy<Value = Record> {
    (arb_attribute(), arb_attribute()).prop_map(|(x, y)| Record::new().set("x", x).set("y", y))
}

/// Random expression trees over the defined ids, rendered with `Display`.
fn arb_expr() -> impl Strategy<Value = Expr> {
    let leaf = prop::sample::select(IDS).prop_map(Expr::rule);
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|e| !e),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.and(b)),
            (inner.clone(), inner).prop_map(|(a, b)| a.or(b)),
        ]
    })
}

proptest! {
    #[test]
    fn not_negates(rules in arb_ruleset(), record in arb_record(), id in prop::sample::select(IDS)) {
        let x = rules.test(&id.to_string(), &record).unwrap();
        prop_assert_eq!(rules.test(&format!("not {id}"), &record).unwrap(), !x);
    }

    #[test]
    fn and_or_match_boolean_operators(
        rules in arb_ruleset(),
        record in arb_record(),
        a in prop::sample::select(IDS),
        b in prop::sample::select(IDS),
    ) {
        let x = rules.test(&a.to_string(), &record).unwrap();
        let y = rules.test(&b.to_string(), &record).unwrap();
        prop_assert_eq!(rules.test(&format!("{a} and {b}"), &record).unwrap(), x && y);
        prop_assert_eq!(rules.test(&format!("{a} or {b}"), &record).unwrap(), x || y);
    }

    /// Printing a tree and evaluating the text agrees with evaluating the tree.
    #[test]
    fn rendered_expressions_evaluate_like_trees(
        rules in arb_ruleset(),
        record in arb_record(),
        expr in arb_expr(),
    ) {
        let text = expr.to_string();
        prop_assert_eq!(parse(&text).unwrap(), expr.clone());
        let compiled = rules.compile(&text).unwrap();
        prop_assert_eq!(rules.evaluate(&compiled, &record).unwrap(), eval_tree(&expr, &rules, &record));
    }

    /// Appending a dangling keyword or operand never yields anything but a
    /// syntax error.
    #[test]
    fn malformed_suffixes_are_syntax_errors(
        rules in arb_ruleset(),
        record in arb_record(),
        expr in arb_expr(),
        suffix in prop::sample::select(&[" not 1", " and", " or", " 2", " )", " (", " x"][..]),
    ) {
        let text = format!("{expr}{suffix}");
        prop_assert!(matches!(rules.test(&text, &record), Err(EvalError::Syntax(_))), "{}", text);
    }

    /// Any rule id outside the set fails once evaluation reaches it.
    #[test]
    fn reached_undefined_rule_fails(
        rules in arb_ruleset(),
        record in arb_record(),
        id in 6_u32..10_000,
    ) {
        let err = rules.test(&format!("1 or not 1 and {id}"), &record);
        let reached = !rules.test("1", &record).unwrap();
        if reached {
            prop_assert!(
                matches!(err, Err(EvalError::UndefinedRule { id: missing, .. }) if missing == id),
                "expected undefined rule {}", id
            );
        } else {
            prop_assert!(err.unwrap());
        }
    }
}

fn eval_tree(expr: &Expr, rules: &RuleSet, record: &Record) -> bool {
    match expr {
        Expr::Rule(id) => rules.get(*id).unwrap().apply(record).unwrap(),
        Expr::Not(inner) => !eval_tree(inner, rules, record),
        Expr::And(a, b) => eval_tree(a, rules, record) && eval_tree(b, rules, record),
        Expr::Or(a, b) => eval_tree(a, rules, record) || eval_tree(b, rules, record),
    }
}
