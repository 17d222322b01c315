//! Parser integration tests: a fixed corpus of normalized labels, plus
//! properties of the normalization over generated sources.

use hb_expr::{Column, Defs, ExprError, evaluate, parse};
use proptest::prelude::*;
use std::collections::HashMap;

fn label(src: &str) -> String {
    parse(src, &Defs::new()).unwrap().label()
}

#[test]
fn normalized_labels() {
    let corpus = [
        ("x+y", "x + y"),
        ("y+x", "x + y"),
        ("x*2", "2 * x"),
        ("a - (b - c)", "a - (b - c)"),
        ("(a - b) - c", "a - b - c"),
        ("x ** 2", "pow(x, 2)"),
        ("-(3)", "-3"),
        ("max(y, x)", "max(x, y)"),
        ("!(x > 1)", "!(x > 1)"),
        ("ch == 'ee'", "\"ee\" == ch"),
        ("sqrt(px**2 + py**2)", "sqrt(pow(px, 2) + pow(py, 2))"),
    ];
    for (src, expected) in corpus {
        assert_eq!(label(src), expected, "source {src:?}");
    }
}

#[test]
fn error_corpus() {
    let defs: Defs = [("a".to_string(), "b + 1".to_string()), ("b".to_string(), "a * 2".to_string())]
        .into_iter()
        .collect();
    assert!(matches!(parse("a", &defs), Err(ExprError::Definition(_))));
    for bad in ["", "x +", "(x", "x y", "foo(x)", "sqrt(x, y)", "'open", "x $ y"] {
        assert!(matches!(parse(bad, &Defs::new()), Err(ExprError::Parse(_))), "source {bad:?}");
    }
}

fn source() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        prop::sample::select(vec!["x", "y", "z"]).prop_map(str::to_owned),
        (0u32..20).prop_map(|n| n.to_string()),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), prop::sample::select(vec!["+", "-", "*", "/"]), inner.clone())
                .prop_map(|(a, op, b)| format!("({a}) {op} ({b})")),
            (prop::sample::select(vec!["min", "max", "pow"]), inner.clone(), inner.clone())
                .prop_map(|(f, a, b)| format!("{f}({a}, {b})")),
            inner.clone().prop_map(|a| format!("sqrt({a})")),
            inner.prop_map(|a| format!("-({a})")),
        ]
    })
}

proptest! {
    #[test]
    fn prop_label_reparses_to_same_tree(src in source()) {
        let e = parse(&src, &Defs::new()).unwrap();
        let again = parse(&e.label(), &Defs::new()).unwrap();
        prop_assert_eq!(again, e);
    }

    #[test]
    fn prop_commuted_operands_are_equal(a in source(), b in source()) {
        let defs = Defs::new();
        for (l, r) in [
            (format!("({a}) + ({b})"), format!("({b}) + ({a})")),
            (format!("({a}) * ({b})"), format!("({b}) * ({a})")),
            (format!("max({a}, {b})"), format!("max({b}, {a})")),
        ] {
            prop_assert_eq!(parse(&l, &defs).unwrap(), parse(&r, &defs).unwrap());
        }
    }

    #[test]
    fn prop_normalization_preserves_values(
        src in source(),
        xs in proptest::collection::vec(-5.0f64..5.0, 4),
    ) {
        let e = parse(&src, &Defs::new()).unwrap();
        let mut symbols = HashMap::new();
        symbols.insert("x".to_string(), Column::Num(xs.clone()));
        symbols.insert("y".to_string(), Column::Num(xs.iter().map(|v| v * 0.5 + 1.0).collect()));
        symbols.insert("z".to_string(), Column::Num(vec![2.0]));
        let direct = evaluate(&e, &symbols).unwrap();
        let relabeled = evaluate(&parse(&e.label(), &Defs::new()).unwrap(), &symbols).unwrap();
        let (Column::Num(a), Column::Num(b)) = (direct, relabeled) else {
            return Err(TestCaseError::fail("non-numeric result"));
        };
        for (p, q) in a.iter().zip(&b) {
            prop_assert!(p.to_bits() == q.to_bits() || (p.is_nan() && q.is_nan()));
        }
    }
}
