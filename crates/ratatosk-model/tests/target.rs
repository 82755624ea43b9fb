use ratatosk_model::{
    Inequality, InequalityOp, Operand, PiecewiseKey, TargetExpression, TargetParseError,
};

fn parse(text: &str) -> TargetExpression {
    TargetExpression::parse(text).expect("parse target")
}

#[test]
fn classifies_each_shape() {
    assert_eq!(parse("*"), TargetExpression::Wildcard);
    assert_eq!(parse(" = "), TargetExpression::DependencyEqual);
    assert_eq!(parse("10.0"), TargetExpression::Literal("10".to_string()));
    assert_eq!(
        parse("[A, B ,3.0]"),
        TargetExpression::Set(vec!["A".to_string(), "B".to_string(), "3".to_string()])
    );
    assert_eq!(parse("( 1 , 5 )"), TargetExpression::Range { lo: 1, hi: 5 });
    assert_eq!(
        parse(">= 10"),
        TargetExpression::Inequality(Inequality {
            op: InequalityOp::Ge,
            operand: Operand::Number(10.0),
        })
    );
    assert!(matches!(parse("{A:1;B:2}"), TargetExpression::Piecewise(_)));
}

#[test]
fn literal_with_inner_operator_stays_literal() {
    assert_eq!(parse("a>b"), TargetExpression::Literal("a>b".to_string()));
}

#[test]
fn inverted_range_is_rejected() {
    let err = TargetExpression::parse("(5,2)").expect_err("inverted range");
    assert_eq!(
        err,
        TargetParseError::RangeInverted {
            text: "(5,2)".to_string(),
            lo: 5,
            hi: 2,
        }
    );
}

#[test]
fn non_integer_range_bound_is_rejected() {
    let err = TargetExpression::parse("(1.5,3)").expect_err("float bound");
    assert!(matches!(err, TargetParseError::RangeBoundNotInteger { ref bound, .. } if bound == "1.5"));
    let err = TargetExpression::parse("(1,2,3)").expect_err("three bounds");
    assert!(matches!(err, TargetParseError::RangeArity { .. }));
}

#[test]
fn empty_target_is_an_error() {
    assert_eq!(TargetExpression::parse("  "), Err(TargetParseError::Empty));
}

#[test]
fn piecewise_buckets_in_declared_order() {
    let TargetExpression::Piecewise(map) = parse("{<10:A;>=10:B;>=20:C}") else {
        panic!("expected piecewise");
    };
    assert_eq!(map.entries.len(), 3);
    assert_eq!(map.select("12"), Some(&TargetExpression::Literal("B".to_string())));
    // first match wins even though >=20 also holds
    assert_eq!(map.select("25"), Some(&TargetExpression::Literal("B".to_string())));
    assert_eq!(map.select("3"), Some(&TargetExpression::Literal("A".to_string())));
    assert_eq!(map.select("abc"), None);
}

#[test]
fn piecewise_text_inequality_bucket() {
    let TargetExpression::Piecewise(map) = parse("{!=ON:A;ON:B}") else {
        panic!("expected piecewise");
    };
    assert_eq!(map.select("OFF"), Some(&TargetExpression::Literal("A".to_string())));
    assert_eq!(map.select("ON"), Some(&TargetExpression::Literal("B".to_string())));
}

#[test]
fn piecewise_exact_keys_are_canonical() {
    let TargetExpression::Piecewise(map) = parse("{ 1.0 : on ; off : * }") else {
        panic!("expected piecewise");
    };
    assert!(matches!(map.entries[0].key, PiecewiseKey::Literal(ref k) if k == "1"));
    assert_eq!(map.select("1"), Some(&TargetExpression::Literal("on".to_string())));
    assert_eq!(map.select("off"), Some(&TargetExpression::Wildcard));
    assert_eq!(map.select("2"), None);
}

#[test]
fn piecewise_skips_malformed_entries() {
    let TargetExpression::Piecewise(map) = parse("{garbage;A:1;:2;B:}") else {
        panic!("expected piecewise");
    };
    assert_eq!(map.entries.len(), 1);
    assert_eq!(map.select("A"), Some(&TargetExpression::Literal("1".to_string())));
}

#[test]
fn piecewise_with_bad_range_value_is_fatal() {
    assert!(TargetExpression::parse("{A:(9,1)}").is_err());
}

#[test]
fn inequality_semantics() {
    let gt = Inequality::parse(">10").expect("inequality");
    assert!(gt.holds("15"));
    assert!(gt.holds("10.5"));
    assert!(!gt.holds("10"));
    assert!(!gt.holds("abc"));

    let ne = Inequality::parse("!=0").expect("inequality");
    assert!(ne.holds("1"));
    assert!(!ne.holds("0.0"));
    assert!(ne.holds("off"));

    let ne_text = Inequality::parse("!= off").expect("inequality");
    assert!(ne_text.holds("on"));
    assert!(!ne_text.holds(" off "));
}

#[test]
fn display_round_trips_to_the_same_expression() {
    for text in ["*", "=", "15", "[a,b]", "(1,5)", ">=10", "{<10:A;>=10:B}"] {
        let expression = parse(text);
        assert_eq!(expression.to_string(), text);
    }
}
