use ratatosk_model::{ArithmeticOp, DependencyParseError, DependencySpec, DependencyTerm};

#[test]
fn parses_plain_term() {
    let term = DependencyTerm::parse("EUtranCellFDD.dlChannelBandwidth").expect("term");
    assert_eq!(term.object_type, "EUtranCellFDD");
    assert_eq!(term.instance, None);
    assert_eq!(term.parameter, "dlchannelbandwidth");
    assert_eq!(term.op, None);
    assert_eq!(term.column_key(), "EUtranCellFDD.dlchannelbandwidth");
}

#[test]
fn parses_instance_and_operator() {
    let term = DependencyTerm::parse("QciProfilePredefined = qci1 . priority . +").expect("term");
    assert_eq!(term.subject(), "QciProfilePredefined=qci1");
    assert_eq!(term.parameter, "priority");
    assert_eq!(term.op, Some(ArithmeticOp::Add));
    assert_eq!(term.to_string(), "QciProfilePredefined=qci1.priority.+");
}

#[test]
fn rejects_malformed_terms() {
    assert!(matches!(
        DependencyTerm::parse("NoParameter"),
        Err(DependencyParseError::MalformedTerm { .. })
    ));
    assert!(matches!(
        DependencyTerm::parse(".param"),
        Err(DependencyParseError::MalformedTerm { .. })
    ));
    assert!(matches!(
        DependencyTerm::parse("Mo.param.%"),
        Err(DependencyParseError::UnknownOperator { ref op, .. }) if op == "%"
    ));
}

#[test]
fn none_and_blank_mean_no_dependency() {
    assert!(DependencySpec::parse("None").expect("none").is_none());
    assert!(DependencySpec::parse("   ").expect("blank").is_none());
}

#[test]
fn chain_keeps_declaration_order() {
    let spec = DependencySpec::parse("A.x;B=b1.y.*").expect("chain");
    let terms = spec.terms_for_band("L900");
    assert_eq!(terms.len(), 2);
    assert_eq!(terms[0].object_type, "A");
    assert_eq!(terms[1].op, Some(ArithmeticOp::Mul));
    assert!(spec.has_selector_term());
}

#[test]
fn band_map_selects_term_per_band() {
    let spec = DependencySpec::parse("{Dep.param:[L900,L1800];Dep2.param:[L2100]}").expect("band map");
    assert_eq!(spec.terms_for_band("L1800")[0].object_type, "Dep");
    assert_eq!(spec.terms_for_band("l2100")[0].object_type, "Dep2");
    assert!(spec.terms_for_band("L2300_20").is_empty());
    assert_eq!(spec.terms().len(), 3);
}

#[test]
fn band_map_without_entries_is_rejected() {
    assert!(matches!(
        DependencySpec::parse("{nothing here}"),
        Err(DependencyParseError::EmptyBandMap { .. })
    ));
}

#[test]
fn arithmetic_refuses_non_finite_results() {
    assert_eq!(ArithmeticOp::Add.apply_text(5.0, 3.0), Some("8".to_string()));
    assert_eq!(ArithmeticOp::Div.apply_text(1.0, 4.0), Some("0.25".to_string()));
    assert_eq!(ArithmeticOp::Div.apply(1.0, 0.0), None);
}
