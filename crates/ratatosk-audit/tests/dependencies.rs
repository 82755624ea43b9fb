//! Dependency joins, arithmetic, piecewise selection and band handling.

mod common;

use common::{checks, column, records, rule, run, store, target};
use ratatosk_audit::{AuditError, Auditor, BandResolver, DependencyResolver};
use ratatosk_model::{BandConfig, DependencySpec, DependencyTerm, Rule, RuleSet};

fn cells(values: &[Option<&str>]) -> ratatosk_ingest::RecordSet {
    records(
        "EUtranCellFDD",
        &[
            ("MeContext", &[Some("N1"), Some("N2"), Some("N3")]),
            ("EUtranCellFDDId", &[Some("JKT001AT1"), Some("JKT002AL1"), Some("JKT003AT1")]),
            ("qRxLevMin", values),
        ],
    )
}

fn enodeb(values: &[Option<&str>]) -> ratatosk_ingest::RecordSet {
    records(
        "ENodeBFunction",
        &[
            ("MeContext", &[Some("N1"), Some("N2"), Some("N3")]),
            ("ENodeBFunctionId", &[Some("1"), Some("1"), Some("1")]),
            ("offset", values),
        ],
    )
}

#[test]
fn arithmetic_dependency_transforms_the_value() {
    let result = run(
        vec![rule("EUtranCellFDD", None, "qrxlevmin", "8", "ENodeBFunction.offset.+")],
        vec![
            cells(&[Some("5"), Some("5"), None]),
            enodeb(&[Some("3"), Some("4"), Some("3")]),
        ],
    );
    assert_eq!(checks(&result, "EUtranCellFDD", "qrxlevmin"), vec!["OK", "NOK", "NA"]);
    assert_eq!(
        column(&result, "EUtranCellFDD", "qrxlevmin_eq"),
        vec![Some("8".to_string()), Some("9".to_string()), None]
    );
}

#[test]
fn non_numeric_arithmetic_operand_aborts() {
    let rules = RuleSet::new(vec![rule(
        "EUtranCellFDD",
        None,
        "qrxlevmin",
        "8",
        "ENodeBFunction.offset.*",
    )]);
    let store = store(vec![
        cells(&[Some("5"), Some("5"), Some("5")]),
        enodeb(&[Some("3"), Some("high"), Some("3")]),
    ]);
    let error = Auditor::new(BandResolver::default())
        .audit(&rules, &store)
        .unwrap_err();
    match error {
        AuditError::NonNumericOperand { subject, parameter, dependency, .. } => {
            assert_eq!(subject, "EUtranCellFDD");
            assert_eq!(parameter, "qrxlevmin");
            assert_eq!(dependency, "high");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn piecewise_target_is_selected_by_bucketed_dependency_value() {
    let result = run(
        vec![rule(
            "EUtranCellFDD",
            None,
            "qrxlevmin",
            "{<10:A;>=10:B}",
            "ENodeBFunction.offset",
        )],
        vec![
            cells(&[Some("B"), Some("A"), Some("A")]),
            enodeb(&[Some("12"), Some("12"), Some("3")]),
        ],
    );
    assert_eq!(checks(&result, "EUtranCellFDD", "qrxlevmin"), vec!["OK", "NOK", "OK"]);
    assert_eq!(
        column(&result, "EUtranCellFDD", "qrxlevmin_ref"),
        vec![Some("B".to_string()), Some("B".to_string()), Some("A".to_string())]
    );
}

#[test]
fn text_inequality_bucket_selects_on_text_dependency_value() {
    let features = records(
        "ENodeBFunction",
        &[
            ("MeContext", &[Some("N1"), Some("N2"), Some("N3")]),
            ("ENodeBFunctionId", &[Some("1"), Some("1"), Some("1")]),
            ("state", &[Some("OFF"), Some("ON"), Some("OFF")]),
        ],
    );
    let result = run(
        vec![rule(
            "EUtranCellFDD",
            None,
            "qrxlevmin",
            "{!=ON:A;ON:B}",
            "ENodeBFunction.state",
        )],
        vec![cells(&[Some("A"), Some("B"), Some("B")]), features],
    );
    assert_eq!(checks(&result, "EUtranCellFDD", "qrxlevmin"), vec!["OK", "OK", "NOK"]);
    assert_eq!(
        column(&result, "EUtranCellFDD", "qrxlevmin_ref"),
        vec![Some("A".to_string()), Some("B".to_string()), Some("A".to_string())]
    );
}

fn sector(power: &[Option<&str>]) -> ratatosk_ingest::RecordSet {
    records(
        "SectorCarrier",
        &[
            ("MeContext", &[Some("N1"), Some("N2"), Some("N3")]),
            ("power", power),
        ],
    )
}

#[test]
fn arithmetic_and_selector_terms_combine() {
    let result = run(
        vec![rule(
            "EUtranCellFDD",
            None,
            "qrxlevmin",
            "=",
            "ENodeBFunction.offset.+;SectorCarrier.power",
        )],
        vec![
            cells(&[Some("5"), Some("5"), None]),
            enodeb(&[Some("3"), Some("4"), Some("3")]),
            sector(&[Some("8"), Some("8"), Some("8")]),
        ],
    );
    assert_eq!(checks(&result, "EUtranCellFDD", "qrxlevmin"), vec!["OK", "NOK", "NA"]);
    assert_eq!(
        column(&result, "EUtranCellFDD", "qrxlevmin_eq"),
        vec![Some("8".to_string()), Some("9".to_string()), None]
    );
    assert_eq!(
        column(&result, "EUtranCellFDD", "qrxlevmin_ref")[0].as_deref(),
        Some("8")
    );
}

#[test]
fn each_arithmetic_term_applies_to_the_raw_value() {
    let result = run(
        vec![rule(
            "EUtranCellFDD",
            None,
            "qrxlevmin",
            "4",
            "ENodeBFunction.offset.+;SectorCarrier.power.-",
        )],
        vec![
            cells(&[Some("5"), Some("5"), Some("5")]),
            enodeb(&[Some("3"), Some("3"), Some("3")]),
            sector(&[Some("1"), Some("2"), Some("1")]),
        ],
    );
    // 5 - power, not (5 + offset) - power
    assert_eq!(
        column(&result, "EUtranCellFDD", "qrxlevmin_eq"),
        vec![Some("4".to_string()), Some("3".to_string()), Some("4".to_string())]
    );
    assert_eq!(checks(&result, "EUtranCellFDD", "qrxlevmin"), vec!["OK", "NOK", "OK"]);
}

#[test]
fn unmatched_piecewise_key_is_not_applicable() {
    let result = run(
        vec![rule("EUtranCellFDD", None, "qrxlevmin", "{1:A;2:*}", "ENodeBFunction.offset")],
        vec![
            cells(&[Some("A"), Some("anything"), Some("A")]),
            enodeb(&[Some("1"), Some("2.0"), Some("7")]),
        ],
    );
    assert_eq!(checks(&result, "EUtranCellFDD", "qrxlevmin"), vec!["OK", "OK", "NA"]);
    assert_eq!(
        column(&result, "EUtranCellFDD", "qrxlevmin_ref")[1].as_deref(),
        Some("anything")
    );
}

#[test]
fn dependency_equal_uses_the_dependency_value() {
    let result = run(
        vec![rule("EUtranCellFDD", None, "qrxlevmin", "=", "ENodeBFunction.offset")],
        vec![
            cells(&[Some("7"), Some("8"), Some("7")]),
            enodeb(&[Some("7.0"), Some("7"), None]),
        ],
    );
    assert_eq!(checks(&result, "EUtranCellFDD", "qrxlevmin"), vec!["OK", "NOK", "NA"]);
}

#[test]
fn unloaded_dependency_object_type_is_not_applicable() {
    let result = run(
        vec![rule("EUtranCellFDD", None, "qrxlevmin", "=", "SectorCarrier.power")],
        vec![cells(&[Some("7"), Some("8"), Some("7")])],
    );
    assert_eq!(checks(&result, "EUtranCellFDD", "qrxlevmin"), vec!["NA", "NA", "NA"]);
}

#[test]
fn dependency_instance_is_applied_before_the_join() {
    let profiles = records(
        "QciProfilePredefined",
        &[
            ("MeContext", &[Some("N1"), Some("N1"), Some("N2")]),
            ("QciProfilePredefinedId", &[Some("qci1"), Some("qci9"), Some("qci9")]),
            ("priority", &[Some("1"), Some("9"), Some("8")]),
        ],
    );
    let result = run(
        vec![rule(
            "EUtranCellFDD",
            None,
            "qrxlevmin",
            "=",
            "QciProfilePredefined=qci9.priority",
        )],
        vec![cells(&[Some("9"), Some("8"), Some("8")]), profiles],
    );
    assert_eq!(checks(&result, "EUtranCellFDD", "qrxlevmin"), vec!["OK", "OK", "NA"]);
}

#[test]
fn cell_level_dependencies_join_on_node_and_cell() {
    let relations = records(
        "EUtranFreqRelation",
        &[
            ("MeContext", &[Some("N1"), Some("N1")]),
            ("EUtranCellFDDId", &[Some("JKT001AT1"), Some("JKT001AT2")]),
            ("EUtranFreqRelationId", &[Some("100"), Some("100")]),
            ("priority", &[Some("3"), Some("3")]),
        ],
    );
    let own_cells = records(
        "EUtranCellFDD",
        &[
            ("MeContext", &[Some("N1"), Some("N1")]),
            ("EUtranCellFDDId", &[Some("JKT001AT1"), Some("JKT001AT2")]),
            ("earfcndl", &[Some("3"), Some("6")]),
        ],
    );
    let result = run(
        vec![rule("EUtranFreqRelation", None, "priority", "=", "EUtranCellFDD.earfcndl")],
        vec![relations, own_cells],
    );
    assert_eq!(checks(&result, "EUtranFreqRelation", "priority"), vec!["OK", "NOK"]);
}

#[test]
fn band_specific_targets_and_unbanded_records() {
    let mut banded = Rule::new("EUtranCellFDD", None, "qrxlevmin");
    banded.targets.insert_band("L900", target("-124"));
    banded.targets.insert_band("L1800", target("-120"));
    let set = records(
        "EUtranCellFDD",
        &[
            ("MeContext", &[Some("N1"), Some("N1"), Some("N1")]),
            ("EUtranCellFDDId", &[Some("JKT001AT1"), Some("JKT001AL1"), Some("bad")]),
            ("qRxLevMin", &[Some("-124"), Some("-124"), Some("-124")]),
        ],
    );
    let result = run(vec![banded], vec![set]);
    assert_eq!(checks(&result, "EUtranCellFDD", "qrxlevmin"), vec!["OK", "NOK", "NA"]);
    assert_eq!(
        column(&result, "EUtranCellFDD", "band"),
        vec![Some("L900".to_string()), Some("L1800".to_string()), None]
    );
}

#[test]
fn band_without_target_is_not_applicable() {
    let mut partial = Rule::new("EUtranCellFDD", None, "qrxlevmin");
    partial.targets.insert_band("L900", target("*"));
    let result = run(vec![partial], vec![cells(&[Some("1"), Some("1"), Some("1")])]);
    assert_eq!(checks(&result, "EUtranCellFDD", "qrxlevmin"), vec!["OK", "NA", "OK"]);
}

#[test]
fn band_map_dependency_picks_the_term_per_band() {
    let sector = records(
        "SectorCarrier",
        &[("MeContext", &[Some("N1"), Some("N2"), Some("N3")]), ("power", &[Some("40"), Some("40"), Some("40")])],
    );
    let mut by_band = Rule::new("EUtranCellFDD", None, "qrxlevmin");
    by_band.targets.set_all_bands(target("="));
    by_band.dependency =
        DependencySpec::parse("{ENodeBFunction.offset:[L900];SectorCarrier.power:[L1800]}")
            .expect("dependency");
    let result = run(
        vec![by_band],
        vec![
            cells(&[Some("3"), Some("40"), Some("4")]),
            enodeb(&[Some("3"), Some("3"), Some("3")]),
            sector,
        ],
    );
    assert_eq!(checks(&result, "EUtranCellFDD", "qrxlevmin"), vec!["OK", "OK", "NOK"]);
}

#[test]
fn other_duplex_records_pass_with_placeholder() {
    let mixed = records(
        "EUtranCellFDD",
        &[
            ("MeContext", &[Some("N1"), Some("N1")]),
            ("EUtranCellFDDId", &[Some("JKT001AL1"), None]),
            ("EUtranCellTDDId", &[None, Some("JKT001AE1")]),
            ("qRxLevMin", &[Some("-120"), None]),
        ],
    );
    let result = run(
        vec![rule("EUtranCellFDD", None, "qrxlevmin", "-124", "None")],
        vec![mixed],
    );
    assert_eq!(checks(&result, "EUtranCellFDD", "qrxlevmin"), vec!["NOK", "OK"]);
    assert_eq!(
        column(&result, "EUtranCellFDD", "qrxlevmin_ref")[1].as_deref(),
        Some("-")
    );
}

#[test]
fn resolver_reads_own_columns_for_same_object_type() {
    let set = cells(&[Some("1"), Some("2"), None]);
    let store = store(vec![]);
    let term = DependencyTerm::parse("EUtranCellFDD.qrxlevmin").expect("term");
    assert_eq!(
        DependencyResolver::new(&store).resolve_term(&set, &term),
        vec![Some("1".to_string()), Some("2".to_string()), None]
    );
}

#[test]
fn auditing_twice_gives_identical_tables() {
    let rules = RuleSet::new(vec![
        rule("EUtranCellFDD", None, "qrxlevmin", "8", "ENodeBFunction.offset.+"),
        rule("EUtranCellFDD", None, "crsgain", "[0,3]", "None"),
    ]);
    let store = store(vec![
        cells(&[Some("5"), Some("4"), None]),
        enodeb(&[Some("3"), Some("4"), Some("3")]),
    ]);
    let auditor = Auditor::new(BandResolver::new(BandConfig::default()));
    let first = auditor.audit(&rules, &store).expect("first");
    let second = auditor.audit(&rules, &store).expect("second");
    let first = first.table("EUtranCellFDD").expect("table").data();
    let second = second.table("EUtranCellFDD").expect("table").data();
    assert!(first.equals_missing(second));
    assert!(!store.get("EUtranCellFDD").expect("cells").has_column("qrxlevmin_check"));
}
