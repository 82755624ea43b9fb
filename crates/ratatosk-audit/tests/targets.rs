//! Target shapes evaluated through the auditor on node-level records.

mod common;

use common::{checks, column, records, rule, run};

fn node_records(values: &[Option<&str>]) -> ratatosk_ingest::RecordSet {
    let nodes: Vec<Option<&str>> = (0..values.len()).map(|_| Some("ERBS_JKT001_A")).collect();
    let ids: Vec<String> = (0..values.len()).map(|i| i.to_string()).collect();
    let ids: Vec<Option<&str>> = ids.iter().map(|i| Some(i.as_str())).collect();
    records(
        "Feature",
        &[
            ("MeContext", nodes.as_slice()),
            ("FeatureId", ids.as_slice()),
            ("state", values),
        ],
    )
}

#[test]
fn wildcard_is_ok_when_present_and_na_when_null() {
    let result = run(
        vec![rule("Feature", None, "state", "*", "None")],
        vec![node_records(&[Some("1"), None])],
    );
    assert_eq!(checks(&result, "Feature", "state"), vec!["OK", "NA"]);
    assert_eq!(
        column(&result, "Feature", "state_ref"),
        vec![Some("1".to_string()), None]
    );
}

#[test]
fn set_membership() {
    let result = run(
        vec![rule("Feature", None, "state", "[A, B]", "None")],
        vec![node_records(&[Some("A"), Some("C"), None])],
    );
    assert_eq!(checks(&result, "Feature", "state"), vec!["OK", "NOK", "NA"]);
    assert_eq!(
        column(&result, "Feature", "state_ref")[0].as_deref(),
        Some("[A,B]")
    );
}

#[test]
fn range_bounds_are_inclusive() {
    let result = run(
        vec![rule("Feature", None, "state", "(1,5)", "None")],
        vec![node_records(&[Some("1"), Some("5"), Some("6"), Some("0"), None])],
    );
    assert_eq!(
        checks(&result, "Feature", "state"),
        vec!["OK", "OK", "NOK", "NOK", "NA"]
    );
}

#[test]
fn inequality_against_numeric_operand() {
    let result = run(
        vec![rule("Feature", None, "state", ">10", "None")],
        vec![node_records(&[Some("15"), Some("5"), None])],
    );
    assert_eq!(checks(&result, "Feature", "state"), vec!["OK", "NOK", "NA"]);
}

#[test]
fn literal_ignores_trailing_zero_fraction() {
    let result = run(
        vec![rule("Feature", None, "state", "-124", "None")],
        vec![node_records(&[Some("-124.0"), Some("-120")])],
    );
    assert_eq!(checks(&result, "Feature", "state"), vec!["OK", "NOK"]);
}

#[test]
fn informational_rules_never_fail_but_keep_absence() {
    let mut info = rule("Feature", None, "state", "1", "None");
    info.action = Some("As Info".to_string());
    info.remark = Some("document only".to_string());
    let result = run(vec![info], vec![node_records(&[Some("9"), None])]);
    assert_eq!(checks(&result, "Feature", "state"), vec!["OK", "NA"]);
    assert_eq!(
        column(&result, "Feature", "state_ref"),
        vec![Some("document only".to_string()), Some("document only".to_string())]
    );
}

#[test]
fn missing_parameter_column_is_not_applicable() {
    let result = run(
        vec![rule("Feature", None, "absent", "1", "None")],
        vec![node_records(&[Some("1"), Some("2")])],
    );
    assert_eq!(checks(&result, "Feature", "absent"), vec!["NA", "NA"]);
}

#[test]
fn instance_selectors_produce_separate_tables() {
    let profiles = records(
        "QciProfilePredefined",
        &[
            ("MeContext", &[Some("N1"), Some("N1"), Some("N2")]),
            ("QciProfilePredefinedId", &[Some("qci1"), Some("qci9"), Some("qci1")]),
            ("priority", &[Some("2"), Some("9"), Some("3")]),
        ],
    );
    let result = run(
        vec![
            rule("QciProfilePredefined", Some("qci1"), "priority", "2", "None"),
            rule("QciProfilePredefined", Some("qci9"), "priority", "9", "None"),
        ],
        vec![profiles],
    );
    let subjects: Vec<&str> = result.subjects().collect();
    assert_eq!(subjects, vec!["QciProfilePredefined=qci1", "QciProfilePredefined=qci9"]);
    assert_eq!(
        checks(&result, "QciProfilePredefined=qci1", "priority"),
        vec!["OK", "NOK"]
    );
    assert_eq!(checks(&result, "QciProfilePredefined=qci9", "priority"), vec!["OK"]);
}

#[test]
fn summaries_and_transient_columns() {
    let mut result = run(
        vec![rule("Feature", None, "state", "[A,B]", "None")],
        vec![node_records(&[Some("A"), Some("C"), None, Some("B")])],
    );
    let tally = result.summarize("Feature", "state").expect("tally");
    assert_eq!((tally.ok, tally.nok, tally.na), (2, 1, 1));
    assert!(result.summarize("Feature", "unknown").is_none());

    let table = result.table("Feature").expect("table");
    assert!(table.has_column("state_eq"));
    assert!(table.has_column("band"));
    result.drop_transient();
    let table = result.table("Feature").expect("table");
    assert!(!table.has_column("state_eq"));
    assert!(!table.has_column("band"));
    assert!(table.has_column("state_check"));
}
