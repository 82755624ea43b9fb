use polars::prelude::DataFrame;
use ratatosk_audit::{AuditResult, Auditor, BandResolver};
use ratatosk_ingest::{RecordSet, RecordStore, text_frame};
use ratatosk_model::{Rule, RuleSet, SchemaConfig, TargetExpression};
use ratatosk_reference::ParameterGroups;
use ratatosk_report::{
    simple_report, summarize_groups, write_simple_report_to, write_summary_json,
};

fn make_df(columns: &[(&str, &[Option<&str>])]) -> DataFrame {
    text_frame(
        columns
            .iter()
            .map(|(name, values)| {
                (
                    name.to_string(),
                    values.iter().map(|v| v.map(str::to_string)).collect(),
                )
            })
            .collect(),
    )
    .expect("frame")
}

fn rule(parameter: &str, target: &str, group: &str) -> Rule {
    let mut rule = Rule {
        indicator: "Coverage".to_string(),
        group: group.to_string(),
        ..Rule::new("EUtranCellFDD", None, parameter)
    };
    rule.targets
        .set_all_bands(TargetExpression::parse(target).expect("target"));
    rule
}

fn audited() -> (AuditResult, ParameterGroups) {
    let cells = RecordSet::new(
        "EUtranCellFDD",
        &make_df(&[
            ("MeContext", &[Some("N1"), Some("N1"), Some("N1")]),
            ("EUtranCellFDDId", &[Some("JKT001AT1"), Some("JKT001AL1"), Some("JKT001AR1")]),
            ("qRxLevMin", &[Some("-124"), Some("-120"), None]),
            ("crsGain", &[Some("0"), Some("3"), None]),
        ]),
        &SchemaConfig::default(),
    )
    .expect("records");
    let mut store = RecordStore::new();
    store.insert(cells);
    let rules = vec![rule("qrxlevmin", "-124", "Idle"), rule("crsgain", "[0]", "Power")];
    let groups = ParameterGroups::from_rules(&rules);
    let result = Auditor::new(BandResolver::default())
        .audit(&RuleSet::new(rules), &store)
        .expect("audit");
    (result, groups)
}

#[test]
fn simple_report_csv() {
    let (result, _) = audited();
    let rows = simple_report(&result);
    let mut buffer = Vec::new();
    write_simple_report_to(&mut buffer, &rows).expect("write");
    let text = String::from_utf8(buffer).expect("utf8");
    insta::assert_snapshot!(text.trim_end(), @r"
    mecontext,MO Class,MO,Parameter,Value,Recommended Setting,Status
    N1,EUtranCellFDD,eutrancellfdd=JKT001AT1,qrxlevmin,-124,-124,OK
    N1,EUtranCellFDD,eutrancellfdd=JKT001AL1,qrxlevmin,-120,-124,NOK
    N1,EUtranCellFDD,eutrancellfdd=JKT001AR1,qrxlevmin,,-124,NA
    N1,EUtranCellFDD,eutrancellfdd=JKT001AT1,crsgain,0,[0],OK
    N1,EUtranCellFDD,eutrancellfdd=JKT001AL1,crsgain,3,[0],NOK
    N1,EUtranCellFDD,eutrancellfdd=JKT001AR1,crsgain,,[0],NA
    ");
}

#[test]
fn group_summary_combines_members_per_record() {
    let (result, groups) = audited();
    let summary = summarize_groups(&result, &groups);

    assert_eq!(summary.indicators.len(), 1);
    let indicator = &summary.indicators[0];
    assert_eq!(indicator.name, "Coverage");
    assert_eq!((indicator.tally.ok, indicator.tally.nok, indicator.tally.na), (1, 1, 1));

    let names: Vec<&str> = indicator.groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Idle", "Power"]);
    let idle = &indicator.groups[0];
    assert_eq!(idle.parameters[0].parameter, "qrxlevmin");
    assert_eq!(idle.parameters[0].tally.total(), 3);

    let total = summary.parameter_total();
    assert_eq!((total.ok, total.nok, total.na), (2, 2, 2));
}

#[test]
fn summary_json_uses_verdict_labels() {
    let (result, groups) = audited();
    let summary = summarize_groups(&result, &groups);
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("summary.json");
    write_summary_json(&path, &summary).expect("write");

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
    let indicator = &json["indicators"][0];
    assert_eq!(indicator["name"], "Coverage");
    assert_eq!(indicator["NOK"], 1);
    assert_eq!(indicator["groups"][1]["parameters"][0]["parameter"], "crsgain");
    assert_eq!(indicator["groups"][1]["parameters"][0]["OK"], 1);
}
