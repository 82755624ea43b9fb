//! Bulk-export query covering everything a rule set reads.

use ratatosk_model::RuleIndex;

/// `cmedit get <nodes> Mo.(p1,p2);Other.p -t`, every node when `nodes` is empty.
///
/// Parameters named `struct_member` address a struct member and render as
/// `struct.{member}`.
pub fn cmedit_query(index: &RuleIndex, nodes: &[String]) -> String {
    let node_part = if nodes.is_empty() {
        "*".to_string()
    } else {
        nodes.join(";")
    };
    let object_parts: Vec<String> = index
        .iter()
        .filter(|(_, requirement)| !requirement.parameters.is_empty())
        .map(|(object_type, requirement)| {
            let parameters: Vec<String> = requirement
                .parameters
                .iter()
                .map(String::as_str)
                .map(struct_member)
                .collect();
            match parameters.as_slice() {
                [single] => format!("{object_type}.{single}"),
                many => format!("{object_type}.({})", many.join(",")),
            }
        })
        .collect();
    format!("cmedit get {node_part} {} -t", object_parts.join(";"))
}

fn struct_member(parameter: &str) -> String {
    match parameter.rsplit_once('_') {
        Some((head, member)) if !head.is_empty() && !member.is_empty() => {
            format!("{head}.{{{member}}}")
        }
        _ => parameter.to_string(),
    }
}
