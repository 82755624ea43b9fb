//! Presentation tree `indicator -> group -> members` used by reporting.

use serde::Serialize;

use ratatosk_model::Rule;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupMember {
    pub subject: String,
    pub parameter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterGroup {
    pub name: String,
    pub members: Vec<GroupMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndicatorGroups {
    pub name: String,
    pub groups: Vec<ParameterGroup>,
}

/// Grouping labels in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParameterGroups {
    pub indicators: Vec<IndicatorGroups>,
}

impl ParameterGroups {
    pub fn from_rules(rules: &[Rule]) -> Self {
        let mut indicators: Vec<IndicatorGroups> = Vec::new();
        for rule in rules {
            let indicator = match indicators.iter().position(|i| i.name == rule.indicator) {
                Some(pos) => &mut indicators[pos],
                None => {
                    indicators.push(IndicatorGroups {
                        name: rule.indicator.clone(),
                        groups: Vec::new(),
                    });
                    let last = indicators.len() - 1;
                    &mut indicators[last]
                }
            };
            let group = match indicator.groups.iter().position(|g| g.name == rule.group) {
                Some(pos) => &mut indicator.groups[pos],
                None => {
                    indicator.groups.push(ParameterGroup {
                        name: rule.group.clone(),
                        members: Vec::new(),
                    });
                    let last = indicator.groups.len() - 1;
                    &mut indicator.groups[last]
                }
            };
            let member = GroupMember {
                subject: rule.subject(),
                parameter: rule.parameter.clone(),
            };
            if !group.members.contains(&member) {
                group.members.push(member);
            }
        }
        Self { indicators }
    }

    /// `(indicator, group)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterGroup)> {
        self.indicators.iter().flat_map(|indicator| {
            indicator
                .groups
                .iter()
                .map(move |group| (indicator.name.as_str(), group))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }
}
