use std::collections::BTreeMap;

use crate::dependency::DependencySpec;
use crate::target::TargetExpression;

/// Action text that turns a rule informational.
pub const AS_INFO_ACTION: &str = "as info";

/// `Type` or `Type=instance`.
pub fn subject_name(object_type: &str, instance: Option<&str>) -> String {
    match instance {
        Some(instance) => format!("{object_type}={instance}"),
        None => object_type.to_string(),
    }
}

pub fn ref_column(parameter: &str) -> String {
    format!("{parameter}_ref")
}

pub fn check_column(parameter: &str) -> String {
    format!("{parameter}_check")
}

pub fn eq_column(parameter: &str) -> String {
    format!("{parameter}_eq")
}

/// Targets of one rule, keyed by lower-cased band label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandTargets {
    pub all_bands: Option<TargetExpression>,
    pub by_band: BTreeMap<String, TargetExpression>,
}

impl BandTargets {
    /// Band-specific target, falling back to the all-band target.
    pub fn for_band(&self, band: &str) -> Option<&TargetExpression> {
        self.by_band
            .get(&band.to_lowercase())
            .or(self.all_bands.as_ref())
    }

    /// Returns `false` when the band already had a target.
    pub fn insert_band(&mut self, band: &str, target: TargetExpression) -> bool {
        let key = band.to_lowercase();
        if self.by_band.contains_key(&key) {
            return false;
        }
        self.by_band.insert(key, target);
        true
    }

    /// Returns `false` when an all-band target was already set.
    pub fn set_all_bands(&mut self, target: TargetExpression) -> bool {
        if self.all_bands.is_some() {
            return false;
        }
        self.all_bands = Some(target);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetExpression> {
        self.all_bands.iter().chain(self.by_band.values())
    }

    pub fn is_empty(&self) -> bool {
        self.all_bands.is_none() && self.by_band.is_empty()
    }
}

pub const DEFAULT_INDICATOR: &str = "Default Indicator";
pub const DEFAULT_GROUP: &str = "Default Group";

/// One expected-setting statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub object_type: String,
    /// Empty means every instance of the object type.
    pub instance: Option<String>,
    /// Lower-cased, whitespace-free.
    pub parameter: String,
    pub targets: BandTargets,
    pub dependency: DependencySpec,
    pub action: Option<String>,
    pub remark: Option<String>,
    /// Free-text rule description from the `Rules` column.
    pub description: Option<String>,
    pub indicator: String,
    pub group: String,
}

impl Rule {
    /// Rule without targets, dependency or annotations.
    pub fn new(object_type: &str, instance: Option<&str>, parameter: &str) -> Self {
        Self {
            object_type: object_type.to_string(),
            instance: instance.map(str::to_string),
            parameter: parameter.to_lowercase(),
            targets: BandTargets::default(),
            dependency: DependencySpec::default(),
            action: None,
            remark: None,
            description: None,
            indicator: DEFAULT_INDICATOR.to_string(),
            group: DEFAULT_GROUP.to_string(),
        }
    }

    pub fn subject(&self) -> String {
        subject_name(&self.object_type, self.instance.as_deref())
    }

    pub fn is_informational(&self) -> bool {
        self.action
            .as_deref()
            .is_some_and(|action| action.trim().eq_ignore_ascii_case(AS_INFO_ACTION))
    }

    pub fn target_for_band(&self, band: &str) -> Option<&TargetExpression> {
        self.targets.for_band(band)
    }

    /// Text recorded as the target of an informational rule.
    pub fn informational_reference(&self) -> String {
        self.remark
            .clone()
            .or_else(|| self.description.clone())
            .unwrap_or_else(|| AS_INFO_ACTION.to_string())
    }
}

/// What the ingestion side has to fetch for one object type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectRequirement {
    /// Instance keys referenced by rules or dependencies, sorted.
    pub instances: Vec<String>,
    /// Parameters referenced, first-seen order.
    pub parameters: Vec<String>,
    /// Some reference applies to every instance.
    pub all_instances: bool,
    /// At least one rule audits this object type (not only read by dependencies).
    pub audited: bool,
}

impl ObjectRequirement {
    /// Instance keys to restrict loading to, `None` when every instance is needed.
    pub fn instance_filter(&self) -> Option<&[String]> {
        if self.all_instances || self.instances.is_empty() {
            None
        } else {
            Some(&self.instances)
        }
    }

    fn add_instance(&mut self, instance: Option<&str>) {
        match instance {
            Some(instance) => {
                if let Err(pos) = self.instances.binary_search_by(|i| i.as_str().cmp(instance)) {
                    self.instances.insert(pos, instance.to_string());
                }
            }
            None => self.all_instances = true,
        }
    }

    fn add_parameter(&mut self, parameter: &str) {
        if !self.parameters.iter().any(|p| p == parameter) {
            self.parameters.push(parameter.to_string());
        }
    }
}

/// Object type to requirement, covering dependency-only object types too.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleIndex {
    objects: BTreeMap<String, ObjectRequirement>,
}

impl RuleIndex {
    pub fn from_rules(rules: &[Rule]) -> Self {
        let mut objects: BTreeMap<String, ObjectRequirement> = BTreeMap::new();
        for rule in rules {
            let entry = objects.entry(rule.object_type.clone()).or_default();
            entry.audited = true;
            entry.add_instance(rule.instance.as_deref());
            entry.add_parameter(&rule.parameter);
        }
        for rule in rules {
            for term in rule.dependency.terms() {
                let entry = objects.entry(term.object_type.clone()).or_default();
                entry.add_instance(term.instance.as_deref());
                entry.add_parameter(&term.parameter);
            }
        }
        Self { objects }
    }

    pub fn get(&self, object_type: &str) -> Option<&ObjectRequirement> {
        self.objects.get(object_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ObjectRequirement)> {
        self.objects.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn object_types(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Compiled, immutable rules plus their lookup index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
    index: RuleIndex,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        let index = RuleIndex::from_rules(&rules);
        Self { rules, index }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn index(&self) -> &RuleIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Instance selectors audited for `object_type`, `None` (all instances) first.
    pub fn selectors(&self, object_type: &str) -> Vec<Option<&str>> {
        let mut selectors: Vec<Option<&str>> = self
            .rules
            .iter()
            .filter(|rule| rule.object_type == object_type)
            .map(|rule| rule.instance.as_deref())
            .collect();
        selectors.sort_unstable();
        selectors.dedup();
        selectors
    }

    pub fn rules_for<'a>(
        &'a self,
        object_type: &'a str,
        instance: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules
            .iter()
            .filter(move |rule| rule.object_type == object_type && rule.instance.as_deref() == instance)
    }

    pub fn find(&self, subject: &str, parameter: &str) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|rule| rule.parameter == parameter && rule.subject() == subject)
    }
}
