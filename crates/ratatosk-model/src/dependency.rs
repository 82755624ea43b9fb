//! Dependency expression grammar.
//!
//! `Type[=instance].parameter[.op]`, a `;`-separated chain of such terms, or a
//! band map `{Type.param:[L900,L1800];Other.param:[L2100]}`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use ratatosk_common::{format_numeric, strip_whitespace};
use regex::Regex;

use crate::error::DependencyParseError;
use crate::rule::subject_name;

static BAND_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([^:;{}\[\]]+):\[([^\[\]]*)\]").expect("Invalid band dependency regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithmeticOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Add),
            "-" => Some(Self::Sub),
            "*" => Some(Self::Mul),
            "/" => Some(Self::Div),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }

    /// `lhs op rhs`, `None` when the result is not finite (division by zero).
    pub fn apply(self, lhs: f64, rhs: f64) -> Option<f64> {
        let result = match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
        };
        result.is_finite().then_some(result)
    }

    /// Applies the operator and renders the result the way values are compared.
    pub fn apply_text(self, lhs: f64, rhs: f64) -> Option<String> {
        self.apply(lhs, rhs).map(format_numeric)
    }
}

/// One reference to another object type's parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTerm {
    pub object_type: String,
    pub instance: Option<String>,
    /// Lower-cased parameter name.
    pub parameter: String,
    pub op: Option<ArithmeticOp>,
}

impl DependencyTerm {
    pub fn parse(text: &str) -> Result<Self, DependencyParseError> {
        let term = strip_whitespace(text);
        let malformed = || DependencyParseError::MalformedTerm { term: term.clone() };
        let mut parts = term.split('.');
        let head = parts.next().unwrap_or_default();
        let parameter = parts.next().ok_or_else(malformed)?;
        let op = parts.next();
        if parts.next().is_some() || parameter.is_empty() {
            return Err(malformed());
        }
        let (object_type, instance) = match head.split_once('=') {
            Some((object_type, instance)) => (object_type, Some(instance)),
            None => (head, None),
        };
        if object_type.is_empty() {
            return Err(malformed());
        }
        let op = match op {
            Some(symbol) => Some(ArithmeticOp::from_symbol(symbol).ok_or_else(|| {
                DependencyParseError::UnknownOperator {
                    term: term.clone(),
                    op: symbol.to_string(),
                }
            })?),
            None => None,
        };
        Ok(Self {
            object_type: object_type.to_string(),
            instance: instance.filter(|i| !i.is_empty()).map(str::to_string),
            parameter: parameter.to_lowercase(),
            op,
        })
    }

    /// `Type` or `Type=instance`.
    pub fn subject(&self) -> String {
        subject_name(&self.object_type, self.instance.as_deref())
    }

    /// Key identifying the resolved values of this term, e.g. `SectorCarrier=1.power`.
    /// The auditor caches one resolution per key and rule.
    pub fn column_key(&self) -> String {
        format!("{}.{}", self.subject(), self.parameter)
    }
}

impl fmt::Display for DependencyTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.subject(), self.parameter)?;
        if let Some(op) = self.op {
            write!(f, ".{}", op.symbol())?;
        }
        Ok(())
    }
}

/// Parsed dependency cell of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencySpec {
    /// Steps applied in declaration order. Empty means no dependency.
    Chain(Vec<DependencyTerm>),
    /// Lower-cased band label to the term used for records of that band.
    ByBand(BTreeMap<String, DependencyTerm>),
}

impl Default for DependencySpec {
    fn default() -> Self {
        Self::Chain(Vec::new())
    }
}

impl DependencySpec {
    /// Parses a dependency cell. Blank and `None` mean no dependency.
    pub fn parse(text: &str) -> Result<Self, DependencyParseError> {
        let stripped = strip_whitespace(text);
        if stripped.is_empty() || stripped.eq_ignore_ascii_case("none") {
            return Ok(Self::default());
        }
        if stripped.starts_with('{') {
            return Self::parse_band_map(&stripped);
        }
        stripped
            .split(';')
            .filter(|term| !term.is_empty())
            .map(DependencyTerm::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::Chain)
    }

    fn parse_band_map(text: &str) -> Result<Self, DependencyParseError> {
        let mut by_band = BTreeMap::new();
        for captures in BAND_ENTRY.captures_iter(text) {
            let term = DependencyTerm::parse(&captures[1])?;
            for band in captures[2].split(',').filter(|band| !band.is_empty()) {
                by_band.insert(band.to_lowercase(), term.clone());
            }
        }
        if by_band.is_empty() {
            return Err(DependencyParseError::EmptyBandMap {
                text: text.to_string(),
            });
        }
        Ok(Self::ByBand(by_band))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::Chain(terms) if terms.is_empty())
    }

    /// Terms that apply to records of `band`, in application order.
    pub fn terms_for_band(&self, band: &str) -> Vec<&DependencyTerm> {
        match self {
            Self::Chain(terms) => terms.iter().collect(),
            Self::ByBand(by_band) => by_band.get(&band.to_lowercase()).into_iter().collect(),
        }
    }

    /// Every term referenced, regardless of band.
    pub fn terms(&self) -> Vec<&DependencyTerm> {
        match self {
            Self::Chain(terms) => terms.iter().collect(),
            Self::ByBand(by_band) => by_band.values().collect(),
        }
    }

    /// Whether some band resolves a term that feeds target selection.
    pub fn has_selector_term(&self) -> bool {
        self.terms().iter().any(|term| term.op.is_none())
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chain(terms) if terms.is_empty() => f.write_str("None"),
            Self::Chain(terms) => {
                let rendered: Vec<String> = terms.iter().map(ToString::to_string).collect();
                f.write_str(&rendered.join(";"))
            }
            Self::ByBand(by_band) => {
                let rendered: Vec<String> = by_band
                    .iter()
                    .map(|(band, term)| format!("{term}:[{band}]"))
                    .collect();
                write!(f, "{{{}}}", rendered.join(";"))
            }
        }
    }
}
