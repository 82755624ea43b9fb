//! Target expression grammar.
//!
//! A reference cell holds one of:
//!
//! | text              | variant                                   |
//! |-------------------|-------------------------------------------|
//! | `*`               | [`TargetExpression::Wildcard`]            |
//! | `=`               | [`TargetExpression::DependencyEqual`]     |
//! | `{k1:v1;k2:v2}`   | [`TargetExpression::Piecewise`]           |
//! | `[a,b,c]`         | [`TargetExpression::Set`]                 |
//! | `(lo,hi)`         | [`TargetExpression::Range`]               |
//! | `>10`, `!=0`, ... | [`TargetExpression::Inequality`]          |
//! | anything else     | [`TargetExpression::Literal`]             |

use std::fmt;

use ratatosk_common::{canonical_text, format_numeric, parse_f64, parse_i64, strip_whitespace};
use tracing::warn;

use crate::error::TargetParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InequalityOp {
    Gt,
    Ge,
    Lt,
    Le,
    Ne,
}

impl InequalityOp {
    // Two-character operators first so `>=` is not read as `>` + `=5`.
    const PREFIXES: [(&'static str, InequalityOp); 5] = [
        (">=", InequalityOp::Ge),
        ("<=", InequalityOp::Le),
        ("!=", InequalityOp::Ne),
        (">", InequalityOp::Gt),
        ("<", InequalityOp::Lt),
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            InequalityOp::Gt => ">",
            InequalityOp::Ge => ">=",
            InequalityOp::Lt => "<",
            InequalityOp::Le => "<=",
            InequalityOp::Ne => "!=",
        }
    }

    fn split_prefix(text: &str) -> Option<(Self, &str)> {
        Self::PREFIXES
            .iter()
            .find_map(|(symbol, op)| text.strip_prefix(*symbol).map(|rest| (*op, rest)))
    }

    fn compare(self, value: f64, operand: f64) -> bool {
        match self {
            InequalityOp::Gt => value > operand,
            InequalityOp::Ge => value >= operand,
            InequalityOp::Lt => value < operand,
            InequalityOp::Le => value <= operand,
            InequalityOp::Ne => value != operand,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Text(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Number(n) => f.write_str(&format_numeric(*n)),
            Operand::Text(t) => f.write_str(t),
        }
    }
}

/// `op operand`, e.g. `>=10`.
#[derive(Debug, Clone, PartialEq)]
pub struct Inequality {
    pub op: InequalityOp,
    pub operand: Operand,
}

impl Inequality {
    /// Parses `>10`, `<= -3`, `!=off`. Returns `None` without a leading operator.
    pub fn parse(text: &str) -> Option<Self> {
        let stripped = strip_whitespace(text);
        let (op, rest) = InequalityOp::split_prefix(&stripped)?;
        if rest.is_empty() {
            return None;
        }
        let operand = match parse_f64(rest) {
            Some(number) => Operand::Number(number),
            None => Operand::Text(canonical_text(rest)),
        };
        Some(Self { op, operand })
    }

    /// Whether `value` satisfies the inequality.
    ///
    /// A numeric operand needs a numeric value, except for `!=` where a
    /// non-numeric value is trivially different. A text operand only
    /// supports `!=`.
    pub fn holds(&self, value: &str) -> bool {
        match &self.operand {
            Operand::Number(operand) => match parse_f64(value) {
                Some(number) => self.op.compare(number, *operand),
                None => self.op == InequalityOp::Ne,
            },
            Operand::Text(operand) => {
                self.op == InequalityOp::Ne && canonical_text(value) != *operand
            }
        }
    }
}

impl fmt::Display for Inequality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.symbol(), self.operand)
    }
}

/// Key of a piecewise map entry.
#[derive(Debug, Clone, PartialEq)]
pub enum PiecewiseKey {
    /// Exact dependency value, canonicalized.
    Literal(String),
    /// Bucket such as `>=10` or `!=ON`.
    Bucket(Inequality),
}

impl fmt::Display for PiecewiseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PiecewiseKey::Literal(key) => f.write_str(key),
            PiecewiseKey::Bucket(bucket) => bucket.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseEntry {
    pub key: PiecewiseKey,
    pub target: TargetExpression,
}

/// Target chosen by the dependency's resolved value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PiecewiseMap {
    pub entries: Vec<PiecewiseEntry>,
}

impl PiecewiseMap {
    /// Selects the target for a dependency value.
    ///
    /// Bucket keys are tested first, in declared order, and the first that
    /// holds wins. A text value can only satisfy a `!=` bucket. Otherwise the
    /// canonical value is looked up among the literal keys.
    pub fn select(&self, dependency_value: &str) -> Option<&TargetExpression> {
        let bucketed = self.entries.iter().find(|entry| match &entry.key {
            PiecewiseKey::Bucket(bucket) => bucket.holds(dependency_value),
            PiecewiseKey::Literal(_) => false,
        });
        if let Some(entry) = bucketed {
            return Some(&entry.target);
        }
        let canonical = canonical_text(dependency_value);
        self.entries
            .iter()
            .find(|entry| matches!(&entry.key, PiecewiseKey::Literal(key) if *key == canonical))
            .map(|entry| &entry.target)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn parse(text: &str, inner: &str) -> Result<Self, TargetParseError> {
        let mut entries = Vec::new();
        for part in inner.split(';').filter(|part| !part.is_empty()) {
            let Some((key, value)) = part.split_once(':') else {
                warn!(expression = text, entry = part, "skipping piecewise entry without `key:value`");
                continue;
            };
            if key.is_empty() || value.is_empty() {
                warn!(expression = text, entry = part, "skipping piecewise entry with empty side");
                continue;
            }
            if value.starts_with('{') {
                warn!(expression = text, entry = part, "skipping nested piecewise entry");
                continue;
            }
            let key = match Inequality::parse(key) {
                Some(bucket) => PiecewiseKey::Bucket(bucket),
                None => PiecewiseKey::Literal(canonical_text(key)),
            };
            let target = TargetExpression::parse(value)?;
            entries.push(PiecewiseEntry { key, target });
        }
        if entries.is_empty() {
            warn!(expression = text, "piecewise target has no usable entries");
        }
        Ok(Self { entries })
    }
}

impl fmt::Display for PiecewiseMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, entry) in self.entries.iter().enumerate() {
            if idx > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}:{}", entry.key, entry.target)?;
        }
        f.write_str("}")
    }
}

/// Expected value of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetExpression {
    Wildcard,
    Literal(String),
    Set(Vec<String>),
    Range { lo: i64, hi: i64 },
    Inequality(Inequality),
    Piecewise(PiecewiseMap),
    DependencyEqual,
}

impl TargetExpression {
    /// Classifies and parses a target cell.
    ///
    /// Range bounds are checked here: a non-integer or inverted range is a
    /// configuration error. Malformed piecewise entries are skipped with a
    /// warning.
    pub fn parse(text: &str) -> Result<Self, TargetParseError> {
        let stripped = strip_whitespace(text);
        if stripped.is_empty() {
            return Err(TargetParseError::Empty);
        }
        if stripped == "*" {
            return Ok(Self::Wildcard);
        }
        if stripped == "=" {
            return Ok(Self::DependencyEqual);
        }
        if let Some(inner) = enclosed(&stripped, '{', '}') {
            return PiecewiseMap::parse(&stripped, inner).map(Self::Piecewise);
        }
        if let Some(inner) = enclosed(&stripped, '[', ']') {
            let members = inner
                .split(',')
                .map(canonical_text)
                .filter(|member| !member.is_empty())
                .collect();
            return Ok(Self::Set(members));
        }
        if let Some(inner) = enclosed(&stripped, '(', ')') {
            return parse_range(&stripped, inner);
        }
        if let Some(inequality) = Inequality::parse(&stripped) {
            return Ok(Self::Inequality(inequality));
        }
        Ok(Self::Literal(canonical_text(&stripped)))
    }

    /// Whether evaluating this target needs a resolved dependency value.
    pub fn needs_dependency(&self) -> bool {
        matches!(self, Self::Piecewise(_) | Self::DependencyEqual)
    }
}

fn enclosed(text: &str, open: char, close: char) -> Option<&str> {
    text.strip_prefix(open)?.strip_suffix(close)
}

fn parse_range(text: &str, inner: &str) -> Result<TargetExpression, TargetParseError> {
    let bounds: Vec<&str> = inner.split(',').collect();
    let [lo, hi] = bounds.as_slice() else {
        return Err(TargetParseError::RangeArity {
            text: text.to_string(),
        });
    };
    let parse_bound = |bound: &str| {
        parse_i64(bound).ok_or_else(|| TargetParseError::RangeBoundNotInteger {
            text: text.to_string(),
            bound: bound.to_string(),
        })
    };
    let lo = parse_bound(lo)?;
    let hi = parse_bound(hi)?;
    if lo > hi {
        return Err(TargetParseError::RangeInverted {
            text: text.to_string(),
            lo,
            hi,
        });
    }
    Ok(TargetExpression::Range { lo, hi })
}

impl fmt::Display for TargetExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wildcard => f.write_str("*"),
            Self::Literal(value) => f.write_str(value),
            Self::Set(members) => write!(f, "[{}]", members.join(",")),
            Self::Range { lo, hi } => write!(f, "({lo},{hi})"),
            Self::Inequality(inequality) => inequality.fmt(f),
            Self::Piecewise(map) => map.fmt(f),
            Self::DependencyEqual => f.write_str("="),
        }
    }
}
