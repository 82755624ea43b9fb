//! Target expression evaluation, one function per expression shape.

use std::borrow::Cow;

use ratatosk_common::{canonical_text, parse_f64};
use ratatosk_model::{Inequality, TargetExpression, Verdict};

/// Outcome for one record: the recorded target and the verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub reference: Option<String>,
    pub verdict: Verdict,
}

impl Evaluation {
    pub fn not_applicable(reference: Option<String>) -> Self {
        Self {
            reference,
            verdict: Verdict::Na,
        }
    }
}

/// Replaces dependency-driven targets with the concrete target selected by
/// the dependency value.
///
/// `=` becomes the dependency value itself. A piecewise map is looked up with
/// the dependency value. Returns `None` when no dependency value is available
/// or the map has no matching entry.
pub fn resolve_target<'a>(
    target: &'a TargetExpression,
    dependency_value: Option<&str>,
) -> Option<Cow<'a, TargetExpression>> {
    match target {
        TargetExpression::DependencyEqual => {
            dependency_value.map(|value| Cow::Owned(TargetExpression::Literal(canonical_text(value))))
        }
        TargetExpression::Piecewise(map) => map.select(dependency_value?).map(Cow::Borrowed),
        other => Some(Cow::Borrowed(other)),
    }
}

/// Evaluates a concrete target against a record value.
///
/// A missing value is always `NA`. Dependency-driven targets that were not
/// resolved through [`resolve_target`] evaluate to `NA` as well.
pub fn evaluate(target: &TargetExpression, value: Option<&str>) -> Evaluation {
    match target {
        TargetExpression::Wildcard => evaluate_wildcard(value),
        TargetExpression::Literal(expected) => evaluate_literal(expected, value),
        TargetExpression::Set(members) => evaluate_set(target, members, value),
        TargetExpression::Range { lo, hi } => evaluate_range(*lo, *hi, value),
        TargetExpression::Inequality(inequality) => evaluate_inequality(inequality, value),
        TargetExpression::Piecewise(_) | TargetExpression::DependencyEqual => {
            Evaluation::not_applicable(None)
        }
    }
}

fn evaluate_wildcard(value: Option<&str>) -> Evaluation {
    Evaluation {
        reference: value.map(str::to_string),
        verdict: if value.is_some() { Verdict::Ok } else { Verdict::Na },
    }
}

fn evaluate_literal(expected: &str, value: Option<&str>) -> Evaluation {
    let reference = Some(expected.to_string());
    let Some(value) = value else {
        return Evaluation::not_applicable(reference);
    };
    Evaluation {
        reference,
        verdict: Verdict::from_match(canonical_text(value) == expected),
    }
}

fn evaluate_set(target: &TargetExpression, members: &[String], value: Option<&str>) -> Evaluation {
    let reference = Some(target.to_string());
    let Some(value) = value else {
        return Evaluation::not_applicable(reference);
    };
    let canonical = canonical_text(value);
    Evaluation {
        reference,
        verdict: Verdict::from_match(members.contains(&canonical)),
    }
}

fn evaluate_range(lo: i64, hi: i64, value: Option<&str>) -> Evaluation {
    let reference = Some(format!("{lo} to {hi}"));
    let Some(value) = value else {
        return Evaluation::not_applicable(reference);
    };
    let matched = parse_f64(value)
        .filter(|number| number.fract() == 0.0)
        .is_some_and(|number| (lo as f64..=hi as f64).contains(&number));
    Evaluation {
        reference,
        verdict: Verdict::from_match(matched),
    }
}

fn evaluate_inequality(inequality: &Inequality, value: Option<&str>) -> Evaluation {
    let reference = Some(inequality.to_string());
    let Some(value) = value else {
        return Evaluation::not_applicable(reference);
    };
    Evaluation {
        reference,
        verdict: Verdict::from_match(inequality.holds(value)),
    }
}
