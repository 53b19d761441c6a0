//! Reference expression parsing and out-of-range evaluation.
//!
//! Expression shapes, tried left to right (first match wins):
//!
//! ```text
//! "low-high"            inclusive numeric interval
//! ">x" ">=x" "<x" "<=x"  numeric comparison
//! anything else         categorical expected value (case-insensitive)
//! ```
//!
//! Malformed numeric expressions are not errors. They degrade to the
//! categorical branch so data entry is never blocked by an authoring mistake.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::ResultValue;

/// A parsed reference expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceExpression {
    Interval { low: f64, high: f64 },
    Greater { bound: f64 },
    GreaterOrEqual { bound: f64 },
    Less { bound: f64 },
    LessOrEqual { bound: f64 },
    Categorical { expected: String },
}

impl ReferenceExpression {
    /// Parse a reference expression. Returns `None` for an empty expression.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let expr = raw.trim();
        if expr.is_empty() {
            return None;
        }

        if let Some((low, high)) = parse_interval(expr) {
            return Some(Self::Interval { low, high });
        }

        // Two-character operators first so ">=" is not read as ">" + "=x".
        let comparisons: [(&str, fn(f64) -> Self); 4] = [
            (">=", |bound| Self::GreaterOrEqual { bound }),
            ("<=", |bound| Self::LessOrEqual { bound }),
            (">", |bound| Self::Greater { bound }),
            ("<", |bound| Self::Less { bound }),
        ];
        for (op, build) in comparisons {
            if let Some(rest) = expr.strip_prefix(op) {
                if let Some(bound) = parse_number(rest) {
                    return Some(build(bound));
                }
            }
        }

        Some(Self::Categorical {
            expected: expr.to_string(),
        })
    }

    /// Whether the numeric value `n` falls outside this expression.
    #[must_use]
    pub fn is_out_of_range(&self, n: f64) -> bool {
        match self {
            Self::Interval { low, high } => n < *low || n > *high,
            Self::Greater { bound } => n <= *bound,
            Self::GreaterOrEqual { bound } => n < *bound,
            Self::Less { bound } => n >= *bound,
            Self::LessOrEqual { bound } => n > *bound,
            Self::Categorical { expected } => !categorical_eq(&n.to_string(), expected),
        }
    }
}

/// Evaluate a captured value against a reference expression.
///
/// Returns `true` when the value is out of range. An empty or absent
/// expression never flags. Non-numeric values are always compared
/// categorically against the expression text.
#[must_use]
pub fn evaluate_range(value: &ResultValue, reference: Option<&str>) -> bool {
    let Some(raw) = reference.map(str::trim).filter(|r| !r.is_empty()) else {
        return false;
    };

    match value.as_number() {
        Some(n) => ReferenceExpression::parse(raw).is_some_and(|expr| expr.is_out_of_range(n)),
        None => !categorical_eq(&value.to_string(), raw),
    }
}

/// Parse a decimal number, accepting a comma as the decimal separator.
///
/// Non-finite values (`NaN`, `inf`) are rejected.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let normalized = s.replace(',', ".");
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_interval(expr: &str) -> Option<(f64, f64)> {
    // Skip a leading sign so "-5-5" splits as ("-5", "5").
    let search_from = usize::from(expr.starts_with('-'));
    let split_at = expr[search_from..].find('-')? + search_from;
    let low = parse_number(&expr[..split_at])?;
    let high = parse_number(&expr[split_at + 1..])?;
    Some((low, high))
}

fn categorical_eq(captured: &str, expected: &str) -> bool {
    captured.trim().to_lowercase() == expected.trim().to_lowercase()
}
