//! Synchronous rules.
//!
//! These rules decide from the field's current value alone.

use super::FieldRule;
use crate::error::RuleError;
use crate::field::{DebugPredicate, Field, FieldPredicate};
use crate::signal::Outcome;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

static DECIMAL_REGEX: OnceLock<Regex> = OnceLock::new();
static INTEGER_REGEX: OnceLock<Regex> = OnceLock::new();
static RADIX_REGEX: OnceLock<Regex> = OnceLock::new();

fn decimal_regex() -> &'static Regex {
    DECIMAL_REGEX
        .get_or_init(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").unwrap())
}

fn integer_regex() -> &'static Regex {
    INTEGER_REGEX.get_or_init(|| Regex::new(r"^[+-]?\d+$").unwrap())
}

fn radix_regex() -> &'static Regex {
    RADIX_REGEX.get_or_init(|| {
        Regex::new(r"^0(?:[xX][0-9a-fA-F]+|[oO][0-7]+|[bB][01]+)$").unwrap()
    })
}

/// Value presence rule.
///
/// Invalid when the value equals `blank_value`, or when the field is an
/// unchecked checkbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceRule {
    pub blank_value: String,
}

impl FieldRule for PresenceRule {
    fn evaluate(&self, field: &dyn Field) -> Result<Outcome, RuleError> {
        let blank = field.value() == self.blank_value;
        let unchecked = field.is_checkbox() && !field.is_checked();
        Ok(Outcome::from_valid(!blank && !unchecked))
    }

    fn rule_name(&self) -> &'static str {
        "presence"
    }
}

/// Regex format rule.
///
/// Empty values are skipped. The pattern is searched anywhere in the value;
/// with `invert` set, a match makes the value invalid.
pub struct FormatRule {
    pub pattern: String,
    pub invert: bool,
    compiled: Result<Regex, regex::Error>,
}

impl FormatRule {
    pub fn new(pattern: impl Into<String>, invert: bool) -> Self {
        let pattern = pattern.into();
        let compiled = Regex::new(&pattern);
        Self {
            pattern,
            invert,
            compiled,
        }
    }

    /// Verdict for a raw value.
    pub fn check(&self, value: &str) -> Result<Outcome, RuleError> {
        if value.is_empty() {
            return Ok(Outcome::Skip);
        }

        let regex = self
            .compiled
            .as_ref()
            .map_err(|e| RuleError::InvalidPattern {
                pattern: self.pattern.clone(),
                reason: e.to_string(),
            })?;

        let matched = regex.is_match(value);
        Ok(Outcome::from_valid(matched != self.invert))
    }
}

impl FieldRule for FormatRule {
    fn evaluate(&self, field: &dyn Field) -> Result<Outcome, RuleError> {
        self.check(&field.value())
    }

    fn rule_name(&self) -> &'static str {
        "format"
    }
}

impl fmt::Debug for FormatRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRule")
            .field("pattern", &self.pattern)
            .field("invert", &self.invert)
            .field("compiled", &self.compiled.is_ok())
            .finish()
    }
}

/// Value length rule. Both bounds are inclusive; length counts characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthRule {
    pub minimum: Option<usize>,
    pub maximum: Option<usize>,
}

impl LengthRule {
    pub fn check(&self, value: &str) -> Outcome {
        let len = value.chars().count();
        let too_short = self.minimum.is_some_and(|min| len < min);
        let too_long = self.maximum.is_some_and(|max| len > max);
        Outcome::from_valid(!too_short && !too_long)
    }
}

impl FieldRule for LengthRule {
    fn evaluate(&self, field: &dyn Field) -> Result<Outcome, RuleError> {
        Ok(self.check(&field.value()))
    }

    fn rule_name(&self) -> &'static str {
        "length"
    }
}

/// Numeric value rule.
///
/// Commas are stripped before parsing. Parsing is lenient the way form input
/// coercion usually is: surrounding whitespace is ignored, an empty value
/// counts as zero, and `Infinity` as well as `0x`/`0o`/`0b` literals are
/// numbers. `only_integer` restricts valid values to optionally signed
/// decimal digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericalityRule {
    pub only_integer: bool,
    pub allow_blank: bool,
    pub blank_value: String,
}

impl NumericalityRule {
    pub fn check(&self, value: &str) -> Outcome {
        if self.allow_blank && value == self.blank_value {
            return Outcome::Skip;
        }

        let stripped = value.replace(',', "");
        let trimmed = stripped.trim();
        if trimmed.is_empty() {
            return Outcome::Valid;
        }

        if self.only_integer {
            return Outcome::from_valid(integer_regex().is_match(trimmed));
        }

        Outcome::from_valid(is_number(trimmed))
    }
}

fn is_number(value: &str) -> bool {
    matches!(value, "Infinity" | "+Infinity" | "-Infinity")
        || decimal_regex().is_match(value)
        || radix_regex().is_match(value)
}

impl FieldRule for NumericalityRule {
    fn evaluate(&self, field: &dyn Field) -> Result<Outcome, RuleError> {
        Ok(self.check(&field.value()))
    }

    fn rule_name(&self) -> &'static str {
        "numericality"
    }
}

/// Uniqueness against a fixed set of taken values.
///
/// Signals are emitted once per member examined, in set order, while the
/// marker follows [`FixedSetRule::verdict`]: invalid iff any member equals the
/// value. An empty value is not evaluated at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedSetRule {
    pub values: Vec<String>,
}

impl FixedSetRule {
    pub fn outcomes(&self, value: &str) -> Vec<Outcome> {
        if value.is_empty() {
            return Vec::new();
        }
        self.values
            .iter()
            .map(|taken| Outcome::from_valid(taken != value))
            .collect()
    }

    /// Overall result; `None` when nothing was examined.
    pub fn verdict(&self, value: &str) -> Option<Outcome> {
        if value.is_empty() || self.values.is_empty() {
            return None;
        }
        Some(Outcome::from_valid(!self.values.iter().any(|taken| taken == value)))
    }
}

/// Caller-supplied predicate rule.
#[derive(Clone)]
pub struct CustomRule {
    pub validates_with: Option<FieldPredicate>,
}

impl FieldRule for CustomRule {
    fn evaluate(&self, field: &dyn Field) -> Result<Outcome, RuleError> {
        let predicate = self
            .validates_with
            .as_ref()
            .ok_or(RuleError::MissingValidator)?;
        Ok(Outcome::from_valid(predicate(field)))
    }

    fn rule_name(&self) -> &'static str {
        "custom"
    }
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRule")
            .field("validates_with", &DebugPredicate(&self.validates_with))
            .finish()
    }
}
