//! Merged, immutable configuration of one attached rule.

use crate::field::{DebugPredicate, Field, FieldPredicate};
use crate::options::{RuleKind, RuleOptions, Source, DEFAULT_QUERY_PARAM, DEFAULT_SCOPE};
use crate::rules::{
    CustomRule, FixedSetRule, FormatRule, LengthRule, NumericalityRule, PresenceRule,
};
use std::fmt;
use std::sync::Arc;

/// The evaluator selected for a binding, with its kind-specific settings.
#[derive(Debug)]
pub enum Rule {
    Presence(PresenceRule),
    Format(FormatRule),
    Length(LengthRule),
    Numericality(NumericalityRule),
    FixedSet(FixedSetRule),
    /// Remote uniqueness lookup against `endpoint`, value sent as `param`.
    Remote { endpoint: String, param: String },
    Custom(CustomRule),
}

/// Complete configuration of one binding.
///
/// Produced once by [`RuleConfig::merge`] and never mutated afterwards.
pub struct RuleConfig {
    pub kind: RuleKind,
    pub invalid_class: String,
    pub events: Vec<String>,
    pub scope: String,
    pub when: Option<FieldPredicate>,
    pub rule: Rule,
}

impl RuleConfig {
    /// Overlay `options` onto the defaults of `kind` and build the evaluator.
    ///
    /// Option values are not checked here: an invalid pattern is reported
    /// when the rule is evaluated.
    pub fn merge(kind: RuleKind, options: RuleOptions) -> Self {
        let merged = options.overlay(RuleOptions::defaults(kind));

        let rule = match kind {
            RuleKind::Presence => Rule::Presence(PresenceRule {
                blank_value: merged.blank_value.unwrap_or_default(),
            }),
            RuleKind::Format => Rule::Format(FormatRule::new(
                merged.validation_regex.unwrap_or_else(|| ".*".to_string()),
                merged.invert_rule.unwrap_or(false),
            )),
            RuleKind::Length => Rule::Length(LengthRule {
                minimum: merged.minimum,
                maximum: merged.maximum,
            }),
            RuleKind::Numericality => Rule::Numericality(NumericalityRule {
                only_integer: merged.only_integer.unwrap_or(false),
                allow_blank: merged.allow_blank.unwrap_or(false),
                blank_value: merged.blank_value.unwrap_or_default(),
            }),
            RuleKind::Uniqueness => match merged.source.unwrap_or_default() {
                Source::Fixed(values) => Rule::FixedSet(FixedSetRule { values }),
                Source::Remote(endpoint) => Rule::Remote {
                    endpoint,
                    param: merged
                        .query_param
                        .unwrap_or_else(|| DEFAULT_QUERY_PARAM.to_string()),
                },
            },
            RuleKind::Custom => Rule::Custom(CustomRule {
                validates_with: merged.validates_with,
            }),
        };

        Self {
            kind,
            invalid_class: merged.invalid_class.unwrap_or_default(),
            events: merged.validates_on.unwrap_or_default(),
            scope: merged.scope.unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            when: merged.when,
            rule,
        }
    }

    /// Evaluate the `when` gate. A missing gate always passes.
    pub fn should_run(&self, field: &dyn Field) -> bool {
        self.when.as_ref().map_or(true, |when| when(field))
    }

    /// Wrap in an `Arc` for sharing between the loop and lookup tasks.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl fmt::Debug for RuleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleConfig")
            .field("kind", &self.kind)
            .field("invalid_class", &self.invalid_class)
            .field("events", &self.events)
            .field("scope", &self.scope)
            .field("when", &DebugPredicate(&self.when))
            .field("rule", &self.rule)
            .finish()
    }
}
