//! Rule kinds, caller-supplied options and the per-kind defaults they are
//! overlaid onto.
//!
//! ## Example
//!
//! ```rust,ignore
//! use fieldcheck::options::{RuleKind, RuleOptions};
//!
//! let options = RuleOptions::new().minimum(3).maximum(50);
//! let merged = options.overlay(RuleOptions::defaults(RuleKind::Length));
//! assert_eq!(merged.invalid_class.as_deref(), Some("invalid-length"));
//! ```

use crate::field::{DebugPredicate, Field, FieldPredicate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default scope selector for state markers.
pub const DEFAULT_SCOPE: &str = "fieldset";

/// Default query parameter carrying the value in remote lookups.
pub const DEFAULT_QUERY_PARAM: &str = "q";

/// The kind of rule attached to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Presence,
    Format,
    Length,
    Numericality,
    Uniqueness,
    Custom,
}

impl RuleKind {
    /// Name used in rule definitions and logs.
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Presence => "presence",
            RuleKind::Format => "format",
            RuleKind::Length => "length",
            RuleKind::Numericality => "numericality",
            RuleKind::Uniqueness => "uniqueness",
            RuleKind::Custom => "custom",
        }
    }

    /// Suffix of the kind-qualified outcome signals (`invalid-<qualifier>`).
    ///
    /// Custom rules only emit the generic signals.
    pub fn qualifier(&self) -> Option<&'static str> {
        match self {
            RuleKind::Custom => None,
            other => Some(other.name()),
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where uniqueness rules look for existing values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source {
    /// A fixed set of taken values.
    Fixed(Vec<String>),
    /// URL of an endpoint answering with a JSON array of matches.
    Remote(String),
}

impl Source {
    pub fn fixed<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Source::Fixed(values.into_iter().map(Into::into).collect())
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Source::Remote(url.into())
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::Fixed(Vec::new())
    }
}

/// Caller-supplied options for one rule.
///
/// Every option is optional; unset options take the kind defaults when
/// overlaid with [`RuleOptions::overlay`]. Options that do not apply to a
/// kind are ignored by it.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOptions {
    /// Marker set on the enclosing scope while the rule fails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_class: Option<String>,
    /// Events that trigger re-evaluation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validates_on: Option<Vec<String>>,
    /// Selector of the scope carrying the marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Gate deciding whether the rule runs at all
    #[serde(skip)]
    pub when: Option<FieldPredicate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub blank_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_blank: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_regex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invert_rule: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_integer: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_param: Option<String>,

    /// Predicate of custom rules
    #[serde(skip)]
    pub validates_with: Option<FieldPredicate>,
}

impl RuleOptions {
    /// Empty options: everything falls back to the kind defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh, complete default set for `kind`.
    ///
    /// `minimum`, `maximum` and `validates_with` stay unset: they have no
    /// default value.
    pub fn defaults(kind: RuleKind) -> Self {
        let (invalid_class, validates_on): (&str, &[&str]) = match kind {
            RuleKind::Presence => ("invalid-presence", &["change", "blur"]),
            RuleKind::Format => ("invalid-format", &["change", "blur"]),
            RuleKind::Length => ("invalid-length", &["change", "blur"]),
            RuleKind::Numericality => ("invalid-numericality", &["change", "blur"]),
            RuleKind::Uniqueness => ("invalid-uniqueness", &["change", "blur"]),
            RuleKind::Custom => ("invalid", &["change"]),
        };

        Self {
            invalid_class: Some(invalid_class.to_string()),
            validates_on: Some(validates_on.iter().map(|e| e.to_string()).collect()),
            scope: Some(DEFAULT_SCOPE.to_string()),
            when: Some(Arc::new(|_: &dyn Field| true)),
            blank_value: Some(String::new()),
            allow_blank: Some(false),
            validation_regex: Some(".*".to_string()),
            invert_rule: Some(false),
            minimum: None,
            maximum: None,
            only_integer: Some(false),
            source: Some(Source::default()),
            query_param: Some(DEFAULT_QUERY_PARAM.to_string()),
            validates_with: None,
        }
    }

    /// Fill every unset option from `defaults`.
    pub fn overlay(self, defaults: RuleOptions) -> RuleOptions {
        RuleOptions {
            invalid_class: self.invalid_class.or(defaults.invalid_class),
            validates_on: self.validates_on.or(defaults.validates_on),
            scope: self.scope.or(defaults.scope),
            when: self.when.or(defaults.when),
            blank_value: self.blank_value.or(defaults.blank_value),
            allow_blank: self.allow_blank.or(defaults.allow_blank),
            validation_regex: self.validation_regex.or(defaults.validation_regex),
            invert_rule: self.invert_rule.or(defaults.invert_rule),
            minimum: self.minimum.or(defaults.minimum),
            maximum: self.maximum.or(defaults.maximum),
            only_integer: self.only_integer.or(defaults.only_integer),
            source: self.source.or(defaults.source),
            query_param: self.query_param.or(defaults.query_param),
            validates_with: self.validates_with.or(defaults.validates_with),
        }
    }

    pub fn invalid_class(mut self, class: impl Into<String>) -> Self {
        self.invalid_class = Some(class.into());
        self
    }

    pub fn validates_on<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.validates_on = Some(events.into_iter().map(Into::into).collect());
        self
    }

    pub fn scope(mut self, selector: impl Into<String>) -> Self {
        self.scope = Some(selector.into());
        self
    }

    pub fn when<F>(mut self, condition: F) -> Self
    where
        F: Fn(&dyn Field) -> bool + Send + Sync + 'static,
    {
        self.when = Some(Arc::new(condition));
        self
    }

    pub fn blank_value(mut self, value: impl Into<String>) -> Self {
        self.blank_value = Some(value.into());
        self
    }

    pub fn allow_blank(mut self, allow: bool) -> Self {
        self.allow_blank = Some(allow);
        self
    }

    pub fn validation_regex(mut self, pattern: impl Into<String>) -> Self {
        self.validation_regex = Some(pattern.into());
        self
    }

    pub fn invert_rule(mut self, invert: bool) -> Self {
        self.invert_rule = Some(invert);
        self
    }

    pub fn minimum(mut self, minimum: usize) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn maximum(mut self, maximum: usize) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn only_integer(mut self, only_integer: bool) -> Self {
        self.only_integer = Some(only_integer);
        self
    }

    pub fn source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn query_param(mut self, param: impl Into<String>) -> Self {
        self.query_param = Some(param.into());
        self
    }

    pub fn validates_with<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&dyn Field) -> bool + Send + Sync + 'static,
    {
        self.validates_with = Some(Arc::new(predicate));
        self
    }
}

impl fmt::Debug for RuleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleOptions")
            .field("invalid_class", &self.invalid_class)
            .field("validates_on", &self.validates_on)
            .field("scope", &self.scope)
            .field("when", &DebugPredicate(&self.when))
            .field("blank_value", &self.blank_value)
            .field("allow_blank", &self.allow_blank)
            .field("validation_regex", &self.validation_regex)
            .field("invert_rule", &self.invert_rule)
            .field("minimum", &self.minimum)
            .field("maximum", &self.maximum)
            .field("only_integer", &self.only_integer)
            .field("source", &self.source)
            .field("query_param", &self.query_param)
            .field("validates_with", &DebugPredicate(&self.validates_with))
            .finish()
    }
}

/// Built-in format presets.
pub mod formats {
    use super::RuleOptions;

    /// Loose e-mail address shape.
    pub fn email() -> RuleOptions {
        RuleOptions::new().validation_regex(r"(?i)([^@\s]+)@((?:[-a-z0-9]+\.)+[a-z]{2,})")
    }

    /// Sub-domain label: letters, digits and dashes only.
    pub fn sub_domain() -> RuleOptions {
        RuleOptions::new()
            .validation_regex(r"(?i)[^a-z0-9-]")
            .invert_rule(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_keeps_caller_options() {
        let merged = RuleOptions::new()
            .invalid_class("too-short")
            .minimum(3)
            .overlay(RuleOptions::defaults(RuleKind::Length));

        assert_eq!(merged.invalid_class.as_deref(), Some("too-short"));
        assert_eq!(merged.minimum, Some(3));
        assert_eq!(merged.maximum, None);
        assert_eq!(
            merged.validates_on,
            Some(vec!["change".to_string(), "blur".to_string()])
        );
        assert_eq!(merged.scope.as_deref(), Some("fieldset"));
    }

    #[test]
    fn custom_defaults_trigger_on_change_only() {
        let defaults = RuleOptions::defaults(RuleKind::Custom);
        assert_eq!(defaults.invalid_class.as_deref(), Some("invalid"));
        assert_eq!(defaults.validates_on, Some(vec!["change".to_string()]));
        assert!(defaults.validates_with.is_none());
    }

    #[test]
    fn defaults_are_fresh_per_call() {
        let mut first = RuleOptions::defaults(RuleKind::Presence);
        first.invalid_class = Some("changed".to_string());
        let second = RuleOptions::defaults(RuleKind::Presence);
        assert_eq!(second.invalid_class.as_deref(), Some("invalid-presence"));
    }

    #[test]
    fn options_deserialize_from_json() {
        let options: RuleOptions = serde_json::from_value(serde_json::json!({
            "invalid_class": "taken",
            "source": ["admin", "root"],
            "validates_on": ["keyup"]
        }))
        .unwrap();

        assert_eq!(options.invalid_class.as_deref(), Some("taken"));
        assert_eq!(options.source, Some(Source::fixed(["admin", "root"])));
        assert_eq!(options.validates_on, Some(vec!["keyup".to_string()]));
        assert!(options.when.is_none());

        let remote: RuleOptions =
            serde_json::from_value(serde_json::json!({ "source": "https://example.com/users" }))
                .unwrap();
        assert_eq!(
            remote.source,
            Some(Source::remote("https://example.com/users"))
        );
    }

    #[test]
    fn qualifiers() {
        assert_eq!(RuleKind::Format.qualifier(), Some("format"));
        assert_eq!(RuleKind::Custom.qualifier(), None);
    }
}
