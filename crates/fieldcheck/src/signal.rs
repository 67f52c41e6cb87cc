//! Outcome signals and the state marker protocol.
//!
//! Every evaluation ends here: the outcome is announced on the field as one
//! generic and one kind-qualified signal, and the rule's marker is set or
//! cleared on the nearest enclosing scope. Bindings sharing a scope write the
//! marker independently; the last write wins.

use crate::config::RuleConfig;
use crate::field::Field;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of evaluating a rule once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Valid,
    Invalid,
    /// Exempt from evaluation: clear the marker, emit nothing.
    Skip,
    /// A remote lookup could not decide; the marker is left untouched.
    Undetermined,
}

impl Outcome {
    /// Generic signal name, if this outcome emits signals.
    pub fn signal(&self) -> Option<&'static str> {
        match self {
            Outcome::Valid => Some("valid"),
            Outcome::Invalid => Some("invalid"),
            Outcome::Undetermined => Some("undetermined"),
            Outcome::Skip => None,
        }
    }

    /// Signals emitted for a rule of the given kind, in emission order.
    pub fn signals(&self, config: &RuleConfig) -> Vec<String> {
        let Some(generic) = self.signal() else {
            return Vec::new();
        };
        let mut names = vec![generic.to_string()];
        if let Some(qualifier) = config.kind.qualifier() {
            names.push(format!("{generic}-{qualifier}"));
        }
        names
    }

    pub fn from_valid(valid: bool) -> Self {
        if valid {
            Outcome::Valid
        } else {
            Outcome::Invalid
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signal().unwrap_or("skip"))
    }
}

/// Announce `outcome` on `field` and update the marker on its scope.
pub fn publish(field: &dyn Field, config: &RuleConfig, outcome: Outcome) {
    announce(field, config, outcome);
    mark(field, config, outcome);
}

/// Emit the signals of `outcome` without touching the marker.
pub fn announce(field: &dyn Field, config: &RuleConfig, outcome: Outcome) {
    for name in outcome.signals(config) {
        field.trigger(&name);
    }
}

/// Set or clear the marker for `outcome` without emitting signals.
pub fn mark(field: &dyn Field, config: &RuleConfig, outcome: Outcome) {
    match outcome {
        Outcome::Invalid => set_marker(field, config, true),
        Outcome::Valid | Outcome::Skip => set_marker(field, config, false),
        Outcome::Undetermined => {}
    }
}

fn set_marker(field: &dyn Field, config: &RuleConfig, invalid: bool) {
    let Some(scope) = field.closest(&config.scope) else {
        tracing::trace!(scope = %config.scope, "No enclosing scope, marker not written");
        return;
    };

    let marker = config.invalid_class.as_str();
    if scope.has_marker(marker) == invalid {
        return;
    }

    tracing::trace!(marker, invalid, kind = %config.kind, "Writing state marker");
    if invalid {
        scope.add_marker(marker);
    } else {
        scope.remove_marker(marker);
    }
}
