//! # fieldcheck
//!
//! Declarative, event-driven validation for input fields.
//!
//! Rules are attached to fields once and re-evaluated whenever one of their
//! configured events fires. Each evaluation emits a generic signal (`valid` /
//! `invalid`) followed by a qualified one (`valid-presence`,
//! `invalid-length`, ...) on the field, and toggles a marker on the field's
//! enclosing scope.
//!
//! ## Example
//!
//! ```rust,ignore
//! use fieldcheck::prelude::*;
//!
//! let scope = MemoryScope::new("fieldset");
//! let email = Arc::new(MemoryField::new("").within(scope.clone()));
//!
//! Selection::of(email.clone())
//!     .validates_presence(RuleOptions::new())
//!     .validates_format(formats::email());
//!
//! email.change("not an email");
//! assert!(scope.has_marker("invalid-format"));
//! ```
//!
//! ## Rules
//!
//! - `presence` - value differs from the blank value (checkboxes must be checked)
//! - `format` - value matches (or with `invert_rule`, does not match) a pattern
//! - `length` - character count within `minimum..=maximum`
//! - `numericality` - value is numeric, optionally an integer
//! - `uniqueness` - value is absent from a fixed set or from a remote lookup
//! - custom - arbitrary predicate via `validates_with`
//!
//! ## Remote uniqueness
//!
//! Remote lookups run on the ambient tokio runtime. Only the most recent
//! lookup of a binding can publish: starting a new one cancels the previous
//! one, and a result is dropped if the field's value has changed since the
//! query was issued.

mod attach;
mod binding;
mod config;
mod coordinator;
mod error;
mod field;
pub mod memory;
pub mod options;
mod rules;
mod settings;
mod signal;


pub use attach::Selection;
pub use binding::Binding;
pub use config::{Rule, RuleConfig};
pub use coordinator::{LookupHandle, UniquenessCoordinator};
pub use error::{LookupError, RuleError, SettingsError};
pub use field::{predicate, EventHandler, Field, FieldEvent, FieldPredicate, Scope, SubscriptionId};
pub use options::{formats, RuleKind, RuleOptions, Source};
pub use rules::*;
pub use settings::Settings;
pub use signal::{announce, mark, publish, Outcome};

/// Prelude module for attaching rules
pub mod prelude {
    pub use crate::attach::Selection;
    pub use crate::field::{Field, Scope};
    pub use crate::memory::{MemoryField, MemoryScope};
    pub use crate::options::{formats, RuleKind, RuleOptions, Source};
    pub use crate::rules::{HttpLookup, LookupTransport};
    pub use crate::settings::Settings;
    pub use crate::signal::Outcome;
    pub use std::sync::Arc;
}
