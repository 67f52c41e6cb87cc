//! Predicate evaluators, one per rule kind.
//!
//! Synchronous evaluators live in `sync_rules`; remote uniqueness lookups are
//! issued through the transport in `lookup` and coordinated by
//! [`crate::coordinator::UniquenessCoordinator`].

mod lookup;
mod sync_rules;

pub use lookup::{decode_matches, HttpLookup, LookupTransport};
pub use sync_rules::*;

use crate::error::RuleError;
use crate::field::Field;
use crate::signal::Outcome;
use std::fmt::Debug;

/// A synchronous rule evaluated against the field's current state.
///
/// Returning `Err` means the rule could not be evaluated as configured; the
/// re-evaluation loop logs the diagnostic and treats the field as invalid.
pub trait FieldRule: Debug + Send + Sync {
    fn evaluate(&self, field: &dyn Field) -> Result<Outcome, RuleError>;

    /// Rule name for diagnostics.
    fn rule_name(&self) -> &'static str;
}
