//! Host abstraction: the field a rule is bound to and the scope that carries
//! its state marker.

use std::fmt;
use std::sync::Arc;

/// Callback invoked when a subscribed event fires on a field.
pub type EventHandler = Arc<dyn Fn(&FieldEvent) + Send + Sync>;

/// Predicate over a field, used for `when` gating and custom rules.
pub type FieldPredicate = Arc<dyn Fn(&dyn Field) -> bool + Send + Sync>;

/// Identifies one subscription made with [`Field::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// An event delivered to a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEvent {
    /// Event name (`change`, `blur`, `invalid-format`, ...)
    pub name: String,
}

impl FieldEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// An input-like element provided by the host environment.
///
/// Outcome signals are plain events: the engine emits them with
/// [`Field::trigger`] and listeners receive them through [`Field::on`].
pub trait Field: Send + Sync {
    /// Current value of the field.
    fn value(&self) -> String;

    /// Whether the field is a checkbox-like control.
    fn is_checkbox(&self) -> bool {
        false
    }

    /// Whether a checkbox-like control is checked.
    fn is_checked(&self) -> bool {
        false
    }

    /// Subscribe `handler` to every event named in `events`.
    fn on(&self, events: &[String], handler: EventHandler) -> SubscriptionId;

    /// Remove a subscription. Unknown ids are ignored.
    fn off(&self, id: SubscriptionId);

    /// Fire the named event on this field.
    fn trigger(&self, event: &str);

    /// Nearest enclosing scope matching `selector`, if any.
    fn closest(&self, selector: &str) -> Option<Arc<dyn Scope>>;
}

/// A grouping ancestor (fieldset-like) that carries state markers.
pub trait Scope: Send + Sync {
    fn add_marker(&self, marker: &str);

    fn remove_marker(&self, marker: &str);

    fn has_marker(&self, marker: &str) -> bool;
}

/// Wraps a closure as a [`FieldPredicate`].
pub fn predicate<F>(f: F) -> FieldPredicate
where
    F: Fn(&dyn Field) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

pub(crate) struct DebugPredicate<'a>(pub &'a Option<FieldPredicate>);

impl fmt::Debug for DebugPredicate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Some(<predicate>)"),
            None => f.write_str("None"),
        }
    }
}
