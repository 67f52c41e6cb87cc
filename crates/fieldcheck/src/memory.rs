//! In-memory host: fields and scopes that live entirely in process.
//!
//! Useful for headless validation (e.g. validating submitted values on a
//! server with the same rule set as the client) and for tests.
//!
//! ## Example
//!
//! ```rust,ignore
//! use fieldcheck::memory::{MemoryField, MemoryScope};
//!
//! let scope = MemoryScope::new("fieldset");
//! let field = Arc::new(MemoryField::new("").within(scope.clone()));
//! Selection::of(field.clone()).validates_presence(RuleOptions::new());
//!
//! field.trigger("blur");
//! assert!(scope.has_marker("invalid-presence"));
//! ```

use crate::field::{EventHandler, Field, FieldEvent, Scope, SubscriptionId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A scope holding a set of marker tokens.
#[derive(Debug)]
pub struct MemoryScope {
    selector: String,
    markers: Mutex<HashSet<String>>,
}

impl MemoryScope {
    /// Create a scope matched by `selector` (e.g. `"fieldset"`).
    pub fn new(selector: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            selector: selector.into(),
            markers: Mutex::new(HashSet::new()),
        })
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Snapshot of the markers currently set, sorted.
    pub fn markers(&self) -> Vec<String> {
        let mut markers: Vec<String> = lock(&self.markers).iter().cloned().collect();
        markers.sort();
        markers
    }
}

impl Scope for MemoryScope {
    fn add_marker(&self, marker: &str) {
        lock(&self.markers).insert(marker.to_string());
    }

    fn remove_marker(&self, marker: &str) {
        lock(&self.markers).remove(marker);
    }

    fn has_marker(&self, marker: &str) -> bool {
        lock(&self.markers).contains(marker)
    }
}

struct Subscription {
    id: SubscriptionId,
    events: Vec<String>,
    handler: EventHandler,
}

#[derive(Default)]
struct FieldState {
    value: String,
    checked: bool,
}

/// A field whose value and checked state are set programmatically.
///
/// Every triggered event name is recorded and can be inspected with
/// [`MemoryField::triggered`].
pub struct MemoryField {
    checkbox: bool,
    state: Mutex<FieldState>,
    ancestors: Vec<Arc<MemoryScope>>,
    subscriptions: Mutex<Vec<Subscription>>,
    next_id: AtomicU64,
    triggered: Mutex<Vec<String>>,
}

impl MemoryField {
    /// Create a text-like field holding `value`.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            checkbox: false,
            state: Mutex::new(FieldState {
                value: value.into(),
                checked: false,
            }),
            ancestors: Vec::new(),
            subscriptions: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            triggered: Mutex::new(Vec::new()),
        }
    }

    /// Create a checkbox-like field.
    pub fn checkbox(checked: bool) -> Self {
        let field = Self::new("on");
        lock(&field.state).checked = checked;
        Self {
            checkbox: true,
            ..field
        }
    }

    /// Add an enclosing scope. Scopes added first are nearest.
    pub fn within(mut self, scope: Arc<MemoryScope>) -> Self {
        self.ancestors.push(scope);
        self
    }

    pub fn set_value(&self, value: impl Into<String>) {
        lock(&self.state).value = value.into();
    }

    pub fn set_checked(&self, checked: bool) {
        lock(&self.state).checked = checked;
    }

    /// Set the value and fire `change`, like a user edit.
    pub fn change(&self, value: impl Into<String>) {
        self.set_value(value);
        self.trigger("change");
    }

    /// All event names triggered so far, in order.
    pub fn triggered(&self) -> Vec<String> {
        lock(&self.triggered).clone()
    }

    /// Triggered names excluding interaction events (`change`, `blur`, `keyup`, `focus`).
    pub fn signals(&self) -> Vec<String> {
        lock(&self.triggered)
            .iter()
            .filter(|name| !matches!(name.as_str(), "change" | "blur" | "keyup" | "focus"))
            .cloned()
            .collect()
    }

    pub fn clear_triggered(&self) {
        lock(&self.triggered).clear();
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        lock(&self.subscriptions).len()
    }
}

impl Field for MemoryField {
    fn value(&self) -> String {
        lock(&self.state).value.clone()
    }

    fn is_checkbox(&self) -> bool {
        self.checkbox
    }

    fn is_checked(&self) -> bool {
        lock(&self.state).checked
    }

    fn on(&self, events: &[String], handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        lock(&self.subscriptions).push(Subscription {
            id,
            events: events.to_vec(),
            handler,
        });
        id
    }

    fn off(&self, id: SubscriptionId) {
        lock(&self.subscriptions).retain(|s| s.id != id);
    }

    fn trigger(&self, event: &str) {
        lock(&self.triggered).push(event.to_string());

        // Handlers run without the lock held so they may trigger further events.
        let handlers: Vec<EventHandler> = lock(&self.subscriptions)
            .iter()
            .filter(|s| s.events.iter().any(|e| e == event))
            .map(|s| s.handler.clone())
            .collect();

        let field_event = FieldEvent::new(event);
        for handler in handlers {
            handler(&field_event);
        }
    }

    fn closest(&self, selector: &str) -> Option<Arc<dyn Scope>> {
        self.ancestors
            .iter()
            .find(|scope| scope.selector == selector)
            .map(|scope| scope.clone() as Arc<dyn Scope>)
    }
}

impl std::fmt::Debug for MemoryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("MemoryField")
            .field("value", &state.value)
            .field("checkbox", &self.checkbox)
            .field("checked", &state.checked)
            .field(
                "ancestors",
                &self.ancestors.iter().map(|s| s.selector()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
