//! Event-triggered re-evaluation of one rule on one field.
//!
//! On every configured event the binding runs its `when` gate, evaluates the
//! rule and publishes the outcome. A closed gate leaves everything as it was.
//! Remote uniqueness rules hand the evaluation to their coordinator and
//! publish once the lookup completes.

use crate::config::{Rule, RuleConfig};
use crate::coordinator::UniquenessCoordinator;
use crate::error::RuleError;
use crate::field::{Field, FieldEvent, SubscriptionId};
use crate::rules::{FieldRule, LookupTransport};
use crate::signal::{announce, mark, publish, Outcome};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Rule {
    /// The synchronous evaluator, for rules that have one.
    pub fn as_field_rule(&self) -> Option<&dyn FieldRule> {
        match self {
            Rule::Presence(rule) => Some(rule),
            Rule::Format(rule) => Some(rule),
            Rule::Length(rule) => Some(rule),
            Rule::Numericality(rule) => Some(rule),
            Rule::Custom(rule) => Some(rule),
            Rule::FixedSet(_) | Rule::Remote { .. } => None,
        }
    }
}

struct BindingInner {
    field: Weak<dyn Field>,
    config: Arc<RuleConfig>,
    coordinator: Option<UniquenessCoordinator>,
    last_value: Mutex<Option<String>>,
}

impl BindingInner {
    fn handle(&self, event: &FieldEvent) {
        let Some(field) = self.field.upgrade() else {
            return;
        };

        let _span = tracing::trace_span!(
            "reevaluate",
            kind = %self.config.kind,
            event = %event.name
        )
        .entered();

        if !self.config.should_run(field.as_ref()) {
            tracing::trace!("Gate closed, skipping evaluation");
            return;
        }

        let value = field.value();
        *lock(&self.last_value) = Some(value.clone());

        match &self.config.rule {
            Rule::FixedSet(rule) => {
                for outcome in rule.outcomes(&value) {
                    announce(field.as_ref(), &self.config, outcome);
                }
                if let Some(verdict) = rule.verdict(&value) {
                    mark(field.as_ref(), &self.config, verdict);
                }
            }
            Rule::Remote { .. } => {
                if value.is_empty() {
                    return;
                }
                match &self.coordinator {
                    Some(coordinator) => {
                        coordinator.start(Arc::downgrade(&field), self.config.clone(), value);
                    }
                    None => publish(field.as_ref(), &self.config, Outcome::Undetermined),
                }
            }
            rule => {
                if let Some(rule) = rule.as_field_rule() {
                    let outcome = resolve(rule.rule_name(), rule.evaluate(field.as_ref()));
                    publish(field.as_ref(), &self.config, outcome);
                }
            }
        }
    }
}

/// Turn an evaluation result into an outcome. Diagnostics make the field
/// invalid.
fn resolve(rule_name: &'static str, result: Result<Outcome, RuleError>) -> Outcome {
    result.unwrap_or_else(|error| {
        tracing::error!(rule = rule_name, %error, "Rule could not be evaluated, reporting invalid");
        Outcome::Invalid
    })
}

/// One rule attached to one field.
///
/// Dropping a binding keeps the rule attached; call [`Binding::detach`] to
/// remove it.
pub struct Binding {
    inner: Arc<BindingInner>,
    subscription: SubscriptionId,
}

impl Binding {
    /// Subscribe `config`'s rule to its events on `field`.
    ///
    /// Nothing is evaluated until the first event fires. `transport` is only
    /// used by remote uniqueness rules.
    pub fn attach(
        field: &Arc<dyn Field>,
        config: RuleConfig,
        transport: Option<Arc<dyn LookupTransport>>,
        lookup_timeout: Option<Duration>,
    ) -> Self {
        let coordinator = match (&config.rule, transport) {
            (Rule::Remote { .. }, Some(transport)) => {
                Some(UniquenessCoordinator::new(transport).with_timeout(lookup_timeout))
            }
            (Rule::Remote { endpoint, .. }, None) => {
                tracing::error!(
                    %endpoint,
                    "Remote uniqueness rule attached without a transport; it will report undetermined"
                );
                None
            }
            _ => None,
        };

        let inner = Arc::new(BindingInner {
            field: Arc::downgrade(field),
            config: config.shared(),
            coordinator,
            last_value: Mutex::new(None),
        });

        let handler_inner = inner.clone();
        let subscription = field.on(
            &inner.config.events,
            Arc::new(move |event: &FieldEvent| handler_inner.handle(event)),
        );

        tracing::debug!(
            kind = %inner.config.kind,
            events = ?inner.config.events,
            "Rule attached"
        );

        Self {
            inner,
            subscription,
        }
    }

    pub fn config(&self) -> &RuleConfig {
        &self.inner.config
    }

    /// Value observed at the last evaluation that passed the gate.
    pub fn last_value(&self) -> Option<String> {
        lock(&self.inner.last_value).clone()
    }

    /// Value of the remote lookup still in flight, if any.
    pub fn pending_lookup(&self) -> Option<String> {
        self.inner
            .coordinator
            .as_ref()
            .and_then(UniquenessCoordinator::pending)
    }

    /// Wait for any in-flight remote lookup to complete.
    pub async fn settle(&self) {
        if let Some(coordinator) = &self.inner.coordinator {
            coordinator.settle().await;
        }
    }

    /// Unsubscribe from the field and cancel any in-flight lookup.
    pub fn detach(self) {
        if let Some(field) = self.inner.field.upgrade() {
            field.off(self.subscription);
        }
        if let Some(coordinator) = &self.inner.coordinator {
            coordinator.cancel();
        }
        tracing::debug!(kind = %self.inner.config.kind, "Rule detached");
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("config", &self.inner.config)
            .field("subscription", &self.subscription)
            .field("last_value", &self.last_value())
            .field("coordinator", &self.inner.coordinator)
            .finish()
    }
}
