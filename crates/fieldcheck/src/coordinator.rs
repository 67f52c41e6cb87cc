//! Coordination of remote uniqueness lookups for one binding.
//!
//! At most one lookup is in flight per binding. Starting a lookup aborts the
//! previous one if it is still pending, and every completed lookup is checked
//! against the field's value at completion time: a result for a value the
//! field no longer holds is discarded. Aborting is best effort; the value
//! check alone keeps stale results from being applied.

use crate::config::{Rule, RuleConfig};
use crate::error::LookupError;
use crate::field::Field;
use crate::rules::LookupTransport;
use crate::signal::{publish, Outcome};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct InFlight {
    id: u64,
    value: String,
    task: JoinHandle<()>,
    /// Flips to `true` once the result was applied or discarded. The sender
    /// is dropped unsent when the task is aborted.
    done: watch::Receiver<bool>,
}

impl InFlight {
    fn is_pending(&self) -> bool {
        !self.task.is_finished() && !*self.done.borrow()
    }
}

/// Handle to an issued lookup.
#[derive(Debug, Clone)]
pub struct LookupHandle {
    id: u64,
    value: String,
    abort: AbortHandle,
}

impl LookupHandle {
    /// Sequence number of the lookup within its coordinator.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The value that was queried.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Request cancellation. Has no effect once the lookup completed.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

/// Serializes remote lookups of one binding.
pub struct UniquenessCoordinator {
    transport: Arc<dyn LookupTransport>,
    timeout: Option<Duration>,
    runtime: Option<Handle>,
    next_id: AtomicU64,
    in_flight: Mutex<Option<InFlight>>,
}

impl UniquenessCoordinator {
    /// Create a coordinator running lookups on the current tokio runtime.
    ///
    /// Without one, each lookup uses the runtime current when it starts.
    pub fn new(transport: Arc<dyn LookupTransport>) -> Self {
        Self {
            transport,
            timeout: None,
            runtime: Handle::try_current().ok(),
            next_id: AtomicU64::new(1),
            in_flight: Mutex::new(None),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Issue a lookup for `value`, superseding any pending one.
    ///
    /// The outcome is published on `field` once the lookup completes and only
    /// if the field still holds `value`. Returns `None` when no lookup could
    /// be issued; in that case an `undetermined` outcome has already been
    /// published (missing runtime) or the rule is not a remote rule.
    pub fn start(
        &self,
        field: Weak<dyn Field>,
        config: Arc<RuleConfig>,
        value: String,
    ) -> Option<LookupHandle> {
        let (endpoint, param) = match &config.rule {
            Rule::Remote { endpoint, param } => (endpoint.clone(), param.clone()),
            other => {
                tracing::error!(rule = ?other, "Uniqueness coordinator used with a non-remote rule");
                return None;
            }
        };

        let mut slot = lock(&self.in_flight);
        if let Some(previous) = slot.take() {
            if !previous.task.is_finished() {
                tracing::debug!(
                    superseded = %previous.value,
                    lookup_id = previous.id,
                    "Cancelling superseded lookup"
                );
                previous.task.abort();
            }
        }

        let runtime = self.runtime.clone().or_else(|| Handle::try_current().ok());
        let Some(runtime) = runtime else {
            drop(slot);
            complete(&field, &config, &value, Err(LookupError::NoRuntime));
            return None;
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let transport = self.transport.clone();
        let timeout = self.timeout;
        let queried = value.clone();
        let (done_tx, done) = watch::channel(false);

        tracing::debug!(lookup_id = id, %endpoint, value = %queried, "Issuing uniqueness lookup");

        let task = runtime.spawn(async move {
            let lookup = transport.lookup(&endpoint, &param, &queried);
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, lookup)
                    .await
                    .unwrap_or(Err(LookupError::Timeout(limit))),
                None => lookup.await,
            };
            complete(&field, &config, &queried, result);
            let _ = done_tx.send(true);
        });

        let handle = LookupHandle {
            id,
            value: value.clone(),
            abort: task.abort_handle(),
        };
        *slot = Some(InFlight {
            id,
            value,
            task,
            done,
        });
        Some(handle)
    }

    /// Value of the lookup still pending, if any.
    pub fn pending(&self) -> Option<String> {
        lock(&self.in_flight)
            .as_ref()
            .filter(|f| f.is_pending())
            .map(|f| f.value.clone())
    }

    /// Abort the pending lookup, if any.
    pub fn cancel(&self) {
        if let Some(in_flight) = lock(&self.in_flight).take() {
            in_flight.task.abort();
        }
    }

    /// Wait until no lookup is pending.
    ///
    /// A lookup started while waiting is awaited as well. The lookup stays in
    /// its slot, so it can still be superseded or cancelled meanwhile, and
    /// dropping this future leaves it running.
    pub async fn settle(&self) {
        let mut awaited = None;
        loop {
            let done = lock(&self.in_flight)
                .as_ref()
                .filter(|f| f.is_pending() && awaited != Some(f.id))
                .map(|f| (f.id, f.done.clone()));
            let Some((id, mut done)) = done else {
                break;
            };
            // Err means the task was aborted before finishing.
            let _ = done.wait_for(|finished| *finished).await;
            awaited = Some(id);
        }
    }
}

fn complete(
    field: &Weak<dyn Field>,
    config: &RuleConfig,
    queried: &str,
    result: Result<Vec<Value>, LookupError>,
) {
    let Some(field) = field.upgrade() else {
        tracing::debug!(value = %queried, "Field dropped before lookup completed");
        return;
    };

    let current = field.value();
    if current != queried {
        tracing::debug!(
            queried = %queried,
            current = %current,
            "Discarding stale lookup result"
        );
        return;
    }

    let outcome = match result {
        Ok(matches) => Outcome::from_valid(matches.is_empty()),
        Err(error) => {
            tracing::warn!(value = %queried, %error, "Uniqueness lookup failed");
            Outcome::Undetermined
        }
    };

    tracing::debug!(value = %queried, %outcome, "Applying lookup result");
    publish(field.as_ref(), config, outcome);
}

impl Drop for UniquenessCoordinator {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for UniquenessCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniquenessCoordinator")
            .field("timeout", &self.timeout)
            .field("has_runtime", &self.runtime.is_some())
            .field("pending", &self.pending())
            .finish()
    }
}
