//! The consumed host-form surface, rendered as an explicit object.
//!
//! A [`FormContext`] stands in for the reactive form the engine binds to. It
//! carries the shared pieces both sides touch: a named extensible property
//! bag, the per-field message store the UI renders from, and the
//! validation-state-changed notification that triggers a re-render.
//!
//! The form is intended to live on one UI task queue; interior locks here
//! only make cross-task sharing sound, they do not serialize overlapping
//! validation runs (last completion wins).

use crate::error::OutcomeError;
use crate::store::MessageStore;
use crate::types::{FieldIdentifier, ValidationOutcome};
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;

/// Property-bag key under which an attached controller publishes its
/// in-flight/last validation outcome (a `watch::Receiver<Option<ValidationOutcome>>`).
pub const VALIDATION_OUTCOME_PROPERTY: &str = "validation_outcome";

/// Callback invoked when validation display state changes.
pub type StateChangedListener = Box<dyn Fn() + Send + Sync>;

/// Handle returned by [`FormContext::subscribe_state_changed`]; pass it back
/// to unsubscribe on teardown so no dangling callback outlives its owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionHandle(u64);

/// Shared context of one live form.
#[derive(Default)]
pub struct FormContext {
    properties: Mutex<HashMap<String, Box<dyn Any + Send>>>,
    messages: Mutex<MessageStore>,
    listeners: Mutex<Vec<(SubscriptionHandle, StateChangedListener)>>,
    next_handle: AtomicU64,
}

impl FormContext {
    pub fn new() -> Self {
        FormContext::default()
    }

    // ─── Property bag ───────────────────────────────────────────────────────

    /// Set a named property, replacing any previous value.
    pub fn set_property(&self, key: impl Into<String>, value: Box<dyn Any + Send>) {
        self.properties.lock().unwrap().insert(key.into(), value);
    }

    pub fn remove_property(&self, key: &str) {
        self.properties.lock().unwrap().remove(key);
    }

    /// Read a named property under the bag's lock. Returns `None` when the
    /// key is absent or holds a different type.
    pub fn with_property<T: 'static, R>(&self, key: &str, f: impl FnOnce(&T) -> R) -> Option<R> {
        let properties = self.properties.lock().unwrap();
        properties
            .get(key)
            .and_then(|value| value.downcast_ref::<T>())
            .map(f)
    }

    // ─── Message store ──────────────────────────────────────────────────────

    /// Read the message store under its lock.
    pub fn with_messages<R>(&self, f: impl FnOnce(&MessageStore) -> R) -> R {
        f(&self.messages.lock().unwrap())
    }

    pub(crate) fn with_messages_mut<R>(&self, f: impl FnOnce(&mut MessageStore) -> R) -> R {
        f(&mut self.messages.lock().unwrap())
    }

    /// Snapshot of every display message, in field insertion order.
    pub fn validation_messages(&self) -> Vec<String> {
        self.with_messages(|store| store.all_messages().map(str::to_string).collect())
    }

    /// Snapshot of one field's display messages.
    pub fn field_messages(&self, field: &FieldIdentifier) -> Vec<String> {
        self.with_messages(|store| store.messages(field).to_vec())
    }

    // ─── State-changed notification ─────────────────────────────────────────

    /// Register a listener for validation display-state changes. Listeners
    /// are invoked under the subscription lock and must not re-enter the
    /// subscription API.
    pub fn subscribe_state_changed(&self, listener: StateChangedListener) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().unwrap().push((handle, listener));
        handle
    }

    pub fn unsubscribe_state_changed(&self, handle: SubscriptionHandle) {
        self.listeners.lock().unwrap().retain(|(h, _)| *h != handle);
    }

    /// Notify the form that validation display state changed.
    pub fn notify_validation_state_changed(&self) {
        for (_, listener) in self.listeners.lock().unwrap().iter() {
            listener();
        }
    }

    // ─── Published validation outcome ───────────────────────────────────────

    /// Await the outcome of the current (or most recent) whole-model
    /// validation run.
    ///
    /// The attached controller publishes its run before awaiting rule
    /// evaluation, so a second caller reacting to the same triggering event
    /// observes the same run rather than racing it.
    ///
    /// # Errors
    ///
    /// [`OutcomeError`] when no controller is attached, or the controller was
    /// torn down before completing a run.
    pub async fn validation_outcome(&self) -> Result<ValidationOutcome, OutcomeError> {
        let mut receiver = self
            .with_property::<watch::Receiver<Option<ValidationOutcome>>, _>(
                VALIDATION_OUTCOME_PROPERTY,
                Clone::clone,
            )
            .ok_or(OutcomeError)?;
        let value = receiver
            .wait_for(Option::is_some)
            .await
            .map_err(|_| OutcomeError)?;
        match value.as_ref() {
            Some(outcome) => Ok(outcome.clone()),
            None => Err(OutcomeError),
        }
    }

    /// Non-blocking snapshot of the last completed whole-model outcome.
    /// `None` while a run is in flight, after [`ValidationController::clear_messages`]
    /// (or before the first run), or when no controller is attached.
    ///
    /// [`ValidationController::clear_messages`]: crate::controller::ValidationController::clear_messages
    pub fn last_outcome(&self) -> Option<ValidationOutcome> {
        self.with_property::<watch::Receiver<Option<ValidationOutcome>>, _>(
            VALIDATION_OUTCOME_PROPERTY,
            |receiver| receiver.borrow().clone(),
        )
        .flatten()
    }
}
