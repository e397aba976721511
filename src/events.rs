//! Synchronous lifecycle event broadcasting.
//!
//! The engine fires a fixed, closed set of events; zero or more subscribers
//! receive them in subscription order. A subscriber is either an explicit
//! callback or any [`Observer`], whose conventional `update` method is used
//! when no callback is given. One failing subscriber never prevents the
//! remaining ones from running.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::engine::OptimizationEngine;
use crate::errors::Result;

/// Lifecycle events of an optimization run.
///
/// The set is closed; event kinds cannot be registered at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptEvent {
    /// A maximize loop begins
    Start,
    /// A successful registration completed
    Step,
    /// A probe failed and its evaluation was discarded
    Skip,
    /// A maximize loop completed its budget
    End,
}

impl OptEvent {
    /// All event kinds, in firing-priority order
    pub const ALL: [OptEvent; 4] = [OptEvent::Start, OptEvent::Step, OptEvent::Skip, OptEvent::End];
}

/// An object notified of engine lifecycle events through its `update` method.
pub trait Observer: Send + Sync {
    /// Called on every event the observer subscribed to.
    fn update(&self, event: OptEvent, engine: &OptimizationEngine) -> Result<()>;
}

/// A tagged subscriber: an explicit callback, or an [`Observer`] whose
/// `update` method stands in when no callback is given.
pub enum Subscriber {
    /// Invoked as `callback(event, engine)`
    Callback(Box<dyn Fn(OptEvent, &OptimizationEngine) -> Result<()> + Send + Sync>),
    /// Notified through [`Observer::update`]
    Observer(Arc<dyn Observer>),
}

impl Subscriber {
    /// Wraps a plain closure
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(OptEvent, &OptimizationEngine) -> Result<()> + Send + Sync + 'static,
    {
        Subscriber::Callback(Box::new(f))
    }

    /// Subscribes an observer object through its `update` method
    pub fn observer(observer: Arc<dyn Observer>) -> Self {
        Subscriber::Observer(observer)
    }

    fn notify(&self, event: OptEvent, engine: &OptimizationEngine) -> Result<()> {
        match self {
            Subscriber::Callback(callback) => callback(event, engine),
            Subscriber::Observer(observer) => observer.update(event, engine),
        }
    }
}

/// Registry of subscribers, broadcasting synchronously per event kind.
#[derive(Default)]
pub struct EventBus {
    subs: Mutex<HashMap<OptEvent, Vec<(String, Arc<Subscriber>)>>>,
}

impl EventBus {
    /// Creates an empty bus
    pub fn new() -> Self {
        EventBus::default()
    }

    /// Registers `subscriber` under `token` for `event`.
    ///
    /// Multiple distinct tokens (or the same token repeatedly) may subscribe
    /// to one event; all registrations fire in subscription order.
    pub fn subscribe(&self, event: OptEvent, token: impl Into<String>, subscriber: Subscriber) {
        let mut subs = self.subs.lock().unwrap();
        subs.entry(event)
            .or_default()
            .push((token.into(), Arc::new(subscriber)));
    }

    /// Removes one registration of `token` for `event`; unknown tokens are
    /// a no-op, not an error.
    pub fn unsubscribe(&self, event: OptEvent, token: &str) {
        let mut subs = self.subs.lock().unwrap();
        if let Some(registered) = subs.get_mut(&event) {
            if let Some(pos) = registered.iter().position(|(t, _)| t == token) {
                registered.remove(pos);
            }
        }
    }

    /// Invokes all subscribers of `event` synchronously, in subscription
    /// order. A failing subscriber does not prevent the remaining ones from
    /// running; the first failure is surfaced only after all of them ran.
    pub fn fire(&self, event: OptEvent, engine: &OptimizationEngine) -> Result<()> {
        let snapshot: Vec<Arc<Subscriber>> = {
            let subs = self.subs.lock().unwrap();
            subs.get(&event)
                .map(|registered| registered.iter().map(|(_, s)| s.clone()).collect())
                .unwrap_or_default()
        };
        let mut first_failure = None;
        for subscriber in snapshot {
            if let Err(failure) = subscriber.notify(event, engine) {
                log::warn!("{event:?} subscriber failed: {failure}");
                first_failure.get_or_insert(failure);
            }
        }
        match first_failure {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_enumerants_listed() {
        assert_eq!(OptEvent::ALL.len(), 4);
        assert!(OptEvent::ALL.contains(&OptEvent::Skip));
    }
}
