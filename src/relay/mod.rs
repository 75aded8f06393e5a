//! Change notification fan-out.
//!
//! A [`Relay`] maps opaque [`SubscriptionToken`]s to callbacks. [`Relay::signal`]
//! snapshots the registered callbacks before invoking any of them, so callbacks
//! may register, unregister, or trigger further signals while a dispatch is in
//! flight; those changes only affect later signals.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

pub type Callback = Rc<dyn Fn()>;

/// Handle returned by [`Relay::notify`]. Holding it does not keep anything alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionToken(u64);

#[derive(Default)]
pub struct Relay {
    next: Cell<u64>,
    callbacks: RefCell<BTreeMap<SubscriptionToken, Callback>>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify<F>(&self, callback: F) -> SubscriptionToken
    where
        F: Fn() + 'static,
    {
        let token = SubscriptionToken(self.next.get());
        self.next.set(token.0 + 1);
        self.callbacks.borrow_mut().insert(token, Rc::new(callback));
        token
    }

    /// Returns whether the token was still registered.
    pub fn unnotify(&self, token: SubscriptionToken) -> bool {
        self.callbacks.borrow_mut().remove(&token).is_some()
    }

    pub fn signal(&self) {
        let snapshot: Vec<Callback> = self.callbacks.borrow().values().cloned().collect();
        for callback in snapshot {
            callback();
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.borrow().is_empty()
    }
}
