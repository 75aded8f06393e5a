//! The navigation stack shared between application code and the hosting view.
//!
//! [`Stack`] is a cheap handle; clones observe and mutate the same collection.
//! It is not synchronised: every mutation must happen on the model context.
//! Each successful mutation signals subscribers exactly once, after the
//! internal state has been released, so a subscriber may read or mutate the
//! stack from inside its callback.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use serde_json::json;

use crate::error::{Result, StackError};
use crate::identity::{IdentityAllocator, ScreenId};
use crate::logging::{LogLevel, Logger, STACK_TARGET, emit, json_kv};
use crate::metrics::{SharedMetrics, with_metrics};
use crate::relay::{Relay, SubscriptionToken};
use crate::screen::ScreenRef;

#[derive(Default)]
struct StackState {
    order: Vec<ScreenId>,
    items: HashMap<ScreenId, ScreenRef>,
    ids: IdentityAllocator,
}

#[derive(Default)]
struct StackInner {
    state: RefCell<StackState>,
    relay: Relay,
    logger: RefCell<Option<Logger>>,
    metrics: RefCell<Option<SharedMetrics>>,
}

/// What an accepted host reorder did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderSummary {
    /// Ids the host sent that were unknown or repeated.
    pub dropped: usize,
    /// Screens that left the stack and were released.
    pub pruned: usize,
}

#[derive(Clone, Default)]
pub struct Stack {
    inner: Rc<StackInner>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logger(self, logger: Logger) -> Self {
        *self.inner.logger.borrow_mut() = Some(logger);
        self
    }

    pub fn set_logger(&self, logger: Option<Logger>) {
        *self.inner.logger.borrow_mut() = logger;
    }

    pub fn attach_metrics(&self, metrics: Option<SharedMetrics>) {
        *self.inner.metrics.borrow_mut() = metrics;
    }

    /// Replace the whole stack. Every screen gets a fresh id.
    pub fn set_views<I>(&self, screens: I) -> Vec<ScreenId>
    where
        I: IntoIterator<Item = ScreenRef>,
    {
        let ids = {
            let mut state = self.inner.state.borrow_mut();
            let StackState {
                order,
                items,
                ids: alloc,
            } = &mut *state;
            order.clear();
            items.clear();
            for screen in screens {
                let id = alloc.allocate();
                order.push(id);
                items.insert(id, screen);
            }
            order.clone()
        };
        if ids.is_empty() {
            self.log(LogLevel::Warn, "views_cleared", std::iter::empty());
        } else {
            self.log(
                LogLevel::Debug,
                "views_replaced",
                [json_kv("count", json!(ids.len()))],
            );
        }
        self.changed();
        ids
    }

    pub fn push(&self, screen: ScreenRef) -> ScreenId {
        let (id, depth) = {
            let mut state = self.inner.state.borrow_mut();
            let id = state.ids.allocate();
            state.order.push(id);
            state.items.insert(id, screen);
            (id, state.order.len())
        };
        self.log(
            LogLevel::Debug,
            "screen_pushed",
            [json_kv("id", json!(id.get())), json_kv("depth", json!(depth))],
        );
        self.changed();
        id
    }

    /// Remove the top screen. The root screen is never removed; popping a
    /// stack of one (or zero) is a silent no-op that returns `None`.
    pub fn pop(&self) -> Option<ScreenRef> {
        let popped = {
            let mut state = self.inner.state.borrow_mut();
            if state.order.len() <= 1 {
                None
            } else {
                state
                    .order
                    .pop()
                    .and_then(|id| state.items.remove(&id).map(|screen| (id, screen)))
            }
        };
        match popped {
            Some((id, screen)) => {
                self.log(
                    LogLevel::Debug,
                    "screen_popped",
                    [json_kv("id", json!(id.get()))],
                );
                self.changed();
                Some(screen)
            }
            None => {
                self.log(LogLevel::Trace, "pop_ignored", std::iter::empty());
                None
            }
        }
    }

    /// Screens in stack order. The returned vector is detached from the stack.
    pub fn views(&self) -> Vec<ScreenRef> {
        self.entries().into_iter().map(|(_, screen)| screen).collect()
    }

    pub fn ids(&self) -> Vec<ScreenId> {
        self.inner.state.borrow().order.clone()
    }

    pub fn entries(&self) -> Vec<(ScreenId, ScreenRef)> {
        let state = self.inner.state.borrow();
        state
            .order
            .iter()
            .filter_map(|id| state.items.get(id).map(|screen| (*id, screen.clone())))
            .collect()
    }

    pub fn screen(&self, id: ScreenId) -> Option<ScreenRef> {
        self.inner.state.borrow().items.get(&id).cloned()
    }

    pub fn top(&self) -> Option<ScreenRef> {
        let state = self.inner.state.borrow();
        state.order.last().and_then(|id| state.items.get(id).cloned())
    }

    pub fn len(&self) -> usize {
        self.inner.state.borrow().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.borrow().order.is_empty()
    }

    /// Number of screens retained by the collection, on stack or not.
    pub fn retained(&self) -> usize {
        self.inner.state.borrow().items.len()
    }

    pub fn notify<F>(&self, callback: F) -> SubscriptionToken
    where
        F: Fn() + 'static,
    {
        self.inner.relay.notify(callback)
    }

    pub fn unnotify(&self, token: SubscriptionToken) -> bool {
        self.inner.relay.unnotify(token)
    }

    pub fn subscribers(&self) -> usize {
        self.inner.relay.len()
    }

    pub fn ptr_eq(&self, other: &Stack) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Adopt the order reported by the host renderer.
    ///
    /// Unknown and repeated ids are dropped; screens that are no longer on the
    /// stack are released. An order with no known ids is rejected and leaves the
    /// collection untouched.
    pub(crate) fn apply_external_order(&self, incoming: &[ScreenId]) -> Result<ReorderSummary> {
        let summary = {
            let mut state = self.inner.state.borrow_mut();
            let mut seen = HashSet::with_capacity(incoming.len());
            let order: Vec<ScreenId> = incoming
                .iter()
                .copied()
                .filter(|id| state.items.contains_key(id) && seen.insert(*id))
                .collect();
            if order.is_empty() {
                None
            } else {
                let before = state.items.len();
                state.items.retain(|id, _| seen.contains(id));
                let pruned = before - state.items.len();
                state.order = order;
                Some(ReorderSummary {
                    dropped: incoming.len() - seen.len(),
                    pruned,
                })
            }
        };

        let Some(summary) = summary else {
            self.log(
                LogLevel::Warn,
                "reorder_rejected",
                [json_kv("received", json!(incoming.len()))],
            );
            with_metrics(self.metrics().as_ref(), |m| {
                m.record_dropped_ids(incoming.len())
            });
            return Err(StackError::EmptyOrder);
        };

        if summary.dropped > 0 {
            self.log(
                LogLevel::Warn,
                "unknown_ids_dropped",
                [json_kv("dropped", json!(summary.dropped))],
            );
            with_metrics(self.metrics().as_ref(), |m| {
                m.record_dropped_ids(summary.dropped)
            });
        }
        self.log(
            LogLevel::Debug,
            "order_applied",
            [
                json_kv("depth", json!(self.len())),
                json_kv("pruned", json!(summary.pruned)),
            ],
        );
        self.changed();
        Ok(summary)
    }

    fn changed(&self) {
        with_metrics(self.metrics().as_ref(), |m| {
            m.record_mutation();
            m.record_signal();
        });
        self.inner.relay.signal();
    }

    fn metrics(&self) -> Option<SharedMetrics> {
        self.inner.metrics.borrow().clone()
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        let logger = self.inner.logger.borrow().clone();
        emit(logger.as_ref(), level, STACK_TARGET, message, fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use crate::metrics::StackMetrics;
    use crate::screen::testing::{label, names};
    use std::cell::Cell;

    fn signal_counter(stack: &Stack) -> (Rc<Cell<u32>>, SubscriptionToken) {
        let hits = Rc::new(Cell::new(0));
        let inner = hits.clone();
        let token = stack.notify(move || inner.set(inner.get() + 1));
        (hits, token)
    }

    fn ids(raw: &[i64]) -> Vec<ScreenId> {
        raw.iter().copied().map(ScreenId::new).collect()
    }

    #[test]
    fn push_pop_scenario_keeps_root() {
        let stack = Stack::new();
        stack.set_views([label("A")]);
        stack.push(label("B"));
        assert_eq!(names(&stack.views()), ["A", "B"]);
        stack.push(label("C"));
        assert_eq!(names(&stack.views()), ["A", "B", "C"]);
        assert!(stack.pop().is_some());
        assert_eq!(names(&stack.views()), ["A", "B"]);
        assert!(stack.pop().is_some());
        assert!(stack.pop().is_none());
        assert_eq!(names(&stack.views()), ["A"]);
    }

    #[test]
    fn never_drops_below_one_screen() {
        let stack = Stack::new();
        stack.set_views([label("root")]);
        for step in 0..40u32 {
            if step % 3 == 0 {
                stack.push(label("x"));
            } else {
                stack.pop();
            }
            assert!(stack.views().len() >= 1);
        }
    }

    #[test]
    fn ids_strictly_increase_and_are_never_reused() {
        let stack = Stack::new();
        let first = stack.set_views([label("A"), label("B")]);
        let pushed = stack.push(label("C"));
        stack.pop();
        let again = stack.push(label("D"));
        let replaced = stack.set_views([label("E")]);

        let mut all = first.clone();
        all.extend([pushed, again]);
        all.extend(replaced.iter().copied());
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn set_views_discards_previous_identities() {
        let stack = Stack::new();
        let old = stack.set_views([label("x"), label("y")]);
        let new = stack.set_views([label("a"), label("b"), label("c")]);
        assert_eq!(names(&stack.views()), ["a", "b", "c"]);
        assert_eq!(stack.ids(), new);
        assert!(old.iter().all(|id| stack.screen(*id).is_none()));
        assert_eq!(stack.retained(), 3);
    }

    #[test]
    fn set_views_with_nothing_empties_the_stack() {
        let stack = Stack::new();
        stack.set_views([label("x")]);
        let (hits, _) = signal_counter(&stack);
        stack.set_views(Vec::new());
        assert!(stack.is_empty());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn views_snapshot_is_detached() {
        let stack = Stack::new();
        stack.set_views([label("A")]);
        let mut snapshot = stack.views();
        snapshot.push(label("intruder"));
        snapshot.clear();
        assert_eq!(names(&stack.views()), ["A"]);
    }

    #[test]
    fn each_mutation_signals_once_and_noop_pop_never() {
        let stack = Stack::new();
        let (hits, _) = signal_counter(&stack);
        stack.set_views([label("A")]);
        assert_eq!(hits.get(), 1);
        stack.push(label("B"));
        assert_eq!(hits.get(), 2);
        stack.pop();
        assert_eq!(hits.get(), 3);
        stack.pop();
        assert_eq!(hits.get(), 3);
        stack.apply_external_order(&stack.ids()).unwrap();
        assert_eq!(hits.get(), 4);
    }

    #[test]
    fn unnotify_stops_callbacks() {
        let stack = Stack::new();
        let (hits, token) = signal_counter(&stack);
        stack.set_views([label("A")]);
        assert!(stack.unnotify(token));
        stack.push(label("B"));
        stack.pop();
        assert_eq!(hits.get(), 1);
        assert_eq!(stack.subscribers(), 0);
    }

    #[test]
    fn external_order_applies_subsequence() {
        let stack = Stack::new();
        stack.set_views([label("A"), label("B"), label("C")]);
        let (hits, _) = signal_counter(&stack);
        let summary = stack.apply_external_order(&ids(&[3, 1])).unwrap();
        assert_eq!(names(&stack.views()), ["C", "A"]);
        assert_eq!(hits.get(), 1);
        assert_eq!(summary, ReorderSummary { dropped: 0, pruned: 1 });
        assert!(stack.screen(ScreenId::new(2)).is_none());
    }

    #[test]
    fn external_order_drops_unknown_and_repeated_ids() {
        let sink = MemorySink::new();
        let stack = Stack::new().with_logger(Logger::new(sink.clone()));
        stack.set_views([label("A"), label("B")]);
        let summary = stack.apply_external_order(&ids(&[1, 99, 2, 1])).unwrap();
        assert_eq!(names(&stack.views()), ["A", "B"]);
        assert_eq!(summary.dropped, 2);
        assert!(sink.contains("unknown_ids_dropped"));
    }

    #[test]
    fn external_order_without_known_ids_is_rejected() {
        let stack = Stack::new();
        stack.set_views([label("A"), label("B")]);
        let (hits, _) = signal_counter(&stack);
        let err = stack.apply_external_order(&ids(&[7, 8])).unwrap_err();
        assert!(matches!(err, StackError::EmptyOrder));
        let err = stack.apply_external_order(&[]).unwrap_err();
        assert!(matches!(err, StackError::EmptyOrder));
        assert_eq!(names(&stack.views()), ["A", "B"]);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn subscriber_may_mutate_during_dispatch() {
        let stack = Stack::new();
        stack.set_views([label("A")]);
        let observed = Rc::new(RefCell::new(Vec::new()));

        let handle = stack.clone();
        let seen = observed.clone();
        stack.notify(move || {
            seen.borrow_mut().push(handle.len());
            if handle.len() == 2 {
                handle.push(label("auto"));
            }
        });

        stack.push(label("B"));
        assert_eq!(names(&stack.views()), ["A", "B", "auto"]);
        assert_eq!(*observed.borrow(), vec![2, 3]);
    }

    #[test]
    fn clones_share_state() {
        let stack = Stack::new();
        let other = stack.clone();
        other.set_views([label("A")]);
        assert!(stack.ptr_eq(&other));
        assert_eq!(names(&stack.views()), ["A"]);
        assert!(!stack.ptr_eq(&Stack::new()));
    }

    #[test]
    fn metrics_count_mutations() {
        let metrics = StackMetrics::shared();
        let stack = Stack::new();
        stack.attach_metrics(Some(metrics.clone()));
        stack.set_views([label("A")]);
        stack.push(label("B"));
        stack.pop();
        stack.pop();
        let snap = metrics.borrow().snapshot();
        assert_eq!(snap.mutations, 3);
        assert_eq!(snap.signals, 3);
    }
}
