use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

/// Counters shared by a stack and the view hosting it. Lives on the model
/// context only, hence `Rc<RefCell<_>>`.
pub type SharedMetrics = Rc<RefCell<StackMetrics>>;

#[derive(Debug, Default, Clone)]
pub struct StackMetrics {
    mutations: u64,
    signals: u64,
    rebuilds: u64,
    host_events: u64,
    decode_failures: u64,
    dropped_ids: u64,
}

impl StackMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedMetrics {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn record_mutation(&mut self) {
        self.mutations = self.mutations.saturating_add(1);
    }

    pub fn record_signal(&mut self) {
        self.signals = self.signals.saturating_add(1);
    }

    pub fn record_rebuild(&mut self) {
        self.rebuilds = self.rebuilds.saturating_add(1);
    }

    pub fn record_host_event(&mut self) {
        self.host_events = self.host_events.saturating_add(1);
    }

    pub fn record_decode_failure(&mut self) {
        self.decode_failures = self.decode_failures.saturating_add(1);
    }

    pub fn record_dropped_ids(&mut self, count: usize) {
        if count > 0 {
            self.dropped_ids = self.dropped_ids.saturating_add(count as u64);
        }
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            mutations: self.mutations,
            signals: self.signals,
            rebuilds: self.rebuilds,
            host_events: self.host_events,
            decode_failures: self.decode_failures,
            dropped_ids: self.dropped_ids,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub mutations: u64,
    pub signals: u64,
    pub rebuilds: u64,
    pub host_events: u64,
    pub decode_failures: u64,
    pub dropped_ids: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("mutations".to_string(), json!(self.mutations));
        map.insert("signals".to_string(), json!(self.signals));
        map.insert("rebuilds".to_string(), json!(self.rebuilds));
        map.insert("host_events".to_string(), json!(self.host_events));
        map.insert("decode_failures".to_string(), json!(self.decode_failures));
        map.insert("dropped_ids".to_string(), json!(self.dropped_ids));
        map
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "stack_metrics", self.as_fields())
    }
}

pub(crate) fn with_metrics(metrics: Option<&SharedMetrics>, f: impl FnOnce(&mut StackMetrics)) {
    if let Some(metrics) = metrics {
        if let Ok(mut guard) = metrics.try_borrow_mut() {
            f(&mut guard);
        }
    }
}
