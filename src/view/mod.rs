//! The hosting view that mirrors a [`Stack`] into the host renderer.
//!
//! Outbound, [`StackView::build`] walks the stack and produces a
//! [`StackModel`]: the encoded [`CompositeDescriptor`], one bar and one content
//! child per screen, and the native functions the host may call back.
//! Inbound, the `OnChange` function decodes a [`StackEvent`] and applies it to
//! the stack. A broken event is logged and dropped; it never reaches
//! subscribers.

mod config;

pub use config::{StackViewConfig, StackViewProps};

use std::cell::Cell;
use std::rc::Rc;

use serde_json::json;

use crate::chrome::{BarModel, resolve_bar};
use crate::error::Result;
use crate::host::NativeFuncs;
use crate::identity::ScreenId;
use crate::layout::{Placed, SlotGuide};
use crate::logging::{LogLevel, Logger, METRICS_TARGET, VIEW_TARGET, emit, json_kv};
use crate::metrics::{SharedMetrics, with_metrics};
use crate::protocol::{
    self, CompositeDescriptor, ON_CHANGE, STACK_VIEW_NAME, StackChild, StackEvent,
};
use crate::relay::SubscriptionToken;
use crate::screen::ScreenRef;
use crate::stack::{ReorderSummary, Stack};

/// Mount stages a view moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Dead,
    Mounted,
    Visible,
}

fn enters(from: Stage, to: Stage, stage: Stage) -> bool {
    from < stage && to >= stage
}

fn exits(from: Stage, to: Stage, stage: Stage) -> bool {
    from >= stage && to < stage
}

pub enum ChildKind {
    Bar(BarModel),
    Content(ScreenRef),
}

pub struct ChildSlot {
    pub id: ScreenId,
    pub kind: ChildKind,
    pub guide: SlotGuide,
}

impl ChildSlot {
    pub fn is_bar(&self) -> bool {
        matches!(self.kind, ChildKind::Bar(_))
    }
}

/// Output of one rebuild pass.
pub struct StackModel {
    pub native_view_name: &'static str,
    pub descriptor: CompositeDescriptor,
    pub state: Vec<u8>,
    pub children: Vec<ChildSlot>,
    pub native_funcs: NativeFuncs,
}

impl StackModel {
    pub fn bars(&self) -> impl Iterator<Item = &BarModel> {
        self.children.iter().filter_map(|child| match &child.kind {
            ChildKind::Bar(bar) => Some(bar),
            ChildKind::Content(_) => None,
        })
    }

    pub fn contents(&self) -> impl Iterator<Item = Placed<&ScreenRef>> {
        self.children.iter().filter_map(|child| match &child.kind {
            ChildKind::Content(screen) => Some(Placed::new(screen, child.guide)),
            ChildKind::Bar(_) => None,
        })
    }
}

pub struct StackView {
    stack: Stack,
    config: StackViewConfig,
    stage: Stage,
    subscription: Option<SubscriptionToken>,
    dirty: Rc<Cell<bool>>,
    invalidate: Option<Rc<dyn Fn()>>,
}

impl Default for StackView {
    fn default() -> Self {
        Self::with_stack(Stack::new())
    }
}

impl StackView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stack(stack: Stack) -> Self {
        Self {
            stack,
            config: StackViewConfig::default(),
            stage: Stage::Dead,
            subscription: None,
            dirty: Rc::new(Cell::new(true)),
            invalidate: None,
        }
    }

    pub fn with_config(mut self, config: StackViewConfig) -> Self {
        self.config = config;
        self.attach_diagnostics();
        self
    }

    /// Called whenever the stack changes while this view is mounted.
    pub fn with_invalidator<F>(mut self, invalidate: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.invalidate = Some(Rc::new(invalidate));
        self
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn config(&self) -> &StackViewConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// True once the stack changed since the last [`StackView::build`].
    pub fn needs_rebuild(&self) -> bool {
        self.dirty.get()
    }

    pub fn lifecycle(&mut self, from: Stage, to: Stage) {
        if enters(from, to, Stage::Mounted) {
            self.subscribe();
        } else if exits(from, to, Stage::Mounted) {
            self.unsubscribe();
        }
        self.stage = to;
        self.log(
            LogLevel::Trace,
            "lifecycle",
            [
                json_kv("from", json!(format!("{from:?}"))),
                json_kv("to", json!(format!("{to:?}"))),
            ],
        );
    }

    /// Swap in new props from the parent. The old stack keeps its screens but
    /// loses this view's subscription.
    pub fn update(&mut self, props: StackViewProps) {
        self.unsubscribe();

        let StackViewProps {
            stack,
            title_style,
            back_style,
            bar_color,
        } = props;
        self.stack = stack.unwrap_or_default();
        self.config.title_style = title_style;
        self.config.back_style = back_style;
        self.config.bar_color = bar_color;
        self.attach_diagnostics();
        self.dirty.set(true);

        if self.stage >= Stage::Mounted {
            self.subscribe();
        }
    }

    pub fn build(&self) -> Result<StackModel> {
        let entries = self.stack.entries();
        if entries.is_empty() {
            self.log(LogLevel::Warn, "empty_stack_rebuild", std::iter::empty());
        }

        let mut children = Vec::with_capacity(entries.len() * 2);
        let mut descriptor_children = Vec::with_capacity(entries.len());
        let mut discarded = 0;

        for (id, screen) in entries {
            let resolved = resolve_bar(screen.as_ref(), &self.config.default_title);
            discarded += resolved.discarded_effects;

            children.push(ChildSlot {
                id,
                kind: ChildKind::Bar(BarModel::build(id, &resolved.bar)?),
                guide: SlotGuide::bar(self.config.bar_height),
            });
            children.push(ChildSlot {
                id,
                kind: ChildKind::Content(screen),
                guide: SlotGuide::content(self.config.content_inset),
            });
            descriptor_children.push(StackChild {
                screen_id: id.get(),
            });
        }

        if discarded > 0 {
            self.log(
                LogLevel::Debug,
                "introspection_effects_discarded",
                [json_kv("effects", json!(discarded))],
            );
        }

        let descriptor = CompositeDescriptor {
            children: descriptor_children,
            title_text_style: self.config.title_style.clone(),
            back_text_style: self.config.back_style.clone(),
            bar_color: self.config.bar_color,
        };
        let state = protocol::encode(&descriptor)?;

        let mut native_funcs = NativeFuncs::new();
        let handler = OnChangeHandler {
            stack: self.stack.clone(),
            logger: self.config.logger.clone(),
            metrics: self.config.metrics_handle(),
        };
        native_funcs.insert(ON_CHANGE, move |payload: &[u8]| {
            let _ = handler.handle(payload);
        });

        self.dirty.set(false);
        with_metrics(self.config.metrics.as_ref(), |m| m.record_rebuild());
        self.log(
            LogLevel::Debug,
            "rebuild_completed",
            [
                json_kv("screens", json!(descriptor.children.len())),
                json_kv("bytes", json!(state.len())),
            ],
        );

        Ok(StackModel {
            native_view_name: STACK_VIEW_NAME,
            descriptor,
            state,
            children,
            native_funcs,
        })
    }

    /// Apply an `OnChange` payload directly, without going through a model.
    pub fn handle_on_change(&self, payload: &[u8]) -> Result<ReorderSummary> {
        OnChangeHandler {
            stack: self.stack.clone(),
            logger: self.config.logger.clone(),
            metrics: self.config.metrics_handle(),
        }
        .handle(payload)
    }

    /// Emit the current counters through the configured logger.
    pub fn log_metrics(&self) {
        if let (Some(logger), Some(metrics)) =
            (self.config.logger.as_ref(), self.config.metrics.as_ref())
        {
            if let Ok(guard) = metrics.try_borrow() {
                let _ = logger.log_event(guard.snapshot().to_log_event(METRICS_TARGET));
            }
        }
    }

    fn subscribe(&mut self) {
        if self.subscription.is_some() {
            return;
        }
        let dirty = self.dirty.clone();
        let invalidate = self.invalidate.clone();
        self.subscription = Some(self.stack.notify(move || {
            dirty.set(true);
            if let Some(invalidate) = invalidate.as_ref() {
                invalidate();
            }
        }));
    }

    fn unsubscribe(&mut self) {
        if let Some(token) = self.subscription.take() {
            self.stack.unnotify(token);
        }
    }

    fn attach_diagnostics(&self) {
        if let Some(logger) = self.config.logger.clone() {
            self.stack.set_logger(Some(logger));
        }
        if let Some(metrics) = self.config.metrics_handle() {
            self.stack.attach_metrics(Some(metrics));
        }
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        emit(self.config.logger.as_ref(), level, VIEW_TARGET, message, fields);
    }
}

impl Drop for StackView {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

struct OnChangeHandler {
    stack: Stack,
    logger: Option<Logger>,
    metrics: Option<SharedMetrics>,
}

impl OnChangeHandler {
    fn handle(&self, payload: &[u8]) -> Result<ReorderSummary> {
        with_metrics(self.metrics.as_ref(), |m| m.record_host_event());
        let event: StackEvent = protocol::decode(payload).inspect_err(|err| {
            with_metrics(self.metrics.as_ref(), |m| m.record_decode_failure());
            emit(
                self.logger.as_ref(),
                LogLevel::Warn,
                VIEW_TARGET,
                "decode_failed",
                [
                    json_kv("error", json!(err.to_string())),
                    json_kv("bytes", json!(payload.len())),
                ],
            );
        })?;
        let ids: Vec<ScreenId> = event.id.into_iter().map(ScreenId::new).collect();
        self.stack.apply_external_order(&ids)
    }
}

#[cfg(test)]
mod tests;
