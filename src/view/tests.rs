use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::*;
use crate::chrome::ChromeBar;
use crate::error::StackError;
use crate::host::{FrameTracker, channel};
use crate::layout::{Extent, Size};
use crate::logging::MemorySink;
use crate::protocol::{Color, PerScreenBar, TextStyle, encode};
use crate::screen::testing::{Label, label, labelled, names};
use crate::screen::{BuildContext, Screen, ScreenModel};

fn counted(stack: &Stack) -> Rc<Cell<u32>> {
    let hits = Rc::new(Cell::new(0));
    let inner = hits.clone();
    stack.notify(move || inner.set(inner.get() + 1));
    hits
}

fn abc_view(sink: &MemorySink) -> StackView {
    let mut config = StackViewConfig::default().with_logger(Logger::new(sink.clone()));
    config.enable_metrics();
    let view = StackView::new().with_config(config);
    view.stack().set_views([label("A"), label("B"), label("C")]);
    view
}

fn on_change(ids: &[i64]) -> Vec<u8> {
    encode(&StackEvent { id: ids.to_vec() }).unwrap()
}

#[test]
fn host_reorder_applies_and_signals_once() {
    let sink = MemorySink::new();
    let view = abc_view(&sink);
    assert_eq!(view.stack().ids(), [1, 2, 3].map(ScreenId::new));
    let hits = counted(view.stack());

    let model = view.build().unwrap();
    model.native_funcs.call(ON_CHANGE, &on_change(&[3, 1])).unwrap();

    assert_eq!(names(&view.stack().views()), ["C", "A"]);
    assert_eq!(hits.get(), 1);
}

#[test]
fn malformed_payload_changes_nothing() {
    let sink = MemorySink::new();
    let view = abc_view(&sink);
    let hits = counted(view.stack());

    let err = view.handle_on_change(&[0x05, 0x01]).unwrap_err();
    assert!(matches!(err, StackError::Decode(_)));

    let model = view.build().unwrap();
    model.native_funcs.call(ON_CHANGE, &[0xff]).unwrap();

    assert_eq!(names(&view.stack().views()), ["A", "B", "C"]);
    assert_eq!(hits.get(), 0);
    assert!(sink.contains("decode_failed"));
    let metrics = view.config().metrics_handle().unwrap();
    let snap = metrics.borrow().snapshot();
    assert_eq!(snap.decode_failures, 2);
    assert_eq!(snap.host_events, 2);
}

#[test]
fn unknown_host_ids_never_reach_the_stack() {
    let sink = MemorySink::new();
    let view = abc_view(&sink);
    let summary = view.handle_on_change(&on_change(&[1, 42, 2])).unwrap();
    assert_eq!(summary.dropped, 1);
    assert_eq!(names(&view.stack().views()), ["A", "B"]);
    assert_eq!(view.stack().retained(), 2);

    let model = view.build().unwrap();
    assert_eq!(
        model.descriptor.children,
        vec![StackChild { screen_id: 1 }, StackChild { screen_id: 2 }]
    );
}

#[test]
fn descriptor_lists_children_in_stack_order() {
    let view = StackView::new();
    view.stack().set_views([label("root")]);
    view.stack().push(label("detail"));

    let model = view.build().unwrap();
    assert_eq!(model.native_view_name, STACK_VIEW_NAME);
    assert_eq!(
        model.descriptor.children,
        vec![StackChild { screen_id: 1 }, StackChild { screen_id: 2 }]
    );
    let decoded: CompositeDescriptor = protocol::decode(&model.state).unwrap();
    assert_eq!(decoded, model.descriptor);

    let kinds: Vec<_> = model.children.iter().map(|c| (c.id.get(), c.is_bar())).collect();
    assert_eq!(kinds, [(1, true), (1, false), (2, true), (2, false)]);
}

#[test]
fn styling_is_absent_unless_configured() {
    let view = StackView::new();
    view.stack().set_views([label("root")]);
    let model = view.build().unwrap();
    assert!(model.descriptor.title_text_style.is_none());
    assert!(model.descriptor.back_text_style.is_none());
    assert!(model.descriptor.bar_color.is_none());

    let config = StackViewConfig {
        title_style: Some(TextStyle::sized(17.0)),
        bar_color: Some(Color::rgb(0x20, 0x20, 0x20)),
        ..StackViewConfig::default()
    };
    let view = StackView::with_stack(view.stack().clone()).with_config(config);
    let model = view.build().unwrap();
    assert_eq!(model.descriptor.title_text_style, Some(TextStyle::sized(17.0)));
    assert!(model.descriptor.back_text_style.is_none());
    assert_eq!(model.descriptor.bar_color, Some(Color::rgb(0x20, 0x20, 0x20)));
}

#[test]
fn bars_use_declared_options_or_placeholder() {
    let view = StackView::new();
    view.stack().set_views([
        label("plain"),
        labelled(
            "inbox",
            vec![
                ChromeBar::titled("Inbox")
                    .with_back_title("Mail")
                    .with_right(label("compose"))
                    .into_option(),
            ],
        ),
    ]);

    let model = view.build().unwrap();
    let bars: Vec<&PerScreenBar> = model.bars().map(|bar| &bar.wire).collect();
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].title, "Title");
    assert!(!bars[0].custom_back_button_title);
    assert_eq!(bars[1].title, "Inbox");
    assert!(bars[1].custom_back_button_title);
    assert_eq!(bars[1].right_view_count, 1);
    assert_eq!(model.bars().map(|b| b.key.as_str()).collect::<Vec<_>>(), ["1", "2"]);
}

#[test]
fn placeholder_title_follows_config() {
    let config = StackViewConfig {
        default_title: "Untitled".into(),
        ..StackViewConfig::default()
    };
    let view = StackView::new().with_config(config);
    view.stack().set_views([label("plain")]);
    let model = view.build().unwrap();
    assert_eq!(model.bars().next().unwrap().wire.title, "Untitled");
}

#[test]
fn guides_reserve_bar_band_and_inset_content() {
    let view = StackView::new();
    view.stack().set_views([label("root")]);
    let model = view.build().unwrap();

    let bar = model.children.iter().find(|c| c.is_bar()).unwrap();
    assert_eq!(bar.guide.height, Extent::Fixed(44.0));
    let content = model.contents().next().unwrap();
    let rect = content.guide.resolve(Size::new(375.0, 667.0));
    assert_eq!(rect.height, 603.0);
    assert_eq!(rect.width, 375.0);
}

#[test]
fn rebuild_does_not_run_screen_effects() {
    let effects_run = Rc::new(Cell::new(0));
    let screen = Rc::new(Label {
        name: "effectful".into(),
        options: Vec::new(),
        effects_run: effects_run.clone(),
    });
    let sink = MemorySink::new();
    let config = StackViewConfig::default().with_logger(Logger::new(sink.clone()));
    let view = StackView::new().with_config(config);
    view.stack().set_views([screen as ScreenRef]);
    let hits = counted(view.stack());

    for _ in 0..3 {
        view.build().unwrap();
    }
    assert_eq!(effects_run.get(), 0);
    assert_eq!(hits.get(), 0);
    assert!(sink.contains("introspection_effects_discarded"));
}

/// Screen whose build mutates shared state directly instead of deferring.
struct Leaky {
    builds: Rc<RefCell<Vec<bool>>>,
}

impl Screen for Leaky {
    fn build(&self, ctx: &mut BuildContext) -> ScreenModel {
        self.builds.borrow_mut().push(ctx.is_introspecting());
        ScreenModel::new()
    }
}

#[test]
fn rebuild_only_introspects() {
    let builds = Rc::new(RefCell::new(Vec::new()));
    let view = StackView::new();
    view.stack().set_views([Rc::new(Leaky {
        builds: builds.clone(),
    }) as ScreenRef]);
    view.build().unwrap();
    view.build().unwrap();
    assert_eq!(*builds.borrow(), vec![true, true]);
}

#[test]
fn rebuild_leaves_stack_untouched() {
    let view = StackView::new();
    view.stack().set_views([label("A"), label("B")]);
    let before = view.stack().ids();
    view.build().unwrap();
    assert_eq!(view.stack().ids(), before);
    assert_eq!(view.stack().retained(), 2);
}

#[test]
fn empty_stack_rebuild_is_reported() {
    let sink = MemorySink::new();
    let config = StackViewConfig::default().with_logger(Logger::new(sink.clone()));
    let view = StackView::new().with_config(config);
    let model = view.build().unwrap();
    assert!(model.descriptor.children.is_empty());
    assert!(sink.contains("empty_stack_rebuild"));
}

#[test]
fn mounted_view_tracks_changes() {
    let invalidations = Rc::new(Cell::new(0));
    let counter = invalidations.clone();
    let mut view = StackView::new().with_invalidator(move || counter.set(counter.get() + 1));
    view.stack().set_views([label("A")]);
    assert!(!view.is_subscribed());

    view.lifecycle(Stage::Dead, Stage::Visible);
    assert!(view.is_subscribed());
    view.build().unwrap();
    assert!(!view.needs_rebuild());

    view.stack().push(label("B"));
    assert!(view.needs_rebuild());
    assert_eq!(invalidations.get(), 1);

    view.lifecycle(Stage::Visible, Stage::Mounted);
    assert!(view.is_subscribed());
}

#[test]
fn unmount_releases_subscription_but_keeps_stack() {
    let stack = Stack::new();
    stack.set_views([label("A"), label("B")]);
    let mut view = StackView::with_stack(stack.clone());
    view.lifecycle(Stage::Dead, Stage::Mounted);
    assert_eq!(stack.subscribers(), 1);

    view.lifecycle(Stage::Mounted, Stage::Dead);
    assert_eq!(stack.subscribers(), 0);
    drop(view);
    assert_eq!(names(&stack.views()), ["A", "B"]);

    let mut remounted = StackView::with_stack(stack.clone());
    remounted.lifecycle(Stage::Dead, Stage::Mounted);
    assert_eq!(stack.subscribers(), 1);
    drop(remounted);
    assert_eq!(stack.subscribers(), 0);
}

#[test]
fn update_moves_subscription_to_new_stack() {
    let first = Stack::new();
    first.set_views([label("A")]);
    let second = Stack::new();
    second.set_views([label("X"), label("Y")]);

    let mut view = StackView::with_stack(first.clone());
    view.lifecycle(Stage::Dead, Stage::Mounted);
    view.update(StackViewProps {
        stack: Some(second.clone()),
        bar_color: Some(Color::rgb(1, 2, 3)),
        ..StackViewProps::default()
    });

    assert_eq!(first.subscribers(), 0);
    assert_eq!(second.subscribers(), 1);
    assert!(view.stack().ptr_eq(&second));
    let model = view.build().unwrap();
    assert_eq!(model.descriptor.children.len(), 2);
    assert_eq!(model.descriptor.bar_color, Some(Color::rgb(1, 2, 3)));

    view.update(StackViewProps::default());
    assert!(view.stack().is_empty());
    assert_eq!(second.subscribers(), 0);
    assert_eq!(view.stack().subscribers(), 1);
}

#[test]
fn host_events_cross_threads_through_inbox() {
    let sink = MemorySink::new();
    let view = abc_view(&sink);
    let hits = counted(view.stack());
    let model = view.build().unwrap();

    let (sender, inbox) = channel();
    let payload = on_change(&[1, 2]);
    std::thread::spawn(move || sender.send(ON_CHANGE, payload).unwrap())
        .join()
        .unwrap();

    assert_eq!(inbox.drain(&model.native_funcs).unwrap(), 1);
    assert_eq!(names(&view.stack().views()), ["A", "B"]);
    assert_eq!(hits.get(), 1);
}

#[test]
fn identical_rebuilds_are_detected() {
    let view = StackView::new();
    view.stack().set_views([label("A")]);
    let mut tracker = FrameTracker::new();

    let key = STACK_VIEW_NAME;
    assert!(tracker.commit(key, &view.build().unwrap().state));
    assert!(!tracker.commit(key, &view.build().unwrap().state));
    view.stack().push(label("B"));
    assert!(tracker.commit(key, &view.build().unwrap().state));
}

#[test]
fn metrics_snapshot_is_logged() {
    let sink = MemorySink::new();
    let view = abc_view(&sink);
    view.build().unwrap();
    view.stack().push(label("D"));
    view.log_metrics();

    let event = sink
        .events()
        .into_iter()
        .find(|e| e.message == "stack_metrics")
        .unwrap();
    assert_eq!(event.target, "stacknav::metrics");
    assert_eq!(event.fields["rebuilds"], serde_json::json!(1));
    assert_eq!(event.fields["mutations"], serde_json::json!(2));
}
