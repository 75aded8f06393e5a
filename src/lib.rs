//! Navigation stack for screens presented by an out-of-process host renderer.
//!
//! Application code owns a [`Stack`] and pushes, pops, or replaces screens on
//! it. A [`StackView`] mirrors the stack to the host on every rebuild and
//! applies the reorders the host reports back (swipe-back, hardware back).
//! Screens are matched across both directions by the [`ScreenId`] the stack
//! assigned them, never by position.

pub mod chrome;
pub mod error;
pub mod host;
pub mod identity;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod protocol;
pub mod relay;
pub mod screen;
pub mod stack;
pub mod view;

pub use chrome::{
    Accessory, AccessoryRole, BarModel, ChromeBar, DEFAULT_TITLE, ResolvedBar, resolve_bar,
};
pub use error::{Result, StackError};
pub use host::{FrameTracker, HostEvent, HostInbox, HostSender, NativeFuncs, channel};
pub use identity::{IdentityAllocator, ScreenId};
pub use layout::{BAR_HEIGHT, CONTENT_INSET, Extent, Placed, Rect, Size, SlotGuide};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{MetricSnapshot, SharedMetrics, StackMetrics};
pub use protocol::{
    BAR_VIEW_NAME, Color, CompositeDescriptor, ON_CHANGE, PerScreenBar, STACK_VIEW_NAME,
    StackChild, StackEvent, TextStyle,
};
pub use relay::{Relay, SubscriptionToken};
pub use screen::{
    BuildContext, BuildMode, Screen, ScreenModel, ScreenOption, ScreenRef, StatusBarStyle,
    build_live, introspect,
};
pub use stack::{ReorderSummary, Stack};
pub use view::{
    ChildKind, ChildSlot, Stage, StackModel, StackView, StackViewConfig, StackViewProps,
};
