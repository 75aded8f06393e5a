use crate::chrome::DEFAULT_TITLE;
use crate::layout::{BAR_HEIGHT, CONTENT_INSET};
use crate::logging::Logger;
use crate::metrics::{SharedMetrics, StackMetrics};
use crate::protocol::{Color, TextStyle};
use crate::stack::Stack;

/// Configuration knobs for a [`super::StackView`].
#[derive(Clone)]
pub struct StackViewConfig {
    /// Sent to the host only when set.
    pub title_style: Option<TextStyle>,
    /// Sent to the host only when set.
    pub back_style: Option<TextStyle>,
    /// Sent to the host only when set.
    pub bar_color: Option<Color>,
    /// Title used for screens that declare no chrome bar.
    pub default_title: String,
    pub bar_height: f64,
    pub content_inset: f64,
    /// Optional structured logger shared with the stack.
    pub logger: Option<Logger>,
    /// Counters shared with the stack, if enabled.
    pub metrics: Option<SharedMetrics>,
}

impl Default for StackViewConfig {
    fn default() -> Self {
        Self {
            title_style: None,
            back_style: None,
            bar_color: None,
            default_title: DEFAULT_TITLE.to_string(),
            bar_height: BAR_HEIGHT,
            content_inset: CONTENT_INSET,
            logger: None,
            metrics: None,
        }
    }
}

impl StackViewConfig {
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(StackMetrics::shared());
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    pub fn metrics_handle(&self) -> Option<SharedMetrics> {
        self.metrics.clone()
    }
}

/// Props a parent passes down on every update.
#[derive(Clone, Default)]
pub struct StackViewProps {
    /// `None` gives the view a fresh, empty stack.
    pub stack: Option<Stack>,
    pub title_style: Option<TextStyle>,
    pub back_style: Option<TextStyle>,
    pub bar_color: Option<Color>,
}
