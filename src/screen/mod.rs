//! Screens and their build contract.
//!
//! A screen's [`Screen::build`] is called twice per rebuild pass in the worst
//! case: once in [`BuildMode::Introspect`] to read its declared options, and
//! once for real by whatever renders its content. Side effects must go through
//! [`BuildContext::defer`]; deferred effects run after a live build and are
//! dropped after an introspection build.

use std::fmt;
use std::rc::Rc;

use crate::chrome::ChromeBar;

pub const CHROME_BAR_KEY: &str = "stacknav/chrome-bar";
pub const STATUS_BAR_KEY: &str = "stacknav/status-bar";

pub type ScreenRef = Rc<dyn Screen>;

pub trait Screen {
    fn name(&self) -> &str {
        "screen"
    }

    fn build(&self, ctx: &mut BuildContext) -> ScreenModel;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Live,
    Introspect,
}

type Effect = Box<dyn FnOnce()>;

pub struct BuildContext {
    mode: BuildMode,
    effects: Vec<Effect>,
}

impl BuildContext {
    fn new(mode: BuildMode) -> Self {
        Self {
            mode,
            effects: Vec::new(),
        }
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn is_introspecting(&self) -> bool {
        self.mode == BuildMode::Introspect
    }

    /// Queue an externally visible effect. It only runs for live builds.
    pub fn defer<F>(&mut self, effect: F)
    where
        F: FnOnce() + 'static,
    {
        self.effects.push(Box::new(effect));
    }
}

/// Status bar appearance a screen may request while it is on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBarStyle {
    Dark,
    Light,
}

/// Closed set of configuration a screen can declare.
#[derive(Clone)]
pub enum ScreenOption {
    ChromeBar(ChromeBar),
    StatusBar(StatusBarStyle),
    /// Options owned by other subsystems, carried through untouched.
    Opaque { key: String, payload: Vec<u8> },
}

impl ScreenOption {
    pub fn key(&self) -> &str {
        match self {
            ScreenOption::ChromeBar(_) => CHROME_BAR_KEY,
            ScreenOption::StatusBar(_) => STATUS_BAR_KEY,
            ScreenOption::Opaque { key, .. } => key,
        }
    }

    pub fn as_chrome_bar(&self) -> Option<&ChromeBar> {
        match self {
            ScreenOption::ChromeBar(bar) => Some(bar),
            _ => None,
        }
    }
}

impl fmt::Debug for ScreenOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenOption::ChromeBar(bar) => f.debug_tuple("ChromeBar").field(bar).finish(),
            ScreenOption::StatusBar(style) => f.debug_tuple("StatusBar").field(style).finish(),
            ScreenOption::Opaque { key, payload } => f
                .debug_struct("Opaque")
                .field("key", key)
                .field("bytes", &payload.len())
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScreenModel {
    pub options: Vec<ScreenOption>,
}

impl ScreenModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_option(mut self, option: ScreenOption) -> Self {
        self.options.push(option);
        self
    }

    /// First option carrying `key`, in declaration order.
    pub fn option(&self, key: &str) -> Option<&ScreenOption> {
        self.options.iter().find(|option| option.key() == key)
    }
}

/// Result of a sandboxed trial build.
pub struct Introspection {
    pub model: ScreenModel,
    pub discarded_effects: usize,
}

pub fn introspect(screen: &dyn Screen) -> Introspection {
    let mut ctx = BuildContext::new(BuildMode::Introspect);
    let model = screen.build(&mut ctx);
    Introspection {
        model,
        discarded_effects: ctx.effects.len(),
    }
}

/// Build for real and run whatever effects the screen deferred.
pub fn build_live(screen: &dyn Screen) -> ScreenModel {
    let mut ctx = BuildContext::new(BuildMode::Live);
    let model = screen.build(&mut ctx);
    for effect in ctx.effects {
        effect();
    }
    model
}
