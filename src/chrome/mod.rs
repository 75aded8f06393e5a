//! Chrome bar declaration and lookup.
//!
//! A screen declares its bar by listing [`ScreenOption::ChromeBar`] among the
//! options it returns from `build`. Lookup introspects the screen, takes the
//! first chrome bar option in declaration order, and ignores any later ones.
//! Screens that declare none get a bar titled with the configured placeholder.

use std::fmt;

use crate::error::Result;
use crate::identity::ScreenId;
use crate::layout::{Placed, SlotGuide};
use crate::protocol::{self, BAR_VIEW_NAME, PerScreenBar};
use crate::screen::{CHROME_BAR_KEY, Screen, ScreenOption, ScreenRef, introspect};

pub const DEFAULT_TITLE: &str = "Title";

#[derive(Clone, Default)]
pub struct ChromeBar {
    pub title: String,
    pub back_button_title: Option<String>,
    pub back_button_hidden: bool,
    pub title_view: Option<ScreenRef>,
    pub left_views: Vec<ScreenRef>,
    pub right_views: Vec<ScreenRef>,
}

impl ChromeBar {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_back_title(mut self, title: impl Into<String>) -> Self {
        self.back_button_title = Some(title.into());
        self
    }

    pub fn hide_back_button(mut self) -> Self {
        self.back_button_hidden = true;
        self
    }

    pub fn with_title_view(mut self, view: ScreenRef) -> Self {
        self.title_view = Some(view);
        self
    }

    pub fn with_left(mut self, view: ScreenRef) -> Self {
        self.left_views.push(view);
        self
    }

    pub fn with_right(mut self, view: ScreenRef) -> Self {
        self.right_views.push(view);
        self
    }

    pub fn into_option(self) -> ScreenOption {
        ScreenOption::ChromeBar(self)
    }

    /// An empty back title counts as no custom title.
    pub fn custom_back_title(&self) -> Option<&str> {
        self.back_button_title
            .as_deref()
            .filter(|title| !title.is_empty())
    }

    pub fn to_wire(&self) -> PerScreenBar {
        PerScreenBar {
            title: self.title.clone(),
            custom_back_button_title: self.custom_back_title().is_some(),
            back_button_title: self.custom_back_title().unwrap_or_default().to_string(),
            back_button_hidden: self.back_button_hidden,
            has_title_view: self.title_view.is_some(),
            right_view_count: self.right_views.len() as i64,
            left_view_count: self.left_views.len() as i64,
        }
    }
}

impl fmt::Debug for ChromeBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromeBar")
            .field("title", &self.title)
            .field("back_button_title", &self.back_button_title)
            .field("back_button_hidden", &self.back_button_hidden)
            .field("title_view", &self.title_view.as_ref().map(|v| v.name().to_string()))
            .field("left_views", &self.left_views.len())
            .field("right_views", &self.right_views.len())
            .finish()
    }
}

pub struct ResolvedBar {
    pub bar: ChromeBar,
    /// False when the placeholder bar was synthesized.
    pub declared: bool,
    /// Effects the screen attempted during the trial build.
    pub discarded_effects: usize,
}

pub fn resolve_bar(screen: &dyn Screen, default_title: &str) -> ResolvedBar {
    let trial = introspect(screen);
    let declared = trial
        .model
        .options
        .iter()
        .filter(|option| option.key() == CHROME_BAR_KEY)
        .find_map(ScreenOption::as_chrome_bar)
        .cloned();
    ResolvedBar {
        declared: declared.is_some(),
        bar: declared.unwrap_or_else(|| ChromeBar::titled(default_title)),
        discarded_effects: trial.discarded_effects,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessoryRole {
    Title,
    Right,
    Left,
}

/// One accessory view inside a bar.
#[derive(Clone)]
pub struct Accessory {
    pub role: AccessoryRole,
    pub screen: ScreenRef,
}

/// Native bar sub-view for one stack entry.
pub struct BarModel {
    pub key: String,
    pub native_view_name: &'static str,
    pub wire: PerScreenBar,
    pub state: Vec<u8>,
    pub accessories: Vec<Placed<Accessory>>,
}

impl BarModel {
    pub fn build(id: ScreenId, bar: &ChromeBar) -> Result<Self> {
        let wire = bar.to_wire();
        let state = protocol::encode(&wire)?;

        let title = bar.title_view.iter().map(|v| (AccessoryRole::Title, v));
        let right = bar.right_views.iter().map(|v| (AccessoryRole::Right, v));
        let left = bar.left_views.iter().map(|v| (AccessoryRole::Left, v));
        let accessories = title
            .chain(right)
            .chain(left)
            .map(|(role, screen)| {
                Placed::new(
                    Accessory {
                        role,
                        screen: screen.clone(),
                    },
                    SlotGuide::fit_within(),
                )
            })
            .collect();

        Ok(Self {
            key: id.to_string(),
            native_view_name: BAR_VIEW_NAME,
            wire,
            state,
            accessories,
        })
    }
}
