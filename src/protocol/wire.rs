use serde::{Deserialize, Serialize};

/// RGBA color, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 0xff)
    }
}

/// Text styling forwarded to the host as-is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub color: Option<Color>,
}

impl TextStyle {
    pub fn sized(font_size: f64) -> Self {
        Self {
            font_size: Some(font_size),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackChild {
    pub screen_id: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompositeDescriptor {
    pub children: Vec<StackChild>,
    pub title_text_style: Option<TextStyle>,
    pub back_text_style: Option<TextStyle>,
    pub bar_color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerScreenBar {
    pub title: String,
    pub custom_back_button_title: bool,
    pub back_button_title: String,
    pub back_button_hidden: bool,
    pub has_title_view: bool,
    pub right_view_count: i64,
    pub left_view_count: i64,
}

/// Host's authoritative stack order after a gesture or back action.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StackEvent {
    pub id: Vec<i64>,
}
