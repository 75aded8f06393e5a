//! Placement guides handed to the host's layout solver.
//!
//! The solver itself lives outside this crate; a guide only states the
//! constraints each child is given. [`SlotGuide::resolve`] evaluates a guide
//! against a parent size so the constraints can be checked without a solver.

/// Height of the chrome bar band.
pub const BAR_HEIGHT: f64 = 44.0;
/// Vertical space taken from the parent before sizing screen content.
/// Fixed; does not follow rotation or the real bar height.
pub const CONTENT_INSET: f64 = 64.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// How one axis of a slot is sized relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extent {
    Fixed(f64),
    MatchParent,
    ParentMinus(f64),
    /// Intrinsic size, capped at the parent. Resolves to the cap.
    AtMostParent,
}

impl Extent {
    fn resolve(self, parent: f64) -> f64 {
        match self {
            Extent::Fixed(value) => value,
            Extent::MatchParent | Extent::AtMostParent => parent,
            Extent::ParentMinus(inset) => (parent - inset).max(0.0),
        }
    }
}

/// Constraints for one child, pinned to the parent's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotGuide {
    pub top: f64,
    pub left: f64,
    pub width: Extent,
    pub height: Extent,
}

impl SlotGuide {
    /// Full-width bar band.
    pub fn bar(height: f64) -> Self {
        Self {
            top: 0.0,
            left: 0.0,
            width: Extent::MatchParent,
            height: Extent::Fixed(height),
        }
    }

    /// Full-width screen content, shortened by `inset`.
    pub fn content(inset: f64) -> Self {
        Self {
            top: 0.0,
            left: 0.0,
            width: Extent::MatchParent,
            height: Extent::ParentMinus(inset),
        }
    }

    /// Bar accessory: any size that fits the bar box.
    pub fn fit_within() -> Self {
        Self {
            top: 0.0,
            left: 0.0,
            width: Extent::AtMostParent,
            height: Extent::AtMostParent,
        }
    }

    pub fn resolve(&self, parent: Size) -> Rect {
        Rect::new(
            self.left,
            self.top,
            self.width.resolve(parent.width),
            self.height.resolve(parent.height),
        )
    }
}

/// A child together with the guide it is laid out by.
#[derive(Clone)]
pub struct Placed<T> {
    pub item: T,
    pub guide: SlotGuide,
}

impl<T> Placed<T> {
    pub fn new(item: T, guide: SlotGuide) -> Self {
        Self { item, guide }
    }
}
