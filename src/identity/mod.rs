use std::fmt;

/// Stable handle a [`crate::Stack`] assigns to one of its screens.
///
/// Ids are only meaningful inside the collection that allocated them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScreenId(i64);

impl ScreenId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for ScreenId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-collection monotonic counter. The first id handed out is `1`; ids are
/// never reused, even after the screen they named is gone.
#[derive(Debug, Default, Clone)]
pub struct IdentityAllocator {
    last: i64,
}

impl IdentityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> ScreenId {
        self.last += 1;
        ScreenId(self.last)
    }

    /// Highest id allocated so far, if any.
    pub fn last(&self) -> Option<ScreenId> {
        (self.last > 0).then_some(ScreenId(self.last))
    }
}
