//! Wire format shared with the host renderer.
//!
//! Payloads are `postcard`-encoded serde structs. Optional styling fields are
//! encoded as absent rather than as defaults, so the host can tell "unset"
//! from "set to the default value".

mod wire;

pub use wire::{Color, CompositeDescriptor, PerScreenBar, StackChild, StackEvent, TextStyle};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, StackError};

/// Native view name of the stack container.
pub const STACK_VIEW_NAME: &str = "stacknav";
/// Native view name of each per-screen bar.
pub const BAR_VIEW_NAME: &str = "stacknav Bar";
/// Host-invoked function carrying a [`StackEvent`].
pub const ON_CHANGE: &str = "OnChange";

pub fn encode<T>(value: &T) -> Result<Vec<u8>>
where
    T: Serialize,
{
    postcard::to_stdvec(value).map_err(StackError::Encode)
}

/// Decode a complete payload; trailing bytes are treated as corruption.
pub fn decode<T>(bytes: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let (value, rest) = postcard::take_from_bytes(bytes).map_err(StackError::Decode)?;
    if !rest.is_empty() {
        return Err(StackError::Decode(postcard::Error::DeserializeBadEncoding));
    }
    Ok(value)
}
