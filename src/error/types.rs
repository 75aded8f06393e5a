use thiserror::Error;

/// Unified result type for the stack navigation crate.
pub type Result<T> = std::result::Result<T, StackError>;

/// Errors raised while talking to the host renderer.
///
/// None of these reach code that only mutates a [`crate::Stack`]; the hosting
/// view logs them and keeps the collection untouched.
#[derive(Debug, Error)]
pub enum StackError {
    #[error("failed to decode host payload: {0}")]
    Decode(#[source] postcard::Error),
    #[error("failed to encode descriptor: {0}")]
    Encode(#[source] postcard::Error),
    #[error("native function `{0}` is not registered")]
    UnknownNativeFunction(String),
    #[error("reorder event references no known screens")]
    EmptyOrder,
    #[error("host event channel disconnected")]
    HostDisconnected,
}
