//! Error taxonomy for the push boundary.
//!
//! Malformed pushes are rejected here and never enqueued. Coalescing
//! invariants are internal and `debug_assert!`ed in the drain instead.

use thiserror::Error;

use crate::types::{KeyCode, POINTER_BUTTON_COUNT};

/// A push that cannot be represented as a queue event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("pointer button index {0} out of range (limit {limit})", limit = POINTER_BUTTON_COUNT)]
    ButtonOutOfRange(u8),

    #[error("key code {0:?} out of range (limit {limit})", limit = KeyCode::COUNT)]
    KeyOutOfRange(KeyCode),

    #[error("NUL character cannot be queued")]
    NulChar,
}
