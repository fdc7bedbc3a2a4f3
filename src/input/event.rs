//! Input event model.
//!
//! One immutable notification of an input-state change. Order is implicit:
//! events live in their queue in arrival order and are only ever grouped,
//! never reordered.

use crate::types::{KeyCode, Modifiers, PointerPos};

/// A single queued input notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMove { pos: PointerPos },
    PointerButton { button: u8, down: bool },
    Wheel { dx: f32, dy: f32 },
    Key { key: KeyCode, down: bool },
    Modifier { modifier: Modifiers, down: bool },
    Char { ch: char },
    Focus { gained: bool },
}

impl InputEvent {
    /// Whether this event only makes sense while the consumer holds focus.
    /// A queued focus loss discards pending events on these axes.
    pub fn requires_focus(&self) -> bool {
        matches!(
            self,
            Self::Key { .. } | Self::Modifier { .. } | Self::Char { .. }
        )
    }
}
