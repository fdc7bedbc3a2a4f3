//! Interaction context — one queue plus one settled state.
//!
//! The explicit handle every producer and consumer call threads through.
//! Contexts are fully isolated: events pushed to one never affect another.
//! Push-time filtering drops events that would produce no observable change
//! relative to the latest queued value for the axis (or the settled state if
//! nothing is queued), so no-op notifications never cost a frame.

use tracing::debug;

use super::event::InputEvent;
use super::queue::EventQueue;
use super::state::InputState;
use super::trickle::{self, DrainReport, QueueConfig};
use crate::error::PushError;
use crate::types::{KeyCode, Modifiers, PointerPos, POINTER_BUTTON_COUNT};

/// One independent input-consuming context.
#[derive(Debug, Default)]
pub struct InputContext {
    queue: EventQueue,
    state: InputState,
    config: QueueConfig,
}

impl InputContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Settled state as of the most recent drain.
    pub fn state(&self) -> &InputState {
        &self.state
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut QueueConfig {
        &mut self.config
    }

    /// Pending events not yet applied.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Pending events, in arrival order.
    pub fn queued_events(&self) -> &[InputEvent] {
        self.queue.events()
    }

    /// Signal whether the consumer accepts text next frame.
    pub fn set_want_text_input(&mut self, want: bool) {
        self.state.set_want_text_input(want);
    }

    /// Consume this frame's pending characters.
    pub fn take_chars(&mut self) -> Vec<char> {
        self.state.take_chars()
    }

    /// Run the once-per-frame coalescing drain.
    pub fn drain(&mut self) -> DrainReport {
        trickle::drain_into(&mut self.queue, &mut self.state, &self.config)
    }

    /// Discard all pending events without applying them.
    pub fn flush(&mut self) {
        if !self.queue.is_empty() {
            debug!(discarded = self.queue.len(), "flushed input queue");
        }
        self.queue.clear();
    }

    // =========================================================================
    // Producer API
    // =========================================================================

    /// Queue a pointer move. A move to the already-current position is
    /// dropped.
    pub fn push_pointer_move(&mut self, x: f32, y: f32) {
        let pos = PointerPos::new(x, y);
        let latest = self
            .queue
            .latest(|e| match e {
                InputEvent::PointerMove { pos } => Some(*pos),
                _ => None,
            })
            .unwrap_or_else(|| self.state.pointer_pos());
        if latest == pos {
            return;
        }
        self.queue.push(InputEvent::PointerMove { pos });
    }

    /// Queue a button transition. A redundant transition (already in the
    /// requested state) is dropped.
    pub fn push_pointer_button(&mut self, button: u8, down: bool) -> Result<(), PushError> {
        if button as usize >= POINTER_BUTTON_COUNT {
            return Err(PushError::ButtonOutOfRange(button));
        }
        let latest = self
            .queue
            .latest(|e| match e {
                InputEvent::PointerButton { button: b, down } if *b == button => Some(*down),
                _ => None,
            })
            .unwrap_or_else(|| self.state.button_down(button));
        if latest == down {
            return Ok(());
        }
        self.queue.push(InputEvent::PointerButton { button, down });
        Ok(())
    }

    /// Queue a wheel delta. Zero deltas are dropped.
    pub fn push_wheel(&mut self, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.queue.push(InputEvent::Wheel { dx, dy });
    }

    /// Queue a key transition. A redundant transition is dropped.
    pub fn push_key(&mut self, key: KeyCode, down: bool) -> Result<(), PushError> {
        if !key.is_valid() {
            return Err(PushError::KeyOutOfRange(key));
        }
        let latest = self
            .queue
            .latest(|e| match e {
                InputEvent::Key { key: k, down } if *k == key => Some(*down),
                _ => None,
            })
            .unwrap_or_else(|| self.state.key_down(key));
        if latest == down {
            return Ok(());
        }
        self.queue.push(InputEvent::Key { key, down });
        Ok(())
    }

    /// Queue modifier transitions, one event per bit set in `modifiers`.
    /// Redundant transitions are dropped per bit.
    pub fn push_modifier(&mut self, modifiers: Modifiers, down: bool) {
        for modifier in modifiers.iter() {
            let latest = self
                .queue
                .latest(|e| match e {
                    InputEvent::Modifier { modifier: m, down } if *m == modifier => Some(*down),
                    _ => None,
                })
                .unwrap_or_else(|| self.state.modifier_down(modifier));
            if latest == down {
                continue;
            }
            self.queue.push(InputEvent::Modifier { modifier, down });
        }
    }

    /// Queue a text character. Characters are never deduplicated.
    pub fn push_char(&mut self, ch: char) -> Result<(), PushError> {
        if ch == '\0' {
            return Err(PushError::NulChar);
        }
        self.queue.push(InputEvent::Char { ch });
        Ok(())
    }

    /// Queue a focus change. Duplicate notifications collapse; a focus loss
    /// additionally discards pending events on focus-requiring axes.
    pub fn push_focus(&mut self, gained: bool) {
        let latest = self
            .queue
            .latest(|e| match e {
                InputEvent::Focus { gained } => Some(*gained),
                _ => None,
            })
            .unwrap_or(!self.state.focus_lost());
        if latest == gained {
            return;
        }
        if !gained {
            self.queue.discard_focus_sensitive();
        }
        self.queue.push(InputEvent::Focus { gained });
    }
}
