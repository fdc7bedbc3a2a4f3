//! Coalescing drain — the once-per-frame queue consumer.
//!
//! Scans the queue from the head, building one batch per frame. Per-axis
//! "touched" tracking decides whether the next event may still join the open
//! batch; the first event that cannot join closes the batch and becomes the
//! head of the next frame's batch.
//!
//! The rules, per event kind:
//!
//! - Pointer moves coalesce among themselves (later move overwrites), but
//!   cannot join once a button/key/modifier edge, a wheel pulse, or text has
//!   been applied this batch.
//! - Wheel deltas sum among themselves, but cannot join after a move or a
//!   button edge. The settled accumulator is a one-frame pulse.
//! - A button or key transition joins only if its own axis is untouched.
//!   Distinct buttons/keys land in one batch; a second transition on the
//!   same axis starts the next frame.
//! - Characters queue into the pending-character buffer. In text-accepting
//!   mode they interleave with key edges frame-by-frame; otherwise they
//!   batch freely.
//! - Focus changes apply inline and never close a batch.

use tracing::trace;

use super::queue::EventQueue;
use super::state::InputState;
use crate::input::event::InputEvent;
use crate::types::KeyCode;

// =============================================================================
// Configuration
// =============================================================================

/// How character events group relative to key edges in one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharInterleave {
    /// Follow the consumer's per-frame text-accepting signal.
    #[default]
    Auto,
    /// Always interleave characters with key edges.
    Always,
    /// Never interleave; characters batch freely.
    Never,
}

/// Per-context coalescing configuration.
#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    /// When false, every drain consumes the whole queue in one frame.
    pub trickle: bool,
    /// Character/key grouping policy while the consumer transitions between
    /// text-accepting modes.
    pub char_interleave: CharInterleave,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            trickle: true,
            char_interleave: CharInterleave::Auto,
        }
    }
}

/// What one drain did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Events applied to settled state this frame.
    pub applied: usize,
    /// Events deferred to later frames.
    pub remaining: usize,
}

impl DrainReport {
    pub fn is_empty(&self) -> bool {
        self.applied == 0
    }
}

// =============================================================================
// Per-batch axis tracking
// =============================================================================

/// Fixed-size bitset over the key axis space.
#[derive(Default)]
struct KeySet([u64; KeyCode::COUNT / 64]);

impl KeySet {
    fn insert(&mut self, key: KeyCode) {
        self.0[key.index() / 64] |= 1 << (key.index() % 64);
    }

    fn contains(&self, key: KeyCode) -> bool {
        self.0[key.index() / 64] & (1 << (key.index() % 64)) != 0
    }
}

/// Which axes the open batch has touched.
#[derive(Default)]
struct TouchedAxes {
    moved: bool,
    wheeled: bool,
    key_changed: bool,
    text_inputted: bool,
    buttons: u8,
    keys: KeySet,
    mods: u8,
}

// =============================================================================
// Drain
// =============================================================================

/// Consume the longest joinable prefix of `queue` into `state`.
///
/// Runs at most once per frame per context. Also resets the one-frame pulse
/// axes, so draining an empty queue is meaningful.
pub(crate) fn drain_into(
    queue: &mut EventQueue,
    state: &mut InputState,
    config: &QueueConfig,
) -> DrainReport {
    state.begin_frame();

    let interleave = match config.char_interleave {
        CharInterleave::Auto => state.want_text_input(),
        CharInterleave::Always => true,
        CharInterleave::Never => false,
    };
    let trickle = config.trickle;

    let mut touched = TouchedAxes::default();
    let mut applied = 0;

    for event in queue.events() {
        match *event {
            InputEvent::PointerMove { pos } => {
                if trickle
                    && (touched.buttons != 0
                        || touched.wheeled
                        || touched.key_changed
                        || touched.text_inputted)
                {
                    break;
                }
                state.set_pointer_pos(pos);
                touched.moved = true;
            }
            InputEvent::PointerButton { button, down } => {
                let bit = 1u8 << button;
                if trickle && (touched.buttons & bit != 0 || touched.wheeled) {
                    break;
                }
                state.set_button(button, down);
                touched.buttons |= bit;
            }
            InputEvent::Wheel { dx, dy } => {
                if trickle && (touched.moved || touched.buttons != 0) {
                    break;
                }
                state.add_wheel(dx, dy);
                touched.wheeled = true;
            }
            InputEvent::Key { key, down } => {
                debug_assert!(key.is_valid());
                let transitions = state.key_down(key) != down;
                if trickle
                    && transitions
                    && (touched.keys.contains(key)
                        || touched.text_inputted
                        || touched.buttons != 0)
                {
                    break;
                }
                state.set_key(key, down);
                touched.key_changed = true;
                touched.keys.insert(key);
            }
            InputEvent::Modifier { modifier, down } => {
                let bit = modifier.bits();
                debug_assert_eq!(bit.count_ones(), 1);
                let transitions = state.modifier_down(modifier) != down;
                if trickle
                    && transitions
                    && (touched.mods & bit != 0
                        || touched.text_inputted
                        || touched.buttons != 0)
                {
                    break;
                }
                state.set_modifier(modifier, down);
                touched.key_changed = true;
                touched.mods |= bit;
            }
            InputEvent::Char { ch } => {
                if trickle
                    && ((touched.key_changed && interleave) || touched.buttons != 0)
                {
                    break;
                }
                state.push_char(ch);
                if interleave {
                    touched.text_inputted = true;
                }
            }
            InputEvent::Focus { gained } => {
                state.set_focus_lost(!gained);
                if !gained {
                    state.clear_focus_sensitive();
                }
            }
        }
        applied += 1;
    }

    queue.remove_prefix(applied);
    state.refresh_modifier_mask();

    let report = DrainReport {
        applied,
        remaining: queue.len(),
    };
    if !report.is_empty() || report.remaining > 0 {
        trace!(applied = report.applied, remaining = report.remaining, "drained input batch");
    }
    report
}
