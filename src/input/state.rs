//! Settled input state.
//!
//! The consumer-visible snapshot as of the most recent drain: pointer
//! position, per-button down array, key down array, derived modifier mask,
//! this-frame wheel delta, this-frame pending characters, focus flag.
//!
//! Mutated only by the drain; application logic reads it each frame.

use crate::types::{KeyCode, Modifiers, PointerPos, MODIFIER_COUNT, POINTER_BUTTON_COUNT};

/// Map a single modifier bit to its axis index.
pub(crate) fn modifier_index(modifier: Modifiers) -> usize {
    debug_assert_eq!(modifier.bits().count_ones(), 1);
    modifier.bits().trailing_zeros() as usize
}

/// Settled input state for one context.
#[derive(Debug)]
pub struct InputState {
    pointer_pos: PointerPos,
    buttons: [bool; POINTER_BUTTON_COUNT],
    keys: [bool; KeyCode::COUNT],
    mod_down: [bool; MODIFIER_COUNT],
    mods: Modifiers,
    wheel: (f32, f32),
    chars: Vec<char>,
    focus_lost: bool,
    want_text_input: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            pointer_pos: PointerPos::UNSET,
            buttons: [false; POINTER_BUTTON_COUNT],
            keys: [false; KeyCode::COUNT],
            mod_down: [false; MODIFIER_COUNT],
            mods: Modifiers::empty(),
            wheel: (0.0, 0.0),
            chars: Vec::new(),
            focus_lost: false,
            want_text_input: false,
        }
    }

    // =========================================================================
    // Consumer accessors
    // =========================================================================

    pub fn pointer_pos(&self) -> PointerPos {
        self.pointer_pos
    }

    /// Down state for a button index. Out-of-range indices read as up.
    pub fn button_down(&self, button: u8) -> bool {
        self.buttons
            .get(button as usize)
            .copied()
            .unwrap_or(false)
    }

    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys.get(key.index()).copied().unwrap_or(false)
    }

    /// Derived modifier bitmask, recomputed after each drain.
    pub fn modifiers(&self) -> Modifiers {
        self.mods
    }

    /// This-frame wheel delta. A one-frame pulse: non-zero only on the frame
    /// its events drained.
    pub fn wheel(&self) -> (f32, f32) {
        self.wheel
    }

    /// This-frame pending characters, in arrival order.
    pub fn pending_chars(&self) -> &[char] {
        &self.chars
    }

    /// Consume this frame's pending characters.
    pub fn take_chars(&mut self) -> Vec<char> {
        std::mem::take(&mut self.chars)
    }

    pub fn focus_lost(&self) -> bool {
        self.focus_lost
    }

    /// Whether the consumer signalled a text-accepting mode for the next
    /// drain. Read by the drain, not by applications.
    pub fn want_text_input(&self) -> bool {
        self.want_text_input
    }

    /// Signal whether the consumer accepts text next frame. Recomputed by
    /// application logic each frame; the drain groups character events
    /// accordingly.
    pub fn set_want_text_input(&mut self, want: bool) {
        self.want_text_input = want;
    }

    // =========================================================================
    // Drain-side mutation
    // =========================================================================

    /// Reset the one-frame pulse axes. Runs at the start of every drain,
    /// including drains of an empty queue.
    pub(crate) fn begin_frame(&mut self) {
        self.wheel = (0.0, 0.0);
        self.chars.clear();
    }

    pub(crate) fn set_pointer_pos(&mut self, pos: PointerPos) {
        self.pointer_pos = pos;
    }

    pub(crate) fn set_button(&mut self, button: u8, down: bool) {
        debug_assert!((button as usize) < POINTER_BUTTON_COUNT);
        self.buttons[button as usize] = down;
    }

    pub(crate) fn set_key(&mut self, key: KeyCode, down: bool) {
        debug_assert!(key.is_valid());
        self.keys[key.index()] = down;
    }

    pub(crate) fn modifier_down(&self, modifier: Modifiers) -> bool {
        self.mod_down[modifier_index(modifier)]
    }

    pub(crate) fn set_modifier(&mut self, modifier: Modifiers, down: bool) {
        self.mod_down[modifier_index(modifier)] = down;
    }

    pub(crate) fn add_wheel(&mut self, dx: f32, dy: f32) {
        self.wheel.0 += dx;
        self.wheel.1 += dy;
    }

    pub(crate) fn push_char(&mut self, ch: char) {
        self.chars.push(ch);
    }

    pub(crate) fn set_focus_lost(&mut self, lost: bool) {
        self.focus_lost = lost;
    }

    /// Clear the focus-requiring axes. Runs when a focus loss drains.
    pub(crate) fn clear_focus_sensitive(&mut self) {
        self.keys = [false; KeyCode::COUNT];
        self.mod_down = [false; MODIFIER_COUNT];
        self.chars.clear();
    }

    /// Recompute the derived modifier mask from the per-bit down states.
    pub(crate) fn refresh_modifier_mask(&mut self) {
        let mut mods = Modifiers::empty();
        for (i, &down) in self.mod_down.iter().enumerate() {
            if down {
                mods |= Modifiers::from_bits_truncate(1 << i);
            }
        }
        self.mods = mods;
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
