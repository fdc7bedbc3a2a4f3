//! Core input types shared across the queue and the harness.
//!
//! Every independently coalesced facet of input state (an *axis*) is keyed
//! by one of these: a pointer button index, a `KeyCode`, a `Modifiers` bit,
//! the pointer position, or the wheel accumulator. The axis spaces are small
//! and fixed so per-batch tracking stays a handful of bitmasks.

// =============================================================================
// Pointer
// =============================================================================

/// Number of tracked pointer buttons. Indices at or above this are rejected
/// at the push boundary.
pub const POINTER_BUTTON_COUNT: usize = 5;

/// A pointer position in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPos {
    pub x: f32,
    pub y: f32,
}

impl PointerPos {
    /// Sentinel for "no position observed yet".
    pub const UNSET: Self = Self {
        x: -f32::MAX,
        y: -f32::MAX,
    };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Whether a real position has been observed.
    pub fn is_set(&self) -> bool {
        self.x > -f32::MAX / 2.0 && self.y > -f32::MAX / 2.0
    }
}

impl Default for PointerPos {
    fn default() -> Self {
        Self::UNSET
    }
}

// =============================================================================
// Keys
// =============================================================================

/// A key identity within the fixed key axis space.
///
/// The space is deliberately larger than the named constants so hosts can map
/// their own scancodes; anything at or above [`KeyCode::COUNT`] is rejected
/// at the push boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub u16);

impl KeyCode {
    /// Size of the key axis space.
    pub const COUNT: usize = 512;

    pub const ENTER: Self = Self(1);
    pub const TAB: Self = Self(2);
    pub const ESCAPE: Self = Self(3);
    pub const BACKSPACE: Self = Self(4);
    pub const DELETE: Self = Self(5);
    pub const SPACE: Self = Self(6);
    pub const UP: Self = Self(7);
    pub const DOWN: Self = Self(8);
    pub const LEFT: Self = Self(9);
    pub const RIGHT: Self = Self(10);
    pub const HOME: Self = Self(11);
    pub const END: Self = Self(12);
    pub const PAGE_UP: Self = Self(13);
    pub const PAGE_DOWN: Self = Self(14);
    pub const INSERT: Self = Self(15);

    pub const A: Self = Self(30);
    pub const B: Self = Self(31);
    pub const C: Self = Self(32);
    pub const D: Self = Self(33);
    pub const E: Self = Self(34);
    pub const F: Self = Self(35);
    pub const G: Self = Self(36);
    pub const Z: Self = Self(55);

    /// Function key (1-based); `KeyCode::f(1)` is F1.
    pub const fn f(n: u16) -> Self {
        Self(80 + n - 1)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn is_valid(self) -> bool {
        (self.0 as usize) < Self::COUNT
    }
}

// =============================================================================
// Modifiers
// =============================================================================

bitflags::bitflags! {
    /// Modifier key bits. Each bit is its own edge axis for coalescing, and
    /// the set as a whole is the consumer-visible modifier mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const CTRL  = 1 << 0;
        const SHIFT = 1 << 1;
        const ALT   = 1 << 2;
        const SUPER = 1 << 3;
    }
}

/// Number of modifier axes (one per flag bit).
pub const MODIFIER_COUNT: usize = 4;
