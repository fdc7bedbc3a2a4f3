//! Driver-side context — what a test's driving logic runs against.
//!
//! All access to the shared world (input context + application state) goes
//! through short-lived locks. The suspend protocol guarantees the scheduler
//! and the driver are never both between lock acquisitions doing frame work,
//! so the lock is a formality that satisfies the borrow checker, not a
//! contention point.

use std::fmt;
use std::panic::panic_any;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use crate::error::PushError;
use crate::harness::report::CheckFailure;
use crate::harness::task::{DriverMessage, RunInterrupted, SuspendRequest};
use crate::input::{InputContext, InputState};
use crate::types::{KeyCode, Modifiers, PointerPos, POINTER_BUTTON_COUNT};

// =============================================================================
// Shared world
// =============================================================================

/// Everything the driver and the frame loop alternate over.
pub(crate) struct World<A> {
    pub input: InputContext,
    pub app: A,
    pub frame: i64,
    pub sim: SimulatedInput,
}

pub(crate) type SharedWorld<A> = Arc<Mutex<World<A>>>;

/// Lock the world, recovering from poisoning (a panicked holder is already
/// fatal to the run through the task outcome).
pub(crate) fn lock_world<A>(world: &SharedWorld<A>) -> MutexGuard<'_, World<A>> {
    match world.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Convenience input re-applied into the queue before every drain, unless
/// the run uses raw inputs. Push filtering makes re-application idempotent:
/// only actual transitions enqueue.
#[derive(Debug)]
pub(crate) struct SimulatedInput {
    pub pointer_pos: Option<PointerPos>,
    pub buttons: u8,
    pub mods: Modifiers,
}

impl SimulatedInput {
    pub(crate) fn new() -> Self {
        Self {
            pointer_pos: None,
            buttons: 0,
            mods: Modifiers::empty(),
        }
    }

    pub(crate) fn apply(&self, input: &mut InputContext) {
        if let Some(pos) = self.pointer_pos {
            input.push_pointer_move(pos.x, pos.y);
        }
        for button in 0..POINTER_BUTTON_COUNT as u8 {
            let down = self.buttons & (1 << button) != 0;
            // Index is in range by construction.
            let _ = input.push_pointer_button(button, down);
        }
        for modifier in Modifiers::all().iter() {
            input.push_modifier(modifier, self.mods.contains(modifier));
        }
    }
}

// =============================================================================
// Driver context
// =============================================================================

/// Handed to the driver function; owns the driver's half of the suspend
/// protocol.
pub struct DriverCtx<A> {
    pub(crate) world: SharedWorld<A>,
    pub(crate) msg_tx: Sender<DriverMessage>,
    pub(crate) resume_rx: Receiver<()>,
    pub(crate) failures: Arc<Mutex<Vec<CheckFailure>>>,
    pub(crate) stop_on_failure: bool,
    pub(crate) raw_inputs: bool,
    pub(crate) test_name: String,
}

/// Unwind the driver thread without noise; the task wrapper reports it.
fn interrupted() -> ! {
    panic_any(RunInterrupted)
}

impl<A> DriverCtx<A> {
    // =========================================================================
    // Suspend protocol
    // =========================================================================

    /// Suspend and let exactly `frames` frames elapse (each running one
    /// drain and the application frame function) before resuming.
    /// Zero is clamped to one.
    pub fn yield_frames(&mut self, frames: u32) {
        let frames = frames.max(1);
        if self
            .msg_tx
            .send(DriverMessage::Suspend(SuspendRequest { frames }))
            .is_err()
        {
            interrupted();
        }
        if self.resume_rx.recv().is_err() {
            interrupted();
        }
    }

    /// Suspend for a single frame.
    pub fn yield_once(&mut self) {
        self.yield_frames(1);
    }

    /// Whether this run observes raw coalescing (no input synthesis).
    pub fn raw_inputs(&self) -> bool {
        self.raw_inputs
    }

    /// Frame counter as of the last completed frame.
    pub fn frame(&self) -> i64 {
        lock_world(&self.world).frame
    }

    // =========================================================================
    // Checks
    // =========================================================================

    /// Record a failure if `condition` is false. The run continues unless
    /// stop-on-failure is configured. Returns `condition`.
    pub fn check(&mut self, condition: bool, message: impl Into<String>) -> bool {
        if condition {
            return true;
        }
        let message = message.into();
        let frame = self.frame();
        warn!(test = %self.test_name, frame, "check failed: {message}");
        match self.failures.lock() {
            Ok(mut failures) => failures.push(CheckFailure { message, frame }),
            Err(poisoned) => poisoned.into_inner().push(CheckFailure { message, frame }),
        }
        if self.stop_on_failure {
            interrupted();
        }
        false
    }

    /// Record a failure unless `left == right`.
    pub fn check_eq<T: PartialEq + fmt::Debug>(&mut self, left: T, right: T, what: &str) -> bool {
        if left == right {
            return true;
        }
        self.check(false, format!("{what}: {left:?} != {right:?}"))
    }

    // =========================================================================
    // Application and input access
    // =========================================================================

    pub fn app<R>(&self, f: impl FnOnce(&A) -> R) -> R {
        f(&lock_world(&self.world).app)
    }

    pub fn app_mut<R>(&self, f: impl FnOnce(&mut A) -> R) -> R {
        f(&mut lock_world(&self.world).app)
    }

    pub fn input<R>(&self, f: impl FnOnce(&InputState) -> R) -> R {
        f(lock_world(&self.world).input.state())
    }

    pub fn pointer_pos(&self) -> PointerPos {
        self.input(|s| s.pointer_pos())
    }

    pub fn button_down(&self, button: u8) -> bool {
        self.input(|s| s.button_down(button))
    }

    pub fn key_down(&self, key: KeyCode) -> bool {
        self.input(|s| s.key_down(key))
    }

    pub fn modifiers(&self) -> Modifiers {
        self.input(|s| s.modifiers())
    }

    pub fn wheel(&self) -> (f32, f32) {
        self.input(|s| s.wheel())
    }

    pub fn pending_chars(&self) -> Vec<char> {
        self.input(|s| s.pending_chars().to_vec())
    }

    pub fn focus_lost(&self) -> bool {
        self.input(|s| s.focus_lost())
    }

    pub fn queue_len(&self) -> usize {
        lock_world(&self.world).input.queue_len()
    }

    // =========================================================================
    // Raw producer mirror
    // =========================================================================

    pub fn push_pointer_move(&self, x: f32, y: f32) {
        lock_world(&self.world).input.push_pointer_move(x, y);
    }

    pub fn push_pointer_button(&self, button: u8, down: bool) -> Result<(), PushError> {
        lock_world(&self.world).input.push_pointer_button(button, down)
    }

    pub fn push_wheel(&self, dx: f32, dy: f32) {
        lock_world(&self.world).input.push_wheel(dx, dy);
    }

    pub fn push_key(&self, key: KeyCode, down: bool) -> Result<(), PushError> {
        lock_world(&self.world).input.push_key(key, down)
    }

    pub fn push_modifier(&self, modifiers: Modifiers, down: bool) {
        lock_world(&self.world).input.push_modifier(modifiers, down);
    }

    pub fn push_char(&self, ch: char) -> Result<(), PushError> {
        lock_world(&self.world).input.push_char(ch)
    }

    pub fn push_focus(&self, gained: bool) {
        lock_world(&self.world).input.push_focus(gained);
    }

    // =========================================================================
    // Convenience input (synthesized; no-ops under RAW_INPUTS)
    // =========================================================================

    /// Move the simulated pointer and let one frame elapse.
    pub fn pointer_to(&mut self, x: f32, y: f32) {
        lock_world(&self.world).sim.pointer_pos = Some(PointerPos::new(x, y));
        self.yield_once();
    }

    /// Press a simulated pointer button and let one frame elapse.
    pub fn press_button(&mut self, button: u8) {
        assert!((button as usize) < POINTER_BUTTON_COUNT);
        lock_world(&self.world).sim.buttons |= 1 << button;
        self.yield_once();
    }

    /// Release a simulated pointer button and let one frame elapse.
    pub fn release_button(&mut self, button: u8) {
        assert!((button as usize) < POINTER_BUTTON_COUNT);
        lock_world(&self.world).sim.buttons &= !(1 << button);
        self.yield_once();
    }

    /// Press then release a button, one frame each.
    pub fn click(&mut self, button: u8) {
        self.press_button(button);
        self.release_button(button);
    }

    /// Hold simulated modifiers and let one frame elapse.
    pub fn hold_modifiers(&mut self, mods: Modifiers) {
        lock_world(&self.world).sim.mods |= mods;
        self.yield_once();
    }

    /// Release simulated modifiers and let one frame elapse.
    pub fn release_modifiers(&mut self, mods: Modifiers) {
        lock_world(&self.world).sim.mods -= mods;
        self.yield_once();
    }

    /// Tap a key: down, one frame, up, one frame.
    pub fn key_press(&mut self, key: KeyCode) {
        if let Err(e) = self.push_key(key, true) {
            self.check(false, e.to_string());
            return;
        }
        self.yield_once();
        if let Err(e) = self.push_key(key, false) {
            self.check(false, e.to_string());
            return;
        }
        self.yield_once();
    }

    /// Tap a key while holding modifiers.
    pub fn key_chord(&mut self, mods: Modifiers, key: KeyCode) {
        self.hold_modifiers(mods);
        self.key_press(key);
        self.release_modifiers(mods);
    }

    /// Queue a character and let one frame elapse.
    pub fn char_input(&mut self, ch: char) {
        if let Err(e) = self.push_char(ch) {
            self.check(false, e.to_string());
            return;
        }
        self.yield_once();
    }
}
