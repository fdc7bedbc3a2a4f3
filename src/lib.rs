//! framedrive — frame-synchronized UI test driver engine.
//!
//! The execution core of an automated UI-testing framework: a coalescing
//! input event queue feeding an application's per-frame update, and a
//! cooperative scheduler interleaving a test's driving logic with that
//! frame loop, one frame at a time.
//!
//! # Architecture
//!
//! ```text
//! test driver (own thread)                 scheduler (host thread)
//! ────────────────────────                 ───────────────────────
//! push input events ──────────▶  EventQueue
//! yield_frames(N)   ──suspend─▶  per frame: synthesize → drain → frame fn
//! assert on state   ◀──resume──  after exactly N frames
//!                                      │
//!                        drain applies one coalesced batch
//!                        per frame into the settled InputState
//! ```
//!
//! The queue guarantees no observable discrete transition is ever lost:
//! events that can share a frame coalesce into one batch, events that would
//! overwrite an already-touched axis defer to the next frame. The scheduler
//! guarantees strict alternation: driver and frame loop are two halves of
//! one logical timeline, never truly parallel.
//!
//! # Modules
//!
//! - [`input`] - event model, queue, coalescing drain, settled state
//! - [`harness`] - driver tasks, suspend protocol, run lifecycle, reports
//! - [`types`] - key codes, pointer buttons, modifier bitflags

pub mod error;
pub mod harness;
pub mod input;
pub mod types;

pub use error::PushError;
pub use harness::{
    AbortHandle, CheckFailure, DriverCtx, FrameCtx, Harness, RunConfig, RunFlags, RunReport,
    RunStatus, SuspendRequest, Test,
};
pub use input::{
    CharInterleave, DrainReport, EventQueue, InputContext, InputEvent, InputState, QueueConfig,
};
pub use types::{KeyCode, Modifiers, PointerPos, POINTER_BUTTON_COUNT};

// =============================================================================
// Default context — thin convenience at the outermost API edge
// =============================================================================
//
// Producers that don't manage their own handle can address a thread-local
// context. Nothing inside the drain or the harness goes through this; it is
// sugar over an explicit `InputContext` only.

use std::cell::RefCell;

thread_local! {
    static DEFAULT_CONTEXT: RefCell<InputContext> = RefCell::new(InputContext::new());
}

/// Run `f` against this thread's default input context.
pub fn with_default_context<R>(f: impl FnOnce(&mut InputContext) -> R) -> R {
    DEFAULT_CONTEXT.with(|ctx| f(&mut ctx.borrow_mut()))
}

/// Push a pointer move to the default context.
pub fn push_pointer_move(x: f32, y: f32) {
    with_default_context(|ctx| ctx.push_pointer_move(x, y));
}

/// Push a button transition to the default context.
pub fn push_pointer_button(button: u8, down: bool) -> Result<(), PushError> {
    with_default_context(|ctx| ctx.push_pointer_button(button, down))
}

/// Push a wheel delta to the default context.
pub fn push_wheel(dx: f32, dy: f32) {
    with_default_context(|ctx| ctx.push_wheel(dx, dy));
}

/// Push a key transition to the default context.
pub fn push_key(key: KeyCode, down: bool) -> Result<(), PushError> {
    with_default_context(|ctx| ctx.push_key(key, down))
}

/// Push modifier transitions to the default context.
pub fn push_modifier(modifiers: Modifiers, down: bool) {
    with_default_context(|ctx| ctx.push_modifier(modifiers, down));
}

/// Push a character to the default context.
pub fn push_char(ch: char) -> Result<(), PushError> {
    with_default_context(|ctx| ctx.push_char(ch))
}

/// Push a focus change to the default context.
pub fn push_focus(gained: bool) {
    with_default_context(|ctx| ctx.push_focus(gained));
}
