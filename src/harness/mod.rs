//! Cooperative scheduler — driver tasks, suspend protocol, run lifecycle.
//!
//! Driver logic and the application frame loop behave as concurrent but run
//! as one logical thread of control handed back and forth:
//!
//! ```text
//! driver thread                    scheduler thread
//! ─────────────                    ────────────────
//! run driving logic
//! yield_frames(N) ──suspend──▶     pump N frames (drain + frame fn each)
//! (blocked)       ◀──resume───     wait for next suspend
//! ```

pub mod context;
pub mod report;
pub mod runner;
pub mod task;

pub use context::DriverCtx;
pub use report::{CheckFailure, RunReport, RunStatus};
pub use runner::{AbortHandle, Harness, RunConfig};
pub use task::SuspendRequest;
pub use test::{FrameCtx, RunFlags, Test};
