//! Input event queue and coalescing drain.
//!
//! Producers push discrete notifications; once per frame the drain consumes
//! the longest joinable queue prefix into the settled state the application
//! reads.
//!
//! ```text
//! push_* (filtered) → EventQueue → drain (per-axis batching) → InputState
//!                                        │
//!                            one batch == one frame's input
//! ```

pub mod context;
pub mod event;
pub mod queue;
pub mod state;
pub mod trickle;

pub use context::InputContext;
pub use event::InputEvent;
pub use queue::EventQueue;
pub use state::InputState;
pub use trickle::{CharInterleave, DrainReport, QueueConfig};
