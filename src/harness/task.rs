//! Driver task — the unit of cooperative execution.
//!
//! The driver runs on its own named thread, but never concurrently with the
//! frame loop: control is handed back and forth over a pair of channels.
//! The driver sends one suspend request per yield and blocks on a resume
//! token; the scheduler blocks on the driver's messages while the driver
//! runs. One logical thread of control.
//!
//! Aborting closes the resume channel: the task's next yield (or check, via
//! the shared abort path) unwinds the driver thread with a silent panic
//! payload, the wrapper reports the interruption, and the thread is joined.
//! An aborted task is never resumed again.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Once;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::harness::context::DriverCtx;
use crate::harness::test::DriverFn;

// =============================================================================
// Messages
// =============================================================================

/// Exchanged at each suspension point: how many frames must elapse before
/// the driver resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuspendRequest {
    pub frames: u32,
}

#[derive(Debug)]
pub(crate) enum DriverMessage {
    Suspend(SuspendRequest),
    Finished(DriverOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DriverOutcome {
    /// Driver returned normally.
    Completed,
    /// Driver was unwound by an abort or stop-on-failure.
    Interrupted,
    /// Driver panicked with an ordinary panic.
    Panicked(String),
}

/// Silent unwind payload for cooperative cancellation. Filtered out of the
/// global panic hook so aborted runs do not spam stderr.
pub(crate) struct RunInterrupted;

static HOOK: Once = Once::new();

/// Install a panic-hook filter that mutes [`RunInterrupted`] unwinds.
pub(crate) fn install_interrupt_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if info.payload().is::<RunInterrupted>() {
                return;
            }
            previous(info);
        }));
    });
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "driver panicked".to_string()
    }
}

// =============================================================================
// Task
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TaskState {
    Suspended,
    Running,
    Done,
}

/// Handle to the driver thread, owned by the scheduler.
pub(crate) struct DriverTask {
    handle: Option<JoinHandle<()>>,
    messages: Receiver<DriverMessage>,
    resume_tx: Option<Sender<()>>,
    state: TaskState,
}

impl DriverTask {
    /// Spawn the driver thread. The task starts suspended: the driver body
    /// does not run until the first [`resume`](Self::resume).
    pub(crate) fn spawn<A: Send + 'static>(
        name: &str,
        driver_fn: DriverFn<A>,
        mut ctx: DriverCtx<A>,
        messages: Receiver<DriverMessage>,
        resume_tx: Sender<()>,
    ) -> Self {
        install_interrupt_hook();

        let msg_tx = ctx.msg_tx.clone();
        let handle = thread::Builder::new()
            .name(format!("framedrive-{name}"))
            .spawn(move || {
                // Wait for the scheduler's first resume before running the
                // driver body (warm-up frames pump in between).
                if ctx.resume_rx.recv().is_err() {
                    let _ = msg_tx.send(DriverMessage::Finished(DriverOutcome::Interrupted));
                    return;
                }

                let result = panic::catch_unwind(AssertUnwindSafe(|| driver_fn(&mut ctx)));
                let outcome = match result {
                    Ok(()) => DriverOutcome::Completed,
                    Err(payload) if payload.is::<RunInterrupted>() => DriverOutcome::Interrupted,
                    Err(payload) => DriverOutcome::Panicked(panic_message(payload)),
                };
                let _ = msg_tx.send(DriverMessage::Finished(outcome));
            })
            .expect("failed to spawn driver thread");

        Self {
            handle: Some(handle),
            messages,
            resume_tx: Some(resume_tx),
            state: TaskState::Suspended,
        }
    }

    /// Hand control to the driver. Resuming a completed or already-running
    /// task is a programmer error.
    pub(crate) fn resume(&mut self) {
        assert_eq!(
            self.state,
            TaskState::Suspended,
            "driver task resumed while {:?}",
            self.state
        );
        let tx = self
            .resume_tx
            .as_ref()
            .expect("driver task resumed after abort");
        if tx.send(()).is_ok() {
            self.state = TaskState::Running;
        } else {
            // Driver thread already gone; the Finished message is in flight.
            self.state = TaskState::Done;
        }
    }

    /// Block until the driver suspends or completes, bounded by `timeout`.
    pub(crate) fn wait_message(
        &mut self,
        timeout: Duration,
    ) -> Result<DriverMessage, RecvTimeoutError> {
        let message = self.messages.recv_timeout(timeout)?;
        self.state = match message {
            DriverMessage::Suspend(_) => TaskState::Suspended,
            DriverMessage::Finished(_) => TaskState::Done,
        };
        Ok(message)
    }

    /// Close the resume channel. The task's next yield unwinds; it is never
    /// resumed again.
    pub(crate) fn abort(&mut self) {
        self.resume_tx = None;
    }

    /// Join the driver thread, waiting up to `grace` for it to finish.
    /// Returns false if the thread had to be detached (a driver stuck in a
    /// busy loop cannot be killed).
    pub(crate) fn join(&mut self, grace: Duration) -> bool {
        let Some(handle) = self.handle.take() else {
            return true;
        };
        let deadline = Instant::now() + grace;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!("driver thread did not finish; detaching");
                drop(handle);
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        let _ = handle.join();
        true
    }
}

impl Drop for DriverTask {
    fn drop(&mut self) {
        self.abort();
        self.join(Duration::from_millis(100));
    }
}
