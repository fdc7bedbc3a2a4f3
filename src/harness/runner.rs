//! The scheduler — frame pump, budgets, and run lifecycle.
//!
//! One run walks NotStarted → WarmUp → Running → Finished → TornDown:
//!
//! ```text
//! warm-up frames → resume driver ⇄ pump N frames per suspend → teardown
//!                       │
//!            each frame: synthesize (unless raw) → drain → frame fn
//! ```
//!
//! The run loop blocks on the driver's channel messages; budgets bound every
//! wait. A driver that exceeds them is aborted and reported Hung — fatal to
//! the run, never to the process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::harness::context::{lock_world, DriverCtx, SharedWorld, SimulatedInput, World};
use crate::harness::report::{CheckFailure, RunReport, RunStatus};
use crate::harness::task::{DriverMessage, DriverOutcome, DriverTask};
use crate::harness::test::{FrameCtx, FrameFn, RunFlags, Test};
use crate::input::InputContext;

// =============================================================================
// Configuration
// =============================================================================

/// Per-run scheduler configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Throwaway frames before the driver first runs, letting application
    /// state settle. The frame counter starts at minus this.
    pub warmup_frames: u32,
    /// Frame budget per run; exceeding it aborts the run as hung.
    pub max_frames: u64,
    /// Wall-clock budget per suspension gap; exceeding it aborts the run as
    /// hung.
    pub hang_timeout: Duration,
    /// Abort the run at its first failed check.
    pub stop_on_failure: bool,
    /// Stop a suite at its first non-passing run.
    pub stop_suite_on_failure: bool,
    /// Optional per-frame sleep for watchable slow-motion runs.
    pub frame_pacing: Option<Duration>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            warmup_frames: 2,
            max_frames: 100_000,
            hang_timeout: Duration::from_secs(30),
            stop_on_failure: false,
            stop_suite_on_failure: false,
            frame_pacing: None,
        }
    }
}

/// Aborts a run (or suite) from outside the driver. Safe to use from any
/// thread; the task is never resumed after the abort takes effect.
#[derive(Debug, Clone)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Harness
// =============================================================================

/// Runs tests against fresh application instances.
pub struct Harness<A> {
    config: RunConfig,
    make_app: Box<dyn FnMut() -> A>,
    abort: Arc<AtomicBool>,
}

impl<A: Send + 'static> Harness<A> {
    pub fn new(make_app: impl FnMut() -> A + 'static) -> Self {
        Self {
            config: RunConfig::default(),
            make_app: Box::new(make_app),
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle(self.abort.clone())
    }

    /// Run one test to completion and report.
    pub fn run(&mut self, test: Test<A>) -> RunReport {
        let started = Instant::now();
        let Test {
            name,
            flags,
            mut frame_fn,
            driver_fn,
        } = test;
        info!(test = %name, "run started");

        let warmup = if flags.contains(RunFlags::NO_WARMUP) {
            0
        } else {
            self.config.warmup_frames
        };
        let raw = flags.contains(RunFlags::RAW_INPUTS);

        let world: SharedWorld<A> = Arc::new(Mutex::new(World {
            input: InputContext::new(),
            app: (self.make_app)(),
            frame: -i64::from(warmup),
            sim: SimulatedInput::new(),
        }));
        let failures = Arc::new(Mutex::new(Vec::new()));

        let (msg_tx, msg_rx) = mpsc::channel();
        let (resume_tx, resume_rx) = mpsc::channel();
        let ctx = DriverCtx {
            world: world.clone(),
            msg_tx,
            resume_rx,
            failures: failures.clone(),
            stop_on_failure: self.config.stop_on_failure,
            raw_inputs: raw,
            test_name: name.clone(),
        };
        let mut task = DriverTask::spawn(&name, driver_fn, ctx, msg_rx, resume_tx);

        let mut frames_pumped: u64 = 0;
        let mut hung = false;
        let mut external_abort = false;
        let mut aborting = false;
        let mut outcome: Option<DriverOutcome> = None;

        // WarmUp
        for _ in 0..warmup {
            if self.abort.load(Ordering::SeqCst) {
                external_abort = true;
                break;
            }
            Self::pump_frame(&world, &mut frame_fn, raw, self.config.frame_pacing);
            frames_pumped += 1;
        }

        // Running
        if external_abort {
            task.abort();
            aborting = true;
        } else {
            task.resume();
        }
        loop {
            let timeout = if aborting {
                // Only waiting for the unwound driver to report in.
                Duration::from_millis(250)
            } else {
                self.config.hang_timeout
            };
            match task.wait_message(timeout) {
                Ok(DriverMessage::Suspend(request)) => {
                    if aborting {
                        // Never resumed again; its next recv unwinds it.
                        continue;
                    }
                    let mut cut_short = false;
                    for _ in 0..request.frames {
                        if self.abort.load(Ordering::SeqCst) {
                            external_abort = true;
                            cut_short = true;
                            break;
                        }
                        if frames_pumped >= self.config.max_frames {
                            hung = true;
                            cut_short = true;
                            break;
                        }
                        Self::pump_frame(&world, &mut frame_fn, raw, self.config.frame_pacing);
                        frames_pumped += 1;
                    }
                    if cut_short {
                        task.abort();
                        aborting = true;
                    } else {
                        task.resume();
                    }
                }
                Ok(DriverMessage::Finished(o)) => {
                    outcome = Some(o);
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {
                    if aborting {
                        // Driver is stuck outside the protocol; give up.
                        break;
                    }
                    error!(test = %name, "driver exceeded its budget; aborting run");
                    hung = true;
                    task.abort();
                    aborting = true;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    outcome = Some(DriverOutcome::Panicked(
                        "driver thread exited without reporting".into(),
                    ));
                    break;
                }
            }
        }

        let frames_at_completion = lock_world(&world).frame;

        // TornDown: settle frames with synthesis cleared, so the next run
        // never observes leaked input.
        lock_world(&world).sim = SimulatedInput::new();
        let mut no_frame_fn: Option<FrameFn<A>> = None;
        for _ in 0..2 {
            Self::pump_frame(&world, &mut no_frame_fn, true, None);
        }

        let joined = task.join(Duration::from_millis(500));

        // Status resolution
        let mut failures = match failures.lock() {
            Ok(mut f) => std::mem::take(&mut *f),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        if let Some(DriverOutcome::Panicked(message)) = &outcome {
            failures.push(CheckFailure {
                message: format!("driver panicked: {message}"),
                frame: frames_at_completion,
            });
        }
        if hung || !joined {
            failures.push(CheckFailure {
                message: "driver exceeded its frame/time budget".into(),
                frame: frames_at_completion,
            });
        }
        let status = if hung || !joined {
            RunStatus::Hung
        } else if external_abort {
            RunStatus::Aborted
        } else if !failures.is_empty() {
            RunStatus::Failed
        } else {
            RunStatus::Success
        };

        if status == RunStatus::Aborted {
            // Consume the external abort so the next run starts clean; the
            // suite loop stops on the reported status instead.
            self.abort.store(false, Ordering::SeqCst);
        }

        match status {
            RunStatus::Success => info!(test = %name, frames = frames_at_completion, "run passed"),
            _ => warn!(
                test = %name,
                frames = frames_at_completion,
                ?status,
                failures = failures.len(),
                "run did not pass"
            ),
        }

        RunReport {
            name,
            status,
            frames: frames_at_completion,
            failures,
            duration: started.elapsed(),
        }
    }

    /// Run tests in order. Failed runs do not stop the suite unless
    /// configured; an external abort always does.
    pub fn run_all(&mut self, tests: Vec<Test<A>>) -> Vec<RunReport> {
        let mut reports = Vec::with_capacity(tests.len());
        for test in tests {
            let report = self.run(test);
            let aborted = report.status == RunStatus::Aborted;
            let stop = self.config.stop_suite_on_failure && !report.passed();
            reports.push(report);
            if aborted || stop {
                break;
            }
        }
        reports
    }

    /// One frame: synthesize convenience input (unless raw), drain once,
    /// run the application frame function, advance the counter.
    fn pump_frame(
        world: &SharedWorld<A>,
        frame_fn: &mut Option<FrameFn<A>>,
        raw: bool,
        pacing: Option<Duration>,
    ) {
        {
            let mut guard = lock_world(world);
            let w = &mut *guard;
            if !raw {
                w.sim.apply(&mut w.input);
            }
            w.input.drain();
            if let Some(f) = frame_fn.as_mut() {
                let mut fctx = FrameCtx {
                    app: &mut w.app,
                    input: &mut w.input,
                    frame: w.frame,
                };
                f(&mut fctx);
            }
            w.frame += 1;
        }
        if let Some(delay) = pacing {
            thread::sleep(delay);
        }
    }
}
