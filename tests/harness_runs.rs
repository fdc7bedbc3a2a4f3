//! Scheduler behavior: suspend protocol, budgets, checks, abort.
//!
//! The application under test is a small counter struct whose frame function
//! records what it observed each frame, so the tests can assert on the exact
//! frame-by-frame interleaving the protocol promises.
//!
//! Run with: cargo test --test harness_runs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use framedrive::{
    Harness, KeyCode, PointerPos, RunConfig, RunFlags, RunStatus, Test,
};

/// Application under test: counts frames and logs observed input.
#[derive(Default)]
struct App {
    frames_run: u64,
    min_frame_seen: i64,
    button0_log: Vec<bool>,
    key_a_log: Vec<bool>,
}

fn observing_test(name: &str, driver: impl FnOnce(&mut framedrive::DriverCtx<App>) + Send + 'static) -> Test<App> {
    Test::new(name, driver).with_frame(|fc| {
        let frame = fc.frame();
        let button = fc.input().button_down(0);
        let key = fc.input().key_down(KeyCode::A);
        fc.app.frames_run += 1;
        fc.app.min_frame_seen = fc.app.min_frame_seen.min(frame);
        fc.app.button0_log.push(button);
        fc.app.key_a_log.push(key);
    })
}

// =============================================================================
// Suspend protocol
// =============================================================================

#[test]
fn yield_four_pumps_exactly_four_frames() {
    let mut harness = Harness::new(App::default);
    let report = harness.run(observing_test("yield_four", |ctx| {
        let before_frames = ctx.app(|a| a.frames_run);
        let before_frame = ctx.frame();
        ctx.yield_frames(4);
        ctx.check_eq(ctx.app(|a| a.frames_run), before_frames + 4, "frame fn ran 4 times");
        ctx.check_eq(ctx.frame(), before_frame + 4, "frame counter advanced by 4");
    }));
    assert_eq!(report.status, RunStatus::Success, "{:?}", report.failures);
}

#[test]
fn yield_zero_clamps_to_one_frame() {
    let mut harness = Harness::new(App::default);
    let report = harness.run(observing_test("yield_zero", |ctx| {
        let before = ctx.frame();
        ctx.yield_frames(0);
        ctx.check_eq(ctx.frame(), before + 1, "one frame elapsed");
    }));
    assert!(report.passed(), "{:?}", report.failures);
}

#[test]
fn warmup_frames_run_before_the_driver() {
    let mut harness = Harness::new(App::default);
    let report = harness.run(observing_test("warmup", |ctx| {
        ctx.check_eq(ctx.frame(), 0, "driver starts at frame 0");
        ctx.check_eq(ctx.app(|a| a.frames_run), 2, "two warm-up frames ran");
        ctx.check_eq(ctx.app(|a| a.min_frame_seen), -2, "warm-up counts down from -2");
    }));
    assert!(report.passed(), "{:?}", report.failures);
}

#[test]
fn no_warmup_flag_skips_the_settle_frames() {
    let mut harness = Harness::new(App::default);
    let test = observing_test("no_warmup", |ctx| {
        ctx.check_eq(ctx.frame(), 0, "driver starts at frame 0");
        ctx.check_eq(ctx.app(|a| a.frames_run), 0, "no frames ran yet");
    })
    .with_flags(RunFlags::NO_WARMUP);
    let report = harness.run(test);
    assert!(report.passed(), "{:?}", report.failures);
}

#[test]
fn events_pushed_before_yield_are_visible_on_the_first_pumped_frame() {
    let mut harness = Harness::new(App::default);
    let test = observing_test("visibility", |ctx| {
        ctx.push_key(KeyCode::A, true).unwrap();
        ctx.yield_once();
        let seen = ctx.app(|a| *a.key_a_log.last().unwrap());
        ctx.check(seen, "frame fn observed the key on the first pumped frame");
    })
    .with_flags(RunFlags::RAW_INPUTS);
    let report = harness.run(test);
    assert!(report.passed(), "{:?}", report.failures);
}

// =============================================================================
// End-to-end coalescing through the harness (raw inputs)
// =============================================================================

#[test]
fn button_then_move_shows_the_two_frame_pattern() {
    let mut harness = Harness::new(App::default);
    let test = observing_test("button_then_move", |ctx| {
        ctx.push_pointer_move(100.0, 100.0);
        ctx.yield_once();
        ctx.check_eq(ctx.pointer_pos(), PointerPos::new(100.0, 100.0), "settled position");

        ctx.push_pointer_button(0, true).unwrap();
        ctx.push_pointer_move(150.0, 150.0);

        ctx.yield_once();
        ctx.check_eq(ctx.pointer_pos(), PointerPos::new(100.0, 100.0), "old position first");
        ctx.check(ctx.button_down(0), "button down on the first frame");

        ctx.yield_once();
        ctx.check_eq(ctx.pointer_pos(), PointerPos::new(150.0, 150.0), "new position second");
        ctx.check(ctx.button_down(0), "button still down");
    })
    .with_flags(RunFlags::RAW_INPUTS);
    let report = harness.run(test);
    assert!(report.passed(), "{:?}", report.failures);
}

#[test]
fn key_toggles_replay_one_transition_per_frame() {
    let mut harness = Harness::new(App::default);
    let test = observing_test("key_toggles", |ctx| {
        ctx.push_key(KeyCode::A, true).unwrap();
        ctx.push_key(KeyCode::A, false).unwrap();
        ctx.push_key(KeyCode::A, true).unwrap();

        ctx.yield_once();
        ctx.check(ctx.key_down(KeyCode::A), "frame 1: down");
        ctx.yield_once();
        ctx.check(!ctx.key_down(KeyCode::A), "frame 2: up");
        ctx.yield_once();
        ctx.check(ctx.key_down(KeyCode::A), "frame 3: down again");
    })
    .with_flags(RunFlags::RAW_INPUTS);
    let report = harness.run(test);
    assert!(report.passed(), "{:?}", report.failures);
}

#[test]
fn wheel_pulse_observed_through_the_harness() {
    let mut harness = Harness::new(App::default);
    let test = observing_test("wheel_pulse", |ctx| {
        ctx.push_wheel(0.0, 1.0);
        ctx.push_wheel(0.0, 1.0);
        ctx.yield_once();
        ctx.check_eq(ctx.wheel(), (0.0, 2.0), "accumulated delta");
        ctx.yield_once();
        ctx.check_eq(ctx.wheel(), (0.0, 0.0), "pulse reset");
    })
    .with_flags(RunFlags::RAW_INPUTS);
    let report = harness.run(test);
    assert!(report.passed(), "{:?}", report.failures);
}

// =============================================================================
// Convenience input synthesis
// =============================================================================

#[test]
fn simulated_buttons_persist_without_republishing() {
    let mut harness = Harness::new(App::default);
    let report = harness.run(observing_test("synthesis", |ctx| {
        ctx.press_button(0);
        ctx.yield_frames(3);
        ctx.check(ctx.button_down(0), "button held by synthesis");
        // Re-application is filtered to nothing while state matches.
        ctx.check_eq(ctx.queue_len(), 0, "no queue growth from synthesis");
        let log = ctx.app(|a| a.button0_log.clone());
        ctx.check(log.iter().rev().take(3).all(|&b| b), "frame fn saw it held");

        ctx.release_button(0);
        ctx.check(!ctx.button_down(0), "released");
    }));
    assert!(report.passed(), "{:?}", report.failures);
}

#[test]
fn pointer_to_moves_the_settled_pointer() {
    let mut harness = Harness::new(App::default);
    let report = harness.run(observing_test("pointer_to", |ctx| {
        ctx.pointer_to(33.0, 44.0);
        ctx.check_eq(ctx.pointer_pos(), PointerPos::new(33.0, 44.0), "pointer followed");
        ctx.yield_frames(2);
        ctx.check_eq(ctx.pointer_pos(), PointerPos::new(33.0, 44.0), "pointer stays");
    }));
    assert!(report.passed(), "{:?}", report.failures);
}

// =============================================================================
// Checks, failures, budgets, abort
// =============================================================================

#[test]
fn failed_check_records_frame_and_run_continues() {
    let mut harness = Harness::new(App::default);
    let ran_after_failure = Arc::new(AtomicBool::new(false));
    let ran = ran_after_failure.clone();
    let report = harness.run(observing_test("check_failure", move |ctx| {
        ctx.yield_frames(3);
        ctx.check_eq(1 + 1, 3, "arithmetic is broken");
        ran.store(true, Ordering::SeqCst);
        ctx.check(true, "still checking");
    }));
    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].frame, 3);
    assert!(report.failures[0].message.contains("arithmetic"));
    assert!(ran_after_failure.load(Ordering::SeqCst));
}

#[test]
fn stop_on_failure_aborts_at_the_first_failed_check() {
    let mut harness = Harness::new(App::default).with_config(RunConfig {
        stop_on_failure: true,
        ..RunConfig::default()
    });
    let ran_after_failure = Arc::new(AtomicBool::new(false));
    let ran = ran_after_failure.clone();
    let report = harness.run(observing_test("stop_on_failure", move |ctx| {
        ctx.check(false, "first failure");
        ran.store(true, Ordering::SeqCst);
    }));
    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.failures.len(), 1);
    assert!(!ran_after_failure.load(Ordering::SeqCst));
}

#[test]
fn driver_panic_is_contained_and_reported() {
    let mut harness = Harness::new(App::default);
    let report = harness.run(observing_test("panic", |ctx| {
        ctx.yield_once();
        panic!("driver blew up");
    }));
    assert_eq!(report.status, RunStatus::Failed);
    assert!(report.failures[0].message.contains("driver blew up"));
}

#[test]
fn frame_budget_overrun_reports_hung() {
    let mut harness = Harness::new(App::default).with_config(RunConfig {
        max_frames: 10,
        ..RunConfig::default()
    });
    let report = harness.run(observing_test("frame_budget", |ctx| {
        for _ in 0..1000 {
            ctx.yield_once();
        }
    }));
    assert_eq!(report.status, RunStatus::Hung);
}

#[test]
fn wall_clock_budget_overrun_reports_hung() {
    let mut harness = Harness::new(App::default).with_config(RunConfig {
        hang_timeout: Duration::from_millis(50),
        ..RunConfig::default()
    });
    let report = harness.run(observing_test("hang", |ctx| {
        thread::sleep(Duration::from_millis(400));
        ctx.yield_once(); // unwinds: the run is already aborted
        unreachable!("driver must not be resumed after an abort");
    }));
    assert_eq!(report.status, RunStatus::Hung);
}

#[test]
fn abort_handle_stops_the_run_from_outside() {
    let mut harness = Harness::new(App::default).with_config(RunConfig {
        max_frames: u64::MAX,
        frame_pacing: Some(Duration::from_millis(1)),
        ..RunConfig::default()
    });
    let handle = harness.abort_handle();
    let aborter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        handle.abort();
    });
    let report = harness.run(observing_test("external_abort", |ctx| {
        loop {
            ctx.yield_once();
        }
    }));
    aborter.join().unwrap();
    assert_eq!(report.status, RunStatus::Aborted);

    // The abort is consumed; the harness runs the next test normally.
    let report = harness.run(observing_test("after_abort", |ctx| {
        ctx.yield_once();
    }));
    assert!(report.passed(), "{:?}", report.failures);
}

// =============================================================================
// Suites
// =============================================================================

#[test]
fn failed_runs_do_not_stop_the_suite_by_default() {
    let mut harness = Harness::new(App::default);
    let reports = harness.run_all(vec![
        observing_test("first_fails", |ctx| {
            ctx.check(false, "deliberate failure");
        }),
        observing_test("second_passes", |ctx| {
            ctx.yield_once();
        }),
    ]);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].status, RunStatus::Failed);
    assert_eq!(reports[1].status, RunStatus::Success);
}

#[test]
fn stop_suite_on_failure_halts_after_the_first_bad_run() {
    let mut harness = Harness::new(App::default).with_config(RunConfig {
        stop_suite_on_failure: true,
        ..RunConfig::default()
    });
    let reports = harness.run_all(vec![
        observing_test("first_fails", |ctx| {
            ctx.check(false, "deliberate failure");
        }),
        observing_test("never_runs", |ctx| {
            ctx.yield_once();
        }),
    ]);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].status, RunStatus::Failed);
}

#[test]
fn fresh_app_per_run() {
    let mut harness = Harness::new(App::default);
    let reports = harness.run_all(vec![
        observing_test("dirty", |ctx| {
            ctx.app_mut(|a| a.frames_run += 1000);
            ctx.yield_once();
        }),
        observing_test("clean", |ctx| {
            ctx.check(ctx.app(|a| a.frames_run) < 1000, "state did not leak between runs");
        }),
    ]);
    assert!(
        reports.iter().all(|r| r.passed()),
        "{:?}",
        reports.iter().map(|r| (&r.name, r.status)).collect::<Vec<_>>()
    );
}
