//! # Frame Driver
//!
//! Drives one bundle session the way a game loop would: a fixed frame clock,
//! a bounded number of bundle updates per frame, and a progress callback
//! after each frame. Quick mode runs the whole session in a single sweep.
//!
//! A shutdown future (Ctrl+C in the binary) ends the loop early. Outstanding
//! gathers are joined before returning; the session itself is left open.

use crate::AppError;
use crate::manifest::{LoaderConfig, Mode};
use frameload_core::{Bundle, Direction, LoadFailure, Progress, Step};
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

/// Frame pacing and sweep settings for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverOptions {
    pub mode: Mode,
    pub clean: bool,
    pub fps: u32,
    pub ticks_per_frame: u32,
}

impl DriverOptions {
    /// Take driver settings from the manifest's `[loader]` section.
    #[must_use]
    pub fn from_config(config: &LoaderConfig) -> Self {
        Self {
            mode: config.mode,
            clean: config.clean,
            fps: config.fps,
            ticks_per_frame: config.ticks_per_frame,
        }
    }

    /// Duration of one frame.
    #[must_use]
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }
}

/// Outcome of one driven session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub direction: Direction,
    pub mode: Mode,
    /// Frames presented while the session ran.
    pub frames: u64,
    /// Bundle updates performed.
    pub ticks: u64,
    /// Updates that found nothing to do but wait.
    pub stalls: u64,
    pub completed: usize,
    pub total: usize,
    pub failures: Vec<LoadFailure>,
    pub elapsed_ms: u64,
    /// True when the shutdown signal cut the session short.
    pub interrupted: bool,
}

impl SessionReport {
    fn new(direction: Direction, mode: Mode, total: usize) -> Self {
        Self {
            direction,
            mode,
            frames: 0,
            ticks: 0,
            stalls: 0,
            completed: 0,
            total,
            failures: Vec::new(),
            elapsed_ms: 0,
            interrupted: false,
        }
    }
}

/// Start a session in `direction` and drive it to the end.
///
/// `on_frame` receives a progress snapshot after every frame. Returns when
/// the session completes or `shutdown` resolves, whichever comes first.
pub async fn run_session<S, F>(
    bundle: &mut Bundle<'_>,
    direction: Direction,
    opts: &DriverOptions,
    shutdown: S,
    mut on_frame: F,
) -> Result<SessionReport, AppError>
where
    S: Future<Output = ()>,
    F: FnMut(&Progress),
{
    let started = Instant::now();
    match direction {
        Direction::Load => bundle.load(opts.clean)?,
        Direction::Unload => bundle.unload(opts.clean)?,
    }

    let mut report = SessionReport::new(direction, opts.mode, bundle.total());

    match opts.mode {
        Mode::Quick => {
            report.failures = bundle.quick_update()?;
            report.frames = 1;
            report.ticks = 1;
            on_frame(&bundle.progress());
        }
        Mode::Incremental => {
            let mut clock = tokio::time::interval(opts.frame_period());
            clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tokio::pin!(shutdown);

            while !bundle.is_done() {
                tokio::select! {
                    _ = clock.tick() => {}
                    () = &mut shutdown => {
                        tracing::warn!(
                            "Interrupted {} session at {}",
                            direction,
                            bundle.progress()
                        );
                        bundle.join_all();
                        report.interrupted = true;
                        break;
                    }
                }

                report.frames += 1;
                for _ in 0..opts.ticks_per_frame {
                    let step = bundle.update()?;
                    report.ticks += 1;
                    match step {
                        Step::Stalled => {
                            report.stalls += 1;
                            break;
                        }
                        Step::Complete => break,
                        Step::Worked | Step::Advanced => {}
                    }
                }
                on_frame(&bundle.progress());
            }
            report.failures = bundle.failures();
        }
    }

    report.completed = bundle.completed();
    report.elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::debug!(
        "{} session: {} frames, {} ticks, {} stalls in {}ms",
        direction,
        report.frames,
        report.ticks,
        report.stalls,
        report.elapsed_ms
    );
    Ok(report)
}

/// Resolve when the process receives Ctrl+C.
///
/// If the signal handler cannot be installed the future never resolves.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

// =============================================================================
// TESTS
// =============================================================================
