//! # Bundle Module
//!
//! A bundle borrows an ordered list of resources and drives them through a
//! chain of stages, one session at a time.
//!
//! ## Sessions
//!
//! - `load(clean)` runs `Gather → Process → Clean`
//! - `unload(clean)` runs `Unload → Clean`
//!
//! The Clean stage always ends the chain. With `clean == false` it walks an
//! empty range, so the session still ends uniformly at "no active stage".
//!
//! ## Driving a Session
//!
//! - `update()` performs at most one stage tick and never blocks. Call it once
//!   per frame to keep presenting frames while loading continues.
//! - `quick_update()` sweeps every resource synchronously and ends the session.
//!
//! ## Progress
//!
//! `completed()` counts resources that have passed the session's primary
//! stage: Process when loading, Unload when unloading. It equals `total()`
//! once a session finishes.

use crate::resource::Loadable;
use crate::stage::{Stage, StageKind, TickAction};
use crate::{Direction, GatherStatus, LoadError, LoadFailure, ProcessStatus};
use serde::Serialize;
use std::ops::Range;
use std::time::{Duration, Instant};

// =============================================================================
// STEP & PROGRESS
// =============================================================================

/// What a call to [`Bundle::update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// Waiting on background work; nothing moved.
    Stalled,
    /// One unit of work was performed.
    Worked,
    /// The active stage finished and its successor was started.
    Advanced,
    /// The session ended.
    Complete,
}

/// A snapshot of session progress for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Direction of the current or last session.
    pub direction: Option<Direction>,
    /// The active stage, `None` when idle.
    pub stage: Option<StageKind>,
    /// Label of the resource under the active cursor.
    pub current: Option<String>,
    /// Resources past the primary stage.
    pub completed: usize,
    /// Resources in the bundle.
    pub total: usize,
    /// True when no session is running.
    pub done: bool,
}

impl Progress {
    /// Completion in whole percent.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.completed.min(self.total) * 100) / self.total) as u8
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.stage, &self.current) {
            (Some(stage), Some(label)) => write!(
                f,
                "[{}/{}] {} {}",
                self.completed, self.total, stage, label
            ),
            (Some(stage), None) => write!(f, "[{}/{}] {}", self.completed, self.total, stage),
            (None, _) => write!(f, "[{}/{}] done", self.completed, self.total),
        }
    }
}

// =============================================================================
// BUNDLE
// =============================================================================

/// Orchestrates loading sessions over borrowed resources.
///
/// The bundle does not own its resources. Dropping a bundle mid-session joins
/// every outstanding background gather before the borrows are released.
pub struct Bundle<'a> {
    resources: Vec<&'a mut dyn Loadable>,
    active: Option<Stage>,
    direction: Option<Direction>,
    clean: bool,
    completed: usize,
}

impl<'a> Bundle<'a> {
    /// Create a bundle over a fixed, ordered list of resources.
    pub fn new(resources: impl IntoIterator<Item = &'a mut dyn Loadable>) -> Self {
        Self {
            resources: resources.into_iter().collect(),
            active: None,
            direction: None,
            clean: true,
            completed: 0,
        }
    }

    // =========================================================================
    // SESSION CONTROL
    // =========================================================================

    /// Start a load session.
    ///
    /// With `clean`, gathered data is discarded once every resource is processed.
    pub fn load(&mut self, clean: bool) -> Result<(), LoadError> {
        self.begin(Direction::Load, clean)
    }

    /// Start an unload session.
    ///
    /// With `clean`, leftover gathered data is discarded after unloading.
    pub fn unload(&mut self, clean: bool) -> Result<(), LoadError> {
        self.begin(Direction::Unload, clean)
    }

    fn begin(&mut self, direction: Direction, clean: bool) -> Result<(), LoadError> {
        if self.active.is_some() {
            let running = self.direction.unwrap_or(direction);
            tracing::warn!("Rejected {} session: {} in progress", direction, running);
            return Err(LoadError::SessionActive(running));
        }

        self.direction = Some(direction);
        self.clean = clean;
        self.completed = 0;

        let head = match direction {
            Direction::Load => StageKind::Gather,
            Direction::Unload => StageKind::Unload,
        };
        self.active = Some(Stage::started(head, self.range_for(head)));

        tracing::info!(
            "Started {} session over {} resources (clean: {})",
            direction,
            self.resources.len(),
            clean
        );
        Ok(())
    }

    fn range_for(&self, kind: StageKind) -> Range<usize> {
        let total = self.resources.len();
        if kind == StageKind::Clean && !self.clean {
            total..total
        } else {
            0..total
        }
    }

    fn primary_stage(&self) -> Option<StageKind> {
        match self.direction? {
            Direction::Load => Some(StageKind::Process),
            Direction::Unload => Some(StageKind::Unload),
        }
    }

    /// Replace the active stage with its successor, or end the session.
    fn advance(&mut self) {
        let next = self.active.as_ref().and_then(|stage| stage.kind().next());
        self.active = next.map(|kind| Stage::started(kind, self.range_for(kind)));

        match self.active.as_ref().map(Stage::kind) {
            Some(kind) => tracing::debug!("Entered {} stage", kind),
            None => self.finish(),
        }
    }

    fn finish(&mut self) {
        self.active = None;
        let failures = self.failures().len();
        if failures > 0 {
            tracing::warn!(
                "Finished {} session: {}/{} resources, {} failed",
                self.direction.map_or("unknown", |d| d.name()),
                self.completed,
                self.resources.len(),
                failures
            );
        } else {
            tracing::info!(
                "Finished {} session: {}/{} resources",
                self.direction.map_or("unknown", |d| d.name()),
                self.completed,
                self.resources.len()
            );
        }
    }

    // =========================================================================
    // ADVANCEMENT
    // =========================================================================

    /// Perform at most one unit of work.
    ///
    /// Stages that are already finished are chained through first without
    /// doing work. A tick that finishes a stage starts its successor but does
    /// not work on it in the same call.
    pub fn update(&mut self) -> Result<Step, LoadError> {
        if self.active.is_none() {
            return Err(LoadError::NoSession);
        }

        while self.active.as_ref().is_some_and(Stage::is_done) {
            self.advance();
        }

        let primary = self.primary_stage();
        let Some(stage) = self.active.as_mut() else {
            return Ok(Step::Complete);
        };

        let tick = stage.tick(&mut self.resources);
        if Some(stage.kind()) == primary {
            self.completed += tick.advanced;
        }

        if !stage.is_done() {
            return Ok(match tick.action {
                TickAction::Stalled => Step::Stalled,
                TickAction::Loaded(_) | TickAction::Drained => Step::Worked,
            });
        }

        self.advance();
        Ok(if self.active.is_none() {
            Step::Complete
        } else {
            Step::Advanced
        })
    }

    /// Call [`update`](Self::update) until the session ends, a tick stalls,
    /// or `budget` has elapsed. Returns the number of updates performed.
    ///
    /// At least one update runs, so a zero budget behaves like `update()`.
    pub fn update_for(&mut self, budget: Duration) -> Result<usize, LoadError> {
        let started = Instant::now();
        let mut updates = 0usize;

        loop {
            let step = self.update()?;
            updates += 1;
            if matches!(step, Step::Stalled | Step::Complete) || started.elapsed() >= budget {
                return Ok(updates);
            }
        }
    }

    /// Run the whole session synchronously.
    ///
    /// Loading gathers (inline), joins and processes every resource, then
    /// discards gathered data if the session is clean. Unloading unloads every
    /// processed resource, then discards leftovers if clean. The session ends
    /// unconditionally; resources whose steps failed are returned.
    pub fn quick_update(&mut self) -> Result<Vec<LoadFailure>, LoadError> {
        let Some(direction) = self.direction.filter(|_| self.active.is_some()) else {
            return Err(LoadError::NoSession);
        };

        for resource in &mut self.resources {
            match direction {
                Direction::Load => {
                    resource.quick_gather();
                    resource.join();
                    if resource.process_status() == ProcessStatus::Unprocessed {
                        resource.process();
                    }
                    if self.clean {
                        resource.discard();
                    }
                }
                Direction::Unload => {
                    if resource.process_status() == ProcessStatus::Processed {
                        resource.unload();
                    }
                    if self.clean && resource.gather_status() != GatherStatus::Ungathered {
                        resource.discard();
                    }
                }
            }
        }

        self.completed = self.resources.len();
        self.finish();
        Ok(self.failures())
    }

    /// Wait for every outstanding background gather.
    ///
    /// The session, if any, stays active; the next `update` sees the joined
    /// resources as gathered.
    pub fn join_all(&mut self) {
        for resource in &mut self.resources {
            resource.join();
        }
    }

    // =========================================================================
    // INTROSPECTION
    // =========================================================================

    /// The resource under the active stage's cursor. `None` when idle.
    #[must_use]
    pub fn current(&self) -> Option<&dyn Loadable> {
        let stage = self.active.as_ref()?;
        self.resources.get(stage.cursor()).map(as_dyn)
    }

    /// The active stage, `None` when idle.
    #[must_use]
    pub fn stage(&self) -> Option<StageKind> {
        self.active.as_ref().map(Stage::kind)
    }

    /// Direction of the current or most recent session.
    #[must_use]
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Number of resources in the bundle.
    #[must_use]
    pub fn total(&self) -> usize {
        self.resources.len()
    }

    /// Resources past the session's primary stage.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// True when no session is running.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.active.is_none()
    }

    /// Get a resource by position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&dyn Loadable> {
        self.resources.get(index).map(as_dyn)
    }

    /// Iterate over the bundle's resources in order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Loadable> {
        self.resources.iter().map(as_dyn)
    }

    /// Resources currently carrying a recorded failure.
    #[must_use]
    pub fn failures(&self) -> Vec<LoadFailure> {
        self.resources
            .iter()
            .enumerate()
            .filter_map(|(index, r)| {
                r.error().map(|error| LoadFailure {
                    index,
                    label: r.label().to_string(),
                    error: error.clone(),
                })
            })
            .collect()
    }

    /// Snapshot of session progress.
    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress {
            direction: self.direction,
            stage: self.stage(),
            current: self.current().map(|r| r.label().to_string()),
            completed: self.completed,
            total: self.resources.len(),
            done: self.is_done(),
        }
    }
}

fn as_dyn<'s>(resource: &'s &mut dyn Loadable) -> &'s dyn Loadable {
    &**resource
}

impl Drop for Bundle<'_> {
    fn drop(&mut self) {
        if self.active.is_some() {
            tracing::warn!("Bundle dropped mid-session; joining outstanding gathers");
            self.join_all();
        }
    }
}

impl std::fmt::Debug for Bundle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundle")
            .field("total", &self.resources.len())
            .field("active", &self.active)
            .field("direction", &self.direction)
            .field("clean", &self.clean)
            .field("completed", &self.completed)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
