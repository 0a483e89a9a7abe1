//! # Stage Module
//!
//! One phase of a loading session, walked over a contiguous range of a
//! bundle's resources.
//!
//! ## Stage Definitions
//!
//! | Stage | Waits while | Skips a resource when | Work |
//! |-------|-------------|-----------------------|------|
//! | Gather | current resource is `Gathering` | no gather step, or `Gathered` (joins it) | `gather()` |
//! | Process | never | `Processed` | `process()` |
//! | Clean | never | `Ungathered` | `discard()` |
//! | Unload | never | `Unprocessed` | `unload()` |
//!
//! ## Tick Semantics
//!
//! A tick stalls if the stage is waiting, otherwise skips past every resource
//! that needs no work and performs one unit of work on the first one that does.
//! The cursor never moves past a resource in the same tick that worked on it:
//! the next tick sees the changed status and skips it. Each resource needing
//! work therefore costs at least two ticks.

use crate::resource::Loadable;
use crate::{GatherStatus, ProcessStatus};
use serde::{Deserialize, Serialize};
use std::ops::Range;

// =============================================================================
// STAGE KIND
// =============================================================================

/// The four pipeline steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    /// Background fetch of raw data.
    Gather,
    /// Foreground finalization.
    Process,
    /// Release of gathered data.
    Clean,
    /// Release of finalized state.
    Unload,
}

impl StageKind {
    /// Get the stage name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Gather => "gather",
            StageKind::Process => "process",
            StageKind::Clean => "clean",
            StageKind::Unload => "unload",
        }
    }

    /// Get the stage that follows this one, if any.
    ///
    /// Loading runs `Gather → Process → Clean`, unloading `Unload → Clean`.
    #[must_use]
    pub fn next(&self) -> Option<StageKind> {
        match self {
            StageKind::Gather => Some(StageKind::Process),
            StageKind::Process | StageKind::Unload => Some(StageKind::Clean),
            StageKind::Clean => None,
        }
    }

    /// Check if this stage ends a session.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    fn wait(&self, current: Option<&dyn Loadable>) -> bool {
        match self {
            StageKind::Gather => {
                current.is_some_and(|r| r.gather_status() == GatherStatus::Gathering)
            }
            StageKind::Process | StageKind::Clean | StageKind::Unload => false,
        }
    }

    fn skip(&self, resource: &mut dyn Loadable) -> bool {
        match self {
            StageKind::Gather => {
                if !resource.has_gather() {
                    return true;
                }
                if resource.gather_status() == GatherStatus::Gathered {
                    resource.join();
                    return true;
                }
                false
            }
            StageKind::Process => resource.process_status() == ProcessStatus::Processed,
            StageKind::Clean => resource.gather_status() == GatherStatus::Ungathered,
            StageKind::Unload => resource.process_status() == ProcessStatus::Unprocessed,
        }
    }

    fn load(&self, resource: &mut dyn Loadable) {
        match self {
            StageKind::Gather => resource.gather(),
            StageKind::Process => resource.process(),
            StageKind::Clean => resource.discard(),
            StageKind::Unload => resource.unload(),
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// TICK OUTCOME
// =============================================================================

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// The stage was waiting on background work; nothing moved.
    Stalled,
    /// One unit of work was performed on the resource at this index.
    Loaded(usize),
    /// The cursor reached the end without performing work.
    Drained,
}

/// Result of [`Stage::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// What the tick did.
    pub action: TickAction,
    /// How many resources the cursor moved past.
    pub advanced: usize,
}

// =============================================================================
// STAGE
// =============================================================================

/// A stage with its cursor over the bundle's resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    kind: StageKind,
    start: usize,
    cursor: usize,
    end: usize,
}

impl Stage {
    /// Create a stage over the given range.
    #[must_use]
    pub fn started(kind: StageKind, range: Range<usize>) -> Self {
        let mut stage = Self {
            kind,
            start: 0,
            cursor: 0,
            end: 0,
        };
        stage.start(range);
        stage
    }

    /// Reset the cursor to the beginning of `range`.
    ///
    /// An inverted range is treated as empty.
    pub fn start(&mut self, range: Range<usize>) {
        self.start = range.start;
        self.cursor = range.start;
        self.end = range.end.max(range.start);
    }

    /// Get the stage kind.
    #[must_use]
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    /// Get the cursor position.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Get the range this stage walks.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Number of resources the cursor has moved past.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.cursor - self.start
    }

    /// Check if the cursor reached the end.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cursor == self.end
    }

    /// Perform at most one unit of work.
    ///
    /// `resources` must cover the stage's range.
    pub fn tick(&mut self, resources: &mut [&mut dyn Loadable]) -> Tick {
        let end = self.end.min(resources.len());
        let current = resources.get(self.cursor).map(|r| &**r);
        if self.cursor < end && self.kind.wait(current) {
            return Tick {
                action: TickAction::Stalled,
                advanced: 0,
            };
        }

        let from = self.cursor;
        while self.cursor < end && self.kind.skip(&mut *resources[self.cursor]) {
            self.cursor += 1;
        }
        let advanced = self.cursor - from;

        if self.cursor < end {
            tracing::trace!(
                "{} stage working on {}",
                self.kind,
                resources[self.cursor].label()
            );
            self.kind.load(&mut *resources[self.cursor]);
            return Tick {
                action: TickAction::Loaded(self.cursor),
                advanced,
            };
        }

        // Out-of-range ends are clamped so the stage can still finish.
        self.cursor = self.end;
        Tick {
            action: TickAction::Drained,
            advanced,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AssetError;

    /// Status-only resource that records the operations stages invoke.
    #[derive(Default)]
    struct Probe {
        gathers: bool,
        gather: Option<GatherStatus>,
        processed: bool,
        calls: Vec<&'static str>,
    }

    impl Probe {
        fn with_gather() -> Self {
            Self {
                gathers: true,
                ..Self::default()
            }
        }
    }

    impl Loadable for Probe {
        fn label(&self) -> &str {
            "probe"
        }
        fn has_gather(&self) -> bool {
            self.gathers
        }
        fn gather_status(&self) -> GatherStatus {
            self.gather.unwrap_or(GatherStatus::Ungathered)
        }
        fn process_status(&self) -> ProcessStatus {
            if self.processed {
                ProcessStatus::Processed
            } else {
                ProcessStatus::Unprocessed
            }
        }
        fn error(&self) -> Option<&AssetError> {
            None
        }
        fn gather(&mut self) {
            self.calls.push("gather");
            self.gather = Some(GatherStatus::Gathering);
        }
        fn quick_gather(&mut self) {
            self.calls.push("quick_gather");
            self.gather = Some(GatherStatus::Gathered);
        }
        fn join(&mut self) {
            self.calls.push("join");
        }
        fn discard(&mut self) {
            self.calls.push("discard");
            self.gather = None;
        }
        fn process(&mut self) {
            self.calls.push("process");
            self.processed = true;
        }
        fn unload(&mut self) {
            self.calls.push("unload");
            self.processed = false;
        }
    }

    #[test]
    fn chains_end_at_clean() {
        assert_eq!(StageKind::Gather.next(), Some(StageKind::Process));
        assert_eq!(StageKind::Process.next(), Some(StageKind::Clean));
        assert_eq!(StageKind::Unload.next(), Some(StageKind::Clean));
        assert!(StageKind::Clean.is_terminal());
        assert!(!StageKind::Unload.is_terminal());
    }

    #[test]
    fn empty_range_is_done_immediately() {
        let stage = Stage::started(StageKind::Clean, 3..3);
        assert!(stage.is_done());
        assert_eq!(stage.passed(), 0);

        let inverted = Stage::started(StageKind::Clean, 3..1);
        assert!(inverted.is_done());
    }

    #[test]
    fn process_needs_two_ticks_per_resource() {
        let mut a = Probe::default();
        let mut b = Probe::default();
        let mut resources: Vec<&mut dyn Loadable> = vec![&mut a, &mut b];
        let mut stage = Stage::started(StageKind::Process, 0..2);

        let tick = stage.tick(&mut resources);
        assert_eq!(tick.action, TickAction::Loaded(0));
        assert_eq!(stage.cursor(), 0);

        let tick = stage.tick(&mut resources);
        assert_eq!(tick.action, TickAction::Loaded(1));
        assert_eq!(tick.advanced, 1);

        let tick = stage.tick(&mut resources);
        assert_eq!(tick.action, TickAction::Drained);
        assert!(stage.is_done());
        assert_eq!(stage.passed(), 2);
    }

    #[test]
    fn gather_stalls_while_gathering() {
        let mut a = Probe::with_gather();
        let mut resources: Vec<&mut dyn Loadable> = vec![&mut a];
        let mut stage = Stage::started(StageKind::Gather, 0..1);

        assert_eq!(stage.tick(&mut resources).action, TickAction::Loaded(0));
        assert_eq!(stage.tick(&mut resources).action, TickAction::Stalled);
        assert_eq!(stage.tick(&mut resources).action, TickAction::Stalled);
        drop(resources);

        a.gather = Some(GatherStatus::Gathered);
        let mut resources: Vec<&mut dyn Loadable> = vec![&mut a];
        assert_eq!(stage.tick(&mut resources).action, TickAction::Drained);
        drop(resources);
        assert_eq!(a.calls, vec!["gather", "join"]);
    }

    #[test]
    fn gather_skips_resources_without_gather_step() {
        let mut a = Probe::default();
        let mut b = Probe::default();
        let mut resources: Vec<&mut dyn Loadable> = vec![&mut a, &mut b];
        let mut stage = Stage::started(StageKind::Gather, 0..2);

        let tick = stage.tick(&mut resources);
        assert_eq!(tick.action, TickAction::Drained);
        assert_eq!(tick.advanced, 2);
        drop(resources);
        assert!(a.calls.is_empty());
    }

    #[test]
    fn clean_and_unload_skip_idle_resources() {
        let mut a = Probe::default();
        let mut resources: Vec<&mut dyn Loadable> = vec![&mut a];

        let mut clean = Stage::started(StageKind::Clean, 0..1);
        assert_eq!(clean.tick(&mut resources).action, TickAction::Drained);

        let mut unload = Stage::started(StageKind::Unload, 0..1);
        assert_eq!(unload.tick(&mut resources).action, TickAction::Drained);
    }

    #[test]
    fn end_beyond_resources_is_clamped() {
        let mut a = Probe::default();
        let mut resources: Vec<&mut dyn Loadable> = vec![&mut a];
        let mut stage = Stage::started(StageKind::Unload, 0..5);

        assert_eq!(stage.tick(&mut resources).action, TickAction::Drained);
        assert!(stage.is_done());
    }
}
