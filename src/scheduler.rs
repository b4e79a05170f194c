//! Compilation Scheduler
//!
//! Collapses edit bursts into one trailing compile attempt, skips attempts whose
//! file set is unchanged, and stops compile loops with a [`BurstGuard`]. Time is
//! passed in explicitly; the host loop owns the real timers.

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::PreviewConfig;
use crate::files::FileSet;
use crate::guard::{BurstGuard, GuardVerdict};
use crate::hash::Fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCompile {
    pub deadline: Instant,
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileDecision {
    /// Send this snapshot to the compile unit.
    Dispatch(FileSet),
    /// Same content as the last dispatch and not forced.
    Unchanged,
    NotReady,
    /// This attempt tripped the loop guard.
    LoopDetected,
    /// The loop guard is cooling down.
    Suppressed,
}

#[derive(Debug)]
pub struct CompilationScheduler {
    debounce: std::time::Duration,
    guard: BurstGuard,
    last_dispatched: Option<Fingerprint>,
    pending: Option<PendingCompile>,
}

impl CompilationScheduler {
    pub fn new(config: &PreviewConfig) -> Self {
        Self {
            debounce: config.debounce(),
            guard: BurstGuard::new(config.compile_guard),
            last_dispatched: None,
            pending: None,
        }
    }

    /// Restart the debounce timer. The latest call's `force` wins.
    pub fn request_compile(&mut self, force: bool, now: Instant) {
        self.pending = Some(PendingCompile {
            deadline: now + self.debounce,
            force,
        });
    }

    pub fn pending(&self) -> Option<PendingCompile> {
        self.pending
    }

    /// Drop the pending request before its timer fires.
    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    /// Take the pending request if its timer has fired.
    pub fn due(&mut self, now: Instant) -> Option<bool> {
        match self.pending {
            Some(pending) if pending.deadline <= now => {
                self.pending = None;
                Some(pending.force)
            }
            _ => None,
        }
    }

    pub fn try_compile(
        &mut self,
        files: &FileSet,
        force: bool,
        ready: bool,
        now: Instant,
    ) -> CompileDecision {
        if !ready {
            return CompileDecision::NotReady;
        }

        match self.guard.check(now) {
            GuardVerdict::Allowed => {}
            GuardVerdict::Tripped => {
                warn!(burst = self.guard.burst(), "compile loop detected");
                return CompileDecision::LoopDetected;
            }
            GuardVerdict::Suppressed => return CompileDecision::Suppressed,
        }

        let fingerprint = files.fingerprint();
        let changed = self.last_dispatched != Some(fingerprint);
        debug!(%fingerprint, changed, force, "compile attempt");

        if changed || force {
            self.last_dispatched = Some(fingerprint);
            CompileDecision::Dispatch(files.clone())
        } else {
            CompileDecision::Unchanged
        }
    }

    pub fn last_dispatched(&self) -> Option<Fingerprint> {
        self.last_dispatched
    }

    /// Make the next attempt dispatch even with unchanged content.
    pub fn forget_last_dispatch(&mut self) {
        self.last_dispatched = None;
    }

    pub fn cooldown_deadline(&self) -> Option<Instant> {
        self.guard.cooldown_deadline()
    }

    pub fn end_cooldown(&mut self) {
        self.guard.end_cooldown();
    }
}
