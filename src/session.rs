//! Preview Session
//!
//! The main-context state machine. It owns the current file snapshot, the
//! [`CompilationScheduler`], the [`PreviewRenderer`], the compiled artifact
//! and the single current-error slot, and it talks to the compile unit only
//! through a [`CompileDispatch`].
//!
//! Nothing here sleeps. Callers pass the current instant and drive timers via
//! [`PreviewSession::next_deadline`] and [`PreviewSession::poll_timers`]; see
//! `host::run` for the async driver.
//!
//! Results are sequence-tagged: a result older than the last applied one is
//! dropped, otherwise results apply in arrival order.

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::PreviewConfig;
use crate::error::PreviewError;
use crate::files::FileSet;
use crate::renderer::{
    CompiledArtifact, PreviewRenderer, PreviewSurface, RenderOutcome, ResetOutcome,
};
use crate::scheduler::{CompilationScheduler, CompileDecision};
use crate::worker::{CompileDispatch, CompileOutcome, CompileRequest, CompileResponse};

pub struct PreviewSession<D, S> {
    files: FileSet,
    scheduler: CompilationScheduler,
    renderer: PreviewRenderer<S>,
    dispatcher: D,
    artifact: Option<CompiledArtifact>,
    error: Option<PreviewError>,
    next_sequence: u64,
    last_applied: Option<u64>,
}

impl<D: CompileDispatch, S: PreviewSurface> PreviewSession<D, S> {
    pub fn new(config: PreviewConfig, dispatcher: D, surface: S) -> Self {
        Self {
            files: FileSet::new(),
            scheduler: CompilationScheduler::new(&config),
            renderer: PreviewRenderer::new(surface, config),
            dispatcher,
            artifact: None,
            error: None,
            next_sequence: 1,
            last_applied: None,
        }
    }

    pub fn with_files(mut self, files: FileSet) -> Self {
        self.files = files;
        self
    }

    // ─── accessors ───────────────────────────────────────────────────────────

    pub fn files(&self) -> &FileSet {
        &self.files
    }

    pub fn error(&self) -> Option<&PreviewError> {
        self.error.as_ref()
    }

    pub fn artifact(&self) -> Option<&CompiledArtifact> {
        self.artifact.as_ref()
    }

    pub fn scheduler(&self) -> &CompilationScheduler {
        &self.scheduler
    }

    pub fn renderer(&self) -> &PreviewRenderer<S> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut PreviewRenderer<S> {
        &mut self.renderer
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }

    pub fn last_applied(&self) -> Option<u64> {
        self.last_applied
    }

    pub fn into_parts(self) -> (D, S) {
        (self.dispatcher, self.renderer.into_surface())
    }

    /// Dismiss the current error.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    // ─── triggers ────────────────────────────────────────────────────────────

    /// Replace the snapshot without scheduling a compile.
    pub fn set_files(&mut self, files: FileSet) {
        self.files = files;
    }

    /// Replace the snapshot and schedule a compile.
    pub fn files_changed(&mut self, files: FileSet, now: Instant) {
        debug!(files = files.len(), "file set changed");
        self.set_files(files);
        self.scheduler.request_compile(false, now);
    }

    /// Schedule a compile after the debounce delay.
    pub fn request_compile(&mut self, force: bool, now: Instant) {
        self.scheduler.request_compile(force, now);
    }

    /// Earliest instant at which [`Self::poll_timers`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.scheduler.pending().map(|p| p.deadline),
            self.scheduler.cooldown_deadline(),
            self.renderer.cooldown_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Fire every timer due at `now`: guard cooldowns first, then the
    /// debounced compile.
    pub fn poll_timers(&mut self, now: Instant) {
        if self.scheduler.cooldown_deadline().is_some_and(|at| at <= now) {
            self.scheduler.end_cooldown();
            if self.error == Some(PreviewError::CompileLoop) {
                self.error = None;
            }
            debug!("compile guard cooldown over");
        }

        if self.renderer.cooldown_deadline().is_some_and(|at| at <= now) {
            self.renderer.end_cooldown();
            if self.error == Some(PreviewError::ResetLoop) {
                self.error = None;
            }
            debug!("reset guard cooldown over");
        }

        if let Some(force) = self.scheduler.due(now) {
            self.compile_now(force, now);
        }
    }

    /// Run one compile attempt immediately, bypassing the debounce.
    pub fn compile_now(&mut self, force: bool, now: Instant) {
        let ready = self.dispatcher.is_ready();
        match self.scheduler.try_compile(&self.files, force, ready, now) {
            CompileDecision::Dispatch(files) => {
                // This job already covers the current files.
                self.scheduler.cancel_pending();
                self.artifact = None;
                let sequence = self.next_sequence;
                self.next_sequence += 1;
                info!(sequence, files = files.len(), force, "dispatching compile job");

                if let Err(err) = self.dispatcher.dispatch(CompileRequest { sequence, files }) {
                    warn!(sequence, error = %err, "compile dispatch failed");
                    self.error = Some(PreviewError::Dispatch(err.to_string()));
                    self.scheduler.forget_last_dispatch();
                }
            }
            CompileDecision::Unchanged => debug!("content unchanged, compile skipped"),
            CompileDecision::NotReady => {
                warn!("compile unit not ready");
                self.error = Some(PreviewError::NotReady);
            }
            CompileDecision::LoopDetected => self.error = Some(PreviewError::CompileLoop),
            CompileDecision::Suppressed => debug!("compile suppressed during cooldown"),
        }
    }

    /// Apply a message from the compile unit.
    pub fn apply_result(&mut self, response: CompileResponse, now: Instant) {
        let CompileResponse { sequence, outcome } = response;
        if self.last_applied.is_some_and(|last| sequence <= last) {
            debug!(sequence, last_applied = ?self.last_applied, "stale compile result dropped");
            return;
        }
        self.last_applied = Some(sequence);

        match outcome {
            CompileOutcome::Code { code } => {
                self.error = None;
                let artifact = CompiledArtifact::new(code, sequence);
                debug!(sequence, fingerprint = %artifact.fingerprint, "compile result applied");
                self.artifact = Some(artifact);
                self.render(false, now);
            }
            CompileOutcome::Error { error } => {
                warn!(sequence, %error, "compile job reported an error");
                self.error = Some(PreviewError::Compile(error));
            }
        }
    }

    /// Re-inject the current artifact even if it is already showing.
    pub fn refresh(&mut self, now: Instant) {
        self.render(true, now);
    }

    /// Blank the surface, drop the artifact and recompile.
    pub fn reset(&mut self, now: Instant) {
        match self.renderer.reset(now) {
            ResetOutcome::Reset => {
                self.artifact = None;
                self.compile_now(true, now);
            }
            ResetOutcome::LoopDetected => {
                self.error = Some(PreviewError::ResetLoop);
                self.artifact = None;
                self.scheduler.forget_last_dispatch();
            }
            ResetOutcome::Suppressed => debug!("reset suppressed during cooldown"),
            ResetOutcome::Failed(message) => self.error = Some(PreviewError::Reset(message)),
        }
    }

    fn render(&mut self, force: bool, now: Instant) {
        match self.renderer.update(self.artifact.as_ref(), force) {
            RenderOutcome::Injected => self.error = None,
            RenderOutcome::Skipped => {}
            RenderOutcome::Failed(message) => {
                self.error = Some(PreviewError::Render(message));
                self.reset(now);
            }
        }
    }
}
