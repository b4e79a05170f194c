//! Preview Renderer
//!
//! Injects compiled artifacts into a [`PreviewSurface`] and resets the surface
//! on failure. Phases: `Idle → Updating → Idle` for updates and
//! `Idle → Resetting → Idle` for resets. Updates are ignored while resetting.

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::PreviewConfig;
use crate::document::build_document;
use crate::error::SurfaceError;
use crate::guard::{BurstGuard, GuardVerdict};
use crate::hash::{hash, Fingerprint};

/// The isolated surface that executes the sandbox document.
pub trait PreviewSurface {
    /// Replace the surface's whole document.
    fn set_document(&mut self, html: String) -> Result<(), SurfaceError>;
}

/// Records every assigned document. Used by tests and headless hosts.
#[derive(Debug, Default)]
pub struct MemorySurface {
    pub documents: Vec<String>,
    /// When set, the next assignments fail with this message.
    pub fail_with: Option<String>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&str> {
        self.documents.last().map(String::as_str)
    }
}

impl PreviewSurface for MemorySurface {
    fn set_document(&mut self, html: String) -> Result<(), SurfaceError> {
        if let Some(message) = &self.fail_with {
            return Err(SurfaceError(message.clone()));
        }
        self.documents.push(html);
        Ok(())
    }
}

/// Output of a successful compile job, as applied in the main context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArtifact {
    pub code: String,
    pub fingerprint: Fingerprint,
    pub sequence: u64,
}

impl CompiledArtifact {
    pub fn new(code: String, sequence: u64) -> Self {
        Self {
            fingerprint: hash(&code),
            code,
            sequence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererPhase {
    Idle,
    Updating,
    Resetting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Injected,
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    Reset,
    LoopDetected,
    Suppressed,
    Failed(String),
}

pub struct PreviewRenderer<S> {
    surface: S,
    config: PreviewConfig,
    guard: BurstGuard,
    phase: RendererPhase,
    last_injected: Option<Fingerprint>,
}

impl<S: PreviewSurface> PreviewRenderer<S> {
    pub fn new(surface: S, config: PreviewConfig) -> Self {
        Self {
            surface,
            guard: BurstGuard::new(config.reset_guard),
            config,
            phase: RendererPhase::Idle,
            last_injected: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn phase(&self) -> RendererPhase {
        self.phase
    }

    pub fn last_injected(&self) -> Option<Fingerprint> {
        self.last_injected
    }

    /// Inject `artifact` unless it is already showing and `force` is off.
    pub fn update(&mut self, artifact: Option<&CompiledArtifact>, force: bool) -> RenderOutcome {
        if self.phase == RendererPhase::Resetting {
            return RenderOutcome::Skipped;
        }
        let Some(artifact) = artifact else {
            debug!("no compiled artifact, update skipped");
            return RenderOutcome::Skipped;
        };
        if !force && self.last_injected == Some(artifact.fingerprint) {
            debug!(fingerprint = %artifact.fingerprint, "artifact unchanged, update skipped");
            return RenderOutcome::Skipped;
        }

        self.phase = RendererPhase::Updating;
        let html = build_document(&artifact.code, &self.config);
        let result = self.surface.set_document(html);
        self.phase = RendererPhase::Idle;

        match result {
            Ok(()) => {
                self.last_injected = Some(artifact.fingerprint);
                info!(
                    fingerprint = %artifact.fingerprint,
                    sequence = artifact.sequence,
                    "preview updated"
                );
                RenderOutcome::Injected
            }
            Err(err) => {
                warn!(error = %err, "preview update failed");
                self.last_injected = None;
                RenderOutcome::Failed(err.to_string())
            }
        }
    }

    /// Install the blank document and forget what was injected.
    pub fn reset(&mut self, now: Instant) -> ResetOutcome {
        match self.guard.check(now) {
            GuardVerdict::Allowed => {}
            GuardVerdict::Tripped => {
                warn!(burst = self.guard.burst(), "reset loop detected");
                return ResetOutcome::LoopDetected;
            }
            GuardVerdict::Suppressed => return ResetOutcome::Suppressed,
        }

        self.phase = RendererPhase::Resetting;
        let result = self.surface.set_document(build_document("", &self.config));
        self.last_injected = None;
        self.phase = RendererPhase::Idle;

        match result {
            Ok(()) => {
                info!("preview reset");
                ResetOutcome::Reset
            }
            Err(err) => {
                warn!(error = %err, "preview reset failed");
                ResetOutcome::Failed(err.to_string())
            }
        }
    }

    pub fn cooldown_deadline(&self) -> Option<Instant> {
        self.guard.cooldown_deadline()
    }

    pub fn end_cooldown(&mut self) {
        self.guard.end_cooldown();
    }
}
