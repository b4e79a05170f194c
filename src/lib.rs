//! # Live Preview Compiler (Native)
//!
//! Compile-and-preview pipeline for single-file component playgrounds.
//!
//! ## Pipeline
//!
//! 1. **Edit**: the host hands a new [`FileSet`] snapshot to the [`PreviewSession`].
//! 2. **Schedule**: the [`CompilationScheduler`] debounces edits, skips unchanged
//!    content and stops compile loops.
//! 3. **Compile**: the [`CompileWorker`] thread runs the [`ModuleTransformer`]:
//!    components are desugared, TypeScript/JSX is lowered by oxc, and every
//!    relative import is replaced by an inline `data:` module reference built
//!    through the [`TransformCache`].
//! 4. **Render**: the [`PreviewRenderer`] wraps the entry module in the sandbox
//!    document and assigns it to a [`PreviewSurface`], resetting the surface
//!    when that fails.
//!
//! ## Invariants
//!
//! - A compile job is dispatched only when the file set's fingerprint differs
//!   from the last dispatched one, unless forced.
//! - A document is injected only when the artifact's fingerprint differs from
//!   the last injected one, unless forced.
//! - Import cycles are compile errors, never unbounded recursion.
//! - Compile results carry the sequence number of their request; older results
//!   than the last applied one are dropped.

pub mod assets;
pub mod cache;
pub mod config;
pub mod document;
pub mod entry_patch;
pub mod error;
pub mod files;
pub mod guard;
pub mod hash;
pub mod host;
pub mod logging;
pub mod renderer;
pub mod resolver;
pub mod scheduler;
pub mod session;
pub mod sfc;
pub mod starter;
pub mod transform;
pub mod worker;

#[cfg(feature = "napi")]
mod napi_bridge;

#[cfg(test)]
mod transform_tests;

pub use cache::{CacheEntry, CacheStats, TransformCache};
pub use config::{GuardConfig, PreviewConfig};
pub use document::build_document;
pub use error::{
    CompileError, ConfigError, DispatchError, FileSetError, PreviewError, SurfaceError,
};
pub use files::{FileSet, Language, SourceFile};
pub use hash::{hash, Fingerprint};
pub use host::HostEvent;
pub use renderer::{CompiledArtifact, MemorySurface, PreviewRenderer, PreviewSurface};
pub use scheduler::{CompilationScheduler, CompileDecision};
pub use session::PreviewSession;
pub use transform::ModuleTransformer;
pub use worker::{CompileDispatch, CompileOutcome, CompileRequest, CompileResponse, CompileWorker};

#[cfg(feature = "napi")]
pub use napi_bridge::{build_preview_document_native, compile_files_native, hash_native};
