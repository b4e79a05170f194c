//! Module Transformer
//!
//! Produces the final module text for the entry file. Every relative import is
//! resolved against the file set and replaced by an inline module reference,
//! compiling the target on demand through the [`TransformCache`].
//!
//! Pipeline per file:
//! 1. desugar components (`sfc`), patch the entry (`entry_patch`), import the
//!    framework's `h` and `Fragment` into JSX files
//! 2. parse with oxc (TypeScript, module)
//! 3. resolver pass, recursing into dependencies
//! 4. oxc transformer (type stripping, classic JSX onto `h`) and codegen
//!
//! Each module records every file name its imports were resolved against,
//! present or not, so the cache notices a dependency being fixed or created.
//!
//! Import cycles are detected with an explicit resolving stack and are fatal.
//! A failure that mentions the editor's in-memory marker is retried once
//! without the resolver pass.

use oxc_allocator::Allocator;
use oxc_ast_visit::VisitMut;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{JsxRuntime, TransformOptions, Transformer};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::assets::{css_module, inline_module_reference, json_module};
use crate::cache::{CacheEntry, TransformCache};
use crate::config::PreviewConfig;
use crate::entry_patch::patch_entry;
use crate::error::CompileError;
use crate::files::{extension, FileSet, Language, SourceFile};
use crate::hash::Fingerprint;
use crate::resolver::{resolve_specifier, ImportResolver};
use crate::sfc::{desugar_component, inject_jsx_factory, JSX_FACTORY, JSX_FRAGMENT};

/// Source of the timestamps that make injected style ids unique.
pub type Stamp = fn() -> u64;

pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Module text plus every file name its imports were resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedModule {
    pub code: String,
    /// Fingerprint of each name at resolution time, `None` if it was absent.
    pub dependencies: BTreeMap<String, Option<Fingerprint>>,
}

pub struct ModuleTransformer {
    config: PreviewConfig,
    cache: TransformCache,
    stamp: Stamp,
}

/// Read-only state shared by one compile job.
struct Pass<'c> {
    config: &'c PreviewConfig,
    files: &'c FileSet,
    stamp: u64,
}

impl ModuleTransformer {
    pub fn new(config: PreviewConfig) -> Self {
        Self {
            config,
            cache: TransformCache::new(),
            stamp: unix_millis,
        }
    }

    pub fn with_stamp(mut self, stamp: Stamp) -> Self {
        self.stamp = stamp;
        self
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn cache(&self) -> &TransformCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut TransformCache {
        &mut self.cache
    }

    /// Compile the configured entry file of `files`.
    pub fn compile(&mut self, files: &FileSet) -> Result<String, CompileError> {
        let entry_name = self.config.entry_file.clone();
        let entry = files
            .get(&entry_name)
            .filter(|f| !f.content.trim().is_empty())
            .ok_or_else(|| CompileError::EntryMissing {
                name: entry_name.clone(),
            })?;

        let patched = SourceFile {
            content: patch_entry(
                &entry.content,
                &self.config.framework_module,
                &self.config.mount_id,
            ),
            ..entry.clone()
        };

        let module = self.run(files, &patched)?;
        if module.code.trim().is_empty() {
            return Err(CompileError::EmptyOutput);
        }

        info!(
            entry = %entry_name,
            dependencies = module.dependencies.len(),
            bytes = module.code.len(),
            "compiled entry module"
        );
        Ok(module.code)
    }

    /// Transform a single file of `files` as a module root, without entry
    /// patching.
    pub fn transform_file(
        &mut self,
        name: &str,
        files: &FileSet,
    ) -> Result<TransformedModule, CompileError> {
        let file = files
            .get(name)
            .ok_or_else(|| CompileError::EntryMissing {
                name: name.to_string(),
            })?
            .clone();
        self.run(files, &file)
    }

    fn run(&mut self, files: &FileSet, root: &SourceFile) -> Result<TransformedModule, CompileError> {
        let pass = Pass {
            config: &self.config,
            files,
            stamp: (self.stamp)(),
        };
        let mut stack = vec![root.name.clone()];
        transform_with_retry(&pass, &mut self.cache, root, &mut stack)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASSES
// ═══════════════════════════════════════════════════════════════════════════════

fn transform_with_retry(
    pass: &Pass<'_>,
    cache: &mut TransformCache,
    file: &SourceFile,
    stack: &mut Vec<String>,
) -> Result<TransformedModule, CompileError> {
    match transform_module(pass, cache, file, stack, true) {
        Ok(module) => Ok(module),
        Err(err @ CompileError::CircularImport { .. }) => Err(err),
        Err(err) if err.to_string().contains(&pass.config.in_memory_marker) => {
            warn!(file = %file.name, error = %err, "retrying without import resolution");
            transform_module(pass, cache, file, stack, false).map_err(|_| {
                CompileError::Degraded {
                    message: err.to_string(),
                }
            })
        }
        Err(err) => Err(err),
    }
}

fn transform_module(
    pass: &Pass<'_>,
    cache: &mut TransformCache,
    file: &SourceFile,
    stack: &mut Vec<String>,
    resolve: bool,
) -> Result<TransformedModule, CompileError> {
    let source = if file.language == Language::Component {
        desugar_component(
            &file.name,
            &file.content,
            &pass.config.framework_module,
            pass.stamp,
        )
    } else if is_jsx(&file.name) {
        inject_jsx_factory(&file.content, &pass.config.framework_module)
    } else {
        file.content.clone()
    };

    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, &source, source_type_for(&file.name)).parse();
    if !parsed.errors.is_empty() {
        return Err(CompileError::Parse {
            file: file.name.clone(),
            message: join_diagnostics(&parsed.errors),
        });
    }
    let mut program = parsed.program;

    let mut dependencies = BTreeMap::new();
    if resolve {
        let mut resolver = ImportResolver::new(&allocator, |specifier: &str| {
            resolve_import(pass, cache, stack, &mut dependencies, &file.name, specifier)
        });
        resolver.visit_program(&mut program);
        let rewritten = resolver.rewritten();
        if let Some(err) = resolver.into_error() {
            return Err(err);
        }
        debug!(file = %file.name, rewritten, "resolved relative imports");
    } else {
        // Sources stay untouched, but what they point at still decides
        // whether this output may be reused.
        let extensions = &pass.config.resolve_extensions;
        let mut tracker = ImportResolver::new(&allocator, |specifier: &str| {
            resolve_specifier(pass.files, &file.name, specifier, extensions, &mut dependencies);
            Ok(None)
        });
        tracker.visit_program(&mut program);
    }

    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();
    let options = transform_options();
    let transformed = Transformer::new(&allocator, Path::new(&file.name), &options)
        .build_with_scoping(scoping, &mut program);
    if !transformed.errors.is_empty() {
        return Err(CompileError::Transform {
            file: file.name.clone(),
            message: join_diagnostics(&transformed.errors),
        });
    }

    Ok(TransformedModule {
        code: Codegen::new().build(&program).code,
        dependencies,
    })
}

/// Resolver callback: inline reference for `specifier`, `None` to leave it.
fn resolve_import(
    pass: &Pass<'_>,
    cache: &mut TransformCache,
    stack: &mut Vec<String>,
    dependencies: &mut BTreeMap<String, Option<Fingerprint>>,
    importer: &str,
    specifier: &str,
) -> Result<Option<String>, CompileError> {
    let extensions = &pass.config.resolve_extensions;
    let Some(file) = resolve_specifier(pass.files, importer, specifier, extensions, dependencies)
    else {
        debug!(importer, specifier, "unresolved relative import left untouched");
        return Ok(None);
    };

    if let Some(pos) = stack.iter().position(|name| name == &file.name) {
        let mut chain = stack[pos..].to_vec();
        chain.push(file.name.clone());
        return Err(CompileError::CircularImport { chain });
    }

    match compile_dependency(pass, cache, file, stack) {
        Ok(entry) => {
            dependencies.extend(entry.dependencies);
            Ok(Some(entry.reference))
        }
        Err(err @ CompileError::CircularImport { .. }) => Err(err),
        Err(err) => {
            warn!(importer, dependency = %file.name, error = %err, "dependency failed to compile, import left untouched");
            Ok(None)
        }
    }
}

fn compile_dependency(
    pass: &Pass<'_>,
    cache: &mut TransformCache,
    file: &SourceFile,
    stack: &mut Vec<String>,
) -> Result<CacheEntry, CompileError> {
    let files = pass.files;
    let fingerprint = file.fingerprint();
    cache.get_or_compute(
        &file.name,
        fingerprint,
        |name| files.get(name).map(SourceFile::fingerprint),
        |cache| {
            let module = match file.language {
                Language::Styles => TransformedModule {
                    code: css_module(file, pass.stamp),
                    dependencies: BTreeMap::new(),
                },
                Language::Data => TransformedModule {
                    code: json_module(file),
                    dependencies: BTreeMap::new(),
                },
                Language::Component | Language::Script | Language::Other => {
                    stack.push(file.name.clone());
                    let result = transform_with_retry(pass, cache, file, stack);
                    stack.pop();
                    result?
                }
            };
            Ok(CacheEntry {
                fingerprint,
                reference: inline_module_reference(&module.code),
                dependencies: module.dependencies,
            })
        },
    )
}

fn is_jsx(name: &str) -> bool {
    matches!(extension(name), Some("jsx" | "tsx"))
}

fn source_type_for(name: &str) -> SourceType {
    SourceType::default()
        .with_module(true)
        .with_typescript(true)
        .with_jsx(is_jsx(name))
}

/// Type stripping plus classic JSX lowered onto the framework's `h`.
fn transform_options() -> TransformOptions {
    let mut options = TransformOptions::default();
    options.jsx.runtime = JsxRuntime::Classic;
    options.jsx.pragma = Some(JSX_FACTORY.to_string());
    options.jsx.pragma_frag = Some(JSX_FRAGMENT.to_string());
    // Keeps the injected imports from being elided as unused.
    options.typescript.jsx_pragma = JSX_FACTORY.into();
    options.typescript.jsx_pragma_frag = JSX_FRAGMENT.into();
    options
}

fn join_diagnostics<D: std::fmt::Display>(errors: &[D]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
