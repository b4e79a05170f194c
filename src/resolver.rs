//! Import Resolver Pass
//!
//! Visits every static `import … from`, `export … from` and `export * from`
//! declaration whose source is relative and hands the specifier to a callback.
//! When the callback returns a replacement (an inline module reference) the
//! source literal is rewritten in place; otherwise the import stays untouched
//! and fails, if at all, only when the sandbox executes it.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    ExportAllDeclaration, ExportNamedDeclaration, ImportDeclaration, StringLiteral,
};
use oxc_ast::AstBuilder;
use oxc_ast_visit::VisitMut;
use std::collections::BTreeMap;

use crate::error::CompileError;
use crate::files::{extension, FileSet, SourceFile};
use crate::hash::Fingerprint;

/// Find the file a relative specifier points at.
///
/// The specifier is first joined onto the importer's directory, then tried as a
/// bare name with its leading `./` and `../` segments stripped. Extensionless
/// paths try `extensions` in order.
///
/// Every name looked at, up to and including the match, lands in `tried` with
/// its current fingerprint (`None` when absent).
pub fn resolve_specifier<'f>(
    files: &'f FileSet,
    importer: &str,
    specifier: &str,
    extensions: &[String],
    tried: &mut BTreeMap<String, Option<Fingerprint>>,
) -> Option<&'f SourceFile> {
    for name in specifier_candidates(importer, specifier, extensions) {
        let file = files.get(&name);
        tried.insert(name, file.map(SourceFile::fingerprint));
        if file.is_some() {
            return file;
        }
    }
    None
}

/// Every file name `specifier` may refer to, in resolution order.
fn specifier_candidates(importer: &str, specifier: &str, extensions: &[String]) -> Vec<String> {
    let joined = join_relative(importer, specifier);
    let stripped = strip_relative_prefix(specifier).to_string();

    let mut candidates: Vec<String> = Vec::new();
    let mut push = |name: String| {
        if !candidates.contains(&name) {
            candidates.push(name);
        }
    };
    for candidate in joined.into_iter().chain(Some(stripped)) {
        let bare = extension(&candidate).is_none();
        push(candidate.clone());
        if bare {
            for ext in extensions {
                push(format!("{candidate}.{ext}"));
            }
        }
    }
    candidates
}

fn strip_relative_prefix(mut path: &str) -> &str {
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if let Some(rest) = path.strip_prefix("../") {
            path = rest;
        } else {
            return path;
        }
    }
}

/// `importer`'s directory joined with `specifier`; `None` when it climbs above
/// the root.
fn join_relative(importer: &str, specifier: &str) -> Option<String> {
    let mut segments: Vec<&str> = importer.split('/').collect();
    segments.pop();
    for segment in specifier.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// VISITOR
// ═══════════════════════════════════════════════════════════════════════════════

pub struct ImportResolver<'a, F> {
    ast: AstBuilder<'a>,
    resolve: F,
    rewritten: usize,
    error: Option<CompileError>,
}

impl<'a, F> ImportResolver<'a, F>
where
    F: FnMut(&str) -> Result<Option<String>, CompileError>,
{
    pub fn new(allocator: &'a Allocator, resolve: F) -> Self {
        Self {
            ast: AstBuilder::new(allocator),
            resolve,
            rewritten: 0,
            error: None,
        }
    }

    /// Number of sources rewritten so far.
    pub fn rewritten(&self) -> usize {
        self.rewritten
    }

    /// The first fatal error raised by the callback. Later imports are skipped
    /// once one is recorded.
    pub fn into_error(self) -> Option<CompileError> {
        self.error
    }

    fn rewrite_source(&mut self, source: &mut StringLiteral<'a>) {
        if self.error.is_some() {
            return;
        }
        let specifier = source.value.to_string();
        if !specifier.starts_with('.') {
            return;
        }
        match (self.resolve)(&specifier) {
            Ok(Some(reference)) => {
                source.value = self.ast.atom(&reference);
                source.raw = None;
                self.rewritten += 1;
            }
            Ok(None) => {}
            Err(err) => self.error = Some(err),
        }
    }
}

impl<'a, F> VisitMut<'a> for ImportResolver<'a, F>
where
    F: FnMut(&str) -> Result<Option<String>, CompileError>,
{
    fn visit_import_declaration(&mut self, decl: &mut ImportDeclaration<'a>) {
        self.rewrite_source(&mut decl.source);
    }

    fn visit_export_all_declaration(&mut self, decl: &mut ExportAllDeclaration<'a>) {
        self.rewrite_source(&mut decl.source);
    }

    fn visit_export_named_declaration(&mut self, decl: &mut ExportNamedDeclaration<'a>) {
        if let Some(source) = decl.source.as_mut() {
            self.rewrite_source(source);
        }
    }
}
