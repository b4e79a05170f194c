//! Source files and file sets.
//!
//! The file store is external; this module only defines the records it hands
//! over and validates them once at ingestion so nothing downstream has to deal
//! with half-formed entries.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::FileSetError;
use crate::hash::{hash, hash_all, Fingerprint};

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE FILES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    #[serde(rename = "markup-component")]
    Component,
    Script,
    Styles,
    Data,
    Other,
}

impl Language {
    pub fn from_file_name(name: &str) -> Self {
        match extension(name) {
            Some("vue") => Language::Component,
            Some("js" | "jsx" | "ts" | "tsx" | "mjs" | "mts") => Language::Script,
            Some("css" | "scss") => Language::Styles,
            Some("json") => Language::Data,
            _ => Language::Other,
        }
    }

    /// Wire name, as in the editor store.
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Component => "markup-component",
            Language::Script => "script",
            Language::Styles => "styles",
            Language::Data => "data",
            Language::Other => "other",
        }
    }
}

/// Extension of a file name, without the dot.
pub fn extension(name: &str) -> Option<&str> {
    let base = name.rsplit('/').next().unwrap_or(name);
    match base.rfind('.') {
        Some(idx) if idx + 1 < base.len() => Some(&base[idx + 1..]),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
    pub language: Language,
}

impl SourceFile {
    /// Build a file record, deriving the language from the extension.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Result<Self, FileSetError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(FileSetError::EmptyName);
        }
        let language = Language::from_file_name(&name);
        Ok(Self {
            name,
            content: content.into(),
            language,
        })
    }

    pub fn fingerprint(&self) -> Fingerprint {
        hash(&self.content)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE SETS
// ═══════════════════════════════════════════════════════════════════════════════

/// Named collection of source files. Cloning is the snapshot operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileSet {
    files: BTreeMap<String, SourceFile>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a file, keyed by its name.
    pub fn insert(&mut self, file: SourceFile) -> Option<SourceFile> {
        self.files.insert(file.name.clone(), file)
    }

    /// Convenience for `insert(SourceFile::new(name, content)?)`.
    pub fn with_file(
        mut self,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, FileSetError> {
        self.insert(SourceFile::new(name, content)?);
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&SourceFile> {
        self.files.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Combined fingerprint over the name, language and content of every file,
    /// in name order. Parts are NUL separated.
    pub fn fingerprint(&self) -> Fingerprint {
        hash_all(self.files.values().flat_map(|file| {
            [
                file.name.as_str(),
                "\0",
                file.language.as_str(),
                "\0",
                file.content.as_str(),
                "\0",
            ]
        }))
    }

    /// Ingest a JSON file set.
    ///
    /// Accepts `{ "App.vue": { "name": "App.vue", "content": "...", "language": "markup-component" } }`,
    /// records using `value` instead of `content` (the editor store shape), and
    /// plain `{ "App.vue": "..." }` maps (the shareable link shape).
    pub fn from_json(value: &Value) -> Result<Self, FileSetError> {
        let object = value.as_object().ok_or_else(|| FileSetError::InvalidEntry {
            key: "<root>".to_string(),
            reason: "expected an object of files".to_string(),
        })?;

        let mut set = FileSet::new();
        for (key, entry) in object {
            set.insert(parse_entry(key, entry)?);
        }
        Ok(set)
    }

    pub fn from_json_str(json: &str) -> Result<Self, FileSetError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json(&value)
    }

    /// Load every file under `root`, named by its `/`-separated relative path.
    pub fn from_dir(root: &Path) -> Result<Self, FileSetError> {
        let mut set = FileSet::new();
        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            if name.split('/').any(|segment| segment.starts_with('.')) {
                continue;
            }
            let content = fs::read_to_string(path).map_err(|source| FileSetError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            set.insert(SourceFile::new(name, content)?);
        }
        Ok(set)
    }
}

fn parse_entry(key: &str, entry: &Value) -> Result<SourceFile, FileSetError> {
    let invalid = |reason: &str| FileSetError::InvalidEntry {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    match entry {
        Value::String(content) => SourceFile::new(key, content.clone()),
        Value::Object(record) => {
            if let Some(name) = record.get("name") {
                let name = name.as_str().ok_or_else(|| invalid("name is not a string"))?;
                if name != key {
                    return Err(FileSetError::NameMismatch {
                        key: key.to_string(),
                        name: name.to_string(),
                    });
                }
            }
            let content = record
                .get("content")
                .or_else(|| record.get("value"))
                .ok_or_else(|| invalid("missing content"))?
                .as_str()
                .ok_or_else(|| invalid("content is not a string"))?;
            let mut file = SourceFile::new(key, content)?;
            if let Some(language) = record.get("language") {
                // Editor language ids ("vue", "typescript") are not ours; fall back
                // to the extension when the tag is unknown.
                if let Ok(language) = serde_json::from_value::<Language>(language.clone()) {
                    file.language = language;
                }
            }
            Ok(file)
        }
        _ => Err(invalid("expected a string or a file record")),
    }
}

impl FromIterator<SourceFile> for FileSet {
    fn from_iter<T: IntoIterator<Item = SourceFile>>(iter: T) -> Self {
        let mut set = FileSet::new();
        for file in iter {
            set.insert(file);
        }
        set
    }
}
