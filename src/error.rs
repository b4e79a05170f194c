//! Error taxonomy for the preview pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single compile job. Fatal for that job only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("entry file {name} is missing or empty")]
    EntryMissing { name: String },

    #[error("invalid compile data: {0}")]
    InvalidRequest(String),

    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    #[error("failed to transform {file}: {message}")]
    Transform { file: String, message: String },

    #[error("circular import: {}", chain.join(" -> "))]
    CircularImport { chain: Vec<String> },

    #[error("{message}. Check the syntax and import statements")]
    Degraded { message: String },

    #[error("compiled output is empty, check the entry file")]
    EmptyOutput,
}

/// Rejection of a malformed file record at ingestion.
#[derive(Error, Debug)]
pub enum FileSetError {
    #[error("file name must not be empty")]
    EmptyName,

    #[error("file record {key} names itself {name}")]
    NameMismatch { key: String, name: String },

    #[error("file record {key} is malformed: {reason}")]
    InvalidEntry { key: String, reason: String },

    #[error("file set is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// The preview surface refused a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SurfaceError(pub String);

/// The compile unit could not accept a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("compile unit is not running")]
    Closed,
}

/// Contents of the session's single current-error slot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreviewError {
    #[error("compiler is not ready, edit again to retry")]
    NotReady,

    #[error("possible compile loop detected, wait a few seconds before continuing")]
    CompileLoop,

    #[error("possible reset loop detected, wait a few seconds before continuing")]
    ResetLoop,

    #[error("Compile failed: {0}")]
    Compile(String),

    #[error("failed to update preview: {0}")]
    Render(String),

    #[error("failed to reset preview: {0}")]
    Reset(String),

    #[error("compile request failed: {0}")]
    Dispatch(String),
}
