//! Node bindings. One-shot compile and document building for JS hosts that
//! keep their own scheduling.

use napi_derive::napi;

use crate::config::PreviewConfig;
use crate::document::build_document;
use crate::files::FileSet;
use crate::transform::ModuleTransformer;

fn config_from(value: Option<serde_json::Value>) -> napi::Result<PreviewConfig> {
    let config = match value {
        Some(value) => serde_json::from_value::<PreviewConfig>(value)
            .map_err(|e| napi::Error::from_reason(e.to_string()))?,
        None => PreviewConfig::default(),
    };
    config
        .validate()
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    Ok(config)
}

/// Compile a file set (`{ [name]: { name, value | content, language? } }`)
/// and return the entry module text.
#[napi]
pub fn compile_files_native(
    files: serde_json::Value,
    entry: Option<String>,
    config: Option<serde_json::Value>,
) -> napi::Result<String> {
    let mut config = config_from(config)?;
    if let Some(entry) = entry {
        config.entry_file = entry;
    }
    let files = FileSet::from_json(&files).map_err(|e| napi::Error::from_reason(e.to_string()))?;

    ModuleTransformer::new(config)
        .compile(&files)
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}

/// Wrap compiled code in the sandbox document.
#[napi]
pub fn build_preview_document_native(
    code: String,
    config: Option<serde_json::Value>,
) -> napi::Result<String> {
    let config = config_from(config)?;
    Ok(build_document(&code, &config))
}

#[napi]
pub fn hash_native(text: String) -> String {
    crate::hash::hash(&text).to_string()
}
