//! Asset modules and inline module references.
//!
//! JSON and stylesheet files are not run through the transform engine; they are
//! wrapped into tiny modules directly. Every compiled dependency is then encoded
//! as a `data:` URL so the sandbox can import it without a network round trip.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::files::SourceFile;

pub const MODULE_MIME_TYPE: &str = "application/javascript";

/// `export default <json>`. The text is assumed to be a valid value literal.
pub fn json_module(file: &SourceFile) -> String {
    format!("export default {}", file.content)
}

/// Side-effect module injecting the stylesheet into `<head>`.
///
/// The text is embedded as a raw template literal; nothing beyond that is
/// escaped.
pub fn css_module(file: &SourceFile, stamp: u64) -> String {
    format!(
        r#"
(() => {{
    const stylesheet = document.createElement('style')
    stylesheet.setAttribute('id', 'style_{stamp}_{name}')
    document.head.appendChild(stylesheet)
    const styles = document.createTextNode(String.raw`{css}`)
    stylesheet.innerHTML = ''
    stylesheet.appendChild(styles)
}})()
"#,
        name = file.name,
        css = file.content,
    )
}

/// Encode module text as a directly importable `data:` URL.
pub fn inline_module_reference(code: &str) -> String {
    format!(
        "data:{MODULE_MIME_TYPE};base64,{}",
        STANDARD.encode(code.as_bytes())
    )
}

/// Inverse of [`inline_module_reference`]. `None` for anything else.
#[cfg(test)]
pub(crate) fn decode_inline_module_reference(reference: &str) -> Option<String> {
    let payload = reference.strip_prefix(&format!("data:{MODULE_MIME_TYPE};base64,"))?;
    let bytes = STANDARD.decode(payload).ok()?;
    String::from_utf8(bytes).ok()
}
