//! Single-File Component Desugaring
//!
//! Turns a component's `<template>`, `<script>` and `<style>` blocks into a
//! plain ES module:
//!
//! - the template becomes a render function returning `h('div', { innerHTML })`
//! - a `setup` script is embedded verbatim and wrapped by a `setup()` export
//! - a plain script gets `render()` spliced into its default export object
//! - the style block becomes a side effect appending a `<style>` to `<head>`
//!
//! JSX modules get the same `h` import through [`inject_jsx_factory`].
//!
//! Extraction is regex based: the first non-greedy match of each block wins,
//! nesting is not validated and malformed blocks simply come back empty.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TEMPLATE_RE: Regex = Regex::new(r"(?is)<template\b[^>]*>(.*?)</template>").unwrap();
    static ref SCRIPT_RE: Regex = Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script>").unwrap();
    static ref STYLE_RE: Regex = Regex::new(r"(?is)<style\b[^>]*>(.*?)</style>").unwrap();
    static ref SETUP_ATTR_RE: Regex = Regex::new(r"(?i)(?:^|\s)setup(?:\s|=|$)").unwrap();
}

/// Raw blocks of a component, interiors trimmed. Absent blocks are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentBlocks {
    pub template: Option<String>,
    pub script: Option<ScriptBlock>,
    pub style: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBlock {
    pub body: String,
    pub setup: bool,
}

pub fn extract_blocks(source: &str) -> ComponentBlocks {
    let template = TEMPLATE_RE
        .captures(source)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());

    let script = SCRIPT_RE.captures(source).map(|c| {
        let attrs = c.get(1).map_or("", |m| m.as_str());
        ScriptBlock {
            body: c.get(2).map_or("", |m| m.as_str()).trim().to_string(),
            setup: SETUP_ATTR_RE.is_match(attrs),
        }
    });

    let style = STYLE_RE
        .captures(source)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());

    ComponentBlocks {
        template,
        script,
        style,
    }
}

/// Escape text for embedding inside a JS template literal.
pub fn escape_template_literal(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace('$', "\\$")
}

/// Desugar a component into module source.
///
/// `framework` is the module exporting `h`; `stamp` makes the style tag id unique
/// per compilation.
pub fn desugar_component(file_name: &str, source: &str, framework: &str, stamp: u64) -> String {
    let blocks = extract_blocks(source);
    let markup = escape_template_literal(blocks.template.as_deref().unwrap_or(""));
    let render_node = format!("h('div', {{\n      innerHTML: `{markup}`\n    }})");
    let h_import = format!("import {{ h }} from '{framework}'\n");

    let mut code = match blocks.script.as_ref().filter(|s| !s.body.is_empty()) {
        Some(script) if script.setup => {
            let import = if imports_named(&script.body, framework, "h") {
                ""
            } else {
                h_import.as_str()
            };
            format!(
                "\n{import}{body}\n\nexport default {{\n  setup() {{\n    return () => {render_node}\n  }}\n}}\n",
                body = script.body
            )
        }
        Some(script) => {
            let import = if imports_named(&script.body, framework, "h") {
                ""
            } else {
                h_import.as_str()
            };
            let spliced = script.body.replacen(
                "export default {",
                &format!("export default {{\n  render() {{\n    return {render_node}\n  }},"),
                1,
            );
            format!("\n{import}{spliced}\n")
        }
        None => format!(
            "\n{h_import}\nexport default {{\n  render() {{\n    return {render_node}\n  }}\n}}\n"
        ),
    };

    if let Some(style) = blocks.style.as_deref().filter(|s| !s.is_empty()) {
        code.push_str(&format!(
            "\n;(() => {{\n  const style = document.createElement('style')\n  style.textContent = `{css}`\n  style.setAttribute('data-preview-component', '{file_name}-{stamp}')\n  document.head.appendChild(style)\n}})()\n",
            css = escape_template_literal(style),
        ));
    }

    code
}

/// Name JSX elements are lowered to.
pub const JSX_FACTORY: &str = "h";
/// Name JSX fragments are lowered to.
pub const JSX_FRAGMENT: &str = "Fragment";

/// Prepend imports of the JSX factory and fragment from the framework module,
/// skipping whichever the source already imports.
pub fn inject_jsx_factory(source: &str, framework: &str) -> String {
    let missing: Vec<&str> = [JSX_FACTORY, JSX_FRAGMENT]
        .into_iter()
        .filter(|name| !imports_named(source, framework, name))
        .collect();
    if missing.is_empty() {
        return source.to_string();
    }
    format!(
        "import {{ {} }} from '{framework}'\n{source}",
        missing.join(", ")
    )
}

/// Whether the script already imports `name` from the framework module.
fn imports_named(script: &str, framework: &str, name: &str) -> bool {
    let pattern = format!(
        r#"import\s*\{{[^}}]*\b{}\b[^}}]*\}}\s*from\s*['"]{}['"]"#,
        regex::escape(name),
        regex::escape(framework)
    );
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(script),
        Err(_) => false,
    }
}
