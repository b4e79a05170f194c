//! # Sandbox Document
//!
//! The complete HTML document assigned to the preview surface. It carries:
//!
//! 1. an import map resolving bare module names (the framework) to CDN URLs
//! 2. a base style and the mount element
//! 3. one inline module script: error interceptors first, then the compiled
//!    entry module
//!
//! Errors mentioning the editor's in-memory marker are swallowed inside the
//! sandbox; everything else is rendered into an `.error` box.

use serde_json::json;

use crate::config::PreviewConfig;

const BASE_STYLE: &str = r#"      body { margin: 0; }
      #app { height: 100%; width: 100%; }
      .error {
        color: red;
        padding: 10px;
        margin: 10px;
        border: 1px solid #ffcccc;
        border-radius: 4px;
      }
"#;

/// Installed before user code. `__MARKER__` is replaced with the JSON-quoted
/// in-memory marker.
const INTERCEPTORS: &str = r#"      window.onerror = function(msg, url, line, col, error) {
        const errorDiv = document.createElement('div');
        errorDiv.className = 'error';
        errorDiv.textContent = `${msg}\nLine: ${line}\nColumn: ${col}`;
        document.body.appendChild(errorDiv);
        return false;
      };

      window.addEventListener('error', (event) => {
        if (event.message && event.message.includes(__MARKER__)) {
          event.preventDefault();
          return true;
        }
      });

      window.addEventListener('unhandledrejection', (event) => {
        const reason = event.reason?.toString() || '';
        if (reason.includes(__MARKER__)) {
          event.preventDefault();
          return true;
        }
      });
"#;

/// Build the sandbox document around `script`. An empty script yields the
/// blank document installed on reset.
pub fn build_document(script: &str, config: &PreviewConfig) -> String {
    let mut html = String::with_capacity(script.len() + 2048);

    html.push_str("<!DOCTYPE html>\n<html>\n  <head>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str(
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );

    html.push_str("    <script type=\"importmap\">\n");
    html.push_str(&import_map_json(config));
    html.push_str("\n    </script>\n");

    html.push_str("    <style>\n");
    html.push_str(BASE_STYLE);
    if config.mount_id != "app" {
        html.push_str(&format!(
            "      #{} {{ height: 100%; width: 100%; }}\n",
            config.mount_id
        ));
    }
    html.push_str("    </style>\n  </head>\n  <body>\n");

    html.push_str(&format!(
        "    <div id=\"{}\"></div>\n",
        escape_attribute(&config.mount_id)
    ));

    html.push_str("    <script type=\"module\">\n");
    let marker = serde_json::to_string(&config.in_memory_marker)
        .unwrap_or_else(|_| "\"inmemory://model\"".to_string());
    html.push_str(&INTERCEPTORS.replace("__MARKER__", &marker));
    if !script.is_empty() {
        html.push('\n');
        html.push_str(&neutralize_script_close(script));
        html.push('\n');
    }
    html.push_str("    </script>\n  </body>\n</html>\n");

    html
}

fn import_map_json(config: &PreviewConfig) -> String {
    let map = json!({ "imports": config.import_map });
    serde_json::to_string_pretty(&map).unwrap_or_else(|_| "{\"imports\":{}}".to_string())
}

/// A literal `</script` inside the module body would close the element early.
pub fn neutralize_script_close(script: &str) -> String {
    script.replace("</script", "<\\/script")
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
