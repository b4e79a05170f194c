//! Entry module patching.
//!
//! The sandbox document is replaced on every update, but a user entry that
//! mounts unconditionally would stack app instances when the same document is
//! re-executed. The entry is patched so a previous app on the mount element is
//! unmounted first.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MOUNT_CALL_RE: Regex =
        Regex::new(r#"(\s*)(createApp\([^)]+\))\.mount\(['"](#[^'"]+)['"]\)"#).unwrap();
}

pub fn patch_entry(code: &str, framework: &str, mount_id: &str) -> String {
    let mut code = code.to_string();

    if !code.contains("createApp") {
        code = format!("import {{ createApp }} from '{framework}'\n{code}");
    }

    if !code.contains(".mount") {
        code.push_str(&format!(
            r#"
const appElement = document.querySelector('#{mount_id}')
if (appElement) {{
  const el = appElement as any
  if (el.__vue_app__) {{
    el.__vue_app__.unmount()
  }}
  if (typeof App !== 'undefined') {{
    const app = createApp(App)
    app.mount('#{mount_id}')
  }}
}}"#
        ));
    } else if !code.contains("__vue_app__") {
        code = MOUNT_CALL_RE
            .replace_all(
                &code,
                r"${1}const appElement = document.querySelector('${3}')
${1}const el = appElement as any
${1}if (el && el.__vue_app__) {
${1}  el.__vue_app__.unmount()
${1}}
${1}const app = ${2}
${1}app.mount('${3}')",
            )
            .into_owned();
    }

    code
}
