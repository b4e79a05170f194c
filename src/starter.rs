//! Starter project shown before the user edits anything.

use crate::error::FileSetError;
use crate::files::{FileSet, SourceFile};

pub use crate::config::DEFAULT_ENTRY_FILE as ENTRY_FILE_NAME;
pub const APP_COMPONENT_FILE_NAME: &str = "App.vue";
pub const APP_CSS_FILE_NAME: &str = "App.css";
pub const IMPORT_MAP_FILE_NAME: &str = "import-map.json";

const IMPORT_MAP: &str = r#"{
  "imports": {
    "vue": "https://unpkg.com/vue@3/dist/vue.esm-browser.prod.js",
    "vue-router": "https://unpkg.com/vue-router@4/dist/vue-router.esm-browser.js"
  }
}"#;

const MAIN: &str = r#"import { createApp } from 'vue'
import App from './App.vue'
import './App.css'

const appContainer = document.querySelector('#app')

// Unmount the app left over from the previous run
if (appContainer && appContainer.__vue_app__) {
  appContainer.__vue_app__.unmount()
}

const app = createApp(App)
app.mount('#app')
"#;

const APP: &str = r#"<template>
  <div class="app">
    <img src="https://vuejs.org/images/logo.png" class="logo" alt="Vue logo" />
    <h1>Vue Playground</h1>
    <p>Edit <code>App.vue</code> to get started</p>
  </div>
</template>

<script setup>
// component logic
</script>

<style>
.app {
  text-align: center;
  padding: 2rem;
}

.logo {
  height: 6em;
  padding: 1.5em;
}

h1 {
  font-size: 2.5em;
  line-height: 1.1;
}
</style>
"#;

const APP_CSS: &str = r#"body {
  margin: 0;
  font-family: Inter, system-ui, Avenir, Helvetica, Arial, sans-serif;
  color: #213547;
  background-color: #ffffff;
}

#app {
  max-width: 1280px;
  margin: 0 auto;
  padding: 2rem;
}
"#;

/// The default four-file project: entry, root component, global styles and
/// import map.
pub fn starter_files() -> Result<FileSet, FileSetError> {
    [
        (ENTRY_FILE_NAME, MAIN),
        (APP_COMPONENT_FILE_NAME, APP),
        (APP_CSS_FILE_NAME, APP_CSS),
        (IMPORT_MAP_FILE_NAME, IMPORT_MAP),
    ]
    .into_iter()
    .map(|(name, content)| SourceFile::new(name, content))
    .collect()
}
