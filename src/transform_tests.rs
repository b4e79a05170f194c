//! Module Transformer Tests
//!
//! End-to-end checks of the transform pipeline:
//! - relative imports are replaced by inline module references, recursively
//! - the cache reuses unchanged dependencies and rebuilds stale ones
//! - import cycles and broken dependencies are handled explicitly
//! - asset files become side-effect or default-export modules

#[cfg(test)]
mod tests {
    use crate::assets::decode_inline_module_reference;
    use crate::config::PreviewConfig;
    use crate::error::CompileError;
    use crate::files::FileSet;
    use crate::transform::ModuleTransformer;

    const DATA_URL_PREFIX: &str = "data:application/javascript;base64,";

    fn transformer() -> ModuleTransformer {
        ModuleTransformer::new(PreviewConfig::default()).with_stamp(|| 1)
    }

    fn file_set(files: &[(&str, &str)]) -> FileSet {
        let mut set = FileSet::new();
        for (name, content) in files {
            set = set.with_file(*name, *content).unwrap();
        }
        set
    }

    /// Every inline module reference in `code`, decoded, in order of appearance.
    fn inlined_modules(code: &str) -> Vec<String> {
        let mut modules = Vec::new();
        let mut rest = code;
        while let Some(start) = rest.find(DATA_URL_PREFIX) {
            let tail = &rest[start..];
            let end = tail
                .find(|c: char| c == '"' || c == '\'')
                .unwrap_or(tail.len());
            modules.push(decode_inline_module_reference(&tail[..end]).unwrap());
            rest = &tail[end..];
        }
        modules
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // ENTRY MODULE
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_plain_entry() {
        let code = transformer()
            .compile(&file_set(&[("main.ts", "const x = 1")]))
            .unwrap();
        assert!(code.contains("const x = 1"));
        assert!(code.contains("createApp"));
        assert!(code.contains("document.querySelector("));
    }

    #[test]
    fn test_types_are_stripped() {
        let source = "interface Point { x: number }\nconst p: Point = { x: 1 }\nconsole.log(p as Point)\n";
        let code = transformer()
            .compile(&file_set(&[("main.ts", source)]))
            .unwrap();
        assert!(!code.contains("interface"));
        assert!(!code.contains(": Point"));
        assert!(!code.contains(" as "));
    }

    #[test]
    fn test_missing_and_blank_entry() {
        let mut transformer = transformer();
        assert_eq!(
            transformer.compile(&file_set(&[("App.vue", "<template/>")])),
            Err(CompileError::EntryMissing {
                name: "main.ts".to_string()
            })
        );
        assert_eq!(
            transformer.compile(&file_set(&[("main.ts", "  \n\t")])),
            Err(CompileError::EntryMissing {
                name: "main.ts".to_string()
            })
        );
    }

    #[test]
    fn test_entry_parse_error() {
        let err = transformer()
            .compile(&file_set(&[("main.ts", "const = ;")]))
            .unwrap_err();
        assert!(matches!(err, CompileError::Parse { ref file, .. } if file == "main.ts"));
    }

    #[test]
    fn test_custom_entry_file() {
        let config = PreviewConfig {
            entry_file: "index.ts".to_string(),
            ..PreviewConfig::default()
        };
        let mut transformer = ModuleTransformer::new(config);
        let code = transformer
            .compile(&file_set(&[("index.ts", "export const ok = true")]))
            .unwrap();
        assert!(code.contains("export const ok = true"));
    }

    #[test]
    fn test_tsx_file() {
        let mut transformer = transformer();
        let files = file_set(&[("view.tsx", "export const el = <div class=\"a\">hi</div>\n")]);
        let module = transformer.transform_file("view.tsx", &files).unwrap();
        assert!(!module.code.contains("<div"));
        assert!(module.code.contains("export const el"));
        assert!(module.code.contains("h(\"div\""));
        assert!(module.code.contains("from \"vue\""));
        assert!(!module.code.contains("react"));
    }

    #[test]
    fn test_jsx_fragment_uses_framework_exports() {
        let mut transformer = transformer();
        let files = file_set(&[("list.jsx", "export const el = <><b>x</b></>\n")]);
        let module = transformer.transform_file("list.jsx", &files).unwrap();
        assert!(module.code.contains("import { h, Fragment } from \"vue\""));
        assert!(module.code.contains("h(Fragment"));
        assert!(module.code.contains("h(\"b\""));
        assert!(!module.code.contains("react"));
    }

    #[test]
    fn test_jsx_keeps_existing_factory_import() {
        let mut transformer = transformer();
        let source = "import { h, Fragment } from 'vue'\nexport const el = <><i/></>\n";
        let files = file_set(&[("icon.jsx", source)]);
        let module = transformer.transform_file("icon.jsx", &files).unwrap();
        assert_eq!(module.code.matches("from \"vue\"").count(), 1);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // RESOLUTION
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_nested_imports_are_inlined() {
        let files = file_set(&[
            ("main.ts", "import { a } from './a'\nconsole.log(a)\n"),
            ("a.ts", "import { b } from './b'\nexport const a = b + 1\n"),
            ("b.ts", "export const b = 1\n"),
        ]);
        let code = transformer().compile(&files).unwrap();

        assert!(!code.contains("'./a'") && !code.contains("\"./a\""));
        assert!(!code.contains("'./b'") && !code.contains("\"./b\""));

        let outer = inlined_modules(&code);
        assert_eq!(outer.len(), 1);
        assert!(outer[0].contains("export const a = b + 1"));
        assert!(!outer[0].contains("./b"));

        let inner = inlined_modules(&outer[0]);
        assert_eq!(inner.len(), 1);
        assert!(inner[0].contains("export const b = 1"));
    }

    #[test]
    fn test_transform_file_reports_dependencies() {
        let files = file_set(&[
            ("main.ts", "import { a } from './a'\nconsole.log(a)\n"),
            ("a.ts", "import { b } from './b'\nexport const a = b + 1\n"),
            ("b.ts", "export const b = 1\n"),
        ]);
        let module = transformer().transform_file("main.ts", &files).unwrap();
        let present: Vec<&str> = module
            .dependencies
            .iter()
            .filter(|(_, fingerprint)| fingerprint.is_some())
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(present, vec!["a.ts", "b.ts"]);
        assert_eq!(
            module.dependencies["b.ts"],
            Some(files.get("b.ts").unwrap().fingerprint())
        );
        // Extensionless names tried before the match are recorded as absent.
        assert_eq!(module.dependencies["a"], None);
        assert_eq!(module.dependencies["b"], None);
    }

    #[test]
    fn test_re_exports_are_inlined() {
        let files = file_set(&[
            ("main.ts", "export * from './a'\nexport { b } from './b'\n"),
            ("a.ts", "export const a = 1\n"),
            ("b.ts", "export const b = 2\n"),
        ]);
        let module = transformer().transform_file("main.ts", &files).unwrap();
        assert_eq!(inlined_modules(&module.code).len(), 2);
        assert!(!module.code.contains("./a"));
        assert!(!module.code.contains("./b"));
    }

    #[test]
    fn test_unresolved_import_is_left_untouched() {
        let files = file_set(&[(
            "main.ts",
            "import { x } from './missing'\nimport { ref } from 'vue'\nconsole.log(x, ref)\n",
        )]);
        let code = transformer().compile(&files).unwrap();
        assert!(code.contains("./missing"));
        assert!(code.contains("vue"));
        assert!(inlined_modules(&code).is_empty());
    }

    #[test]
    fn test_broken_dependency_is_left_untouched() {
        let files = file_set(&[
            ("main.ts", "import { a } from './a'\nconsole.log(a)\n"),
            ("a.ts", "export const = ;\n"),
        ]);
        let code = transformer().compile(&files).unwrap();
        assert!(code.contains("./a"));
    }

    #[test]
    fn test_nested_directories() {
        let files = file_set(&[
            ("main.ts", "import { card } from './components/card'\nconsole.log(card)\n"),
            ("components/card.ts", "import { tone } from '../theme'\nexport const card = tone\n"),
            ("theme.ts", "export const tone = 'dark'\n"),
        ]);
        let code = transformer().compile(&files).unwrap();
        let outer = inlined_modules(&code);
        assert_eq!(outer.len(), 1);
        let inner = inlined_modules(&outer[0]);
        assert!(inner[0].contains("export const tone ="));
        assert!(inner[0].contains("dark"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // CYCLES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_circular_import_is_an_error() {
        let files = file_set(&[
            ("main.ts", "import './a'\n"),
            ("a.ts", "import './b'\nexport const a = 1\n"),
            ("b.ts", "import './a'\nexport const b = 2\n"),
        ]);
        let err = transformer().compile(&files).unwrap_err();
        assert_eq!(
            err,
            CompileError::CircularImport {
                chain: vec!["a.ts".into(), "b.ts".into(), "a.ts".into()]
            }
        );
        assert_eq!(err.to_string(), "circular import: a.ts -> b.ts -> a.ts");
    }

    #[test]
    fn test_self_import_is_an_error() {
        let files = file_set(&[("main.ts", "import './main'\nexport const m = 1\n")]);
        let err = transformer().compile(&files).unwrap_err();
        assert_eq!(
            err,
            CompileError::CircularImport {
                chain: vec!["main.ts".into(), "main.ts".into()]
            }
        );
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // CACHE
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_cache_rebuilds_only_the_changed_file() {
        let main = "import { a } from './a'\nimport { b } from './b'\nconsole.log(a, b)\n";
        let mut transformer = transformer();

        transformer
            .compile(&file_set(&[
                ("main.ts", main),
                ("a.ts", "export const a = 1\n"),
                ("b.ts", "export const b = 1\n"),
            ]))
            .unwrap();
        let first = transformer.cache_mut().take_stats();
        assert_eq!(first.misses, vec!["a.ts", "b.ts"]);
        assert!(first.hits.is_empty());

        let code = transformer
            .compile(&file_set(&[
                ("main.ts", main),
                ("a.ts", "export const a = 1\n"),
                ("b.ts", "export const b = 2\n"),
            ]))
            .unwrap();
        let second = transformer.cache_mut().take_stats();
        assert_eq!(second.hits, vec!["a.ts"]);
        assert_eq!(second.misses, vec!["b.ts"]);
        assert!(inlined_modules(&code)
            .iter()
            .any(|m| m.contains("export const b = 2")));
    }

    #[test]
    fn test_stale_inlined_dependency_invalidates_importer() {
        let main = "import { a } from './a'\nconsole.log(a)\n";
        let a = "import { b } from './b'\nexport const a = b\n";
        let mut transformer = transformer();

        transformer
            .compile(&file_set(&[("main.ts", main), ("a.ts", a), ("b.ts", "export const b = 1\n")]))
            .unwrap();
        transformer.cache_mut().take_stats();

        let code = transformer
            .compile(&file_set(&[("main.ts", main), ("a.ts", a), ("b.ts", "export const b = 2\n")]))
            .unwrap();
        let stats = transformer.cache_mut().take_stats();
        assert_eq!(stats.misses, vec!["a.ts", "b.ts"]);

        let outer = inlined_modules(&code);
        assert!(inlined_modules(&outer[0])[0].contains("export const b = 2"));
    }

    #[test]
    fn test_fixed_dependency_invalidates_importer() {
        let main = "import { a } from './a'\nconsole.log(a)\n";
        let a = "import { b } from './b'\nexport const a = b\n";
        let mut transformer = transformer();

        let code = transformer
            .compile(&file_set(&[("main.ts", main), ("a.ts", a), ("b.ts", "export const = ;\n")]))
            .unwrap();
        assert!(inlined_modules(&code)[0].contains("./b"));
        transformer.cache_mut().take_stats();

        let code = transformer
            .compile(&file_set(&[("main.ts", main), ("a.ts", a), ("b.ts", "export const b = 2\n")]))
            .unwrap();
        let stats = transformer.cache_mut().take_stats();
        assert_eq!(stats.misses, vec!["a.ts", "b.ts"]);
        assert!(stats.hits.is_empty());

        let outer = inlined_modules(&code);
        assert!(!outer[0].contains("./b"));
        assert!(inlined_modules(&outer[0])[0].contains("export const b = 2"));
    }

    #[test]
    fn test_created_dependency_invalidates_importer() {
        let main = "import { a } from './a'\nconsole.log(a)\n";
        let a = "import { b } from './b'\nexport const a = b\n";
        let mut transformer = transformer();

        let code = transformer
            .compile(&file_set(&[("main.ts", main), ("a.ts", a)]))
            .unwrap();
        assert!(inlined_modules(&code)[0].contains("./b"));
        transformer.cache_mut().take_stats();

        let code = transformer
            .compile(&file_set(&[("main.ts", main), ("a.ts", a), ("b.js", "export const b = 3\n")]))
            .unwrap();
        let stats = transformer.cache_mut().take_stats();
        assert_eq!(stats.misses, vec!["a.ts", "b.js"]);

        let outer = inlined_modules(&code);
        assert!(!outer[0].contains("./b"));
        assert!(inlined_modules(&outer[0])[0].contains("export const b = 3"));
    }

    #[test]
    fn test_broken_dependency_stays_cached_while_unchanged() {
        let main = "import { a } from './a'\nconsole.log(a)\n";
        let files = file_set(&[
            ("main.ts", main),
            ("a.ts", "import { b } from './b'\nexport const a = b\n"),
            ("b.ts", "export const = ;\n"),
        ]);
        let mut transformer = transformer();
        transformer.compile(&files).unwrap();
        transformer.cache_mut().take_stats();

        transformer.compile(&files).unwrap();
        let stats = transformer.cache_mut().take_stats();
        assert_eq!(stats.hits, vec!["a.ts"]);
        assert!(stats.misses.is_empty());
    }

    #[test]
    fn test_unchanged_recompile_is_identical() {
        let files = file_set(&[
            ("main.ts", "import { a } from './a'\nconsole.log(a)\n"),
            ("a.ts", "export const a = 1\n"),
        ]);
        let mut transformer = transformer();
        let first = transformer.compile(&files).unwrap();
        transformer.cache_mut().take_stats();
        let second = transformer.compile(&files).unwrap();
        assert_eq!(first, second);
        assert_eq!(transformer.cache_mut().take_stats().hits, vec!["a.ts"]);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // COMPONENTS AND ASSETS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_style_only_component() {
        let files = file_set(&[
            (
                "main.ts",
                "import { createApp } from 'vue'\nimport App from './App.vue'\ncreateApp(App).mount('#app')\n",
            ),
            ("App.vue", "<style>\n.app { color: red; }\n</style>"),
        ]);
        let code = transformer().compile(&files).unwrap();
        assert!(!code.contains("./App.vue"));

        let app = &inlined_modules(&code)[0];
        assert!(app.contains("render()"));
        assert!(app.contains("innerHTML: ``"));
        assert!(app.contains("document.head.appendChild(style)"));
        assert!(app.contains("App.vue-1"));
    }

    #[test]
    fn test_component_with_setup_script() {
        let files = file_set(&[
            ("main.ts", "import App from './App.vue'\nconsole.log(App)\n"),
            (
                "App.vue",
                "<template><p>{{ n }}</p></template>\n<script setup lang=\"ts\">\nimport { ref } from 'vue'\nconst n = ref<number>(1)\n</script>",
            ),
        ]);
        let code = transformer().compile(&files).unwrap();
        let app = &inlined_modules(&code)[0];
        assert!(app.contains("setup()"));
        assert!(app.contains("ref(1)"));
        assert!(app.contains("import { h, ref }") || app.contains("import { ref }"));
    }

    #[test]
    fn test_json_and_css_dependencies() {
        let files = file_set(&[
            (
                "main.ts",
                "import data from './data.json'\nimport './theme.css'\nconsole.log(data)\n",
            ),
            ("data.json", "{ \"title\": \"hi\" }"),
            ("theme.css", "body { margin: 0; }"),
        ]);
        let code = transformer().compile(&files).unwrap();
        let modules = inlined_modules(&code);
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0], "export default { \"title\": \"hi\" }");
        assert!(modules[1].contains("String.raw`body { margin: 0; }`"));
        assert!(modules[1].contains("style_1_theme.css"));
    }

    #[test]
    fn test_extensionless_component_import() {
        let files = file_set(&[
            ("main.ts", "import Card from './Card'\nconsole.log(Card)\n"),
            ("Card.vue", "<template><div/></template>"),
        ]);
        let code = transformer().compile(&files).unwrap();
        assert!(!code.contains("./Card"));
        assert!(inlined_modules(&code)[0].contains("render()"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // DEGRADED RETRY
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_marker_failure_is_retried_then_degraded() {
        let config = PreviewConfig {
            entry_file: "inmemory://model/main.ts".to_string(),
            ..PreviewConfig::default()
        };
        let mut transformer = ModuleTransformer::new(config);
        let files = file_set(&[("inmemory://model/main.ts", "const = ;")]);
        let err = transformer.compile(&files).unwrap_err();
        assert!(matches!(err, CompileError::Degraded { .. }));
        assert!(err.to_string().ends_with("Check the syntax and import statements"));
    }
}
