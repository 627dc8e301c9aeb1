#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::Path;

    use crate::directives::{
        strip_source, Directive, DirectiveContext, DirectiveProvider, ScriptRegistry,
        HELPER_LIB, IMPORT_SNIPPET,
    };
    use crate::error::PackError;
    use crate::script::{SourceScript, TempScript};

    #[derive(Default)]
    struct RecordingRegistry {
        appended: Vec<SourceScript>,
        added: Vec<TempScript>,
    }

    impl ScriptRegistry for RecordingRegistry {
        fn append_script(&mut self, script: SourceScript) {
            self.appended.push(script);
        }

        fn add_script(&mut self, script: TempScript) {
            self.added.push(script);
        }
    }

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn provider_for(base: &Path) -> DirectiveProvider {
        DirectiveProvider::create(
            &base.join("inc"),
            &base.join("lib"),
            &base.join("src"),
            &base.join("opt"),
            BTreeSet::new(),
        )
    }

    // ─── trie dispatch ───

    #[test]
    fn test_lookup_prefers_longest_prefix() {
        let provider = provider_for(Path::new("proj"));
        let args = tokens(&["embed", "lib", "toolkit"]);
        let (directive, rest) = provider.get(&args).unwrap();
        assert!(matches!(directive, Directive::EmbedLib { .. }));
        assert_eq!(rest, &args[2..]);
    }

    #[test]
    fn test_lookup_falls_back_to_shorter_prefix() {
        let provider = provider_for(Path::new("proj"));
        let args = tokens(&["import", "mymodule"]);
        let (directive, rest) = provider.get(&args).unwrap();
        assert!(matches!(directive, Directive::Import { .. }));
        assert_eq!(rest, &args[1..]);
    }

    #[test]
    fn test_lookup_consumes_two_token_signature() {
        let provider = provider_for(Path::new("proj"));
        let args = tokens(&["import", "lib", "helper"]);
        let (directive, rest) = provider.get(&args).unwrap();
        assert!(matches!(directive, Directive::ImportLib { .. }));
        assert_eq!(rest, &args[2..]);
    }

    #[test]
    fn test_lookup_empty_is_fatal() {
        let provider = provider_for(Path::new("proj"));
        assert!(matches!(provider.get(&[]), Err(PackError::EmptyDirective)));
    }

    #[test]
    fn test_lookup_unknown_is_tolerated() {
        let provider = provider_for(Path::new("proj"));
        let err = provider.get(&tokens(&["frobnicate", "x"])).unwrap_err();
        assert!(err.is_tolerated());
        assert!(matches!(err, PackError::UnknownDirective(_)));
    }

    // ─── execution ───

    #[test]
    fn test_include_wraps_snippet_in_provenance_comments() {
        let dir = tempfile::tempdir().unwrap();
        let inc = dir.path().join("inc");
        fs::create_dir_all(&inc).unwrap();
        fs::write(inc.join("greeting.py"), "print('hello')\n").unwrap();

        let directive = Directive::Include { inc_dir: inc };
        let mut registry = RecordingRegistry::default();
        let mut bootstrapped = false;
        let mut ctx = DirectiveContext::new(&mut registry, &mut bootstrapped);
        directive.execute(&mut ctx, &tokens(&["greeting.py"])).unwrap();

        assert_eq!(
            ctx.out,
            vec![
                "# begin odfpack include: greeting.py",
                "print('hello')",
                "# end odfpack include",
            ]
        );
    }

    #[test]
    fn test_include_missing_snippet_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let directive = Directive::Include {
            inc_dir: dir.path().to_path_buf(),
        };
        let mut registry = RecordingRegistry::default();
        let mut bootstrapped = false;
        let mut ctx = DirectiveContext::new(&mut registry, &mut bootstrapped);
        let err = directive
            .execute(&mut ctx, &tokens(&["nope.py"]))
            .unwrap_err();
        assert!(matches!(err, PackError::MissingFile(_)));
        assert!(!err.is_tolerated());
    }

    #[test]
    fn test_import_registers_dependency_and_bootstraps_once() {
        let dir = tempfile::tempdir().unwrap();
        let inc = dir.path().join("inc");
        let src = dir.path().join("src");
        fs::create_dir_all(&inc).unwrap();
        fs::create_dir_all(&src).unwrap();
        fs::write(inc.join(IMPORT_SNIPPET), "import sys\n").unwrap();
        fs::write(src.join("util.py"), "").unwrap();
        fs::write(src.join("extra.py"), "").unwrap();

        let directive = Directive::Import {
            inc_dir: inc,
            src_dir: src.clone(),
        };
        let mut registry = RecordingRegistry::default();
        let mut bootstrapped = false;

        let mut ctx = DirectiveContext::new(&mut registry, &mut bootstrapped);
        directive.execute(&mut ctx, &tokens(&["util"])).unwrap();
        let first = ctx.out.clone();
        assert!(first.iter().any(|l| l == "import util"));
        assert!(first.iter().any(|l| l.contains(IMPORT_SNIPPET)));

        // second import in the same script: no second bootstrap
        let mut ctx = DirectiveContext::new(&mut registry, &mut bootstrapped);
        directive.execute(&mut ctx, &tokens(&["extra"])).unwrap();
        assert_eq!(ctx.out, vec!["import extra"]);

        assert_eq!(registry.appended.len(), 2);
        assert_eq!(registry.appended[0].path, src.join("util.py"));
        assert!(registry.appended[0].export_funcs);
    }

    #[test]
    fn test_import_lib_helper_gets_init_hook() {
        let dir = tempfile::tempdir().unwrap();
        let inc = dir.path().join("inc");
        let lib = dir.path().join("lib");
        fs::create_dir_all(&inc).unwrap();
        fs::create_dir_all(&lib).unwrap();
        fs::write(inc.join(IMPORT_SNIPPET), "").unwrap();
        fs::write(lib.join(format!("{}.py", HELPER_LIB)), "").unwrap();

        let directive = Directive::ImportLib {
            inc_dir: inc,
            lib_dir: lib,
        };
        let mut registry = RecordingRegistry::default();
        let mut bootstrapped = false;
        let mut ctx = DirectiveContext::new(&mut registry, &mut bootstrapped);
        directive.execute(&mut ctx, &tokens(&[HELPER_LIB])).unwrap();

        let text = ctx.out.join("\n");
        assert!(text.contains(&format!("import {}", HELPER_LIB)));
        assert!(text.contains(&format!("{}.init(XSCRIPTCONTEXT)", HELPER_LIB)));
        assert!(text.contains("except NameError:"));
        assert!(!registry.appended[0].export_funcs);
    }

    #[test]
    fn test_embed_lib_directory_expands_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("lib");
        fs::create_dir_all(lib.join("toolkit")).unwrap();
        fs::write(lib.join("toolkit/zeta.py"), "").unwrap();
        fs::write(lib.join("toolkit/alpha.py"), "").unwrap();
        fs::write(lib.join("toolkit/readme.txt"), "").unwrap();

        let directive = Directive::EmbedLib { lib_dir: lib };
        let mut registry = RecordingRegistry::default();
        let mut bootstrapped = false;
        let mut ctx = DirectiveContext::new(&mut registry, &mut bootstrapped);
        directive.execute(&mut ctx, &tokens(&["toolkit"])).unwrap();

        // no emitted code, only registrations, .py only, sorted
        assert!(ctx.out.is_empty());
        let names: Vec<_> = registry
            .appended
            .iter()
            .map(|s| s.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["alpha.py", "zeta.py"]);
    }

    #[test]
    fn test_embed_script_is_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let opt = dir.path().join("opt");
        fs::create_dir_all(&opt).unwrap();
        // directive lines inside survive untouched
        fs::write(opt.join("raw.py"), "# odfpack: if 1 == 2\nx = 1\n").unwrap();

        let directive = Directive::EmbedScript {
            opt_dir: opt.clone(),
        };
        let mut registry = RecordingRegistry::default();
        let mut bootstrapped = false;
        let mut ctx = DirectiveContext::new(&mut registry, &mut bootstrapped);
        directive.execute(&mut ctx, &tokens(&["raw.py"])).unwrap();

        assert_eq!(registry.added.len(), 1);
        assert_eq!(
            registry.added[0].content,
            b"# odfpack: if 1 == 2\nx = 1\n".to_vec()
        );
        assert_eq!(registry.added[0].relative_path(), Path::new("raw.py"));
    }

    // ─── source stripping ───

    #[test]
    fn test_strip_source_removes_comments_and_docstrings() {
        let text = concat!(
            "# a comment\n",
            "\"\"\"module\n",
            "docstring\n",
            "\"\"\"\n",
            "x = 1\n",
            "'''one-liner'''\n",
            "y = 2\n",
            "\n",
            "\n",
        );
        assert_eq!(strip_source(text), vec!["x = 1", "y = 2"]);
    }

    #[test]
    fn test_strip_source_keeps_code_inside_nothing() {
        assert_eq!(strip_source("a = 1\nb = 2"), vec!["a = 1", "b = 2"]);
    }
}
