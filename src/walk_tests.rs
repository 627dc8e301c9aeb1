#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};
    use std::fs;
    use std::path::{Path, PathBuf};

    use crate::directives::DirectiveProvider;
    use crate::error::PackError;
    use crate::script::SourceScript;
    use crate::walk::{NoopChecker, ScriptChecker, ScriptSetProcessor};

    struct Layout {
        _dir: tempfile::TempDir,
        base: PathBuf,
        provider: DirectiveProvider,
    }

    fn layout(files: &[(&str, &str)]) -> Layout {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().to_path_buf();
        for sub in ["inc", "lib", "src", "opt"] {
            fs::create_dir_all(base.join(sub)).unwrap();
        }
        fs::write(base.join("inc/odfpack_import.py"), "import sys\n").unwrap();
        for (rel, content) in files {
            let path = base.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let provider = DirectiveProvider::create(
            &base.join("inc"),
            &base.join("lib"),
            &base.join("src"),
            &base.join("opt"),
            BTreeSet::new(),
        );
        Layout {
            _dir: dir,
            base,
            provider,
        }
    }

    fn root(layout: &Layout, rel: &str) -> SourceScript {
        SourceScript::new(layout.base.join(rel), layout.base.join("src"), true)
    }

    fn run(
        layout: &Layout,
        checker: &dyn ScriptChecker,
        roots: Vec<SourceScript>,
    ) -> Result<Vec<crate::script::TempScript>, PackError> {
        ScriptSetProcessor::new(
            &layout.provider,
            checker,
            layout.base.join("temp"),
            HashMap::new(),
            roots,
        )
        .process()
    }

    #[test]
    fn test_single_script_lands_in_temp_tree() {
        let layout = layout(&[("src/main.py", "x = 1\n")]);
        let scripts = run(&layout, &NoopChecker, vec![root(&layout, "src/main.py")]).unwrap();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].relative_path(), Path::new("main.py"));
        assert!(layout.base.join("temp/main.py").is_file());
    }

    #[test]
    fn test_mutual_imports_terminate() {
        let layout = layout(&[
            ("src/a.py", "# odfpack: import b\n"),
            ("src/b.py", "# odfpack: import a\n"),
        ]);
        let scripts = run(&layout, &NoopChecker, vec![root(&layout, "src/a.py")]).unwrap();
        let mut names: Vec<_> = scripts
            .iter()
            .map(|s| s.relative_path().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.py", "b.py"]);
    }

    #[test]
    fn test_shared_dependency_processed_once() {
        let layout = layout(&[
            ("src/a.py", "# odfpack: import common\n"),
            ("src/b.py", "# odfpack: import common\n"),
            ("src/common.py", "x = 1\n"),
        ]);
        let scripts = run(
            &layout,
            &NoopChecker,
            vec![root(&layout, "src/a.py"), root(&layout, "src/b.py")],
        )
        .unwrap();
        assert_eq!(scripts.len(), 3);
    }

    #[test]
    fn test_embedded_script_deduplicated() {
        let layout = layout(&[
            ("src/a.py", "# odfpack: embed script raw.py\n"),
            ("src/b.py", "# odfpack: embed script raw.py\n"),
            ("opt/raw.py", "payload = 1\n"),
        ]);
        let scripts = run(
            &layout,
            &NoopChecker,
            vec![root(&layout, "src/a.py"), root(&layout, "src/b.py")],
        )
        .unwrap();
        let raw_count = scripts
            .iter()
            .filter(|s| s.relative_path() == Path::new("raw.py"))
            .count();
        assert_eq!(raw_count, 1);
    }

    #[test]
    fn test_compile_failures_are_aggregated() {
        struct RejectMain;
        impl ScriptChecker for RejectMain {
            fn check(&self, path: &Path) -> Option<String> {
                path.ends_with("main.py").then(|| "bad syntax".to_string())
            }
        }

        let layout = layout(&[
            ("src/main.py", "# odfpack: import util\n"),
            ("src/util.py", "x = 1\n"),
        ]);
        let err = run(&layout, &RejectMain, vec![root(&layout, "src/main.py")]).unwrap_err();
        assert!(matches!(err, PackError::CompileErrors(1)));
        // the walk finished anyway: both temp files exist
        assert!(layout.base.join("temp/main.py").is_file());
        assert!(layout.base.join("temp/util.py").is_file());
    }

    #[test]
    fn test_missing_import_target_is_fatal() {
        let layout = layout(&[("src/main.py", "# odfpack: import ghost\n")]);
        let err = run(&layout, &NoopChecker, vec![root(&layout, "src/main.py")]).unwrap_err();
        assert!(matches!(err, PackError::MissingFile(_)));
    }
}
