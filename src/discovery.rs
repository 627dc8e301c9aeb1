//! Source-tree discovery.
//!
//! Scans the project layout (entry scripts, includes, libraries,
//! optional verbatim scripts, assets) and derives the module-name set
//! used by the `entry` directive's cache purge.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::error::{PackError, PackResult};
use crate::script::{DestinationAsset, DestinationScript, SourceAsset, SourceScript, TempScript};

/// The source side of a build: one pre-existing container document plus
/// the directories scripts and assets are gathered from.
#[derive(Debug, Clone)]
pub struct Sources {
    pub source_file: PathBuf,
    pub inc_dir: PathBuf,
    pub lib_dir: PathBuf,
    pub src_dir: PathBuf,
    pub src_ignore: Vec<String>,
    pub opt_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub assets_ignore: Vec<String>,
}

impl Sources {
    pub fn src_paths(&self) -> PackResult<Vec<PathBuf>> {
        find_paths(&self.src_dir, &self.src_ignore, Some("py"))
    }

    pub fn src_scripts(&self) -> PackResult<Vec<SourceScript>> {
        Ok(self
            .src_paths()?
            .into_iter()
            .map(|p| SourceScript::new(p, self.src_dir.clone(), true))
            .collect())
    }

    pub fn assets(&self) -> PackResult<Vec<SourceAsset>> {
        Ok(find_paths(&self.assets_dir, &self.assets_ignore, None)?
            .into_iter()
            .map(|p| SourceAsset {
                path: p,
                assets_dir: self.assets_dir.clone(),
            })
            .collect())
    }

    /// Module names of the source tree alone.
    pub fn module_names(&self) -> PackResult<BTreeSet<String>> {
        module_names_in(&self.src_dir, &self.src_ignore, Some("py"))
    }

    /// Module names of everything that can end up in the archive:
    /// source tree, libraries, verbatim scripts.
    pub fn all_module_names(&self) -> PackResult<BTreeSet<String>> {
        let mut names = module_names_in(&self.src_dir, &self.src_ignore, Some("py"))?;
        names.extend(module_names_in(&self.lib_dir, &self.src_ignore, Some("py"))?);
        names.extend(module_names_in(&self.opt_dir, &self.src_ignore, Some("py"))?);
        Ok(names)
    }
}

/// The destination side: the container to produce and the roots the
/// transformed artifacts are projected into.
#[derive(Debug, Clone)]
pub struct Destinations {
    pub dest_file: PathBuf,
    pub temp_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub assets_dest_dir: PathBuf,
}

impl Destinations {
    pub fn to_destination_scripts(&self, temp_scripts: &[TempScript]) -> Vec<DestinationScript> {
        temp_scripts
            .iter()
            .map(|ts| ts.to_destination(&self.dest_dir))
            .collect()
    }

    pub fn to_destination_assets(
        &self,
        source_assets: &[SourceAsset],
    ) -> PackResult<Vec<DestinationAsset>> {
        source_assets
            .iter()
            .map(|sa| sa.to_destination(&self.assets_dest_dir))
            .collect()
    }
}

/// Walk a directory, keeping files that match the extension filter and
/// none of the ignore patterns. Results are sorted for determinism.
fn find_paths(dir: &Path, ignore: &[String], ext: Option<&str>) -> PackResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let ignore_res = compile_patterns(ignore)?;
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| PackError::Io(e.into()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(ext) = ext {
            if path.extension().map(|e| e == ext) != Some(true) {
                continue;
            }
        }
        let name = entry.file_name().to_string_lossy();
        if ignore_res.iter().any(|re| re.is_match(&name)) {
            continue;
        }
        paths.push(path.to_path_buf());
    }
    paths.sort();
    Ok(paths)
}

/// Compile `*`-wildcard ignore patterns into anchored regexes.
fn compile_patterns(patterns: &[String]) -> PackResult<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            let escaped = regex::escape(p).replace(r"\*", ".*");
            Regex::new(&format!("^{}$", escaped))
                .map_err(|e| PackError::Config(format!("bad ignore pattern '{}': {}", p, e)))
        })
        .collect()
}

/// Dotted module names for every script under `dir`: `pkg/mod.py`
/// becomes `pkg.mod`, `__init__`/`__main__` collapse to their package,
/// `__pycache__` is skipped.
fn module_names_in(
    dir: &Path,
    ignore: &[String],
    ext: Option<&str>,
) -> PackResult<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for path in find_paths(dir, ignore, ext)? {
        let rel = path
            .strip_prefix(dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.clone());
        let mut rel = rel.with_extension("");
        let first = rel
            .components()
            .next()
            .map(|c| c.as_os_str().to_string_lossy().into_owned());
        if first.as_deref() == Some("__pycache__") {
            continue;
        }
        let stem = rel.file_name().map(|n| n.to_string_lossy().into_owned());
        if matches!(stem.as_deref(), Some("__init__") | Some("__main__")) {
            rel = rel.parent().map(Path::to_path_buf).unwrap_or_default();
        }
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(".");
        if !name.is_empty() {
            names.insert(name);
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_module_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::create_dir_all(dir.path().join("__pycache__")).unwrap();
        fs::write(dir.path().join("main.py"), "").unwrap();
        fs::write(dir.path().join("pkg/mod.py"), "").unwrap();
        fs::write(dir.path().join("pkg/__init__.py"), "").unwrap();
        fs::write(dir.path().join("__pycache__/junk.py"), "").unwrap();

        let names = module_names_in(dir.path(), &[], Some("py")).unwrap();
        let expected: BTreeSet<String> = ["main", "pkg", "pkg.mod"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_ignore_patterns() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.py"), "").unwrap();
        fs::write(dir.path().join("test_skip.py"), "").unwrap();

        let ignore = vec!["test_*".to_string()];
        let paths = find_paths(dir.path(), &ignore, Some("py")).unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("keep.py"));
    }
}
