//! Script and asset value types.
//!
//! A script moves through three states: `SourceScript` (a path in the
//! source tree), `TempScript` (transformed content in the temp tree) and
//! `DestinationScript` (the same content projected into the archive's
//! script directory). Assets follow the same source/destination pattern
//! but are never transformed.

use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::error::PackResult;

/// A script discovered in the source tree, identified by its path.
#[derive(Debug, Clone, Eq)]
pub struct SourceScript {
    pub path: PathBuf,
    pub source_dir: PathBuf,
    /// Whether a `g_exportedScripts` declaration should be generated.
    pub export_funcs: bool,
}

impl SourceScript {
    pub fn new(path: PathBuf, source_dir: PathBuf, export_funcs: bool) -> Self {
        SourceScript {
            path,
            source_dir,
            export_funcs,
        }
    }

    pub fn relative_path(&self) -> PathBuf {
        self.path
            .strip_prefix(&self.source_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| self.path.clone())
    }
}

// Identity is the path alone: the visited set of the dependency walk
// must treat the same file reached through two roots as one node.
impl PartialEq for SourceScript {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Hash for SourceScript {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// The transformed text of one script plus its exported names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedScriptContent {
    pub text: String,
    pub exported_func_names: Vec<String>,
}

/// The output of transforming one `SourceScript`, rooted in the temp dir.
#[derive(Debug, Clone)]
pub struct TempScript {
    pub path: PathBuf,
    pub content: Vec<u8>,
    pub temp_dir: PathBuf,
    pub exported_func_names: Vec<String>,
    /// Compile-check failure captured during the walk, surfaced at the end.
    pub error: Option<String>,
}

impl TempScript {
    pub fn relative_path(&self) -> PathBuf {
        self.path
            .strip_prefix(&self.temp_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| self.path.clone())
    }

    /// Project the same logical script into another output root without
    /// re-deriving its content.
    pub fn to_destination(&self, dest_dir: &Path) -> DestinationScript {
        DestinationScript {
            path: dest_dir.join(self.relative_path()),
            content: self.content.clone(),
            dest_dir: dest_dir.to_path_buf(),
            exported_func_names: self.exported_func_names.clone(),
            error: self.error.clone(),
        }
    }
}

/// A script as it will appear inside the container.
#[derive(Debug, Clone)]
pub struct DestinationScript {
    pub path: PathBuf,
    pub content: Vec<u8>,
    pub dest_dir: PathBuf,
    pub exported_func_names: Vec<String>,
    pub error: Option<String>,
}

impl DestinationScript {
    pub fn relative_path(&self) -> PathBuf {
        self.path
            .strip_prefix(&self.dest_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| self.path.clone())
    }

    /// Dotted module name of the script, e.g. `pkg.mod` for `pkg/mod.py`.
    pub fn dest_name(&self) -> String {
        let rel = self.relative_path();
        let mut parts: Vec<String> = rel
            .parent()
            .into_iter()
            .flat_map(|p| p.components())
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if let Some(stem) = rel.file_stem() {
            parts.push(stem.to_string_lossy().into_owned());
        }
        parts.join(".")
    }

    /// Archive entry name, always `/`-separated. The destination root is
    /// itself archive-internal (e.g. `Scripts/python`), so the full path
    /// is the entry name.
    pub fn arc_name(&self) -> String {
        zip_path(&self.path)
    }
}

/// A verbatim binary payload in the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAsset {
    pub path: PathBuf,
    pub assets_dir: PathBuf,
}

impl SourceAsset {
    pub fn to_destination(&self, assets_dest_dir: &Path) -> PackResult<DestinationAsset> {
        let rel = self
            .path
            .strip_prefix(&self.assets_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| self.path.clone());
        Ok(DestinationAsset {
            path: assets_dest_dir.join(rel),
            content: fs::read(&self.path)?,
        })
    }
}

/// An asset with its content, ready to be written into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationAsset {
    pub path: PathBuf,
    pub content: Vec<u8>,
}

impl DestinationAsset {
    pub fn arc_name(&self) -> String {
        zip_path(&self.path)
    }
}

/// Render a path with `/` separators for use as an archive entry name.
pub fn zip_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
