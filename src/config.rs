//! Project configuration.
//!
//! One JSON file per project describes where the sources live, where
//! the output container goes, and the build variables available to
//! conditional compilation. Every field has a default so a minimal
//! project only names its source document.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::discovery::{Destinations, Sources};
use crate::error::{PackError, PackResult};

pub const DEFAULT_CONFIG_FILE: &str = "odfpack.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// The pre-existing container document scripts are injected into.
    pub source_file: PathBuf,
    /// Suffix used to derive the destination file name when `dest_file`
    /// is not set: `calc.ods` becomes `calc-packed.ods`.
    pub suffix: String,
    pub dest_file: Option<PathBuf>,

    pub src_dir: PathBuf,
    pub src_ignore: Vec<String>,
    pub inc_dir: PathBuf,
    pub lib_dir: PathBuf,
    pub opt_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub assets_ignore: Vec<String>,

    pub temp_dir: PathBuf,
    /// Archive-internal root for scripts.
    pub dest_dir: PathBuf,
    /// Archive-internal root for assets.
    pub assets_dest_dir: PathBuf,

    /// Exposed to branch conditions as `$python_version`.
    pub python_version: String,
    /// Host application launched by the `run` subcommand.
    pub office_exe: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            source_file: PathBuf::from("document.ods"),
            suffix: "packed".to_string(),
            dest_file: None,
            src_dir: PathBuf::from("src"),
            src_ignore: Vec::new(),
            inc_dir: PathBuf::from("inc"),
            lib_dir: PathBuf::from("lib"),
            opt_dir: PathBuf::from("opt"),
            assets_dir: PathBuf::from("assets"),
            assets_ignore: Vec::new(),
            temp_dir: PathBuf::from("target/odfpack"),
            dest_dir: PathBuf::from("Scripts/python"),
            assets_dest_dir: PathBuf::from("Assets"),
            python_version: "3".to_string(),
            office_exe: None,
        }
    }
}

impl BuildConfig {
    pub fn load(path: &Path) -> PackResult<BuildConfig> {
        let file = File::open(path).map_err(|e| {
            PackError::Config(format!("cannot open {}: {}", path.display(), e))
        })?;
        serde_json::from_reader(file)
            .map_err(|e| PackError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Resolve source directories against the project base directory.
    pub fn sources(&self, base: &Path) -> Sources {
        Sources {
            source_file: base.join(&self.source_file),
            inc_dir: base.join(&self.inc_dir),
            lib_dir: base.join(&self.lib_dir),
            src_dir: base.join(&self.src_dir),
            src_ignore: self.src_ignore.clone(),
            opt_dir: base.join(&self.opt_dir),
            assets_dir: base.join(&self.assets_dir),
            assets_ignore: self.assets_ignore.clone(),
        }
    }

    pub fn destinations(&self, base: &Path) -> Destinations {
        Destinations {
            dest_file: self.resolved_dest_file(base),
            temp_dir: base.join(&self.temp_dir),
            // dest_dir / assets_dest_dir are archive-internal, never
            // resolved against the filesystem.
            dest_dir: self.dest_dir.clone(),
            assets_dest_dir: self.assets_dest_dir.clone(),
        }
    }

    fn resolved_dest_file(&self, base: &Path) -> PathBuf {
        if let Some(dest) = &self.dest_file {
            return base.join(dest);
        }
        let source = base.join(&self.source_file);
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = source
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        source.with_file_name(format!("{}-{}{}", stem, self.suffix, ext))
    }

    /// Named variables available to `$name` substitution in branch
    /// conditions.
    pub fn build_vars(&self) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("python_version".to_string(), self.python_version.clone());
        vars
    }
}
