//! Manifest rewriting.
//!
//! The container's `META-INF/manifest.xml` lists every entry with its
//! media type and must stay consistent with the archive contents. The
//! rewriter matches the manifest entry by its fixed path, normalizes the
//! XML so that one element sits per line, truncates at the closing root
//! tag, appends the structural preamble plus one synthesized entry per
//! new directory, script and asset, and closes the document again.
//! Directory entries are deduplicated and sorted, so rewriting twice
//! with the same set is structurally idempotent.

use std::collections::BTreeSet;
use std::io::{Read, Seek, Write};

use lazy_static::lazy_static;
use regex::Regex;
use zip::read::ZipArchive;
use zip::write::{FileOptions, ZipWriter};

use crate::archive::ItemCallback;
use crate::error::{PackError, PackResult};
use crate::script::{zip_path, DestinationAsset, DestinationScript};

/// Fixed path of the manifest inside the container.
pub const MANIFEST_PATH: &str = "META-INF/manifest.xml";

const MANIFEST_CLOSE_TAG: &str = "</manifest:manifest>";

/// Entries the host application expects once scripts are attached.
const STRUCTURAL_ENTRIES: &str = concat!(
    "    <manifest:file-entry manifest:full-path=\"Basic/Standard/odfpack.xml\" \
     manifest:media-type=\"text/xml\"/>\n",
    "    <manifest:file-entry manifest:full-path=\"Basic/Standard/script-lb.xml\" \
     manifest:media-type=\"text/xml\"/>\n",
    "    <manifest:file-entry manifest:full-path=\"Basic/script-lc.xml\" \
     manifest:media-type=\"text/xml\"/>\n",
);

lazy_static! {
    static ref TAG_BOUNDARY_RE: Regex = Regex::new(r">\s*<").unwrap();
}

/// Item callback rewriting the manifest; every other entry is left to
/// the generic copy.
pub struct ManifestRewriter {
    scripts: Vec<DestinationScript>,
    assets: Vec<DestinationAsset>,
}

impl ManifestRewriter {
    pub fn new(scripts: Vec<DestinationScript>, assets: Vec<DestinationAsset>) -> Self {
        ManifestRewriter { scripts, assets }
    }

    fn rewrite(&self, data: &str) -> PackResult<String> {
        let pretty = prettify(data);
        let mut out = strip_close(&pretty)?;
        out.push_str(STRUCTURAL_ENTRIES);
        for dir in self.directories() {
            out.push_str(&dir_entry(&dir));
        }
        for script in &self.scripts {
            out.push_str(&script_entry(&script.arc_name()));
        }
        for asset in &self.assets {
            out.push_str(&asset_entry(&asset.arc_name()));
        }
        out.push_str(MANIFEST_CLOSE_TAG);
        Ok(out)
    }

    /// Every directory introduced by a script or asset path, deduplicated
    /// and sorted.
    fn directories(&self) -> BTreeSet<String> {
        let mut dirs = BTreeSet::new();
        let paths = self
            .scripts
            .iter()
            .map(|s| s.path.clone())
            .chain(self.assets.iter().map(|a| a.path.clone()));
        for path in paths {
            let mut ancestor = path.parent();
            while let Some(dir) = ancestor {
                if dir.as_os_str().is_empty() {
                    break;
                }
                dirs.insert(zip_path(dir));
                ancestor = dir.parent();
            }
        }
        dirs
    }
}

impl<R: Read + Seek, W: Write + Seek> ItemCallback<R, W> for ManifestRewriter {
    fn call(
        &self,
        zin: &mut ZipArchive<R>,
        zout: &mut ZipWriter<W>,
        index: usize,
        name: &str,
    ) -> PackResult<bool> {
        if name != MANIFEST_PATH {
            return Ok(false);
        }
        let mut data = String::new();
        zin.by_index(index)?.read_to_string(&mut data)?;
        let rewritten = self.rewrite(&data)?;
        zout.start_file(MANIFEST_PATH, FileOptions::default())?;
        zout.write_all(rewritten.as_bytes())?;
        Ok(true)
    }
}

/// One element per line; enough structure to find the closing root tag.
fn prettify(xml: &str) -> String {
    TAG_BOUNDARY_RE.replace_all(xml.trim(), ">\n<").into_owned()
}

/// Everything up to (excluding) the closing root-element line.
fn strip_close(pretty: &str) -> PackResult<String> {
    let mut out = String::new();
    for line in pretty.lines() {
        if line.trim() == MANIFEST_CLOSE_TAG {
            return Ok(out);
        }
        out.push_str(line);
        out.push('\n');
    }
    Err(PackError::ManifestCloseTagMissing)
}

fn dir_entry(path: &str) -> String {
    format!(
        "    <manifest:file-entry manifest:full-path=\"{}\" \
         manifest:media-type=\"application/binary\"/>\n",
        path
    )
}

fn script_entry(path: &str) -> String {
    format!(
        "    <manifest:file-entry manifest:full-path=\"{}\" manifest:media-type=\"\"/>\n",
        path
    )
}

fn asset_entry(path: &str) -> String {
    format!(
        "    <manifest:file-entry manifest:full-path=\"{}\" \
         manifest:media-type=\"application/octet-stream\"/>\n",
        path
    )
}
