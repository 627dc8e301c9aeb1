//! Concrete archive callbacks: dropping stale scripts, adding the new
//! ones, adding assets, and synthesizing the debug-build document body.

use std::collections::BTreeMap;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::read::ZipArchive;
use zip::write::{FileOptions, ZipWriter};

use crate::archive::{ItemCallback, WriterCallback};
use crate::error::PackResult;
use crate::script::{DestinationAsset, DestinationScript};

/// Archive directory holding the embedded scripts.
pub const ARC_SCRIPTS_PATH: &str = "Scripts/python";

/// Item callback that reports "handled, do nothing" for every entry
/// strictly under a reserved directory, so stale scripts from a previous
/// build cannot survive into the destination.
pub struct IgnoreItem {
    prefix: PathBuf,
}

impl IgnoreItem {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        IgnoreItem {
            prefix: prefix.into(),
        }
    }
}

impl<R: Read + Seek, W: Write + Seek> ItemCallback<R, W> for IgnoreItem {
    fn call(
        &self,
        _zin: &mut ZipArchive<R>,
        _zout: &mut ZipWriter<W>,
        _index: usize,
        name: &str,
    ) -> PackResult<bool> {
        // The directory entry itself is kept; only entries below it are
        // dropped.
        let dropped = Path::new(name)
            .ancestors()
            .skip(1)
            .any(|a| a == self.prefix);
        if dropped {
            debug!(entry = name, "dropping stale script entry");
        }
        Ok(dropped)
    }
}

/// After callback writing every destination script under its archive path.
pub struct AddScripts {
    scripts: Vec<DestinationScript>,
}

impl AddScripts {
    pub fn new(scripts: Vec<DestinationScript>) -> Self {
        AddScripts { scripts }
    }
}

impl<W: Write + Seek> WriterCallback<W> for AddScripts {
    fn call(&self, zout: &mut ZipWriter<W>) -> PackResult<bool> {
        for script in &self.scripts {
            zout.start_file(script.arc_name(), FileOptions::default())?;
            zout.write_all(&script.content)?;
        }
        Ok(true)
    }
}

/// After callback writing every asset payload under its archive path.
pub struct AddAssets {
    assets: Vec<DestinationAsset>,
}

impl AddAssets {
    pub fn new(assets: Vec<DestinationAsset>) -> Self {
        AddAssets { assets }
    }
}

impl<W: Write + Seek> WriterCallback<W> for AddAssets {
    fn call(&self, zout: &mut ZipWriter<W>) -> PackResult<bool> {
        for asset in &self.assets {
            zout.start_file(asset.arc_name(), FileOptions::default())?;
            zout.write_all(&asset.content)?;
        }
        Ok(true)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEBUG CONTENT
// ═══════════════════════════════════════════════════════════════════════════════

const CONTENT_BEFORE: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    "\n",
    r#"<office:document-content "#,
    r#"xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" "#,
    r#"xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" "#,
    r#"xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" "#,
    r#"xmlns:draw="urn:oasis:names:tc:opendocument:xmlns:drawing:1.0" "#,
    r#"xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0" "#,
    r#"xmlns:xlink="http://www.w3.org/1999/xlink" "#,
    r#"xmlns:svg="urn:oasis:names:tc:opendocument:xmlns:svg-compatible:1.0" "#,
    r#"xmlns:form="urn:oasis:names:tc:opendocument:xmlns:form:1.0" "#,
    r#"xmlns:script="urn:oasis:names:tc:opendocument:xmlns:script:1.0" "#,
    r#"office:version="1.2"><office:scripts/>"#,
    r#"<office:automatic-styles>"#,
    r#"<style:style style:name="ta1" style:family="table" "#,
    r#"style:master-page-name="Default">"#,
    r#"<style:table-properties table:display="true" "#,
    r#"style:writing-mode="lr-tb"/></style:style>"#,
    r#"<style:style style:name="P1" style:family="paragraph">"#,
    r#"<style:paragraph-properties fo:text-align="center"/>"#,
    r#"</style:style>"#,
    r#"</office:automatic-styles>"#,
    r#"<office:body><office:spreadsheet>"#,
    r#"<table:table table:name="Sheet1" table:style-name="ta1">"#,
);

const CONTENT_AFTER: &str = concat!(
    r#"<table:table-row><table:table-cell/></table:table-row>"#,
    r#"</table:table><table:named-expressions/>"#,
    r#"</office:spreadsheet>"#,
    r#"</office:body></office:document-content>"#,
);

const BEGIN_FORMS: &str =
    r#"<office:forms form:automatic-focus="false" form:apply-design-mode="false">"#;
const END_FORMS: &str = "</office:forms>";
const BEGIN_SHAPES: &str = "<table:shapes>";
const END_SHAPES: &str = "</table:shapes>";

fn form_button(id: usize, script: &str, func: &str) -> String {
    format!(
        concat!(
            r#"<form:form form:name="Form{id}" form:apply-filter="true" "#,
            r#"form:command-type="table" "#,
            r#"form:control-implementation="ooo:com.sun.star.form.component.Form">"#,
            r#"<form:button form:name="name{id}" "#,
            r#"form:control-implementation="ooo:com.sun.star.form.component.CommandButton" "#,
            r#"xml:id="control{id}" form:id="control{id}" form:label="{func}">"#,
            r#"<office:event-listeners>"#,
            r#"<script:event-listener script:language="ooo:script" "#,
            r#"script:event-name="form:performaction" "#,
            r#"xlink:href="vnd.sun.star.script:{script}${func}"#,
            r#"?language=Python&amp;location=document" "#,
            r#"xlink:type="simple"/></office:event-listeners>"#,
            r#"</form:button></form:form>"#,
        ),
        id = id,
        script = script,
        func = func,
    )
}

fn draw_control(id: usize, y_mm: usize) -> String {
    format!(
        concat!(
            r#"<draw:control draw:z-index="0" draw:text-style-name="P1" "#,
            r#"svg:width="80mm" svg:height="10mm" svg:x="10mm" svg:y="{y}mm" "#,
            r#"draw:control="control{id}"/>"#,
        ),
        id = id,
        y = y_mm,
    )
}

/// After callback used by the debug build: a minimal spreadsheet body
/// with one button per exported function, wired to the packed script,
/// for smoke-testing entry points without the full host application.
pub struct AddDebugContent {
    funcs_by_script: BTreeMap<String, Vec<String>>,
}

impl AddDebugContent {
    pub fn new(funcs_by_script: BTreeMap<String, Vec<String>>) -> Self {
        AddDebugContent { funcs_by_script }
    }
}

impl<W: Write + Seek> WriterCallback<W> for AddDebugContent {
    fn call(&self, zout: &mut ZipWriter<W>) -> PackResult<bool> {
        let mut forms = vec![BEGIN_FORMS.to_string()];
        let mut shapes = vec![BEGIN_SHAPES.to_string()];
        let mut id = 0usize;
        for (script, funcs) in &self.funcs_by_script {
            for func in funcs {
                forms.push(form_button(id, script, func));
                shapes.push(draw_control(id, 15 * id + 10));
                id += 1;
            }
        }
        forms.push(END_FORMS.to_string());
        shapes.push(END_SHAPES.to_string());

        let content = format!(
            "{}{}{}{}",
            CONTENT_BEFORE,
            forms.join(""),
            shapes.join(""),
            CONTENT_AFTER
        );
        zout.start_file("content.xml", FileOptions::default())?;
        zout.write_all(content.as_bytes())?;
        Ok(true)
    }
}
