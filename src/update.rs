//! Build orchestration.
//!
//! Glues the pipeline together: discover the source tree, walk and
//! transform the scripts, then rewrite the container archive with the
//! processed scripts, assets and a refreshed manifest.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::archive::ZipUpdaterBuilder;
use crate::callbacks::{AddAssets, AddDebugContent, AddScripts, IgnoreItem, ARC_SCRIPTS_PATH};
use crate::config::BuildConfig;
use crate::directives::DirectiveProvider;
use crate::error::{PackError, PackResult};
use crate::manifest::ManifestRewriter;
use crate::walk::{ScriptChecker, ScriptSetProcessor};

/// Produce the destination document. When `debug` is set, a generated
/// `content.xml` with one launcher button per exported function replaces
/// the document body. Returns the path of the written container.
pub fn update_document(
    config: &BuildConfig,
    base: &Path,
    checker: &dyn ScriptChecker,
    debug: bool,
) -> PackResult<PathBuf> {
    let sources = config.sources(base);
    let destinations = config.destinations(base);
    if !sources.source_file.is_file() {
        return Err(PackError::MissingFile(sources.source_file.clone()));
    }

    let provider = DirectiveProvider::create(
        &sources.inc_dir,
        &sources.lib_dir,
        &sources.src_dir,
        &sources.opt_dir,
        sources.all_module_names()?,
    );
    let temp_scripts = ScriptSetProcessor::new(
        &provider,
        checker,
        destinations.temp_dir.clone(),
        config.build_vars(),
        sources.src_scripts()?,
    )
    .process()?;

    let scripts = destinations.to_destination_scripts(&temp_scripts);
    let assets = destinations.to_destination_assets(&sources.assets()?)?;
    info!(
        scripts = scripts.len(),
        assets = assets.len(),
        dest = %destinations.dest_file.display(),
        "assembling container"
    );

    let mut builder = ZipUpdaterBuilder::new()
        .item(Box::new(IgnoreItem::new(ARC_SCRIPTS_PATH)))
        .item(Box::new(ManifestRewriter::new(
            scripts.clone(),
            assets.clone(),
        )))
        .after(Box::new(AddScripts::new(scripts.clone())))
        .after(Box::new(AddAssets::new(assets)));
    if debug {
        builder = builder.after(Box::new(AddDebugContent::new(funcs_by_script(&scripts))));
    }

    let source = File::open(&sources.source_file)?;
    let dest = File::create(&destinations.dest_file)?;
    builder.build().update(source, dest)?;
    Ok(destinations.dest_file)
}

fn funcs_by_script(
    scripts: &[crate::script::DestinationScript],
) -> BTreeMap<String, Vec<String>> {
    scripts
        .iter()
        .filter(|s| !s.exported_func_names.is_empty())
        .map(|s| (s.dest_name(), s.exported_func_names.clone()))
        .collect()
}
