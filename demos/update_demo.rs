//! Builds a tiny throwaway project in a temp directory, packs it, and
//! prints the resulting container's entry list.
//!
//! Run with `cargo run --example update_demo`.

use std::fs::{self, File};
use std::io::Write;

use zip::write::{FileOptions, ZipWriter};

use odfpack::config::BuildConfig;
use odfpack::update::update_document;
use odfpack::walk::NoopChecker;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let dir = tempfile::tempdir()?;
    let base = dir.path();
    fs::create_dir_all(base.join("src"))?;
    fs::create_dir_all(base.join("inc"))?;

    fs::write(base.join("inc/odfpack_import.py"), "import sys\n")?;
    fs::write(
        base.join("src/main.py"),
        concat!(
            "# odfpack: entry\n",
            "def say_hello(*args):\n",
            "    print('hello from the container')\n",
        ),
    )?;

    // A minimal but valid empty container to inject into.
    let mut zw = ZipWriter::new(File::create(base.join("document.ods"))?);
    zw.start_file("mimetype", FileOptions::default())?;
    zw.write_all(b"application/vnd.oasis.opendocument.spreadsheet")?;
    zw.start_file("content.xml", FileOptions::default())?;
    zw.write_all(b"<office:document-content/>")?;
    zw.start_file("META-INF/manifest.xml", FileOptions::default())?;
    zw.write_all(
        concat!(
            "<manifest:manifest xmlns:manifest=\"urn:oasis:names:tc:opendocument:xmlns:manifest:1.0\">",
            "<manifest:file-entry manifest:full-path=\"/\" manifest:media-type=\"application/vnd.oasis.opendocument.spreadsheet\"/>",
            "</manifest:manifest>",
        )
        .as_bytes(),
    )?;
    zw.finish()?;

    let config = BuildConfig {
        source_file: "document.ods".into(),
        ..BuildConfig::default()
    };
    let dest = update_document(&config, base, &NoopChecker, false)?;

    println!("packed {}", dest.display());
    let mut archive = zip::ZipArchive::new(File::open(&dest)?)?;
    for i in 0..archive.len() {
        println!("  {}", archive.by_index(i)?.name());
    }
    Ok(())
}
