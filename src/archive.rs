//! Container update pipeline.
//!
//! A `ZipUpdater` copies a source container into a destination container
//! while three ordered callback lists get a chance to intervene:
//!
//! - **before** callbacks run against the destination writer first; a
//!   `false` return stops the remaining before callbacks.
//! - **item** callbacks run for every source entry, in registration
//!   order. Every item callback always runs; any `true` return marks the
//!   entry handled and suppresses the fallback byte-for-byte copy.
//! - **after** callbacks run last, with the same short-circuit rule as
//!   the before chain.
//!
//! The source archive's top-level comment is preserved.

use std::io::{Read, Seek, Write};

use tracing::debug;
use zip::read::ZipArchive;
use zip::write::ZipWriter;

use crate::error::PackResult;

/// Callback run against the destination writer (before/after phases).
pub trait WriterCallback<W: Write + Seek> {
    /// Returns `false` to stop the remaining callbacks of this phase.
    fn call(&self, zout: &mut ZipWriter<W>) -> PackResult<bool>;
}

/// Callback run for each entry of the source container.
pub trait ItemCallback<R: Read + Seek, W: Write + Seek> {
    /// Returns `true` if this callback handled the entry (the generic
    /// copy is then skipped). All item callbacks run regardless.
    fn call(
        &self,
        zin: &mut ZipArchive<R>,
        zout: &mut ZipWriter<W>,
        index: usize,
        name: &str,
    ) -> PackResult<bool>;
}

pub struct ZipUpdaterBuilder<R: Read + Seek, W: Write + Seek> {
    before: Vec<Box<dyn WriterCallback<W>>>,
    items: Vec<Box<dyn ItemCallback<R, W>>>,
    after: Vec<Box<dyn WriterCallback<W>>>,
}

impl<R: Read + Seek, W: Write + Seek> Default for ZipUpdaterBuilder<R, W> {
    fn default() -> Self {
        ZipUpdaterBuilder {
            before: Vec::new(),
            items: Vec::new(),
            after: Vec::new(),
        }
    }
}

impl<R: Read + Seek, W: Write + Seek> ZipUpdaterBuilder<R, W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before(mut self, callback: Box<dyn WriterCallback<W>>) -> Self {
        self.before.push(callback);
        self
    }

    pub fn item(mut self, callback: Box<dyn ItemCallback<R, W>>) -> Self {
        self.items.push(callback);
        self
    }

    pub fn after(mut self, callback: Box<dyn WriterCallback<W>>) -> Self {
        self.after.push(callback);
        self
    }

    /// Freeze the callback registries.
    pub fn build(self) -> ZipUpdater<R, W> {
        ZipUpdater {
            before: self.before,
            items: self.items,
            after: self.after,
        }
    }
}

pub struct ZipUpdater<R: Read + Seek, W: Write + Seek> {
    before: Vec<Box<dyn WriterCallback<W>>>,
    items: Vec<Box<dyn ItemCallback<R, W>>>,
    after: Vec<Box<dyn WriterCallback<W>>>,
}

impl<R: Read + Seek, W: Write + Seek> ZipUpdater<R, W> {
    /// Produce the destination container from the source container. On
    /// error the destination is left partial and must be discarded.
    pub fn update(&self, source: R, dest: W) -> PackResult<()> {
        let mut zout = ZipWriter::new(dest);

        for callback in &self.before {
            if !callback.call(&mut zout)? {
                break;
            }
        }

        let mut zin = ZipArchive::new(source)?;
        zout.set_raw_comment(zin.comment().to_vec());

        for index in 0..zin.len() {
            let name = zin.by_index_raw(index)?.name().to_string();
            let mut handled = false;
            for callback in &self.items {
                handled |= callback.call(&mut zin, &mut zout, index, &name)?;
            }
            if !handled {
                debug!(entry = %name, "copying entry unchanged");
                let entry = zin.by_index_raw(index)?;
                zout.raw_copy_file(entry)?;
            }
        }

        for callback in &self.after {
            if !callback.call(&mut zout)? {
                break;
            }
        }

        zout.finish()?;
        Ok(())
    }
}
