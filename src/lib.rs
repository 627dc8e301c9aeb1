//! # odfpack
//!
//! Packs directive-annotated Python macro scripts into ODF documents.
//!
//! ## Pipeline Invariants
//!
//! 1. **Directive lines**: a line is a directive iff its first token
//!    after the `#` comment marker is `odfpack:`. Everything else passes
//!    through untouched (or neutralized when a conditional block is
//!    skipped).
//! 2. **Branch stack**: `if`/`elif`/`else`/`endif` form a stack of
//!    boolean frames; an `elif` directly after a taken branch is never
//!    evaluated.
//! 3. **Walk termination**: each script path is processed at most once,
//!    so circular imports terminate.
//! 4. **Archive rewrite**: every entry of the source container is either
//!    claimed by an item callback or copied through raw; the manifest is
//!    rewritten in place with one entry per added script, asset and
//!    intermediate directory.
//! 5. **Determinism**: directory scans, library expansion and manifest
//!    entries are sorted, so the same inputs produce the same container
//!    contents.

pub mod archive;
pub mod branch;
pub mod callbacks;
pub mod cli;
pub mod comparator;
pub mod config;
pub mod content;
pub mod directives;
pub mod discovery;
pub mod error;
pub mod manifest;
pub mod processor;
pub mod script;
pub mod update;
pub mod walk;

#[cfg(test)]
mod directive_tests;
#[cfg(test)]
mod walk_tests;

pub use config::BuildConfig;
pub use error::{PackError, PackResult};
pub use update::update_document;
