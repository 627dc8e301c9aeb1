//! Error taxonomy for the packaging pipeline.
//!
//! Every operation returns a typed variant so callers can distinguish
//! tolerated conditions (an unknown directive line) from fatal ones
//! (an unterminated conditional block) without string matching.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    /// A conditional block was still open at end of file.
    #[error("unterminated conditional block: {0} frame(s) still open")]
    UnterminatedBlock(usize),

    /// An `elif`/`else`/`endif` appeared outside of any `if` block.
    #[error("branch directive '{0}' outside of a conditional block")]
    StrayBranchDirective(String),

    /// Directive dispatch was handed an empty token list.
    #[error("empty directive line")]
    EmptyDirective,

    /// No registered directive signature matches the leading tokens.
    /// Tolerated: the caller logs the line and drops it.
    #[error("unknown directive: {0:?}")]
    UnknownDirective(Vec<String>),

    /// A branch condition could not be evaluated.
    #[error("malformed branch condition: {0}")]
    BadCondition(String),

    /// An include/import/embed target does not exist.
    #[error("referenced file does not exist: {0}")]
    MissingFile(PathBuf),

    /// One or more scripts failed the compile check; details were
    /// logged during the dependency walk.
    #[error("{0} script(s) failed to compile, see log")]
    CompileErrors(usize),

    /// The container manifest has no closing root-element line.
    #[error("no closing tag found in container manifest")]
    ManifestCloseTagMissing,

    #[error("invalid project configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

impl PackError {
    /// Tolerated errors are reported and skipped; everything else
    /// aborts the run.
    pub fn is_tolerated(&self) -> bool {
        matches!(self, PackError::UnknownDirective(_))
    }
}

pub type PackResult<T> = Result<T, PackError>;
