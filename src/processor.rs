//! Per-script directive façade.
//!
//! Combines one `BranchProcessor` with the shared `DirectiveProvider` and
//! consumes one physical line at a time, returning zero or more output
//! lines. Branch directives are tried first; anything else goes through
//! the trie. An unknown directive is logged and dropped, never fatal.

use tracing::warn;

use crate::branch::BranchProcessor;
use crate::directives::{DirectiveContext, DirectiveProvider, ScriptRegistry, KEYWORD, MARKER};
use crate::error::{PackError, PackResult};

/// Marker prefixed to lines suppressed by conditional compilation. The
/// lines are kept, never deleted, so diagnostics retain line numbers.
pub const IGNORE_MARKER: &str = "### odfpack ignore:";

pub struct DirectiveProcessor<'a> {
    provider: &'a DirectiveProvider,
    branch: BranchProcessor,
    bootstrapped: bool,
}

impl<'a> DirectiveProcessor<'a> {
    pub fn new(provider: &'a DirectiveProvider, branch: BranchProcessor) -> Self {
        DirectiveProcessor {
            provider,
            branch,
            bootstrapped: false,
        }
    }

    /// Process one comment line (the caller only hands over lines that
    /// start with the marker). Returns the lines to emit in its place.
    pub fn process_line(
        &mut self,
        registry: &mut dyn ScriptRegistry,
        line: &str,
    ) -> PackResult<Vec<String>> {
        // The shell tokenizer treats `#` as a comment opener, so peel the
        // marker off before splitting the rest of the line.
        let rest = line.trim_start().strip_prefix(MARKER).unwrap_or(line);
        let tokens = match shlex::split(rest) {
            Some(tokens) => tokens,
            None => {
                warn!(line, "non-parsable comment line, kept as-is");
                return Ok(vec![line.to_string()]);
            }
        };
        if tokens.first().map(String::as_str) != Some(KEYWORD) {
            // An ordinary comment: subject to conditional compilation
            // like any other line.
            if self.branch.skip() {
                return Ok(vec![format!("{} {}", IGNORE_MARKER, line)]);
            }
            return Ok(vec![line.to_string()]);
        }

        let directive_tokens = &tokens[1..];
        let (name, args) = match directive_tokens.split_first() {
            Some((name, args)) => (name.as_str(), args),
            None => return Err(PackError::EmptyDirective),
        };

        if self.branch.handle_directive(name, args)? {
            return Ok(Vec::new());
        }
        if self.branch.skip() {
            // Directives inside a suppressed block are not executed.
            return Ok(Vec::new());
        }

        match self.provider.get(directive_tokens) {
            Ok((directive, rest)) => {
                let mut ctx = DirectiveContext::new(registry, &mut self.bootstrapped);
                directive.execute(&mut ctx, rest)?;
                Ok(ctx.out)
            }
            Err(err) if err.is_tolerated() => {
                warn!(line, %err, "directive line dropped");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// True while inside a suppressed conditional block.
    pub fn ignore_lines(&self) -> bool {
        self.branch.skip()
    }

    /// End-of-file check: every conditional block must be closed.
    pub fn end(&self) -> PackResult<()> {
        self.branch.end()
    }
}
