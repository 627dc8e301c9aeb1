//! Whole-file script parsing.
//!
//! Drives the `DirectiveProcessor` over every line of one script,
//! collects exported top-level function names, and appends the
//! `g_exportedScripts` declaration the host application reads.

use std::fs;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::directives::ScriptRegistry;
use crate::error::PackResult;
use crate::processor::{DirectiveProcessor, IGNORE_MARKER};
use crate::script::{ParsedScriptContent, SourceScript};

lazy_static! {
    // A top-level def whose name does not start with the private marker.
    static ref EXPORT_RE: Regex = Regex::new(r"^def\s+([^_].*?)\(.*\):.*$").unwrap();
}

/// First line of every transformed script.
pub const PROVENANCE_HEADER: &str = "# processed by odfpack";

pub struct ContentParser<'a, 'p> {
    directive_processor: &'a mut DirectiveProcessor<'p>,
    script: &'a SourceScript,
}

impl<'a, 'p> ContentParser<'a, 'p> {
    pub fn new(
        directive_processor: &'a mut DirectiveProcessor<'p>,
        script: &'a SourceScript,
    ) -> Self {
        ContentParser {
            directive_processor,
            script,
        }
    }

    pub fn parse(mut self, registry: &mut dyn ScriptRegistry) -> PackResult<ParsedScriptContent> {
        debug!(path = %self.script.path.display(), "parsing script");
        let source = fs::read_to_string(&self.script.path)?;

        let mut lines = vec![PROVENANCE_HEADER.to_string()];
        let mut exported = Vec::new();
        for raw in source.lines() {
            let line = raw.trim_end();
            if line.starts_with('#') {
                lines.extend(self.directive_processor.process_line(registry, line)?);
            } else if self.directive_processor.ignore_lines() {
                // Kept but inert, so line numbers survive for diagnostics.
                lines.push(format!("{} {}", IGNORE_MARKER, line));
            } else {
                if self.script.export_funcs {
                    if let Some(cap) = EXPORT_RE.captures(line) {
                        exported.push(cap[1].to_string());
                    }
                }
                lines.push(line.to_string());
            }
        }

        self.directive_processor.end()?;

        if self.script.export_funcs && !exported.is_empty() {
            lines.push(String::new());
            lines.push(String::new());
            lines.push(format!("g_exportedScripts = ({},)", exported.join(", ")));
        }

        Ok(ParsedScriptContent {
            text: lines.join("\n"),
            exported_func_names: exported,
        })
    }
}
