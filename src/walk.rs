//! Dependency walk over the script graph.
//!
//! Maintains a LIFO worklist seeded with the root scripts and a visited
//! set keyed by path, so every distinct script is transformed exactly
//! once even in the presence of mutual imports. Directive handlers feed
//! newly discovered scripts back through the narrow `ScriptRegistry`
//! capability. Compile errors are captured per script and only surfaced
//! together once the whole walk has finished.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::branch::BranchProcessor;
use crate::comparator::Comparator;
use crate::content::ContentParser;
use crate::directives::{DirectiveProvider, ScriptRegistry};
use crate::error::{PackError, PackResult};
use crate::processor::DirectiveProcessor;
use crate::script::{SourceScript, TempScript};

/// Compilability check, delegated to an external collaborator (the
/// target script runtime). The pipeline itself never interprets the
/// embedded language.
pub trait ScriptChecker {
    /// Returns a captured error message, or `None` if the script is fine.
    fn check(&self, path: &Path) -> Option<String>;
}

/// Checker that accepts everything; used when no host interpreter is
/// available.
pub struct NoopChecker;

impl ScriptChecker for NoopChecker {
    fn check(&self, _path: &Path) -> Option<String> {
        None
    }
}

struct Worklist {
    pending: Vec<SourceScript>,
    finished: Vec<TempScript>,
    visited: HashSet<PathBuf>,
}

impl ScriptRegistry for Worklist {
    fn append_script(&mut self, script: SourceScript) {
        self.pending.push(script);
    }

    fn add_script(&mut self, script: TempScript) {
        // Verbatim scripts share the visited set, so embedding the same
        // file twice produces one archive entry.
        if self.visited.insert(script.path.clone()) {
            self.finished.push(script);
        }
    }
}

pub struct ScriptSetProcessor<'a> {
    provider: &'a DirectiveProvider,
    checker: &'a dyn ScriptChecker,
    temp_dir: PathBuf,
    build_vars: HashMap<String, String>,
    worklist: Worklist,
}

impl<'a> ScriptSetProcessor<'a> {
    pub fn new(
        provider: &'a DirectiveProvider,
        checker: &'a dyn ScriptChecker,
        temp_dir: PathBuf,
        build_vars: HashMap<String, String>,
        roots: Vec<SourceScript>,
    ) -> Self {
        debug!(count = roots.len(), "seeding dependency walk");
        ScriptSetProcessor {
            provider,
            checker,
            temp_dir,
            build_vars,
            worklist: Worklist {
                pending: roots,
                finished: Vec::new(),
                visited: HashSet::new(),
            },
        }
    }

    /// Run the walk to completion. DFS order, most recently discovered
    /// first; no ordering guarantee between independent branches.
    pub fn process(mut self) -> PackResult<Vec<TempScript>> {
        while let Some(source) = self.worklist.pending.pop() {
            if !self.worklist.visited.insert(source.path.clone()) {
                continue; // avoid cycles
            }
            self.process_script(&source)?;
        }

        let failures = self
            .worklist
            .finished
            .iter()
            .filter_map(|s| s.error.as_ref().map(|e| (s.path.clone(), e.clone())))
            .collect::<Vec<_>>();
        if !failures.is_empty() {
            for (path, message) in &failures {
                error!(path = %path.display(), message, "compile check failed");
            }
            return Err(PackError::CompileErrors(failures.len()));
        }
        Ok(self.worklist.finished)
    }

    fn process_script(&mut self, source: &SourceScript) -> PackResult<()> {
        let tester = Comparator::new(self.build_vars.clone());
        let mut directive_processor =
            DirectiveProcessor::new(self.provider, BranchProcessor::new(Box::new(tester)));
        let parsed =
            ContentParser::new(&mut directive_processor, source).parse(&mut self.worklist)?;

        let temp_path = self.temp_dir.join(source.relative_path());
        let script = TempScript {
            path: temp_path,
            content: parsed.text.into_bytes(),
            temp_dir: self.temp_dir.clone(),
            exported_func_names: parsed.exported_func_names,
            error: self.checker.check(&source.path),
        };
        self.write_script(&script)?;
        self.worklist.finished.push(script);
        Ok(())
    }

    fn write_script(&self, script: &TempScript) -> PackResult<()> {
        if let Some(parent) = script.path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!(path = %script.path.display(), "writing temp script");
        fs::write(&script.path, &script.content)?;
        Ok(())
    }
}
