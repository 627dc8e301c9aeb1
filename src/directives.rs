//! Directive grammar: the fixed set of directive kinds, the token trie
//! used to dispatch them, and their execution semantics.
//!
//! A directive line is `# odfpack: <tokens...>` where the tokens obey
//! shell quoting rules. Dispatch walks the trie token by token and stops
//! at the longest available prefix; the remaining tokens become the
//! directive's arguments. `embed lib x` therefore resolves to the
//! `embed lib` directive with argument `x`, never to a misreading of
//! `embed` alone.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PackError, PackResult};
use crate::script::{SourceScript, TempScript};

/// Comment marker opening every directive line.
pub const MARKER: &str = "#";
/// Reserved keyword distinguishing directives from ordinary comments.
pub const KEYWORD: &str = "odfpack:";
/// Bootstrap snippet that fixes the interpreter import path at runtime.
pub const IMPORT_SNIPPET: &str = "odfpack_import.py";
/// The one library whose init hook is invoked at load time.
pub const HELPER_LIB: &str = "odfpack_helper";

/// Narrow capability handed to directive handlers: they may register new
/// dependencies but cannot touch the rest of the orchestrator.
pub trait ScriptRegistry {
    /// Register a script that must go through the transform pipeline.
    fn append_script(&mut self, script: SourceScript);
    /// Register a script that is already final, embedded verbatim.
    fn add_script(&mut self, script: TempScript);
}

/// Execution context for one directive line: the emitted output lines,
/// the dependency registry, and the once-per-script bootstrap flag.
pub struct DirectiveContext<'a> {
    pub registry: &'a mut dyn ScriptRegistry,
    pub out: Vec<String>,
    bootstrapped: &'a mut bool,
}

impl<'a> DirectiveContext<'a> {
    pub fn new(registry: &'a mut dyn ScriptRegistry, bootstrapped: &'a mut bool) -> Self {
        DirectiveContext {
            registry,
            out: Vec::new(),
            bootstrapped,
        }
    }

    /// Emit the import-path bootstrap include, at most once per script.
    fn bootstrap(&mut self, inc_dir: &Path) -> PackResult<()> {
        if !*self.bootstrapped {
            *self.bootstrapped = true;
            include_file(&mut self.out, inc_dir, IMPORT_SNIPPET, true)?;
        }
        Ok(())
    }
}

/// The closed set of directive kinds, each carrying its static
/// configuration. Dispatch is a pattern match; the grammar is fixed.
#[derive(Debug, Clone)]
pub enum Directive {
    /// `entry` — marks the top-level script; import-path bootstrap plus
    /// a purge of previously loaded modules from the interpreter cache.
    Entry {
        inc_dir: PathBuf,
        module_names: BTreeSet<String>,
    },
    /// `include <name> [strip]` — inline a snippet between provenance
    /// comments.
    Include { inc_dir: PathBuf },
    /// `import <module>` — import a source-tree module and register it
    /// as a dependency.
    Import {
        inc_dir: PathBuf,
        src_dir: PathBuf,
    },
    /// `import lib <name>` — import a bundled library, with init-hook
    /// bootstrap for the helper library.
    ImportLib {
        inc_dir: PathBuf,
        lib_dir: PathBuf,
    },
    /// `embed lib <name>` — register a library for embedding without
    /// importing it.
    EmbedLib { lib_dir: PathBuf },
    /// `embed script <path>` — embed a file or directory of files
    /// verbatim, bypassing the directive engine.
    EmbedScript { opt_dir: PathBuf },
}

impl Directive {
    /// The ordered token sequence this directive is registered under.
    pub fn sig_elements(&self) -> &'static [&'static str] {
        match self {
            Directive::Entry { .. } => &["entry"],
            Directive::Include { .. } => &["include"],
            Directive::Import { .. } => &["import"],
            Directive::ImportLib { .. } => &["import", "lib"],
            Directive::EmbedLib { .. } => &["embed", "lib"],
            Directive::EmbedScript { .. } => &["embed", "script"],
        }
    }

    pub fn execute(&self, ctx: &mut DirectiveContext, args: &[String]) -> PackResult<bool> {
        match self {
            Directive::Entry {
                inc_dir,
                module_names,
            } => {
                ctx.bootstrap(inc_dir)?;
                emit_module_purge(&mut ctx.out, module_names);
                Ok(true)
            }
            Directive::Include { inc_dir } => {
                let name = first_arg(args)?;
                let strip = args.get(1).map(|s| s.as_str()) == Some("strip");
                include_file(&mut ctx.out, inc_dir, name, strip)?;
                Ok(true)
            }
            Directive::Import { inc_dir, src_dir } => {
                let module = first_arg(args)?;
                ctx.bootstrap(inc_dir)?;
                let path = src_dir.join(format!("{}.py", module));
                if !path.is_file() {
                    return Err(PackError::MissingFile(path));
                }
                ctx.registry
                    .append_script(SourceScript::new(path, src_dir.clone(), true));
                ctx.out.push(format!("import {}", module));
                Ok(true)
            }
            Directive::ImportLib { inc_dir, lib_dir } => {
                let name = first_arg(args)?;
                ctx.bootstrap(inc_dir)?;
                for script in resolve_lib(lib_dir, name)? {
                    ctx.registry.append_script(script);
                }
                ctx.out.push(format!("import {}", name));
                if name == HELPER_LIB {
                    emit_helper_init(&mut ctx.out, name);
                }
                Ok(true)
            }
            Directive::EmbedLib { lib_dir } => {
                let name = first_arg(args)?;
                for script in resolve_lib(lib_dir, name)? {
                    ctx.registry.append_script(script);
                }
                Ok(true)
            }
            Directive::EmbedScript { opt_dir } => {
                let path = opt_dir.join(first_arg(args)?);
                for script in embed_verbatim(opt_dir, &path)? {
                    ctx.registry.add_script(script);
                }
                Ok(true)
            }
        }
    }
}

fn first_arg(args: &[String]) -> PackResult<&str> {
    args.first()
        .map(String::as_str)
        .ok_or(PackError::EmptyDirective)
}

/// Inline a snippet file, wrapped in begin/end provenance comments.
fn include_file(out: &mut Vec<String>, inc_dir: &Path, name: &str, strip: bool) -> PackResult<()> {
    let path = inc_dir.join(name);
    if !path.is_file() {
        return Err(PackError::MissingFile(path));
    }
    let text = fs::read_to_string(&path)?;
    out.push(format!("# begin odfpack include: {}", name));
    if strip {
        out.extend(strip_source(&text));
    } else {
        out.extend(text.lines().map(|l| l.trim_end().to_string()));
    }
    out.push("# end odfpack include".to_string());
    Ok(())
}

/// Remove line comments and triple-quoted string literals (both quote
/// styles), then trim trailing blank lines.
pub fn strip_source(text: &str) -> Vec<String> {
    const QUOTES: [&str; 2] = ["\"\"\"", "'''"];
    let mut out = Vec::new();
    let mut in_doc: Option<&'static str> = None;
    for raw in text.lines() {
        let line = raw.trim_end();
        let trimmed = line.trim_start();
        match in_doc {
            Some(quote) => {
                if trimmed.ends_with(quote) {
                    in_doc = None;
                }
            }
            None => {
                if trimmed.starts_with('#') {
                    continue;
                }
                if let Some(quote) = QUOTES.into_iter().find(|q| trimmed.starts_with(q)) {
                    // A one-line literal closes itself.
                    if !(trimmed.len() >= quote.len() * 2 && trimmed.ends_with(quote)) {
                        in_doc = Some(quote);
                    }
                    continue;
                }
                out.push(line.to_string());
            }
        }
    }
    while out.last().map(|l| l.is_empty()) == Some(true) {
        out.pop();
    }
    out
}

/// Resolve a library reference to one or more source scripts: either
/// `<lib_dir>/<name>.py`, or every `.py` file one level inside the
/// directory `<lib_dir>/<name>`.
fn resolve_lib(lib_dir: &Path, name: &str) -> PackResult<Vec<SourceScript>> {
    let dir = lib_dir.join(name);
    if dir.is_dir() {
        let mut scripts = Vec::new();
        let mut entries: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().map(|e| e == "py") == Some(true))
            .collect();
        entries.sort();
        for path in entries {
            scripts.push(SourceScript::new(path, lib_dir.to_path_buf(), false));
        }
        return Ok(scripts);
    }
    let path = lib_dir.join(format!("{}.py", name));
    if !path.is_file() {
        return Err(PackError::MissingFile(path));
    }
    Ok(vec![SourceScript::new(path, lib_dir.to_path_buf(), false)])
}

/// Read a file, or every `.py` file one level inside a directory, as
/// verbatim scripts rooted at `opt_dir`.
fn embed_verbatim(opt_dir: &Path, path: &Path) -> PackResult<Vec<TempScript>> {
    if path.is_dir() {
        let mut scripts = Vec::new();
        let mut entries: Vec<PathBuf> = fs::read_dir(path)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().map(|e| e == "py") == Some(true))
            .collect();
        entries.sort();
        for entry in entries {
            scripts.push(read_verbatim(opt_dir, &entry)?);
        }
        return Ok(scripts);
    }
    if !path.is_file() {
        return Err(PackError::MissingFile(path.to_path_buf()));
    }
    Ok(vec![read_verbatim(opt_dir, path)?])
}

fn read_verbatim(opt_dir: &Path, path: &Path) -> PackResult<TempScript> {
    Ok(TempScript {
        path: path.to_path_buf(),
        content: fs::read(path)?,
        temp_dir: opt_dir.to_path_buf(),
        exported_func_names: Vec::new(),
        error: None,
    })
}

fn emit_helper_init(out: &mut Vec<String>, name: &str) {
    out.push("try:".to_string());
    out.push(format!("    {}.init(XSCRIPTCONTEXT)", name));
    out.push(format!("    del {}", name));
    out.push("except NameError:".to_string());
    out.push("    pass".to_string());
}

/// Purge previously loaded modules from the interpreter cache so that a
/// long-lived host process re-executes fresh code.
fn emit_module_purge(out: &mut Vec<String>, module_names: &BTreeSet<String>) {
    if module_names.is_empty() {
        return;
    }
    out.push("import sys".to_string());
    out.push("for module_name in (".to_string());
    for name in module_names {
        out.push(format!("    \"{}\",", name));
    }
    out.push("):".to_string());
    out.push("    if module_name in sys.modules:".to_string());
    out.push("        del sys.modules[module_name]".to_string());
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIRECTIVE TRIE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct DirectiveTree {
    children: HashMap<String, DirectiveTree>,
    directive: Option<Directive>,
}

/// Maps leading token sequences to directive handlers. Built once per
/// run, read-only afterwards, shared by every script.
#[derive(Debug)]
pub struct DirectiveProvider {
    tree: DirectiveTree,
}

impl DirectiveProvider {
    pub fn new(directives: Vec<Directive>) -> Self {
        let mut tree = DirectiveTree::default();
        for directive in directives {
            let mut node = &mut tree;
            for token in directive.sig_elements() {
                node = node.children.entry(token.to_string()).or_default();
            }
            node.directive = Some(directive);
        }
        DirectiveProvider { tree }
    }

    /// Standard set of directives for a source layout.
    pub fn create(
        inc_dir: &Path,
        lib_dir: &Path,
        src_dir: &Path,
        opt_dir: &Path,
        module_names: BTreeSet<String>,
    ) -> Self {
        DirectiveProvider::new(vec![
            Directive::Entry {
                inc_dir: inc_dir.to_path_buf(),
                module_names,
            },
            Directive::Include {
                inc_dir: inc_dir.to_path_buf(),
            },
            Directive::Import {
                inc_dir: inc_dir.to_path_buf(),
                src_dir: src_dir.to_path_buf(),
            },
            Directive::ImportLib {
                inc_dir: inc_dir.to_path_buf(),
                lib_dir: lib_dir.to_path_buf(),
            },
            Directive::EmbedLib {
                lib_dir: lib_dir.to_path_buf(),
            },
            Directive::EmbedScript {
                opt_dir: opt_dir.to_path_buf(),
            },
        ])
    }

    /// Longest-available-prefix lookup: descend while the next token is a
    /// key, otherwise hand the remaining tokens to the deepest terminal.
    pub fn get<'a>(&self, args: &'a [String]) -> PackResult<(&Directive, &'a [String])> {
        if args.is_empty() {
            return Err(PackError::EmptyDirective);
        }
        let mut node = &self.tree;
        for (i, arg) in args.iter().enumerate() {
            if let Some(child) = node.children.get(arg) {
                node = child;
            } else if let Some(directive) = &node.directive {
                return Ok((directive, &args[i..]));
            } else {
                return Err(PackError::UnknownDirective(args.to_vec()));
            }
        }
        match &node.directive {
            Some(directive) => Ok((directive, &args[args.len()..])),
            None => Err(PackError::UnknownDirective(args.to_vec())),
        }
    }
}
