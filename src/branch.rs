//! Conditional-compilation stack machine.
//!
//! Tracks nested `if/elif/else/endif` directives and answers one question:
//! should the current line be kept or discarded? The `elif` transition is
//! deliberately not standard chaining: each frame is a single boolean, so
//! an `elif` directly after a taken branch flips to skipping without
//! evaluating its own condition.

use crate::error::{PackError, PackResult};

/// Evaluates a three-token branch condition (`lhs op rhs`).
pub trait ConditionTester {
    fn test(&self, args: &[String]) -> PackResult<bool>;
}

pub struct BranchProcessor {
    tester: Box<dyn ConditionTester>,
    // One frame per open `if`: true = currently emitting.
    dont_skips: Vec<bool>,
}

impl BranchProcessor {
    pub fn new(tester: Box<dyn ConditionTester>) -> Self {
        BranchProcessor {
            tester,
            dont_skips: Vec::new(),
        }
    }

    /// Handle a branch directive. Returns `Ok(false)` if `name` is not a
    /// branch directive at all, so the caller can try the general
    /// directive dispatcher.
    pub fn handle_directive(&mut self, name: &str, args: &[String]) -> PackResult<bool> {
        match name {
            "if" => {
                let cond = self.tester.test(args)?;
                self.dont_skips.push(cond);
            }
            "elif" => {
                let frame = self.current_frame(name)?;
                if frame {
                    // The branch just above emitted; this elif skips
                    // without evaluating its condition.
                    self.set_frame(false);
                } else if self.tester.test(args)? {
                    self.set_frame(true);
                }
                // else: keep skipping
            }
            "else" => {
                let frame = self.current_frame(name)?;
                self.set_frame(!frame);
            }
            "endif" => {
                self.current_frame(name)?;
                self.dont_skips.pop();
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// True iff the current line must be suppressed: an inner block is
    /// suppressed if it or any enclosing block is suppressed.
    pub fn skip(&self) -> bool {
        self.dont_skips.iter().any(|keep| !keep)
    }

    pub fn depth(&self) -> usize {
        self.dont_skips.len()
    }

    /// Must be called once all lines are processed; an open block at end
    /// of file is a fatal authoring error.
    pub fn end(&self) -> PackResult<()> {
        if self.dont_skips.is_empty() {
            Ok(())
        } else {
            Err(PackError::UnterminatedBlock(self.dont_skips.len()))
        }
    }

    fn current_frame(&self, name: &str) -> PackResult<bool> {
        self.dont_skips
            .last()
            .copied()
            .ok_or_else(|| PackError::StrayBranchDirective(name.to_string()))
    }

    fn set_frame(&mut self, value: bool) {
        if let Some(frame) = self.dont_skips.last_mut() {
            *frame = value;
        }
    }
}
