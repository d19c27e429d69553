// Copyright (c) 2016-2021 Fabian Schuiki

//! This crate contains the fundamental utilities used by the rest of the
//! lsys framework: diagnostics, source file management, and the session
//! that ties them together.

#[macro_use]
extern crate bitflags;

pub mod errors;
pub mod source;

use crate::errors::{DiagBuilder2, DiagEmitter, Severity};
use std::cell::Cell;

/// A rewriting session. Carries the options a run was configured with and
/// acts as the top-level sink for diagnostics.
pub struct Session {
    pub opts: SessionOptions,
    /// Whether an error has been reported.
    failed: Cell<bool>,
}

impl Session {
    /// Create a new session.
    pub fn new() -> Session {
        Session {
            opts: Default::default(),
            failed: Cell::new(false),
        }
    }

    /// Check whether an error has been emitted.
    pub fn failed(&self) -> bool {
        self.failed.get()
    }

    /// Check whether a verbosity option is set.
    pub fn has_verbosity(&self, verb: Verbosity) -> bool {
        self.opts.verbosity.contains(verb)
    }
}

impl Default for Session {
    fn default() -> Session {
        Session::new()
    }
}

impl DiagEmitter for Session {
    fn emit(&self, diag: DiagBuilder2) {
        if diag.get_severity() >= Severity::Error {
            self.failed.set(true);
        }
        eprintln!("{}", diag);
    }
}

/// A set of options for a session.
///
/// The arguments passed on the command line are intended to modify these
/// values in order to configure the execution of the program.
#[derive(Debug, Default)]
pub struct SessionOptions {
    /// Additional output to produce besides the final result.
    pub verbosity: Verbosity,
    /// Seed for the random stream of every walk. Fresh entropy if `None`.
    pub seed: Option<u64>,
    /// Stop a walk after this many generations, fixpoint or not.
    pub max_generations: Option<usize>,
    /// How many independent walks to realize.
    pub count: usize,
}

bitflags! {
    /// Verbosity options.
    #[derive(Default)]
    pub struct Verbosity: u32 {
        /// Dump the parsed grammar before rewriting.
        const GRAMMAR     = 1 << 0;
        /// Print every generation of a walk, not just the last one.
        const GENERATIONS = 1 << 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_do_not_fail_session() {
        let sess = Session::new();
        sess.emit(DiagBuilder2::warning("just a warning"));
        assert!(!sess.failed());
        sess.emit(DiagBuilder2::error("an actual error"));
        assert!(sess.failed());
    }

    #[test]
    fn verbosity_flags() {
        let mut sess = Session::new();
        assert!(!sess.has_verbosity(Verbosity::GRAMMAR));
        sess.opts.verbosity |= Verbosity::GRAMMAR;
        assert!(sess.has_verbosity(Verbosity::GRAMMAR));
        assert!(!sess.has_verbosity(Verbosity::GENERATIONS));
    }
}
