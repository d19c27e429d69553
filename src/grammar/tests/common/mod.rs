// Copyright (c) 2016-2021 Fabian Schuiki
#![allow(dead_code)]

//! Utilities for grammar tests.

pub extern crate lsys_common;
pub extern crate lsys_engine as engine;
pub extern crate lsys_grammar as grammar;
pub use self::grammar::*;
pub use self::lsys_common::errors::*;

use std::cell::RefCell;

/// An emitter that keeps every diagnostic it receives.
#[derive(Default)]
pub struct Collect(RefCell<Vec<DiagBuilder2>>);

impl Collect {
    pub fn take(&self) -> Vec<DiagBuilder2> {
        std::mem::replace(&mut *self.0.borrow_mut(), Vec::new())
    }

    pub fn warnings(&self) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter(|d| d.get_severity() == Severity::Warning)
            .map(|d| d.get_message().clone())
            .collect()
    }
}

impl DiagEmitter for Collect {
    fn emit(&self, diag: DiagBuilder2) {
        self.0.borrow_mut().push(diag);
    }
}

/// Parse `input` as a grammar file of its own.
pub fn parse_with(input: &str, emitter: &Collect) -> DiagResult2<Grammar> {
    use lsys_common::source::get_source_manager;
    use std::cell::Cell;
    thread_local!(static INDEX: Cell<usize> = Cell::new(0));
    let sm = get_source_manager();
    let idx = INDEX.with(|i| {
        let v = i.get();
        i.set(v + 1);
        v
    });
    let source = sm.add(&format!("test_{}.lsys", idx), input);
    grammar::parse(source, emitter)
}

/// Parse `input`, panicking on errors.
pub fn parse(input: &str) -> Grammar {
    let emitter = Collect::default();
    match parse_with(input, &emitter) {
        Ok(g) => g,
        Err(d) => panic!("parsing failed:\n{}", d),
    }
}

/// Parse `input`, expecting an error, and return its message.
pub fn parse_err(input: &str) -> String {
    let emitter = Collect::default();
    match parse_with(input, &emitter) {
        Ok(g) => panic!("parsing should have failed, got:\n{}", g),
        Err(d) => {
            assert!(d.get_severity() >= Severity::Error);
            d.get_message().clone()
        }
    }
}
