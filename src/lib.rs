// Copyright (c) 2016-2021 Fabian Schuiki

//! A stochastic L-system rewriting engine.

// Re-export everything from the common crate.
pub extern crate lsys_common as common;
pub use crate::common::*;

// Pull in subcrates.
pub extern crate lsys_engine as engine;
pub extern crate lsys_grammar as grammar;
