// Copyright (c) 2016-2021 Fabian Schuiki

//! The grammar file format of the lsys framework.
//!
//! Grammar files are read in a single pass by [`parse`], which produces a
//! [`Grammar`] made of the rewriting engine's own types.

#[macro_use]
extern crate log;

pub mod cursor;
pub mod parser;

pub use crate::parser::{parse, parse_file, Grammar};
