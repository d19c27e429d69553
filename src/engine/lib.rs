// Copyright (c) 2016-2021 Fabian Schuiki

//! A stochastic L-system rewriting engine.
//!
//! An [`LSystem`] owns an [`Axiom`] and one [`Rule`] per pattern symbol. Every
//! derivation step rewrites all tokens of the current generation at once, and
//! [`LSystem::expand`] yields generations until one step changes nothing.
//!
//! Symbols are any type implementing [`Symbol`]. Closed alphabets known at
//! compile time are declared with the [`alphabet!`] macro; alphabets only
//! known at runtime (e.g. parsed from a grammar file) use a [`SymbolTable`].

#[macro_use]
extern crate log;

#[macro_use]
pub mod symbol;
pub mod convert;
pub mod filler;
pub mod rule;
pub mod system;
pub mod token;

pub use crate::convert::RuleConverter;
pub use crate::filler::{Fill, Filler, Part, Weigh};
pub use crate::rule::{Rule, Weight, WeightedReplacement, WeightedRule};
pub use crate::symbol::{Alphabet, EnumAlphabet, NamedSymbol, Sym, Symbol, SymbolTable};
pub use crate::system::{Expand, LSystem};
pub use crate::token::{Axiom, Generation, Replacement, Token};

pub use rand;

/// A logger that records warnings per thread, such that tests can check which
/// diagnostics an operation logs.
#[cfg(test)]
pub(crate) mod test_log {
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use std::cell::RefCell;
    use std::sync::Once;

    struct Capture;

    static CAPTURE: Capture = Capture;
    static INIT: Once = Once::new();

    thread_local!(static WARNINGS: RefCell<Vec<String>> = RefCell::new(Vec::new()));

    impl Log for Capture {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= Level::Warn
        }

        fn log(&self, record: &Record) {
            if self.enabled(record.metadata()) {
                let msg = record.args().to_string();
                WARNINGS.with(|w| w.borrow_mut().push(msg));
            }
        }

        fn flush(&self) {}
    }

    /// Run `f` and return its result together with the warnings it logged.
    pub fn warnings<T, F: FnOnce() -> T>(f: F) -> (T, Vec<String>) {
        INIT.call_once(|| {
            if log::set_logger(&CAPTURE).is_ok() {
                log::set_max_level(LevelFilter::Trace);
            }
        });
        WARNINGS.with(|w| w.borrow_mut().clear());
        let result = f();
        let logged = WARNINGS.with(|w| w.borrow_mut().drain(..).collect());
        (result, logged)
    }
}
