// Copyright (c) 2016-2021 Fabian Schuiki

//! The rewriting engine.

use crate::rule::Rule;
use crate::token::{Axiom, Generation, Token};
use crate::Symbol;
use lsys_common::errors::*;
use rand::rngs::ThreadRng;
use rand::Rng;
use std::collections::HashMap;
use std::iter::FusedIterator;

/// An L-system: an axiom and at most one rule per pattern symbol.
///
/// The system is immutable after construction and may be walked any number
/// of times. Each walk draws from its own random number generator.
#[derive(Clone, Debug)]
pub struct LSystem<S: Symbol> {
    axiom: Axiom<S>,
    rules: HashMap<S, Rule<S>>,
    warn: bool,
}

impl<S: Symbol> LSystem<S> {
    /// Create a new system. Fails if two rules share a pattern.
    ///
    /// Symbols without a rule are terminal and emit a warning whenever they
    /// are encountered during a walk. See [`LSystem::with_warnings`].
    pub fn new<I>(axiom: Axiom<S>, rules: I) -> DiagResult2<LSystem<S>>
    where
        I: IntoIterator<Item = Rule<S>>,
    {
        let mut map = HashMap::new();
        for rule in rules {
            let pattern = rule.pattern().clone();
            if map.contains_key(&pattern) {
                return Err(DiagBuilder2::error(format!(
                    "more than one rule for pattern `{}`",
                    pattern
                ))
                .add_note("each symbol may be rewritten by at most one rule"));
            }
            map.insert(pattern, rule);
        }
        Ok(LSystem {
            axiom,
            rules: map,
            warn: true,
        })
    }

    /// Enable or disable the warning for symbols without a rule.
    pub fn with_warnings(mut self, warn: bool) -> LSystem<S> {
        self.warn = warn;
        self
    }

    pub fn axiom(&self) -> &Axiom<S> {
        &self.axiom
    }

    /// The rule for a pattern, if any.
    pub fn rule(&self, pattern: &S) -> Option<&Rule<S>> {
        self.rules.get(pattern)
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule<S>> {
        self.rules.values()
    }

    /// Apply one derivation step to every token of `tokens`.
    pub fn step<R: Rng + ?Sized>(&self, tokens: &[Token<S>], rng: &mut R) -> Vec<Token<S>> {
        let mut next = Vec::with_capacity(tokens.len());
        for token in tokens {
            match *token {
                Token::Literal(_) => next.push(token.clone()),
                Token::Symbol(ref sym) => match self.rules.get(sym) {
                    Some(rule) => rule.rewrite(rng, &mut next),
                    None => {
                        if self.warn {
                            warn!("no rule for symbol `{}`; treating it as terminal", sym);
                        }
                        next.push(token.clone());
                    }
                },
            }
        }
        next
    }

    /// Lazily derive generations using the thread-local random number
    /// generator.
    pub fn expand(&self) -> Expand<'_, S, ThreadRng> {
        self.expand_with(rand::thread_rng())
    }

    /// Lazily derive generations using `rng`.
    ///
    /// The iterator yields generation 1, 2, ... and ends as soon as a step
    /// leaves its input unchanged. The fixpoint is not yielded twice. Note
    /// that a grammar that never converges yields generations forever; cap
    /// the walk with [`Iterator::take`] if needed.
    pub fn expand_with<R: Rng>(&self, rng: R) -> Expand<'_, S, R> {
        Expand {
            system: self,
            rng,
            current: self.axiom.tokens(),
            index: 0,
            done: false,
        }
    }

    /// Derive until the fixpoint and render the final generation.
    pub fn realize(&self) -> String {
        self.realize_with(rand::thread_rng())
    }

    /// Derive until the fixpoint using `rng` and render the final generation.
    pub fn realize_with<R: Rng>(&self, rng: R) -> String {
        match self.expand_with(rng).last() {
            Some(gen) => gen.to_string(),
            None => Generation::new(0, self.axiom.tokens()).to_string(),
        }
    }
}

/// An iterator over the generations of an [`LSystem`].
///
/// Created by [`LSystem::expand`] and [`LSystem::expand_with`].
pub struct Expand<'a, S: Symbol, R> {
    system: &'a LSystem<S>,
    rng: R,
    current: Vec<Token<S>>,
    index: usize,
    done: bool,
}

impl<'a, S: Symbol, R> Expand<'a, S, R> {
    /// The index of the most recently yielded generation.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<'a, S: Symbol, R: Rng> Iterator for Expand<'a, S, R> {
    type Item = Generation<S>;

    fn next(&mut self) -> Option<Generation<S>> {
        if self.done {
            return None;
        }
        let next = self.system.step(&self.current, &mut self.rng);
        if next == self.current {
            trace!("fixpoint reached after generation {}", self.index);
            self.done = true;
            return None;
        }
        self.index += 1;
        trace!("generation {}: {} tokens", self.index, next.len());
        self.current = next;
        Some(Generation::new(self.index, self.current.clone()))
    }
}

impl<'a, S: Symbol, R: Rng> FusedIterator for Expand<'a, S, R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::WeightedReplacement;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    alphabet! {
        enum Alg {
            A = "A",
            B = "B",
            C = "c",
        }
    }

    fn sym(s: Alg) -> Token<Alg> {
        Token::Symbol(s)
    }

    #[test]
    fn deterministic_expansion() {
        // A -> AB, B -> A, stopped after four steps.
        let sys = LSystem::new(
            Axiom::new(vec![Alg::A]),
            vec![
                Rule::new(Alg::A, vec![vec![sym(Alg::A), sym(Alg::B)]]),
                Rule::new(Alg::B, vec![vec![sym(Alg::A)]]),
            ],
        )
        .unwrap();
        let gens: Vec<String> = sys.expand().take(4).map(|g| g.to_string()).collect();
        assert_eq!(gens, vec!["AB", "ABA", "ABAAB", "ABAABABA"]);
    }

    #[test]
    fn fixpoint_terminates() {
        // A -> B "!", B -> c, c is a leaf.
        let sys = LSystem::new(
            Axiom::new(vec![Alg::A, Alg::A]),
            vec![
                Rule::new(Alg::A, vec![vec![sym(Alg::B), "!".into()]]),
                Rule::new(Alg::B, vec![vec![sym(Alg::C)]]),
                Rule::leaf(Alg::C),
            ],
        )
        .unwrap();
        let gens: Vec<_> = sys.expand().collect();
        assert_eq!(gens.len(), 2);
        assert_eq!(gens[0].index(), 1);
        assert_eq!(gens[1].index(), 2);
        assert_eq!(gens[1].to_string(), "c!c!");
        let last = gens[1].tokens().to_vec();
        assert_eq!(sys.step(&last, &mut rand::thread_rng()), last);
        assert_eq!(sys.realize(), "c!c!");
    }

    #[test]
    fn fixpoint_axiom_realizes_to_itself() {
        let sys = LSystem::new(Axiom::new(vec![Alg::C, Alg::C]), vec![Rule::leaf(Alg::C)]).unwrap();
        assert_eq!(sys.expand().next(), None);
        assert_eq!(sys.realize(), "cc");
    }

    #[test]
    fn terminal_fallback() {
        let sys = LSystem::new(
            Axiom::new(vec![Alg::A]),
            vec![Rule::new(Alg::A, vec![vec![sym(Alg::C), "x".into(), sym(Alg::B)]])],
        )
        .unwrap()
        .with_warnings(false);
        assert_eq!(sys.realize(), "cxB");
    }

    #[test]
    fn terminal_warning_gated() {
        let sys = LSystem::new(
            Axiom::new(vec![Alg::A]),
            vec![Rule::new(Alg::A, vec![vec![sym(Alg::B)]])],
        )
        .unwrap();
        let tokens = vec![sym(Alg::B), "x".into()];

        let (next, logged) =
            crate::test_log::warnings(|| sys.step(&tokens, &mut rand::thread_rng()));
        assert_eq!(next, tokens);
        assert_eq!(logged.len(), 1);
        assert!(logged[0].contains("`B`"), "{}", logged[0]);

        let quiet = sys.with_warnings(false);
        let (next, logged) =
            crate::test_log::warnings(|| quiet.step(&tokens, &mut rand::thread_rng()));
        assert_eq!(next, tokens);
        assert!(logged.is_empty());
    }

    #[test]
    fn duplicate_rules_rejected() {
        let res = LSystem::new(
            Axiom::new(vec![Alg::A]),
            vec![Rule::leaf(Alg::A), Rule::new(Alg::A, vec![])],
        );
        assert!(res.is_err());
    }

    #[test]
    fn seeded_walks_repeat() {
        let sys = LSystem::new(
            Axiom::new(vec![Alg::A, Alg::A, Alg::A, Alg::A]),
            vec![
                Rule::weighted(
                    Alg::A,
                    vec![
                        WeightedReplacement::new(vec![sym(Alg::B)], 1u32),
                        WeightedReplacement::new(vec![sym(Alg::C)], 1u32),
                    ],
                )
                .unwrap(),
                Rule::new(Alg::B, vec![vec!["b".into()], vec!["B".into()]]),
                Rule::leaf(Alg::C),
            ],
        )
        .unwrap();
        let a = sys.realize_with(StdRng::seed_from_u64(11));
        let b = sys.realize_with(StdRng::seed_from_u64(11));
        assert_eq!(a, b);
        assert_eq!(a.chars().count(), 4);
    }
}
