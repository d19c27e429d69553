// Copyright (c) 2016-2021 Fabian Schuiki

//! Rewriting rules.
//!
//! A rule maps one pattern symbol to the replacement candidates it may be
//! rewritten to. Three kinds of rules exist:
//!
//! | Rule            | Selection                                            |
//! |-----------------|------------------------------------------------------|
//! | `Uniform`       | uniformly random candidate, picked per occurrence     |
//! | `Weighted`      | candidate drawn according to normalized weights      |
//! | `Leaf`          | the pattern itself; consumes no randomness           |
//!
//! A `Uniform` rule without candidates behaves like a `Leaf`.

use crate::token::{Replacement, Token};
use crate::Symbol;
use lsys_common::errors::*;
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;
use std::fmt;

const EPSILON: f64 = 1e-6;

/// The weight of a replacement candidate.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Weight {
    /// A relative proportion of outcomes, e.g. `3` out of a total of `4`.
    Proportion(u32),
    /// A probability in `[0,1]`.
    Probability(f64),
}

impl Weight {
    pub fn value(self) -> f64 {
        match self {
            Weight::Proportion(n) => n as f64,
            Weight::Probability(p) => p,
        }
    }
}

impl From<u32> for Weight {
    fn from(n: u32) -> Weight {
        Weight::Proportion(n)
    }
}

impl From<f64> for Weight {
    fn from(p: f64) -> Weight {
        Weight::Probability(p)
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Weight::Proportion(n) => write!(f, "{}", n),
            Weight::Probability(p) => write!(f, "{}", p),
        }
    }
}

/// A replacement candidate together with its weight.
#[derive(Clone, PartialEq, Debug)]
pub struct WeightedReplacement<S> {
    pub replacement: Replacement<S>,
    pub weight: Weight,
}

impl<S> WeightedReplacement<S> {
    pub fn new<W: Into<Weight>>(replacement: Replacement<S>, weight: W) -> WeightedReplacement<S> {
        WeightedReplacement {
            replacement,
            weight: weight.into(),
        }
    }
}

/// A rule whose candidates are drawn according to their weight.
///
/// The candidates are sorted by descending weight and their weights are
/// normalized to probabilities summing to 1.
#[derive(Clone, PartialEq, Debug)]
pub struct WeightedRule<S> {
    pattern: S,
    candidates: Vec<WeightedReplacement<S>>,
}

impl<S: Symbol> WeightedRule<S> {
    /// Create a new weighted rule.
    ///
    /// Integer proportions are normalized silently. Floating-point weights
    /// that do not sum to 1 are normalized as well, but with a warning, since
    /// they were probably meant to be probabilities already.
    pub fn new(pattern: S, mut candidates: Vec<WeightedReplacement<S>>) -> DiagResult2<Self> {
        if candidates.is_empty() {
            return Err(DiagBuilder2::error(format!(
                "weighted rule for `{}` has no candidates",
                pattern
            ))
            .add_note("use a leaf rule for symbols that replace themselves"));
        }
        for c in &candidates {
            let w = c.weight.value();
            if !w.is_finite() || w < 0.0 {
                return Err(DiagBuilder2::error(format!(
                    "weight {} of rule `{}` is not a non-negative number",
                    c.weight, pattern
                )));
            }
        }

        // Stable sort, such that candidates of equal weight keep their order.
        candidates.sort_by(|a, b| {
            b.weight
                .value()
                .partial_cmp(&a.weight.value())
                .unwrap_or(Ordering::Equal)
        });

        let total: f64 = candidates.iter().map(|c| c.weight.value()).sum();
        if total <= 0.0 {
            return Err(DiagBuilder2::error(format!(
                "weights of rule `{}` sum to zero",
                pattern
            )));
        }
        let proportions = candidates.iter().all(|c| match c.weight {
            Weight::Proportion(_) => true,
            Weight::Probability(_) => false,
        });
        let near_one = (total - 1.0).abs() < EPSILON;
        if !near_one && !proportions {
            warn!(
                "weights of rule `{}` sum to {} instead of 1; normalizing",
                pattern, total
            );
        }
        let scale = if near_one { 1.0 } else { total };
        for c in &mut candidates {
            c.weight = Weight::Probability(c.weight.value() / scale);
        }

        Ok(WeightedRule {
            pattern,
            candidates,
        })
    }

    pub fn pattern(&self) -> &S {
        &self.pattern
    }

    /// The candidates in order of descending probability.
    pub fn candidates(&self) -> &[WeightedReplacement<S>] {
        &self.candidates
    }

    /// The normalized probability of each candidate, in candidate order.
    pub fn probabilities(&self) -> Vec<f64> {
        self.candidates.iter().map(|c| c.weight.value()).collect()
    }

    /// Draw a candidate.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &Replacement<S> {
        let mut chance: f64 = rng.gen();
        let mut last = &self.candidates[0].replacement;
        for c in &self.candidates {
            chance -= c.weight.value();
            if chance <= 0.0 {
                return &c.replacement;
            }
            last = &c.replacement;
        }
        // Only reachable through rounding errors in the normalized weights.
        last
    }
}

/// A rewriting rule.
#[derive(Clone, PartialEq, Debug)]
pub enum Rule<S> {
    /// Rewrite to a uniformly chosen candidate.
    Uniform {
        pattern: S,
        candidates: Vec<Replacement<S>>,
    },
    /// Rewrite to a candidate drawn by weight.
    Weighted(WeightedRule<S>),
    /// Rewrite to the pattern itself.
    Leaf(S),
}

impl<S: Symbol> Rule<S> {
    /// Create a rule that picks uniformly among `candidates`. A single
    /// candidate is always chosen; no candidates make this a leaf.
    pub fn new(pattern: S, candidates: Vec<Replacement<S>>) -> Rule<S> {
        Rule::Uniform {
            pattern,
            candidates,
        }
    }

    /// Create a rule that always rewrites `pattern` to itself.
    pub fn leaf(pattern: S) -> Rule<S> {
        Rule::Leaf(pattern)
    }

    /// Create a rule that draws among `candidates` according to their
    /// weights. See [`WeightedRule::new`].
    pub fn weighted(pattern: S, candidates: Vec<WeightedReplacement<S>>) -> DiagResult2<Rule<S>> {
        WeightedRule::new(pattern, candidates).map(Rule::Weighted)
    }

    /// The symbol this rule matches.
    pub fn pattern(&self) -> &S {
        match *self {
            Rule::Uniform { ref pattern, .. } => pattern,
            Rule::Weighted(ref w) => w.pattern(),
            Rule::Leaf(ref pattern) => pattern,
        }
    }

    /// Append the replacement for one occurrence of the pattern to `out`.
    pub fn rewrite<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut Vec<Token<S>>) {
        match *self {
            Rule::Uniform {
                ref pattern,
                ref candidates,
            } => match candidates.len() {
                0 => out.push(Token::Symbol(pattern.clone())),
                1 => out.extend(candidates[0].iter().cloned()),
                _ => {
                    if let Some(c) = candidates.choose(rng) {
                        out.extend(c.iter().cloned());
                    }
                }
            },
            Rule::Weighted(ref w) => out.extend(w.choose(rng).iter().cloned()),
            Rule::Leaf(ref pattern) => out.push(Token::Symbol(pattern.clone())),
        }
    }
}

impl<S> From<WeightedRule<S>> for Rule<S> {
    fn from(w: WeightedRule<S>) -> Rule<S> {
        Rule::Weighted(w)
    }
}

impl<S: fmt::Display> fmt::Display for Rule<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn candidate<S: fmt::Display>(f: &mut fmt::Formatter, c: &[Token<S>]) -> fmt::Result {
            for (i, t) in c.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                match *t {
                    Token::Symbol(ref s) => write!(f, "{}", s)?,
                    Token::Literal(ref l) => write!(f, "{:?}", l)?,
                }
            }
            Ok(())
        }
        match *self {
            Rule::Uniform {
                ref pattern,
                ref candidates,
            } => {
                write!(f, "{} ->", pattern)?;
                for (i, c) in candidates.iter().enumerate() {
                    write!(f, "{}", if i > 0 { " | " } else { " " })?;
                    candidate(f, c)?;
                }
                Ok(())
            }
            Rule::Weighted(ref w) => {
                write!(f, "{} ->", w.pattern)?;
                for (i, c) in w.candidates.iter().enumerate() {
                    write!(f, "{}", if i > 0 { " | " } else { " " })?;
                    candidate(f, &c.replacement)?;
                    write!(f, " : {}", c.weight)?;
                }
                Ok(())
            }
            Rule::Leaf(ref pattern) => write!(f, "{} -> {}", pattern, pattern),
        }
    }
}
