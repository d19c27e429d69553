// Copyright (c) 2016-2021 Fabian Schuiki

//! Generate many similar replacement candidates from a single recipe.
//!
//! A recipe is a sequence of tokens with placeholders in between. Spreading
//! the recipe over a list of items yields one candidate per item, with the
//! placeholders substituted by the item's values:
//!
//! ```ignore
//! let filler = Filler::new(vec![Part::symbol(Det), Part::literal(" "), Part::Var])?;
//! let nouns = filler.spread(vec!["cat", "dog"])?;
//! ```
//!
//! A recipe either uses the single [`Part::Var`] placeholder, filled with
//! each item as a whole, or numbered [`Part::Slot`]s, each filled from the
//! matching position of a tuple, array, or vector item.

use crate::rule::{Weight, WeightedReplacement};
use crate::token::{Replacement, Token};
use lsys_common::errors::*;
use std::fmt;

/// One element of a recipe.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Part<S> {
    /// A fixed token.
    Token(Token<S>),
    /// Filled with the entire item.
    Var,
    /// Filled with the n-th value of the item, counting from 1.
    Slot(usize),
}

impl<S> Part<S> {
    pub fn symbol(sym: S) -> Part<S> {
        Part::Token(Token::Symbol(sym))
    }

    pub fn literal<T: Into<std::sync::Arc<str>>>(text: T) -> Part<S> {
        Part::Token(Token::literal(text))
    }
}

impl<S> From<Token<S>> for Part<S> {
    fn from(token: Token<S>) -> Part<S> {
        Part::Token(token)
    }
}

/// A value that can be substituted into a recipe.
pub trait Fill<S> {
    /// The item as a single token, if it is a single value.
    fn whole(&self) -> Option<Token<S>>;

    /// The value at 1-based position `slot`, if the item has one.
    fn nth(&self, slot: usize) -> Option<Token<S>>;
}

impl<'a, S> Fill<S> for &'a str {
    fn whole(&self) -> Option<Token<S>> {
        Some(Token::literal(*self))
    }

    fn nth(&self, _: usize) -> Option<Token<S>> {
        None
    }
}

impl<S> Fill<S> for String {
    fn whole(&self) -> Option<Token<S>> {
        Some(Token::literal(self.as_str()))
    }

    fn nth(&self, _: usize) -> Option<Token<S>> {
        None
    }
}

impl<S: Clone> Fill<S> for Token<S> {
    fn whole(&self) -> Option<Token<S>> {
        Some(self.clone())
    }

    fn nth(&self, _: usize) -> Option<Token<S>> {
        None
    }
}

impl<S, T: Fill<S>> Fill<S> for Vec<T> {
    fn whole(&self) -> Option<Token<S>> {
        None
    }

    fn nth(&self, slot: usize) -> Option<Token<S>> {
        slot.checked_sub(1)
            .and_then(|i| self.get(i))
            .and_then(|t| t.whole())
    }
}

impl<S, T: Fill<S>, const N: usize> Fill<S> for [T; N] {
    fn whole(&self) -> Option<Token<S>> {
        None
    }

    fn nth(&self, slot: usize) -> Option<Token<S>> {
        slot.checked_sub(1)
            .and_then(|i| self.get(i))
            .and_then(|t| t.whole())
    }
}

impl<S, A: Fill<S>, B: Fill<S>> Fill<S> for (A, B) {
    fn whole(&self) -> Option<Token<S>> {
        None
    }

    fn nth(&self, slot: usize) -> Option<Token<S>> {
        match slot {
            1 => self.0.whole(),
            2 => self.1.whole(),
            _ => None,
        }
    }
}

impl<S, A: Fill<S>, B: Fill<S>, C: Fill<S>> Fill<S> for (A, B, C) {
    fn whole(&self) -> Option<Token<S>> {
        None
    }

    fn nth(&self, slot: usize) -> Option<Token<S>> {
        match slot {
            1 => self.0.whole(),
            2 => self.1.whole(),
            3 => self.2.whole(),
            _ => None,
        }
    }
}

/// The weight of a spread candidate.
pub trait Weigh<S> {
    fn weigh(&self, replacement: &[Token<S>]) -> Weight;
}

impl<S> Weigh<S> for u32 {
    fn weigh(&self, _: &[Token<S>]) -> Weight {
        Weight::Proportion(*self)
    }
}

impl<S> Weigh<S> for f64 {
    fn weigh(&self, _: &[Token<S>]) -> Weight {
        Weight::Probability(*self)
    }
}

impl<S> Weigh<S> for Weight {
    fn weigh(&self, _: &[Token<S>]) -> Weight {
        *self
    }
}

impl<S, F> Weigh<S> for F
where
    F: Fn(&[Token<S>]) -> Weight,
{
    fn weigh(&self, replacement: &[Token<S>]) -> Weight {
        self(replacement)
    }
}

/// A recipe for replacement candidates.
#[derive(Clone, Debug)]
pub struct Filler<S> {
    recipe: Vec<Part<S>>,
}

impl<S: Clone> Filler<S> {
    /// Create a filler from a recipe. Fails if the recipe mixes `Var` and
    /// `Slot` placeholders, or uses slot 0.
    pub fn new(recipe: Vec<Part<S>>) -> DiagResult2<Filler<S>> {
        let has_var = recipe.iter().any(|p| match *p {
            Part::Var => true,
            _ => false,
        });
        let has_slot = recipe.iter().any(|p| match *p {
            Part::Slot(_) => true,
            _ => false,
        });
        if has_var && has_slot {
            return Err(DiagBuilder2::error(
                "recipe mixes single-slot and numbered placeholders",
            )
            .add_note("use either `Part::Var` or `Part::Slot(n)` throughout a recipe"));
        }
        if recipe.iter().any(|p| match *p {
            Part::Slot(n) => n == 0,
            _ => false,
        }) {
            return Err(DiagBuilder2::error("recipe slots are numbered from 1"));
        }
        Ok(Filler { recipe })
    }

    pub fn recipe(&self) -> &[Part<S>] {
        &self.recipe
    }

    /// Produce one candidate per item, in item order.
    pub fn spread<I>(&self, items: I) -> DiagResult2<Vec<Replacement<S>>>
    where
        I: IntoIterator,
        I::Item: Fill<S> + fmt::Debug,
    {
        items.into_iter().map(|item| self.fill(&item)).collect()
    }

    /// Produce one weighted candidate per item. The weight is either a
    /// constant or a function of the produced candidate.
    pub fn weighted_spread<I, W>(
        &self,
        items: I,
        weight: W,
    ) -> DiagResult2<Vec<WeightedReplacement<S>>>
    where
        I: IntoIterator,
        I::Item: Fill<S> + fmt::Debug,
        W: Weigh<S>,
    {
        items
            .into_iter()
            .map(|item| {
                let replacement = self.fill(&item)?;
                let w = weight.weigh(&replacement);
                Ok(WeightedReplacement::new(replacement, w))
            })
            .collect()
    }

    fn fill<T: Fill<S> + fmt::Debug>(&self, item: &T) -> DiagResult2<Replacement<S>> {
        let mut out = Vec::with_capacity(self.recipe.len());
        for part in &self.recipe {
            match *part {
                Part::Token(ref t) => out.push(t.clone()),
                Part::Var => match item.whole() {
                    Some(t) => out.push(t),
                    None => {
                        return Err(DiagBuilder2::error(format!(
                            "item {:?} cannot fill a single placeholder",
                            item
                        )))
                    }
                },
                Part::Slot(n) => match item.nth(n) {
                    Some(t) => out.push(t),
                    None => {
                        return Err(DiagBuilder2::error(format!(
                            "index out of range: item {:?} has no value for slot {}",
                            item, n
                        )))
                    }
                },
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(c: char) -> Token<char> {
        Token::Symbol(c)
    }

    #[test]
    fn single_slot() {
        let f = Filler::new(vec![Part::symbol('A'), Part::symbol('B'), Part::Var]).unwrap();
        let got = f.spread(vec!["x", "y"]).unwrap();
        assert_eq!(
            got,
            vec![
                vec![sym('A'), sym('B'), "x".into()],
                vec![sym('A'), sym('B'), "y".into()],
            ]
        );
    }

    #[test]
    fn multi_slot() {
        let f = Filler::new(vec![
            Part::Slot(2),
            Part::literal(" "),
            Part::Slot(1),
            Part::symbol('N'),
        ])
        .unwrap();
        let got = f.spread(vec![("cat", "black"), ("dog", "brown")]).unwrap();
        assert_eq!(
            got,
            vec![
                vec!["black".into(), " ".into(), "cat".into(), sym('N')],
                vec!["brown".into(), " ".into(), "dog".into(), sym('N')],
            ]
        );
    }

    #[test]
    fn slot_out_of_range() {
        let f = Filler::new(vec![Part::Slot(1), Part::Slot(3)]).unwrap();
        let err = f.spread(vec![vec!["a", "b", "c"], vec!["d", "e"]]).unwrap_err();
        assert!(err.get_message().contains("index out of range"));
        assert!(err.get_message().contains("\"d\""));
        let ok: Vec<Replacement<char>> = f.spread(vec![["a", "b", "c"]]).unwrap();
        assert_eq!(ok, vec![vec!["a".into(), "c".into()]]);
    }

    #[test]
    fn mixed_modes_rejected() {
        assert!(Filler::<char>::new(vec![Part::Var, Part::Slot(1)]).is_err());
        assert!(Filler::<char>::new(vec![Part::Slot(0)]).is_err());
    }

    #[test]
    fn weighted_by_constant_and_length() {
        let f = Filler::new(vec![Part::symbol('A'), Part::Var]).unwrap();
        let constant = f.weighted_spread(vec!["ab", "c"], 3u32).unwrap();
        assert!(constant.iter().all(|w| w.weight == Weight::Proportion(3)));

        let by_len = f
            .weighted_spread(vec!["ab", "c"], |r: &[Token<char>]| {
                Weight::Proportion(r.iter().map(|t| t.to_string().len() as u32).sum())
            })
            .unwrap();
        assert_eq!(by_len[0].weight, Weight::Proportion(3));
        assert_eq!(by_len[1].weight, Weight::Proportion(2));
        assert_eq!(by_len[1].replacement, vec![sym('A'), "c".into()]);
    }
}
