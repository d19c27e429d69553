// Copyright (c) 2016-2021 Fabian Schuiki

//! Tokens and the sequences built from them.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// The atom of axioms, replacements, and generations.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Token<S> {
    /// A symbol that rules may match.
    Symbol(S),
    /// Verbatim text. Never matched by any rule.
    Literal(Arc<str>),
}

impl<S> Token<S> {
    /// Create a literal token.
    pub fn literal<T: Into<Arc<str>>>(text: T) -> Token<S> {
        Token::Literal(text.into())
    }

    /// Return the symbol of this token, if it is one.
    pub fn as_symbol(&self) -> Option<&S> {
        match *self {
            Token::Symbol(ref s) => Some(s),
            Token::Literal(_) => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        match *self {
            Token::Literal(_) => true,
            Token::Symbol(_) => false,
        }
    }
}

impl<S: fmt::Display> fmt::Display for Token<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Token::Symbol(ref s) => fmt::Display::fmt(s, f),
            Token::Literal(ref t) => f.write_str(t),
        }
    }
}

impl<'a, S> From<&'a str> for Token<S> {
    fn from(text: &'a str) -> Token<S> {
        Token::Literal(text.into())
    }
}

impl<S> From<String> for Token<S> {
    fn from(text: String) -> Token<S> {
        Token::Literal(text.into())
    }
}

/// One expansion candidate of a rule.
pub type Replacement<S> = Vec<Token<S>>;

/// The symbols a derivation starts from.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Axiom<S>(Vec<S>);

impl<S> Axiom<S> {
    pub fn new<I: IntoIterator<Item = S>>(symbols: I) -> Axiom<S> {
        Axiom(symbols.into_iter().collect())
    }

    pub fn symbols(&self) -> &[S] {
        &self.0
    }
}

impl<S: Clone> Axiom<S> {
    /// The axiom as generation zero.
    pub fn tokens(&self) -> Vec<Token<S>> {
        self.0.iter().cloned().map(Token::Symbol).collect()
    }
}

impl<S: fmt::Display> fmt::Display for Axiom<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Axiom(")?;
        for s in &self.0 {
            write!(f, "{}", s)?;
        }
        write!(f, ")")
    }
}

/// The token sequence after a number of derivation steps.
///
/// Renders as the concatenation of its tokens.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Generation<S> {
    index: usize,
    tokens: Vec<Token<S>>,
}

impl<S> Generation<S> {
    pub fn new(index: usize, tokens: Vec<Token<S>>) -> Generation<S> {
        Generation { index, tokens }
    }

    /// The number of derivation steps that led to this generation. The axiom
    /// is generation 0.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn tokens(&self) -> &[Token<S>] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token<S>> {
        self.tokens
    }
}

impl<S> Deref for Generation<S> {
    type Target = [Token<S>];
    fn deref(&self) -> &[Token<S>] {
        &self.tokens
    }
}

impl<S: fmt::Display> fmt::Display for Generation<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for t in &self.tokens {
            write!(f, "{}", t)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_tokens() {
        let tokens: Vec<Token<char>> = vec![
            Token::Symbol('A'),
            " and ".into(),
            Token::Symbol('B'),
        ];
        assert_eq!(Generation::new(1, tokens).to_string(), "A and B");
    }

    #[test]
    fn axiom_as_generation_zero() {
        let axiom = Axiom::new(vec!['F', 'X']);
        assert_eq!(
            axiom.tokens(),
            vec![Token::Symbol('F'), Token::Symbol('X')]
        );
        assert_eq!(axiom.to_string(), "Axiom(FX)");
    }

    #[test]
    fn literal_is_not_symbol() {
        let t: Token<char> = Token::literal("x");
        assert!(t.is_literal());
        assert_eq!(t.as_symbol(), None);
        assert_eq!(Token::Symbol('x').as_symbol(), Some(&'x'));
    }
}
