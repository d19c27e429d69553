// Copyright (c) 2016-2021 Fabian Schuiki

//! A character cursor with one character of lookahead.

use lsys_common::source::{Source, Span};

/// A cursor over the decoded characters of a source file.
///
/// The characters are collected from the source content once, when the
/// cursor is created.
pub struct Cursor {
    source: Source,
    chars: Vec<(usize, char)>,
    pos: usize,
    end: usize,
}

impl Cursor {
    /// Create a new cursor at the beginning of `source`.
    pub fn new(source: Source) -> Cursor {
        let content = source.get_content();
        let chars: Vec<_> = content.iter().collect();
        let end = content.text().len();
        Cursor {
            source,
            chars,
            pos: 0,
            end,
        }
    }

    /// Look at the next character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    /// Consume the next character.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    /// Consume the next character if it is `c`.
    pub fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume characters as long as `pred` holds.
    pub fn skip_while<F: Fn(char) -> bool>(&mut self, pred: F) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += 1;
        }
    }

    /// The byte offset of the next character, or the end of the source.
    pub fn offset(&self) -> usize {
        self.chars.get(self.pos).map(|&(i, _)| i).unwrap_or(self.end)
    }

    /// The span from `begin` up to the current offset.
    pub fn span(&self, begin: usize) -> Span {
        Span::new(self.source, begin, self.offset())
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsys_common::source::get_source_manager;

    #[test]
    fn peek_and_bump() {
        let source = get_source_manager().add_anonymous("a老b");
        let mut cur = Cursor::new(source);
        assert_eq!(cur.peek(), Some('a'));
        assert_eq!(cur.bump(), Some('a'));
        assert_eq!(cur.offset(), 1);
        assert!(cur.eat('老'));
        assert!(!cur.eat('x'));
        assert_eq!(cur.offset(), 4);
        assert_eq!(cur.bump(), Some('b'));
        assert!(cur.is_eof());
        assert_eq!(cur.bump(), None);
        assert_eq!(cur.offset(), 5);
        assert_eq!(cur.span(1).extract(), "老b");
    }

    #[test]
    fn skip_while() {
        let source = get_source_manager().add_anonymous("   x");
        let mut cur = Cursor::new(source);
        cur.skip_while(char::is_whitespace);
        assert_eq!(cur.peek(), Some('x'));
    }
}
