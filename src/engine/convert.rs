// Copyright (c) 2016-2021 Fabian Schuiki

//! Build rules from compact inline templates.
//!
//! A template is plain text with symbol names enclosed in a pair of
//! delimiters, e.g. `"@Subject@ sees @Object@"`. Plain runs become literals,
//! delimited runs are looked up in an alphabet.

use crate::rule::Rule;
use crate::symbol::Alphabet;
use crate::token::{Replacement, Token};
use lsys_common::errors::*;
use regex::Regex;

/// Converts templates into rules over an alphabet.
pub struct RuleConverter<A> {
    alphabet: A,
    start: String,
    end: String,
    regex: Regex,
}

impl<A: Alphabet> RuleConverter<A> {
    /// Create a converter with the given delimiters, which may be equal.
    pub fn new(alphabet: A, start: &str, end: &str) -> DiagResult2<RuleConverter<A>> {
        if start.is_empty() || end.is_empty() {
            return Err(DiagBuilder2::error("template delimiters must not be empty"));
        }
        let pattern = format!("{}(.+?){}", regex::escape(start), regex::escape(end));
        let regex = Regex::new(&pattern).map_err(|e| {
            DiagBuilder2::bug(format!("invalid template pattern `{}`: {}", pattern, e))
        })?;
        Ok(RuleConverter {
            alphabet,
            start: start.to_string(),
            end: end.to_string(),
            regex,
        })
    }

    pub fn alphabet(&self) -> &A {
        &self.alphabet
    }

    /// Convert a single template into a replacement.
    pub fn replacement(&self, template: &str) -> DiagResult2<Replacement<A::Symbol>> {
        let mut out = Vec::new();
        let mut last = 0;
        for caps in self.regex.captures_iter(template) {
            let (whole, name) = match (caps.get(0), caps.get(1)) {
                (Some(w), Some(n)) => (w, n),
                _ => continue,
            };
            if whole.start() > last {
                out.push(Token::literal(&template[last..whole.start()]));
            }
            match self.alphabet.lookup(name.as_str()) {
                Some(sym) => out.push(Token::Symbol(sym)),
                None => {
                    return Err(DiagBuilder2::error(format!(
                        "unknown symbol `{}{}{}` in template `{}`",
                        self.start,
                        name.as_str(),
                        self.end,
                        template
                    )))
                }
            }
            last = whole.end();
        }
        if last < template.len() {
            out.push(Token::literal(&template[last..]));
        }
        Ok(out)
    }

    /// Build a rule for `pattern` with one candidate per template, in order.
    pub fn convert(&self, pattern: A::Symbol, templates: &[&str]) -> DiagResult2<Rule<A::Symbol>> {
        let candidates = templates
            .iter()
            .map(|t| self.replacement(t))
            .collect::<DiagResult2<Vec<_>>>()?;
        debug!(
            "converted {} template(s) for `{}`",
            candidates.len(),
            pattern
        );
        Ok(Rule::new(pattern, candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{EnumAlphabet, SymbolTable};

    alphabet! {
        enum Ab {
            A = "a",
            B = "b",
        }
    }

    #[test]
    fn convert_template() {
        let conv = RuleConverter::new(EnumAlphabet::<Ab>::new(), "@", "@").unwrap();
        let rule = conv.convert(Ab::A, &["@B@ and @B@"]).unwrap();
        assert_eq!(
            rule,
            Rule::new(
                Ab::A,
                vec![vec![
                    Token::Symbol(Ab::B),
                    " and ".into(),
                    Token::Symbol(Ab::B)
                ]]
            )
        );
    }

    #[test]
    fn one_candidate_per_template() {
        let mut tbl = SymbolTable::new();
        let noun = tbl.declare("Noun").unwrap();
        let adj = tbl.declare("Adj").unwrap();
        let conv = RuleConverter::new(&tbl, "<", ">").unwrap();
        let rule = conv
            .convert(noun.clone(), &["the <Adj> cat", "<Noun>", "plain"])
            .unwrap();
        match rule {
            Rule::Uniform { candidates, .. } => {
                assert_eq!(
                    candidates,
                    vec![
                        vec!["the ".into(), Token::Symbol(adj), " cat".into()],
                        vec![Token::Symbol(noun)],
                        vec!["plain".into()],
                    ]
                );
            }
            other => panic!("expected uniform rule, got {:?}", other),
        }
    }

    #[test]
    fn unknown_symbol_rejected() {
        let conv = RuleConverter::new(EnumAlphabet::<Ab>::new(), "@", "@").unwrap();
        let err = conv.convert(Ab::A, &["@B@ and @C@"]).unwrap_err();
        assert!(err.get_message().contains("@C@"));
    }
}
