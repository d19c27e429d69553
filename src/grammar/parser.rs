// Copyright (c) 2016-2021 Fabian Schuiki

//! A single-pass parser for grammar files.
//!
//! The parser walks the source once, left to right, with one character of
//! lookahead. No token stream or syntax tree is built; declarations are
//! accumulated directly and turned into engine rules once the input is
//! exhausted. A grammar file looks as follows:
//!
//! ```text
//! # comment to end of line
//! %SYM1, SYM2, SYM3
//! @SYM1, SYM2@
//! $SYM1=
//!   SYM2 "literal text" SYM3 : 2 | "only literal" : 3 ~
//! $SYM2=~
//! ```
//!
//! - `%` declares the alphabet, terminated by the next `#`, `$`, `@`, `%`, or
//!   `~`.
//! - `@...@` declares the axiom.
//! - `$NAME=` starts the rule for a pattern symbol.
//! - `=` is followed by the replacements of that pattern, separated by `|`
//!   and terminated by `~`. Each replacement is a sequence of symbol names
//!   and quoted literals, optionally followed by `:weight`.
//!
//! Characters outside of these constructs are ignored.

use crate::cursor::Cursor;
use lsys_common::errors::*;
use lsys_common::source::{get_source_manager, Source, Span, Spanned};
use lsys_engine::{Axiom, LSystem, Rule, Sym, SymbolTable, Token, Weight, WeightedReplacement};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A parsed grammar.
#[derive(Debug)]
pub struct Grammar {
    /// The symbols declared with `%`.
    pub alphabet: SymbolTable,
    /// The axiom declared with `@...@`.
    pub axiom: Axiom<Sym>,
    /// The rules, in the order their headers appear in the file.
    pub rules: Vec<Rule<Sym>>,
}

impl Grammar {
    /// Find the rule for the pattern symbol with the given name.
    pub fn rule(&self, name: &str) -> Option<&Rule<Sym>> {
        self.rules.iter().find(|r| r.pattern().name() == name)
    }

    /// Turn the grammar into a rewriting system.
    ///
    /// Symbols without a rule have already been reported during parsing, so
    /// the system does not warn about them again.
    pub fn into_system(self) -> DiagResult2<LSystem<Sym>> {
        Ok(LSystem::new(self.axiom, self.rules)?.with_warnings(false))
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn tokens(f: &mut fmt::Formatter, tokens: &[Token<Sym>]) -> fmt::Result {
            for (i, t) in tokens.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                match *t {
                    Token::Symbol(ref s) => write!(f, "{}", s)?,
                    Token::Literal(ref l) => write!(f, "\"{}\"", l)?,
                }
            }
            Ok(())
        }

        let names: Vec<_> = self.alphabet.symbols().map(|s| s.to_string()).collect();
        writeln!(f, "%{}", names.join(", "))?;
        let axiom: Vec<_> = self.axiom.symbols().iter().map(|s| s.to_string()).collect();
        writeln!(f, "@{}@", axiom.join(", "))?;
        for rule in &self.rules {
            write!(f, "${}=", rule.pattern())?;
            match *rule {
                Rule::Leaf(_) => {}
                Rule::Uniform { ref candidates, .. } => {
                    for (i, c) in candidates.iter().enumerate() {
                        write!(f, "{}", if i > 0 { " |\n  " } else { "\n  " })?;
                        tokens(f, c)?;
                    }
                }
                Rule::Weighted(ref w) => {
                    for (i, c) in w.candidates().iter().enumerate() {
                        write!(f, "{}", if i > 0 { " |\n  " } else { "\n  " })?;
                        tokens(f, &c.replacement)?;
                        write!(f, " : {}", c.weight)?;
                    }
                }
            }
            writeln!(f, "~")?;
        }
        Ok(())
    }
}

/// Parse the grammar file at `path`.
pub fn parse_file(path: &str, emitter: &dyn DiagEmitter) -> DiagResult2<Grammar> {
    let source = get_source_manager().open(path)?;
    parse(source, emitter)
}

/// Parse a grammar.
///
/// Hard errors abort the parse and are returned. Warnings are passed to
/// `emitter` as they arise.
pub fn parse(source: Source, emitter: &dyn DiagEmitter) -> DiagResult2<Grammar> {
    debug!("parsing grammar {}", source);
    let mut parser = Parser {
        cur: Cursor::new(source),
        emitter,
        alphabet: None,
        axiom: None,
        patterns: Vec::new(),
        index: HashMap::new(),
        current: None,
    };
    parser.run()?;
    parser.finish()
}

struct Parser<'a> {
    cur: Cursor,
    emitter: &'a dyn DiagEmitter,
    alphabet: Option<Spanned<SymbolTable>>,
    axiom: Option<Spanned<Vec<Spanned<String>>>>,
    /// Patterns in order of appearance.
    patterns: Vec<Pattern>,
    /// Pattern name to position in `patterns`.
    index: HashMap<String, usize>,
    /// The pattern whose header was seen last, awaiting its `=` block.
    current: Option<usize>,
}

struct Pattern {
    name: Spanned<String>,
    cases: Vec<Case>,
}

struct Case {
    items: Vec<Spanned<Item>>,
    weight: Option<Spanned<Weight>>,
    span: Span,
}

impl Case {
    fn is_empty(&self) -> bool {
        self.items.is_empty() && self.weight.is_none()
    }
}

enum Item {
    Literal(String),
    Name(String),
}

/// How a replacement case ended.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum End {
    /// `|`, another case follows.
    Next,
    /// `~`, the block is complete.
    Block,
    /// End of input.
    Eof,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_declaration(c: char) -> bool {
    c == '$' || c == '%' || c == '@'
}

impl<'a> Parser<'a> {
    fn run(&mut self) -> DiagResult2<()> {
        while let Some(c) = self.cur.peek() {
            match c {
                '#' => self.skip_comment(),
                '%' => self.parse_alphabet()?,
                '@' => self.parse_axiom()?,
                '$' => self.parse_header()?,
                '=' => self.parse_block()?,
                _ => {
                    self.cur.bump();
                }
            }
        }
        Ok(())
    }

    fn skip_comment(&mut self) {
        self.cur.skip_while(|c| c != '\n');
    }

    /// Consume characters up to but excluding the first one for which `stop`
    /// holds.
    fn collect_until<F: Fn(char) -> bool>(&mut self, stop: F) -> Vec<(usize, char)> {
        let mut out = Vec::new();
        while let Some(c) = self.cur.peek() {
            if stop(c) {
                break;
            }
            out.push((self.cur.offset(), c));
            self.cur.bump();
        }
        out
    }

    /// Strip surrounding whitespace off a run of characters that covers the
    /// bytes `[lo,hi)`.
    fn trimmed(&self, chars: &[(usize, char)], lo: usize, hi: usize) -> Spanned<String> {
        let first = chars.iter().position(|&(_, c)| !c.is_whitespace());
        let last = chars.iter().rposition(|&(_, c)| !c.is_whitespace());
        match (first, last) {
            (Some(first), Some(last)) => {
                let text: String = chars[first..=last].iter().map(|&(_, c)| c).collect();
                let (end, c) = chars[last];
                let span = Span::new(self.cur.source(), chars[first].0, end + c.len_utf8());
                Spanned::new(text, span)
            }
            _ => Spanned::new(String::new(), Span::new(self.cur.source(), lo, hi)),
        }
    }

    /// Split a comma-separated list of names covering the bytes `[lo,hi)`.
    fn split_names(&self, chars: &[(usize, char)], lo: usize, hi: usize) -> Vec<Spanned<String>> {
        let mut names = Vec::new();
        let mut start = 0;
        let mut part_lo = lo;
        for (i, &(offset, c)) in chars.iter().enumerate() {
            if c == ',' {
                names.push(self.trimmed(&chars[start..i], part_lo, offset));
                start = i + 1;
                part_lo = offset + 1;
            }
        }
        names.push(self.trimmed(&chars[start..], part_lo, hi));
        names
    }

    fn check_name(&self, name: &Spanned<String>, what: &str) -> DiagResult2<()> {
        if name.value.is_empty() {
            return Err(DiagBuilder2::error(format!("expected {} name", what)).span(name.span));
        }
        if !name.value.chars().all(is_name_char) {
            return Err(DiagBuilder2::error(format!(
                "`{}` is not a valid {} name",
                name.value, what
            ))
            .span(name.span)
            .add_note("names consist of letters, digits, and underscores"));
        }
        Ok(())
    }

    /// Parse `%A, B, ...`.
    fn parse_alphabet(&mut self) -> DiagResult2<()> {
        let begin = self.cur.offset();
        self.cur.bump();
        let chars = self.collect_until(|c| c == '#' || c == '~' || is_declaration(c));
        let span = self.cur.span(begin);
        if let Some(ref prev) = self.alphabet {
            return Err(DiagBuilder2::error("alphabet declared more than once")
                .span(span)
                .add_note("previous declaration was here:")
                .span(prev.span));
        }

        let mut table = SymbolTable::new();
        let mut seen: HashMap<String, Span> = HashMap::new();
        for name in self.split_names(&chars, begin + 1, span.end) {
            self.check_name(&name, "symbol")?;
            if table.declare(&name.value).is_none() {
                let mut d = DiagBuilder2::error(format!(
                    "symbol `{}` declared more than once",
                    name.value
                ))
                .span(name.span);
                if let Some(&prev) = seen.get(&name.value) {
                    d = d.add_note("previous declaration was here:").span(prev);
                }
                return Err(d);
            }
            seen.insert(name.value, name.span);
        }
        debug!("alphabet {:?}", table);
        self.alphabet = Some(Spanned::new(table, span));
        Ok(())
    }

    /// Parse `@A, B, ...@`.
    fn parse_axiom(&mut self) -> DiagResult2<()> {
        let begin = self.cur.offset();
        self.cur.bump();
        let chars = self.collect_until(|c| c == '@');
        let end = self.cur.offset();
        if !self.cur.eat('@') {
            return Err(DiagBuilder2::error("unterminated axiom")
                .span(Span::new(self.cur.source(), begin, begin + 1))
                .add_note("an axiom is a list of symbols enclosed in `@`, e.g. `@A, B@`"));
        }
        let span = self.cur.span(begin);
        if let Some(ref prev) = self.axiom {
            return Err(DiagBuilder2::error("axiom declared more than once")
                .span(span)
                .add_note("previous declaration was here:")
                .span(prev.span));
        }
        let names = self.split_names(&chars, begin + 1, end);
        for name in &names {
            self.check_name(name, "symbol")?;
        }
        debug!(
            "axiom {:?}",
            names.iter().map(|n| n.value.as_str()).collect::<Vec<_>>()
        );
        self.axiom = Some(Spanned::new(names, span));
        Ok(())
    }

    /// Parse `$NAME`, up to but excluding the `=`.
    fn parse_header(&mut self) -> DiagResult2<()> {
        let begin = self.cur.offset();
        self.cur.bump();
        let chars = self.collect_until(|c| c == '=');
        if self.cur.is_eof() {
            return Err(DiagBuilder2::error("expected `=` after pattern")
                .span(self.cur.span(begin))
                .add_note("a rule starts with a header such as `$A=`"));
        }
        let name = self.trimmed(&chars, begin + 1, self.cur.offset());
        self.check_name(&name, "pattern")?;

        if let Some(&idx) = self.index.get(&name.value) {
            return Err(DiagBuilder2::error(format!(
                "more than one rule for pattern `{}`",
                name.value
            ))
            .span(name.span)
            .add_note("previous rule was here:")
            .span(self.patterns[idx].name.span));
        }
        if let Some(ref alphabet) = self.alphabet {
            if alphabet.value.get(&name.value).is_none() {
                return Err(unknown("pattern", &name));
            }
        }

        debug!("pattern `{}`", name.value);
        let idx = self.patterns.len();
        self.index.insert(name.value.clone(), idx);
        self.patterns.push(Pattern {
            name,
            cases: Vec::new(),
        });
        self.current = Some(idx);
        Ok(())
    }

    /// Parse `= case | case | ... ~`.
    fn parse_block(&mut self) -> DiagResult2<()> {
        let begin = self.cur.offset();
        self.cur.bump();
        let idx = match self.current.take() {
            Some(idx) => idx,
            None => {
                return Err(DiagBuilder2::error("replacements without a pattern")
                    .span(self.cur.span(begin))
                    .add_note("replacements must follow a header such as `$A=`"))
            }
        };
        let name = self.patterns[idx].name.value.clone();

        let mut cases = Vec::new();
        loop {
            let (case, end) = self.parse_case(&name)?;
            if end == End::Eof {
                self.emitter.emit(
                    DiagBuilder2::warning(format!(
                        "replacements of `{}` are not terminated by `~`",
                        name
                    ))
                    .span(Span::new(self.cur.source(), begin, begin + 1)),
                );
            }
            if end != End::Next {
                // A lone empty case is the `=~` form and declares no
                // candidates at all.
                if !(cases.is_empty() && case.is_empty()) {
                    cases.push(case);
                }
                break;
            }
            cases.push(case);
        }
        debug!("pattern `{}`: {} replacement(s)", name, cases.len());
        self.patterns[idx].cases = cases;
        Ok(())
    }

    /// Parse one replacement case, including its terminator.
    fn parse_case(&mut self, pattern: &str) -> DiagResult2<(Case, End)> {
        let begin = self.cur.offset();
        let mut items = Vec::new();
        let mut weight = None;
        let (end, at) = loop {
            let at = self.cur.offset();
            let c = match self.cur.peek() {
                Some(c) => c,
                None => break (End::Eof, at),
            };
            match c {
                '|' => {
                    self.cur.bump();
                    break (End::Next, at);
                }
                '~' => {
                    self.cur.bump();
                    break (End::Block, at);
                }
                '#' => self.skip_comment(),
                ':' => {
                    self.cur.bump();
                    weight = Some(self.parse_weight()?);
                    self.discard_rest();
                }
                '"' => items.push(self.parse_literal()?),
                c if is_declaration(c) => {
                    return Err(DiagBuilder2::error(format!(
                        "replacements of `{}` are not terminated by `~`",
                        pattern
                    ))
                    .span(Span::new(self.cur.source(), at, at + 1))
                    .add_note("end the replacements with `~` before the next declaration"))
                }
                c if is_name_char(c) => items.push(self.parse_name()),
                _ => {
                    self.cur.bump();
                }
            }
        };
        let case = Case {
            items,
            weight,
            span: Span::new(self.cur.source(), begin, at),
        };
        Ok((case, end))
    }

    /// Parse the digits of a weight after the `:`.
    fn parse_weight(&mut self) -> DiagResult2<Spanned<Weight>> {
        self.cur.skip_while(char::is_whitespace);
        let begin = self.cur.offset();
        let mut text = String::new();
        let mut dot = false;
        while let Some(c) = self.cur.peek() {
            if c.is_ascii_digit() || (c == '.' && !dot) {
                dot |= c == '.';
                text.push(c);
                self.cur.bump();
            } else {
                break;
            }
        }
        let span = self.cur.span(begin);
        let weight = if dot {
            text.parse::<f64>().ok().map(Weight::Probability)
        } else {
            text.parse::<u32>().ok().map(Weight::Proportion)
        };
        match weight {
            Some(w) => Ok(Spanned::new(w, span)),
            None if text.is_empty() || text == "." => {
                Err(DiagBuilder2::error("expected a weight after `:`")
                    .span(span)
                    .add_note("weights are numbers such as `3` or `0.25`"))
            }
            None => Err(DiagBuilder2::error(format!("weight `{}` is out of range", text)).span(span)),
        }
    }

    /// Skip the remainder of a weighted case up to its terminator.
    fn discard_rest(&mut self) {
        let mut noise: Option<Span> = None;
        while let Some(c) = self.cur.peek() {
            if c == '|' || c == '~' || is_declaration(c) {
                break;
            }
            if c == '#' {
                self.skip_comment();
                continue;
            }
            let at = self.cur.offset();
            self.cur.bump();
            if !c.is_whitespace() {
                let sp = Span::new(self.cur.source(), at, self.cur.offset());
                noise = Some(match noise {
                    Some(n) => Span::union(n, sp),
                    None => sp,
                });
            }
        }
        if let Some(sp) = noise {
            self.emitter.emit(
                DiagBuilder2::warning("ignoring characters after weight")
                    .span(sp)
                    .add_note("the weight must be the last element of a replacement"),
            );
        }
    }

    /// Parse `"..."`.
    fn parse_literal(&mut self) -> DiagResult2<Spanned<Item>> {
        let begin = self.cur.offset();
        self.cur.bump();
        let mut text = String::new();
        loop {
            match self.cur.bump() {
                Some('"') => break,
                Some(c) => text.push(c),
                None => {
                    return Err(DiagBuilder2::error("unterminated literal")
                        .span(Span::new(self.cur.source(), begin, begin + 1))
                        .add_note("literals are enclosed in double quotes, e.g. `\"text\"`"))
                }
            }
        }
        Ok(Spanned::new(Item::Literal(text), self.cur.span(begin)))
    }

    /// Parse a run of name characters.
    fn parse_name(&mut self) -> Spanned<Item> {
        let begin = self.cur.offset();
        let mut text = String::new();
        while let Some(c) = self.cur.peek() {
            if !is_name_char(c) {
                break;
            }
            text.push(c);
            self.cur.bump();
        }
        Spanned::new(Item::Name(text), self.cur.span(begin))
    }

    /// Resolve all names and assemble the grammar.
    fn finish(self) -> DiagResult2<Grammar> {
        let emitter = self.emitter;
        let alphabet = match self.alphabet {
            Some(a) => a,
            None => {
                return Err(DiagBuilder2::error("no alphabet declared")
                    .add_note("declare the symbols of the grammar with `%A, B, ...`"))
            }
        };
        let axiom = match self.axiom {
            Some(a) => a,
            None => {
                return Err(DiagBuilder2::error("no axiom declared")
                    .add_note("declare the initial symbols with `@A, B, ...@`"))
            }
        };
        let table = alphabet.value;

        let axiom = Axiom::new(
            axiom
                .value
                .iter()
                .map(|n| resolve(&table, n, "symbol"))
                .collect::<DiagResult2<Vec<_>>>()?,
        );

        let mut covered = HashSet::new();
        let mut rules = Vec::with_capacity(self.patterns.len());
        for pattern in self.patterns {
            let sym = resolve(&table, &pattern.name, "pattern")?;
            covered.insert(sym.clone());
            rules.push(build_rule(&table, sym, pattern)?);
        }

        let terminal: Vec<_> = table
            .symbols()
            .filter(|s| !covered.contains(s))
            .map(|s| format!("`{}`", s))
            .collect();
        if !terminal.is_empty() {
            emitter.emit(
                DiagBuilder2::warning(format!(
                    "no rule for {}; treated as terminal",
                    terminal.join(", ")
                ))
                .span(alphabet.span),
            );
        }

        Ok(Grammar {
            alphabet: table,
            axiom,
            rules,
        })
    }
}

fn unknown(what: &str, name: &Spanned<String>) -> DiagBuilder2 {
    DiagBuilder2::error(format!("unknown {} `{}`", what, name.value))
        .span(name.span)
        .add_note("all symbols must be declared in the alphabet")
}

fn resolve(table: &SymbolTable, name: &Spanned<String>, what: &str) -> DiagResult2<Sym> {
    table.get(&name.value).ok_or_else(|| unknown(what, name))
}

fn build_rule(table: &SymbolTable, sym: Sym, pattern: Pattern) -> DiagResult2<Rule<Sym>> {
    if pattern.cases.is_empty() {
        return Ok(Rule::leaf(sym));
    }

    let weighted = pattern.cases[0].weight.is_some();
    if let Some(odd) = pattern
        .cases
        .iter()
        .find(|c| c.weight.is_some() != weighted)
    {
        return Err(DiagBuilder2::error(format!(
            "rule for `{}` mixes weighted and unweighted replacements",
            sym
        ))
        .span(odd.span)
        .add_note("either give every replacement a `:weight`, or none of them"));
    }

    let name_span = pattern.name.span;
    let mut candidates = Vec::with_capacity(pattern.cases.len());
    let mut weights = Vec::with_capacity(pattern.cases.len());
    for case in pattern.cases {
        let mut tokens = Vec::with_capacity(case.items.len());
        for item in case.items {
            tokens.push(match item.value {
                Item::Literal(text) => Token::literal(text),
                Item::Name(name) => {
                    Token::Symbol(resolve(table, &Spanned::new(name, item.span), "symbol")?)
                }
            });
        }
        candidates.push(tokens);
        weights.push(case.weight);
    }

    if weighted {
        let candidates = candidates
            .into_iter()
            .zip(weights)
            .filter_map(|(c, w)| w.map(|w| WeightedReplacement::new(c, w.value)))
            .collect();
        Rule::weighted(sym, candidates).map_err(|d| d.span(name_span))
    } else {
        Ok(Rule::new(sym, candidates))
    }
}
