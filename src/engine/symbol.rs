// Copyright (c) 2016-2021 Fabian Schuiki

//! Symbols and the alphabets they are drawn from.
//!
//! The engine only ever compares symbols, hashes them, and renders them as
//! text. Anything that can do these three things is a [`Symbol`]. Two kinds of
//! alphabet are provided:
//!
//! - closed enumerations declared with [`alphabet!`], and
//! - runtime [`SymbolTable`]s, which hand out lightweight [`Sym`] handles.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// An opaque value from a closed set of symbols.
///
/// The `Display` implementation provides the canonical short text of the
/// symbol, which is what ends up in realized output.
pub trait Symbol: Clone + Eq + Hash + fmt::Debug + fmt::Display {}

impl<T> Symbol for T where T: Clone + Eq + Hash + fmt::Debug + fmt::Display {}

/// A closed set of symbols whose members can be looked up by name.
pub trait Alphabet {
    type Symbol: Symbol;

    /// Find the symbol with the given name.
    fn lookup(&self, name: &str) -> Option<Self::Symbol>;
}

/// A symbol type that enumerates all of its members. Implemented by the
/// enums declared with [`alphabet!`].
pub trait NamedSymbol: Symbol + Sized + 'static {
    /// All symbols of the alphabet, in declaration order.
    const ALL: &'static [Self];

    /// The name of the symbol, as opposed to its rendered text.
    fn name(&self) -> &'static str;

    /// Find a symbol by name.
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().find(|s| s.name() == name).cloned()
    }
}

/// The [`Alphabet`] formed by all members of a [`NamedSymbol`] enum.
pub struct EnumAlphabet<S>(PhantomData<S>);

impl<S: NamedSymbol> EnumAlphabet<S> {
    pub fn new() -> Self {
        EnumAlphabet(PhantomData)
    }
}

impl<S: NamedSymbol> Default for EnumAlphabet<S> {
    fn default() -> Self {
        EnumAlphabet::new()
    }
}

impl<S: NamedSymbol> Alphabet for EnumAlphabet<S> {
    type Symbol = S;

    fn lookup(&self, name: &str) -> Option<S> {
        S::from_name(name)
    }
}

/// Declare a closed alphabet as an enum.
///
/// Each variant is given the text it renders as. The variant identifier is
/// its name for lookups through [`NamedSymbol::from_name`].
///
/// ```ignore
/// alphabet! {
///     pub enum Plant {
///         Fwd = "F",
///         Left = "+",
///         Right = "-",
///     }
/// }
/// ```
#[macro_export]
macro_rules! alphabet {
    (
        $(#[$attr:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident = $text:expr),* $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        $vis enum $name {
            $($variant),*
        }

        impl $crate::symbol::NamedSymbol for $name {
            const ALL: &'static [Self] = &[$($name::$variant),*];

            fn name(&self) -> &'static str {
                match *self {
                    $($name::$variant => stringify!($variant)),*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                f.write_str(match *self {
                    $($name::$variant => $text),*
                })
            }
        }
    };
}

static NEXT_TABLE_ID: AtomicU32 = AtomicU32::new(1);

/// A runtime alphabet. Interns symbol names and hands out [`Sym`] handles.
///
/// Every table carries a unique id, such that symbols of two different tables
/// never compare equal, even if they share a name.
#[derive(Clone)]
pub struct SymbolTable {
    id: u32,
    names: Vec<Arc<str>>,
    map: HashMap<Arc<str>, u32>,
}

impl SymbolTable {
    /// Create a new empty symbol table.
    pub fn new() -> SymbolTable {
        SymbolTable {
            id: NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed),
            names: Vec::new(),
            map: HashMap::new(),
        }
    }

    /// Add a symbol to the table. Returns `None` if a symbol with that name
    /// already exists.
    pub fn declare(&mut self, name: &str) -> Option<Sym> {
        if self.map.contains_key(name) {
            return None;
        }
        let index = self.names.len() as u32;
        let name: Arc<str> = Arc::from(name);
        self.names.push(name.clone());
        self.map.insert(name.clone(), index);
        Some(Sym {
            table: self.id,
            index,
            name,
        })
    }

    /// Find a symbol by name.
    pub fn get(&self, name: &str) -> Option<Sym> {
        self.map.get(name).map(|&index| self.sym(index))
    }

    /// Iterate over all symbols in declaration order.
    pub fn symbols<'a>(&'a self) -> impl Iterator<Item = Sym> + 'a {
        (0..self.names.len() as u32).map(move |index| self.sym(index))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn sym(&self, index: u32) -> Sym {
        Sym {
            table: self.id,
            index,
            name: self.names[index as usize].clone(),
        }
    }
}

impl Default for SymbolTable {
    fn default() -> SymbolTable {
        SymbolTable::new()
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.names.iter()).finish()
    }
}

impl Alphabet for SymbolTable {
    type Symbol = Sym;

    fn lookup(&self, name: &str) -> Option<Sym> {
        self.get(name)
    }
}

impl<'a> Alphabet for &'a SymbolTable {
    type Symbol = Sym;

    fn lookup(&self, name: &str) -> Option<Sym> {
        self.get(name)
    }
}

/// A symbol handed out by a [`SymbolTable`]. Renders as its name.
#[derive(Clone)]
pub struct Sym {
    table: u32,
    index: u32,
    name: Arc<str>,
}

impl Sym {
    /// The name the symbol was declared with.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Sym {
    fn eq(&self, other: &Sym) -> bool {
        self.table == other.table && self.index == other.index
    }
}

impl Eq for Sym {}

impl Hash for Sym {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table.hash(state);
        self.index.hash(state);
    }
}

impl fmt::Debug for Sym {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({})", self.name, self.index)
    }
}

impl fmt::Display for Sym {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    alphabet! {
        enum Abc {
            A = "a",
            B = "b",
            Long = "xyz",
        }
    }

    #[test]
    fn enum_alphabet_renders_text() {
        assert_eq!(Abc::A.to_string(), "a");
        assert_eq!(Abc::Long.to_string(), "xyz");
        assert_eq!(Abc::ALL, &[Abc::A, Abc::B, Abc::Long]);
    }

    #[test]
    fn enum_alphabet_lookup_by_name() {
        let alpha = EnumAlphabet::<Abc>::new();
        assert_eq!(alpha.lookup("Long"), Some(Abc::Long));
        assert_eq!(alpha.lookup("xyz"), None);
        assert_eq!(Abc::B.name(), "B");
    }

    #[test]
    fn table_declare_and_get() {
        let mut tbl = SymbolTable::new();
        let a = tbl.declare("A").unwrap();
        let b = tbl.declare("B").unwrap();
        assert!(tbl.declare("A").is_none());
        assert_eq!(tbl.get("A"), Some(a.clone()));
        assert_eq!(tbl.get("C"), None);
        assert_ne!(a, b);
        assert_eq!(tbl.len(), 2);
        let all: Vec<_> = tbl.symbols().map(|s| s.to_string()).collect();
        assert_eq!(all, vec!["A", "B"]);
    }

    #[test]
    fn symbols_of_different_tables_differ() {
        let mut t1 = SymbolTable::new();
        let mut t2 = SymbolTable::new();
        let a1 = t1.declare("A").unwrap();
        let a2 = t2.declare("A").unwrap();
        assert_eq!(a1.name(), a2.name());
        assert_ne!(a1, a2);
    }
}
