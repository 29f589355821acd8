//! String interning for identifiers.
//!
//! [`Symbol`] is a 4-byte handle into a process-wide [`Interner`]. Every
//! identifier seen by the lexer is interned once; afterwards symbols compare
//! by index rather than by string content, which is what makes repeated
//! symbol-table lookups and AST comparisons cheap.

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::{OnceLock, RwLock};

/// A compact, interned handle for an identifier string.
///
/// Two symbols compare equal iff they were interned from equal strings.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// Intern `text`, returning the symbol for it. Repeated calls with the
    /// same string return the same symbol.
    pub fn intern(text: &str) -> Self {
        Interner::global().intern(text)
    }

    /// Look up the original string for this symbol.
    pub fn as_str(self) -> &'static str {
        Interner::global().resolve(self)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Process-wide string table.
///
/// Strings are never removed: a compiler invocation interns a bounded set of
/// identifiers (the source text) and exits, so leaking the backing
/// allocations is simpler than tracking their lifetime and is what the rest
/// of this pipeline relies on when it hands out `&'static str`.
struct Interner {
    table: RwLock<InternerTable>,
}

struct InternerTable {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

impl Interner {
    fn global() -> &'static Interner {
        static INTERNER: OnceLock<Interner> = OnceLock::new();
        INTERNER.get_or_init(|| Interner {
            table: RwLock::new(InternerTable {
                map: FxHashMap::default(),
                strings: Vec::new(),
            }),
        })
    }

    fn intern(&self, text: &str) -> Symbol {
        if let Some(&index) = self.table.read().unwrap().map.get(text) {
            return Symbol(index);
        }
        let mut table = self.table.write().unwrap();
        if let Some(&index) = table.map.get(text) {
            return Symbol(index);
        }
        let leaked: &'static str = Box::leak(text.to_string().into_boxed_str());
        let index = table.strings.len() as u32;
        table.strings.push(leaked);
        table.map.insert(leaked, index);
        Symbol(index)
    }

    fn resolve(&self, symbol: Symbol) -> &'static str {
        self.table.read().unwrap().strings[symbol.0 as usize]
    }
}
