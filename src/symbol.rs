use std::{fmt, rc::Rc};

use indexmap::IndexMap;

use crate::{
    token::Location,
    util::{
        fmt::{Context, Show},
        intern::Interned,
    },
};

bitflags::bitflags! {
    /// Classification flags attached to a declaration. Flags only accumulate.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Attr: u32 {
        const VOID = 1 << 0;
        const INT = 1 << 1;
        const NULL = 1 << 2;
        const STRING = 1 << 3;
        const STRUCT = 1 << 4;
        const ARRAY = 1 << 5;
        const FUNCTION = 1 << 6;
        const VARIABLE = 1 << 7;
        const FIELD = 1 << 8;
        const TYPEID = 1 << 9;
        const PARAM = 1 << 10;
        const LOCAL = 1 << 11;
        /// Assignable, held in memory.
        const LVAL = 1 << 12;
        const CONST = 1 << 13;
        /// Held in a virtual register.
        const VREG = 1 << 14;
        /// Has an address.
        const VADDR = 1 << 15;
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Symbol {
    pub attributes: Attr,
    /// Position among the parameters, locals of a block, or fields of a
    /// struct. Zero for global names.
    pub sequence: usize,
    /// Name of the struct type, if [`Attr::STRUCT`] is set.
    pub type_name: Option<Interned<str>>,
    /// Present on struct names once the struct body has been analyzed.
    pub fields: Option<Rc<SymbolTable>>,
    /// Present on function names once the function has been analyzed.
    pub parameters: Option<Rc<[Symbol]>>,
}

impl Symbol {
    pub fn set(&mut self, attributes: Attr) {
        self.attributes |= attributes;
    }

    pub fn has(&self, attributes: Attr) -> bool {
        self.attributes.contains(attributes)
    }

    pub fn set_struct(&mut self, name: Interned<str>) {
        self.set(Attr::STRUCT);
        self.type_name = Some(name);
    }
}

const TYPE_WORDS: &[(Attr, &str)] = &[
    (Attr::VOID, "void"),
    (Attr::INT, "int"),
    (Attr::STRING, "string"),
    (Attr::NULL, "null"),
    (Attr::ARRAY, "array"),
];

const ROLE_WORDS: &[(Attr, &str)] = &[
    (Attr::FUNCTION, "function"),
    (Attr::VARIABLE, "variable"),
    (Attr::TYPEID, "typeid"),
];

const STORAGE_WORDS: &[(Attr, &str)] = &[
    (Attr::LVAL, "lval"),
    (Attr::VADDR, "vaddr"),
    (Attr::VREG, "vreg"),
    (Attr::CONST, "const"),
];

/// Writes the attribute words of a symbol, each preceded by a space.
impl Show for Symbol {
    fn show(&self, f: &mut fmt::Formatter<'_>, ctx: &Context<'_>) -> fmt::Result {
        let words = |f: &mut fmt::Formatter<'_>, table: &[(Attr, &str)]| {
            table
                .iter()
                .filter(|(attr, _)| self.has(*attr))
                .try_for_each(|(_, word)| write!(f, " {word}"))
        };

        words(f, TYPE_WORDS)?;
        if self.has(Attr::STRUCT) {
            write!(f, " struct")?;
            if let Some(name) = self.type_name {
                write!(f, " {}", ctx.ident_interner.get(name))?;
            }
        }
        words(f, ROLE_WORDS)?;
        words(f, STORAGE_WORDS)?;
        if self.has(Attr::PARAM) {
            write!(f, " param {}", self.sequence)?;
        }
        if self.has(Attr::LOCAL) {
            write!(f, " local {}", self.sequence)?;
        }
        Ok(())
    }
}

/// Maps identifiers of one scope to their symbols. Iteration follows
/// insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SymbolTable {
    map: IndexMap<Interned<str>, Entry>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// Declaration site.
    pub loc: Location,
    pub symbol: Symbol,
}

impl SymbolTable {
    pub fn with_capacity(capacity: usize) -> SymbolTable {
        SymbolTable {
            map: IndexMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, name: Interned<str>) -> bool {
        self.map.contains_key(&name)
    }

    pub fn get(&self, name: Interned<str>) -> Option<&Entry> {
        self.map.get(&name)
    }

    pub fn get_mut(&mut self, name: Interned<str>) -> Option<&mut Entry> {
        self.map.get_mut(&name)
    }

    /// Attempts to declare the provided name.
    ///
    /// Fails with the previous declaration site if the name is already
    /// declared in this scope, in which case the table is left untouched.
    pub fn insert(
        &mut self,
        name: Interned<str>,
        loc: Location,
        symbol: Symbol,
    ) -> Result<(), Location> {
        if let Some(previous) = self.map.get(&name) {
            return Err(previous.loc);
        }
        self.map.insert(name, Entry { loc, symbol });
        Ok(())
    }

    /// Declares the provided name, shadowing any previous declaration in this
    /// scope.
    pub fn shadow(&mut self, name: Interned<str>, loc: Location, symbol: Symbol) {
        self.map.insert(name, Entry { loc, symbol });
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (Interned<str>, &Entry)> {
        self.map.iter().map(|(name, entry)| (*name, entry))
    }
}
