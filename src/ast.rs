// The syntax tree, as handed over by the parser:
//
// root      ::= (struct | function | vardecl)*
// struct    ::= TYPEID FIELDLIST(decl*)
// function  ::= decl PARAMLIST(decl*) BLOCK(stmt*)
// decl      ::= <type>(IDENT) | ARRAY(<type>, IDENT)
// type      ::= VOID | INT | STRING | NULL | TYPEID
// vardecl   ::= VARDECL(decl [expr])
// stmt      ::= BLOCK(stmt*) | vardecl | WHILE(expr stmt) | IF(expr stmt [stmt])
//             | RETURN([expr]) | expr
// expr      ::= <binop>(expr expr) | <unop>(expr) | NEW(TYPEID) | NEWSTRING(expr)
//             | NEWARRAY(<type> expr) | NEWPTRARRAY(<type> expr)
//             | CALL(IDENT expr*) | INDEX(expr expr) | DOT(expr FIELD)
//             | IDENT | INTCON | CHARCON | STRINGCON | NULL

use std::fmt;

use crate::{
    symbol::Symbol,
    token::{Located, Location, TokenKind},
    util::intern::Interned,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: TokenKind,
    pub loc: Location,
    pub text: Interned<str>,
    pub children: Vec<Node>,
    /// Semantic data, filled in by the analyzer.
    pub symbol: Symbol,
}

impl Node {
    pub fn new(kind: TokenKind, loc: Location, text: Interned<str>) -> Node {
        Node {
            kind,
            loc,
            text,
            children: Vec::new(),
            symbol: Symbol::default(),
        }
    }

    /// Appends the provided children, returning the node.
    #[must_use]
    pub fn adopt(mut self, children: impl IntoIterator<Item = Node>) -> Node {
        self.children.extend(children);
        self
    }

    /// Checks whether the amount of children of this node is within the
    /// provided bounds.
    pub fn check_arity(&self, expected: Arity) -> Result<(), Located<Malformed>> {
        let actual = self.children.len();
        if expected.admits(actual) {
            Ok(())
        } else {
            Err(self.loc.wrap(Malformed {
                kind: self.kind,
                expected,
                actual,
            }))
        }
    }

    /// For a declaration (`int x`, `node x`, `int[] x`), returns the node of
    /// the declared identifier.
    pub fn declared(&self) -> Option<&Node> {
        match self.kind {
            TokenKind::Array => self.children.get(1),
            kind if kind.is_type() => self.children.first(),
            _ => None,
        }
    }

    pub fn declared_mut(&mut self) -> Option<&mut Node> {
        match self.kind {
            TokenKind::Array => self.children.get_mut(1),
            kind if kind.is_type() => self.children.first_mut(),
            _ => None,
        }
    }

    /// For a declaration, returns the node naming its (element) type.
    pub fn type_node(&self) -> &Node {
        match self.kind {
            TokenKind::Array => self.children.first().unwrap_or(self),
            _ => self,
        }
    }

    /// Visits this node and every descendant, in pre-order.
    pub fn walk<'n>(&'n self, f: &mut impl FnMut(&'n Node)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }
}

/// The amount of children a node kind admits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub const fn admits(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::Between(lo, hi) => lo <= count && count <= hi,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{n}"),
            Arity::Between(lo, hi) => write!(f, "{lo} to {hi}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// A node whose amount of children doesn't fit its kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Malformed {
    pub kind: TokenKind,
    pub expected: Arity,
    pub actual: usize,
}


#[cfg(test)]
mod tests {
    use super::{test_utils::Builder, *};
    use crate::util::intern::Interner;

    #[test]
    fn declared_identifier_of_each_declaration_form() {
        let i = &mut Interner::with_capacity(8);
        let mut b = Builder::new(i);

        let scalar = b.decl(TokenKind::Int, "int", "x");
        assert_eq!(scalar.declared().map(|n| n.kind), Some(TokenKind::Ident));
        assert_eq!(scalar.type_node().kind, TokenKind::Int);

        let elem = b.node(TokenKind::TypeId, "node");
        let name = b.node(TokenKind::Ident, "xs");
        let array = b.node(TokenKind::Array, "[]").adopt([elem, name]);
        assert_eq!(array.declared().map(|n| n.loc.linenr), Some(4));
        assert_eq!(array.type_node().kind, TokenKind::TypeId);

        let stmt = b.node(TokenKind::Return, "return");
        assert!(stmt.declared().is_none());
    }

    #[test]
    fn arity_checks() {
        let i = &mut Interner::with_capacity(4);
        let mut b = Builder::new(i);
        let lhs = b.node(TokenKind::Ident, "a");
        let add = b.node(TokenKind::Plus, "+").adopt([lhs]);

        assert!(add.check_arity(Arity::Between(1, 2)).is_ok());
        let error = add.check_arity(Arity::Exactly(2)).unwrap_err();
        assert_eq!(error.loc.linenr, 2);
        assert_eq!(
            error.inner,
            Malformed {
                kind: TokenKind::Plus,
                expected: Arity::Exactly(2),
                actual: 1,
            }
        );
        assert!(Arity::AtLeast(1).admits(4));
        assert!(!Arity::AtLeast(1).admits(0));
    }
}
