use std::fmt;

use crate::{
    analyzer,
    ast::Malformed,
    emit, reader,
    util::fmt::{Context, Diagnostic},
};

impl Diagnostic for Malformed {
    fn describe(&self, f: &mut fmt::Formatter<'_>, _: &Context<'_>) -> fmt::Result {
        let Malformed {
            kind,
            expected,
            actual,
        } = self;
        write!(
            f,
            "malformed {kind} node: expected {expected} children, but got {actual}"
        )
    }
}

impl Diagnostic for analyzer::Error {
    fn describe(&self, f: &mut fmt::Formatter<'_>, ctx: &Context<'_>) -> fmt::Result {
        let i = ctx.ident_interner;

        use analyzer::Error::*;
        match self {
            Malformed(malformed) => malformed.describe(f, ctx),
            NotADeclaration { kind } => write!(f, "expected a declaration, but got {kind}"),
            NotAType { kind } => write!(f, "expected a type, but got {kind}"),
            UndeclaredType { name } => {
                let name = i.get(name);
                write!(f, "struct {name} is not declared")
            }
            DuplicateDeclaration { name, previous } => {
                let name = i.get(name);
                write!(f, "{name} already declared at {previous}")
            }
        }
    }
}

impl Diagnostic for emit::Error {
    fn describe(&self, f: &mut fmt::Formatter<'_>, ctx: &Context<'_>) -> fmt::Result {
        let i = ctx.ident_interner;

        use emit::Error::*;
        match self {
            Malformed(malformed) => malformed.describe(f, ctx),
            NotADeclaration { kind } => write!(f, "expected a declaration, but got {kind}"),
            NotAType { kind } => write!(f, "expected a type, but got {kind}"),
            NotAnExpression { kind } => write!(f, "expected an expression, but got {kind}"),
            UnresolvedFieldOwner { field } => {
                let field = i.get(field);
                write!(f, "can't tell which struct field {field} belongs to")
            }
        }
    }
}

impl Diagnostic for reader::Error {
    fn describe(&self, f: &mut fmt::Formatter<'_>, _: &Context<'_>) -> fmt::Result {
        use reader::Error::*;
        match self {
            EmptyInput => write!(f, "empty tree"),
            MultipleRoots => write!(f, "tree has more than one root"),
            BadIndentation { indent } => write!(f, "unexpected indentation of {indent} spaces"),
            UnknownKind(kind) => write!(f, "unknown node kind {kind:?}"),
            BadLocation(text) => write!(f, "expected a location such as 0.1.2, but got {text:?}"),
        }
    }
}
