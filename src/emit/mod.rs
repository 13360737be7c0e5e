//! Lowers an analyzed tree into C-like intermediate code.
//!
//! The translation unit is laid out in sections: the runtime include, struct
//! layouts, the string constant pool, global variables and functions. Names
//! are mangled so that user identifiers never collide with each other or with
//! generated temporaries.

use std::{
    collections::{HashMap, HashSet},
    fmt::{self, Write},
    format_args as f,
};

use tracing::debug;

use crate::{
    analyzer::Analysis,
    ast::{Arity, Malformed, Node},
    token::{Located, TokenKind},
    util::intern::{Interned, Interner},
};

mod expr;
mod stmt;

#[cfg(test)]
mod tests;

type Result<T, E = Located<Error>> = std::result::Result<T, E>;

pub type EmitResult = std::result::Result<String, (String, Vec<Located<Error>>)>;

const DEFAULT_CODE_CAPACITY: usize = 4 * 1024; // 4 KiB
const INDENT: &str = "        ";
const PREAMBLE: &str = "#include \"oclib.h\"";

pub struct Emitter<'a> {
    idents: &'a Interner<str>,
    analysis: &'a Analysis,
    code: String,
    indented: bool,
    /// Global variables, which keep their source names.
    globals: HashSet<Interned<str>>,
    /// Mangled names of the current function's parameters.
    params: HashMap<Interned<str>, String>,
    /// Mangled names of the current function's locals declared so far.
    locals: HashMap<Interned<str>, String>,
    /// Struct type of struct-typed globals.
    global_types: HashMap<Interned<str>, Interned<str>>,
    /// Struct type of the current function's struct-typed parameters and
    /// locals.
    local_types: HashMap<Interned<str>, Interned<str>>,
    next_string: usize,
    next_branch: usize,
    errors: Vec<Located<Error>>,
}

impl<'a> Emitter<'a> {
    pub fn new(idents: &'a Interner<str>, analysis: &'a Analysis) -> Emitter<'a> {
        Emitter {
            idents,
            analysis,
            code: String::with_capacity(DEFAULT_CODE_CAPACITY),
            indented: false,
            globals: HashSet::new(),
            params: HashMap::new(),
            locals: HashMap::new(),
            global_types: HashMap::new(),
            local_types: HashMap::new(),
            next_string: 1,
            next_branch: 1,
            errors: Vec::with_capacity(8),
        }
    }

    pub fn emit(mut self, root: &Node) -> EmitResult {
        debug!(declarations = root.children.len(), "emitting tree");
        self.out(f!("{PREAMBLE}"));
        self.out_line();

        for node in by_kind(root, TokenKind::Struct) {
            self.emit_struct(node);
        }
        self.emit_string_pool();
        self.emit_globals(root);
        for node in by_kind(root, TokenKind::Function) {
            self.emit_function(node);
        }

        if self.errors.is_empty() {
            Ok(self.code)
        } else {
            debug!(errors = self.errors.len(), "emission failed");
            Err((self.code, self.errors))
        }
    }

    fn emit_struct(&mut self, node: &Node) {
        if let Err(error) = node.check_arity(Arity::Exactly(2)) {
            return self.error(error.into());
        }
        let idents = self.idents;
        let name = idents.get(node.children[0].text);
        self.out(f!("struct {name} {{"));
        self.indented(|this| {
            for decl in &node.children[1].children {
                match this.lower_decl(decl) {
                    Ok(Decl { ty, name: field, .. }) => {
                        let field = idents.get(field);
                        this.out(f!("{ty} {name}_{field};"));
                    }
                    Err(error) => this.error(error),
                }
            }
        });
        self.out(f!("}};"));
        self.out_line();
    }

    fn emit_string_pool(&mut self) {
        let (idents, analysis) = (self.idents, self.analysis);
        let strings = &analysis.strings;
        for (index, text) in strings.iter().enumerate() {
            let text = idents.get(text);
            self.out(f!("char* s{} = {text};", index + 1));
        }
        if !strings.is_empty() {
            self.out_line();
        }
    }

    /// Emits the declarations of global variables. Their initializers are not
    /// emitted.
    fn emit_globals(&mut self, root: &Node) {
        let idents = self.idents;
        let mut any = false;
        for stmt in by_kind(root, TokenKind::VarDecl) {
            let Some(decl) = stmt.children.first() else {
                continue;
            };
            match self.lower_decl(decl) {
                Ok(Decl {
                    ty,
                    name,
                    struct_type,
                }) => {
                    self.out(f!("{ty} {};", idents.get(name)));
                    self.globals.insert(name);
                    if let Some(struct_type) = struct_type {
                        self.global_types.insert(name, struct_type);
                    }
                    any = true;
                }
                Err(error) => self.error(error),
            }
        }
        if any {
            self.out_line();
        }
    }

    /// Lowers a declaration into its target type and declared name.
    fn lower_decl(&self, decl: &Node) -> Result<Decl> {
        let (ty, array) = match decl.kind {
            TokenKind::Array => {
                decl.check_arity(Arity::Exactly(2))?;
                (&decl.children[0], true)
            }
            _ => (decl, false),
        };
        let name = match decl.declared() {
            Some(ident) if ident.kind == TokenKind::Ident => ident.text,
            _ => return Err(decl.loc.wrap(Error::NotADeclaration { kind: decl.kind })),
        };

        let mut struct_type = None;
        let mut lowered = match ty.kind {
            TokenKind::Int => "int".to_owned(),
            TokenKind::Void => "void".to_owned(),
            TokenKind::String => "char*".to_owned(),
            TokenKind::TypeId => {
                struct_type = Some(ty.text);
                format!("struct {}*", self.idents.get(ty.text))
            }
            kind => return Err(ty.loc.wrap(Error::NotAType { kind })),
        };
        if array {
            lowered.push('*');
        }
        Ok(Decl {
            ty: lowered,
            name,
            struct_type,
        })
    }
}

/// A lowered declaration.
struct Decl {
    ty: String,
    name: Interned<str>,
    /// Set for struct-typed declarations, arrays included.
    struct_type: Option<Interned<str>>,
}

fn by_kind(root: &Node, kind: TokenKind) -> impl Iterator<Item = &Node> {
    root.children.iter().filter(move |node| node.kind == kind)
}

// Utility functions.
impl Emitter<'_> {
    /// Writes a line, indented if inside [`Emitter::indented`].
    fn out(&mut self, f: fmt::Arguments<'_>) {
        if self.indented {
            self.code.push_str(INDENT);
        }
        self.write(f);
        self.code.push('\n');
    }

    fn out_line(&mut self) {
        self.code.push('\n');
    }

    /// Writes a label, which is never indented.
    fn label(&mut self, name: &str, suffix: impl fmt::Display) {
        self.write(f!("{name}{suffix}:;\n"));
    }

    fn indented(&mut self, f: impl FnOnce(&mut Self)) {
        let previous = self.indented;
        self.indented = true;
        f(self);
        self.indented = previous;
    }

    fn write(&mut self, f: fmt::Arguments<'_>) {
        self.code
            .write_fmt(f)
            .expect("code emit should be infallible");
    }

    fn error(&mut self, error: Located<Error>) {
        self.errors.push(error);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Malformed(Malformed),
    NotADeclaration { kind: TokenKind },
    NotAType { kind: TokenKind },
    NotAnExpression { kind: TokenKind },
    UnresolvedFieldOwner { field: Interned<str> },
}

impl From<Located<Malformed>> for Located<Error> {
    fn from(malformed: Located<Malformed>) -> Self {
        malformed.map(Error::Malformed)
    }
}
