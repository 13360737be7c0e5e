use std::{
    fmt::{self, Write},
    format_args as f, mem,
    rc::Rc,
};

use tracing::{debug, trace};

use crate::{
    ast::{Arity, Malformed, Node},
    symbol::{Attr, Symbol, SymbolTable},
    token::{Located, Location, TokenKind},
    util::{
        fmt::{Context, Show},
        intern::{Interned, Interner},
    },
};


type Result<T, E = Located<Error>> = std::result::Result<T, E>;

pub type AnalyzeResult = std::result::Result<Analysis, (Analysis, Vec<Located<Error>>)>;

const DEFAULT_REPORT_CAPACITY: usize = 4 * 1024; // 4 KiB

/// Global names are separated from what precedes them by an empty line.
const GLOBAL_INDENT: &str = "\n";
const NESTED_INDENT: &str = "    ";

/// What the analyzer learned about a program, besides the attributes it left
/// on the tree.
#[derive(Debug)]
pub struct Analysis {
    /// One line per declared name, in declaration order.
    pub report: String,
    /// Struct, function and global variable names. Struct entries carry their
    /// field tables.
    pub globals: SymbolTable,
    /// The text of every string literal, in the order the walk met them.
    pub strings: Vec<Interned<str>>,
}

/// Classifies every node of a tree, building the symbol tables along the way.
///
/// Children are classified before their parent, so a declaration's type
/// marker has already tagged the declared identifier by the time the
/// enclosing struct, parameter list, block or function is handled.
pub struct Analyzer<'ident> {
    idents: &'ident Interner<str>,
    globals: SymbolTable,
    /// Fields of the struct being analyzed, or the parameters and locals of
    /// the function being analyzed.
    locals: SymbolTable,
    /// Parameters of the next function, accumulated by its parameter list.
    parameters: Vec<Symbol>,
    next_block: usize,
    strings: Vec<Interned<str>>,
    report: String,
    errors: Vec<Located<Error>>,
}

impl<'ident> Analyzer<'ident> {
    pub fn with_capacity(idents: &'ident Interner<str>, capacity: usize) -> Analyzer<'ident> {
        Analyzer {
            idents,
            globals: SymbolTable::with_capacity(capacity),
            locals: SymbolTable::with_capacity(capacity),
            parameters: Vec::with_capacity(8),
            next_block: 1,
            strings: Vec::with_capacity(capacity),
            report: String::with_capacity(DEFAULT_REPORT_CAPACITY),
            errors: Vec::with_capacity(8),
        }
    }

    pub fn analyze(mut self, root: &mut Node) -> AnalyzeResult {
        debug!(declarations = root.children.len(), "analyzing tree");
        for child in &mut root.children {
            self.visit(child);
            if child.kind == TokenKind::VarDecl {
                self.declare_variable(child);
            }
        }

        let analysis = Analysis {
            report: self.report,
            globals: self.globals,
            strings: self.strings,
        };
        if self.errors.is_empty() {
            Ok(analysis)
        } else {
            debug!(errors = self.errors.len(), "analysis failed");
            Err((analysis, self.errors))
        }
    }

    fn visit(&mut self, node: &mut Node) {
        for child in &mut node.children {
            self.visit(child);
        }
        match self.classify(node) {
            Ok(attr) => trace!(kind = %node.kind, loc = %node.loc, ?attr, "classified"),
            Err(error) => self.error(error),
        }
    }

    /// Classifies a node whose children were already classified, returning the
    /// attribute it stands for.
    fn classify(&mut self, node: &mut Node) -> Result<Attr> {
        use TokenKind::*;
        let attr = match node.kind {
            Void | Int | String | Null if !node.children.is_empty() => {
                node.check_arity(Arity::Exactly(1))?;
                let attr = primitive(node.kind);
                node.children[0].symbol.set(attr);
                attr
            }
            Null => {
                node.symbol.set(Attr::NULL | Attr::CONST);
                Attr::NULL
            }
            // Element type of an array declaration or allocation.
            Void | Int | String => primitive(node.kind),
            TypeId => {
                node.check_arity(Arity::Between(0, 1))?;
                let name = node.text;
                if let Some(ident) = node.children.first_mut() {
                    ident.symbol.set_struct(name);
                }
                Attr::STRUCT
            }
            Array => self.classify_array(node)?,
            Struct => self.classify_struct(node)?,
            ParamList => self.classify_parameters(node),
            Block => self.classify_block(node),
            While | If => self.classify_bodies(node),
            Function => self.classify_function(node)?,
            VarDecl => {
                node.check_arity(Arity::Between(1, 2))?;
                Attr::VOID
            }
            IntCon | CharCon => {
                node.symbol.set(Attr::INT | Attr::CONST);
                Attr::INT
            }
            StringCon => {
                self.strings.push(node.text);
                node.symbol.set(Attr::STRING | Attr::CONST);
                Attr::STRING
            }
            _ => Attr::VOID,
        };
        Ok(attr)
    }

    fn classify_array(&mut self, node: &mut Node) -> Result<Attr> {
        node.check_arity(Arity::Exactly(2))?;
        let [element, ident] = node.children.as_mut_slice() else {
            unreachable!("arity checked above");
        };
        let attr = match element.kind {
            TokenKind::TypeId => {
                ident.symbol.set_struct(element.text);
                Attr::STRUCT
            }
            kind if kind.is_type() => primitive(kind),
            kind => return Err(element.loc.wrap(Error::NotAType { kind })),
        };
        ident.symbol.set(Attr::ARRAY | attr);
        Ok(Attr::ARRAY)
    }

    fn classify_struct(&mut self, node: &mut Node) -> Result<Attr> {
        node.check_arity(Arity::Exactly(2))?;
        let [name, field_list] = node.children.as_mut_slice() else {
            unreachable!("arity checked above");
        };
        let struct_name = name.text;
        debug!(name = self.idents.get(struct_name), "entering struct");

        // Declared before the fields, so that they may refer to the struct.
        name.symbol.set_struct(struct_name);
        self.declare_global(name);

        for (sequence, decl) in field_list.children.iter_mut().enumerate() {
            self.check_declared_type(decl);
            let ident = match declaration(decl) {
                Ok(ident) => ident,
                Err(error) => {
                    self.error(error);
                    continue;
                }
            };
            ident.symbol.set(Attr::FIELD);
            ident.symbol.sequence = sequence;
            self.declare(ident);
            self.write_symbol(NESTED_INDENT, ident);
        }

        let fields = Rc::new(mem::take(&mut self.locals));
        name.symbol.fields = Some(Rc::clone(&fields));
        // A duplicate struct keeps the first declaration's fields.
        if let Some(entry) = self.globals.get_mut(struct_name) {
            if entry.loc == name.loc {
                entry.symbol.fields = Some(fields);
            }
        }
        debug!(name = self.idents.get(struct_name), "leaving struct");
        Ok(Attr::STRUCT)
    }

    fn classify_parameters(&mut self, node: &mut Node) -> Attr {
        if node.children.is_empty() {
            return Attr::VOID;
        }
        for (sequence, decl) in node.children.iter_mut().enumerate() {
            self.check_declared_type(decl);
            let ident = match declaration(decl) {
                Ok(ident) => ident,
                Err(error) => {
                    self.error(error);
                    continue;
                }
            };
            ident.symbol.set(Attr::VARIABLE | Attr::LVAL | Attr::PARAM);
            ident.symbol.sequence = sequence;
            self.parameters.push(ident.symbol.clone());
        }
        Attr::PARAM
    }

    fn classify_block(&mut self, node: &mut Node) -> Attr {
        let mut sequence = 0;
        for stmt in &mut node.children {
            if self.classify_local(stmt, sequence) {
                sequence += 1;
            }
        }
        Attr::VOID
    }

    /// Classifies the unbraced bodies of a `while` or `if`, each of which is a
    /// block of its own.
    fn classify_bodies(&mut self, node: &mut Node) -> Attr {
        for body in node.children.iter_mut().skip(1) {
            self.classify_local(body, 0);
        }
        Attr::VOID
    }

    /// Classifies a statement if it declares a local, returning whether it
    /// did.
    fn classify_local(&mut self, stmt: &mut Node, sequence: usize) -> bool {
        // Malformed declarations were reported when they were visited.
        if stmt.kind != TokenKind::VarDecl || stmt.check_arity(Arity::Between(1, 2)).is_err() {
            return false;
        }
        let decl = &mut stmt.children[0];
        self.check_declared_type(decl);
        match declaration(decl) {
            Ok(ident) => {
                ident.symbol.set(Attr::VARIABLE | Attr::LVAL | Attr::LOCAL);
                ident.symbol.sequence = sequence;
                true
            }
            Err(error) => {
                self.error(error);
                false
            }
        }
    }

    fn classify_function(&mut self, node: &mut Node) -> Result<Attr> {
        // Whatever happens, the parameters gathered so far belong to this
        // function only.
        let parameters = mem::take(&mut self.parameters);

        node.check_arity(Arity::Exactly(3))?;
        let [header, parameter_list, body] = node.children.as_mut_slice() else {
            unreachable!("arity checked above");
        };
        self.check_declared_type(header);
        let ident = declaration(header)?;
        let blocknr = self.next_block;
        debug!(name = self.idents.get(ident.text), blocknr, "entering function");

        ident.symbol.set(Attr::FUNCTION);
        ident.symbol.parameters = Some(Rc::from(parameters));
        self.declare_global(ident);

        for decl in &mut parameter_list.children {
            // Reported by the parameter list.
            let Ok(ident) = declaration(decl) else {
                continue;
            };
            ident.loc.blocknr = blocknr;
            self.declare(ident);
            self.write_symbol(NESTED_INDENT, ident);
        }
        self.declare_locals(body, blocknr);

        self.locals.clear();
        self.next_block += 1;
        debug!(blocknr, "leaving function");
        Ok(Attr::FUNCTION)
    }

    /// Numbers and reports the locals of a function body, nested blocks
    /// included. A local may shadow a parameter or an earlier local.
    fn declare_locals(&mut self, node: &mut Node, blocknr: usize) {
        use TokenKind::*;
        for stmt in &mut node.children {
            match stmt.kind {
                VarDecl => {
                    let Some(decl) = stmt.children.first_mut() else {
                        continue;
                    };
                    let Ok(ident) = declaration(decl) else {
                        continue;
                    };
                    ident.loc.blocknr = blocknr;
                    self.locals
                        .shadow(ident.text, ident.loc, ident.symbol.clone());
                    self.write_symbol(NESTED_INDENT, ident);
                }
                Block | While | If => self.declare_locals(stmt, blocknr),
                _ => {}
            }
        }
    }

    /// Declares a top-level variable.
    fn declare_variable(&mut self, stmt: &mut Node) {
        // Malformed declarations were reported when they were visited.
        if stmt.check_arity(Arity::Between(1, 2)).is_err() {
            return;
        }
        let decl = &mut stmt.children[0];
        self.check_declared_type(decl);
        match declaration(decl) {
            Ok(ident) => {
                ident.symbol.set(Attr::VARIABLE | Attr::LVAL);
                self.declare_global(ident);
            }
            Err(error) => self.error(error),
        }
    }
}

// Utility functions.
impl Analyzer<'_> {
    /// Enters the identifier into the global table and reports it.
    fn declare_global(&mut self, ident: &Node) {
        if let Err(previous) = self
            .globals
            .insert(ident.text, ident.loc, ident.symbol.clone())
        {
            self.duplicate(ident, previous);
        }
        self.write_symbol(GLOBAL_INDENT, ident);
    }

    /// Enters the identifier into the current struct or function scope.
    fn declare(&mut self, ident: &Node) {
        if let Err(previous) = self
            .locals
            .insert(ident.text, ident.loc, ident.symbol.clone())
        {
            self.duplicate(ident, previous);
        }
    }

    fn duplicate(&mut self, ident: &Node, previous: Location) {
        let error = Error::DuplicateDeclaration {
            name: ident.text,
            previous,
        };
        self.error(ident.loc.wrap(error));
    }

    /// Reports the declaration's struct type if it was never declared.
    fn check_declared_type(&mut self, decl: &Node) {
        let ty = decl.type_node();
        if ty.kind != TokenKind::TypeId {
            return;
        }
        let declared = self.globals.get(ty.text).is_some_and(|entry| {
            entry.symbol.has(Attr::STRUCT)
                && !entry
                    .symbol
                    .attributes
                    .intersects(Attr::FUNCTION | Attr::VARIABLE)
        });
        if !declared {
            self.error(ty.loc.wrap(Error::UndeclaredType { name: ty.text }));
        }
    }

    /// Writes the report line of a declared identifier:
    /// `name (f.l.o) {blocknr} attributes`, or `name (f.l.o) attributes field
    /// sequence` for fields.
    fn write_symbol(&mut self, indent: &str, ident: &Node) {
        let idents = self.idents;
        let ctx = Context::new(idents);
        let name = idents.get(ident.text);
        let symbol = &ident.symbol;
        let loc = ident.loc;
        if symbol.has(Attr::FIELD) {
            self.write(f!(
                "{indent}{name} ({loc}){} field {}\n",
                symbol.display(&ctx),
                symbol.sequence,
            ));
        } else {
            self.write(f!(
                "{indent}{name} ({loc}) {{{}}}{}\n",
                loc.blocknr,
                symbol.display(&ctx),
            ));
        }
    }

    fn write(&mut self, f: fmt::Arguments<'_>) {
        self.report
            .write_fmt(f)
            .expect("report write should be infallible");
    }

    fn error(&mut self, error: Located<Error>) {
        self.errors.push(error);
    }
}

/// Returns the identifier a declaration declares.
fn declaration(decl: &mut Node) -> Result<&mut Node> {
    let (loc, kind) = (decl.loc, decl.kind);
    match decl.declared_mut() {
        Some(ident) if ident.kind == TokenKind::Ident => Ok(ident),
        _ => Err(loc.wrap(Error::NotADeclaration { kind })),
    }
}

const fn primitive(kind: TokenKind) -> Attr {
    match kind {
        TokenKind::Void => Attr::VOID,
        TokenKind::Int => Attr::INT,
        TokenKind::String => Attr::STRING,
        TokenKind::Null => Attr::NULL,
        _ => Attr::empty(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Malformed(Malformed),
    NotADeclaration {
        kind: TokenKind,
    },
    NotAType {
        kind: TokenKind,
    },
    UndeclaredType {
        name: Interned<str>,
    },
    DuplicateDeclaration {
        name: Interned<str>,
        previous: Location,
    },
}

impl From<Located<Malformed>> for Located<Error> {
    fn from(malformed: Located<Malformed>) -> Self {
        malformed.map(Error::Malformed)
    }
}
