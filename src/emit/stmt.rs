use std::format_args as f;

use tracing::debug;

use crate::{
    ast::{Arity, Node},
    emit::{Decl, Emitter, Result, INDENT},
    token::TokenKind,
    util::intern::Interned,
};

impl Emitter<'_> {
    pub(super) fn emit_function(&mut self, node: &Node) {
        if let Err(error) = node.check_arity(Arity::Exactly(3)) {
            return self.error(error.into());
        }
        let [header, parameter_list, body] = node.children.as_slice() else {
            unreachable!("arity checked above");
        };
        let Decl { ty, name, .. } = match self.lower_decl(header) {
            Ok(decl) => decl,
            Err(error) => return self.error(error),
        };
        let idents = self.idents;
        debug!(name = idents.get(name), "emitting function");

        self.params.clear();
        self.locals.clear();
        self.local_types.clear();

        let mut parameters = Vec::with_capacity(parameter_list.children.len());
        for decl in &parameter_list.children {
            let param = match self.lower_decl(decl) {
                Ok(param) => param,
                Err(error) => {
                    self.error(error);
                    continue;
                }
            };
            let blocknr = decl.declared().map_or(0, |ident| ident.loc.blocknr);
            let mangled = format!("_{blocknr}_{}", idents.get(param.name));
            parameters.push(format!("\n{INDENT}{} {mangled}", param.ty));
            self.record_type(param.name, param.struct_type);
            self.params.insert(param.name, mangled);
        }
        let parameters = if parameters.is_empty() {
            "void".to_owned()
        } else {
            parameters.join(",")
        };

        self.out(f!("{ty} __{} ({parameters})", idents.get(name)));
        self.out(f!("{{"));
        self.indented(|this| this.emit_statement(body));
        self.out(f!("}}"));
        self.out_line();
    }

    pub(super) fn emit_statement(&mut self, node: &Node) {
        if let Err(error) = self.try_emit_statement(node) {
            self.error(error);
        }
    }

    fn try_emit_statement(&mut self, node: &Node) -> Result<()> {
        match node.kind {
            TokenKind::Block => {
                for stmt in &node.children {
                    self.emit_statement(stmt);
                }
            }
            TokenKind::VarDecl => self.emit_local(node)?,
            TokenKind::While => self.emit_while(node)?,
            TokenKind::If => self.emit_if(node)?,
            TokenKind::Return => {
                node.check_arity(Arity::Between(0, 1))?;
                match node.children.first() {
                    Some(value) => {
                        let value = self.lower_expr(value);
                        self.out(f!("return {value};"));
                    }
                    None => self.out(f!("return ;")),
                }
            }
            _ => {
                let value = self.lower_expr(node);
                self.out(f!("{value};"));
            }
        }
        Ok(())
    }

    fn emit_local(&mut self, node: &Node) -> Result<()> {
        node.check_arity(Arity::Between(1, 2))?;
        let Decl {
            ty,
            name,
            struct_type,
        } = self.lower_decl(&node.children[0])?;

        let hint = if ty == "int" {
            "i"
        } else if ty.ends_with('*') {
            "p"
        } else {
            ""
        };
        let mangled = format!("{hint}{}", self.idents.get(name));

        // The initializer still sees any binding this local shadows.
        match node.children.get(1) {
            Some(initializer) => {
                let value = self.lower_expr(initializer);
                self.out(f!("{ty} {mangled} = {value};"));
            }
            None => self.out(f!("{ty} {mangled};")),
        }
        self.record_type(name, struct_type);
        self.locals.insert(name, mangled);
        Ok(())
    }

    fn emit_while(&mut self, node: &Node) -> Result<()> {
        node.check_arity(Arity::Exactly(2))?;
        let suffix = node.loc.label_suffix();
        let branch = self.next_branch();

        self.label("while", &suffix);
        let condition = self.lower_expr(&node.children[0]);
        self.out(f!("char {branch} = {condition};"));
        self.out(f!("if (!{branch}) goto break{suffix};"));
        self.emit_statement(&node.children[1]);
        self.out(f!("goto while{suffix};"));
        self.label("break", &suffix);
        Ok(())
    }

    fn emit_if(&mut self, node: &Node) -> Result<()> {
        node.check_arity(Arity::Between(2, 3))?;
        let suffix = node.loc.label_suffix();
        let branch = self.next_branch();

        let condition = self.lower_expr(&node.children[0]);
        self.out(f!("char {branch} = {condition};"));
        match node.children.get(2) {
            None => {
                self.out(f!("if (!{branch}) goto fi{suffix};"));
                self.emit_statement(&node.children[1]);
            }
            Some(otherwise) => {
                self.out(f!("if (!{branch}) goto else{suffix};"));
                self.emit_statement(&node.children[1]);
                self.out(f!("goto fi{suffix};"));
                self.label("else", &suffix);
                self.emit_statement(otherwise);
            }
        }
        self.label("fi", &suffix);
        Ok(())
    }

    fn next_branch(&mut self) -> String {
        let branch = format!("b{}", self.next_branch);
        self.next_branch += 1;
        branch
    }

    fn record_type(&mut self, name: Interned<str>, struct_type: Option<Interned<str>>) {
        match struct_type {
            Some(struct_type) => self.local_types.insert(name, struct_type),
            None => self.local_types.remove(&name),
        };
    }
}
