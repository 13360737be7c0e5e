use std::fmt;

use crate::{
    ast::{Arity, Node},
    emit::{Emitter, Error, Result},
    token::TokenKind,
    util::intern::Interned,
};

/// The text of a lowered expression, which always ends in a space.
#[derive(Debug, Default)]
pub(super) struct Lowered {
    text: String,
    /// Set by binary operations and allocations, which get parenthesized when
    /// used as an operand.
    compound: bool,
}

impl Lowered {
    fn simple(text: String) -> Lowered {
        Lowered {
            text,
            compound: false,
        }
    }

    fn compound(text: String) -> Lowered {
        Lowered {
            text,
            compound: true,
        }
    }

    /// This expression, as the operand of an operator.
    fn operand(&self) -> String {
        if self.compound {
            format!("( {}) ", self.text)
        } else {
            self.text.clone()
        }
    }

    fn trimmed(&self) -> &str {
        self.text.trim_end()
    }

    /// This expression, as the base of an index or field access.
    fn base(&self) -> String {
        let mut base = self.operand();
        base.truncate(base.trim_end().len());
        base
    }
}

impl fmt::Display for Lowered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Emitter<'_> {
    /// Lowers an expression. One that can't be lowered is reported and lowers
    /// to nothing.
    pub(super) fn lower_expr(&mut self, node: &Node) -> Lowered {
        match self.try_lower_expr(node) {
            Ok(lowered) => lowered,
            Err(error) => {
                self.error(error);
                Lowered::default()
            }
        }
    }

    fn try_lower_expr(&mut self, node: &Node) -> Result<Lowered> {
        use TokenKind::*;
        let idents = self.idents;
        let lowered = match node.kind {
            Eq | Ne | Lt | Le | Gt | Ge | Plus | Minus | Star | Slash | Assign => {
                node.check_arity(Arity::Exactly(2))?;
                let lhs = self.lower_expr(&node.children[0]);
                let rhs = self.lower_expr(&node.children[1]);
                let op = node.kind.operator().unwrap_or_default();
                Lowered::compound(format!("{}{op} {}", lhs.operand(), rhs.operand()))
            }
            Pos | Neg | Not => {
                node.check_arity(Arity::Exactly(1))?;
                let operand = self.lower_expr(&node.children[0]);
                let op = node.kind.operator().unwrap_or_default();
                Lowered::simple(format!("{op} {}", operand.operand()))
            }
            New => {
                node.check_arity(Arity::Exactly(1))?;
                let ty = idents.get(node.children[0].text);
                Lowered::compound(format!("xcalloc (1, sizeof (struct {ty})) "))
            }
            NewString => {
                node.check_arity(Arity::Exactly(1))?;
                let size = self.lower_expr(&node.children[0]);
                Lowered::compound(format!("xcalloc ({}, sizeof (char)) ", size.trimmed()))
            }
            NewArray | NewPointerArray => {
                node.check_arity(Arity::Exactly(2))?;
                let element = self.element_type(node.kind, &node.children[0])?;
                let size = self.lower_expr(&node.children[1]);
                Lowered::compound(format!(
                    "xcalloc ({}, sizeof ({element})) ",
                    size.trimmed()
                ))
            }
            Call => {
                node.check_arity(Arity::AtLeast(1))?;
                let callee = idents.get(node.children[0].text);
                let args: Vec<_> = node.children[1..]
                    .iter()
                    .map(|arg| self.lower_expr(arg).text)
                    .collect();
                Lowered::simple(format!("__{callee} ({}) ", args.join(", ")))
            }
            Index => {
                node.check_arity(Arity::Exactly(2))?;
                let base = self.lower_expr(&node.children[0]);
                let index = self.lower_expr(&node.children[1]);
                Lowered::simple(format!("{}[{}] ", base.base(), index.trimmed()))
            }
            Dot => self.lower_field_access(node)?,
            Ident => Lowered::simple(format!("{} ", self.resolve(node.text))),
            IntCon | CharCon => Lowered::simple(format!("{} ", idents.get(node.text))),
            StringCon => {
                let index = self.next_string;
                self.next_string += 1;
                Lowered::simple(format!("s{index} "))
            }
            Null if node.children.is_empty() => Lowered::simple("0 ".to_owned()),
            kind => return Err(node.loc.wrap(Error::NotAnExpression { kind })),
        };
        Ok(lowered)
    }

    fn lower_field_access(&mut self, node: &Node) -> Result<Lowered> {
        node.check_arity(Arity::Exactly(2))?;
        let [base, field] = node.children.as_slice() else {
            unreachable!("arity checked above");
        };
        let lowered_base = self.lower_expr(base);
        let idents = self.idents;
        let field_name = idents.get(field.text);
        let member = match self.struct_type(base) {
            Some(owner) => format!("{}_{field_name}", idents.get(owner)),
            None => {
                let error = Error::UnresolvedFieldOwner { field: field.text };
                self.error(field.loc.wrap(error));
                field_name.to_owned()
            }
        };
        Ok(Lowered::simple(format!("{}->{member} ", lowered_base.base())))
    }

    /// The `sizeof` operand for the elements of an array allocation.
    fn element_type(&self, allocation: TokenKind, element: &Node) -> Result<String> {
        let pointer = if allocation == TokenKind::NewPointerArray {
            "*"
        } else {
            ""
        };
        let ty = match element.kind {
            TokenKind::String => format!("char{pointer}"),
            TokenKind::Int => format!("int{pointer}"),
            TokenKind::TypeId => format!("struct {}*", self.idents.get(element.text)),
            kind => return Err(element.loc.wrap(Error::NotAType { kind })),
        };
        Ok(ty)
    }

    /// Substitutes a variable reference: locals shadow parameters, which
    /// shadow globals.
    fn resolve(&self, name: Interned<str>) -> &str {
        if let Some(local) = self.locals.get(&name) {
            local
        } else if let Some(param) = self.params.get(&name) {
            param
        } else {
            self.idents.get(name)
        }
    }

    /// The struct type an expression evaluates to a pointer of, if known.
    fn struct_type(&self, node: &Node) -> Option<Interned<str>> {
        match node.kind {
            TokenKind::Ident => {
                let name = node.text;
                if self.locals.contains_key(&name) || self.params.contains_key(&name) {
                    self.local_types.get(&name).copied()
                } else if self.globals.contains(&name) {
                    self.global_types.get(&name).copied()
                } else {
                    None
                }
            }
            TokenKind::Index | TokenKind::Assign => self.struct_type(node.children.first()?),
            TokenKind::Dot => {
                let [base, field] = node.children.as_slice() else {
                    return None;
                };
                let owner = self.struct_type(base)?;
                let fields = self.analysis.globals.get(owner)?.symbol.fields.as_ref()?;
                fields.get(field.text)?.symbol.type_name
            }
            TokenKind::Call => {
                let callee = node.children.first()?.text;
                self.analysis.globals.get(callee)?.symbol.type_name
            }
            _ => None,
        }
    }
}
