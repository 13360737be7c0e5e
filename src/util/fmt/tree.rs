use std::io::Write;

use crate::{
    ast::Node,
    symbol::Attr,
    util::{
        fmt::{Context, Show},
        intern::Interner,
    },
};

const INDENT_WIDTH: usize = 2;

/// Whether the printed tree carries the analyzer's classification.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Annotate {
    /// Plain interchange format, which can be read back.
    No,
    /// Every classified node ends in ` %: {blocknr}` and its attribute words.
    Attributes,
}

pub fn print_tree_string(idents: &Interner<str>, root: &Node, annotate: Annotate) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_tree(&mut buf, idents, root, annotate).expect("tree print should be infallible");
    String::from_utf8(buf).expect("tree print should be valid UTF-8")
}

pub fn print_tree(
    w: &mut impl Write,
    idents: &Interner<str>,
    root: &Node,
    annotate: Annotate,
) -> std::io::Result<()> {
    let ctx = Context::new(idents);
    print_node(w, &ctx, 0, root, annotate)
}

fn print_node(
    w: &mut impl Write,
    ctx: &Context<'_>,
    i: usize,
    node: &Node,
    annotate: Annotate,
) -> std::io::Result<()> {
    sp(w, i)?;
    write!(w, "{} {}", node.kind, node.loc)?;
    let text = ctx.ident_interner.get(node.text);
    if !text.is_empty() {
        write!(w, " {text}")?;
    }
    if annotate == Annotate::Attributes && node.symbol.attributes != Attr::empty() {
        write!(
            w,
            " %: {{{}}}{}",
            node.loc.blocknr,
            node.symbol.display(ctx)
        )?;
    }
    writeln!(w)?;
    for child in &node.children {
        print_node(w, ctx, i + 1, child, annotate)?;
    }
    Ok(())
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:1$}", "", i * INDENT_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ast::test_utils::Builder, token::TokenKind};

    #[test]
    fn prints_interchange_lines() {
        let i = &mut Interner::with_capacity(8);
        let mut b = Builder::new(i);
        let decl = b.decl(TokenKind::Int, "int", "x");
        let value = b.node(TokenKind::IntCon, "5");
        let mut stmt = b.node(TokenKind::VarDecl, "=").adopt([decl, value]);
        stmt.children[0].children[0].symbol.set(Attr::INT | Attr::VARIABLE);

        let plain = print_tree_string(i, &stmt, Annotate::No);
        assert_eq!(
            plain,
            "VARDECL 0.4.0 =\n  INT 0.1.0 int\n    IDENT 0.2.0 x\n  INTCON 0.3.0 5\n"
        );

        let annotated = print_tree_string(i, &stmt, Annotate::Attributes);
        assert_eq!(
            annotated.lines().nth(2),
            Some("    IDENT 0.2.0 x %: {0} int variable")
        );
    }
}
