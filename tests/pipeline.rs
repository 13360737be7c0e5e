use std::collections::HashSet;

use oc::{
    analyzer::Analyzer,
    emit::Emitter,
    reader,
    util::{
        fmt::{
            render_all,
            tree::{print_tree_string, Annotate},
            Context,
        },
        intern::Interner,
    },
};
use pretty_assertions::assert_eq;

const LIST_TREE: &str = include_str!("fixtures/list.ast");
const LIST_REPORT: &str = include_str!("fixtures/list.sym");
const LIST_CODE: &str = include_str!("fixtures/list.oil");

#[test]
fn list_program() {
    let mut idents = Interner::with_capacity(128);
    let mut root = reader::read_tree(LIST_TREE, &mut idents).unwrap();

    let analysis = Analyzer::with_capacity(&idents, 16)
        .analyze(&mut root)
        .unwrap();
    assert_eq!(analysis.report, LIST_REPORT);

    let code = Emitter::new(&idents, &analysis).emit(&root).unwrap();
    assert_eq!(code, LIST_CODE);
}

#[test]
fn list_program_prints_back_unchanged() {
    let mut idents = Interner::with_capacity(128);
    let root = reader::read_tree(LIST_TREE, &mut idents).unwrap();
    assert_eq!(print_tree_string(&idents, &root, Annotate::No), LIST_TREE);
}

#[test]
fn labels_are_unique() {
    let mut labels = HashSet::new();
    for label in LIST_CODE.lines().filter(|line| line.ends_with(":;")) {
        assert!(labels.insert(label), "{label} defined twice");
    }
    assert_eq!(labels.len(), 5);
}

#[test]
fn analysis_errors_keep_the_report() {
    const TREE: &str = "
ROOT 0.0.0
  VARDECL 0.1.0
    TYPEID 0.1.0 missing
      IDENT 0.1.8 m
  VARDECL 0.2.0
    INT 0.2.0 int
      IDENT 0.2.4 m
";
    let mut idents = Interner::with_capacity(16);
    let mut root = reader::read_tree(TREE, &mut idents).unwrap();
    let (analysis, errors) = Analyzer::with_capacity(&idents, 4)
        .analyze(&mut root)
        .unwrap_err();

    let rendered = render_all(&Context::new(&idents), &errors);
    assert_eq!(
        rendered,
        [
            "0.1.0: struct missing is not declared",
            "0.2.4: m already declared at 0.1.8",
        ]
    );
    assert!(analysis.report.contains("m (0.1.8) {0} struct missing variable lval"));
}
