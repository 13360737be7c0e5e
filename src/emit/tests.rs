use crate::{
    analyzer::Analyzer,
    emit::Emitter,
    reader,
    util::{intern::Interner, test_utils::tree_tests},
};

tree_tests!(
    use emitter;

    fn test_struct_field_access() {
        let tree = "
            ROOT 0.0.0
              STRUCT 0.1.0 struct
                TYPEID 0.1.7 node
                FIELDLIST 0.1.12 {
                  INT 0.2.4 int
                    IDENT 0.2.8 val
                  TYPEID 0.3.4 node
                    IDENT 0.3.9 next
              FUNCTION 0.5.0
                INT 0.5.0 int
                  IDENT 0.5.4 main
                PARAMLIST 0.5.8 (
                BLOCK 0.5.11 {
                  VARDECL 0.6.9 =
                    TYPEID 0.6.4 node
                      IDENT 0.6.9 n
                  RETURN 0.7.4 return
                    DOT 0.7.12 .
                      IDENT 0.7.11 n
                      FIELD 0.7.13 val
        ";
        let code = r#"
            #include "oclib.h"

            struct node {
                    int node_val;
                    struct node* node_next;
            };

            int __main (void)
            {
                    struct node* pn;
                    return pn->node_val ;
            }
        "#;
    }

    fn test_loops_and_conditionals() {
        let tree = "
            ROOT 0.0.0
              FUNCTION 0.1.0
                INT 0.1.0 int
                  IDENT 0.1.4 sum
                PARAMLIST 0.1.7 (
                  INT 0.1.8 int
                    IDENT 0.1.12 n
                BLOCK 0.1.15 {
                  VARDECL 0.2.10 =
                    INT 0.2.4 int
                      IDENT 0.2.8 total
                    INTCON 0.2.12 0
                  WHILE 0.3.4 while
                    GT 0.3.13 >
                      IDENT 0.3.11 n
                      INTCON 0.3.15 0
                    BLOCK 0.3.18 {
                      ASSIGN 0.4.14 =
                        IDENT 0.4.8 total
                        ADD 0.4.22 +
                          IDENT 0.4.16 total
                          MUL 0.4.26 *
                            IDENT 0.4.24 n
                            INTCON 0.4.28 2
                      ASSIGN 0.5.10 =
                        IDENT 0.5.8 n
                        SUB 0.5.14 -
                          IDENT 0.5.12 n
                          INTCON 0.5.16 1
                  IF 0.7.4 if
                    EQ 0.7.14 ==
                      IDENT 0.7.8 total
                      INTCON 0.7.17 0
                    RETURN 0.7.20 return
                      NEG 0.7.27 -
                        INTCON 0.7.28 1
                    RETURN 0.8.9 return
                      IDENT 0.8.16 total
        ";
        let code = r#"
            #include "oclib.h"

            int __sum (
                    int _1_n)
            {
                    int itotal = 0 ;
            while_0_3_4:;
                    char b1 = _1_n > 0 ;
                    if (!b1) goto break_0_3_4;
                    itotal = ( itotal + ( _1_n * 2 ) ) ;
                    _1_n = ( _1_n - 1 ) ;
                    goto while_0_3_4;
            break_0_3_4:;
                    char b2 = itotal == 0 ;
                    if (!b2) goto else_0_7_4;
                    return - 1 ;
                    goto fi_0_7_4;
            else_0_7_4:;
                    return itotal ;
            fi_0_7_4:;
            }
        "#;
    }

    fn test_locals_shadow_parameters() {
        let tree = "
            ROOT 0.0.0
              FUNCTION 0.1.0
                INT 0.1.0 int
                  IDENT 0.1.4 f
                PARAMLIST 0.1.5 (
                  INT 0.1.6 int
                    IDENT 0.1.10 x
                BLOCK 0.1.13 {
                  IF 0.2.4 if
                    NOT 0.2.8 !
                      LT 0.2.11 <
                        IDENT 0.2.9 x
                        INTCON 0.2.13 0
                    BLOCK 0.2.16 {
                      VARDECL 0.3.12 =
                        INT 0.3.8 int
                          IDENT 0.3.12 x
                        ADD 0.3.16 +
                          IDENT 0.3.14 x
                          INTCON 0.3.18 1
                      RETURN 0.4.8 return
                        IDENT 0.4.15 x
                  RETURN 0.6.4 return
                    IDENT 0.6.11 x
        ";
        let code = r#"
            #include "oclib.h"

            int __f (
                    int _1_x)
            {
                    char b1 = ! ( _1_x < 0 ) ;
                    if (!b1) goto fi_0_2_4;
                    int ix = _1_x + 1 ;
                    return ix ;
            fi_0_2_4:;
                    return ix ;
            }
        "#;
    }

    fn test_compound_bases_keep_their_grouping() {
        let tree = "
            ROOT 0.0.0
              STRUCT 0.1.0 struct
                TYPEID 0.1.7 node
                FIELDLIST 0.1.12 {
                  INT 0.1.14 int
                    IDENT 0.1.18 val
              FUNCTION 0.2.0
                VOID 0.2.0 void
                  IDENT 0.2.5 swap
                PARAMLIST 0.2.9 (
                  ARRAY 0.2.13 []
                    INT 0.2.10 int
                    IDENT 0.2.16 a
                  ARRAY 0.2.22 []
                    INT 0.2.19 int
                    IDENT 0.2.25 b
                  TYPEID 0.2.28 node
                    IDENT 0.2.33 p
                  TYPEID 0.2.36 node
                    IDENT 0.2.41 q
                BLOCK 0.2.44 {
                  INDEX 0.3.11 [
                    ASSIGN 0.3.7 =
                      IDENT 0.3.5 a
                      IDENT 0.3.9 b
                    INTCON 0.3.12 0
                  DOT 0.4.11 .
                    ASSIGN 0.4.7 =
                      IDENT 0.4.5 p
                      IDENT 0.4.9 q
                    FIELD 0.4.12 val
        ";
        let code = r#"
            #include "oclib.h"

            struct node {
                    int node_val;
            };

            void __swap (
                    int* _1_a,
                    int* _1_b,
                    struct node* _1_p,
                    struct node* _1_q)
            {
                    ( _1_a = _1_b )[0] ;
                    ( _1_p = _1_q )->node_val ;
            }
        "#;
    }

    fn test_allocations_and_string_pool() {
        let tree = r#"
            ROOT 0.0.0
              STRUCT 0.1.0 struct
                TYPEID 0.1.7 node
                FIELDLIST 0.1.12 {
                  INT 0.1.14 int
                    IDENT 0.1.18 val
                  ARRAY 0.1.26 []
                    TYPEID 0.1.23 node
                    IDENT 0.1.29 kids
              VARDECL 0.2.13 =
                TYPEID 0.2.0 node
                  IDENT 0.2.5 root
                NEW 0.2.15 new
                  TYPEID 0.2.19 node
              VARDECL 0.3.12 =
                STRING 0.3.0 string
                  IDENT 0.3.7 name
                STRINGCON 0.3.14 "oc"
              FUNCTION 0.4.0
                VOID 0.4.0 void
                  IDENT 0.4.5 grow
                PARAMLIST 0.4.9 (
                  STRING 0.4.10 string
                    IDENT 0.4.17 label
                BLOCK 0.4.24 {
                  ASSIGN 0.5.14 =
                    DOT 0.5.8 .
                      IDENT 0.5.4 root
                      FIELD 0.5.9 kids
                    NEWARRAY 0.5.16 new
                      TYPEID 0.5.20 node
                      INTCON 0.5.25 4
                  VARDECL 0.6.14 =
                    ARRAY 0.6.7 []
                      STRING 0.6.4 string
                      IDENT 0.6.10 words
                    NEWPTRARRAY 0.6.16 new
                      STRING 0.6.20 string
                      INTCON 0.6.27 2
                  ASSIGN 0.7.13 =
                    INDEX 0.7.9 [
                      IDENT 0.7.4 words
                      INTCON 0.7.10 0
                    NEWSTRING 0.7.15 new
                      INTCON 0.7.26 8
                  ASSIGN 0.8.21 =
                    DOT 0.8.16 .
                      INDEX 0.8.12 [
                        DOT 0.8.8 .
                          IDENT 0.8.4 root
                          FIELD 0.8.9 kids
                        INTCON 0.8.13 0
                      FIELD 0.8.17 val
                    INTCON 0.8.23 7
                  CALL 0.9.8 (
                    IDENT 0.9.4 puts
                    IDENT 0.9.9 label
                    STRINGCON 0.9.16 "!"
                  RETURN 0.10.4 return
        "#;
        // Global initializers aren't emitted, so the pool index of `"!"` is
        // the first one handed out during emission.
        let code = r#"
            #include "oclib.h"

            struct node {
                    int node_val;
                    struct node** node_kids;
            };

            char* s1 = "oc";
            char* s2 = "!";

            struct node* root;
            char* name;

            void __grow (
                    char* _1_label)
            {
                    root->node_kids = ( xcalloc (4, sizeof (struct node*)) ) ;
                    char** pwords = xcalloc (2, sizeof (char*)) ;
                    pwords[0] = ( xcalloc (8, sizeof (char)) ) ;
                    root->node_kids[0]->node_val = 7 ;
                    __puts (_1_label , s1 ) ;
                    return ;
            }
        "#;
    }

    fn test_branch_temporaries_are_shared_across_functions() {
        let tree = "
            ROOT 0.0.0
              FUNCTION 0.1.0
                VOID 0.1.0 void
                  IDENT 0.1.5 a
                PARAMLIST 0.1.6 (
                BLOCK 0.1.9 {
                  WHILE 0.1.11 while
                    INTCON 0.1.18 1
                    BLOCK 0.1.21 {
              FUNCTION 0.2.0
                VOID 0.2.0 void
                  IDENT 0.2.5 b
                PARAMLIST 0.2.6 (
                  INT 0.2.7 int
                    IDENT 0.2.11 k
                BLOCK 0.2.14 {
                  IF 0.2.16 if
                    IDENT 0.2.20 k
                    CALL 0.2.24 (
                      IDENT 0.2.23 a
        ";
        let code = r#"
            #include "oclib.h"

            void __a (void)
            {
            while_0_1_11:;
                    char b1 = 1 ;
                    if (!b1) goto break_0_1_11;
                    goto while_0_1_11;
            break_0_1_11:;
            }

            void __b (
                    int _2_k)
            {
                    char b2 = _2_k ;
                    if (!b2) goto fi_0_2_16;
                    __a () ;
            fi_0_2_16:;
            }
        "#;
    }

    fn test_unlowerable_expressions() {
        let tree = "
            ROOT 0.0.0
              FUNCTION 0.1.0
                VOID 0.1.0 void
                  IDENT 0.1.5 g
                PARAMLIST 0.1.6 (
                  INT 0.1.7 int
                    IDENT 0.1.11 n
                BLOCK 0.1.14 {
                  DOT 0.2.5 .
                    IDENT 0.2.4 n
                    FIELD 0.2.6 val
                  FIELDLIST 0.3.4 {
                  ADD 0.4.6 +
                    IDENT 0.4.4 n
        ";
        let expected_errors = &[
            "0.2.6: can't tell which struct field val belongs to",
            "0.3.4: expected an expression, but got FIELDLIST",
            "0.4.6: malformed ADD node: expected 2 children, but got 1",
        ];
    }
);

#[test]
fn emission_is_deterministic() {
    const TREE: &str = r#"
        ROOT 0.0.0
          FUNCTION 0.1.0
            VOID 0.1.0 void
              IDENT 0.1.5 hello
            PARAMLIST 0.1.10 (
            BLOCK 0.1.13 {
              CALL 0.2.8 (
                IDENT 0.2.4 puts
                STRINGCON 0.2.9 "hello"
              CALL 0.3.8 (
                IDENT 0.3.4 puts
                STRINGCON 0.3.9 "world"
    "#;

    let run = || {
        let mut i = Interner::with_capacity(32);
        let mut root = reader::read_tree(TREE, &mut i).unwrap();
        let analysis = Analyzer::with_capacity(&i, 8).analyze(&mut root).unwrap();
        Emitter::new(&i, &analysis).emit(&root).unwrap()
    };

    let first = run();
    assert_eq!(first, run());
    assert!(first.contains("char* s1 = \"hello\";\nchar* s2 = \"world\";\n"));
    assert!(first.contains("__puts (s1 ) ;\n        __puts (s2 ) ;\n"));
}
