use crate::{
    analyzer::Analyzer,
    emit::Emitter,
    reader,
    token::Located,
    util::{
        fmt::{render_all, tree, Context, Diagnostic},
        intern::Interner,
    },
};

pub fn format_errors<E: Diagnostic>(i: &Interner<str>, e: &[Located<E>]) -> Vec<String> {
    render_all(&Context::new(i), e)
}

/// Each variant contains the input tree, in interchange format.
pub enum Test {
    Reader(&'static str),
    Analyzer(&'static str),
    Emitter(&'static str),
}

pub enum Assertion {
    TreeOk(&'static str),
    TreeError(&'static str),
    Report(&'static str),
    PartialReport(&'static str),
    Code(&'static str),
    ExpectedErrors(&'static [&'static str]),
}

/// Everything a pipeline run produced, formatted.
#[derive(Default)]
pub struct Output {
    /// The tree as last seen, annotated once the analyzer ran.
    pub tree: String,
    pub report: String,
    pub code: String,
    pub errors: Vec<String>,
}

#[track_caller]
pub fn run_pipeline(test: Test) -> Output {
    let interner = &mut Interner::with_capacity(128);
    let (input, stop_after_analysis) = match test {
        Test::Reader(input) => {
            let (root, errors) = match reader::read_tree(input, interner) {
                Ok(root) => (root, vec![]),
                Err((root, errors)) => (root, errors),
            };
            return Output {
                tree: tree::print_tree_string(interner, &root, tree::Annotate::No),
                errors: format_errors(interner, &errors),
                ..Output::default()
            };
        }
        Test::Analyzer(input) => (input, true),
        Test::Emitter(input) => (input, false),
    };

    let (mut root, errors) = match reader::read_tree(input, interner) {
        Ok(root) => (root, vec![]),
        Err((root, errors)) => (root, errors),
    };
    let mut fmt_errors = format_errors(interner, &errors);

    let analyzer = Analyzer::with_capacity(interner, 32);
    let (analysis, errors) = match analyzer.analyze(&mut root) {
        Ok(analysis) => (analysis, vec![]),
        Err((analysis, errors)) => (analysis, errors),
    };
    fmt_errors.extend(format_errors(interner, &errors));

    let mut output = Output {
        tree: tree::print_tree_string(interner, &root, tree::Annotate::Attributes),
        report: analysis.report.clone(),
        ..Output::default()
    };
    if !stop_after_analysis {
        let (code, errors) = match Emitter::new(interner, &analysis).emit(&root) {
            Ok(code) => (code, vec![]),
            Err((code, errors)) => (code, errors),
        };
        fmt_errors.extend(format_errors(interner, &errors));
        output.code = code;
    }
    output.errors = fmt_errors;
    output
}

#[track_caller]
pub fn run_assertion(assertion: Assertion, actual: &Output) {
    let no_errors: &[&str] = &[];
    match assertion {
        Assertion::TreeOk(expected_tree) => {
            ::pretty_assertions::assert_eq!(actual.errors, no_errors);
            ::pretty_assertions::assert_eq!(actual.tree.trim(), expected_tree.trim());
        }
        Assertion::TreeError(expected_tree) => {
            ::pretty_assertions::assert_eq!(actual.tree.trim(), expected_tree.trim());
        }
        Assertion::Report(expected_report) => {
            ::pretty_assertions::assert_eq!(actual.errors, no_errors);
            ::pretty_assertions::assert_eq!(actual.report.trim(), expected_report.trim());
        }
        Assertion::PartialReport(expected_report) => {
            ::pretty_assertions::assert_eq!(actual.report.trim(), expected_report.trim());
        }
        Assertion::Code(expected_code) => {
            ::pretty_assertions::assert_eq!(actual.errors, no_errors);
            ::pretty_assertions::assert_eq!(actual.code.trim(), expected_code.trim());
        }
        Assertion::ExpectedErrors(expected_errors) => {
            ::pretty_assertions::assert_eq!(actual.errors, expected_errors);
        }
    }
}

macro_rules! tree_tests {
    (
        use $test_kind:ident;

        $(
            fn $test_name:ident() {
                let $source_kind:ident = $source:expr;
                $($assertions_tt:tt)*
            }
        )*
    ) => {
        $(
            #[test]
            fn $test_name() {
                let test: crate::util::test_utils::Test =
                    tree_tests!(@@get_test($test_kind, $source_kind), $source);
                let output = crate::util::test_utils::run_pipeline(test);
                tree_tests!(@@expand_assertions, &output, [$($assertions_tt)*]);
            }
        )*
    };

    (@@expand_assertions, $output:expr, []) => {};
    (@@expand_assertions, $output:expr, [
        let $assertion:ident = $assertion_expected:expr;
        $($rest_assertions_tt:tt)*
    ]) => {
        crate::util::test_utils::run_assertion(
            tree_tests!(@@assertion, $assertion, $assertion_expected),
            $output,
        );
        tree_tests!(@@expand_assertions, $output, [$($rest_assertions_tt)*]);
    };

    (@@assertion, tree_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeOk(::indoc::indoc! { $expected })
    };
    (@@assertion, tree_error, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeError(::indoc::indoc! { $expected })
    };
    (@@assertion, report, $expected:expr) => {
        crate::util::test_utils::Assertion::Report(::indoc::indoc! { $expected })
    };
    (@@assertion, partial_report, $expected:expr) => {
        crate::util::test_utils::Assertion::PartialReport(::indoc::indoc! { $expected })
    };
    (@@assertion, code, $expected:expr) => {
        crate::util::test_utils::Assertion::Code(::indoc::indoc! { $expected })
    };
    (@@assertion, expected_errors, $expected:expr) => {
        crate::util::test_utils::Assertion::ExpectedErrors($expected)
    };

    (@@get_test(reader, tree), $source:expr) => {
        crate::util::test_utils::Test::Reader($source)
    };
    (@@get_test(analyzer, tree), $source:expr) => {
        crate::util::test_utils::Test::Analyzer($source)
    };
    (@@get_test(emitter, tree), $source:expr) => {
        crate::util::test_utils::Test::Emitter($source)
    };
}
pub(crate) use tree_tests;
