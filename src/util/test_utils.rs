use crate::{driver, ir, lexer, parser, util::fmt::tree};

/// Each variant contains the input.
pub enum Test {
    ParserProgram(&'static str),
    ParserExpr(&'static str),
}

pub enum Assertion {
    TreeOk(&'static str),
    ExpectedErrors(&'static [&'static str]),
}

/// Runs the front end over the input, returning the printed tree (empty on
/// failure) and the formatted error, if any.
#[track_caller]
pub fn run_pipeline(test: Test) -> (String, Vec<String>) {
    let (input, is_program) = match test {
        Test::ParserProgram(input) => (input, true),
        Test::ParserExpr(input) => (input, false),
    };
    let lexemes = match lexer::lex(input) {
        Ok(lexemes) => lexemes,
        Err(error) => return (String::new(), vec![error.to_string()]),
    };
    let tree = if is_program {
        parser::parse_program(&lexemes).map(|root| tree::print_program_string(&root))
    } else {
        parser::parse_expr(&lexemes).map(|expr| tree::print_expr_string(&expr))
    };
    match tree {
        Ok(tree) => (tree, vec![]),
        Err(error) => (String::new(), vec![error.to_string()]),
    }
}

#[track_caller]
pub fn run_assertion(
    assertion: Assertion,
    formatted_actual_tree: &str,
    formatted_actual_errors: &[String],
) {
    match assertion {
        Assertion::TreeOk(expected_tree) => {
            let expected_errors: &[&str] = &[];
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
            ::pretty_assertions::assert_eq!(formatted_actual_tree.trim(), expected_tree.trim());
        }
        Assertion::ExpectedErrors(expected_errors) => {
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors)
        }
    }
}

/// Compiles a whole program into a fresh module named `test`, without an
/// entry stub.
pub fn compile(src: &str) -> Result<ir::Module, crate::Error> {
    let options = driver::Options {
        module_name: "test".into(),
        entry_stub: None,
        ..driver::Options::default()
    };
    driver::compile(src, &options)
}

/// Compiles and dumps the resulting module.
#[track_caller]
pub fn compile_to_ir(src: &str) -> String {
    match compile(src) {
        Ok(module) => module.to_string(),
        Err(error) => panic!("failed to compile: {error}\n{src}"),
    }
}

/// Compiles, expecting a code generation error.
#[track_caller]
pub fn compile_error(src: &str) -> String {
    match compile(src) {
        Ok(module) => panic!("expected an error, but compiled into:\n{module}"),
        Err(crate::Error::Compile(error)) => error.to_string(),
        Err(error) => panic!("expected a code generation error, got: {error}"),
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
                let (formatted_actual_tree, formatted_actual_errors) =
                    crate::util::test_utils::run_pipeline(test);
                let ctx = (&formatted_actual_tree, &formatted_actual_errors);
                tree_tests!(@@expand_assertions, ctx, [$($assertions_tt)*]);
            }
        )*
    };

    (@@expand_assertions, $ctx:expr, []) => {};
    (@@expand_assertions, $ctx:expr, [
        let $assertion:ident = $assertion_expected:expr;
        $($rest_assertions_tt:tt)*
    ]) => {
        crate::util::test_utils::run_assertion(
            tree_tests!(@@assertion, $assertion, $assertion_expected),
            $ctx.0,
            $ctx.1,
        );
        tree_tests!(@@expand_assertions, $ctx, [$($rest_assertions_tt)*]);
    };

    (@@assertion, tree_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeOk(::indoc::indoc! { $expected })
    };
    (@@assertion, expected_errors, $expected:expr) => {
        crate::util::test_utils::Assertion::ExpectedErrors($expected)
    };

    (@@get_test(parser, program), $source:expr) => {
        crate::util::test_utils::Test::ParserProgram($source)
    };
    (@@get_test(parser, expr), $source:expr) => {
        crate::util::test_utils::Test::ParserExpr($source)
    };
}
pub(crate) use tree_tests;
