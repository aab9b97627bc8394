use crate::{
    codegen::interface::Backend,
    driver,
    util::test_utils::{compile, compile_error, compile_to_ir},
};
use indoc::indoc;
use pretty_assertions::assert_eq;

#[test]
fn returns_a_parameter() {
    assert_eq!(
        compile_to_ir("fn hello (arg1: int) -> int { arg1 }"),
        indoc! {"
            ; ModuleID = 'test'

            define i32 @hello(i32 %arg1) {
            entry:
              ret i32 %arg1
            }
        "}
    );
}

#[test]
fn locals_live_in_slots_and_operands_widen() {
    assert_eq!(
        compile_to_ir("fn add(a: int, b: int8) -> int { val c = a + b; c }"),
        indoc! {"
            ; ModuleID = 'test'

            define i32 @add(i32 %a, i8 %b) {
            entry:
              %sext = sext i8 %b to i32
              %add = add i32 %a, %sext
              %c = alloca i32
              store i32 %add, i32* %c
              %load = load i32, i32* %c
              ret i32 %load
            }
        "}
    );
}

#[test]
fn integers_meet_floats_as_floats() {
    assert_eq!(
        compile_to_ir("fn scale(a: int, b: double) -> double { a * b }"),
        indoc! {"
            ; ModuleID = 'test'

            define double @scale(i32 %a, double %b) {
            entry:
              %sitofp = sitofp i32 %a to double
              %fmul = fmul double %sitofp, %b
              ret double %fmul
            }
        "}
    );
}

#[test]
fn negates_floats() {
    let ir = compile_to_ir("fn flip(a: double) -> double { -a }");
    assert!(ir.contains("%fneg = fneg double %a\n  ret double %fneg"), "{ir}");
}

#[test]
fn strings_decay_to_byte_pointers() {
    assert_eq!(
        compile_to_ir(r#"fn greet() -> string { "hi" }"#),
        indoc! {r#"
            ; ModuleID = 'test'

            @string = internal constant [3 x i8] c"hi\00"

            define i8* @greet() {
            entry:
              %bitcast = bitcast [3 x i8]* @string to i8*
              ret i8* %bitcast
            }
        "#}
    );
}

#[test]
fn constants_narrow_when_they_fit() {
    let ir = compile_to_ir("fn small() -> int8 { 100 }");
    assert!(ir.contains("ret i8 100"), "{ir}");

    assert_eq!(
        compile_error("fn big() -> int8 { 300 }"),
        "1:20: value of type 'i32' is too big for target type 'i8'"
    );
}

#[test]
fn runtime_values_never_narrow() {
    assert_eq!(
        compile_error("fn narrow(a: int) -> int8 { a }"),
        "1:29: value of type 'i32' is too big for target type 'i8'"
    );
}

#[test]
fn tuples_return_aggregates() {
    assert_eq!(
        compile_to_ir("fn pair() -> int, double { (1, 2.5) }"),
        indoc! {"
            ; ModuleID = 'test'

            define { i32, double } @pair() {
            entry:
              ret { i32, double } { i32 1, double 2.5 }
            }
        "}
    );
    assert_eq!(
        compile_error("fn pair() -> int, double { 1 }"),
        "1:4: function 'pair' returns 2 values, but only 1 were produced"
    );
}

#[test]
fn missing_return_value() {
    assert_eq!(
        compile_error("fn f() -> int { }"),
        "1:4: function 'f' must return a value of type 'int'"
    );
}

#[test]
fn tuple_elements_are_loaded_then_cast() {
    assert_eq!(
        compile_to_ir("fn f() -> int, int { val a = 1; val b: int8 = 2; a; b }"),
        indoc! {"
            ; ModuleID = 'test'

            define { i32, i32 } @f() {
            entry:
              %a = alloca i32
              store i32 1, i32* %a
              %b = alloca i8
              store i8 2, i8* %b
              %load = load i8, i8* %b
              %sext = sext i8 %load to i32
              %load1 = load i32, i32* %a
              ret { i32, i32 } { i32 %load1, i32 %sext }
            }
        "}
    );
}

#[test]
fn explicit_void_returns_ignore_the_stack() {
    let expected = indoc! {"
        ; ModuleID = 'test'

        define void @f() {
        entry:
          ret void
        }
    "};
    assert_eq!(compile_to_ir("fn f() -> void { }"), expected);
    assert_eq!(compile_to_ir("fn f() -> void { 1 }"), expected);
}

#[test]
fn globals_take_constant_initializers() {
    let source = "val limit: int8 = 100; var counter = -5; \
                  fn get() -> int { counter = counter + limit; counter }";
    assert_eq!(
        compile_to_ir(source),
        indoc! {"
            ; ModuleID = 'test'

            @limit = internal constant i8 100
            @counter = internal global i32 -5

            define i32 @get() {
            entry:
              %load = load i32, i32* @counter
              %load1 = load i8, i8* @limit
              %sext = sext i8 %load1 to i32
              %add = add i32 %load, %sext
              store i32 %add, i32* @counter
              %load2 = load i32, i32* @counter
              ret i32 %load2
            }
        "}
    );
}

#[test]
fn global_initializers_must_be_literals() {
    let error = compile_error("val a = 1 + 2");
    assert!(
        error.ends_with("initializer of global 'a' must be a number literal"),
        "{error}"
    );
}

#[test]
fn expressions_need_a_function() {
    assert_eq!(
        compile_error("1 + 2;"),
        "1:1: expressions are only allowed inside functions"
    );
}

#[test]
fn functions_may_be_called_before_their_definition() {
    assert_eq!(
        compile_to_ir("fn a() -> int { b() } fn b() -> int { 1 }"),
        indoc! {"
            ; ModuleID = 'test'

            define i32 @a() {
            entry:
              %call = call i32 @b()
              ret i32 %call
            }

            define i32 @b() {
            entry:
              ret i32 1
            }
        "}
    );
}

#[test]
fn call_arguments_are_checked() {
    let error = compile_error("fn f(a: int) -> int { a } fn g() -> int { f(1, 2) }");
    assert!(
        error.ends_with("function 'f' takes 1 argument, but 2 were given"),
        "{error}"
    );

    let error = compile_error("fn g() -> int { h() }");
    assert!(error.ends_with("call to undefined function 'h'"), "{error}");

    let error = compile_error("fn g() -> int { val x = 1; x() }");
    assert!(error.ends_with("'x' is not callable"), "{error}");
}

#[test]
fn redefinitions_are_rejected() {
    assert_eq!(
        compile_error("fn f() { val x = 1; val x = 2 }"),
        "1:25: redefinition of 'x', previously defined at 1:14"
    );
    assert_eq!(
        compile_error("fn f() { } fn f() { }"),
        "1:15: redefinition of function 'f', previously defined at 1:4"
    );
}

#[test]
fn inner_blocks_shadow() {
    assert_eq!(
        compile_to_ir("fn f() -> int { val x = 1; { val x = 2.5; }; x }"),
        indoc! {"
            ; ModuleID = 'test'

            define i32 @f() {
            entry:
              %x = alloca i32
              store i32 1, i32* %x
              %x1 = alloca double
              store double 2.5, double* %x1
              %load = load i32, i32* %x
              ret i32 %load
            }
        "}
    );
}

#[test]
fn block_results_are_read_on_exit() {
    let ir = compile_to_ir("fn f() -> int { { var y = 3; y } }");
    assert!(
        ir.contains("%load = load i32, i32* %y\n  ret i32 %load"),
        "{ir}"
    );
}

#[test]
fn block_captures_bind_values() {
    assert_eq!(
        compile_to_ir("fn f() -> int { var x = 1; [x] { x } }"),
        indoc! {"
            ; ModuleID = 'test'

            define i32 @f() {
            entry:
              %x = alloca i32
              store i32 1, i32* %x
              %load = load i32, i32* %x
              ret i32 %load
            }
        "}
    );

    let error = compile_error("fn f() { var x = 1; [x] { x = 2 } }");
    assert!(
        error.ends_with("cannot assign to immutable variable 'x'"),
        "{error}"
    );
}

#[test]
fn assignments_respect_mutability() {
    let error = compile_error("val limit = 1; fn f() { limit = 2 }");
    assert!(
        error.ends_with("cannot assign to immutable variable 'limit'"),
        "{error}"
    );

    let ir = compile_to_ir("fn f() -> int8 { var x: int8 = 1; x = 7; x }");
    assert!(ir.contains("store i8 7, i8* %x"), "{ir}");
}

#[test]
fn nested_functions_are_named_after_their_owner() {
    assert_eq!(
        compile_to_ir("fn outer() -> int { fn inner(a: int) -> int { a } inner(2) }"),
        indoc! {"
            ; ModuleID = 'test'

            define i32 @outer() {
            entry:
              %call = call i32 @outer.inner(i32 2)
              ret i32 %call
            }

            define i32 @outer.inner(i32 %a) {
            entry:
              ret i32 %a
            }
        "}
    );
}

#[test]
fn nested_functions_cannot_reach_outer_locals() {
    assert_eq!(
        compile_error("fn outer(x: int) -> int { fn inner() -> int { x } inner() }"),
        "1:47: variable 'x' belongs to an enclosing function"
    );
}

#[test]
fn unsupported_operators() {
    let error = compile_error("fn f(a: int, b: int) -> bool { a < b }");
    assert!(
        error.ends_with("operator '<' is not supported between 'i32' and 'i32'"),
        "{error}"
    );

    let error = compile_error("fn f(a: int) -> int { !a }");
    assert!(
        error.ends_with("operator '!' is not supported for 'i32'"),
        "{error}"
    );

    let ir = compile_to_ir("fn f(a: int) -> int { ~a }");
    assert!(ir.contains("%not = xor i32 %a, -1"), "{ir}");
}

#[test]
fn misc_rejections() {
    assert_eq!(
        compile_error("fn f(a) { }"),
        "1:6: parameter 'a' of function 'f' has no type"
    );
    assert_eq!(
        compile_error("fn g() -> int { missing }"),
        "1:17: use of undefined variable 'missing'"
    );

    let error = compile_error("fn g() { val f = (a) => a }");
    assert!(error.ends_with("lambda expressions are not supported yet"), "{error}");

    let error = compile_error("fn g() { val xs = [1, 2] }");
    assert!(error.ends_with("list expressions are not supported yet"), "{error}");

    let error = compile_error("fn f() { val x = (1, 2) }");
    assert!(
        error.ends_with("expression produces several values where one is expected"),
        "{error}"
    );
}

#[test]
fn entry_stub_calls_main() {
    let module = driver::compile("fn main() -> int { 0 }", &driver::Options::default()).unwrap();
    assert!(module.function_named("main").is_some());
    let ir = module.to_string();
    assert!(
        ir.contains(indoc! {"
            define i32 @__lore_entrypoint__() {
            entry:
              %call = call i32 @main()
              ret i32 %call
            }
        "}),
        "{ir}"
    );

    let module =
        driver::compile("fn main() -> double { 1.5 }", &driver::Options::default()).unwrap();
    assert!(module.to_string().contains("ret i32 0"));
}

#[test]
fn entry_stub_without_main_returns_zero() {
    let module = driver::compile("fn helper() { }", &driver::Options::default()).unwrap();
    let ir = module.to_string();
    assert!(
        ir.contains("define i32 @__lore_entrypoint__() {\nentry:\n  ret i32 0\n}"),
        "{ir}"
    );
}

#[test]
fn compile_keeps_the_module_name() {
    let module = compile("fn f() { }").unwrap();
    assert_eq!(module.name(), "test");
}
