use inkwell::context::Context;
use loomc_util::Handler;

use crate::compile_module;

fn compile(source: &str) -> (Option<String>, usize) {
    let context = Context::create();
    let handler = Handler::new();
    let module = compile_module(&context, "test", source, &handler);
    (module.map(|m| m.print_to_string().to_string()), handler.error_count())
}

#[test]
fn function_call_and_arithmetic_reach_print() {
    let (ir, errors) = compile("fun f()\n\treturn 41+1\nprint(f())\n");
    assert_eq!(errors, 0);
    let ir = ir.expect("no errors means a module is produced");
    assert!(ir.contains("define double @f("));
    assert!(ir.contains("call double @print("));
    assert!(ir.contains("call double @f("));
}

#[test]
fn top_level_declarations_and_arithmetic() {
    let (ir, errors) = compile("let x = 3\nlet y = 4\nprint(x*x + y*y)\n");
    assert_eq!(errors, 0);
    let ir = ir.unwrap();
    assert!(ir.contains("fmul"));
    assert!(ir.contains("fadd"));
    assert!(ir.contains("call double @print("));
}

#[test]
fn function_parameters_and_return() {
    let source = "fun sum3(a,b,c)\n\tlet t = a+b+c\n\treturn t\nprint(sum3(1,2,3))\n";
    let (ir, errors) = compile(source);
    assert_eq!(errors, 0);
    let ir = ir.unwrap();
    assert!(ir.contains("define double @sum3(double %a, double %b, double %c)"));
}

#[test]
fn array_blit_copies_via_memcpy() {
    let source = "let a[2] = [1,2]\nlet b[2]\nb = a\nprint(b[1])\n";
    let (ir, errors) = compile(source);
    assert_eq!(errors, 0);
    let ir = ir.unwrap();
    assert!(ir.contains("llvm.memcpy"));
    assert!(ir.contains("getelementptr"));
}

#[test]
fn for_loop_accumulates_into_a_scalar() {
    let source = "let s = 0\nfor let i=1 to 4\n\ts = s + i\nprint(s)\n";
    let (ir, errors) = compile(source);
    assert_eq!(errors, 0);
    let ir = ir.unwrap();
    assert!(ir.contains("for.body"));
    assert!(ir.contains("for.inc"));
    assert!(ir.contains("for.exit"));
}

#[test]
fn undeclared_name_reports_exactly_one_error_and_no_module() {
    let (ir, errors) = compile("let a = b+1\n");
    assert_eq!(errors, 1);
    assert!(ir.is_none());
}

#[test]
fn break_outside_loop_is_reported() {
    let (ir, errors) = compile("break\n");
    assert_eq!(errors, 1);
    assert!(ir.is_none());
}

#[test]
fn break_inside_while_jumps_to_the_exit_block() {
    let source = "let i = 0\nwhile true\n\tif i == 3\n\t\tbreak\n\ti = i + 1\nprint(i)\n";
    let (ir, errors) = compile(source);
    assert_eq!(errors, 0);
    let ir = ir.unwrap();
    assert!(ir.contains("while.exit"));
    assert!(ir.contains("br label %while.exit"));
}

#[test]
fn repeat_until_branches_true_to_entry_and_false_to_exit() {
    let source = "let i = 0\nrepeat\n\ti = i + 1\nuntil i == 3\nprint(i)\n";
    let (ir, errors) = compile(source);
    assert_eq!(errors, 0);
    let ir = ir.unwrap();
    assert!(ir.contains("repeat.entry"));
    assert!(ir.contains("repeat.exit"));
    assert!(ir.contains("label %repeat.entry, label %repeat.exit"));
}

#[test]
fn function_missing_a_return_is_reported() {
    let (_, errors) = compile("fun f()\n\tlet x = 1\nprint(f())\n");
    assert_eq!(errors, 1);
}

#[test]
fn scalar_arithmetic_on_an_array_is_rejected() {
    let source = "let a[2] = [1,2]\nlet x = a + 1\n";
    let (ir, errors) = compile(source);
    assert_eq!(errors, 1);
    assert!(ir.is_none());
}

#[test]
fn calling_an_unknown_function_is_reported() {
    let (_, errors) = compile("print(missing())\n");
    assert_eq!(errors, 1);
}

#[test]
fn wrong_argument_count_is_reported() {
    let source = "fun f(a, b)\n\treturn a+b\nprint(f(1))\n";
    let (_, errors) = compile(source);
    assert_eq!(errors, 1);
}

#[test]
fn every_emitted_module_declares_the_runtime_stubs() {
    let (ir, _) = compile("print(1)\n");
    let ir = ir.unwrap();
    assert!(ir.contains("declare i32 @printf"));
    assert!(ir.contains("declare i32 @scanf"));
    assert!(ir.contains("define double @print(double"));
    assert!(ir.contains("define double @read("));
}

#[test]
fn main_returns_zero() {
    let (ir, _) = compile("print(1)\n");
    let ir = ir.unwrap();
    assert!(ir.contains("define i32 @main()"));
    assert!(ir.contains("ret i32 0"));
}
