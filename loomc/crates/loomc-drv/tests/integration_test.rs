use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn loomc() -> Command {
    Command::cargo_bin("loomc").expect("binary built by the workspace")
}

#[test]
fn compiles_a_well_formed_program_and_writes_ll_next_to_the_cwd() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("hello.txt");
    fs::write(&input, "fun f()\n\treturn 41+1\nprint(f())\n").unwrap();

    loomc().arg(&input).current_dir(dir.path()).assert().success();

    let output = dir.path().join("hello.ll");
    assert!(output.exists());
    let ir = fs::read_to_string(output).unwrap();
    assert!(ir.contains("define double @f("));
}

#[test]
fn non_txt_extensions_are_preserved_in_the_output_name() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("hello.src");
    fs::write(&input, "print(1)\n").unwrap();

    loomc().arg(&input).current_dir(dir.path()).assert().success();

    assert!(dir.path().join("hello.src.ll").exists());
}

#[test]
fn an_undeclared_name_reports_and_skips_writing_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.txt");
    fs::write(&input, "let a = b+1\n").unwrap();

    loomc()
        .arg(&input)
        .current_dir(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("error:1: using of undeclared 'b'"))
        .stderr(predicate::str::contains("1 error(s) generated"));

    assert!(!dir.path().join("bad.ll").exists());
}

#[test]
fn missing_file_exits_with_failure() {
    loomc().arg("/nonexistent/path.txt").assert().failure().code(1);
}

#[test]
fn zero_or_many_arguments_is_a_usage_error() {
    loomc().assert().failure().code(1);
    loomc().arg("a.txt").arg("b.txt").assert().failure().code(1);
}
