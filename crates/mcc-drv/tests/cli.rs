//! End-to-end tests driving the built `mcc` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn mcc() -> Command {
    Command::cargo_bin("mcc").unwrap()
}

fn write_source(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn build_compiles_a_valid_program_and_writes_assembly() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "prog.c", "void main(void) { int x; x = 5; output(x); }");
    let out = dir.path().join("prog.s");

    mcc()
        .arg("build")
        .arg(&source)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let asm = fs::read_to_string(&out).unwrap();
    assert!(asm.contains("main:"));
    assert!(asm.contains(".data"));
}

#[test]
fn build_reports_a_missing_semicolon_as_a_syntax_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "prog.c", "void main(void) { int x; x = 5 output(x); }");
    let out = dir.path().join("prog.s");

    mcc()
        .arg("build")
        .arg(&source)
        .arg("-o")
        .arg(&out)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Syntax"));

    assert!(!out.exists());
}

#[test]
fn check_accepts_a_minimal_int_main() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "prog.c", "int main(void) { return 0; }");

    mcc()
        .arg("check")
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"));
}

#[test]
fn build_passes_an_array_through_a_function_parameter() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(
        &dir,
        "prog.c",
        "int f(int a[], int n) { return a[0]; } \
         void main(void) { int v[3]; v[0]=7; v[1]=0; v[2]=0; output(f(v,3)); }",
    );
    let out = dir.path().join("prog.s");

    mcc().arg("build").arg(&source).arg("-o").arg(&out).assert().success();
    assert!(out.exists());
}

#[test]
fn build_emits_distinct_labels_for_a_while_loop() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(
        &dir,
        "prog.c",
        "void main(void) { int i; i = 0; while (i < 3) { output(i); i = i + 1; } }",
    );
    let out = dir.path().join("prog.s");

    mcc().arg("build").arg(&source).arg("-o").arg(&out).assert().success();
    let asm = fs::read_to_string(&out).unwrap();
    assert!(asm.contains("while_entry_0"));
    assert!(asm.contains("while_exit_0"));
}

#[test]
fn check_rejects_a_duplicate_main_declaration() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(
        &dir,
        "prog.c",
        "int main(void) { return 1; } int main(void) { return 2; }",
    );

    mcc()
        .arg("check")
        .arg(&source)
        .assert()
        .failure()
        .stdout(predicate::str::contains("redeclaration"));
}

#[test]
fn emit_tokens_runs_only_the_lexer() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "prog.c", "int x;");

    mcc()
        .arg("--emit-tokens")
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("int"));
}

#[test]
fn emit_ast_runs_the_lexer_and_parser() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "prog.c", "void main(void) { output(1); }");

    mcc()
        .arg("--emit-ast")
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("(fun main"));
}

#[test]
fn missing_input_file_is_an_internal_failure_not_a_diagnostic() {
    mcc()
        .arg("check")
        .arg("/no/such/file.c")
        .assert()
        .code(2);
}
