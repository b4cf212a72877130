// Regression tests for the `acid` binary: parse output and miette diagnostics.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

/// Writes `source` to a scratch file unique to the calling test.
fn scratch_file(name: &str, source: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("acid-cli-{}-{name}", std::process::id()));
    fs::write(&path, source).unwrap();
    path
}

#[test]
fn cli_prints_ast_in_acid_syntax() {
    let file = scratch_file("ok.acid", "(define inc (lambda (n) (add n 1)))\n(inc 41)\n");

    Command::cargo_bin("acid")
        .unwrap()
        .arg("ast")
        .arg(&file)
        .assert()
        .success()
        .stdout("(define inc (lambda (n) (add n 1)))\n(inc 41)\n");

    let _ = fs::remove_file(file);
}

#[test]
fn cli_prints_ast_as_json() {
    let file = scratch_file("json.acid", "(define x \"a\\nb\")");

    Command::cargo_bin("acid")
        .unwrap()
        .args(["ast", "--json"])
        .arg(&file)
        .assert()
        .success()
        .stdout(contains("\"Declaration\"").and(contains("\"a\\nb\"")));

    let _ = fs::remove_file(file);
}

#[test]
fn cli_reports_miette_diagnostics_on_error() {
    let file = scratch_file("bad.acid", "(print x 42" /* missing closing paren */);

    Command::cargo_bin("acid")
        .unwrap()
        .arg("ast")
        .arg(&file)
        .assert()
        .failure()
        .stderr(contains("acid::parse").and(contains("Unexpected EOF")));

    let _ = fs::remove_file(file);
}

#[test]
fn cli_check_reports_every_file() {
    let good = scratch_file("good.acid", "(f 1)");
    let bad = scratch_file("worse.acid", "(define 5 x)");

    Command::cargo_bin("acid")
        .unwrap()
        .arg("--furthest-error")
        .arg("check")
        .arg(&good)
        .arg(&bad)
        .assert()
        .failure()
        .stdout(contains("ok"))
        .stderr(contains("Expected ATOM, got INT_LITERAL").and(contains("1 of 2 file(s)")));

    let _ = fs::remove_file(good);
    let _ = fs::remove_file(bad);
}

#[test]
fn cli_check_survives_runaway_nesting() {
    let depth = 20_000;
    let deep = scratch_file(
        "deep.acid",
        &format!("{}x{}", "(f ".repeat(depth), ")".repeat(depth)),
    );
    let good = scratch_file("after-deep.acid", "(g 2)");

    Command::cargo_bin("acid")
        .unwrap()
        .arg("check")
        .arg(&deep)
        .arg(&good)
        .assert()
        .code(1)
        .stdout(contains("after-deep.acid"))
        .stderr(contains("maximum depth").and(contains("1 of 2 file(s)")));

    let _ = fs::remove_file(deep);
    let _ = fs::remove_file(good);
}

#[test]
fn cli_lists_tokens() {
    let file = scratch_file("tokens.acid", "(lambda (x) x)");

    Command::cargo_bin("acid")
        .unwrap()
        .arg("tokens")
        .arg(&file)
        .assert()
        .success()
        .stdout(contains("LAMBDA").and(contains("RPAREN")));

    let _ = fs::remove_file(file);
}

#[test]
fn cli_missing_file_fails() {
    Command::cargo_bin("acid")
        .unwrap()
        .args(["ast", "definitely/not/here.acid"])
        .assert()
        .failure()
        .stderr(contains("Could not read"));
}

#[test]
fn cli_repl_parses_piped_lines() {
    Command::cargo_bin("acid")
        .unwrap()
        .arg("repl")
        .write_stdin("(add 1 2)\n(define y\n  3)\n:q\n")
        .assert()
        .success()
        .stdout(
            contains("expr (add 1 2)")
                .and(contains("stmt (define y 3)"))
                .and(contains("Goodbye!")),
        );
}
