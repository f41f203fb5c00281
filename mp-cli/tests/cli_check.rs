use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

const ORDER: &str = r#"{"kind":"Order","tags":{"status":"open"},"attrs":{"total":"12"}}"#;

fn mp() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("mp").unwrap()
}

#[test]
fn mt_passes_and_echoes() {
    mp().args(["mt", "--kind", "Order", "--tags", "status=open", "--attrs", "total=12"])
        .write_stdin(ORDER)
        .assert()
        .success()
        .stdout(ORDER);
}

#[test]
fn mt_fin_prints_nothing() {
    mp().args(["mt", "--kind", "Order", "--fin"])
        .write_stdin(ORDER)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn mt_mismatch_exits_1() {
    mp().args(["mt", "--tags", "status=closed"])
        .write_stdin(ORDER)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("tag status=\"open\", expected status=\"closed\""));
}

#[test]
fn mj_checks_fields_and_scalars() {
    mp().args(["mj", "--attrs", "name=mp", "--ints", "count=3,depth=-1", "--fin"])
        .write_stdin(r#"{"name":"mp","count":3,"depth":-1}"#)
        .assert()
        .success();

    mp().args(["mj", "--int", "7"])
        .write_stdin("7")
        .assert()
        .success()
        .stdout("7");

    mp().args(["mj", "--str", "done", "--fin"])
        .write_stdin(r#""pending""#)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("expected \"done\""));
}

#[test]
fn bad_pair_is_a_usage_error() {
    mp().args(["mt", "--tags", "novalue"])
        .write_stdin(ORDER)
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected key=value"));
}

#[test]
fn reads_document_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("order.json");
    fs::write(&path, ORDER)?;

    mp().args(["mt", "--kind", "Order", "--input"])
        .arg(&path)
        .assert()
        .success()
        .stdout(ORDER);
    Ok(())
}
