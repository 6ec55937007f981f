//! Behaviour-driven tests for the `prepare-ctan-upload` binary.
//!
//! These scenarios run the real binary. Only paths that never reach the LaTeX
//! compiler are exercised, so no TeX installation is needed.

mod support;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use std::process::{Command, Output};
use support::SourceTree;

#[derive(Default)]
struct CliWorld {
    args: RefCell<Vec<String>>,
    output: RefCell<Option<Output>>,
    expected_archive: RefCell<Option<String>>,
    missing_dir: RefCell<Option<String>>,
    tree: RefCell<Option<SourceTree>>,
}

#[fixture]
fn cli_world() -> CliWorld {
    CliWorld::default()
}

/// Helper function to retrieve the command output from the CLI world.
fn get_output(cli_world: &CliWorld) -> std::cell::Ref<'_, Output> {
    let output = cli_world.output.borrow();
    std::cell::Ref::map(output, |opt| opt.as_ref().expect("output not set"))
}

#[given("a complete package source directory on disk")]
fn given_source_tree(cli_world: &CliWorld) {
    cli_world.tree.replace(Some(SourceTree::complete()));
}

#[given("the packager is invoked with dry-run")]
fn given_dry_run_args(cli_world: &CliWorld) {
    let tree = cli_world.tree.borrow();
    let tree = tree.as_ref().expect("source tree not set");
    let base = tree.root.join("upload").join("twoxtwogame-1.0");

    cli_world
        .expected_archive
        .replace(Some(format!("{base}.zip")));
    cli_world.args.replace(vec![
        "--dry-run".to_owned(),
        "--source-dir".to_owned(),
        tree.source_dir.to_string(),
        "--dir".to_owned(),
        base.to_string(),
    ]);
}

#[given("the packager is invoked with a missing source directory")]
fn given_missing_source_dir(cli_world: &CliWorld) {
    let tree = SourceTree::complete();
    let missing = tree.root.join("does-not-exist").to_string();
    cli_world.missing_dir.replace(Some(missing.clone()));
    cli_world.args.replace(vec![
        "--source-dir".to_owned(),
        missing,
        "--dir".to_owned(),
        tree.root.join("out").to_string(),
    ]);
    cli_world.tree.replace(Some(tree));
}

#[when("the packager CLI is run")]
fn when_packager_cli_run(cli_world: &CliWorld) {
    let args = cli_world.args.borrow();
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_prepare-ctan-upload"));
    cmd.args(args.iter());
    cmd.env_remove("RUST_LOG");

    let output = cmd.output().expect("failed to run prepare-ctan-upload");
    cli_world.output.replace(Some(output));
}

#[then("the CLI exits successfully")]
fn then_cli_exits_successfully(cli_world: &CliWorld) {
    let output = get_output(cli_world);
    assert!(
        output.status.success(),
        "expected success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[then("the CLI exits with an error")]
fn then_cli_exits_with_error(cli_world: &CliWorld) {
    let output = get_output(cli_world);
    assert_eq!(output.status.code(), Some(1));
}

#[then("the plan names the archive path")]
fn then_plan_names_archive(cli_world: &CliWorld) {
    let expected = cli_world.expected_archive.borrow();
    let expected = expected.as_ref().expect("expected archive not set");
    let output = get_output(cli_world);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(stderr.contains("Dry run - no files will be written"));
    assert!(stderr.contains(&format!("Archive: {expected}")));
    assert!(stderr.contains("twoxtwogame.sty (found)"));
    assert!(stderr.contains("pdflatex --shell-escape"));
}

#[then("no archive is written by the CLI")]
fn then_no_archive_written(cli_world: &CliWorld) {
    let expected = cli_world.expected_archive.borrow();
    let expected = expected.as_ref().expect("expected archive not set");
    assert!(!std::path::Path::new(expected).exists());

    let tree = cli_world.tree.borrow();
    let tree = tree.as_ref().expect("source tree not set");
    assert!(!tree.root.join("upload").exists());
}

#[then("the error names the source directory")]
fn then_error_names_source_dir(cli_world: &CliWorld) {
    let missing = cli_world.missing_dir.borrow();
    let missing = missing.as_ref().expect("missing dir not set");
    let output = get_output(cli_world);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(stderr.contains("error: source directory unavailable"));
    assert!(stderr.contains(missing.as_str()));
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(path = "tests/features/cli.feature", index = 0)]
fn scenario_dry_run_prints_plan(cli_world: CliWorld) {
    let _ = cli_world;
}

#[scenario(path = "tests/features/cli.feature", index = 1)]
fn scenario_missing_source_dir(cli_world: CliWorld) {
    let _ = cli_world;
}
