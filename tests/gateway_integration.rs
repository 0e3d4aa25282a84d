// End-to-end tool behaviour against a real git repository

mod helpers;

use helpers::{Fixture, args};
use scopegate::gateway::ToolError;
use scopegate::security::SecurityError;
use std::fs;

#[test]
fn test_write_then_read_round_trip() {
    let fx = Fixture::new();
    let content = "library(ggplot2)\n\nplot_fof <- function(df) {\n  ggplot(df)\n}\n";

    fx.gateway
        .write_file("R-scripts/10_plot.R", content, "integrator")
        .unwrap();
    let read = fx.gateway.read_file("R-scripts/10_plot.R", "integrator").unwrap();
    assert_eq!(read, content);
}

#[test]
fn test_write_returns_diff_against_prior_content() {
    let fx = Fixture::new();

    let diff = fx
        .gateway
        .write_file("R-scripts/00_setup.R", "library(dplyr)\nlibrary(readr)\n", "integrator")
        .unwrap();
    assert!(diff.contains("--- a/R-scripts/00_setup.R"));
    assert!(diff.contains("+++ b/R-scripts/00_setup.R"));
    assert!(diff.contains("+library(readr)"));
    assert!(!diff.contains("-library(dplyr)"));
}

#[test]
fn test_second_identical_write_has_empty_diff() {
    let fx = Fixture::new();

    let first = fx
        .gateway
        .write_file("R-scripts/hello.R", "print('Hello')\n", "integrator")
        .unwrap();
    assert!(first.contains("+print('Hello')"));

    let second = fx
        .gateway
        .write_file("R-scripts/hello.R", "print('Hello')\n", "integrator")
        .unwrap();
    assert!(second.lines().all(|l| !l.starts_with('+') && !l.starts_with('-')));
    assert_eq!(second, "");
}

#[test]
fn test_write_denied_leaves_file_untouched() {
    let fx = Fixture::new();

    let err = fx
        .gateway
        .write_file("data/raw.csv", "tampered", "integrator")
        .unwrap_err();
    assert!(matches!(err, ToolError::Security(SecurityError::PermissionDenied { .. })));
    assert_eq!(fs::read_to_string(fx.root.join("data/raw.csv")).unwrap(), "id,age\n1,80\n");
}

#[test]
fn test_write_into_missing_directory_fails() {
    let fx = Fixture::new();

    let err = fx
        .gateway
        .write_file("R-scripts/new_dir/a.R", "x", "integrator")
        .unwrap_err();
    assert!(matches!(err, ToolError::ParentMissing(_)));
    assert!(!fx.root.join("R-scripts/new_dir").exists());
}

#[test]
fn test_read_missing_file() {
    let fx = Fixture::new();
    let err = fx.gateway.read_file("R-scripts/nope.R", "architect").unwrap_err();
    assert!(matches!(err, ToolError::NotFound(path) if path == "R-scripts/nope.R"));
}

#[test]
fn test_read_escape_is_security_error() {
    let fx = Fixture::new();
    let err = fx.gateway.read_file("../outside.txt", "architect").unwrap_err();
    assert!(matches!(err, ToolError::Security(SecurityError::PathEscape { .. })));
    assert!(!err.to_string().contains(&fx.root.display().to_string()));
}

#[test]
fn test_file_size_limits() {
    let fx = Fixture::with_config(|mut config| {
        config.max_file_bytes = 16;
        config
    });

    let err = fx
        .gateway
        .write_file("R-scripts/big.R", &"x".repeat(17), "integrator")
        .unwrap_err();
    assert!(matches!(err, ToolError::FileTooLarge { size: 17, limit: 16, .. }));

    fs::write(fx.root.join("R-scripts/huge.R"), "y".repeat(64)).unwrap();
    let err = fx.gateway.read_file("R-scripts/huge.R", "architect").unwrap_err();
    assert!(matches!(err, ToolError::FileTooLarge { size: 64, .. }));
}

#[test]
fn test_replace_in_file() {
    let fx = Fixture::new();
    fs::write(fx.root.join("R-scripts/zz_replace.txt"), "hello world\n").unwrap();

    let diff = fx
        .gateway
        .replace_in_file("R-scripts/zz_replace.txt", "world", "there", "integrator")
        .unwrap();
    assert!(diff.contains("+hello there"));
    assert!(diff.contains("-hello world"));
    assert_eq!(
        fs::read_to_string(fx.root.join("R-scripts/zz_replace.txt")).unwrap(),
        "hello there\n"
    );
}

#[test]
fn test_replace_in_file_failures() {
    let fx = Fixture::new();

    let err = fx
        .gateway
        .replace_in_file("R-scripts/00_setup.R", "tidyr", "x", "integrator")
        .unwrap_err();
    assert!(matches!(err, ToolError::SearchNotFound(_)));

    let err = fx
        .gateway
        .replace_in_file("R-scripts/missing.R", "a", "b", "integrator")
        .unwrap_err();
    assert!(matches!(err, ToolError::NotFound(_)));

    let err = fx
        .gateway
        .replace_in_file("R-scripts/00_setup.R", "", "b", "integrator")
        .unwrap_err();
    assert!(matches!(err, ToolError::InvalidArguments { .. }));

    let err = fx
        .gateway
        .replace_in_file("R-scripts/00_setup.R", "dplyr", "b", "architect")
        .unwrap_err();
    assert!(matches!(err, ToolError::Security(_)));
}

#[test]
fn test_list_files_sorted_with_directory_suffix() {
    let fx = Fixture::new();
    fs::write(fx.root.join("R-scripts/b.R"), "").unwrap();
    fs::write(fx.root.join("R-scripts/a.R"), "").unwrap();
    fs::create_dir_all(fx.root.join("R-scripts/helpers")).unwrap();

    let listing = fx.gateway.list_files("R-scripts", "architect").unwrap();
    assert_eq!(listing, "00_setup.R\na.R\nb.R\nhelpers/");
}

#[test]
fn test_list_repository_root() {
    let fx = Fixture::new();
    let listing = fx.gateway.list_files(".", "architect").unwrap();
    let entries: Vec<&str> = listing.lines().collect();
    assert!(entries.contains(&"R-scripts/"));
    assert!(entries.contains(&"data/"));
    assert!(entries.contains(&".git/"));
}

#[test]
fn test_list_files_errors() {
    let fx = Fixture::new();

    let err = fx.gateway.list_files("data/raw.csv", "architect").unwrap_err();
    assert!(matches!(err, ToolError::NotADirectory(_)));
    assert!(err.to_string().contains("not a directory"));

    let err = fx.gateway.list_files("nowhere", "architect").unwrap_err();
    assert!(matches!(err, ToolError::NotFound(_)));

    let err = fx.gateway.list_files(".git", "integrator").unwrap_err();
    assert!(matches!(err, ToolError::Security(SecurityError::NeverTouch { .. })));
}

#[test]
fn test_run_git_status_any_role() {
    let fx = Fixture::new();
    for role in helpers::ROLES {
        let out = fx.gateway.run_git(&args(&["status"]), role).unwrap();
        assert!(out.contains("On branch"), "{role}: {out}");
    }
}

#[test]
fn test_run_git_checkout_rules() {
    let fx = Fixture::new();

    let err = fx
        .gateway
        .run_git(&args(&["checkout", "main"]), "integrator")
        .unwrap_err();
    assert!(matches!(
        err,
        ToolError::Security(SecurityError::CheckoutRequiresNewBranch { .. })
    ));

    let out = fx
        .gateway
        .run_git(&args(&["checkout", "-b", "feature"]), "integrator")
        .unwrap();
    assert!(!out.starts_with("Git Error"), "{out}");

    let status = fx.gateway.run_git(&args(&["status"]), "architect").unwrap();
    assert!(status.contains("On branch feature"));
}

#[test]
fn test_integrator_commit_flow() {
    let fx = Fixture::new();

    fx.gateway
        .write_file("R-scripts/smoke_test_hello.R", "print('Hello')\n", "integrator")
        .unwrap();
    fx.gateway
        .run_git(&args(&["add", "R-scripts/smoke_test_hello.R"]), "integrator")
        .unwrap();
    let out = fx
        .gateway
        .run_git(&args(&["commit", "-m", "Add hello script"]), "integrator")
        .unwrap();
    assert!(!out.starts_with("Git Error"), "{out}");

    let log = fx
        .gateway
        .run_git(&args(&["log", "--oneline"]), "quality_gate")
        .unwrap();
    assert!(log.contains("Add hello script"));
}

#[test]
fn test_run_git_failure_is_a_result() {
    let fx = Fixture::new();

    // Unknown option makes git exit non-zero
    let out = fx
        .gateway
        .run_git(&args(&["diff", "--no-such-flag"]), "architect")
        .unwrap();
    assert!(out.starts_with("Git Error: "), "{out}");
}

#[test]
fn test_run_git_denied_for_read_only_roles() {
    let fx = Fixture::new();
    let err = fx
        .gateway
        .run_git(&args(&["add", "."]), "quality_gate")
        .unwrap_err();
    assert!(matches!(err, ToolError::Security(SecurityError::GitRoleDenied { .. })));
    assert!(err.to_string().contains("quality_gate"));
}

#[test]
fn test_run_git_unknown_role_denied() {
    let fx = Fixture::new();

    let err = fx
        .gateway
        .run_git(&args(&["log", "--oneline"]), "intruder")
        .unwrap_err();
    assert!(matches!(
        err,
        ToolError::Security(SecurityError::UnknownRole(ref role)) if role == "intruder"
    ));

    let err = fx
        .gateway
        .read_file("R-scripts/00_setup.R", "intruder")
        .unwrap_err();
    assert!(matches!(err, ToolError::Security(SecurityError::UnknownRole(_))));
}

#[test]
fn test_denials_name_the_role() {
    let fx = Fixture::new();

    let err = fx.gateway.read_file("../outside.txt", "quality_gate").unwrap_err();
    assert!(err.to_string().contains("quality_gate"), "{err}");

    let err = fx.gateway.run_git(&args(&["push"]), "quality_gate").unwrap_err();
    assert!(err.to_string().contains("quality_gate"), "{err}");
    assert!(err.to_string().contains("push"));
}
