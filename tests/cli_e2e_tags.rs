//! End-to-end tests for the `tag-compare tags` command.
//!
//! These tests build real git repositories in temporary directories and
//! invoke the binary against them.

mod common;
use common::prelude::*;

#[test]
fn test_tags_help() {
    let mut cmd = cargo_bin_cmd!("tag-compare");
    cmd.arg("tags")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--tag-filter"))
        .stdout(predicate::str::contains("--strict-versions"));
}

#[test]
fn test_tags_lists_newest_first() {
    let Some(repo) = GitFixture::standard() else {
        return;
    };

    let output = repo.command().arg("tags").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let names: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split('\t').next())
        .collect();
    assert_eq!(names, vec!["app-v3", "app-v2", "app-v1"]);
}

#[test]
fn test_tags_orders_numerically() {
    let Some(repo) = GitFixture::new() else {
        return;
    };
    let repo = repo
        .with_file("f.txt", "1")
        .commit_and_tag("2.9-v9")
        .with_file("f.txt", "2")
        .commit_and_tag("2.10-v10")
        .with_file("f.txt", "3")
        .commit_and_tag("2.10-v100");

    let output = repo.command().arg("tags").output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let names: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split('\t').next())
        .collect();
    assert_eq!(names, vec!["2.10-v100", "2.10-v10", "2.9-v9"]);
}

#[test]
fn test_tags_json() {
    let Some(repo) = GitFixture::standard() else {
        return;
    };

    let output = repo.command().args(["tags", "--json"]).output().unwrap();
    assert!(output.status.success());

    let tags: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let tags = tags.as_array().unwrap();
    assert_eq!(tags.len(), 3);
    assert_eq!(tags[0]["name"], "app-v3");
    assert_eq!(tags[0]["ordinal"], 3);
    assert_eq!(tags[2]["commit"].as_str().unwrap().len(), 40);
}

#[test]
fn test_tags_filter() {
    let Some(repo) = GitFixture::standard() else {
        return;
    };
    let repo = repo.with_file("x.txt", "x").commit_and_tag("other-v10");

    repo.command()
        .args(["tags", "--tag-filter", "^app-"])
        .assert()
        .success()
        .stdout(predicate::str::contains("app-v1"))
        .stdout(predicate::str::contains("other-v10").not());
}

#[test]
fn test_tags_filter_matching_nothing() {
    let Some(repo) = GitFixture::standard() else {
        return;
    };

    repo.command()
        .args(["tags", "--tag-filter", "^release-"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No tags found"))
        .stderr(predicate::str::contains("--tag-filter"));
}

#[test]
fn test_tags_repository_without_tags() {
    let Some(repo) = GitFixture::new() else {
        return;
    };
    let repo = repo.with_file("f.txt", "1");
    repo.git(&["add", "--all"]);
    repo.git(&["commit", "--quiet", "-m", "untagged"]);

    repo.command()
        .arg("tags")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No tags found"));
}

#[test]
fn test_tags_demotes_unversioned_names() {
    let Some(repo) = GitFixture::standard() else {
        return;
    };
    repo.git(&["tag", "nightly", "app-v2"]);

    let output = repo.command().arg("tags").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let last = stdout.lines().last().unwrap();
    assert!(last.starts_with("nightly\tdemoted\t"));
}

#[test]
fn test_tags_strict_versions_rejects_unversioned_names() {
    let Some(repo) = GitFixture::standard() else {
        return;
    };
    repo.git(&["tag", "nightly", "app-v2"]);

    repo.command()
        .args(["tags", "--strict-versions"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nightly"))
        .stderr(predicate::str::contains("--strict-versions"));
}

#[test]
fn test_tags_duplicate_ordinal() {
    let Some(repo) = GitFixture::standard() else {
        return;
    };
    repo.git(&["tag", "hotfix-v2", "app-v2"]);

    repo.command()
        .arg("tags")
        .assert()
        .failure()
        .stderr(predicate::str::contains("share the version ordinal 2"));
}

#[test]
fn test_tags_annotated_tag_resolves_to_commit() {
    let Some(repo) = GitFixture::standard() else {
        return;
    };
    let repo = repo.annotated_tag("app-v4");

    let output = repo.command().args(["tags", "--json"]).output().unwrap();
    let tags: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    // Same commit as app-v3, not the tag object
    assert_eq!(tags[0]["name"], "app-v4");
    assert_eq!(tags[0]["commit"], tags[1]["commit"]);
}

#[test]
fn test_tags_from_remote_url_uses_cache() {
    let Some(repo) = GitFixture::standard() else {
        return;
    };
    let cache = TempDir::new().unwrap();

    let mut cmd = cargo_bin_cmd!("tag-compare");
    cmd.args(["--color", "never", "tags", "--repo"])
        .arg(repo.file_url())
        .arg("--cache-root")
        .arg(cache.path())
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stdout(predicate::str::contains("app-v3"));

    let cached = std::fs::read_dir(cache.path()).unwrap().count();
    assert_eq!(cached, 1);
}

#[test]
fn test_tags_not_a_repository() {
    let temp = TempDir::new().unwrap();

    let mut cmd = cargo_bin_cmd!("tag-compare");
    cmd.args(["tags", "--repo"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot open repository"))
        .stderr(predicate::str::contains("not a git repository"));
}
