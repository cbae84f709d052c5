use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn parse_jsonl(stdout: &[u8]) -> Vec<Value> {
    let s = String::from_utf8_lossy(stdout);
    s.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str::<Value>(l).expect("valid jsonl line"))
        .collect()
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn paths_of(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .map(|v| v.get("path").and_then(|p| p.as_str()).unwrap().to_string())
        .collect()
}

#[test]
fn tree_lists_directories_before_files() {
    let temp = tempdir().unwrap();

    write_file(&temp.path().join("b.txt"), "b");
    write_file(&temp.path().join("a.txt"), "a");
    write_file(&temp.path().join("sub/zz.md"), "z");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("canopy"));
    cmd.arg("--root").arg(temp.path()).arg("tree");

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);

    // root first, then its folders, then its files
    let paths = paths_of(&items);
    assert_eq!(&paths[..3], ["", "sub", "sub/zz.md"]);
    let mut tail = paths[3..].to_vec();
    tail.sort();
    assert_eq!(tail, vec!["a.txt", "b.txt"]);
}

#[test]
fn tree_skips_hidden_and_service_entries() {
    let temp = tempdir().unwrap();

    write_file(&temp.path().join("visible.txt"), "v");
    write_file(&temp.path().join(".hidden"), "h");
    write_file(&temp.path().join(".canopy/config.json"), "{}");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("canopy"));
    cmd.arg("--root").arg(temp.path()).arg("tree");

    let assert = cmd.assert().success();
    let paths = paths_of(&parse_jsonl(&assert.get_output().stdout));

    assert!(paths.contains(&"visible.txt".to_string()));
    assert!(!paths.iter().any(|p| p.contains(".hidden")));
    assert!(!paths.iter().any(|p| p.contains(".canopy")));
}

#[test]
fn tree_filter_marks_non_matching_entries() {
    let temp = tempdir().unwrap();

    write_file(&temp.path().join("alpha.txt"), "a");
    write_file(&temp.path().join("beta.txt"), "b");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("canopy"));
    cmd.arg("--root")
        .arg(temp.path())
        .arg("tree")
        .arg("--filter")
        .arg("ALPHA");

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);

    for item in &items {
        let path = item.get("path").and_then(|p| p.as_str()).unwrap();
        let enabled = item.get("enabled").and_then(|e| e.as_bool()).unwrap();
        if path == "beta.txt" {
            assert!(!enabled, "beta.txt must be filtered out");
        } else {
            assert!(enabled, "{path} must stay enabled");
        }
    }
}

#[test]
fn find_emits_matches_and_their_ancestors_only() {
    let temp = tempdir().unwrap();

    write_file(&temp.path().join("src/needle.rs"), "fn main() {}");
    write_file(&temp.path().join("src/other.rs"), "fn other() {}");
    write_file(&temp.path().join("docs/guide.md"), "guide");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("canopy"));
    cmd.arg("--root").arg(temp.path()).arg("find").arg("needle");

    let assert = cmd.assert().success();
    let paths = paths_of(&parse_jsonl(&assert.get_output().stdout));

    assert_eq!(paths, vec!["", "src", "src/needle.rs"]);
}

#[test]
fn find_matches_file_content() {
    let temp = tempdir().unwrap();

    write_file(&temp.path().join("a.txt"), "nothing here");
    write_file(&temp.path().join("b.txt"), "the NEEDLE is here");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("canopy"));
    cmd.arg("--root").arg(temp.path()).arg("find").arg("needle");

    let assert = cmd.assert().success();
    let paths = paths_of(&parse_jsonl(&assert.get_output().stdout));

    assert!(paths.contains(&"b.txt".to_string()));
    assert!(!paths.contains(&"a.txt".to_string()));
}

#[test]
fn new_creates_file_under_existing_folder() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("src/lib.rs"), "");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("canopy"));
    cmd.arg("--root")
        .arg(temp.path())
        .arg("new")
        .arg("src/util.rs");

    cmd.assert().success();
    assert!(temp.path().join("src/util.rs").is_file());
}

#[test]
fn new_rejects_existing_target_with_error_item() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("taken.txt"), "original");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("canopy"));
    cmd.arg("--root")
        .arg(temp.path())
        .arg("new")
        .arg("taken.txt");

    let assert = cmd.assert().failure();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 1);

    let code = items[0]["errors"][0]["code"].as_str().unwrap();
    assert_eq!(code, "NAME_COLLISION");
    // the original file is untouched
    assert_eq!(fs::read_to_string(temp.path().join("taken.txt")).unwrap(), "original");
}

#[test]
fn new_rejects_path_escaping_the_root() {
    let temp = tempdir().unwrap();
    let inner = temp.path().join("project");
    fs::create_dir(&inner).unwrap();

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("canopy"));
    cmd.arg("--root")
        .arg(&inner)
        .arg("new")
        .arg("../escape.txt");

    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("escapes the root"));
    assert!(!temp.path().join("escape.txt").exists());
}

#[test]
fn rm_rejects_path_escaping_the_root() {
    let temp = tempdir().unwrap();
    let inner = temp.path().join("project");
    fs::create_dir(&inner).unwrap();
    write_file(&temp.path().join("outside.txt"), "keep me");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("canopy"));
    cmd.arg("--root")
        .arg(&inner)
        .arg("rm")
        .arg("../outside.txt");

    cmd.assert().failure();
    assert!(temp.path().join("outside.txt").is_file());
}

#[test]
fn rm_deletes_folder_recursively() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("sub/deep/file.txt"), "x");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("canopy"));
    cmd.arg("--root").arg(temp.path()).arg("rm").arg("sub");

    cmd.assert().success();
    assert!(!temp.path().join("sub").exists());
}

#[test]
fn ren_renames_in_place() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("src/old.rs"), "content");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("canopy"));
    cmd.arg("--root")
        .arg(temp.path())
        .arg("ren")
        .arg("src/old.rs")
        .arg("new.rs");

    cmd.assert().success();
    assert!(!temp.path().join("src/old.rs").exists());
    assert_eq!(
        fs::read_to_string(temp.path().join("src/new.rs")).unwrap(),
        "content"
    );
}

#[test]
fn mv_moves_entry_into_folder() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("src/file.rs"), "x");
    fs::create_dir(temp.path().join("archive")).unwrap();

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("canopy"));
    cmd.arg("--root")
        .arg(temp.path())
        .arg("mv")
        .arg("src/file.rs")
        .arg("archive");

    cmd.assert().success();
    assert!(temp.path().join("archive/file.rs").is_file());
    assert!(!temp.path().join("src/file.rs").exists());
}

#[test]
fn mv_into_own_descendant_is_rejected_without_changes() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("outer/inner/file.txt"), "x");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("canopy"));
    cmd.arg("--root")
        .arg(temp.path())
        .arg("mv")
        .arg("outer")
        .arg("outer/inner");

    let assert = cmd.assert().failure();
    let items = parse_jsonl(&assert.get_output().stdout);
    let code = items[0]["errors"][0]["code"].as_str().unwrap();
    assert_eq!(code, "INVALID_MOVE");
    assert!(temp.path().join("outer/inner/file.txt").is_file());
}

#[test]
fn mv_rejects_non_folder_destination() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("a.txt"), "a");
    write_file(&temp.path().join("b.txt"), "b");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("canopy"));
    cmd.arg("--root")
        .arg(temp.path())
        .arg("mv")
        .arg("a.txt")
        .arg("b.txt");

    let assert = cmd.assert().failure();
    let items = parse_jsonl(&assert.get_output().stdout);
    let code = items[0]["errors"][0]["code"].as_str().unwrap();
    assert_eq!(code, "NOT_A_FOLDER");
}

#[test]
fn rm_unknown_path_reports_not_found() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("present.txt"), "x");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("canopy"));
    cmd.arg("--root").arg(temp.path()).arg("rm").arg("missing.txt");

    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("missing.txt"));
}

#[test]
fn tree_format_renders_indented_names() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("sub/file.txt"), "x");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("canopy"));
    cmd.arg("--root")
        .arg(temp.path())
        .arg("--format")
        .arg("tree")
        .arg("--no-color")
        .arg("tree");

    let assert = cmd.assert().success();
    let s = String::from_utf8_lossy(&assert.get_output().stdout);

    assert!(s.contains("  sub/\n"));
    assert!(s.contains("    file.txt\n"));
}
