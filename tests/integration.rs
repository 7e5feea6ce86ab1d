//! Subprocess-driven integration suite — invokes the compiled `mycelium` binary
//! against small fixture repos built with `tempfile::TempDir`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_mycelium"))
}

/// Run `mycelium analyze` and assert it exits successfully. Returns (stdout, stderr).
fn run_success(args: &[&str]) -> (String, String) {
    let out = Command::new(binary()).args(args).output().expect("failed to invoke mycelium binary");
    let stdout = String::from_utf8_lossy(&out.stdout).to_string();
    let stderr = String::from_utf8_lossy(&out.stderr).to_string();
    assert!(out.status.success(), "command {:?} failed with status {:?}\nstdout: {}\nstderr: {}", args, out.status, stdout, stderr);
    (stdout, stderr)
}

/// Run `mycelium analyze` and assert it exits with a non-zero status.
fn run_failure(args: &[&str]) -> (String, String) {
    let out = Command::new(binary()).args(args).output().expect("failed to invoke mycelium binary");
    let stdout = String::from_utf8_lossy(&out.stdout).to_string();
    let stderr = String::from_utf8_lossy(&out.stderr).to_string();
    assert!(!out.status.success(), "command {:?} unexpectedly succeeded\nstdout: {}\nstderr: {}", args, stdout, stderr);
    (stdout, stderr)
}

fn write_file(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn small_python_repo() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_file(
        tmp.path(),
        "app/main.py",
        "from app.service import Service\n\ndef main():\n    svc = Service()\n    svc.run()\n\nif __name__ == '__main__':\n    main()\n",
    );
    write_file(
        tmp.path(),
        "app/service.py",
        "class Service:\n    def run(self):\n        self.helper()\n\n    def helper(self):\n        pass\n",
    );
    tmp
}

#[test]
fn analyze_writes_a_json_report_for_a_python_repo() {
    let repo = small_python_repo();
    let output_path = repo.path().join("out.json");

    run_success(&["analyze", repo.path().to_str().unwrap(), "-o", output_path.to_str().unwrap()]);

    assert!(output_path.exists());
    let contents = fs::read_to_string(&output_path).unwrap();
    let json: Value = serde_json::from_str(&contents).unwrap();

    assert_eq!(json["version"], "1.0");
    assert!(json["stats"]["files"].as_u64().unwrap() >= 2);
    assert!(json["symbols"].as_array().unwrap().iter().any(|s| s["name"] == "Service"));
}

#[test]
fn analyze_respects_language_filter() {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "a.py", "def py_fn():\n    pass\n");
    write_file(tmp.path(), "b.ts", "function tsFn() {}\n");
    let output_path = tmp.path().join("out.json");

    run_success(&["analyze", tmp.path().to_str().unwrap(), "-o", output_path.to_str().unwrap(), "-l", "py"]);

    let json: Value = serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
    let langs = json["stats"]["languages"].as_object().unwrap();
    assert!(langs.contains_key("py"));
    assert!(!langs.contains_key("ts"));
}

#[test]
fn analyze_nonexistent_path_fails_with_nonzero_exit() {
    let (_, stderr) = run_failure(&["analyze", "/nonexistent/path/does/not/exist"]);
    assert!(stderr.contains("error"));
}

#[test]
fn analyze_default_output_path_is_repo_name_dot_mycelium_json() {
    let repo = small_python_repo();
    let work_dir = TempDir::new().unwrap();
    let default_name = format!("{}.mycelium.json", repo.path().file_name().unwrap().to_str().unwrap());

    let out = Command::new(binary())
        .args(["analyze", repo.path().to_str().unwrap()])
        .current_dir(work_dir.path())
        .output()
        .expect("failed to invoke mycelium binary");
    assert!(out.status.success());

    assert!(work_dir.path().join(&default_name).exists());
}

#[test]
fn analyze_quiet_suppresses_progress_output() {
    let repo = small_python_repo();
    let output_path = repo.path().join("out.json");

    let (stdout, stderr) = run_success(&["analyze", repo.path().to_str().unwrap(), "-o", output_path.to_str().unwrap(), "-q"]);
    assert!(stdout.is_empty());
    assert!(stderr.is_empty());
}

#[test]
fn analyze_traces_a_process_across_two_files() {
    let repo = small_python_repo();
    let output_path = repo.path().join("out.json");

    run_success(&["analyze", repo.path().to_str().unwrap(), "-o", output_path.to_str().unwrap()]);

    let json: Value = serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
    let processes = json["processes"].as_array().unwrap();
    assert!(!processes.is_empty(), "expected at least one traced process");
}
