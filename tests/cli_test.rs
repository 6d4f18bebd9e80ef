use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Path to the gradle-splice binary built for this test run
fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_gradle-splice"))
}

/// Get the path to the fixtures directory
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn run(args: &[&std::ffi::OsStr]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .expect("Failed to execute binary")
}

/// Copy a fixture into a fresh temp dir so it can be rewritten
fn scratch_copy(name: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    fs::copy(fixtures_dir().join(name), &path).unwrap();
    (dir, path)
}

fn changed_lines(before: &str, after: &str) -> Vec<(String, String)> {
    before
        .lines()
        .zip(after.lines())
        .filter(|(a, b)| a != b)
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_single_update_apply() {
    let sample_file = fixtures_dir().join("build.gradle");
    let ops_file = fixtures_dir().join("ops.json");
    let before = fs::read_to_string(&sample_file).unwrap();

    let output = run(&["--file".as_ref(), sample_file.as_os_str(), "--ops".as_ref(), ops_file.as_os_str()]);

    assert!(output.status.success(), "Binary failed: {:?}", String::from_utf8_lossy(&output.stderr));

    let stdout = stdout(&output);
    assert!(stdout.contains("Applied 1 modification(s)"), "Unexpected output: {}", stdout);
    assert!(stdout.contains("Final checksum:"), "Missing checksum in output");
    assert!(stdout.contains("-   21 | implementation 'mysql:mysql-connector-java:8.0.29'"), "{}", stdout);
    assert!(stdout.contains("+   21 | implementation 'mysql:mysql-connector-java:8.0.30'"), "{}", stdout);

    // Without --write the fixture is untouched
    assert_eq!(fs::read_to_string(&sample_file).unwrap(), before);
}

#[test]
fn test_multiple_operations_apply() {
    let sample_file = fixtures_dir().join("build.gradle");
    let ops_file = fixtures_dir().join("ops_multiple.json");

    let output = run(&["--file".as_ref(), sample_file.as_os_str(), "--ops".as_ref(), ops_file.as_os_str()]);

    assert!(output.status.success(), "Binary failed: {:?}", String::from_utf8_lossy(&output.stderr));
    let stdout = stdout(&output);
    assert!(stdout.contains("Applied 3 modification(s)"), "Unexpected output: {}", stdout);
}

#[test]
fn test_checksum_mismatch() {
    let sample_file = fixtures_dir().join("build.gradle");
    let ops_file = fixtures_dir().join("ops_wrong_checksum.json");

    let output = run(&["--file".as_ref(), sample_file.as_os_str(), "--ops".as_ref(), ops_file.as_os_str()]);

    assert!(!output.status.success(), "Binary should have failed with checksum mismatch");
    let stdout = stdout(&output);
    assert!(stdout.contains("Checksum mismatch"), "Expected checksum error, got: {}", stdout);
}

#[test]
fn test_json_output() {
    let sample_file = fixtures_dir().join("build.gradle");
    let ops_file = fixtures_dir().join("ops.json");

    let output = run(&[
        "--file".as_ref(),
        sample_file.as_os_str(),
        "--ops".as_ref(),
        ops_file.as_os_str(),
        "--json".as_ref(),
    ]);

    assert!(output.status.success(), "Binary failed: {:?}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("Output should be valid JSON");

    assert!(json["success"].as_bool().unwrap());
    assert_eq!(json["execution_id"], "test-execution-single");
    assert_eq!(json["applied_count"], 1);
    assert_eq!(json["summary"]["by_kind"]["replace"], 1);
    assert_eq!(json["diff"].as_array().unwrap().len(), 2);
    assert_eq!(json["diff"][0]["kind"], "remove");
    assert_eq!(json["diff"][0]["line"], 21);
}

#[test]
fn test_rejected_operation_fails_run() {
    let (_dir, path) = scratch_copy("build.gradle");
    let before = fs::read_to_string(&path).unwrap();
    let ops_file = fixtures_dir().join("ops_missing.json");

    let output = run(&[
        "--file".as_ref(),
        path.as_os_str(),
        "--ops".as_ref(),
        ops_file.as_os_str(),
        "--json".as_ref(),
        "--write".as_ref(),
    ]);

    assert!(!output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["failed_count"], 1);
    assert!(json["failures"][0]["error"].as_str().unwrap().contains("no dependency matches"));

    // Nothing written when an operation is rejected
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_write_in_place_changes_one_line() {
    let (_dir, path) = scratch_copy("build.gradle");
    let before = fs::read_to_string(&path).unwrap();
    let ops_file = fixtures_dir().join("ops.json");

    let output = run(&[
        "--file".as_ref(),
        path.as_os_str(),
        "--ops".as_ref(),
        ops_file.as_os_str(),
        "--write".as_ref(),
    ]);

    assert!(output.status.success(), "Binary failed: {:?}", String::from_utf8_lossy(&output.stderr));

    let after = fs::read_to_string(&path).unwrap();
    assert_eq!(before.lines().count(), after.lines().count());
    assert_eq!(
        changed_lines(&before, &after),
        vec![(
            "    implementation 'mysql:mysql-connector-java:8.0.29'".to_string(),
            "    implementation 'mysql:mysql-connector-java:8.0.30'".to_string()
        )]
    );
}

#[test]
fn test_kotlin_dialect_detected_from_extension() {
    let (_dir, path) = scratch_copy("build.gradle.kts");
    let ops_file = fixtures_dir().join("ops_kotlin.json");

    let output = run(&[
        "--file".as_ref(),
        path.as_os_str(),
        "--ops".as_ref(),
        ops_file.as_os_str(),
        "--write".as_ref(),
    ]);

    assert!(output.status.success(), "Binary failed: {:?}", String::from_utf8_lossy(&output.stderr));

    let after = fs::read_to_string(&path).unwrap();
    assert!(after.contains("    kotlin(\"jvm\") version \"1.9.21\"\n"));
    assert!(after.contains(
        "    testImplementation(kotlin(\"test\"))\n    implementation(\"io.ktor:ktor-server-netty:2.3.5\")\n}\n"
    ));
}

#[test]
fn test_stdin_input() {
    let sample_file = fixtures_dir().join("build.gradle");
    let ops_json = r#"{
      "execution_id": "test-execution-stdin",
      "operations": [
        { "op": "update_property", "key": "version", "value": "0.0.2-SNAPSHOT" }
      ]
    }"#;

    let mut child = Command::new(bin_path())
        .arg("--file")
        .arg(&sample_file)
        .arg("--json")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn binary");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(ops_json.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success(), "Binary failed: {:?}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["execution_id"], "test-execution-stdin");
    assert_eq!(json["diff"][1]["text"], "version = '0.0.2-SNAPSHOT'");
}

#[test]
fn test_file_output() {
    let sample_file = fixtures_dir().join("build.gradle");
    let ops_file = fixtures_dir().join("ops.json");
    let dir = TempDir::new().unwrap();
    let output_file = dir.path().join("response.txt");

    let output = run(&[
        "--file".as_ref(),
        sample_file.as_os_str(),
        "--ops".as_ref(),
        ops_file.as_os_str(),
        "--output".as_ref(),
        output_file.as_os_str(),
    ]);

    assert!(output.status.success(), "Binary failed: {:?}", String::from_utf8_lossy(&output.stderr));
    assert!(Path::new(&output_file).exists(), "Output file should exist");

    let output_content = fs::read_to_string(&output_file).expect("Failed to read output file");
    assert!(output_content.contains("Applied 1 modification(s)"));
    assert!(output_content.contains("Final checksum:"));
}

#[test]
fn test_strict_flag_is_accepted() {
    let sample_file = fixtures_dir().join("build.gradle");
    let ops_file = fixtures_dir().join("ops.json");

    let output = run(&[
        "--file".as_ref(),
        sample_file.as_os_str(),
        "--ops".as_ref(),
        ops_file.as_os_str(),
        "--strict".as_ref(),
    ]);

    // The mysql coordinate is declared once, so strict mode still succeeds
    assert!(output.status.success(), "Binary failed: {:?}", String::from_utf8_lossy(&output.stderr));
}
