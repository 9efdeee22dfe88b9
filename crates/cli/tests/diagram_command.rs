use assert_cmd::Command;
use std::fs;
use tempfile::tempdir;

const PAYLOAD: &str = r#"{
  "name": "D",
  "diagram": {
    "package": "model",
    "name": "D",
    "typeViews": [
      {"id": "person", "type": "model::Person",
       "position": {"x": 0.0, "y": 0.0},
       "rectangleGeometry": {"width": 100.0, "height": 40.0}},
      {"id": "firm", "type": "model::Firm",
       "position": {"x": 200.0, "y": 0.0},
       "rectangleGeometry": {"width": 100.0, "height": 40.0}}
    ]
  },
  "domainInfo": {
    "classes": [{"package": "model", "name": "Person"}]
  }
}"#;

#[allow(deprecated)]
fn pure_ide() -> Command {
    Command::cargo_bin("pure-ide").expect("binary")
}

#[test]
fn diagram_is_rebuilt_offline_and_lists_stubs() {
    let temp = tempdir().expect("tempdir");
    let payload = temp.path().join("diagram.json");
    fs::write(&payload, PAYLOAD).expect("write payload");

    let output = pure_ide()
        .env("RUST_LOG", "info")
        .arg("diagram")
        .arg(&payload)
        .output()
        .expect("run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Diagram model::D(width=0.0, height=0.0)"), "{stdout}");
    assert!(stdout.contains("TypeView person("));
    assert!(stdout.contains("type=model::Firm,"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Stub class model::Firm"), "{stderr}");
    assert!(!stderr.contains("Stub class model::Person"), "{stderr}");
}

#[test]
fn malformed_payload_fails() {
    let temp = tempdir().expect("tempdir");
    let payload = temp.path().join("diagram.json");
    fs::write(&payload, "[]").expect("write payload");

    let output = pure_ide()
        .arg("--quiet")
        .arg("diagram")
        .arg(&payload)
        .output()
        .expect("run");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid diagram payload"));
}
