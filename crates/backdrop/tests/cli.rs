use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn backdrop(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_backdrop"))
        .env("BACKDROP_CONFIG", config)
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run backdrop")
}

fn write_config(root: &Path, body: &str) -> std::path::PathBuf {
    let path = root.join("backdrop.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn check_accepts_bundled_shaders() {
    let root = TempDir::new().unwrap();
    let config = write_config(root.path(), "version = 1\n");

    let output = backdrop(&config, &["check", "--json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["valid"], true);
    assert_eq!(report["linked"], true);
}

#[test]
fn check_reports_broken_fragment() {
    let root = TempDir::new().unwrap();
    let config = write_config(root.path(), "version = 1\n");
    let fragment = root.path().join("broken.frag");
    fs::write(&fragment, "#version 450\nvoid main() { nope }\n").unwrap();

    let output = backdrop(
        &config,
        &["check", "--json", "--fragment", fragment.to_str().unwrap()],
    );
    assert!(!output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["valid"], false);
    assert_eq!(report["stages"][1]["ok"], false);
    assert!(report["linked"].is_null());
}

#[test]
fn animate_exports_png_frames() {
    let root = TempDir::new().unwrap();
    let config = write_config(
        root.path(),
        "version = 1\n[animate]\nanimator = \"particles\"\nframe_interval = \"20ms\"\n",
    );
    let out = root.path().join("frames");

    let output = backdrop(
        &config,
        &[
            "animate",
            "--out",
            out.to_str().unwrap(),
            "--frames",
            "4",
            "--size",
            "96x64",
            "--seed",
            "1",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let mut frames: Vec<_> = fs::read_dir(&out)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    frames.sort();
    assert_eq!(
        frames,
        vec!["frame-0000.png", "frame-0001.png", "frame-0002.png", "frame-0003.png"]
    );
    let png = fs::read(out.join("frame-0000.png")).unwrap();
    assert_eq!(&png[1..4], b"PNG");
}

#[test]
fn invalid_config_is_rejected() {
    let root = TempDir::new().unwrap();
    let config = write_config(root.path(), "version = 1\n[renderer]\nintensity = 2.0\n");
    let out = root.path().join("frames");

    let output = backdrop(&config, &["animate", "--out", out.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("intensity"));
}

#[test]
fn missing_config_file_is_an_error() {
    let root = TempDir::new().unwrap();
    let out = root.path().join("frames");

    let output = backdrop(
        &root.path().join("absent.toml"),
        &["animate", "--out", out.to_str().unwrap()],
    );
    assert!(!output.status.success());
}
