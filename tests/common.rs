#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An isolated HOME (config, preferences) plus a database path inside it.
pub struct Sandbox {
    dir: TempDir,
    pub db: String,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db = dir
            .path()
            .join("bays.sqlite")
            .to_string_lossy()
            .to_string();
        Self { dir, db }
    }

    pub fn home(&self) -> &Path {
        self.dir.path()
    }

    /// Output file path inside the sandbox.
    pub fn out(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().to_string()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// `baytracker --db <sandbox db>` with HOME pointing at the sandbox.
    pub fn bt(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("baytracker");
        cmd.env("HOME", self.home())
            .env_remove("RUST_LOG")
            .args(["--db", &self.db]);
        cmd
    }

    /// Start `truck` at `bay` and clock it straight away.
    pub fn clock_one(&self, bay: &str, truck: &str) {
        self.bt().args(["start", bay, truck]).assert().success();
        self.bt().args(["clock", bay, "--yes"]).assert().success();
    }

    /// Clocked-time records, read back through a JSON export.
    pub fn records(&self) -> Vec<serde_json::Value> {
        let out = self.out("records.json");
        self.bt()
            .args(["export", "--format", "json", "--file", &out, "--force"])
            .assert()
            .success();
        match std::fs::read_to_string(&out) {
            Ok(text) => serde_json::from_str(&text).expect("valid json"),
            Err(_) => Vec::new(),
        }
    }

    pub fn board(&self) -> Vec<serde_json::Value> {
        let output = self
            .bt()
            .args(["status", "--json"])
            .output()
            .expect("run status");
        assert!(output.status.success());
        serde_json::from_slice(&output.stdout).expect("valid json")
    }
}
