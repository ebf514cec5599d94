//! Shared helpers for CLI specs.
//!
//! Each spec gets an isolated state directory via `Setup`, which writes a
//! `cadence.toml` pointing at a tempdir and runs the CLI against it. The
//! daemon binary is resolved explicitly so auto-start never picks up a
//! stale build from PATH.

#![allow(dead_code)]

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// Workspace binary next to this test executable's target directory.
/// Cargo only injects bin-exe paths into the package that defines the
/// binary, so the specs resolve them from `current_exe` instead.
fn workspace_bin(name: &str) -> PathBuf {
    let mut dir = std::env::current_exe().unwrap();
    dir.pop();
    if dir.ends_with("deps") {
        dir.pop();
    }
    dir.join(format!("{}{}", name, std::env::consts::EXE_SUFFIX))
}

pub struct Setup {
    temp: TempDir,
}

impl Setup {
    /// Isolated state dir with a minimal config (token set so the daemon starts)
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let config = format!(
            "state_dir = {:?}\nbot_token = \"spec-token\"\n",
            temp.path().join("state")
        );
        std::fs::write(temp.path().join("cadence.toml"), config).unwrap();
        Self { temp }
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp.path().join("cadence.toml")
    }

    pub fn state_path(&self) -> PathBuf {
        self.temp.path().join("state")
    }

    /// A `cadence` invocation against this setup
    pub fn cadence(&self) -> Cmd {
        let mut inner = Command::new(workspace_bin("cadence"));
        inner
            .arg("--config")
            .arg(self.config_path())
            .env("CADENCE_DAEMON_BINARY", workspace_bin("cadenced"));
        Cmd { inner }
    }

    /// Stop a daemon if one was started during the spec
    pub fn stop_daemon(&self) {
        self.cadence().args(&["daemon", "stop"]).passes();
    }
}

pub struct Cmd {
    inner: Command,
}

impl Cmd {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.inner.args(args);
        self
    }

    pub fn passes(mut self) -> Assert {
        self.inner.assert().success()
    }

    pub fn fails(mut self) -> Assert {
        self.inner.assert().failure()
    }
}

pub trait AssertExt {
    fn stdout_has(self, needle: &str) -> Self;
    fn stderr_has(self, needle: &str) -> Self;
}

impl AssertExt for Assert {
    fn stdout_has(self, needle: &str) -> Self {
        self.stdout(predicate::str::contains(needle.to_string()))
    }

    fn stderr_has(self, needle: &str) -> Self {
        self.stderr(predicate::str::contains(needle.to_string()))
    }
}
