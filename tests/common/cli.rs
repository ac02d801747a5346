//! CLI test runner with fluent assertions.
//!
//! Runs the `swm` binary against a [`Sandbox`] and verifies exit codes,
//! text output and JSON responses.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde_json::Value;

use super::fixtures::Sandbox;

/// Test runner for the `swm` binary.
///
/// # Example
///
/// ```ignore
/// let sandbox = Sandbox::new();
/// CliRunner::new(&sandbox)
///     .run_robot(&["blueprints"])
///     .assert_success()
///     .assert_stdout_contains("hue-dimmer");
/// ```
pub struct CliRunner {
    binary_path: PathBuf,
    env_vars: HashMap<String, String>,
    stdin: Option<String>,
}

impl CliRunner {
    /// Runner whose data, bundle and config locations all live in `sandbox`.
    #[must_use]
    pub fn new(sandbox: &Sandbox) -> Self {
        let runner = Self {
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_swm")),
            env_vars: HashMap::new(),
            stdin: None,
        };
        runner
            .with_env("SWM_DATA_DIR", &sandbox.data_dir().to_string_lossy())
            .with_env("SWM_BUNDLE_DIR", &sandbox.bundle_dir().to_string_lossy())
            .with_env("XDG_CONFIG_HOME", &sandbox.root().join("config").to_string_lossy())
            .with_env("NO_COLOR", "1")
            .with_env("RUST_LOG", "off")
    }

    #[must_use]
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env_vars.insert(key.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn with_stdin(mut self, stdin: &str) -> Self {
        self.stdin = Some(stdin.to_string());
        self
    }

    /// Execute the command with the given arguments.
    ///
    /// # Panics
    ///
    /// Panics if the binary cannot be spawned.
    #[must_use]
    pub fn run(&self, args: &[&str]) -> CliResult {
        let mut cmd = Command::new(&self.binary_path);
        cmd.args(args)
            .env_remove("SWM_FORMAT")
            .env_remove("SWM_CONFIG")
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().expect("Failed to execute command");
        if let Some(input) = &self.stdin {
            let mut stdin = child.stdin.take().expect("stdin is piped");
            stdin
                .write_all(input.as_bytes())
                .expect("Failed to write stdin");
        }
        let output = child.wait_with_output().expect("Failed to wait for command");

        CliResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            args: args.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Execute with `--robot` for JSON output.
    #[must_use]
    pub fn run_robot(&self, args: &[&str]) -> CliResult {
        let mut full_args = vec!["--robot"];
        full_args.extend(args);
        self.run(&full_args)
    }
}

/// Captured output from one CLI run.
#[derive(Debug, Clone)]
pub struct CliResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub args: Vec<String>,
}

impl CliResult {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    // === Fluent Assertions ===

    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success(),
            "Command {:?} failed with exit code {}: {}",
            self.args,
            self.exit_code,
            self.stderr
        );
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert!(
            !self.success(),
            "Command {:?} unexpectedly succeeded",
            self.args
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "stdout does not contain \"{text}\"\nActual stdout:\n{}",
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "stderr does not contain \"{text}\"\nActual stderr:\n{}",
            self.stderr
        );
        self
    }

    // === JSON ===

    /// Parse stdout as a single JSON document.
    ///
    /// # Panics
    ///
    /// Panics if stdout is not valid JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{}", self.stdout))
    }

    /// Parse stderr as a single JSON document (robot mode errors).
    #[must_use]
    pub fn stderr_json(&self) -> Value {
        serde_json::from_str(&self.stderr)
            .unwrap_or_else(|e| panic!("stderr is not JSON ({e}):\n{}", self.stderr))
    }

    /// Parse stdout as JSON lines (`swm session`).
    #[must_use]
    pub fn json_lines(&self) -> Vec<Value> {
        self.stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line)
                    .unwrap_or_else(|e| panic!("line is not JSON ({e}): {line}"))
            })
            .collect()
    }
}
