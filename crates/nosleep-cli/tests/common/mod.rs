//! Shared E2E test helpers for `nosleep` binary tests.

#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Default timeout for one-shot CLI invocations.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(10);

/// Time allowed for a server to come up or go down.
pub const TIMEOUT_SERVER: Duration = Duration::from_secs(15);

/// Line the server logs once it is accepting connections.
pub const LISTENING_MARKER: &str = "Nosleep RPC server listening on";

/// Environment variables that would leak host settings into a test.
const NOSLEEP_ENV_VARS: &[&str] = &[
    "NOSLEEP_NETWORK",
    "NOSLEEP_ADDRESS",
    "NOSLEEP_PORT",
    "NOSLEEP_DISPLAY",
    "NOSLEEP_LOG_LEVEL",
    "RUST_LOG",
];

/// Isolated config directory holding an empty `config.toml`.
pub struct Sandbox {
    dir: tempfile::TempDir,
    config: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir for config");
        let config = dir.path().join("config.toml");
        std::fs::write(&config, "").expect("write empty config");
        Self { dir, config }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_arg(&self) -> String {
        self.config.to_str().expect("valid utf8").to_string()
    }
}

/// Build a Command for the `nosleep` binary with host settings stripped.
pub fn nosleep_cmd(sandbox: &Sandbox) -> assert_cmd::Command {
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("nosleep");
    cmd.timeout(TIMEOUT_BASIC);
    for var in NOSLEEP_ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.args(["--config", &sandbox.config_arg()]);
    cmd
}

/// Returns a loopback port that was free a moment ago.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local addr").port()
}

/// A `nosleep` server running as a child process.
///
/// stderr (where logs go) is drained on a background thread so the child
/// never blocks on a full pipe.
pub struct ServerProcess {
    child: Child,
    lines: Receiver<String>,
    log: Vec<String>,
}

impl ServerProcess {
    pub fn spawn(sandbox: &Sandbox, args: &[&str]) -> Self {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_nosleep"));
        for var in NOSLEEP_ENV_VARS {
            cmd.env_remove(var);
        }
        let mut child = cmd
            .args(["--config", &sandbox.config_arg()])
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn nosleep server");

        let stderr = child.stderr.take().expect("piped stderr");
        let (tx, lines) = mpsc::channel();
        std::thread::spawn(move || {
            for line in BufReader::new(stderr).lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        Self {
            child,
            lines,
            log: Vec::new(),
        }
    }

    /// Blocks until a log line containing `marker` appears.
    ///
    /// Panics with the collected log on timeout or early exit.
    pub fn wait_for(&mut self, marker: &str) {
        let deadline = Instant::now() + TIMEOUT_SERVER;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.lines.recv_timeout(remaining) {
                Ok(line) => {
                    let found = line.contains(marker);
                    self.log.push(line);
                    if found {
                        return;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    panic!("timed out waiting for {marker:?}; log:\n{}", self.log.join("\n"))
                }
                Err(RecvTimeoutError::Disconnected) => {
                    panic!("server exited before {marker:?}; log:\n{}", self.log.join("\n"))
                }
            }
        }
    }

    /// Waits for the process to exit and returns its status.
    pub fn wait_exit(&mut self) -> ExitStatus {
        let deadline = Instant::now() + TIMEOUT_SERVER;
        loop {
            if let Some(status) = self.child.try_wait().expect("poll child") {
                self.drain();
                return status;
            }
            if Instant::now() >= deadline {
                let _ = self.child.kill();
                self.drain();
                panic!("server did not exit; log:\n{}", self.log.join("\n"));
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    /// Everything logged so far.
    pub fn log(&self) -> String {
        self.log.join("\n")
    }

    fn drain(&mut self) {
        while let Ok(line) = self.lines.recv_timeout(Duration::from_millis(500)) {
            self.log.push(line);
        }
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        if matches!(self.child.try_wait(), Ok(None)) {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
