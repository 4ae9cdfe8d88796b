//! E2E integration tests for the `nosleep` binary.
//!
//! Spawns real subprocesses. Logs go to stderr; `call` output goes to
//! stdout.

mod common;

use common::{free_port, nosleep_cmd, Sandbox, ServerProcess, LISTENING_MARKER};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

// ─── Help / Version ────────────────────────────────────────────────

#[test]
fn help_lists_methods_and_flags() {
    let sandbox = Sandbox::new();
    nosleep_cmd(&sandbox)
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Clear, Display, System, Critical, Read and Shutdown"))
        .stdout(contains("--network"))
        .stdout(contains("--display"))
        .stdout(contains("EXAMPLES"));
}

#[test]
fn version_subcommand() {
    let sandbox = Sandbox::new();
    nosleep_cmd(&sandbox)
        .arg("version")
        .assert()
        .success()
        .stdout(contains("nosleep ").and(contains("built on")).and(contains("commit:")));
}

#[test]
fn version_flag() {
    let sandbox = Sandbox::new();
    nosleep_cmd(&sandbox)
        .arg("-v")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn question_mark_prints_help() {
    let sandbox = Sandbox::new();
    nosleep_cmd(&sandbox)
        .arg("-?")
        .assert()
        .success()
        .stdout(contains("--network"));
}

// ─── Startup failures ──────────────────────────────────────────────

#[test]
fn invalid_network_fails() {
    let sandbox = Sandbox::new();
    nosleep_cmd(&sandbox)
        .args(["-n", "unixpacket"])
        .assert()
        .failure()
        .stderr(contains("invalid network 'unixpacket'"));
}

#[test]
fn bind_failure_is_fatal() {
    let sandbox = Sandbox::new();
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").expect("occupy a port");
    let port = occupied.local_addr().expect("local addr").port().to_string();

    nosleep_cmd(&sandbox)
        .args(["-p", &port])
        .assert()
        .failure()
        .stderr(contains("failed to listen"));
}

#[test]
fn unknown_method_rejected() {
    let sandbox = Sandbox::new();
    nosleep_cmd(&sandbox)
        .args(["call", "Sleep"])
        .assert()
        .failure()
        .stderr(contains("unknown method 'Sleep'"));
}

#[test]
fn call_without_server_fails() {
    let sandbox = Sandbox::new();
    let port = free_port().to_string();
    nosleep_cmd(&sandbox)
        .args(["call", "Read", "-p", &port])
        .assert()
        .failure()
        .stderr(contains("failed to connect"));
}

// ─── Server lifecycle ──────────────────────────────────────────────

#[test]
fn tcp_server_lifecycle() {
    let sandbox = Sandbox::new();
    let port = free_port().to_string();

    let mut server = ServerProcess::spawn(&sandbox, &["-p", &port, "--display"]);
    server.wait_for(LISTENING_MARKER);

    // Display mode: CONTINUOUS | SYSTEM_REQUIRED | DISPLAY_REQUIRED
    nosleep_cmd(&sandbox)
        .args(["call", "Read", "-p", &port])
        .assert()
        .success()
        .stdout(contains("0x80000003"));

    nosleep_cmd(&sandbox)
        .args(["call", "system", "-p", &port])
        .assert()
        .success()
        .stdout(contains("0x80000003"));

    nosleep_cmd(&sandbox)
        .args(["call", "Read", "-p", &port])
        .assert()
        .success()
        .stdout(contains("0x80000001"));

    nosleep_cmd(&sandbox)
        .args(["call", "Shutdown", "-p", &port])
        .assert()
        .success()
        .stdout(contains("ok"));

    let status = server.wait_exit();
    assert!(status.success(), "exit status {status:?}; log:\n{}", server.log());
    assert!(
        server.log().contains("Server shutdown complete."),
        "log:\n{}",
        server.log()
    );

    // Listener is gone.
    nosleep_cmd(&sandbox)
        .args(["call", "Read", "-p", &port])
        .assert()
        .failure();
}

#[cfg(unix)]
#[test]
fn unix_socket_server_lifecycle() {
    let sandbox = Sandbox::new();
    let socket = sandbox.path().join("nosleep.sock");
    let socket = socket.to_str().expect("valid utf8").to_string();

    let mut server = ServerProcess::spawn(&sandbox, &["-n", "unix", "-a", &socket]);
    server.wait_for(LISTENING_MARKER);

    nosleep_cmd(&sandbox)
        .args(["-n", "unix", "-a", &socket, "call", "Clear"])
        .assert()
        .success()
        .stdout(contains("0x80000001"));

    nosleep_cmd(&sandbox)
        .args(["-n", "unix", "-a", &socket, "call", "Shutdown"])
        .assert()
        .success();

    let status = server.wait_exit();
    assert!(status.success(), "exit status {status:?}; log:\n{}", server.log());
    assert!(!std::path::Path::new(&socket).exists());
}
