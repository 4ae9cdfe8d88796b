//! nosleep - keep the machine awake, controlled over RPC.
//!
//! # Modes
//!
//! - `nosleep [OPTIONS]`: hold the system (or display) awake and serve the
//!   control protocol until a `Shutdown` call or Ctrl-C
//! - `nosleep [OPTIONS] call <METHOD>`: dial a running server, perform one
//!   call and print the reply flags
//! - `nosleep version` / `nosleep -v`: print version and exit
//!
//! # Configuration
//!
//! Configuration is loaded from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`NOSLEEP_*`)
//! 3. Config file (`--config PATH`, else `~/.nosleep/config.toml`)
//! 4. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `NOSLEEP_NETWORK`: `tcp`, `tcp4`, `tcp6` or `unix`
//! - `NOSLEEP_ADDRESS`: bind address, or socket path for `unix`
//! - `NOSLEEP_PORT`: listening port
//! - `NOSLEEP_DISPLAY`: start in display mode (`true`/`false`)
//! - `NOSLEEP_LOG_LEVEL`: default log filter

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nosleep_runtime::config::{ConfigLoader, ConfigResolver, NosleepConfig};
use nosleep_runtime::platform::default_platform;
use nosleep_runtime::{Client, ControlService, Method, Reply, Server, ShutdownSignal, StateManager};
use nosleep_types::ExecFlags;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LONG_ABOUT: &str = "\
Sets the thread execution state to (CONTINUOUS | SYSTEM_REQUIRED) and starts
an RPC server on ADDRESS:PORT (default: 127.0.0.1:9001).

You can manage the server using RPC calls to control thread execution states
where possible methods are: Clear, Display, System, Critical, Read and Shutdown.";

const EXAMPLES: &str = "\
EXAMPLES:
  nosleep --port 9015 --display

    holds (CONTINUOUS | SYSTEM_REQUIRED | DISPLAY_REQUIRED) and serves the
    control protocol on 127.0.0.1:9015.

  nosleep --port 9015 call Shutdown

    asks that server to release its hold and exit.";

/// Keeps the machine awake and serves a small control protocol.
#[derive(Parser, Debug)]
#[command(name = "nosleep")]
#[command(about, long_about = LONG_ABOUT, after_help = EXAMPLES)]
#[command(disable_version_flag = true, disable_help_flag = true)]
struct Args {
    /// Network type: tcp, tcp4, tcp6 or unix [default: tcp]
    #[arg(short, long, global = true)]
    network: Option<String>,

    /// Bind address, or socket path for unix [default: 127.0.0.1]
    #[arg(short, long, global = true)]
    address: Option<String>,

    /// RPC server listening port [default: 9001]
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Force display to stay on
    #[arg(short, long)]
    display: bool,

    /// Config file (defaults to ~/.nosleep/config.toml)
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Enable verbose output
    #[arg(long, global = true)]
    verbose: bool,

    /// Print version and exit
    #[arg(short = 'v', long)]
    version: bool,

    /// Print help
    #[arg(short = 'h', long, visible_short_alias = '?', action = clap::ArgAction::Help)]
    help: Option<bool>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Call a method on a running server and print the reply
    Call {
        /// Clear, Display, System, Critical, Read or Shutdown
        method: Method,
    },
    /// Print version and exit
    Version,
}

/// CLI-based configuration resolver.
///
/// Loads file/env config via [`ConfigLoader`] and applies CLI argument
/// overrides as the highest-priority layer.
#[derive(Debug, Default)]
struct CliConfigResolver {
    config_file: Option<PathBuf>,
    network: Option<String>,
    address: Option<String>,
    port: Option<u16>,
    display: bool,
}

impl CliConfigResolver {
    fn from_args(args: &Args) -> Self {
        Self {
            config_file: args.config.clone(),
            network: args.network.clone(),
            address: args.address.clone(),
            port: args.port,
            display: args.display,
        }
    }

    fn resolve(&self) -> Result<NosleepConfig> {
        let mut loader = ConfigLoader::new();
        if let Some(ref path) = self.config_file {
            loader = loader.with_config_file(path);
        }
        let mut config = loader.load().context("Config error")?;
        self.apply(&mut config);
        Ok(config)
    }
}

impl ConfigResolver for CliConfigResolver {
    fn apply(&self, config: &mut NosleepConfig) {
        if let Some(ref network) = self.network {
            config.server.network.clone_from(network);
        }
        if let Some(ref address) = self.address {
            config.server.address.clone_from(address);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.display {
            config.server.display = true;
        }
    }
}

fn version_line() -> String {
    format!(
        "nosleep {}, built on {} (commit: {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("NOSLEEP_BUILD_DATE").unwrap_or("unknown"),
        option_env!("NOSLEEP_COMMIT").unwrap_or("unknown"),
    )
}

/// Initial hold applied before the listener starts accepting.
fn initial_method(config: &NosleepConfig) -> Method {
    if config.server.display {
        Method::Display
    } else {
        Method::System
    }
}

/// Terminal filter: --debug > --verbose > RUST_LOG env > config level.
fn log_filter(args: &Args, config: &NosleepConfig) -> EnvFilter {
    if args.debug {
        EnvFilter::new("debug")
    } else if args.verbose {
        EnvFilter::new("info,nosleep_runtime=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.version || args.command == Some(Command::Version) {
        println!("{}", version_line());
        return Ok(());
    }

    let config = CliConfigResolver::from_args(&args).resolve()?;

    // stdout is reserved for `call` output.
    let terminal_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(terminal_layer.with_filter(log_filter(&args, &config)))
        .init();

    match args.command {
        Some(Command::Call { method }) => call(&config, method).await,
        Some(Command::Version) | None => serve(&config).await,
    }
}

async fn serve(config: &NosleepConfig) -> Result<()> {
    let endpoint = config.server.endpoint()?;

    // Bind before touching the execution state so a bind failure leaves
    // nothing to undo.
    let server = Server::bind(&endpoint).await?;

    let manager = Arc::new(StateManager::new(default_platform()));
    manager.start()?;

    let method = initial_method(config);
    let flags = method.target_flags().unwrap_or(ExecFlags::SYSTEM);
    if let Err(e) = manager.set_flags(flags).await {
        if let Err(stop_err) = stop_manager(&manager).await {
            warn!("Failed to stop state manager: {stop_err}");
        }
        return Err(e).with_context(|| format!("Failed to set initial {method} state"));
    }
    info!("Initial execution state: {flags}");

    let shutdown = ShutdownSignal::new();
    let interrupt = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    if shutdown.try_fire() {
                        info!("Interrupt received, shutting down");
                    }
                }
                Err(e) => warn!("Failed to listen for Ctrl-C: {e}"),
            }
        })
    };

    server
        .serve(ControlService::new(Arc::clone(&manager), shutdown))
        .await;
    interrupt.abort();

    stop_manager(&manager).await?;
    info!("Server shutdown complete.");
    Ok(())
}

/// Stops the manager off the async runtime; `stop` joins the worker thread.
async fn stop_manager(manager: &Arc<StateManager>) -> Result<()> {
    let manager = Arc::clone(manager);
    tokio::task::spawn_blocking(move || manager.stop())
        .await
        .context("State manager stop task failed")??;
    Ok(())
}

async fn call(config: &NosleepConfig, method: Method) -> Result<()> {
    let endpoint = config.server.endpoint()?;
    let mut client = Client::connect(&endpoint).await?;

    match client
        .call(method)
        .await
        .with_context(|| format!("{method} call failed"))?
    {
        Reply::Flags(reply) => {
            println!("{:#010x} ({})", reply.flags.bits(), reply.flags);
            if let Some(detail) = reply.detail {
                eprintln!("warning: platform call failed: {detail}");
            }
        }
        Reply::Empty => println!("ok"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use nosleep_runtime::platform::SimulatedPlatform;
    use nosleep_runtime::LifecycleState;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).expect("arguments should parse")
    }

    #[test]
    fn clap_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn short_and_long_flags() {
        let args = parse(&["nosleep", "-n", "tcp4", "-a", "0.0.0.0", "-p", "9015", "-d"]);
        assert_eq!(args.network.as_deref(), Some("tcp4"));
        assert_eq!(args.address.as_deref(), Some("0.0.0.0"));
        assert_eq!(args.port, Some(9015));
        assert!(args.display);
        assert_eq!(args.command, None);

        let args = parse(&["nosleep", "--port", "9001", "--display", "--verbose"]);
        assert!(args.display);
        assert!(args.verbose);
    }

    #[test]
    fn call_subcommand_parses_method() {
        let args = parse(&["nosleep", "call", "shutdown", "-p", "9015"]);
        assert_eq!(
            args.command,
            Some(Command::Call {
                method: Method::Shutdown
            })
        );
        assert_eq!(args.port, Some(9015));

        assert!(Args::try_parse_from(["nosleep", "call", "sleep"]).is_err());
    }

    #[test]
    fn version_forms() {
        let args = parse(&["nosleep", "-v"]);
        assert!(args.version);
        assert!(!args.verbose);
        assert!(parse(&["nosleep", "--version"]).version);
        assert_eq!(parse(&["nosleep", "version"]).command, Some(Command::Version));
        assert!(version_line().starts_with(&format!("nosleep {}", env!("CARGO_PKG_VERSION"))));
        assert!(version_line().contains("built on"));
    }

    #[test]
    fn help_aliases() {
        for flag in ["-h", "--help", "-?"] {
            let err = Args::try_parse_from(["nosleep", flag]).expect_err("help exits early");
            assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp, "{flag}");
        }
    }

    #[test]
    fn invalid_port_rejected() {
        assert!(Args::try_parse_from(["nosleep", "-p", "70000"]).is_err());
    }

    #[test]
    fn cli_overrides_config() {
        let mut config = NosleepConfig::default();
        let resolver = CliConfigResolver {
            network: Some("unix".into()),
            address: Some("/tmp/nosleep.sock".into()),
            port: None,
            display: true,
            ..CliConfigResolver::default()
        };
        resolver.apply(&mut config);

        assert_eq!(config.server.network, "unix");
        assert_eq!(config.server.address, "/tmp/nosleep.sock");
        assert_eq!(config.server.port, 9001);
        assert!(config.server.display);
    }

    #[test]
    fn display_flag_does_not_clear_config_display() {
        let mut config = NosleepConfig::default();
        config.server.display = true;
        CliConfigResolver::default().apply(&mut config);
        assert!(config.server.display);
    }

    #[test]
    fn resolve_reads_explicit_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9200\n").expect("write config");

        let resolver = CliConfigResolver {
            config_file: Some(path),
            port: None,
            ..CliConfigResolver::default()
        };
        let config = resolver.resolve().expect("resolve should succeed");
        assert_eq!(config.server.port, 9200);
    }

    #[tokio::test]
    async fn stop_manager_joins_worker_from_async_context() {
        let platform = Arc::new(SimulatedPlatform::recording());
        let manager = Arc::new(StateManager::new(platform.clone()));
        manager.start().expect("start");
        manager.set_flags(ExecFlags::SYSTEM).await.expect("set");

        stop_manager(&manager).await.expect("stop");

        assert_eq!(manager.state(), LifecycleState::Stopped);
        assert_eq!(manager.get_flags(), ExecFlags::CLEAR);
        assert_eq!(platform.calls().last().map(|c| c.flags), Some(ExecFlags::CLEAR));

        assert!(stop_manager(&manager).await.is_err(), "second stop is rejected");
    }

    #[test]
    fn initial_method_follows_display() {
        let mut config = NosleepConfig::default();
        assert_eq!(initial_method(&config), Method::System);
        config.server.display = true;
        assert_eq!(initial_method(&config), Method::Display);
    }
}
