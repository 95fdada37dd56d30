//! relayswitchd - The relayswitch background service
//!
//! This is the main entry point for the relayswitch service.
//! It wires together all the components:
//! - Configuration loading (with CLI overrides for credentials)
//! - Actuator binding
//! - Relay session, remote arbitration and the debounced switch
//! - Signal handling (shutdown, local on/off requests)

use anyhow::{Context, Result};
use clap::Parser;
use relayswitch_actuator_net::ConfiguredActuator;
use relayswitch_config::{RawConfig, Settings, read_raw_config, settings_from_raw};
use relayswitch_core::{CoreEvent, Orchestrator};
use relayswitch_session::TcpConnector;
use relayswitch_util::{MonotonicInstant, default_config_path};
use std::path::PathBuf;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// relayswitchd - Relay-controlled switch service
#[derive(Parser, Debug)]
#[command(name = "relayswitchd")]
#[command(about = "Relay-controlled switch service with local debounce", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/relayswitch/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Device id override (or set RELAYSWITCH_DEVICE_ID env var)
    #[arg(long, env = "RELAYSWITCH_DEVICE_ID")]
    device_id: Option<String>,

    /// API key override (or set RELAYSWITCH_API_KEY env var)
    #[arg(long, env = "RELAYSWITCH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Local switch request delivered by signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocalRequest {
    On,
    Off,
}

/// Credentials given on the command line or in the environment win over the file
fn apply_overrides(raw: &mut RawConfig, args: &Args) {
    if let Some(id) = &args.device_id {
        raw.device.id = id.clone();
    }
    if let Some(key) = &args.api_key {
        raw.device.api_key = key.clone();
    }
}

fn load_settings(args: &Args) -> Result<Settings> {
    let mut raw = read_raw_config(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    apply_overrides(&mut raw, args);
    settings_from_raw(raw).with_context(|| format!("Invalid config in {:?}", args.config))
}

/// Main service state
struct Service {
    orchestrator: Orchestrator<TcpConnector, ConfiguredActuator>,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        let settings = load_settings(args)?;

        info!(
            config_path = %args.config.display(),
            device_id = %settings.device.id,
            relay = %format!("{}:{}", settings.relay.host, settings.relay.port),
            actuator = %settings.actuator.describe(),
            "Configuration loaded"
        );

        let actuator = ConfiguredActuator::build(&settings.actuator, settings.switch.initially_on)
            .context("Failed to set up actuator")?;

        let orchestrator = Orchestrator::from_settings(
            &settings,
            TcpConnector,
            actuator,
            MonotonicInstant::now(),
        );

        Ok(Self { orchestrator })
    }

    async fn run(mut self) -> Result<()> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let (local_tx, mut local_rx) = mpsc::unbounded_channel();
        spawn_signal_listener(shutdown_tx, local_tx)?;

        // Shutdown may abandon an in-flight step (typically a reconnect loop
        // against an unreachable relay). Local requests wait for the step.
        tokio::select! {
            _ = self.orchestrator.start(MonotonicInstant::now()) => {}
            _ = shutdown_rx.changed() => {
                return self.shutdown().await;
            }
        }

        info!("Service running");

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            while let Ok(request) = local_rx.try_recv() {
                let now = MonotonicInstant::now();
                let event = match request {
                    LocalRequest::On => self.orchestrator.request_on(now).await,
                    LocalRequest::Off => self.orchestrator.request_off(now).await,
                };
                log_core_event(&event);
            }

            tokio::select! {
                events = self.orchestrator.tick(MonotonicInstant::now()) => {
                    for event in &events {
                        log_core_event(event);
                    }
                }
                _ = shutdown_rx.changed() => break,
            }
        }

        self.shutdown().await
    }

    async fn shutdown(mut self) -> Result<()> {
        info!("Shutting down");
        self.orchestrator
            .shutdown()
            .await
            .context("Failed to shut down cleanly")?;
        info!("relayswitchd stopped");
        Ok(())
    }
}

fn log_core_event(event: &CoreEvent) {
    match event {
        CoreEvent::CommandReceived(command) if command.is_actionable() => {
            info!(?command, "Relay command");
        }
        CoreEvent::Switched { origin, event } if !event.is_transition() => {
            debug!(?origin, ?event, "Switch unchanged");
        }
        other => debug!(event = ?other, "Core event"),
    }
}

/// Forward process signals to the service loop.
///
/// SIGTERM, SIGINT and SIGHUP request shutdown; SIGUSR1 and SIGUSR2 request a
/// local on and off respectively.
fn spawn_signal_listener(
    shutdown: watch::Sender<bool>,
    local: mpsc::UnboundedSender<LocalRequest>,
) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
    let mut sighup = signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;
    let mut sigusr1 =
        signal(SignalKind::user_defined1()).context("Failed to create SIGUSR1 handler")?;
    let mut sigusr2 =
        signal(SignalKind::user_defined2()).context("Failed to create SIGUSR2 handler")?;

    tokio::spawn(async move {
        loop {
            let request = tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, shutting down gracefully");
                    break;
                }
                _ = sigusr1.recv() => LocalRequest::On,
                _ = sigusr2.recv() => LocalRequest::Off,
            };

            info!(?request, "Received local switch request");
            if local.send(request).is_err() {
                warn!("Service loop gone, dropping local request");
                break;
            }
        }

        let _ = shutdown.send(true);
    });

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "relayswitchd starting"
    );

    let service = Service::new(&args)?;
    service.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayswitch_core::Switch;
    use std::io::Write;

    const CONFIG: &str = r#"
        config_version = 1

        [device]
        id = "from-file"
        api_key = "file-key"

        [actuator]
        type = "memory"
    "#;

    fn config_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn cli_credentials_override_file() {
        let file = config_file(CONFIG);
        let args = Args::try_parse_from([
            "relayswitchd",
            "--config",
            file.path().to_str().unwrap(),
            "--device-id",
            "from-cli",
        ])
        .unwrap();

        let settings = load_settings(&args).unwrap();
        assert_eq!(settings.device.id, "from-cli");
        assert_eq!(settings.device.api_key, "file-key");
    }

    #[test]
    fn overrides_are_validated() {
        let file = config_file(CONFIG);
        let args = Args::try_parse_from([
            "relayswitchd",
            "--config",
            file.path().to_str().unwrap(),
            "--api-key",
            "",
        ])
        .unwrap();

        assert!(load_settings(&args).is_err());
    }

    #[test]
    fn missing_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let args = Args::try_parse_from(["relayswitchd", "--config", path.to_str().unwrap()])
            .unwrap();

        let err = load_settings(&args).err().unwrap();
        assert!(err.to_string().contains("Failed to load config"));
    }

    #[test]
    fn service_builds_memory_actuator() {
        let file = config_file(CONFIG);
        let args = Args::try_parse_from(["relayswitchd", "--config", file.path().to_str().unwrap()])
            .unwrap();

        let service = Service::new(&args).unwrap();
        assert!(!service.orchestrator.switch().is_on());
    }
}
