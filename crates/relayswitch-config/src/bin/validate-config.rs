//! Check a relayswitch config file before handing it to relayswitchd
//!
//! Exit codes: 0 valid, 1 invalid or unreadable, 2 usage error.

use relayswitch_config::{ConfigError, Settings, ValidationError, load_config};
use relayswitch_util::default_config_path;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let path = match (args.next(), args.next()) {
        (None, _) => default_config_path(),
        (Some(arg), None) if arg != "-h" && arg != "--help" => PathBuf::from(arg),
        _ => {
            eprintln!("usage: validate-config [CONFIG]");
            eprintln!("default CONFIG: {}", default_config_path().display());
            return ExitCode::from(2);
        }
    };

    match load_config(&path) {
        Ok(settings) => {
            print_summary(&path, &settings);
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_failure(&path, &e);
            ExitCode::from(1)
        }
    }
}

fn print_summary(path: &Path, settings: &Settings) {
    println!("{}: ok", path.display());
    println!("  device     {}", settings.device.id);
    println!("  relay      {}:{}", settings.relay.host, settings.relay.port);
    println!(
        "  heartbeat  after {}s without a send, reconnect every {}s",
        settings.relay.heartbeat_interval.as_secs(),
        settings.relay.reconnect_delay.as_secs()
    );
    println!(
        "  switch     local hold {}s{}, remote hold {}s",
        settings.switch.freeze_timeout.as_secs(),
        if settings.switch.auto_off { " with auto-off" } else { "" },
        settings.remote.freeze_timeout.as_secs()
    );
    println!("  actuator   {}", settings.actuator.describe());
}

fn print_failure(path: &Path, error: &ConfigError) {
    match error {
        ConfigError::ValidationFailed { errors } => {
            eprintln!("{}: {} invalid field(s)", path.display(), errors.len());
            let width = errors.iter().map(|e| e.field().len()).max().unwrap_or(0);
            for err in errors {
                eprintln!("  {:width$}  {}", err.field(), describe(err), width = width);
            }
        }
        other => eprintln!("{}: {}", path.display(), other),
    }
}

fn describe(error: &ValidationError) -> String {
    match error {
        ValidationError::EmptyField(_) => "must not be empty".to_string(),
        ValidationError::InvalidPort(_) => "must be a port between 1 and 65535".to_string(),
        ValidationError::InvalidValue { message, .. } => message.clone(),
    }
}
