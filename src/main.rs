//! Head-tracking cursor control driven by OpenTrack UDP output.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use headmouse::{
    app::HeadMouseApp,
    config::Config,
    control::{send_command, ControlCommand, PidFile},
};
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long, global = true)]
    config: Option<String>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Run the tracker (default)
    Run,
    /// Enable or disable cursor control in the running tracker
    Toggle,
    /// Ask the running tracker to recalibrate
    Recalibrate,
    /// Write the effective configuration as YAML
    WriteConfig {
        /// Destination file
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    let config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        match Config::from_file(config_path).and_then(|cfg| cfg.validate().map(|()| cfg)) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    match args.command.unwrap_or(Command::Run) {
        Command::Run => {
            info!("headmouse {}", env!("CARGO_PKG_VERSION"));
            let mut app = HeadMouseApp::new(config)?;
            app.run()?;
        }
        Command::Toggle => signal_tracker(&config, ControlCommand::Toggle)?,
        Command::Recalibrate => signal_tracker(&config, ControlCommand::Recalibrate)?,
        Command::WriteConfig { path } => {
            config
                .to_file(&path)
                .with_context(|| format!("Could not write configuration to {}", path.display()))?;
            println!("Configuration written to {}", path.display());
        }
    }

    Ok(())
}

fn signal_tracker(config: &Config, command: ControlCommand) -> Result<()> {
    let pid_file = PidFile::new(&config.control.pid_file);
    let pid = send_command(&pid_file, command)
        .with_context(|| format!("Could not deliver {command:?} to the running tracker"))?;
    println!("Sent {command:?} to headmouse (pid {pid})");
    Ok(())
}
