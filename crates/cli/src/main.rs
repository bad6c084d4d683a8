//! cuectl - Corsair iCUE SDK bridge CLI
//!
//! Locates the iCUE SDK, lists devices, watches G-keys and sets LED colors.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use cuebridge::Rgb;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::Context;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "cuectl")]
#[command(about = "Corsair iCUE SDK bridge - find the SDK, watch G-keys and set LED colors")]
#[command(version)]
#[command(long_about = "
cuectl loads the Corsair iCUE SDK at runtime and drives it from the command line.
It reports where the SDK was found, lists connected devices, prints G-key presses
and sets or clears key LEDs.

Use --json flag for machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Bridge configuration file (YAML or JSON)
    #[arg(long, global = true, env = "CUEBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Load the SDK from this exact path before searching
    #[arg(long, global = true, env = "CUEBRIDGE_SDK_PATH")]
    sdk_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone, Copy)]
struct KeyboardArgs {
    /// Request exclusive control of the keyboard
    #[arg(long)]
    exclusive: bool,

    /// Milliseconds to wait for iCUE to report a connection
    #[arg(long, default_value_t = 500)]
    timeout_ms: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the SDK search order and try to load it
    Probe,

    /// List connected devices
    Devices {
        /// Every device type, not just keyboards
        #[arg(short, long)]
        all: bool,

        /// Maximum number of devices to report
        #[arg(long, default_value_t = 10)]
        capacity: usize,

        /// Milliseconds to wait for iCUE to report a connection
        #[arg(long, default_value_t = 500)]
        timeout_ms: u64,
    },

    /// Print G-key presses as they happen
    Watch {
        /// Milliseconds between polls
        #[arg(long, default_value_t = 10)]
        poll_ms: u64,

        /// Stop after this many milliseconds
        #[arg(long)]
        duration_ms: Option<u64>,

        /// Milliseconds to wait for iCUE to report a connection
        #[arg(long, default_value_t = 500)]
        timeout_ms: u64,
    },

    /// Set one key's LED color; channels are clamped to 0-255
    #[command(allow_negative_numbers = true)]
    Color {
        /// Key name (G1, Esc) or LED id (0x00010001)
        key: String,
        /// Red
        r: i64,
        /// Green
        g: i64,
        /// Blue
        b: i64,

        #[command(flatten)]
        keyboard: KeyboardArgs,
    },

    /// Turn one key off, or all G-keys when no key is given
    Off {
        /// Key name or LED id
        key: Option<String>,

        #[command(flatten)]
        keyboard: KeyboardArgs,
    },

    /// List named LEDs and macro keys
    Keys,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // stdout carries command output; logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("cuectl={log_level},cuebridge={log_level}").into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let ctx = Context {
        json: cli.json,
        config: cli.config.clone(),
        sdk_path: cli.sdk_path.clone(),
    };

    match execute_command(&cli.command, &ctx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let e = anyhow::Error::from(e);
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            ExitCode::from(error::exit_code(&e))
        }
    }
}

async fn execute_command(command: &Commands, ctx: &Context) -> Result<(), CliError> {
    match command {
        Commands::Probe => commands::probe::execute(ctx),
        Commands::Devices {
            all,
            capacity,
            timeout_ms,
        } => commands::devices::execute(ctx, *all, *capacity, *timeout_ms),
        Commands::Watch {
            poll_ms,
            duration_ms,
            timeout_ms,
        } => commands::watch::execute(ctx, *poll_ms, *duration_ms, *timeout_ms).await,
        Commands::Color {
            key,
            r,
            g,
            b,
            keyboard,
        } => commands::color::set(
            ctx,
            key,
            Rgb::clamped(*r, *g, *b),
            keyboard.exclusive,
            keyboard.timeout_ms,
        ),
        Commands::Off { key, keyboard } => commands::color::off(
            ctx,
            key.as_deref(),
            keyboard.exclusive,
            keyboard.timeout_ms,
        ),
        Commands::Keys => commands::keys::execute(ctx),
    }
}
