//! Trustmeta CLI - WebAuthn attestation metadata resolver.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage error (e.g. no metadata given)
  65  Attestation not trusted, or invalid certificate/metadata
  66  Input file could not be read";

#[derive(Parser)]
#[command(name = "trustmeta")]
#[command(author, version, about = "WebAuthn attestation metadata resolver", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress human-readable output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// When to use terminal colors
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    color: ColorMode,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an attestation certificate against metadata documents
    Resolve {
        /// Attestation certificate (PEM, DER or base64 DER)
        #[arg(value_name = "CERT")]
        certificate: PathBuf,

        /// Trust anchor the attestation chain was verified against
        #[arg(short, long, value_name = "CERT")]
        trust_anchor: Option<PathBuf>,

        /// Metadata documents (defaults to $TRUSTMETA_METADATA)
        #[arg(short, long, value_name = "FILE", num_args = 1..)]
        metadata: Vec<PathBuf>,

        /// Print the attestation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the transports asserted by a certificate
    Transports {
        /// Certificate (PEM, DER or base64 DER)
        #[arg(value_name = "CERT")]
        certificate: PathBuf,

        /// Print the transports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate metadata documents and summarize their contents
    Inspect {
        /// Metadata documents (defaults to $TRUSTMETA_METADATA)
        #[arg(value_name = "FILE")]
        files: Vec<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: u8, ansi: bool) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let quiet = cli.quiet;

    match cli.command {
        Commands::Resolve {
            certificate,
            trust_anchor,
            metadata,
            json,
        } => commands::resolve::execute(certificate, trust_anchor, metadata, json, quiet),
        Commands::Transports { certificate, json } => {
            commands::transports::execute(certificate, json, quiet)
        }
        Commands::Inspect { files, json } => commands::inspect::execute(files, json, quiet),
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }
    let ansi = !matches!(cli.color, ColorMode::Never);
    init_tracing(cli.verbose, ansi);

    if let Err(err) = run(cli) {
        let exit = ExitCode::from_anyhow(&err);
        if let Some(message) = &exit.message {
            eprintln!("{} {}", "error:".red().bold(), message);
        }
        std::process::exit(exit.code);
    }
}
