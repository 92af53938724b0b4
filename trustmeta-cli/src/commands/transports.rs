//! Transports command implementation.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use tracing::debug;
use trustmeta_core::{extract_transports, Transport, TRANSPORTS_EXTENSION_OID};

use crate::utils::{format_transports, load_certificate};

/// Execute the transports command.
pub fn execute(certificate_path: PathBuf, json: bool, quiet: bool) -> Result<()> {
    let certificate = load_certificate(&certificate_path)?;

    let raw = certificate.extension_value(TRANSPORTS_EXTENSION_OID);
    if let Some(raw) = &raw {
        debug!(extension = %hex::encode(raw), "Found transports extension");
    }

    let bits = extract_transports(&certificate);
    let transports = Transport::from_bits(bits);

    if json {
        println!("{}", serde_json::to_string(&transports)?);
        return Ok(());
    }

    if quiet {
        for transport in &transports {
            println!("{transport}");
        }
        return Ok(());
    }

    println!("   {} {}", "Subject:".dimmed(), certificate.subject());
    match raw {
        Some(raw) => println!("   {} {}", "Extension:".dimmed(), hex::encode(raw)),
        None => println!("   {} {}", "Extension:".dimmed(), "absent".yellow()),
    }
    println!("   {} {:#04x}", "Bitmask:".dimmed(), bits);
    println!(
        "   {} {}",
        "Transports:".dimmed(),
        format_transports(&transports).green()
    );

    Ok(())
}
