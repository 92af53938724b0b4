//! Resolve command implementation.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use tracing::{info, warn};
use trustmeta_core::{Attestation, AttestationResolver, SimpleAttestationResolver};

use crate::utils::{format_transports, load_all_metadata, load_certificate, metadata_paths};

/// Execute the resolve command.
pub fn execute(
    certificate_path: PathBuf,
    trust_anchor_path: Option<PathBuf>,
    metadata: Vec<PathBuf>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let paths = metadata_paths(metadata)?;
    let records = load_all_metadata(&paths)?;
    let resolver =
        SimpleAttestationResolver::new(records).context("Failed to build resolver from metadata")?;

    info!(
        documents = paths.len(),
        trust_anchors = resolver.trust_anchors().len(),
        "Resolver ready"
    );

    let certificate = load_certificate(&certificate_path)?;
    let trust_anchor = trust_anchor_path
        .as_deref()
        .map(load_certificate)
        .transpose()?;

    match resolver.resolve(&certificate, trust_anchor.as_ref()) {
        Some(attestation) => {
            info!(
                metadata = attestation.metadata_identifier.as_deref().unwrap_or_default(),
                device = attestation.device_property("displayName").unwrap_or_default(),
                "Attestation trusted"
            );
            print_attestation(&attestation, json, quiet)?;
            Ok(())
        }
        None => {
            let reason = if trust_anchor.is_some() {
                "trust anchor not found in metadata"
            } else {
                "no trust anchor given"
            };
            warn!(reason, "Attestation not trusted");

            let attestation = resolver.untrusted_from_certificate(&certificate);
            print_attestation(&attestation, json, quiet)?;
            bail!("Attestation is not trusted: {reason}")
        }
    }
}

fn print_attestation(attestation: &Attestation, json: bool, quiet: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(attestation)?);
        return Ok(());
    }
    if quiet {
        return Ok(());
    }

    let banner = |text: &str| {
        let line = format!("║{text:^40}║");
        if attestation.trusted {
            line.green().bold()
        } else {
            line.yellow().bold()
        }
    };
    let border = |line: &str| {
        if attestation.trusted {
            line.green()
        } else {
            line.yellow()
        }
    };

    println!();
    println!("{}", border("╔════════════════════════════════════════╗"));
    println!(
        "{}",
        banner(if attestation.trusted { "TRUSTED" } else { "UNTRUSTED" })
    );
    println!("{}", border("╚════════════════════════════════════════╝"));
    println!();

    if let Some(identifier) = &attestation.metadata_identifier {
        println!("   {} {}", "Metadata:".dimmed(), identifier);
    }
    let transports = attestation.transports.clone().unwrap_or_default();
    println!("   {} {}", "Transports:".dimmed(), format_transports(&transports));

    if let Some(vendor) = &attestation.vendor_properties {
        print_properties("Vendor", vendor);
    }
    match &attestation.device_properties {
        Some(device) => print_properties("Device", device),
        None if attestation.trusted => {
            println!("   {} {}", "Device:".dimmed(), "no matching device".yellow())
        }
        None => {}
    }

    Ok(())
}

fn print_properties(title: &str, properties: &BTreeMap<String, String>) {
    println!();
    println!("   {}", format!("{title}:").bold());
    for (key, value) in properties {
        println!("     {} {}", format!("{key}:").dimmed(), value);
    }
}
