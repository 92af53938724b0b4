//! Inspect command - validate metadata documents and summarize them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::json;
use tracing::{info, warn};
use trustmeta_core::{MatcherRegistry, MetadataObject, TrustAnchorIndex};

use crate::utils::{load_metadata, metadata_paths};

/// Execute the inspect command.
pub fn execute(files: Vec<PathBuf>, json: bool, quiet: bool) -> Result<()> {
    let paths = metadata_paths(files)?;
    let registry = MatcherRegistry::default();
    let known = registry.selector_types();

    let mut records = Vec::with_capacity(paths.len());
    let mut summaries = Vec::with_capacity(paths.len());

    for path in &paths {
        let record = load_metadata(path)?;

        // Each document must stand on its own before being merged
        let index = TrustAnchorIndex::build([record.clone()])
            .with_context(|| format!("Failed to parse trust anchors in {}", path.display()))?;

        let unknown = unknown_selector_types(&record, &known);
        for selector_type in &unknown {
            warn!(
                identifier = %record.identifier,
                selector_type = %selector_type,
                "Selector type has no registered matcher and will never match"
            );
        }

        summaries.push(json!({
            "path": path.display().to_string(),
            "identifier": record.identifier,
            "version": record.version,
            "vendor": record.vendor_info.get("name").cloned().flatten(),
            "trustAnchors": index.len(),
            "devices": record.devices.len(),
            "wildcardDevices": record.devices.iter().filter(|d| d.is_wildcard()).count(),
            "unknownSelectorTypes": unknown,
        }));

        if !json && !quiet {
            print_summary(&record, index.len(), &unknown);
        }
        records.push(record);
    }

    let declared: usize = records.iter().map(|r| r.trusted_certificates.len()).sum();
    let merged = TrustAnchorIndex::build(records).context("Failed to build resolver from metadata")?;
    let shared = declared - merged.len();
    if shared > 0 {
        warn!(shared, "Trust anchors declared more than once; later documents win");
    }
    info!(documents = paths.len(), trust_anchors = merged.len(), "Metadata valid");

    if json {
        let report = json!({
            "documents": summaries,
            "trustAnchors": merged.len(),
            "sharedTrustAnchors": shared,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !quiet {
        println!();
        println!(
            "{} {} document(s), {} distinct trust anchor(s)",
            "✓".green().bold(),
            paths.len(),
            merged.len()
        );
        if shared > 0 {
            println!(
                "{} {} trust anchor(s) declared more than once",
                "!".yellow().bold(),
                shared
            );
        }
    }

    Ok(())
}

fn unknown_selector_types(record: &MetadataObject, known: &[&str]) -> Vec<String> {
    let mut unknown: Vec<String> = record
        .devices
        .iter()
        .filter_map(|d| d.selectors.as_ref())
        .flatten()
        .map(|s| s.selector_type.as_str())
        .filter(|t| !known.contains(t))
        .map(str::to_string)
        .collect();
    unknown.sort();
    unknown.dedup();
    unknown
}

fn print_summary(record: &MetadataObject, trust_anchors: usize, unknown: &[String]) {
    println!();
    println!("{}", record.identifier.bold());
    if let Some(Some(name)) = record.vendor_info.get("name") {
        println!("   {} {}", "Vendor:".dimmed(), name);
    }
    if let Some(version) = record.version {
        println!("   {} {}", "Version:".dimmed(), version);
    }
    println!("   {} {}", "Trust anchors:".dimmed(), trust_anchors);
    println!("   {} {}", "Devices:".dimmed(), record.devices.len());

    for device in &record.devices {
        let properties = device.device_properties();
        let name = properties
            .get("displayName")
            .or_else(|| properties.get("deviceId"))
            .map(String::as_str)
            .unwrap_or("(unnamed)");
        let selectors = match &device.selectors {
            None => "any certificate".to_string(),
            Some(selectors) => selectors
                .iter()
                .map(|s| s.selector_type.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        };
        println!("     - {} {}", name, format!("[{selectors}]").dimmed());
    }

    for selector_type in unknown {
        println!(
            "   {} unknown selector type {}",
            "!".yellow().bold(),
            selector_type.yellow()
        );
    }
}
