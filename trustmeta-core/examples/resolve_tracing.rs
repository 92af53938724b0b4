//! Example demonstrating resolver tracing instrumentation.
//!
//! Run with: cargo run -p trustmeta-core --example resolve_tracing

use rcgen::{CertificateParams, CustomExtension, DistinguishedName, DnType, KeyPair};
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};
use trustmeta_core::{AttestationResolver, Certificate, SimpleAttestationResolver};

fn generate(common_name: &str, transports: Option<Vec<u8>>) -> (String, Certificate) {
    let key = KeyPair::generate().expect("key generation");
    let mut params = CertificateParams::new(Vec::<String>::new()).expect("params");
    let mut name = DistinguishedName::new();
    name.push(DnType::CommonName, common_name);
    params.distinguished_name = name;
    if let Some(content) = transports {
        params.custom_extensions.push(CustomExtension::from_oid_content(
            &[1, 3, 6, 1, 4, 1, 45724, 2, 1, 1],
            content,
        ));
    }
    let cert = params.self_signed(&key).expect("certificate");
    let parsed = Certificate::from_der(cert.der()).expect("parse");
    (cert.pem(), parsed)
}

fn main() {
    // Initialize tracing subscriber with debug level
    fmt()
        .with_env_filter(EnvFilter::new("trustmeta_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== Attestation Resolver Tracing Demo ===\n");

    let (root_pem, root) = generate("Demo Root CA", None);
    let (_, leaf) = generate("Demo Attestation", Some(vec![0x03, 0x02, 0x05, 0x20]));

    let metadata = json!({
        "identifier": "demo-vendor",
        "vendorInfo": { "name": "Demo Vendor" },
        "trustedCertificates": [root_pem],
        "devices": [{ "displayName": "Demo Key", "transports": 8 }]
    });

    let resolver = match SimpleAttestationResolver::from_metadata_json(&metadata.to_string()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to build resolver: {}", e);
            return;
        }
    };

    println!("\nResolving attestation...\n");

    match resolver.resolve(&leaf, Some(&root)) {
        Some(attestation) => {
            println!("\n✅ Trusted");
            println!("   Metadata: {:?}", attestation.metadata_identifier);
            println!("   Device:   {:?}", attestation.device_property("displayName"));
            println!("   Transports: {:?}", attestation.transports);
        }
        None => {
            println!("\n❌ Untrusted: {:?}", resolver.untrusted_from_certificate(&leaf));
        }
    }
}
