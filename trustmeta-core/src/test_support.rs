//! Certificate and metadata fixtures shared by unit tests.

use rcgen::{CertificateParams, CustomExtension, DistinguishedName, DnType, KeyPair};
use serde_json::{json, Value};

use crate::certificate::Certificate;

pub(crate) struct TestCertificate {
    pub pem: String,
    pub der: Vec<u8>,
    pub certificate: Certificate,
}

/// Generate a fresh self-signed certificate carrying the given custom
/// extensions (`(oid arcs, extnValue contents)`).
pub(crate) fn generate_certificate(
    common_name: &str,
    extensions: &[(&[u64], Vec<u8>)],
) -> TestCertificate {
    let key = KeyPair::generate().expect("key generation");
    let mut params = CertificateParams::new(Vec::<String>::new()).expect("certificate params");

    let mut name = DistinguishedName::new();
    name.push(DnType::CommonName, common_name);
    params.distinguished_name = name;

    for (oid, content) in extensions {
        params
            .custom_extensions
            .push(CustomExtension::from_oid_content(oid, content.clone()));
    }

    let cert = params.self_signed(&key).expect("self-signed certificate");
    let der = cert.der().to_vec();

    TestCertificate {
        pem: cert.pem(),
        certificate: Certificate::from_der(&der).expect("generated certificate parses"),
        der,
    }
}

/// A metadata document trusting `anchors` and declaring `devices`.
pub(crate) fn metadata_document(identifier: &str, anchors: &[&str], devices: Value) -> Value {
    json!({
        "identifier": identifier,
        "version": 1,
        "vendorInfo": {
            "name": "Example Vendor",
            "url": "https://vendor.example",
            "imageUrl": null
        },
        "trustedCertificates": anchors,
        "devices": devices
    })
}
