//! Authenticator transport capabilities.
//!
//! Attestation certificates may assert the transports an authenticator
//! supports through the FIDO transports extension
//! (`1.3.6.1.4.1.45724.2.1.1`), a DER BIT STRING where bit *n* (counted from
//! the most significant bit of the first content byte) stands for the
//! transport with position *n*. Metadata documents declare the same
//! capabilities as a plain integer bitmask with bit *n* at `1 << n`.
//!
//! # Wire framing
//!
//! The decoder takes the extension value still wrapped in its OCTET STRING,
//! e.g. `04 04 03 02 05 20` for USB only:
//!
//! ```text
//! 04 04     OCTET STRING, 4 bytes
//! 03 02     BIT STRING, 2 bytes
//! 05        unused bits
//! 20        content: 0010_0000 -> bit 2 (USB)
//! ```
//!
//! Content starts at byte 5. The unused-bit mask is taken from byte 3, which
//! is the framing deployed metadata and certificates were built against; for
//! the single content byte used by every defined transport this masks exactly
//! the two bits above the highest assigned position.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::certificate::Certificate;

/// OID of the FIDO authenticator transports extension.
pub const TRANSPORTS_EXTENSION_OID: &str = "1.3.6.1.4.1.45724.2.1.1";

/// Index of the byte holding the unused-bit count.
const UNUSED_BITS_INDEX: usize = 3;

/// Index of the first bitmask content byte.
const CONTENT_START: usize = 5;

/// A transport an authenticator can use to reach the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transport {
    /// Bluetooth Classic
    BtClassic,
    /// Bluetooth Low Energy
    Ble,
    Usb,
    Nfc,
    /// Built into the client platform
    UsbInternal,
    /// Apple Lightning connector
    Lightning,
}

impl Transport {
    /// All transports, in bit order.
    pub const ALL: [Transport; 6] = [
        Transport::BtClassic,
        Transport::Ble,
        Transport::Usb,
        Transport::Nfc,
        Transport::UsbInternal,
        Transport::Lightning,
    ];

    /// Bit position within the capability bitmask.
    pub const fn position(self) -> u32 {
        match self {
            Transport::BtClassic => 0,
            Transport::Ble => 1,
            Transport::Usb => 2,
            Transport::Nfc => 3,
            Transport::UsbInternal => 4,
            Transport::Lightning => 5,
        }
    }

    pub const fn bit(self) -> u32 {
        1 << self.position()
    }

    /// Set of transports whose bit is set. Unassigned bits are ignored.
    pub fn from_bits(bits: u32) -> BTreeSet<Transport> {
        Self::ALL
            .into_iter()
            .filter(|t| bits & t.bit() != 0)
            .collect()
    }

    /// Bitmask for a set of transports.
    pub fn to_bits<'a, I>(transports: I) -> u32
    where
        I: IntoIterator<Item = &'a Transport>,
    {
        transports.into_iter().fold(0, |acc, t| acc | t.bit())
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Transport::BtClassic => "bt-classic",
            Transport::Ble => "ble",
            Transport::Usb => "usb",
            Transport::Nfc => "nfc",
            Transport::UsbInternal => "usb-internal",
            Transport::Lightning => "lightning",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognised transport names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown transport: {0}")]
pub struct UnknownTransport(pub String);

impl FromStr for Transport {
    type Err = UnknownTransport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownTransport(s.to_string()))
    }
}

/// Decode the transport bitmask from a wrapped extension value.
///
/// Values shorter than the five framing bytes decode to 0. The unused-bit
/// count at byte 3 is read as a signed byte, so values from `0x80` up leave
/// the final byte unmasked.
pub fn decode_transport_extension(raw: &[u8]) -> u32 {
    if raw.len() < CONTENT_START {
        return 0;
    }

    // The count byte is signed: 0x80 and above (a long-form length) mask
    // nothing, 8..=0x7f clear the final byte.
    let mask = match i8::from_ne_bytes([raw[UNUSED_BITS_INDEX]]) {
        unused if unused < 0 => 0xff,
        unused => 0xffu8.checked_shl(unused as u32).unwrap_or(0),
    };
    let last = raw.len() - 1;

    // Walk content bytes last to first; each byte's bits enter the
    // accumulator LSB first, i.e. bit-reversed.
    raw.iter()
        .enumerate()
        .skip(CONTENT_START)
        .rev()
        .fold(0u32, |acc, (i, &byte)| {
            let byte = if i == last { byte & mask } else { byte };
            (acc << 8) | u32::from(byte.reverse_bits())
        })
}

/// Encode a bitmask as a wrapped DER BIT STRING extension value.
pub fn encode_transport_extension(bits: u32) -> Vec<u8> {
    let significant = u32::BITS - bits.leading_zeros();
    let content_len = significant.div_ceil(8) as usize;
    let unused = (content_len as u32 * 8 - significant) as u8;

    let mut bit_string = Vec::with_capacity(content_len + 3);
    bit_string.push(0x03);
    bit_string.push((content_len + 1) as u8);
    bit_string.push(unused);
    for i in 0..content_len {
        bit_string.push(((bits >> (8 * i)) as u8).reverse_bits());
    }

    let mut wrapped = Vec::with_capacity(bit_string.len() + 2);
    wrapped.push(0x04);
    wrapped.push(bit_string.len() as u8);
    wrapped.extend_from_slice(&bit_string);
    wrapped
}

/// Transport bitmask asserted by the certificate itself (0 when absent).
pub fn extract_transports(certificate: &Certificate) -> u32 {
    match certificate.extension_value(TRANSPORTS_EXTENSION_OID) {
        Some(raw) => {
            let bits = decode_transport_extension(&raw);
            debug!(bits, "Decoded certificate transports");
            bits
        }
        None => 0,
    }
}
