//! Exit codes following sysexits.h conventions.
//!
//! Scripts can tell an untrusted attestation apart from a missing file or a
//! bad invocation without parsing stderr.

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (e.g. no metadata source).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (untrusted attestation, unparseable certificate or metadata).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        // Classify error by inspecting the chain
        let code = if message.contains("Failed to read") {
            INPUT_ERROR
        } else if message.contains("No metadata") {
            USAGE_ERROR
        } else if message.contains("not trusted")
            || message.contains("Failed to parse")
            || message.contains("Invalid metadata")
            || message.contains("Failed to build resolver")
        {
            DATA_ERROR
        } else {
            GENERAL_ERROR
        };

        Self {
            code,
            message: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    fn classify(err: anyhow::Error) -> i32 {
        ExitCode::from_anyhow(&err).code
    }

    #[test]
    fn test_classification() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(
            classify(Err::<(), _>(io).context("Failed to read metadata file: a.json").unwrap_err()),
            INPUT_ERROR
        );
        assert_eq!(classify(anyhow!("No metadata files given")), USAGE_ERROR);
        assert_eq!(classify(anyhow!("Attestation is not trusted: no trust anchor")), DATA_ERROR);
        assert_eq!(classify(anyhow!("Failed to parse certificate x.pem")), DATA_ERROR);
        assert_eq!(classify(anyhow!("something else")), GENERAL_ERROR);
    }

    #[test]
    fn test_message_includes_chain() {
        let err = Err::<(), _>(anyhow!("inner cause"))
            .context("Failed to build resolver")
            .unwrap_err();
        let exit = ExitCode::from_anyhow(&err);
        assert_eq!(exit.code, DATA_ERROR);
        assert_eq!(exit.message.as_deref(), Some("Failed to build resolver: inner cause"));
    }
}
