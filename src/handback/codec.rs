//! YAML encoding of work orders, outcome reports and validation results.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::gate::ValidationResult;
use super::types::{OutcomeReport, WorkOrder};

/// Errors raised while encoding or decoding a handback record.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The input held nothing but whitespace.
    #[error("cannot decode {kind}: input is empty")]
    Empty {
        /// Record kind being decoded.
        kind: &'static str,
    },

    /// The input was not a valid encoding of the record.
    #[error("cannot decode {kind}: {source}")]
    Malformed {
        /// Record kind being decoded.
        kind: &'static str,
        /// Parser diagnostic.
        #[source]
        source: serde_yaml::Error,
    },

    /// The record could not be serialized.
    #[error("cannot encode {kind}: {source}")]
    Encode {
        /// Record kind being encoded.
        kind: &'static str,
        /// Serializer diagnostic.
        #[source]
        source: serde_yaml::Error,
    },
}

/// A record that travels across the handback boundary as text.
pub trait Record: Serialize + DeserializeOwned {
    /// Human-readable kind used in error messages.
    const KIND: &'static str;
}

impl Record for WorkOrder {
    const KIND: &'static str = "work order";
}

impl Record for OutcomeReport {
    const KIND: &'static str = "outcome report";
}

impl Record for ValidationResult {
    const KIND: &'static str = "validation result";
}

/// Encodes a record as YAML.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialization fails.
pub fn encode<T: Record>(record: &T) -> Result<String, CodecError> {
    serde_yaml::to_string(record).map_err(|source| CodecError::Encode { kind: T::KIND, source })
}

/// Decodes a record from YAML.
///
/// # Errors
///
/// Returns [`CodecError::Empty`] for blank input and
/// [`CodecError::Malformed`] for anything that does not parse as `T`.
pub fn decode<T: Record>(text: &str) -> Result<T, CodecError> {
    if text.trim().is_empty() {
        return Err(CodecError::Empty { kind: T::KIND });
    }
    serde_yaml::from_str(text).map_err(|source| CodecError::Malformed { kind: T::KIND, source })
}
