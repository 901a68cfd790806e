//! Document record validation.
//!
//! Checks the structural invariants between a record and its declared
//! security flags before the record is persisted or released.

use crate::error::ValidationError;
use crate::types::{DocumentRecord, SecurityFlag, SecurityFlags};

/// Validate a record against its declared flags.
///
/// Invariants:
/// - `Confidentiality` requires a wrapped content key, and a wrapped key
///   requires `Confidentiality`.
/// - `Integrity` requires a stored signature.
pub fn validate_record(record: &DocumentRecord, flags: SecurityFlags) -> Result<(), ValidationError> {
    if flags.contains(SecurityFlag::Confidentiality) && record.wrapped_key.is_none() {
        return Err(ValidationError::MissingWrappedKey(
            record.name.as_str().to_string(),
        ));
    }

    if !flags.contains(SecurityFlag::Confidentiality) && record.wrapped_key.is_some() {
        return Err(ValidationError::UnexpectedWrappedKey(
            record.name.as_str().to_string(),
        ));
    }

    if flags.contains(SecurityFlag::Integrity) && record.signature.is_none() {
        return Err(ValidationError::MissingSignature(
            record.name.as_str().to_string(),
        ));
    }

    Ok(())
}
