use serde_json::Value;
use sha2::{Digest, Sha256};

use super::domain::CanonicalApplicantRecord;

/// Stable change-detection digest over the canonical shape.
///
/// `metadata` is dropped before hashing and object keys serialize sorted
/// (`serde_json::Value` objects are BTreeMap-backed), so repeated calls on the
/// same logical content always agree regardless of field insertion order.
/// Hex-encoded SHA-256; a change detector, not a security primitive.
pub fn fingerprint(record: &CanonicalApplicantRecord) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(fields) = &mut value {
        fields.remove("metadata");
    }
    let encoded = serde_json::to_vec(&value)?;
    Ok(hex::encode(Sha256::digest(&encoded)))
}
