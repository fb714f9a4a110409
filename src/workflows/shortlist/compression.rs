use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::domain::CanonicalApplicantRecord;
use super::fingerprint::fingerprint;

/// Serializes canonical records into size-capped transport payloads.
///
/// The pipeline is compact JSON, then zstd, then base64. The byte budget
/// applies to the serialized JSON; when it is exceeded the oldest experience
/// entries are dropped from the tail of the already-descending list, one at a
/// time, until the encoding fits or a single entry remains. Personal and
/// compensation fields are never dropped.
#[derive(Debug, Clone)]
pub struct BoundedCompressor {
    max_bytes: usize,
}

/// Result of a compression request, including the no-op fast path.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionOutcome {
    pub payload: Option<String>,
    pub digest: String,
    pub changed: bool,
    pub original_size: usize,
    pub compressed_size: usize,
    pub compression_ratio: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    #[error("canonical record failed to serialize: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("compression failed: {0}")]
    Compress(#[from] std::io::Error),
}

/// Failure modes when reversing the payload transform. Reported to callers,
/// never allowed to escape as a panic.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("payload is not valid compressed data: {0}")]
    Compression(#[from] std::io::Error),
    #[error("decompressed bytes are not a canonical record: {0}")]
    Payload(#[from] serde_json::Error),
}

impl BoundedCompressor {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    /// Compress a canonical record, skipping all work when the digest matches
    /// the caller's last stored digest.
    pub fn compress(
        &self,
        record: &CanonicalApplicantRecord,
        current_digest: Option<&str>,
    ) -> Result<CompressionOutcome, CompressError> {
        let digest = fingerprint(record)?;

        if current_digest.is_some_and(|current| current == digest) {
            tracing::debug!(%digest, "content unchanged, skipping compression");
            return Ok(CompressionOutcome {
                payload: None,
                digest,
                changed: false,
                original_size: 0,
                compressed_size: 0,
                compression_ratio: None,
            });
        }

        let encoded = self.bound(record.clone())?;
        let compressed = zstd::stream::encode_all(encoded.as_slice(), 0)?;
        let payload = STANDARD.encode(compressed);

        let ratio = payload.len() as f64 / encoded.len() as f64;
        Ok(CompressionOutcome {
            original_size: encoded.len(),
            compressed_size: payload.len(),
            compression_ratio: Some(ratio),
            payload: Some(payload),
            digest,
            changed: true,
        })
    }

    /// Re-serialize with experience tail entries dropped until the budget fits.
    fn bound(&self, mut record: CanonicalApplicantRecord) -> Result<Vec<u8>, serde_json::Error> {
        let mut encoded = serde_json::to_vec(&record)?;
        let total_entries = record.experience.len();

        while encoded.len() > self.max_bytes && record.experience.len() > 1 {
            record.experience.pop();
            record.metadata.truncated_entries = Some(total_entries - record.experience.len());
            encoded = serde_json::to_vec(&record)?;
        }

        if let Some(dropped) = record.metadata.truncated_entries {
            tracing::warn!(
                dropped,
                total_entries,
                budget = self.max_bytes,
                "experience entries truncated to fit payload budget"
            );
        }

        Ok(encoded)
    }
}

/// Reverse the payload transform: base64 decode, zstd decompress, JSON parse.
pub fn decompress(payload: &str) -> Result<CanonicalApplicantRecord, DecodeError> {
    let compressed = STANDARD.decode(payload)?;
    let encoded = zstd::stream::decode_all(compressed.as_slice())?;
    Ok(serde_json::from_slice(&encoded)?)
}
