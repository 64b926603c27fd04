//! Analysis request: the unit of work carried by the dispatch path.

use serde::{Deserialize, Serialize};

use super::ids::JobId;

/// One queued analysis request (job id + both parent image blobs).
///
/// The blobs travel with the message because the submitting request's
/// upload buffers do not outlive the HTTP call; the consumer may run in
/// another process. JSON-serializable so a durable queue backend can
/// carry it as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub job_id: JobId,

    #[serde(with = "serde_bytes_hex")]
    pub parent_a: Vec<u8>,

    #[serde(with = "serde_bytes_hex")]
    pub parent_b: Vec<u8>,
}

impl AnalysisRequest {
    pub fn new(job_id: JobId, parent_a: Vec<u8>, parent_b: Vec<u8>) -> Self {
        Self {
            job_id,
            parent_a,
            parent_b,
        }
    }
}

/// Byte blobs as JSON arrays are ~4x the size; encode as hex strings
/// instead. (Kept local: the wire format of the in-process queue is not a
/// public contract.)
mod serde_bytes_hex {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = String::with_capacity(bytes.len() * 2);
        for b in bytes {
            out.push_str(&format!("{b:02x}"));
        }
        serializer.serialize_str(&out)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.len() % 2 != 0 {
            return Err(D::Error::custom("odd-length hex string"));
        }
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(D::Error::custom))
            .collect()
    }
}
