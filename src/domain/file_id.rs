//! Attachment Identification
//!
//! Receipts are stored under the blake3 hash of their content, so the same
//! file uploaded twice resolves to one attachment id.

pub struct FileIdentifier;

impl FileIdentifier {
    /// Content hash of an in-memory upload
    pub fn compute_bytes_hash(bytes: &[u8]) -> String {
        blake3::hash(bytes).to_hex().to_string()
    }

    /// Attachment ids are lowercase hex digests; anything else is rejected
    /// before it is used as a file name.
    pub fn is_valid_id(id: &str) -> bool {
        id.len() == 64 && id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    }
}
