use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::error::ApiError;

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Verifies that interaction requests were signed by the platform.
#[derive(Clone)]
pub struct InteractionVerifier {
    key: VerifyingKey,
}

impl InteractionVerifier {
    pub fn from_hex(public_key_hex: &str) -> Result<Self, ApiError> {
        let bytes = hex_decode(public_key_hex.trim())
            .ok_or_else(|| ApiError::BadRequest("public key is not valid hex".into()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ApiError::BadRequest("public key must be 32 bytes".into()))?;
        let key = VerifyingKey::from_bytes(&arr)
            .map_err(|_| ApiError::BadRequest("public key is not a valid ed25519 point".into()))?;
        Ok(Self { key })
    }

    /// The signed message is the timestamp header followed by the raw body.
    pub fn verify(&self, signature_hex: &str, timestamp: &str, body: &[u8]) -> Result<(), ApiError> {
        let sig_bytes = hex_decode(signature_hex).ok_or(ApiError::Unauthorized)?;
        let signature = Signature::from_slice(&sig_bytes).map_err(|_| ApiError::Unauthorized)?;
        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);
        self.key
            .verify(&message, &signature)
            .map_err(|_| ApiError::Unauthorized)
    }
}

pub fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect()
}

#[cfg(test)]
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
