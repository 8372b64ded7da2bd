use hmac::{Hmac, Mac};
use p256::ecdsa::Signature;
use sha2::Sha256;

use crate::signer::SignerError;

type HmacSha256 = Hmac<Sha256>;

pub fn create_hmac(key: &[u8], message: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(message);
    let result = mac.finalize();
    Some(result.into_bytes().to_vec())
}

/// Constant-time comparison of `tag` against HMAC-SHA256(key, message)
pub fn verify_hmac(key: &[u8], message: &[u8], tag: &[u8]) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(message);
    mac.verify_slice(tag).is_ok()
}

/// Re-encodes an ECDSA P-256 signature (raw `r || s` or DER) as DER
pub fn ecdsa_signature_to_der(signature: &[u8]) -> Result<Vec<u8>, SignerError> {
    Ok(parse_ecdsa_signature(signature)?.to_der().as_bytes().to_vec())
}

/// Re-encodes an ECDSA P-256 signature (raw `r || s` or DER) as raw `r || s`
pub fn ecdsa_signature_to_raw(signature: &[u8]) -> Result<Vec<u8>, SignerError> {
    Ok(parse_ecdsa_signature(signature)?.to_bytes().to_vec())
}

fn parse_ecdsa_signature(signature: &[u8]) -> Result<Signature, SignerError> {
    Signature::from_der(signature)
        .or_else(|_| Signature::from_slice(signature))
        .map_err(|_| SignerError::InvalidSignature)
}
