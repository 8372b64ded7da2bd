use super::{SignerError, Verifier};

pub struct EDDSAVerifier {}

impl EDDSAVerifier {
    fn parse_public_key(public_key: &[u8]) -> Result<ed25519_compact::PublicKey, SignerError> {
        ed25519_compact::PublicKey::from_der(public_key)
            .map_err(|e| SignerError::CouldNotExtractPublicKey(e.to_string()))
    }
}

impl Verifier for EDDSAVerifier {
    fn check_public_key(&self, public_key: &[u8]) -> Result<(), SignerError> {
        Self::parse_public_key(public_key).map(|_| ())
    }

    fn verify(&self, input: &[u8], signature: &[u8], public_key: &[u8]) -> Result<(), SignerError> {
        let ed25519_pk = Self::parse_public_key(public_key)?;

        let ed25519_signature = ed25519_compact::Signature::from_slice(signature)
            .map_err(|e| SignerError::CouldNotVerify(e.to_string()))?;

        ed25519_pk
            .verify(input, &ed25519_signature)
            .map_err(|_| SignerError::InvalidSignature)?;
        Ok(())
    }
}
