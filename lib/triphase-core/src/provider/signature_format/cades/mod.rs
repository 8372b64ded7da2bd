//! CAdES-BES over CMS `SignedData`

use std::sync::Arc;

use triphase_crypto::CryptoProvider;

use super::error::FormatError;
use super::{SignatureFormatter, SigningInput, cms_signature_value};
use crate::model::job::SignatureMode;

pub(crate) mod cms;


pub struct CAdESFormatter {
    crypto: Arc<dyn CryptoProvider>,
}

impl CAdESFormatter {
    pub fn new(crypto: Arc<dyn CryptoProvider>) -> Self {
        Self { crypto }
    }
}

impl SignatureFormatter for CAdESFormatter {
    fn pre_sign(&self, input: SigningInput<'_>) -> Result<Vec<u8>, FormatError> {
        Ok(cms::signed_attributes(input, &input.params.document_digest))
    }

    fn assemble(&self, input: SigningInput<'_>, signature: &[u8]) -> Result<Vec<u8>, FormatError> {
        let signature = cms_signature_value(input.params.algorithm, signature)?;
        let content = match input.params.mode {
            SignatureMode::Implicit => Some(input.document),
            SignatureMode::Explicit => None,
        };

        Ok(cms::signed_data(
            input,
            &input.params.document_digest,
            &signature,
            content,
        ))
    }

    fn validate(&self, signed: &[u8], input: SigningInput<'_>) -> Result<(), FormatError> {
        let parsed = cms::parse_signed_data(signed)?;

        let content = match (input.params.mode, parsed.content.as_deref()) {
            (SignatureMode::Implicit, Some(content)) => content,
            (SignatureMode::Explicit, None) => input.document,
            (mode, _) => {
                return Err(FormatError::InvalidStructure(format!(
                    "encapsulated content does not match signature mode `{mode}`"
                )));
            }
        };

        cms::verify_signed_data(&self.crypto, &parsed, content, input)
    }
}
