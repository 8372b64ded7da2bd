use std::collections::HashMap;
use std::sync::Arc;

use triphase_crypto::CryptoProvider;

use super::SignatureFormatter;
use super::cades::CAdESFormatter;
use super::pades::PAdESFormatter;
use super::xades::XAdESFormatter;
use crate::model::job::SignatureFormat;

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait SignatureFormatProvider: Send + Sync {
    fn get_formatter(&self, format: SignatureFormat) -> Option<Arc<dyn SignatureFormatter>>;
}

pub struct SignatureFormatProviderImpl {
    formatters: HashMap<SignatureFormat, Arc<dyn SignatureFormatter>>,
}

impl SignatureFormatProviderImpl {
    pub fn new(formatters: HashMap<SignatureFormat, Arc<dyn SignatureFormatter>>) -> Self {
        Self { formatters }
    }

    /// CAdES, XAdES and PAdES
    pub fn with_all_formats(crypto: Arc<dyn CryptoProvider>) -> Self {
        let formatters: Vec<(SignatureFormat, Arc<dyn SignatureFormatter>)> = vec![
            (
                SignatureFormat::CAdES,
                Arc::new(CAdESFormatter::new(crypto.clone())),
            ),
            (
                SignatureFormat::XAdES,
                Arc::new(XAdESFormatter::new(crypto.clone())),
            ),
            (SignatureFormat::PAdES, Arc::new(PAdESFormatter::new(crypto))),
        ];

        Self::new(HashMap::from_iter(formatters))
    }
}

impl SignatureFormatProvider for SignatureFormatProviderImpl {
    fn get_formatter(&self, format: SignatureFormat) -> Option<Arc<dyn SignatureFormatter>> {
        self.formatters.get(&format).cloned()
    }
}
