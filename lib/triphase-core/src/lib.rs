use std::sync::Arc;

use triphase_crypto::{CryptoProvider, CryptoProviderImpl};

use self::authentication::RequestAuthenticator;
use self::config::ConfigError;
use self::config::core_config::TriphaseConfig;
use self::provider::document_manager::DocumentManager;
use self::provider::document_manager::provider::document_manager_from_config;
use self::provider::signature_format::provider::SignatureFormatProviderImpl;
use self::repository::memory::MemorySessionRepository;
use self::service::triphase::TriphaseService;
use self::util::batch::BatchCoordinator;

pub mod authentication;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod repository;
pub mod service;
pub mod util;

#[cfg(test)]
mod test_utilities;

pub struct TriphaseCore {
    pub config: Arc<TriphaseConfig>,
    pub authenticator: Arc<RequestAuthenticator>,
    pub triphase_service: TriphaseService,
}

impl TriphaseCore {
    /// Wires the components selected by `config`
    pub fn new(config: TriphaseConfig) -> Result<Self, ConfigError> {
        let document_manager = document_manager_from_config(&config)?;
        Ok(Self::with_document_manager(config, document_manager))
    }

    pub fn with_document_manager(
        config: TriphaseConfig,
        document_manager: Arc<dyn DocumentManager>,
    ) -> Self {
        let config = Arc::new(config);
        let crypto: Arc<dyn CryptoProvider> = Arc::new(CryptoProviderImpl::default());
        let batch = BatchCoordinator::from_config(&config);

        // completion claims become reclaimable once the request deadline has passed
        let session_repository = Arc::new(MemorySessionRepository::new(config.batch_timeout()));

        let triphase_service = TriphaseService::new(
            document_manager,
            crypto.clone(),
            Arc::new(SignatureFormatProviderImpl::with_all_formats(crypto)),
            session_repository,
            batch,
            config.session_ttl(),
            config.delivery(),
        );

        Self {
            authenticator: Arc::new(RequestAuthenticator::from_config(&config)),
            config,
            triphase_service,
        }
    }
}
