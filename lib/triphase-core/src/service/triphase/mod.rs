use std::sync::Arc;
use std::time::Duration;

use triphase_crypto::CryptoProvider;

use crate::config::core_config::DeliveryMode;
use crate::provider::document_manager::DocumentManager;
use crate::provider::signature_format::provider::SignatureFormatProvider;
use crate::repository::session_repository::SessionRepository;
use crate::util::batch::BatchCoordinator;

pub mod dto;
mod mapper;
pub mod service;

/// Pre-sign and post-sign phases of the triphase protocol
#[derive(Clone)]
pub struct TriphaseService {
    document_manager: Arc<dyn DocumentManager>,
    crypto: Arc<dyn CryptoProvider>,
    formatter_provider: Arc<dyn SignatureFormatProvider>,
    session_repository: Arc<dyn SessionRepository>,
    batch: BatchCoordinator,
    session_ttl: Duration,
    delivery: DeliveryMode,
}

impl TriphaseService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        document_manager: Arc<dyn DocumentManager>,
        crypto: Arc<dyn CryptoProvider>,
        formatter_provider: Arc<dyn SignatureFormatProvider>,
        session_repository: Arc<dyn SessionRepository>,
        batch: BatchCoordinator,
        session_ttl: Duration,
        delivery: DeliveryMode,
    ) -> Self {
        Self {
            document_manager,
            crypto,
            formatter_provider,
            session_repository,
            batch,
            session_ttl,
            delivery,
        }
    }
}
