use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::DocumentManager;
use super::filesystem::{FilesystemDocumentManager, Params as FilesystemParams};
use super::inline::InlineDocumentManager;
use crate::config::ConfigError;
use crate::config::core_config::TriphaseConfig;

pub const INLINE: &str = "inline";
pub const FILESYSTEM: &str = "filesystem";

type Constructor = fn(&BTreeMap<&str, &str>) -> Result<Arc<dyn DocumentManager>, ConfigError>;

fn inline(_params: &BTreeMap<&str, &str>) -> Result<Arc<dyn DocumentManager>, ConfigError> {
    Ok(Arc::new(InlineDocumentManager))
}

fn filesystem(params: &BTreeMap<&str, &str>) -> Result<Arc<dyn DocumentManager>, ConfigError> {
    let params = FilesystemParams::from_config(params)?;
    Ok(Arc::new(FilesystemDocumentManager::new(params)))
}

fn registry() -> HashMap<&'static str, Constructor> {
    HashMap::from([(INLINE, inline as Constructor), (FILESYSTEM, filesystem)])
}

/// Instantiates the document manager named by `document.manager`
pub fn document_manager_from_config(
    config: &TriphaseConfig,
) -> Result<Arc<dyn DocumentManager>, ConfigError> {
    let name = config.document_manager();
    let constructor = registry()
        .get(name)
        .copied()
        .ok_or_else(|| ConfigError::UnknownDocumentManager(name.to_owned()))?;

    tracing::info!("Using document manager `{name}`");
    constructor(&config.document_manager_params(name))
}
