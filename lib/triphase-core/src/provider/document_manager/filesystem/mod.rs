//! Documents are files of an input directory, signed results are written to an output
//! directory as `<name>.signed`.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use shared_types::DocumentRef;
use tokio::io::AsyncWriteExt;

use super::{DocumentManager, DocumentManagerError};
use crate::config::ConfigError;
use crate::model::artifact::StoredDocument;


const SIGNED_SUFFIX: &str = "signed";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Params {
    pub indir: PathBuf,
    pub outdir: PathBuf,
    pub overwrite: bool,
}

impl Params {
    pub fn from_config(params: &BTreeMap<&str, &str>) -> Result<Self, ConfigError> {
        let required = |key: &str| {
            params
                .get(key)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
                .ok_or_else(|| ConfigError::InvalidDocumentManagerParameter {
                    key: key.to_owned(),
                    reason: "missing".to_owned(),
                })
        };

        let overwrite = match params.get("overwrite") {
            None => false,
            Some(value) => value.parse().map_err(|_| {
                ConfigError::InvalidDocumentManagerParameter {
                    key: "overwrite".to_owned(),
                    reason: format!("`{value}` is not a boolean"),
                }
            })?,
        };

        Ok(Self {
            indir: required("indir")?,
            outdir: required("outdir")?,
            overwrite,
        })
    }
}

pub struct FilesystemDocumentManager {
    params: Params,
}

impl FilesystemDocumentManager {
    pub fn new(params: Params) -> Self {
        Self { params }
    }
}

/// Plain file names only, anything that could leave `dir` is rejected
fn resolve_path(dir: &Path, reference: &DocumentRef) -> Result<PathBuf, DocumentManagerError> {
    let name = reference.as_str();
    let invalid = |reason: &str| {
        Err(DocumentManagerError::InvalidReference(
            reference.clone(),
            reason.to_owned(),
        ))
    };

    if name.is_empty() || name == "." || name == ".." {
        return invalid("not a file name");
    }
    if name.contains(['/', '\\', '\0']) {
        return invalid("path separators are not allowed");
    }

    Ok(dir.join(name))
}

#[async_trait::async_trait]
impl DocumentManager for FilesystemDocumentManager {
    async fn fetch(&self, reference: &DocumentRef) -> Result<Vec<u8>, DocumentManagerError> {
        let path = resolve_path(&self.params.indir, reference)?;

        tokio::fs::read(&path).await.map_err(|error| match error.kind() {
            ErrorKind::NotFound => DocumentManagerError::NotFound(reference.clone()),
            _ => DocumentManagerError::Io(error),
        })
    }

    async fn store(
        &self,
        reference: &DocumentRef,
        content: Vec<u8>,
    ) -> Result<StoredDocument, DocumentManagerError> {
        let signed_reference = DocumentRef::from(format!("{reference}.{SIGNED_SUFFIX}"));
        let path = resolve_path(&self.params.outdir, &signed_reference)?;

        tokio::fs::create_dir_all(&self.params.outdir).await?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true);
        if self.params.overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = options.open(&path).await.map_err(|error| match error.kind() {
            ErrorKind::AlreadyExists => DocumentManagerError::AlreadyExists(signed_reference.clone()),
            _ => DocumentManagerError::Io(error),
        })?;
        file.write_all(&content).await?;
        file.flush().await?;

        tracing::debug!("Stored signed document {}", path.display());
        Ok(StoredDocument::Reference(signed_reference))
    }
}
