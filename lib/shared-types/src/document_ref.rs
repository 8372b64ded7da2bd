use std::convert::Infallible;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::macros::{impl_display, impl_from, impl_into};

/// Opaque document identifier, only meaningful to the configured document manager.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(transparent)]
#[repr(transparent)]
pub struct DocumentRef(String);

impl DocumentRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DocumentRef {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_owned()))
    }
}

impl From<&str> for DocumentRef {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl_from!(DocumentRef; String);
impl_into!(DocumentRef; String);
impl_display!(DocumentRef);
