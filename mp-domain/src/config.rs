//! Configuration for actor discovery and domains

use crate::domain::Domain;
use crate::indexer::Indexer;
use mp_meta::Meta;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which methods of an introspected object become actors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Methods whose name starts with this prefix are discovered. The rest
    /// of the name, lowercase-leading, becomes the actor's method.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Methods registered before the scan, in this order, whatever their
    /// name. Their method is the whole name, lowercase-leading.
    #[serde(default)]
    pub names: Vec<String>,
}

fn default_prefix() -> String {
    String::from("mpi_")
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            names: Vec::new(),
        }
    }
}

impl ScanConfig {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Scan prefix, falling back to the default when blank
    pub fn effective_prefix(&self) -> &str {
        match self.prefix.trim() {
            "" => "mpi_",
            prefix => prefix,
        }
    }

    /// Rest of a method name after the scan prefix, when non-empty
    pub fn suffix<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_prefix(self.effective_prefix())
            .filter(|rest| !rest.is_empty())
    }
}

/// Builds the indexer of a domain
pub type IndexBuilder = Arc<dyn Fn(&Domain) -> Indexer + Send + Sync>;

/// Describes a domain as a meta
pub type InfoBuilder = Arc<dyn Fn(&Domain) -> Meta + Send + Sync>;

/// Per-domain settings, inherited by every domain derived from it
#[derive(Clone, Default)]
pub struct DomainConfig {
    /// Replaces [`Indexer::build`] when set
    pub indexer: Option<IndexBuilder>,
    /// Replaces the default [`Domain::info`] when set
    pub info: Option<InfoBuilder>,
}

impl DomainConfig {
    pub fn with_indexer<F>(mut self, f: F) -> Self
    where
        F: Fn(&Domain) -> Indexer + Send + Sync + 'static,
    {
        self.indexer = Some(Arc::new(f));
        self
    }

    pub fn with_info<F>(mut self, f: F) -> Self
    where
        F: Fn(&Domain) -> Meta + Send + Sync + 'static,
    {
        self.info = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for DomainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainConfig")
            .field("indexer", &self.indexer.is_some())
            .field("info", &self.info.is_some())
            .finish()
    }
}
