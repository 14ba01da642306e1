//! Shared handle for hosts that reload parameters at runtime

use crate::params::ParameterSet;
use crate::version::ValidatedParameterVersion;
use crate::Result;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

/// Cloneable handle to the current parameter set
///
/// Readers take an `Arc` snapshot; a reload validates the new set fully
/// before swapping it in, so a rejected file leaves the old set in place.
#[derive(Debug, Clone)]
pub struct SharedParameterSet {
    inner: Arc<RwLock<Arc<ParameterSet>>>,
}

impl SharedParameterSet {
    /// Create a handle holding the given set
    pub fn new(params: ParameterSet) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(params))),
        }
    }

    /// Get the current set
    pub fn snapshot(&self) -> Arc<ParameterSet> {
        Arc::clone(&self.inner.read())
    }

    /// Swap in a new set, returning the previous one
    pub fn replace(&self, params: ParameterSet) -> Arc<ParameterSet> {
        let versions = params.len();
        let previous = std::mem::replace(&mut *self.inner.write(), Arc::new(params));
        tracing::info!("Swapped staking params ({} versions)", versions);
        previous
    }

    /// Reload from a JSON parameter file
    pub fn reload_from_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match ParameterSet::from_file(path) {
            Ok(params) => {
                self.replace(params);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    "Rejected staking params reload from {}: {}",
                    path.display(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Reload from a JSON parameter document
    pub fn reload_from_bytes(&self, data: &[u8]) -> Result<()> {
        match ParameterSet::from_bytes(data) {
            Ok(params) => {
                self.replace(params);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Rejected staking params reload: {}", e);
                Err(e)
            }
        }
    }

    /// Get the version in effect at the given Bitcoin height
    pub fn active_version_at(&self, height: u64) -> Option<ValidatedParameterVersion> {
        self.inner.read().active_version_at(height).cloned()
    }
}

impl From<ParameterSet> for SharedParameterSet {
    fn from(params: ParameterSet) -> Self {
        Self::new(params)
    }
}
