//! Versioned global staking parameters and height lookup

use crate::amount::Amount;
use crate::version::{null_as_default, RawParameterVersion, ValidatedParameterVersion};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameter file contents before validation
///
/// A missing or `null` version list decodes as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalParams {
    /// Parameter versions, oldest first
    #[serde(deserialize_with = "null_as_default")]
    pub versions: Vec<RawParameterVersion>,
}

/// Validated, immutable list of parameter versions
///
/// Versions are ordered by version number, which is also activation height
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSet {
    versions: Vec<ValidatedParameterVersion>,
}

/// Most recent fixed staking cap among already validated versions
///
/// Versions using a cap height are skipped rather than resetting the cap.
pub fn last_fixed_staking_cap(prev_versions: &[ValidatedParameterVersion]) -> Option<Amount> {
    prev_versions
        .iter()
        .rev()
        .find_map(|v| v.cap.fixed_amount())
}

fn check_successor(
    prev_versions: &[ValidatedParameterVersion],
    current: &ValidatedParameterVersion,
) -> Result<()> {
    let Some(prev) = prev_versions.last() else {
        return Ok(());
    };

    if prev.version.checked_add(1) != Some(current.version) {
        return Err(Error::NonSequentialVersion {
            version: current.version,
        });
    }

    if let (Some(got), Some(last)) = (
        current.cap.fixed_amount(),
        last_fixed_staking_cap(prev_versions),
    ) {
        if got < last {
            return Err(Error::StakingCapDecreased {
                version: current.version,
                last,
                got,
            });
        }
    }

    if current.activation_height <= prev.activation_height {
        return Err(Error::OverlappingActivation {
            version: current.version,
        });
    }

    Ok(())
}

impl ParameterSet {
    /// Validate raw versions, oldest first
    pub fn validate(raw_versions: &[RawParameterVersion]) -> Result<Self> {
        if raw_versions.is_empty() {
            return Err(Error::EmptyParameterSet);
        }

        let mut versions: Vec<ValidatedParameterVersion> = Vec::with_capacity(raw_versions.len());
        for raw in raw_versions {
            let parsed = raw.validate().map_err(|source| Error::InvalidVersion {
                version: raw.version,
                source,
            })?;
            check_successor(&versions, &parsed)?;

            tracing::debug!(
                "Accepted params version {} activating at height {}",
                parsed.version,
                parsed.activation_height
            );
            versions.push(parsed);
        }

        tracing::debug!("Validated {} params versions", versions.len());

        Ok(Self { versions })
    }

    /// Deserialize and validate a JSON parameter document
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let global_params: GlobalParams = serde_json::from_slice(data)?;
        Self::try_from(global_params)
    }

    /// Read, deserialize and validate a JSON parameter file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let params = Self::from_bytes(&data)?;

        tracing::info!(
            "Loaded {} staking params versions from {}",
            params.len(),
            path.display()
        );

        Ok(params)
    }

    /// Get the version in effect at the given Bitcoin height
    ///
    /// Returns `None` for heights before the first activation height.
    pub fn active_version_at(&self, height: u64) -> Option<&ValidatedParameterVersion> {
        self.versions
            .iter()
            .rev()
            .find(|v| v.activation_height <= height)
    }

    /// Get a version by its version number
    pub fn get_by_version(&self, version: u64) -> Option<&ValidatedParameterVersion> {
        let first = self.first().version;
        let index = usize::try_from(version.checked_sub(first)?).ok()?;
        self.versions.get(index)
    }

    /// Get all versions
    pub fn versions(&self) -> &[ValidatedParameterVersion] {
        &self.versions
    }

    /// Get the earliest version
    pub fn first(&self) -> &ValidatedParameterVersion {
        // A set is never constructed empty
        &self.versions[0]
    }

    /// Get the latest version
    pub fn latest(&self) -> &ValidatedParameterVersion {
        &self.versions[self.versions.len() - 1]
    }

    /// Get version count
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Check if empty (never true for a validated set)
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl TryFrom<GlobalParams> for ParameterSet {
    type Error = Error;

    fn try_from(params: GlobalParams) -> Result<Self> {
        Self::validate(&params.versions)
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a ValidatedParameterVersion;
    type IntoIter = std::slice::Iter<'a, ValidatedParameterVersion>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.iter()
    }
}
