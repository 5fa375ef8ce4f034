//! Release version bookkeeping shared by deploy and rollback

use serde::{Deserialize, Serialize};

use crate::domain::{DeployOutcome, ReleaseInfo};
use crate::error::{ChainError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseVersionRecord {
    pub previous_version: u32,
    pub new_version: u32,
}

/// Versions for a deploy on top of `history` (oldest first).
///
/// The last entry's revision is the previous version; no history means this
/// is the first release.
pub fn compute_deploy_version(history: &[ReleaseInfo]) -> Result<ReleaseVersionRecord> {
    let previous_version = match history.last() {
        Some(release) => release.revision.trim().parse::<u32>().map_err(|_| {
            ChainError::InvalidResponse(format!(
                "Release revision is not a number: [{}]",
                release.revision
            ))
        })?,
        None => 0,
    };

    Ok(ReleaseVersionRecord {
        previous_version,
        new_version: previous_version.saturating_add(1),
    })
}

/// Versions for a rollback of `prior`.
///
/// The rollback itself is recorded as a new release on top of the one being
/// rolled back to, so the new version skips two slots.
pub fn compute_rollback_version(prior: &DeployOutcome) -> ReleaseVersionRecord {
    ReleaseVersionRecord {
        previous_version: prior.previous_release_version,
        new_version: prior.previous_release_version.saturating_add(2),
    }
}
