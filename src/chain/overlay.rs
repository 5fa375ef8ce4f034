//! Values overlay planning and validation

use crate::domain::{GitStore, ManifestOutcome, StoreConfig};
use crate::error::{ChainError, Result};

/// Values overlays split by where their content comes from.
///
/// Inline contents keep their relative order and always merge first.
/// `remote_order` lists every remote overlay in declaration order.
#[derive(Debug, Default)]
pub struct OverlayPlan<'m> {
    pub inline: Vec<String>,
    pub git: Vec<(&'m ManifestOutcome, &'m GitStore)>,
    pub inherited: Vec<(&'m ManifestOutcome, &'m [String])>,
    pub remote_order: Vec<String>,
}

impl OverlayPlan<'_> {
    pub fn has_remote(&self) -> bool {
        !self.remote_order.is_empty()
    }
}

/// Collects values manifests, ordered by `order` and then by declaration
pub fn plan_overlays(manifests: &[ManifestOutcome]) -> Result<OverlayPlan<'_>> {
    let mut values: Vec<&ManifestOutcome> = manifests.iter().filter(|m| m.is_values()).collect();
    values.sort_by_key(|m| m.order.unwrap_or(u32::MAX));

    let mut plan = OverlayPlan::default();
    for manifest in values {
        match &manifest.store {
            StoreConfig::Inline { content } => plan.inline.push(content.clone()),
            StoreConfig::Git(store) => {
                plan.git.push((manifest, store));
                plan.remote_order.push(manifest.identifier.clone());
            }
            StoreConfig::InheritFromManifest { paths } => {
                plan.inherited.push((manifest, paths.as_slice()));
                plan.remote_order.push(manifest.identifier.clone());
            }
            other => {
                return Err(ChainError::config(format!(
                    "Unsupported Store Config type: [{}] for Values manifest [{}]",
                    other.type_name(),
                    manifest.identifier
                )));
            }
        }
    }
    Ok(plan)
}

/// Checks that every values document parses as YAML
pub fn validate_values(contents: &[String]) -> std::result::Result<(), serde_yaml::Error> {
    for content in contents.iter().filter(|c| !c.trim().is_empty()) {
        serde_yaml::from_str::<serde_yaml::Value>(content)?;
    }
    Ok(())
}
