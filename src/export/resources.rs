//! Resource normalizer
//!
//! Turns the per-job resource definitions into `resource-config` blocks.
//! Best-fit values are only consulted when the configured value is missing,
//! and `instances_best_fit` is never consulted at all.

use super::model::{InstanceType, PersistentDisk, ResourceBlock, ResourceConfig, ResourceDefinition};
use crate::error::ExportError;

/// Pick the configured value, falling back to the best fit
pub fn resolve<T>(primary: Option<T>, fallback: Option<T>) -> Option<T> {
    primary.or(fallback)
}

/// Normalize every job, in source order (a repeated identifier replaces the earlier block)
pub fn normalize_resources(resources: &[ResourceDefinition]) -> Result<ResourceConfig, ExportError> {
    let mut config = ResourceConfig::default();

    for resource in resources {
        let block = normalize_resource(resource)?;
        if config.get(&resource.identifier).is_some() {
            tracing::warn!("Duplicate job {} in resources, keeping the last one", resource.identifier);
        }
        config.insert(resource.identifier.clone(), block);
    }

    Ok(config)
}

fn normalize_resource(resource: &ResourceDefinition) -> Result<ResourceBlock, ExportError> {
    let unresolved = |field| ExportError::UnresolvedResource {
        job: resource.identifier.clone(),
        field,
    };

    let size_mb = resolve(resource.persistent_disk_mb, resource.persistent_disk_best_fit)
        .ok_or_else(|| unresolved("persistent_disk.size_mb"))?;

    let instance_type = resolve(
        non_empty(resource.instance_type_id.as_deref()),
        non_empty(resource.instance_type_best_fit.as_deref()),
    )
    .ok_or_else(|| unresolved("instance_type.id"))?;

    Ok(ResourceBlock {
        instances: resource.instances,
        persistent_disk: PersistentDisk {
            size_mb: size_mb.to_string(),
        },
        instance_type: InstanceType {
            id: instance_type.to_string(),
        },
        additional_vm_extensions: resource.additional_vm_extensions.clone(),
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
