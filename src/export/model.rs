//! Wire and export shapes
//!
//! The `*Response` types mirror what Ops Manager returns. The export types
//! (`ExportDocument` and friends) are what gets written out as YAML.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// =============================================================================
// Source documents
// =============================================================================

/// Body of `GET /api/v0/staged/products/:guid/properties`
#[derive(Debug, Clone, Deserialize)]
pub struct PropertiesResponse {
    pub properties: BTreeMap<String, PropertyDefinition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyDefinition {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub configurable: bool,
    #[serde(default)]
    pub credential: bool,
    /// Absent when the property has never been set
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub optional: bool,
}

/// Body of `GET /api/v0/staged/products/:guid/resources`
#[derive(Debug, Clone, Deserialize)]
pub struct ResourcesResponse {
    pub resources: Vec<ResourceDefinition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceDefinition {
    pub identifier: String,
    #[serde(default)]
    pub instances: Instances,
    /// Advisory only, never exported
    #[serde(default, deserialize_with = "lenient_u64")]
    pub instances_best_fit: Option<u64>,
    #[serde(default)]
    pub instance_type_id: Option<String>,
    #[serde(default)]
    pub instance_type_best_fit: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub persistent_disk_mb: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub persistent_disk_best_fit: Option<u64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub additional_vm_extensions: Vec<String>,
}

/// Body of `GET /api/v0/staged/products/:guid/networks_and_azs`
#[derive(Debug, Clone, Deserialize)]
pub struct NetworksAndAzsResponse {
    pub networks_and_azs: NetworkAndAzBinding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Named {
    pub name: String,
}

impl Named {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkAndAzBinding {
    pub singleton_availability_zone: Named,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub other_availability_zones: Vec<Named>,
    pub network: Named,
}

// =============================================================================
// Instances
// =============================================================================

/// A job's instance count: either set explicitly or left for the target
/// environment to size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Instances {
    Explicit(u64),
    #[default]
    Automatic,
}

const AUTOMATIC: &str = "automatic";

impl Serialize for Instances {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Instances::Explicit(count) => serializer.serialize_u64(*count),
            Instances::Automatic => serializer.serialize_str(AUTOMATIC),
        }
    }
}

impl<'de> Deserialize<'de> for Instances {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(Instances::Automatic),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(Instances::Explicit)
                .ok_or_else(|| de::Error::custom(format!("invalid instance count {n}"))),
            Some(Value::String(s)) => {
                let s = s.trim();
                if s.is_empty() || s == AUTOMATIC {
                    Ok(Instances::Automatic)
                } else {
                    s.parse()
                        .map(Instances::Explicit)
                        .map_err(|_| de::Error::custom(format!("invalid instance count {s:?}")))
                }
            }
            Some(other) => Err(de::Error::custom(format!("invalid instance count {other}"))),
        }
    }
}

// =============================================================================
// Export document
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDocument {
    #[serde(rename = "product-properties")]
    pub product_properties: BTreeMap<String, PropertyValue>,
    #[serde(rename = "network-properties")]
    pub network_properties: NetworkProperties,
    #[serde(rename = "resource-config")]
    pub resource_config: ResourceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyValue {
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkProperties {
    pub singleton_availability_zone: Named,
    pub other_availability_zones: Vec<Named>,
    pub network: Named,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceBlock {
    pub instances: Instances,
    pub persistent_disk: PersistentDisk,
    pub instance_type: InstanceType,
    pub additional_vm_extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistentDisk {
    /// Always a string; the import side expects `"20480"`, not `20480`
    pub size_mb: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceType {
    pub id: String,
}

/// Job identifier to resource block, in source listing order.
///
/// Inserting an identifier that already exists replaces its block in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceConfig {
    entries: Vec<(String, ResourceBlock)>,
}

impl ResourceConfig {
    pub fn insert(&mut self, job: String, block: ResourceBlock) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == job) {
            Some((_, slot)) => *slot = block,
            None => self.entries.push((job, block)),
        }
    }

    pub fn get(&self, job: &str) -> Option<&ResourceBlock> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == job)
            .map(|(_, block)| block)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(job, _)| job.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ResourceConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (job, block) in &self.entries {
            map.serialize_entry(job, block)?;
        }
        map.end()
    }
}

// =============================================================================
// Deserialize helpers
// =============================================================================

/// Accept `20480`, `"20480"`, `""` and `null`
fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected a non-negative integer, got {n}"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected a non-negative integer, got {s:?}"))),
        Some(other) => Err(de::Error::custom(format!(
            "expected a non-negative integer, got {other}"
        ))),
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
