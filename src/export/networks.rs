//! Network normalizer

use super::model::{NetworkAndAzBinding, NetworkProperties};

/// Copy the network and AZ bindings into the export shape
pub fn normalize_networks(binding: &NetworkAndAzBinding) -> NetworkProperties {
    NetworkProperties {
        singleton_availability_zone: binding.singleton_availability_zone.clone(),
        other_availability_zones: binding.other_availability_zones.clone(),
        network: binding.network.clone(),
    }
}
