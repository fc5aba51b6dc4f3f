//! Property filter
//!
//! Keeps exactly the configurable properties. Credentials that are
//! configurable are exported with their value like any other property.

use super::model::{PropertyDefinition, PropertyValue};
use crate::error::ExportError;
use serde_json::Value;
use std::collections::BTreeMap;

/// Select the exportable properties, keyed by identifier
pub fn filter_properties(
    properties: &BTreeMap<String, PropertyDefinition>,
) -> Result<BTreeMap<String, PropertyValue>, ExportError> {
    let mut exported = BTreeMap::new();

    for (identifier, definition) in properties {
        validate_identifier(identifier)?;

        if !definition.configurable {
            continue;
        }

        if definition.credential {
            tracing::debug!("Exporting configurable credential {}", identifier);
        }

        exported.insert(
            identifier.clone(),
            PropertyValue {
                value: definition.value.clone().unwrap_or(Value::Null),
            },
        );
    }

    tracing::debug!(
        "Exporting {} of {} properties",
        exported.len(),
        properties.len()
    );

    Ok(exported)
}

/// Property references look like `.properties.foo` or `.router.static_ips`
fn validate_identifier(identifier: &str) -> Result<(), ExportError> {
    let malformed = || ExportError::MalformedIdentifier(identifier.to_string());

    let Some(path) = identifier.strip_prefix('.') else {
        return Err(malformed());
    };

    if path.split('.').any(str::is_empty) || identifier.chars().any(char::is_whitespace) {
        return Err(malformed());
    }

    Ok(())
}
