//! Descriptive metadata for link types.
//!
//! The behaviour hooks live with the engine; this module only carries the
//! plain data a host needs to reason about a link: which resource types it
//! joins, how their lifecycles relate, and which annotations it accepts.

use crate::types::{LinkTypeId, ResourceType};
use crate::ConfigNode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How the lifecycles of the two linked resources relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// Resource B must exist before resource A can be considered satisfied.
    Hard,
    /// Independent lifecycles; the link only projects configuration.
    Soft,
}

/// Which side's declared intent the host should prefer when a field could be
/// owned by either resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkPriorityResource {
    #[default]
    None,
    ResourceA,
    ResourceB,
}

/// One of the two resources joined by a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkSide {
    A,
    B,
}

impl fmt::Display for LinkSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}

/// Direction of convergence requested for a link update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkUpdateIntent {
    Create,
    Update,
    Destroy,
}

impl LinkUpdateIntent {
    /// `Destroy` tears the link down; every other intent converges it.
    pub fn is_teardown(self) -> bool {
        matches!(self, Self::Destroy)
    }
}

impl fmt::Display for LinkUpdateIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Update => f.write_str("update"),
            Self::Destroy => f.write_str("destroy"),
        }
    }
}

impl std::str::FromStr for LinkUpdateIntent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "destroy" => Ok(Self::Destroy),
            other => Err(format!(
                "unknown update intent '{other}', expected create, update or destroy"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    String,
    Integer,
    Float,
    Boolean,
}

/// Schema of one annotation a link type accepts on its resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationDefinition {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub annotation_type: AnnotationType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<ConfigNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<ConfigNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<ConfigNode>,
    #[serde(default)]
    pub required: bool,
}

impl AnnotationDefinition {
    pub fn new(name: &str, annotation_type: AnnotationType) -> Self {
        Self {
            name: name.to_owned(),
            label: name.to_owned(),
            annotation_type,
            description: String::new(),
            default_value: None,
            allowed_values: Vec::new(),
            examples: Vec::new(),
            required: false,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: ConfigNode) -> Self {
        self.default_value = Some(value);
        self
    }

    #[must_use]
    pub fn with_example(mut self, value: ConfigNode) -> Self {
        self.examples.push(value);
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Whether `value` has the declared type and, when allowed values are
    /// declared, is one of them.
    pub fn accepts(&self, value: &ConfigNode) -> bool {
        let type_ok = match self.annotation_type {
            AnnotationType::String => value.is_string(),
            AnnotationType::Integer => value.is_i64() || value.is_u64(),
            AnnotationType::Float => value.is_number(),
            AnnotationType::Boolean => value.is_boolean(),
        };
        type_ok && (self.allowed_values.is_empty() || self.allowed_values.contains(value))
    }
}

/// Serializable view of a registered link type, without its behaviour hooks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDefinitionSummary {
    pub link_type: LinkTypeId,
    pub resource_type_a: ResourceType,
    pub resource_type_b: ResourceType,
    pub kind: LinkKind,
    pub priority_resource: LinkPriorityResource,
    pub annotations: BTreeMap<String, AnnotationDefinition>,
}
