//! Host-supplied envelopes for staging and update calls, and their results.

use crate::changes::LinkChanges;
use crate::context::ProviderContext;
use crate::link::LinkUpdateIntent;
use crate::path::{FieldPath, PathSegment};
use crate::types::{ResourceName, ResourceType};
use crate::{ConfigNode, LinkData};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Prefix under which known-on-deploy entries address a resource's spec.
const SPEC_ROOT: &str = "spec";

/// Planned changes for one side of a link, as computed by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceChanges {
    pub resource_name: ResourceName,
    pub resource_type: ResourceType,
    /// Desired spec with substitutions resolved. `None` when the host has
    /// not computed this side yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_spec: Option<ConfigNode>,
    /// Spec fields whose value is only known once the resource is deployed,
    /// written relative to the resource, e.g. `spec.codeSigningConfigArn`.
    #[serde(default)]
    pub field_changes_known_on_deploy: BTreeSet<String>,
}

impl ResourceChanges {
    pub fn new(resource_name: &str, resource_type: &str) -> Self {
        Self {
            resource_name: ResourceName::new(resource_name),
            resource_type: ResourceType::new(resource_type),
            resolved_spec: None,
            field_changes_known_on_deploy: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_resolved_spec(mut self, spec: ConfigNode) -> Self {
        self.resolved_spec = Some(spec);
        self
    }

    #[must_use]
    pub fn with_known_on_deploy(mut self, field: &str) -> Self {
        self.field_changes_known_on_deploy.insert(field.to_owned());
        self
    }

    /// Whether the spec field at `source` (a path rooted at the spec, such as
    /// `$.codeSigningConfigArn`) is only known at deploy time.
    pub fn is_known_on_deploy(&self, source: &FieldPath) -> bool {
        if self.field_changes_known_on_deploy.is_empty() {
            return false;
        }
        let spec_rooted = source
            .segments()
            .iter()
            .cloned()
            .fold(
                FieldPath::root().join(PathSegment::Field(SPEC_ROOT.to_owned())),
                FieldPath::join,
            );
        self.field_changes_known_on_deploy.iter().any(|entry| {
            FieldPath::parse(entry)
                .is_ok_and(|p| p.same_location(&spec_rooted) || p.same_location(source))
        })
    }
}

/// Input to the change-staging orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStageInput {
    pub resource_a_changes: ResourceChanges,
    pub resource_b_changes: ResourceChanges,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_link_data: Option<LinkData>,
    #[serde(default)]
    pub provider_context: ProviderContext,
}

/// Deployed state of one resource taking part in a link update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    pub resource_name: ResourceName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_state: Option<ConfigNode>,
    /// Link annotations declared on this resource.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, ConfigNode>,
}

impl ResourceInfo {
    pub fn new(resource_name: &str) -> Self {
        Self {
            resource_name: ResourceName::new(resource_name),
            current_state: None,
            annotations: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_current_state(mut self, state: ConfigNode) -> Self {
        self.current_state = Some(state);
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, name: &str, value: ConfigNode) -> Self {
        self.annotations.insert(name.to_owned(), value);
        self
    }
}

/// Input for updating resource A or resource B of a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkUpdateResourceInput {
    #[serde(default)]
    pub changes: LinkChanges,
    /// The resource being updated.
    pub resource_info: ResourceInfo,
    /// The resource on the opposite side of the link.
    pub other_resource_info: ResourceInfo,
    pub intent: LinkUpdateIntent,
    #[serde(default)]
    pub provider_context: ProviderContext,
}

/// Input for creating, updating, or removing resources that exist only to
/// realise a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkUpdateIntermediaryInput {
    #[serde(default)]
    pub changes: LinkChanges,
    /// Link data committed by earlier updates of this link. Teardown reads
    /// back what was created from here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_link_data: Option<LinkData>,
    pub resource_a_info: ResourceInfo,
    pub resource_b_info: ResourceInfo,
    pub intent: LinkUpdateIntent,
    #[serde(default)]
    pub provider_context: ProviderContext,
}

/// Link data fragment owned by one update call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkUpdateOutput {
    pub link_data: LinkData,
}

impl LinkUpdateOutput {
    /// An update that owns no link data.
    pub fn empty() -> Self {
        Self {
            link_data: ConfigNode::Object(serde_json::Map::new()),
        }
    }

    pub fn with_link_data(link_data: LinkData) -> Self {
        Self { link_data }
    }

    pub fn is_empty(&self) -> bool {
        match &self.link_data {
            ConfigNode::Object(map) => map.is_empty(),
            ConfigNode::Null => true,
            _ => false,
        }
    }
}

impl Default for LinkUpdateOutput {
    fn default() -> Self {
        Self::empty()
    }
}
