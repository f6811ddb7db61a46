use crate::update::CallControl;
use crate::CoreError;
use async_trait::async_trait;
use skylink_schema::{
    AnnotationDefinition, LinkChanges, LinkDefinitionSummary, LinkKind, LinkPriorityResource,
    LinkStageInput, LinkTypeId, LinkUpdateIntermediaryInput, LinkUpdateOutput,
    LinkUpdateResourceInput, ResourceType,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Behaviour hooks of a link type.
///
/// `stage_changes` must be pure. Each update hook makes at most one
/// upstream call and returns only the link data it owns; the host merges
/// the fragments.
#[async_trait]
pub trait LinkActions: Send + Sync {
    fn stage_changes(&self, input: &LinkStageInput) -> Result<LinkChanges, CoreError>;

    async fn update_resource_a(
        &self,
        input: &LinkUpdateResourceInput,
        control: &CallControl,
    ) -> Result<LinkUpdateOutput, CoreError>;

    async fn update_resource_b(
        &self,
        input: &LinkUpdateResourceInput,
        control: &CallControl,
    ) -> Result<LinkUpdateOutput, CoreError>;

    async fn update_intermediary_resources(
        &self,
        input: &LinkUpdateIntermediaryInput,
        control: &CallControl,
    ) -> Result<LinkUpdateOutput, CoreError>;
}

/// A registered link type: its descriptive metadata plus its hooks.
pub struct LinkDefinition {
    pub resource_type_a: ResourceType,
    pub resource_type_b: ResourceType,
    pub kind: LinkKind,
    pub priority_resource: LinkPriorityResource,
    pub annotations: BTreeMap<String, AnnotationDefinition>,
    actions: Arc<dyn LinkActions>,
}

impl LinkDefinition {
    pub fn new(
        resource_type_a: &str,
        resource_type_b: &str,
        kind: LinkKind,
        actions: Arc<dyn LinkActions>,
    ) -> Self {
        Self {
            resource_type_a: ResourceType::new(resource_type_a),
            resource_type_b: ResourceType::new(resource_type_b),
            kind,
            priority_resource: LinkPriorityResource::None,
            annotations: BTreeMap::new(),
            actions,
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: LinkPriorityResource) -> Self {
        self.priority_resource = priority;
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: AnnotationDefinition) -> Self {
        self.annotations.insert(annotation.name.clone(), annotation);
        self
    }

    pub fn link_type(&self) -> LinkTypeId {
        LinkTypeId::for_pair(&self.resource_type_a, &self.resource_type_b)
    }

    pub fn actions(&self) -> &dyn LinkActions {
        self.actions.as_ref()
    }

    pub fn summary(&self) -> LinkDefinitionSummary {
        LinkDefinitionSummary {
            link_type: self.link_type(),
            resource_type_a: self.resource_type_a.clone(),
            resource_type_b: self.resource_type_b.clone(),
            kind: self.kind,
            priority_resource: self.priority_resource,
            annotations: self.annotations.clone(),
        }
    }
}

impl std::fmt::Debug for LinkDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkDefinition")
            .field("link_type", &self.link_type())
            .field("kind", &self.kind)
            .field("priority_resource", &self.priority_resource)
            .finish_non_exhaustive()
    }
}

/// Link types known to the provider, keyed by `"<typeA>::<typeB>"`.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Default)]
pub struct LinkRegistry {
    links: BTreeMap<LinkTypeId, Arc<LinkDefinition>>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: LinkDefinition) -> Result<(), CoreError> {
        let link_type = definition.link_type();
        if self.links.contains_key(&link_type) {
            return Err(CoreError::DuplicateLinkType(link_type.to_string()));
        }
        debug!("registered link type {link_type}");
        self.links.insert(link_type, Arc::new(definition));
        Ok(())
    }

    pub fn get(&self, link_type: &str) -> Result<&Arc<LinkDefinition>, CoreError> {
        self.links
            .get(link_type)
            .ok_or_else(|| CoreError::UnknownLinkType(link_type.to_owned()))
    }

    pub fn lookup(
        &self,
        resource_type_a: &ResourceType,
        resource_type_b: &ResourceType,
    ) -> Result<&Arc<LinkDefinition>, CoreError> {
        self.get(LinkTypeId::for_pair(resource_type_a, resource_type_b).as_str())
    }

    pub fn summaries(&self) -> Vec<LinkDefinitionSummary> {
        self.links.values().map(|d| d.summary()).collect()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn stage_changes(
        &self,
        link_type: &str,
        input: &LinkStageInput,
    ) -> Result<LinkChanges, CoreError> {
        self.get(link_type)?.actions().stage_changes(input)
    }

    pub async fn update_resource_a(
        &self,
        link_type: &str,
        input: &LinkUpdateResourceInput,
        control: &CallControl,
    ) -> Result<LinkUpdateOutput, CoreError> {
        let definition = self.get(link_type)?;
        info!(
            "{} link {link_type}: updating resource A '{}'",
            input.intent, input.resource_info.resource_name
        );
        definition.actions().update_resource_a(input, control).await
    }

    pub async fn update_resource_b(
        &self,
        link_type: &str,
        input: &LinkUpdateResourceInput,
        control: &CallControl,
    ) -> Result<LinkUpdateOutput, CoreError> {
        let definition = self.get(link_type)?;
        info!(
            "{} link {link_type}: updating resource B '{}'",
            input.intent, input.resource_info.resource_name
        );
        definition.actions().update_resource_b(input, control).await
    }

    pub async fn update_intermediary_resources(
        &self,
        link_type: &str,
        input: &LinkUpdateIntermediaryInput,
        control: &CallControl,
    ) -> Result<LinkUpdateOutput, CoreError> {
        let definition = self.get(link_type)?;
        info!(
            "{} link {link_type}: updating intermediary resources between '{}' and '{}'",
            input.intent, input.resource_a_info.resource_name, input.resource_b_info.resource_name
        );
        definition
            .actions()
            .update_intermediary_resources(input, control)
            .await
    }
}
