use super::{IAM_ROLE, LAMBDA_FUNCTION};
use crate::registry::{LinkActions, LinkDefinition};
use crate::stage::{stage_link_changes, FieldMapping};
use crate::update::{call_upstream, link_data_fragment, require_str_attr, CallControl, LinkServices};
use crate::CoreError;
use async_trait::async_trait;
use serde_json::json;
use skylink_runtime::{ops, UpdateFunctionConfigurationInput};
use skylink_schema::{
    LinkChanges, LinkKind, LinkPriorityResource, LinkSide, LinkStageInput,
    LinkUpdateIntermediaryInput, LinkUpdateOutput, LinkUpdateResourceInput,
};
use std::sync::Arc;
use tracing::debug;

const ROLE: &str = "role";

const MAPPINGS: &[FieldMapping] = &[FieldMapping {
    source_side: LinkSide::B,
    source_path: "$.arn",
    target_side: LinkSide::A,
    target_field: ROLE,
}];

/// Makes an IAM role (B) the execution role of a Lambda function (A).
///
/// A function cannot run without its role, so the role must be deployed
/// first.
pub struct FunctionRoleLink {
    services: LinkServices,
}

impl FunctionRoleLink {
    pub fn new(services: LinkServices) -> Self {
        Self { services }
    }

    pub fn definition(services: LinkServices) -> LinkDefinition {
        LinkDefinition::new(
            LAMBDA_FUNCTION,
            IAM_ROLE,
            LinkKind::Hard,
            Arc::new(Self::new(services)),
        )
        .with_priority(LinkPriorityResource::ResourceB)
    }
}

#[async_trait]
impl LinkActions for FunctionRoleLink {
    fn stage_changes(&self, input: &LinkStageInput) -> Result<LinkChanges, CoreError> {
        stage_link_changes(MAPPINGS, input)
    }

    async fn update_resource_a(
        &self,
        input: &LinkUpdateResourceInput,
        control: &CallControl,
    ) -> Result<LinkUpdateOutput, CoreError> {
        let function = &input.resource_info.resource_name;
        if input.intent.is_teardown() {
            // The function is going away with its role; there is nothing to
            // detach.
            debug!("role link teardown for '{function}' needs no call");
            return Ok(LinkUpdateOutput::empty());
        }

        let function_arn = require_str_attr(&input.resource_info, "$.arn", "arn")?;
        let role_arn = require_str_attr(&input.other_resource_info, "$.arn", "arn")?;

        let lambda = self.services.lambda(&input.provider_context).await?;
        let output = call_upstream(
            control,
            ops::UPDATE_FUNCTION_CONFIGURATION,
            function,
            lambda.update_function_configuration(UpdateFunctionConfigurationInput {
                function_name: function_arn,
                role: Some(role_arn.clone()),
            }),
        )
        .await?;

        let role = output.role.unwrap_or(role_arn);
        let link_data = link_data_fragment(function, &[(ROLE, json!(role))])?;
        Ok(LinkUpdateOutput::with_link_data(link_data))
    }

    async fn update_resource_b(
        &self,
        _input: &LinkUpdateResourceInput,
        _control: &CallControl,
    ) -> Result<LinkUpdateOutput, CoreError> {
        Ok(LinkUpdateOutput::empty())
    }

    async fn update_intermediary_resources(
        &self,
        _input: &LinkUpdateIntermediaryInput,
        _control: &CallControl,
    ) -> Result<LinkUpdateOutput, CoreError> {
        Ok(LinkUpdateOutput::empty())
    }
}
