use super::{LAMBDA_CODE_SIGNING_CONFIG, LAMBDA_FUNCTION};
use crate::registry::{LinkActions, LinkDefinition};
use crate::stage::{stage_link_changes, FieldMapping};
use crate::update::{call_upstream, link_data_fragment, require_str_attr, CallControl, LinkServices};
use crate::CoreError;
use async_trait::async_trait;
use serde_json::json;
use skylink_runtime::{
    ops, DeleteFunctionCodeSigningConfigInput, PutFunctionCodeSigningConfigInput,
};
use skylink_schema::{
    LinkChanges, LinkKind, LinkPriorityResource, LinkSide, LinkStageInput,
    LinkUpdateIntermediaryInput, LinkUpdateOutput, LinkUpdateResourceInput,
};
use std::sync::Arc;
use tracing::debug;

const CODE_SIGNING_CONFIG_ARN: &str = "codeSigningConfigArn";

const MAPPINGS: &[FieldMapping] = &[FieldMapping {
    source_side: LinkSide::B,
    source_path: "$.codeSigningConfigArn",
    target_side: LinkSide::A,
    target_field: CODE_SIGNING_CONFIG_ARN,
}];

/// Attaches a code signing config (B) to a Lambda function (A).
///
/// All live changes land on the function; the code signing config itself is
/// never modified.
pub struct FunctionCodeSigningConfigLink {
    services: LinkServices,
}

impl FunctionCodeSigningConfigLink {
    pub fn new(services: LinkServices) -> Self {
        Self { services }
    }

    pub fn definition(services: LinkServices) -> LinkDefinition {
        LinkDefinition::new(
            LAMBDA_FUNCTION,
            LAMBDA_CODE_SIGNING_CONFIG,
            LinkKind::Soft,
            Arc::new(Self::new(services)),
        )
        .with_priority(LinkPriorityResource::ResourceA)
    }

    async fn attach(
        &self,
        input: &LinkUpdateResourceInput,
        control: &CallControl,
    ) -> Result<LinkUpdateOutput, CoreError> {
        let function_arn = require_str_attr(&input.resource_info, "$.arn", "arn")?;
        let config_arn = require_str_attr(
            &input.other_resource_info,
            "$.codeSigningConfigArn",
            CODE_SIGNING_CONFIG_ARN,
        )?;

        let lambda = self.services.lambda(&input.provider_context).await?;
        let function = &input.resource_info.resource_name;
        let output = call_upstream(
            control,
            ops::PUT_FUNCTION_CODE_SIGNING_CONFIG,
            function,
            lambda.put_function_code_signing_config(PutFunctionCodeSigningConfigInput {
                function_name: function_arn,
                code_signing_config_arn: config_arn,
            }),
        )
        .await?;

        let link_data = link_data_fragment(
            function,
            &[(CODE_SIGNING_CONFIG_ARN, json!(output.code_signing_config_arn))],
        )?;
        Ok(LinkUpdateOutput::with_link_data(link_data))
    }

    async fn detach(
        &self,
        input: &LinkUpdateResourceInput,
        control: &CallControl,
    ) -> Result<LinkUpdateOutput, CoreError> {
        let function_arn = require_str_attr(&input.resource_info, "$.arn", "arn")?;

        let lambda = self.services.lambda(&input.provider_context).await?;
        call_upstream(
            control,
            ops::DELETE_FUNCTION_CODE_SIGNING_CONFIG,
            &input.resource_info.resource_name,
            lambda.delete_function_code_signing_config(DeleteFunctionCodeSigningConfigInput {
                function_name: function_arn,
            }),
        )
        .await?;
        Ok(LinkUpdateOutput::empty())
    }
}

#[async_trait]
impl LinkActions for FunctionCodeSigningConfigLink {
    fn stage_changes(&self, input: &LinkStageInput) -> Result<LinkChanges, CoreError> {
        stage_link_changes(MAPPINGS, input)
    }

    async fn update_resource_a(
        &self,
        input: &LinkUpdateResourceInput,
        control: &CallControl,
    ) -> Result<LinkUpdateOutput, CoreError> {
        if input.intent.is_teardown() {
            self.detach(input, control).await
        } else {
            self.attach(input, control).await
        }
    }

    async fn update_resource_b(
        &self,
        input: &LinkUpdateResourceInput,
        _control: &CallControl,
    ) -> Result<LinkUpdateOutput, CoreError> {
        debug!(
            "code signing config '{}' needs no changes for its link",
            input.resource_info.resource_name
        );
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
