use super::LAMBDA_FUNCTION;
use crate::registry::{LinkActions, LinkDefinition};
use crate::stage::{stage_link_changes, FieldMapping};
use crate::update::{call_upstream, link_data_fragment, require_str_attr, CallControl, LinkServices};
use crate::CoreError;
use async_trait::async_trait;
use serde_json::json;
use skylink_runtime::{ops, DeleteRolePolicyInput, PutRolePolicyInput};
use skylink_schema::{
    AnnotationDefinition, AnnotationType, FieldPath, LinkChanges, LinkKind, LinkSide,
    LinkStageInput, LinkUpdateIntermediaryInput, LinkUpdateOutput, LinkUpdateResourceInput,
    PathSegment, ResourceInfo,
};
use std::sync::Arc;

/// Annotation on function A overriding the name of the inline invoke policy.
pub const INVOKE_POLICY_NAME_ANNOTATION: &str = "aws.lambda.function.invoke.policyName";

const DEFAULT_POLICY_PREFIX: &str = "skylink-invoke-";

/// Link data field under A holding what `grant` created.
const POLICY_FIELD: &str = "invokePolicy";

const MAPPINGS: &[FieldMapping] = &[
    FieldMapping {
        source_side: LinkSide::A,
        source_path: "$.role",
        target_side: LinkSide::A,
        target_field: "invokePolicy.roleArn",
    },
    FieldMapping {
        source_side: LinkSide::B,
        source_path: "$.arn",
        target_side: LinkSide::A,
        target_field: "invokePolicy.targetArn",
    },
];

/// Lets function A invoke function B.
///
/// Realised as an inline policy on A's execution role, which is the
/// intermediary resource; neither function is modified. The committed link
/// data records the staged fields plus the role and policy names, so that
/// teardown removes the policy that was actually created.
pub struct FunctionInvokeLink {
    services: LinkServices,
}

impl FunctionInvokeLink {
    pub fn new(services: LinkServices) -> Self {
        Self { services }
    }

    pub fn definition(services: LinkServices) -> LinkDefinition {
        LinkDefinition::new(
            LAMBDA_FUNCTION,
            LAMBDA_FUNCTION,
            LinkKind::Soft,
            Arc::new(Self::new(services)),
        )
        .with_annotation(
            AnnotationDefinition::new(INVOKE_POLICY_NAME_ANNOTATION, AnnotationType::String)
                .with_label("Invoke policy name")
                .with_description(
                    "Name of the inline policy added to the caller's execution role. \
                     Defaults to skylink-invoke-<target resource name>.",
                )
                .with_example(json!("orders-invoke-billing")),
        )
    }

    async fn grant(
        &self,
        input: &LinkUpdateIntermediaryInput,
        control: &CallControl,
    ) -> Result<LinkUpdateOutput, CoreError> {
        let caller = &input.resource_a_info;
        let role_arn = require_str_attr(caller, "$.role", "role")?;
        let role_name = role_name(caller, &role_arn)?;
        let target_arn = require_str_attr(&input.resource_b_info, "$.arn", "arn")?;
        let policy_name = policy_name(input);

        let policy_document = json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Action": "lambda:InvokeFunction",
                "Resource": target_arn,
            }],
        })
        .to_string();

        let iam = self.services.iam(&input.provider_context).await?;
        call_upstream(
            control,
            ops::PUT_ROLE_POLICY,
            &caller.resource_name,
            iam.put_role_policy(PutRolePolicyInput {
                role_name: role_name.clone(),
                policy_name: policy_name.clone(),
                policy_document,
            }),
        )
        .await?;

        let link_data = link_data_fragment(
            &caller.resource_name,
            &[
                ("invokePolicy.roleArn", json!(role_arn)),
                ("invokePolicy.roleName", json!(role_name)),
                ("invokePolicy.policyName", json!(policy_name)),
                ("invokePolicy.targetArn", json!(target_arn)),
            ],
        )?;
        Ok(LinkUpdateOutput::with_link_data(link_data))
    }

    async fn revoke(
        &self,
        input: &LinkUpdateIntermediaryInput,
        control: &CallControl,
    ) -> Result<LinkUpdateOutput, CoreError> {
        let caller = &input.resource_a_info;
        let role_name = match committed_policy_field(input, "roleName") {
            Some(name) => name,
            None => {
                let role_arn = require_str_attr(caller, "$.role", "role")?;
                role_name(caller, &role_arn)?
            }
        };
        let policy_name =
            committed_policy_field(input, "policyName").unwrap_or_else(|| policy_name(input));

        let iam = self.services.iam(&input.provider_context).await?;
        call_upstream(
            control,
            ops::DELETE_ROLE_POLICY,
            &caller.resource_name,
            iam.delete_role_policy(DeleteRolePolicyInput {
                role_name,
                policy_name,
            }),
        )
        .await?;
        Ok(LinkUpdateOutput::empty())
    }
}

/// Role name from a role ARN such as `arn:aws:iam::123:role/service/orders`.
fn role_name(info: &ResourceInfo, role_arn: &str) -> Result<String, CoreError> {
    role_arn
        .split_once(":role/")
        .and_then(|(_, path)| path.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| CoreError::MissingRequiredAttribute {
            resource_name: info.resource_name.to_string(),
            attribute: "role".to_owned(),
        })
}

/// A non-empty string field of the policy recorded under A by an earlier grant.
fn committed_policy_field(input: &LinkUpdateIntermediaryInput, field: &str) -> Option<String> {
    let data = input.current_link_data.as_ref()?;
    let relative = FieldPath::root()
        .join(PathSegment::Field(POLICY_FIELD.to_owned()))
        .join(PathSegment::Field(field.to_owned()));
    FieldPath::for_resource(&input.resource_a_info.resource_name, &relative)
        .resolve(data)?
        .as_str()
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

fn policy_name(input: &LinkUpdateIntermediaryInput) -> String {
    input
        .resource_a_info
        .annotations
        .get(INVOKE_POLICY_NAME_ANNOTATION)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map_or_else(
            || format!("{DEFAULT_POLICY_PREFIX}{}", input.resource_b_info.resource_name),
            str::to_owned,
        )
}

#[async_trait]
impl LinkActions for FunctionInvokeLink {
    fn stage_changes(&self, input: &LinkStageInput) -> Result<LinkChanges, CoreError> {
        stage_link_changes(MAPPINGS, input)
    }

    async fn update_resource_a(
        &self,
        _input: &LinkUpdateResourceInput,
        _control: &CallControl,
    ) -> Result<LinkUpdateOutput, CoreError> {
        Ok(LinkUpdateOutput::empty())
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
        input: &LinkUpdateIntermediaryInput,
        control: &CallControl,
    ) -> Result<LinkUpdateOutput, CoreError> {
        if input.intent.is_teardown() {
            self.revoke(input, control).await
        } else {
            self.grant(input, control).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skylink_schema::{LinkUpdateIntent, ProviderContext};

    fn input(annotation: Option<&str>) -> LinkUpdateIntermediaryInput {
        let mut caller = ResourceInfo::new("orders");
        if let Some(name) = annotation {
            caller = caller.with_annotation(INVOKE_POLICY_NAME_ANNOTATION, json!(name));
        }
        LinkUpdateIntermediaryInput {
            changes: LinkChanges::new(),
            current_link_data: None,
            resource_a_info: caller,
            resource_b_info: ResourceInfo::new("billing"),
            intent: LinkUpdateIntent::Create,
            provider_context: ProviderContext::new(),
        }
    }

    #[test]
    fn role_name_takes_last_path_segment() {
        let info = ResourceInfo::new("orders");
        assert_eq!(
            role_name(&info, "arn:aws:iam::123456789012:role/orders-role").unwrap(),
            "orders-role"
        );
        assert_eq!(
            role_name(&info, "arn:aws:iam::123456789012:role/service-role/orders-role").unwrap(),
            "orders-role"
        );
    }

    #[test]
    fn role_name_rejects_non_role_arn() {
        let info = ResourceInfo::new("orders");
        for arn in ["arn:aws:iam::1:user/bob", "arn:aws:iam::1:role/", "nonsense"] {
            assert!(matches!(
                role_name(&info, arn),
                Err(CoreError::MissingRequiredAttribute { .. })
            ));
        }
    }

    #[test]
    fn policy_name_defaults_to_target() {
        assert_eq!(policy_name(&input(None)), "skylink-invoke-billing");
        assert_eq!(policy_name(&input(Some("  "))), "skylink-invoke-billing");
        assert_eq!(policy_name(&input(Some("custom"))), "custom");
    }

    #[test]
    fn committed_policy_field_reads_callers_entry() {
        let mut input = input(None);
        assert_eq!(committed_policy_field(&input, "policyName"), None);

        input.current_link_data = Some(json!({
            "orders": {"invokePolicy": {"policyName": "first-name", "roleName": ""}},
            "billing": {"invokePolicy": {"roleName": "billing-role"}}
        }));
        assert_eq!(
            committed_policy_field(&input, "policyName").as_deref(),
            Some("first-name")
        );
        assert_eq!(committed_policy_field(&input, "roleName"), None);
    }
}
