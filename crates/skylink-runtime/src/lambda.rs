use crate::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutFunctionCodeSigningConfigInput {
    /// Function name or ARN.
    pub function_name: String,
    pub code_signing_config_arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutFunctionCodeSigningConfigOutput {
    pub function_name: String,
    pub code_signing_config_arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteFunctionCodeSigningConfigInput {
    pub function_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFunctionConfigurationInput {
    pub function_name: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFunctionConfigurationOutput {
    pub function_arn: String,
    pub role: Option<String>,
}

/// Lambda API operations used by link updates.
#[async_trait]
pub trait LambdaService: Send + Sync {
    async fn put_function_code_signing_config(
        &self,
        input: PutFunctionCodeSigningConfigInput,
    ) -> Result<PutFunctionCodeSigningConfigOutput, ServiceError>;

    async fn delete_function_code_signing_config(
        &self,
        input: DeleteFunctionCodeSigningConfigInput,
    ) -> Result<(), ServiceError>;

    async fn update_function_configuration(
        &self,
        input: UpdateFunctionConfigurationInput,
    ) -> Result<UpdateFunctionConfigurationOutput, ServiceError>;
}
