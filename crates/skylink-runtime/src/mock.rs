use crate::factory::ClientFactory;
use crate::iam::{DeleteRolePolicyInput, IamService, PutRolePolicyInput};
use crate::lambda::{
    DeleteFunctionCodeSigningConfigInput, LambdaService, PutFunctionCodeSigningConfigInput,
    PutFunctionCodeSigningConfigOutput, UpdateFunctionConfigurationInput,
    UpdateFunctionConfigurationOutput,
};
use crate::{ops, ServiceError};
use async_trait::async_trait;
use serde::Serialize;
use skylink_session::ClientConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// A mutating call received by the mock backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "operation")]
pub enum RecordedCall {
    PutFunctionCodeSigningConfig {
        region: String,
        function_name: String,
        code_signing_config_arn: String,
    },
    DeleteFunctionCodeSigningConfig {
        region: String,
        function_name: String,
    },
    UpdateFunctionConfiguration {
        region: String,
        function_name: String,
        role: Option<String>,
    },
    PutRolePolicy {
        region: String,
        role_name: String,
        policy_name: String,
        policy_document: String,
    },
    DeleteRolePolicy {
        region: String,
        role_name: String,
        policy_name: String,
    },
}

/// Shared state behind every client handed out by a [`MockClientFactory`].
///
/// Records calls in arrival order. Failures can be injected per operation
/// name, and an artificial latency is applied before a call is recorded, so
/// a call abandoned mid-flight leaves no trace.
#[derive(Default)]
pub struct MockCloud {
    calls: Mutex<Vec<RecordedCall>>,
    failures: Mutex<HashMap<String, ServiceError>>,
    latency: Mutex<Option<Duration>>,
    configs: Mutex<Vec<ClientConfig>>,
}

impl MockCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Configs passed to the factory, one per client built.
    pub fn configs_seen(&self) -> Vec<ClientConfig> {
        self.configs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make every subsequent call of `operation` fail with `error`.
    pub fn fail_operation(&self, operation: &str, error: ServiceError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(operation.to_owned(), error);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = Some(latency);
    }

    async fn handle(&self, operation: &str, call: RecordedCall) -> Result<(), ServiceError> {
        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let failure = self
            .failures
            .lock()
            .map_err(|e| ServiceError::Transport(format!("mutex poisoned: {e}")))?
            .get(operation)
            .cloned();
        if let Some(error) = failure {
            return Err(error);
        }

        tracing::debug!("mock {operation}");
        self.calls
            .lock()
            .map_err(|e| ServiceError::Transport(format!("mutex poisoned: {e}")))?
            .push(call);
        Ok(())
    }
}

/// Client factory backed by a shared [`MockCloud`].
#[derive(Default, Clone)]
pub struct MockClientFactory {
    cloud: Arc<MockCloud>,
}

impl MockClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cloud(&self) -> Arc<MockCloud> {
        Arc::clone(&self.cloud)
    }

    fn remember(&self, config: &ClientConfig) {
        self.cloud
            .configs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(config.clone());
    }
}

impl ClientFactory for MockClientFactory {
    fn lambda(&self, config: &ClientConfig) -> Arc<dyn LambdaService> {
        self.remember(config);
        Arc::new(MockLambda {
            cloud: Arc::clone(&self.cloud),
            region: config.region.clone(),
        })
    }

    fn iam(&self, config: &ClientConfig) -> Arc<dyn IamService> {
        self.remember(config);
        Arc::new(MockIam {
            cloud: Arc::clone(&self.cloud),
            region: config.region.clone(),
        })
    }
}

struct MockLambda {
    cloud: Arc<MockCloud>,
    region: String,
}

#[async_trait]
impl LambdaService for MockLambda {
    async fn put_function_code_signing_config(
        &self,
        input: PutFunctionCodeSigningConfigInput,
    ) -> Result<PutFunctionCodeSigningConfigOutput, ServiceError> {
        self.cloud
            .handle(
                ops::PUT_FUNCTION_CODE_SIGNING_CONFIG,
                RecordedCall::PutFunctionCodeSigningConfig {
                    region: self.region.clone(),
                    function_name: input.function_name.clone(),
                    code_signing_config_arn: input.code_signing_config_arn.clone(),
                },
            )
            .await?;
        Ok(PutFunctionCodeSigningConfigOutput {
            function_name: input.function_name,
            code_signing_config_arn: input.code_signing_config_arn,
        })
    }

    async fn delete_function_code_signing_config(
        &self,
        input: DeleteFunctionCodeSigningConfigInput,
    ) -> Result<(), ServiceError> {
        self.cloud
            .handle(
                ops::DELETE_FUNCTION_CODE_SIGNING_CONFIG,
                RecordedCall::DeleteFunctionCodeSigningConfig {
                    region: self.region.clone(),
                    function_name: input.function_name,
                },
            )
            .await
    }

    async fn update_function_configuration(
        &self,
        input: UpdateFunctionConfigurationInput,
    ) -> Result<UpdateFunctionConfigurationOutput, ServiceError> {
        self.cloud
            .handle(
                ops::UPDATE_FUNCTION_CONFIGURATION,
                RecordedCall::UpdateFunctionConfiguration {
                    region: self.region.clone(),
                    function_name: input.function_name.clone(),
                    role: input.role.clone(),
                },
            )
            .await?;
        Ok(UpdateFunctionConfigurationOutput {
            function_arn: input.function_name,
            role: input.role,
        })
    }
}

struct MockIam {
    cloud: Arc<MockCloud>,
    region: String,
}

#[async_trait]
impl IamService for MockIam {
    async fn put_role_policy(&self, input: PutRolePolicyInput) -> Result<(), ServiceError> {
        self.cloud
            .handle(
                ops::PUT_ROLE_POLICY,
                RecordedCall::PutRolePolicy {
                    region: self.region.clone(),
                    role_name: input.role_name,
                    policy_name: input.policy_name,
                    policy_document: input.policy_document,
                },
            )
            .await
    }

    async fn delete_role_policy(&self, input: DeleteRolePolicyInput) -> Result<(), ServiceError> {
        self.cloud
            .handle(
                ops::DELETE_ROLE_POLICY,
                RecordedCall::DeleteRolePolicy {
                    region: self.region.clone(),
                    role_name: input.role_name,
                    policy_name: input.policy_name,
                },
            )
            .await
    }
}
