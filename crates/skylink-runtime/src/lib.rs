//! Cloud service clients for Skylink link updates.
//!
//! This crate defines the service-client seam the engine calls through: one
//! async trait per upstream service (`LambdaService`, `IamService`) with one
//! method per API operation, a `ClientFactory` that builds clients from a
//! `ClientConfig`, and a recording mock backend used by tests and dry runs.

pub mod factory;
pub mod iam;
pub mod lambda;
pub mod mock;

pub use factory::ClientFactory;
pub use iam::{DeleteRolePolicyInput, IamService, PutRolePolicyInput};
pub use lambda::{
    DeleteFunctionCodeSigningConfigInput, LambdaService, PutFunctionCodeSigningConfigInput,
    PutFunctionCodeSigningConfigOutput, UpdateFunctionConfigurationInput,
    UpdateFunctionConfigurationOutput,
};
pub use mock::{MockCloud, MockClientFactory, RecordedCall};

use thiserror::Error;

/// Upstream API operation names, as used in error context and the mock call log.
pub mod ops {
    pub const PUT_FUNCTION_CODE_SIGNING_CONFIG: &str = "PutFunctionCodeSigningConfig";
    pub const DELETE_FUNCTION_CODE_SIGNING_CONFIG: &str = "DeleteFunctionCodeSigningConfig";
    pub const UPDATE_FUNCTION_CONFIGURATION: &str = "UpdateFunctionConfiguration";
    pub const PUT_ROLE_POLICY: &str = "PutRolePolicy";
    pub const DELETE_ROLE_POLICY: &str = "DeleteRolePolicy";
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{code}: {message}")]
    Api { code: String, message: String },
    #[error("request throttled: {0}")]
    Throttled(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl ServiceError {
    pub fn api(code: &str, message: &str) -> Self {
        Self::Api {
            code: code.to_owned(),
            message: message.to_owned(),
        }
    }
}
