//! Built-in link types.

mod code_signing;
mod execution_role;
mod invoke;

pub use code_signing::FunctionCodeSigningConfigLink;
pub use execution_role::FunctionRoleLink;
pub use invoke::{FunctionInvokeLink, INVOKE_POLICY_NAME_ANNOTATION};

use crate::registry::{LinkDefinition, LinkRegistry};
use crate::update::LinkServices;
use crate::CoreError;
use tracing::info;

pub const LAMBDA_FUNCTION: &str = "aws/lambda/function";
pub const LAMBDA_CODE_SIGNING_CONFIG: &str = "aws/lambda/codeSigningConfig";
pub const IAM_ROLE: &str = "aws/iam/role";

/// Definitions of every built-in link type, wired to `services`.
pub fn builtin_definitions(services: &LinkServices) -> Vec<LinkDefinition> {
    vec![
        FunctionCodeSigningConfigLink::definition(services.clone()),
        FunctionRoleLink::definition(services.clone()),
        FunctionInvokeLink::definition(services.clone()),
    ]
}

impl LinkRegistry {
    /// A registry holding every built-in link type.
    pub fn with_defaults(services: &LinkServices) -> Result<Self, CoreError> {
        let mut registry = Self::new();
        for definition in builtin_definitions(services) {
            registry.register(definition)?;
        }
        info!("link registry ready with {} link types", registry.len());
        Ok(registry)
    }
}
