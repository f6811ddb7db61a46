use crate::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutRolePolicyInput {
    pub role_name: String,
    pub policy_name: String,
    /// JSON policy document.
    pub policy_document: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRolePolicyInput {
    pub role_name: String,
    pub policy_name: String,
}

/// IAM API operations used by link updates.
#[async_trait]
pub trait IamService: Send + Sync {
    async fn put_role_policy(&self, input: PutRolePolicyInput) -> Result<(), ServiceError>;

    async fn delete_role_policy(&self, input: DeleteRolePolicyInput) -> Result<(), ServiceError>;
}
