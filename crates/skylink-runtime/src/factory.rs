use crate::iam::IamService;
use crate::lambda::LambdaService;
use skylink_session::ClientConfig;
use std::sync::Arc;

/// Builds service clients for a client config.
///
/// Construction is expected to be cheap and infallible; credential or
/// endpoint problems surface on the first call.
pub trait ClientFactory: Send + Sync {
    fn lambda(&self, config: &ClientConfig) -> Arc<dyn LambdaService>;

    fn iam(&self, config: &ClientConfig) -> Arc<dyn IamService>;
}
