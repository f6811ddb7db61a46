//! Shared plumbing for link update hooks.
//!
//! Every update branch follows the same shape: extract the identifiers it
//! needs from current state, obtain a client for the session, make exactly
//! one upstream call under the caller's [`CallControl`], and return a fresh
//! link data fragment. The helpers here keep the branches themselves short.

use crate::CoreError;
use skylink_runtime::{ClientFactory, IamService, LambdaService, ServiceError};
use skylink_schema::{
    resolve_str, ConfigNode, FieldPath, LinkData, ProviderContext, ResourceInfo, ResourceName,
};
use skylink_session::cache::Metadata;
use skylink_session::ConfigSource;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Cancellation and deadline for the upstream call of one update.
#[derive(Debug, Clone, Default)]
pub struct CallControl {
    pub cancel: CancellationToken,
    /// `None` waits for the upstream call indefinitely.
    pub timeout: Option<Duration>,
}

impl CallControl {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Collaborators update hooks use to reach the cloud.
#[derive(Clone)]
pub struct LinkServices {
    pub configs: Arc<dyn ConfigSource>,
    pub clients: Arc<dyn ClientFactory>,
}

impl LinkServices {
    pub fn new(configs: Arc<dyn ConfigSource>, clients: Arc<dyn ClientFactory>) -> Self {
        Self { configs, clients }
    }

    pub async fn lambda(&self, ctx: &ProviderContext) -> Result<Arc<dyn LambdaService>, CoreError> {
        let config = self.configs.get_config(ctx, &Metadata::new()).await?;
        Ok(self.clients.lambda(&config))
    }

    pub async fn iam(&self, ctx: &ProviderContext) -> Result<Arc<dyn IamService>, CoreError> {
        let config = self.configs.get_config(ctx, &Metadata::new()).await?;
        Ok(self.clients.iam(&config))
    }
}

/// Read a non-empty string attribute from a resource's current state.
///
/// Only current state is consulted; a resource that has not been deployed
/// yet has no identifiers to act on.
pub fn require_str_attr(
    info: &ResourceInfo,
    path: &str,
    attribute: &str,
) -> Result<String, CoreError> {
    info.current_state
        .as_ref()
        .and_then(|state| resolve_str(path, state))
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| CoreError::MissingRequiredAttribute {
            resource_name: info.resource_name.to_string(),
            attribute: attribute.to_owned(),
        })
}

/// Build link data holding `fields` under `$["<resource>"]`.
pub fn link_data_fragment(
    resource: &ResourceName,
    fields: &[(&str, ConfigNode)],
) -> Result<LinkData, CoreError> {
    let mut data = ConfigNode::Object(serde_json::Map::new());
    for (field, value) in fields {
        let path = FieldPath::for_resource(resource, &FieldPath::parse(field)?);
        path.insert(&mut data, value.clone())?;
    }
    Ok(data)
}

/// Drive one upstream call under `control`.
///
/// A token already cancelled short-circuits before the call is issued.
/// Otherwise the call races the token and the deadline; whichever finishes
/// first decides the result.
pub async fn call_upstream<T, F>(
    control: &CallControl,
    operation: &'static str,
    resource_name: &ResourceName,
    call: F,
) -> Result<T, CoreError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    if control.cancel.is_cancelled() {
        return Err(CoreError::Cancelled { operation });
    }
    debug!("{operation} for {resource_name}");

    let guarded = async {
        let outcome = match control.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, call).await {
                Ok(outcome) => outcome,
                Err(_) => return Err(CoreError::DeadlineExceeded { operation, timeout }),
            },
            None => call.await,
        };
        outcome.map_err(|source| CoreError::Upstream {
            operation,
            resource_name: resource_name.to_string(),
            source,
        })
    };

    tokio::select! {
        biased;
        () = control.cancel.cancelled() => Err(CoreError::Cancelled { operation }),
        result = guarded => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(state: Option<serde_json::Value>) -> ResourceInfo {
        let info = ResourceInfo::new("orders");
        match state {
            Some(state) => info.with_current_state(state),
            None => info,
        }
    }

    #[test]
    fn require_reads_current_state() {
        let arn = require_str_attr(&info(Some(json!({"arn": "arn:fn"}))), "$.arn", "arn").unwrap();
        assert_eq!(arn, "arn:fn");
    }

    #[test]
    fn require_rejects_missing_blank_and_non_string() {
        for state in [None, Some(json!({})), Some(json!({"arn": ""})), Some(json!({"arn": 3}))] {
            let err = require_str_attr(&info(state), "$.arn", "arn").unwrap_err();
            assert!(matches!(
                err,
                CoreError::MissingRequiredAttribute { ref resource_name, ref attribute }
                    if resource_name == "orders" && attribute == "arn"
            ));
        }
    }

    #[test]
    fn fragment_nests_under_resource() {
        let data = link_data_fragment(
            &ResourceName::new("orders"),
            &[("role", json!("arn:role")), ("invokePolicy.policyName", json!("p"))],
        )
        .unwrap();
        assert_eq!(
            data,
            json!({"orders": {"role": "arn:role", "invokePolicy": {"policyName": "p"}}})
        );
    }

    #[tokio::test]
    async fn upstream_error_is_wrapped() {
        let err = call_upstream::<(), _>(
            &CallControl::new(),
            "PutRolePolicy",
            &ResourceName::new("orders"),
            async { Err(ServiceError::Throttled("slow down".to_owned())) },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Upstream { operation: "PutRolePolicy", ref resource_name, .. } if resource_name == "orders"
        ));
    }

    #[tokio::test]
    async fn pre_cancelled_token_skips_call() {
        let control = CallControl::new();
        control.cancel.cancel();
        let err = call_upstream::<(), _>(
            &control,
            "PutRolePolicy",
            &ResourceName::new("orders"),
            async { Err(ServiceError::Transport("reached the wire".to_owned())) },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CoreError::Cancelled { operation: "PutRolePolicy" }));
    }

    #[tokio::test]
    async fn deadline_is_enforced() {
        let control = CallControl::new().with_timeout(Duration::from_millis(50));
        let err = call_upstream::<(), _>(&control, "PutRolePolicy", &ResourceName::new("orders"), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, CoreError::DeadlineExceeded { .. }));
    }
}
