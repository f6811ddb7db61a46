//! Link change-staging and update engine for Skylink.
//!
//! This crate reconciles two independently managed resources joined by a
//! link. Staging (`stage_link_changes`) is a pure diff of the link's field
//! mappings against the current link data. Updates (`LinkActions`) converge
//! or tear down live state with exactly one upstream call per invocation and
//! return the new link data fragment. Link types are registered once in a
//! `LinkRegistry` that the host constructs and passes down.

pub mod collect;
pub mod links;
pub mod registry;
pub mod stage;
pub mod update;

pub use collect::{collect_link_field_changes, collect_parsed};
pub use registry::{LinkActions, LinkDefinition, LinkRegistry};
pub use stage::{stage_link_changes, FieldMapping};
pub use update::{call_upstream, link_data_fragment, require_str_attr, CallControl, LinkServices};

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("resolved spec for resource '{resource_name}' is missing; it must be computed before the link can be staged")]
    MissingResolvedResource { resource_name: String },
    #[error("resource '{resource_name}' is missing required attribute '{attribute}' in its current state")]
    MissingRequiredAttribute {
        resource_name: String,
        attribute: String,
    },
    #[error("{operation} failed for resource '{resource_name}': {source}")]
    Upstream {
        operation: &'static str,
        resource_name: String,
        #[source]
        source: skylink_runtime::ServiceError,
    },
    #[error(transparent)]
    CacheDerivation(#[from] skylink_session::SessionError),
    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },
    #[error("{operation} exceeded its deadline of {timeout:?}")]
    DeadlineExceeded {
        operation: &'static str,
        timeout: Duration,
    },
    #[error("unknown link type: {0}")]
    UnknownLinkType(String),
    #[error("link type already registered: {0}")]
    DuplicateLinkType(String),
    #[error("invalid field path: {0}")]
    InvalidPath(#[from] skylink_schema::PathError),
}
