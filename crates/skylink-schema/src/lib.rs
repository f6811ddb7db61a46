//! Data model for the Skylink link engine.
//!
//! This crate defines the schema layer: semi-structured config trees
//! (`ConfigNode`), path expressions over them (`FieldPath`), link type
//! descriptors (`LinkKind`, `AnnotationDefinition`), the staging change-set
//! (`LinkChanges`), and the envelopes the host sends for staging and update calls.

pub mod changes;
pub mod context;
pub mod input;
pub mod link;
pub mod path;
pub mod types;

pub use changes::{FieldChange, FieldChangeClassification, FieldOutcome, LinkChanges};
pub use context::{ProviderContext, VAR_ENDPOINT_URL, VAR_PROFILE, VAR_REGION};
pub use input::{
    LinkStageInput, LinkUpdateIntermediaryInput, LinkUpdateOutput, LinkUpdateResourceInput,
    ResourceChanges, ResourceInfo,
};
pub use link::{
    AnnotationDefinition, AnnotationType, LinkDefinitionSummary, LinkKind, LinkPriorityResource,
    LinkSide, LinkUpdateIntent,
};
pub use path::{resolve, resolve_str, FieldPath, PathError, PathSegment, MAX_INSERT_INDEX};
pub use types::{LinkTypeId, ResourceName, ResourceType};

/// A semi-structured configuration value: scalar, ordered sequence, or
/// ordered string-keyed mapping.
pub type ConfigNode = serde_json::Value;

/// Committed output of a link update, keyed by resource instance name.
pub type LinkData = ConfigNode;
