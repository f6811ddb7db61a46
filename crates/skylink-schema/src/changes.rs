//! Change-set produced by staging a link.

use crate::ConfigNode;
use serde::{Deserialize, Serialize};

/// How a single destination field relates to the current link data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldChangeClassification {
    New,
    Modified,
    Unchanged,
    RemovedKey,
    KnownOnlyAfterDeploy,
}

/// A field with a value to write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_value: Option<ConfigNode>,
    pub new_value: ConfigNode,
}

/// Outcome of comparing one source field against one destination path.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    New(ConfigNode),
    Modified { prev: ConfigNode, new: ConfigNode },
    Unchanged,
    Removed,
    KnownOnDeploy,
}

impl FieldOutcome {
    pub fn classification(&self) -> FieldChangeClassification {
        match self {
            Self::New(_) => FieldChangeClassification::New,
            Self::Modified { .. } => FieldChangeClassification::Modified,
            Self::Unchanged => FieldChangeClassification::Unchanged,
            Self::Removed => FieldChangeClassification::RemovedKey,
            Self::KnownOnDeploy => FieldChangeClassification::KnownOnlyAfterDeploy,
        }
    }
}

/// Staging output for one link instance.
///
/// A field path appears in at most one collection. Entries keep the order in
/// which they were recorded, so identical staging inputs serialize to
/// identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkChanges {
    #[serde(default)]
    pub new_fields: Vec<FieldChange>,
    #[serde(default)]
    pub modified_fields: Vec<FieldChange>,
    #[serde(default)]
    pub removed_fields: Vec<String>,
    #[serde(default)]
    pub unchanged_fields: Vec<String>,
    #[serde(default)]
    pub field_changes_known_on_deploy: Vec<String>,
}

impl LinkChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for `field_path`, replacing any earlier outcome for
    /// the same path.
    pub fn record(&mut self, field_path: impl Into<String>, outcome: FieldOutcome) {
        let field_path = field_path.into();
        self.forget(&field_path);
        match outcome {
            FieldOutcome::New(value) => self.new_fields.push(FieldChange {
                field_path,
                prev_value: None,
                new_value: value,
            }),
            FieldOutcome::Modified { prev, new } => self.modified_fields.push(FieldChange {
                field_path,
                prev_value: Some(prev),
                new_value: new,
            }),
            FieldOutcome::Unchanged => self.unchanged_fields.push(field_path),
            FieldOutcome::Removed => self.removed_fields.push(field_path),
            FieldOutcome::KnownOnDeploy => self.field_changes_known_on_deploy.push(field_path),
        }
    }

    fn forget(&mut self, field_path: &str) {
        self.new_fields.retain(|c| c.field_path != field_path);
        self.modified_fields.retain(|c| c.field_path != field_path);
        self.removed_fields.retain(|p| p != field_path);
        self.unchanged_fields.retain(|p| p != field_path);
        self.field_changes_known_on_deploy.retain(|p| p != field_path);
    }

    pub fn classification_of(&self, field_path: &str) -> Option<FieldChangeClassification> {
        if self.new_fields.iter().any(|c| c.field_path == field_path) {
            Some(FieldChangeClassification::New)
        } else if self.modified_fields.iter().any(|c| c.field_path == field_path) {
            Some(FieldChangeClassification::Modified)
        } else if self.unchanged_fields.iter().any(|p| p == field_path) {
            Some(FieldChangeClassification::Unchanged)
        } else if self.removed_fields.iter().any(|p| p == field_path) {
            Some(FieldChangeClassification::RemovedKey)
        } else if self
            .field_changes_known_on_deploy
            .iter()
            .any(|p| p == field_path)
        {
            Some(FieldChangeClassification::KnownOnlyAfterDeploy)
        } else {
            None
        }
    }

    /// Whether applying this change-set would write or remove anything.
    pub fn has_changes(&self) -> bool {
        !self.new_fields.is_empty()
            || !self.modified_fields.is_empty()
            || !self.removed_fields.is_empty()
            || !self.field_changes_known_on_deploy.is_empty()
    }

    /// Total number of classified field paths.
    pub fn len(&self) -> usize {
        self.new_fields.len()
            + self.modified_fields.len()
            + self.removed_fields.len()
            + self.unchanged_fields.len()
            + self.field_changes_known_on_deploy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Blake3 digest of the canonical JSON form.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let json = self.canonical_json()?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
