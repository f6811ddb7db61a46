//! Change staging: run every field mapping of a link type through the
//! collector and gather the results into one [`LinkChanges`].

use crate::collect::collect_parsed;
use crate::CoreError;
use skylink_schema::{FieldPath, LinkChanges, LinkSide, LinkStageInput, ResourceChanges};
use tracing::debug;

/// A spec field of one linked resource projected into the link data of a
/// resource, usually the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub source_side: LinkSide,
    /// Rooted at the source's resolved spec, e.g. `$.codeSigningConfigArn`.
    pub source_path: &'static str,
    pub target_side: LinkSide,
    /// Relative to the target's entry in the link data, e.g. `role`.
    pub target_field: &'static str,
}

impl FieldMapping {
    /// Destination path in the link data: `$["<target name>"].<target_field>`.
    pub fn destination(&self, input: &LinkStageInput) -> Result<FieldPath, CoreError> {
        let target = side(input, self.target_side);
        let relative = FieldPath::parse(self.target_field)?;
        Ok(FieldPath::for_resource(&target.resource_name, &relative))
    }
}

/// Compute the link changes for `input` under `mappings`.
///
/// Pure and deterministic. Fails with the first error encountered. Resource B
/// must always carry a resolved spec; resource A only when a mapping reads it.
pub fn stage_link_changes(
    mappings: &[FieldMapping],
    input: &LinkStageInput,
) -> Result<LinkChanges, CoreError> {
    require_resolved(&input.resource_b_changes)?;
    if mappings.iter().any(|m| m.source_side == LinkSide::A) {
        require_resolved(&input.resource_a_changes)?;
    }

    let mut changes = LinkChanges::new();
    for mapping in mappings {
        let source_path = FieldPath::parse(mapping.source_path)?;
        let destination = mapping.destination(input)?;
        collect_parsed(
            &source_path,
            &destination,
            input.current_link_data.as_ref(),
            side(input, mapping.source_side),
            &mut changes,
        )?;
    }

    debug!(
        "staged link {} -> {}: {} new, {} modified, {} removed, {} unchanged, {} known on deploy",
        input.resource_a_changes.resource_name,
        input.resource_b_changes.resource_name,
        changes.new_fields.len(),
        changes.modified_fields.len(),
        changes.removed_fields.len(),
        changes.unchanged_fields.len(),
        changes.field_changes_known_on_deploy.len()
    );
    Ok(changes)
}

fn require_resolved(changes: &ResourceChanges) -> Result<(), CoreError> {
    if changes.resolved_spec.is_none() {
        return Err(CoreError::MissingResolvedResource {
            resource_name: changes.resource_name.to_string(),
        });
    }
    Ok(())
}

fn side(input: &LinkStageInput, side: LinkSide) -> &ResourceChanges {
    match side {
        LinkSide::A => &input.resource_a_changes,
        LinkSide::B => &input.resource_b_changes,
    }
}
