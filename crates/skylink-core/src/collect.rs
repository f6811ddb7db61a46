//! Field-change collector: classify one source field against the committed
//! link data.

use crate::CoreError;
use skylink_schema::{FieldOutcome, FieldPath, LinkChanges, LinkData, ResourceChanges};
use tracing::trace;

/// Classify one projected field and record it in `out`.
///
/// `source_path` is rooted at the source resource's resolved spec, e.g.
/// `$.codeSigningConfigArn`. `destination_path` is rooted at the link data,
/// e.g. `$["orders"].codeSigningConfigArn`, and is recorded without its `$`.
pub fn collect_link_field_changes(
    source_path: &str,
    destination_path: &str,
    current_link_data: Option<&LinkData>,
    source: &ResourceChanges,
    out: &mut LinkChanges,
) -> Result<(), CoreError> {
    let source_path = FieldPath::parse(source_path)?;
    let destination = FieldPath::parse(destination_path)?;
    collect_parsed(&source_path, &destination, current_link_data, source, out)
}

/// Same as [`collect_link_field_changes`] for already parsed paths.
pub fn collect_parsed(
    source_path: &FieldPath,
    destination: &FieldPath,
    current_link_data: Option<&LinkData>,
    source: &ResourceChanges,
    out: &mut LinkChanges,
) -> Result<(), CoreError> {
    let Some(resolved) = source.resolved_spec.as_ref() else {
        return Err(CoreError::MissingResolvedResource {
            resource_name: source.resource_name.to_string(),
        });
    };

    let field_path = destination.render_without_root();

    // Nothing meaningful to compare until the value exists.
    if source.is_known_on_deploy(source_path) {
        trace!("{field_path}: known on deploy");
        out.record(field_path, FieldOutcome::KnownOnDeploy);
        return Ok(());
    }

    let new_value = source_path.resolve(resolved);
    let current_value = current_link_data.and_then(|data| destination.resolve(data));

    let outcome = match (current_value, new_value) {
        (Some(current), Some(new)) if current == new => FieldOutcome::Unchanged,
        (Some(current), Some(new)) => FieldOutcome::Modified {
            prev: current.clone(),
            new: new.clone(),
        },
        (None, Some(new)) => FieldOutcome::New(new.clone()),
        (Some(_), None) => FieldOutcome::Removed,
        (None, None) => return Ok(()),
    };
    trace!("{field_path}: {:?}", outcome.classification());
    out.record(field_path, outcome);
    Ok(())
}
