use super::{colorize_classification, json_pretty, read_json, EXIT_SUCCESS};
use serde::Serialize;
use skylink_core::LinkRegistry;
use skylink_schema::{LinkChanges, LinkStageInput};
use std::path::Path;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StageReport<'a> {
    link_type: &'a str,
    fingerprint: String,
    has_changes: bool,
    changes: &'a LinkChanges,
}

pub fn run(
    registry: &LinkRegistry,
    link_type: &str,
    input_path: &Path,
    json: bool,
) -> Result<u8, String> {
    let input: LinkStageInput = read_json(input_path)?;
    let changes = registry
        .stage_changes(link_type, &input)
        .map_err(|e| e.to_string())?;
    let fingerprint = changes
        .fingerprint()
        .map_err(|e| format!("failed to fingerprint changes: {e}"))?;

    if json {
        let report = StageReport {
            link_type,
            fingerprint,
            has_changes: changes.has_changes(),
            changes: &changes,
        };
        println!("{}", json_pretty(&report)?);
        return Ok(EXIT_SUCCESS);
    }

    if changes.is_empty() {
        println!("no linked fields");
    }
    for field in &changes.new_fields {
        println!("{:<10} {} = {}", colorize_classification("new"), field.field_path, field.new_value);
    }
    for field in &changes.modified_fields {
        let prev = field
            .prev_value
            .as_ref()
            .map_or_else(|| "null".to_owned(), ToString::to_string);
        println!(
            "{:<10} {}: {prev} -> {}",
            colorize_classification("modified"),
            field.field_path,
            field.new_value
        );
    }
    for path in &changes.removed_fields {
        println!("{:<10} {path}", colorize_classification("removed"));
    }
    for path in &changes.field_changes_known_on_deploy {
        println!("{:<10} {path} (known after deploy)", colorize_classification("deploy"));
    }
    for path in &changes.unchanged_fields {
        println!("{:<10} {path}", colorize_classification("unchanged"));
    }
    println!("fingerprint: {fingerprint}");
    Ok(EXIT_SUCCESS)
}
