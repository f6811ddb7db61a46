use super::{json_pretty, EXIT_SUCCESS};
use skylink_core::LinkRegistry;
use skylink_schema::{LinkKind, LinkPriorityResource};

pub fn run(registry: &LinkRegistry, json: bool) -> Result<u8, String> {
    let summaries = registry.summaries();
    if json {
        println!("{}", json_pretty(&summaries)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("{:<6} {:<11} {:<12} LINK_TYPE", "KIND", "PRIORITY", "ANNOTATIONS");
    for summary in &summaries {
        let kind = match summary.kind {
            LinkKind::Hard => "hard",
            LinkKind::Soft => "soft",
        };
        let priority = match summary.priority_resource {
            LinkPriorityResource::None => "none",
            LinkPriorityResource::ResourceA => "resourceA",
            LinkPriorityResource::ResourceB => "resourceB",
        };
        println!(
            "{:<6} {:<11} {:<12} {}",
            kind,
            priority,
            summary.annotations.len(),
            summary.link_type
        );
        for name in summary.annotations.keys() {
            println!("{:<31} @ {name}", "");
        }
    }
    Ok(EXIT_SUCCESS)
}
