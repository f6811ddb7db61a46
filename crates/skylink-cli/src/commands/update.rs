use super::{json_pretty, mock_registry, read_json_value, EXIT_SUCCESS};
use clap::ValueEnum;
use serde::Serialize;
use skylink_core::CallControl;
use skylink_runtime::RecordedCall;
use skylink_schema::{
    LinkData, LinkUpdateIntent, LinkUpdateIntermediaryInput, LinkUpdateResourceInput,
};
use skylink_session::ProviderConfig;
use std::path::Path;

/// Which update hook of a link to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UpdateTarget {
    A,
    B,
    Intermediaries,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateReport {
    link_data: LinkData,
    calls: Vec<RecordedCall>,
}

pub fn run(
    config: ProviderConfig,
    link_type: &str,
    input_path: &Path,
    target: UpdateTarget,
    intent: Option<LinkUpdateIntent>,
    json: bool,
) -> Result<u8, String> {
    let mut raw = read_json_value(input_path)?;
    if let Some(intent) = intent {
        let object = raw
            .as_object_mut()
            .ok_or_else(|| format!("input error: {} must hold a JSON object", input_path.display()))?;
        object.insert("intent".to_owned(), serde_json::json!(intent));
    }

    let mut control = CallControl::new();
    if let Some(timeout) = config.call_timeout() {
        control = control.with_timeout(timeout);
    }
    let (registry, factory) = mock_registry(config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start async runtime: {e}"))?;

    let output = match target {
        UpdateTarget::A | UpdateTarget::B => {
            let input: LinkUpdateResourceInput = parse_input(raw, input_path)?;
            runtime.block_on(async {
                if target == UpdateTarget::A {
                    registry.update_resource_a(link_type, &input, &control).await
                } else {
                    registry.update_resource_b(link_type, &input, &control).await
                }
            })
        }
        UpdateTarget::Intermediaries => {
            let input: LinkUpdateIntermediaryInput = parse_input(raw, input_path)?;
            runtime.block_on(registry.update_intermediary_resources(link_type, &input, &control))
        }
    }
    .map_err(|e| e.to_string())?;

    let report = UpdateReport {
        link_data: output.link_data,
        calls: factory.cloud().calls(),
    };
    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        println!("link data: {}", json_pretty(&report.link_data)?);
        if report.calls.is_empty() {
            println!("no upstream calls");
        }
        for call in &report.calls {
            println!("call: {}", serde_json::to_string(call).map_err(|e| e.to_string())?);
        }
    }
    Ok(EXIT_SUCCESS)
}

fn parse_input<T: serde::de::DeserializeOwned>(
    raw: serde_json::Value,
    path: &Path,
) -> Result<T, String> {
    serde_json::from_value(raw)
        .map_err(|e| format!("input error: {} is not a valid update input: {e}", path.display()))
}
