use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;
use skylink_core::{collect_link_field_changes, stage_link_changes, FieldMapping};
use skylink_schema::{LinkChanges, LinkSide, LinkStageInput, ProviderContext, ResourceChanges};
use std::hint::black_box;

const MAPPINGS: &[FieldMapping] = &[
    FieldMapping {
        source_side: LinkSide::B,
        source_path: "$.codeSigningConfigArn",
        target_side: LinkSide::A,
        target_field: "codeSigningConfigArn",
    },
    FieldMapping {
        source_side: LinkSide::B,
        source_path: "$.policies[0].statement",
        target_side: LinkSide::A,
        target_field: "signing.policy",
    },
    FieldMapping {
        source_side: LinkSide::A,
        source_path: "$[\"environment\"].variables",
        target_side: LinkSide::B,
        target_field: "consumers[\"orders\"]",
    },
];

fn stage_input(current: Option<serde_json::Value>) -> LinkStageInput {
    LinkStageInput {
        resource_a_changes: ResourceChanges::new("orders", "aws/lambda/function")
            .with_resolved_spec(json!({
                "environment": {"variables": {"TABLE": "orders", "STAGE": "prod"}}
            })),
        resource_b_changes: ResourceChanges::new("csc", "aws/lambda/codeSigningConfig")
            .with_resolved_spec(json!({
                "codeSigningConfigArn": "arn:aws:lambda:eu-west-2:123:code-signing-config:csc-1",
                "policies": [{"statement": {"untrustedArtifactOnDeployment": "Enforce"}}]
            })),
        current_link_data: current,
        provider_context: ProviderContext::new(),
    }
}

fn bench_stage_fresh(c: &mut Criterion) {
    let input = stage_input(None);
    c.bench_function("stage_3_mappings_fresh", |b| {
        b.iter(|| stage_link_changes(black_box(MAPPINGS), black_box(&input)).unwrap());
    });
}

fn bench_stage_unchanged(c: &mut Criterion) {
    let input = stage_input(Some(json!({
        "orders": {
            "codeSigningConfigArn": "arn:aws:lambda:eu-west-2:123:code-signing-config:csc-1",
            "signing": {"policy": {"untrustedArtifactOnDeployment": "Enforce"}}
        },
        "csc": {"consumers": {"orders": {"TABLE": "orders", "STAGE": "prod"}}}
    })));
    c.bench_function("stage_3_mappings_unchanged", |b| {
        b.iter(|| stage_link_changes(black_box(MAPPINGS), black_box(&input)).unwrap());
    });
}

fn bench_collect_single(c: &mut Criterion) {
    let source = ResourceChanges::new("csc", "aws/lambda/codeSigningConfig")
        .with_resolved_spec(json!({"codeSigningConfigArn": "arn:csc:1"}));
    c.bench_function("collect_single_field", |b| {
        b.iter(|| {
            let mut out = LinkChanges::new();
            collect_link_field_changes(
                black_box("$.codeSigningConfigArn"),
                black_box("$[\"orders\"].codeSigningConfigArn"),
                None,
                &source,
                &mut out,
            )
            .unwrap();
            out
        });
    });
}

fn bench_fingerprint(c: &mut Criterion) {
    let changes = stage_link_changes(MAPPINGS, &stage_input(None)).unwrap();
    c.bench_function("link_changes_fingerprint", |b| {
        b.iter(|| black_box(&changes).fingerprint().unwrap());
    });
}

criterion_group!(
    benches,
    bench_stage_fresh,
    bench_stage_unchanged,
    bench_collect_single,
    bench_fingerprint,
);
criterion_main!(benches);
