use std::fs;
use std::sync::Arc;

use fob_component_api::{
    render_json, ApiError, ComponentAnalyzer, ComponentMetadata, ExtractionStrategy,
    NativeRuntime, TypeResolver,
};
use tempfile::TempDir;

const BADGE: &str = r#"<script lang="ts">
  import type { Tone, Shape } from './types';

  interface Props {
    text: string;
    tone?: Tone;
    shape?: Shape;
  }

  let { text, tone = 'info', shape }: Props = $props();
</script>

<span class="badge">{text}</span>
"#;

const TYPES: &str = r#"
export type Tone = 'info' | 'danger';

/** Outline of the badge. */
export interface Shape {
  radius: Radius;
}

export type Radius = number | 'full';
"#;

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Badge.svelte"), BADGE).unwrap();
    fs::write(dir.path().join("types.ts"), TYPES).unwrap();
    dir
}

#[tokio::test]
async fn analyzes_component_on_disk() {
    let dir = project();
    let path = dir.path().join("Badge.svelte");
    let analyzer = ComponentAnalyzer::new(Arc::new(NativeRuntime::new()));

    let doc = analyzer
        .analyze(&path, ComponentMetadata::from_path(path.to_string_lossy()).with_category("display"))
        .await
        .unwrap();

    assert_eq!(doc.api.metadata.name, "Badge");
    assert_eq!(doc.api.strategy, ExtractionStrategy::TreeWalk);
    assert_eq!(doc.api.parameters.len(), 3);
    assert!(doc.api.parameter("text").unwrap().required);
    assert!(!doc.api.parameter("tone").unwrap().required);

    let mut names: Vec<&str> = doc.types.iter().map(|ty| ty.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["Radius", "Shape", "Tone"]);
    assert!(doc.api.failures.is_empty());
}

#[tokio::test]
async fn shared_resolver_reuses_parsed_modules() {
    let dir = project();
    fs::write(
        dir.path().join("Chip.svelte"),
        r#"<script lang="ts">
  import type { Tone } from './types';
  interface Props { tone: Tone }
  let { tone }: Props = $props();
</script>"#,
    )
    .unwrap();

    let runtime = Arc::new(NativeRuntime::new());
    let resolver = Arc::new(TypeResolver::new(runtime.clone()));
    let analyzer = ComponentAnalyzer::new(runtime).with_resolver(resolver.clone());

    for file in ["Badge.svelte", "Chip.svelte"] {
        let path = dir.path().join(file);
        analyzer
            .analyze(&path, ComponentMetadata::from_path(path.to_string_lossy()))
            .await
            .unwrap();
    }

    // two components plus one shared type module
    assert_eq!(resolver.cache_stats().files, 3);
}

#[tokio::test]
async fn unreadable_component_aborts_analysis() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Nope.svelte");
    let analyzer = ComponentAnalyzer::new(Arc::new(NativeRuntime::new()));

    let error = analyzer
        .analyze(&path, ComponentMetadata::from_path(path.to_string_lossy()))
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::Runtime { .. }));
    assert!(error.to_string().contains("Nope.svelte"));
}

#[tokio::test]
async fn renders_analyzed_components_as_json() {
    let dir = project();
    let path = dir.path().join("Badge.svelte");
    let analyzer = ComponentAnalyzer::new(Arc::new(NativeRuntime::new()));
    let doc = analyzer
        .analyze(&path, ComponentMetadata::from_path(path.to_string_lossy()))
        .await
        .unwrap();

    let rendered = render_json(&[doc]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

    let component = &value["components"][0];
    assert_eq!(component["api"]["strategy"], "tree_walk");
    assert_eq!(component["api"]["parameters"][1]["defaultValue"], "info");
    assert!(component["types"].as_array().is_some_and(|types| types.len() == 3));
}
