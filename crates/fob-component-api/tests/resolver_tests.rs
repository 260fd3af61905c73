use std::sync::Arc;

use fob_component_api::{FailureKind, ImportRecord, MemoryRuntime, TypeResolver};

const COMPONENT: &str = "/app/src/Card.svelte";

fn import(source: &str, names: &[&str]) -> ImportRecord {
    let mut record = ImportRecord::new(source, true);
    record
        .imported_names
        .extend(names.iter().map(|name| name.to_string()));
    record
}

fn setup(files: &[(&str, &str)]) -> (Arc<MemoryRuntime>, TypeResolver) {
    let runtime = Arc::new(MemoryRuntime::new());
    for (path, content) in files {
        runtime.insert(*path, *content);
    }
    let resolver = TypeResolver::new(runtime.clone());
    (runtime, resolver)
}

#[tokio::test]
async fn repeated_resolution_returns_the_same_arc() {
    let (runtime, resolver) = setup(&[(
        "/app/src/types.ts",
        "/** Card sizes. */\nexport type Size = 'sm' | 'md' | 'lg';",
    )]);
    let imports = [import("./types", &["Size"])];

    let first = resolver.resolve_type("Size", COMPONENT, &imports).await.unwrap();
    let reads = runtime.read_count();
    let second = resolver.resolve_type("Size", COMPONENT, &imports).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(runtime.read_count(), reads);
    assert_eq!(reads, 1);
    assert!(first
        .definition_text
        .starts_with("type Size = 'sm' | 'md' | 'lg'"));
    assert_eq!(first.source_file.as_deref(), Some("/app/src/types.ts"));
}

#[tokio::test]
async fn package_imports_are_not_followed() {
    let (runtime, resolver) = setup(&[]);
    let imports = [import("some-package", &["Foo"])];

    assert!(resolver.resolve_type("Foo", COMPONENT, &imports).await.is_none());
    assert_eq!(runtime.read_count(), 0);

    let failures = resolver.take_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, FailureKind::Import);
    assert!(resolver.failures().is_empty());
}

#[tokio::test]
async fn missing_modules_record_import_failures() {
    let (_, resolver) = setup(&[]);
    let imports = [import("./missing", &["Gone"])];

    assert!(resolver.resolve_type("Gone", COMPONENT, &imports).await.is_none());
    let failures = resolver.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, FailureKind::Import);
    assert!(failures[0].message.contains("./missing"));
}

#[tokio::test]
async fn names_neither_known_nor_imported_are_not_found() {
    let (_, resolver) = setup(&[]);
    assert!(resolver.resolve_type("Mystery", COMPONENT, &[]).await.is_none());
    assert!(resolver.failures().is_empty());
}

#[tokio::test]
async fn local_declarations_skip_import_chasing() {
    let (runtime, resolver) = setup(&[]);
    resolver.extract_type_definitions(
        r#"<script lang="ts">
  interface Item { id: string }
  interface Props { items: Item[] }
</script>"#,
        COMPONENT,
    );

    let imports = [import("./never-read", &["Item"])];
    let item = resolver.resolve_type("Item", COMPONENT, &imports).await.unwrap();

    assert_eq!(item.definition_text, "interface Item { id: string }");
    assert!(item.dependency_names.is_empty());
    assert_eq!(runtime.read_count(), 0);
}

#[tokio::test]
async fn renamed_imports_follow_the_exported_name() {
    let (_, resolver) = setup(&[(
        "/app/src/lib/index.ts",
        "export interface Theme { dark: boolean }",
    )]);
    let mut record = import("./lib", &["AppTheme"]);
    record
        .renamed
        .insert("AppTheme".to_string(), "Theme".to_string());

    let resolved = resolver
        .resolve_type("AppTheme", COMPONENT, &[record])
        .await
        .unwrap();

    assert_eq!(resolved.name, "AppTheme");
    assert_eq!(resolved.definition_text, "interface Theme { dark: boolean }");
    assert_eq!(resolved.source_file.as_deref(), Some("/app/src/lib/index.ts"));
}

#[tokio::test]
async fn transitive_resolution_terminates_on_cycles() {
    let (runtime, resolver) = setup(&[
        (
            "/app/src/node.ts",
            "import type { Edge } from './edge';\nexport interface Node { edges: Edge[]; label: Label }\nexport type Label = string;",
        ),
        (
            "/app/src/edge.ts",
            "import type { Node } from './node';\nexport interface Edge { from: Node; to: Node }",
        ),
    ]);
    let imports = [import("./node", &["Node"])];

    let resolved = resolver
        .resolve_with_dependencies("Node", COMPONENT, &imports)
        .await;

    let mut names: Vec<&str> = resolved.iter().map(|ty| ty.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["Edge", "Label", "Node"]);
    assert_eq!(runtime.read_count(), 2);
}

#[tokio::test]
async fn cache_stats_track_files_and_resolutions() {
    let (_, resolver) = setup(&[("/app/src/types.ts", "export enum Tone { Info, Danger = 'danger' }")]);
    let imports = [import("./types", &["Tone"])];

    resolver.resolve_type("Tone", COMPONENT, &imports).await.unwrap();
    let stats = resolver.cache_stats();
    assert_eq!(stats.files, 1);
    assert_eq!(stats.declarations, 2);
    assert_eq!(stats.resolved, 1);

    resolver.clear_cache();
    assert_eq!(resolver.cache_stats().resolved, 0);
}
