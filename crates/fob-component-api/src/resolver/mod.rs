//! Cross-file type resolution.
//!
//! A [`TypeResolver`] answers "what is the declaration of `name` as seen from
//! `file`?" by checking its caches, then the declarations it has already
//! extracted, then by following a relative import to another file. Each hop
//! reads at most one file through the [`Runtime`]. Results are handed out as
//! shared [`Arc<ResolvedType>`] values, so repeated lookups are cheap and
//! pointer-equal.

mod cache;
pub mod paths;

pub use cache::CacheStats;

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use regex::Regex;
use rustc_hash::FxHashSet;

use crate::error::{FailureKind, ParseFailure};
use crate::model::{ImportRecord, ResolvedType, TypeDefinitions};
use crate::runtime::Runtime;
use crate::types;

use cache::{CachedDeclaration, TypeCache};

/// Oldest entries are dropped once the failure log holds this many.
const MAX_LOGGED_FAILURES: usize = 256;

/// Type names provided by the language or the DOM, never looked up.
const BUILTIN_TYPES: &[&str] = &[
    "Array",
    "ArrayLike",
    "Awaited",
    "Boolean",
    "Component",
    "CustomEvent",
    "Date",
    "Error",
    "Event",
    "Exclude",
    "Extract",
    "FocusEvent",
    "Function",
    "HTMLElement",
    "InputEvent",
    "InstanceType",
    "Iterable",
    "KeyboardEvent",
    "Map",
    "MouseEvent",
    "NonNullable",
    "Number",
    "Object",
    "Omit",
    "Parameters",
    "Partial",
    "Pick",
    "PointerEvent",
    "Promise",
    "Readonly",
    "ReadonlyArray",
    "Record",
    "RegExp",
    "Required",
    "ReturnType",
    "Set",
    "Snippet",
    "String",
    "Symbol",
    "WeakMap",
    "WeakSet",
];

static NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)/\*.*?\*/|//[^\n]*|"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'|`[^`]*`"#)
        .expect("comment and string pattern is valid")
});

static TYPE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][A-Za-z0-9_]*\b").expect("type name pattern is valid"));

/// Capitalized identifiers referenced by `text`, in first-seen order.
///
/// Comments, string literals and built-in names are ignored, as is `exclude`
/// (the declaration's own name).
pub fn dependency_names(text: &str, exclude: &str) -> Vec<String> {
    let stripped = NOISE.replace_all(text, " ");
    let mut seen = FxHashSet::default();
    let mut names = Vec::new();
    for found in TYPE_NAME.find_iter(&stripped) {
        let name = found.as_str();
        if name == exclude || BUILTIN_TYPES.contains(&name) {
            continue;
        }
        if seen.insert(name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Resolves type names across files, caching declarations and resolutions.
#[derive(Debug)]
pub struct TypeResolver {
    runtime: Arc<dyn Runtime>,
    cache: TypeCache,
    failures: Mutex<Vec<ParseFailure>>,
}

impl TypeResolver {
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self {
            runtime,
            cache: TypeCache::default(),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Extract a file's type definitions and remember its declarations.
    ///
    /// Declarations are cached under `"{path}:{name}"` and under the bare
    /// name; for bare names the most recently extracted file wins.
    pub fn extract_type_definitions(&self, source: &str, path: &str) -> TypeDefinitions {
        let definitions = types::extract_type_definitions(source, path);
        self.cache.record_file(path, &definitions);
        definitions
    }

    /// Resolve `name` as referenced from `current_file`.
    ///
    /// `imports` is the import inventory of `current_file`. Returns `None`
    /// when no declaration can be found. Unresolvable imports are recorded as
    /// [`FailureKind::Import`] failures and modules that fail to parse as
    /// [`FailureKind::Syntax`] failures, both in the resolver's failure log.
    pub async fn resolve_type(
        &self,
        name: &str,
        current_file: &str,
        imports: &[ImportRecord],
    ) -> Option<Arc<ResolvedType>> {
        let mut failures = Vec::new();
        let found = self.lookup(name, current_file, imports, &mut failures).await;
        self.log(failures);
        found
    }

    /// Resolve `name` and, transitively, every type its definition references.
    ///
    /// Dependencies are looked up from the file that declares the referencing
    /// type, using that file's imports. Each `(file, name)` pair is visited
    /// once, so cyclic references terminate. A declaration reached through
    /// several files is returned once. Unresolvable dependencies are skipped
    /// and their failures go to the failure log.
    pub async fn resolve_with_dependencies(
        &self,
        name: &str,
        current_file: &str,
        imports: &[ImportRecord],
    ) -> Vec<Arc<ResolvedType>> {
        let (resolved, failures) = self.resolve_collecting(name, current_file, imports).await;
        self.log(failures);
        resolved
    }

    /// Like [`resolve_with_dependencies`](Self::resolve_with_dependencies),
    /// but hands this call's failures to the caller instead of the log.
    ///
    /// A module's parse failures are reported by the call that first reads
    /// it; later calls hit the cache and report nothing.
    pub async fn resolve_collecting(
        &self,
        name: &str,
        current_file: &str,
        imports: &[ImportRecord],
    ) -> (Vec<Arc<ResolvedType>>, Vec<ParseFailure>) {
        let mut failures = Vec::new();
        let mut resolved = Vec::new();
        let mut visited: FxHashSet<(String, String)> = FxHashSet::default();
        let mut emitted: FxHashSet<(String, String)> = FxHashSet::default();
        let mut queue = VecDeque::from([(name.to_string(), current_file.to_string())]);

        while let Some((next, file)) = queue.pop_front() {
            if !visited.insert((file.clone(), next.clone())) {
                continue;
            }

            let found = if file == current_file {
                self.lookup(&next, &file, imports, &mut failures).await
            } else {
                let file_imports = self.cache.imports_of(&file);
                self.lookup(&next, &file, &file_imports, &mut failures).await
            };
            let Some(found) = found else {
                continue;
            };

            let origin = found.source_file.clone().unwrap_or_else(|| file.clone());
            for dependency in &found.dependency_names {
                queue.push_back((dependency.clone(), origin.clone()));
            }
            if emitted.insert((origin, found.name.clone())) {
                resolved.push(found);
            }
        }

        (resolved, failures)
    }

    /// Drop every cached declaration and resolution.
    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::debug!("Type caches cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Failures recorded by `resolve_type` and `resolve_with_dependencies`
    /// so far, oldest first.
    pub fn failures(&self) -> Vec<ParseFailure> {
        self.failures.lock().clone()
    }

    /// Drain the recorded failures.
    pub fn take_failures(&self) -> Vec<ParseFailure> {
        std::mem::take(&mut *self.failures.lock())
    }

    async fn lookup(
        &self,
        name: &str,
        current_file: &str,
        imports: &[ImportRecord],
        failures: &mut Vec<ParseFailure>,
    ) -> Option<Arc<ResolvedType>> {
        if let Some(hit) = self.cache.resolved(current_file, name) {
            tracing::trace!("Type cache hit for {} in {}", name, current_file);
            return Some(hit);
        }

        if let Some(local) = self.cache.declaration(name) {
            tracing::debug!("Resolved {} from known declarations", name);
            return Some(self.store(current_file, name, local));
        }

        let import = imports.iter().find(|import| import.imports(name))?;
        let exported = import.exported_name(name);

        if !import.is_relative() {
            failures.push(import_failure(
                current_file,
                format!(
                    "cannot follow non-relative import '{}' for type {}",
                    import.source_module, name
                ),
            ));
            return None;
        }

        let Some(target) =
            paths::resolve_relative(Path::new(current_file), &import.source_module, &*self.runtime)
        else {
            failures.push(import_failure(
                current_file,
                format!("cannot resolve module '{}'", import.source_module),
            ));
            return None;
        };
        let target = target.to_string_lossy().into_owned();

        self.load_file(&target, failures).await;

        let found = self
            .cache
            .file_declaration(&target, exported)
            .or_else(|| self.cache.declaration(exported));
        match found {
            Some(declaration) => {
                tracing::debug!("Resolved {} via {}", name, target);
                Some(self.store(current_file, name, declaration))
            }
            None => {
                tracing::debug!("{} does not declare {}", target, exported);
                None
            }
        }
    }

    async fn load_file(&self, path: &str, failures: &mut Vec<ParseFailure>) {
        if self.cache.is_extracted(path) {
            return;
        }
        match self.runtime.read_to_string(Path::new(path)).await {
            Ok(source) => {
                let definitions = self.extract_type_definitions(&source, path);
                for failure in &definitions.failures {
                    tracing::warn!("{}", failure);
                }
                failures.extend(definitions.failures);
            }
            Err(error) => {
                self.cache.mark_extracted(path);
                failures.push(import_failure(path, format!("cannot read module: {error}")));
            }
        }
    }

    fn store(&self, file: &str, name: &str, cached: CachedDeclaration) -> Arc<ResolvedType> {
        let declaration = cached.declaration;
        let resolved = ResolvedType {
            name: name.to_string(),
            dependency_names: dependency_names(&declaration.raw_text, &declaration.name),
            definition_text: declaration.raw_text,
            source_file: Some(cached.file),
        };
        self.cache.store(file, name, resolved)
    }

    fn log(&self, failures: Vec<ParseFailure>) {
        if failures.is_empty() {
            return;
        }
        let mut log = self.failures.lock();
        log.extend(failures);
        let excess = log.len().saturating_sub(MAX_LOGGED_FAILURES);
        if excess > 0 {
            log.drain(..excess);
        }
    }
}

fn import_failure(file: &str, message: String) -> ParseFailure {
    tracing::warn!("{}: {}", file, message);
    ParseFailure::new(file, FailureKind::Import, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MemoryRuntime;

    #[test]
    fn dependency_names_skip_builtins_and_self() {
        let names = dependency_names(
            "interface Props { size: Size; items: Array<Item>; /* Ignored */ label: 'Label'; self?: Props; at: Date }",
            "Props",
        );
        assert_eq!(names, ["Size", "Item"]);
    }

    #[test]
    fn dependency_names_are_deduplicated() {
        let names = dependency_names("type Pair = [Point, Point] | Line", "Pair");
        assert_eq!(names, ["Point", "Line"]);
    }

    #[tokio::test]
    async fn local_declarations_resolve_without_reads() {
        let runtime = Arc::new(MemoryRuntime::new());
        let resolver = TypeResolver::new(runtime.clone());
        resolver.extract_type_definitions(
            "export interface Theme { dark: boolean; accent: Accent }",
            "/src/theme.ts",
        );

        let theme = resolver
            .resolve_type("Theme", "/src/Button.svelte", &[])
            .await
            .unwrap();
        assert_eq!(theme.source_file.as_deref(), Some("/src/theme.ts"));
        assert_eq!(theme.dependency_names, ["Accent"]);
        assert_eq!(runtime.read_count(), 0);
    }

    #[tokio::test]
    async fn clear_cache_empties_everything() {
        let resolver = TypeResolver::new(Arc::new(MemoryRuntime::new()));
        resolver.extract_type_definitions("type Size = 'sm' | 'lg';", "/src/a.ts");
        resolver.resolve_type("Size", "/src/a.ts", &[]).await.unwrap();

        let stats = resolver.cache_stats();
        assert_eq!(stats.declarations, 2);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.files, 1);

        resolver.clear_cache();
        assert_eq!(resolver.cache_stats(), CacheStats::default());
        assert!(resolver.resolve_type("Size", "/src/a.ts", &[]).await.is_none());
    }

    #[tokio::test]
    async fn malformed_module_is_read_once() {
        let runtime = Arc::new(MemoryRuntime::new());
        let resolver = TypeResolver::new(runtime.clone());
        let mut import = ImportRecord::new("./broken", true);
        import.imported_names.push("Broken".to_string());

        runtime.insert("/src/broken.ts", "export interface Broken {");
        for _ in 0..2 {
            assert!(resolver
                .resolve_type("Broken", "/src/A.svelte", std::slice::from_ref(&import))
                .await
                .is_none());
        }
        assert_eq!(runtime.read_count(), 1);

        let failures = resolver.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, FailureKind::Syntax);
        assert_eq!(failures[0].file, "/src/broken.ts");
    }

    #[tokio::test]
    async fn collecting_resolution_leaves_the_log_alone() {
        let runtime = Arc::new(MemoryRuntime::new());
        runtime.insert("/app/types.ts", "export interface Size {");
        let resolver = TypeResolver::new(runtime);
        let mut import = ImportRecord::new("./types", true);
        import.imported_names.push("Size".to_string());

        let (resolved, failures) = resolver
            .resolve_collecting("Size", "/app/Card.svelte", std::slice::from_ref(&import))
            .await;

        assert!(resolved.is_empty());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, FailureKind::Syntax);
        assert_eq!(failures[0].file, "/app/types.ts");
        assert!(resolver.failures().is_empty());
    }

    #[tokio::test]
    async fn failure_log_is_bounded() {
        let resolver = TypeResolver::new(Arc::new(MemoryRuntime::new()));
        let mut import = ImportRecord::new("some-package", true);
        import.imported_names.push("Foo".to_string());

        for i in 0..MAX_LOGGED_FAILURES + 10 {
            let file = format!("/app/C{i}.svelte");
            resolver
                .resolve_type("Foo", &file, std::slice::from_ref(&import))
                .await;
        }

        let failures = resolver.failures();
        assert_eq!(failures.len(), MAX_LOGGED_FAILURES);
        assert_eq!(failures[0].file, "/app/C10.svelte");
    }
}
