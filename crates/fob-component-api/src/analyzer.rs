//! Per-file component analysis.
//!
//! The [`ComponentAnalyzer`] ties the pieces together for one component file:
//! it reads the source through a [`Runtime`], runs API and type-definition
//! extraction on the blocking pool under a deadline, then resolves the types
//! the component's parameters reference.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use fob_component_api::{ComponentAnalyzer, ComponentMetadata, ExtractOptions, NativeRuntime};
//!
//! # async fn example() -> fob_component_api::Result<()> {
//! let analyzer = ComponentAnalyzer::new(Arc::new(NativeRuntime::new()))
//!     .with_options(ExtractOptions::load(None)?);
//!
//! let path = Path::new("src/lib/Button.svelte");
//! let doc = analyzer
//!     .analyze(path, ComponentMetadata::from_path("src/lib/Button.svelte"))
//!     .await?;
//! println!("{} parameters", doc.api.parameters.len());
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tokio::task;

use crate::config::ExtractOptions;
use crate::error::{ApiError, ParseFailure, Result};
use crate::extractor::extract_component_api;
use crate::model::{ComponentDoc, ComponentMetadata, ImportRecord, ResolvedType};
use crate::resolver::{dependency_names, TypeResolver};
use crate::runtime::Runtime;

/// Analyzes component files, sharing one [`TypeResolver`] across calls.
#[derive(Debug, Clone)]
pub struct ComponentAnalyzer {
    runtime: Arc<dyn Runtime>,
    resolver: Arc<TypeResolver>,
    options: ExtractOptions,
}

impl ComponentAnalyzer {
    /// Create an analyzer with default options and a fresh resolver.
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self {
            resolver: Arc::new(TypeResolver::new(runtime.clone())),
            runtime,
            options: ExtractOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Share an existing resolver (and its caches).
    pub fn with_resolver(mut self, resolver: Arc<TypeResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn resolver(&self) -> &Arc<TypeResolver> {
        &self.resolver
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Analyze one component file.
    ///
    /// Fails only when the file cannot be read or extraction misses the
    /// deadline. On a timeout the blocking extraction keeps running in the
    /// background and its result is dropped.
    pub async fn analyze(&self, path: &Path, metadata: ComponentMetadata) -> Result<ComponentDoc> {
        let source = self
            .runtime
            .read_to_string(path)
            .await
            .map_err(|source| ApiError::Runtime {
                path: path.to_path_buf(),
                source,
            })?;

        let file = path.to_string_lossy().into_owned();
        let deadline = self.options.analysis_timeout();

        let extraction = {
            let options = self.options.clone();
            let resolver = Arc::clone(&self.resolver);
            let file = file.clone();
            task::spawn_blocking(move || {
                let api = extract_component_api(&source, &metadata, &options);
                let definitions = resolver.extract_type_definitions(&source, &file);
                (api, definitions)
            })
        };

        let (api, definitions) = match tokio::time::timeout(deadline, extraction).await {
            Ok(Ok(extracted)) => extracted,
            Ok(Err(error)) => {
                return Err(ApiError::Task {
                    path: path.to_path_buf(),
                    message: error.to_string(),
                });
            }
            Err(_) => {
                tracing::warn!("Analysis of {} exceeded {:?}", file, deadline);
                return Err(ApiError::Timeout {
                    path: path.to_path_buf(),
                    elapsed: deadline,
                });
            }
        };

        let mut doc = ComponentDoc {
            api,
            types: Vec::new(),
        };
        if self.options.resolve_parameter_types {
            let (types, failures) = self.parameter_types(&doc, &file, &definitions.imports).await;
            doc.types = types;
            doc.api.failures.extend(failures);
        }

        tracing::debug!(
            "Analyzed {}: {} parameters, {} events, {} slots, {} types",
            file,
            doc.api.parameters.len(),
            doc.api.events.len(),
            doc.api.slots.len(),
            doc.types.len()
        );
        Ok(doc)
    }

    async fn parameter_types(
        &self,
        doc: &ComponentDoc,
        file: &str,
        imports: &[ImportRecord],
    ) -> (Vec<ResolvedType>, Vec<ParseFailure>) {
        let mut referenced = Vec::new();
        for parameter in &doc.api.parameters {
            for name in dependency_names(&parameter.type_expression, "") {
                if !referenced.contains(&name) {
                    referenced.push(name);
                }
            }
        }

        let mut seen = FxHashSet::default();
        let mut types = Vec::new();
        let mut failures = Vec::new();
        for name in &referenced {
            let (resolved, failed) = self.resolver.resolve_collecting(name, file, imports).await;
            failures.extend(failed);
            for resolved in resolved {
                if seen.insert(resolved.name.clone()) {
                    types.push(ResolvedType::clone(&resolved));
                }
            }
        }
        (types, failures)
    }
}
