#![deny(clippy::all)]

//! Component API extraction for Svelte single-file components.
//!
//! This crate provides:
//! - A section splitter separating behavior, template and style regions.
//! - Extraction of parameters, events, slots and operations, by walking the
//!   parsed behavior region or, when it does not parse, by pattern matching.
//! - Type definition extraction (structs, aliases, enums, imports, exports).
//! - A cross-file type resolver with shared caches.
//! - A per-file analyzer running extraction under a deadline, and a JSON
//!   renderer for its results.
//!
//! Parse problems never abort extraction; they are carried as
//! [`ParseFailure`] values next to whatever could be recovered.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod extractor;
pub mod jsdoc;
pub mod model;
pub mod parser;
pub mod resolver;
pub mod runtime;
pub mod sections;
pub mod template;
pub mod type_expr;
pub mod types;

#[cfg(feature = "json")]
pub mod generators;

pub use analyzer::ComponentAnalyzer;
pub use config::ExtractOptions;
pub use error::{ApiError, FailureKind, ParseFailure, Result};
pub use extractor::{extract_component_api, ApiExtractor, PatternExtractor, TreeWalkExtractor};
pub use model::{
    ComponentApi, ComponentDoc, ComponentMetadata, EnumValueRecord, EventRecord, EventSource,
    ExportKind, ExportRecord, ExtractionStrategy, ImportRecord, OperationRecord, ParameterRecord,
    PropertyRecord, ResolvedType, SlotRecord, TypeDeclaration, TypeDefinitions, TypeShape,
};
pub use resolver::{CacheStats, TypeResolver};
pub use runtime::{MemoryRuntime, NativeRuntime, Runtime, RuntimeError};
pub use sections::{split_sections, Sections};
pub use types::extract_type_definitions;

#[cfg(feature = "json")]
pub use generators::json::render_json;
