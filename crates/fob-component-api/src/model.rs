//! Records produced by component and type extraction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParseFailure;

/// Sentinel type for parameters whose type is not known.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Sentinel return type for operations without a declared return type.
pub const NO_VALUE_TYPE: &str = "void";

/// Opaque per-file context supplied by the scanning collaborator.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMetadata {
    /// Component name (usually the file stem).
    pub name: String,
    /// Optional category tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// File-system path (or virtual path) of the component.
    pub path: String,
}

impl ComponentMetadata {
    /// Creates metadata for a component path, deriving the name from the file stem.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = std::path::Path::new(&path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        Self {
            name,
            category: None,
            path,
        }
    }

    /// Sets the category tag.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// A component parameter (prop).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRecord {
    /// Parameter name.
    pub name: String,
    /// Stringified type expression.
    #[serde(rename = "type")]
    pub type_expression: String,
    /// Whether the caller must supply the parameter.
    pub required: bool,
    /// Evaluated default value.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub default_value: Option<Value>,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

impl ParameterRecord {
    /// Creates a parameter record without default or description.
    pub fn new(name: impl Into<String>, type_expression: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            type_expression: type_expression.into(),
            required,
            default_value: None,
            description: None,
        }
    }

    /// Applies a default value; a defaulted parameter is never required.
    pub fn apply_default(&mut self, value: Value) {
        self.default_value = Some(value);
        self.required = false;
    }
}

/// Origin of an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// Derived from an `onX` member of the props type.
    Prop,
    /// Found at a `dispatch('x')` call site.
    Dispatched,
}

/// An event the component emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Event name.
    pub name: String,
    /// Handler type expression, or `dispatched`.
    #[serde(rename = "type")]
    pub type_expression: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    /// Payload type, when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub payload_type: Option<String>,
    /// Where the event was discovered.
    pub source: EventSource,
}

impl EventRecord {
    /// Creates an event record for a `dispatch('name')` call site.
    pub fn dispatched(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_expression: "dispatched".to_string(),
            description: None,
            payload_type: Some("any".to_string()),
            source: EventSource::Dispatched,
        }
    }
}

/// A content slot (or rendered snippet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRecord {
    /// Slot name (`default` for the unnamed slot).
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    /// Props passed to the slot, name to expression.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub props: Option<BTreeMap<String, String>>,
}

impl SlotRecord {
    /// Creates a slot record with no description or props.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            props: None,
        }
    }
}

/// A callable operation exposed by the component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    /// Function name.
    pub name: String,
    /// Formal parameters.
    pub parameters: Vec<ParameterRecord>,
    /// Declared return type or [`NO_VALUE_TYPE`].
    pub return_type: String,
    /// Description from JSDoc or a synthesized one-liner.
    pub description: String,
}

/// Which extraction strategy produced the behavior records.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Structural tree walk over the parsed behavior region.
    TreeWalk,
    /// Regex recovery after a failed structural parse.
    Pattern,
    /// No behavior region was present.
    #[default]
    None,
}

/// Complete API description of one component.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentApi {
    /// Metadata supplied by the caller.
    pub metadata: ComponentMetadata,
    /// Component parameters.
    pub parameters: Vec<ParameterRecord>,
    /// Events from props and dispatch call sites.
    pub events: Vec<EventRecord>,
    /// Slots and rendered snippets.
    pub slots: Vec<SlotRecord>,
    /// Callable operations.
    pub operations: Vec<OperationRecord>,
    /// Component description from the `@component` comment.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    /// Failures recorded during extraction.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failures: Vec<ParseFailure>,
    /// Members skipped during extraction.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
    /// Strategy that produced the behavior records.
    pub strategy: ExtractionStrategy,
}

impl ComponentApi {
    /// Returns `true` when the component exposes nothing.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
            && self.events.is_empty()
            && self.slots.is_empty()
            && self.operations.is_empty()
    }

    /// Looks up a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterRecord> {
        self.parameters.iter().find(|param| param.name == name)
    }

    /// Looks up an event by name.
    pub fn event(&self, name: &str) -> Option<&EventRecord> {
        self.events.iter().find(|event| event.name == name)
    }
}

/// Member of a structured-record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    /// Property name.
    pub name: String,
    /// Stringified type expression.
    #[serde(rename = "type")]
    pub type_expression: String,
    /// Declared with `?`.
    pub optional: bool,
    /// Declared `readonly`.
    pub readonly: bool,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

/// Member of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValueRecord {
    /// Member name.
    pub name: String,
    /// Initializer source text.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<String>,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

/// Shape of a named type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeShape {
    /// Interface or object-literal alias.
    Struct {
        /// Declared members.
        properties: Vec<PropertyRecord>,
    },
    /// Alias to an arbitrary type expression.
    Alias {
        /// Stringified aliased type.
        expansion: String,
    },
    /// Enumeration.
    Enum {
        /// Declared members.
        values: Vec<EnumValueRecord>,
    },
}

/// A named type declaration found in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDeclaration {
    /// Declared name.
    pub name: String,
    /// Declaration source text.
    pub raw_text: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    /// Declared inside an `export` wrapper.
    pub exported: bool,
    /// Kind-specific payload.
    #[serde(flatten)]
    pub shape: TypeShape,
}

impl TypeDeclaration {
    /// Returns the struct properties, if this is a struct declaration.
    pub fn properties(&self) -> Option<&[PropertyRecord]> {
        match &self.shape {
            TypeShape::Struct { properties } => Some(properties),
            _ => None,
        }
    }
}

/// An import statement inventory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    /// Module specifier as written.
    pub source_module: String,
    /// Local binding names introduced by the import.
    pub imported_names: Vec<String>,
    /// Local name to exported name, for `{ A as B }` specifiers.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub renamed: BTreeMap<String, String>,
    /// `import type { … }`.
    pub is_type_only: bool,
}

impl ImportRecord {
    /// Creates an import record with no specifiers.
    pub fn new(source_module: impl Into<String>, is_type_only: bool) -> Self {
        Self {
            source_module: source_module.into(),
            imported_names: Vec::new(),
            renamed: BTreeMap::new(),
            is_type_only,
        }
    }

    /// Returns `true` when the import binds `name` locally.
    pub fn imports(&self, name: &str) -> bool {
        self.imported_names.iter().any(|imported| imported == name)
    }

    /// Name under which the source module exports the local binding `name`.
    pub fn exported_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.renamed.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Returns `true` for `./` and `../` specifiers.
    pub fn is_relative(&self) -> bool {
        crate::resolver::paths::is_relative_specifier(&self.source_module)
    }
}

/// Kind of an exported binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportKind {
    Function,
    Class,
    Variable,
    Interface,
    TypeAlias,
    Enum,
    ReExport,
    Other,
}

/// An export statement inventory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    /// Exported name (`default` for default exports).
    pub name: String,
    /// Kind of the exported binding.
    pub kind: ExportKind,
    /// `export default …`.
    pub is_default: bool,
}

impl ExportRecord {
    /// Creates a named (non-default) export record.
    pub fn named(name: impl Into<String>, kind: ExportKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_default: false,
        }
    }
}

/// Type declarations and module inventories of one file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefinitions {
    /// Interfaces and object-literal aliases.
    pub structs: Vec<TypeDeclaration>,
    /// Other aliases.
    pub aliases: Vec<TypeDeclaration>,
    /// Enumerations.
    pub enums: Vec<TypeDeclaration>,
    /// Import inventory.
    pub imports: Vec<ImportRecord>,
    /// Export inventory.
    pub exports: Vec<ExportRecord>,
    /// Failures recorded during extraction.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failures: Vec<ParseFailure>,
}

impl TypeDefinitions {
    /// Iterates over every declaration regardless of kind.
    pub fn declarations(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.structs
            .iter()
            .chain(self.aliases.iter())
            .chain(self.enums.iter())
    }

    /// Looks up a declaration by name.
    pub fn get(&self, name: &str) -> Option<&TypeDeclaration> {
        self.declarations().find(|decl| decl.name == name)
    }

    /// Adds a declaration to the collection matching its kind.
    pub fn push(&mut self, declaration: TypeDeclaration) {
        match declaration.shape {
            TypeShape::Struct { .. } => self.structs.push(declaration),
            TypeShape::Alias { .. } => self.aliases.push(declaration),
            TypeShape::Enum { .. } => self.enums.push(declaration),
        }
    }
}

/// A type declaration flattened for cross-file consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedType {
    /// Type name as referenced.
    pub name: String,
    /// Declaration source text.
    pub definition_text: String,
    /// Capitalized type names referenced by the definition.
    pub dependency_names: Vec<String>,
    /// File the declaration was found in, when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_file: Option<String>,
}

/// A component API together with the types its parameters reference.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDoc {
    /// Extracted component API.
    pub api: ComponentApi,
    /// Resolved parameter types.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub types: Vec<ResolvedType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_value_clears_required() {
        let mut param = ParameterRecord::new("label", "string", true);
        param.apply_default(Value::from("x"));
        assert!(!param.required);
        assert_eq!(param.default_value, Some(Value::from("x")));
    }

    #[test]
    fn parameter_serializes_with_type_key() {
        let param = ParameterRecord::new("size", "number", true);
        let json = serde_json::to_value(&param).unwrap();
        assert_eq!(json["type"], "number");
        assert_eq!(json["required"], true);
        assert!(json.get("defaultValue").is_none());
    }

    #[test]
    fn type_declaration_is_tagged_by_kind() {
        let decl = TypeDeclaration {
            name: "Size".to_string(),
            raw_text: "type Size = 'sm' | 'lg';".to_string(),
            description: None,
            exported: true,
            shape: TypeShape::Alias {
                expansion: "'sm' | 'lg'".to_string(),
            },
        };
        let json = serde_json::to_value(&decl).unwrap();
        assert_eq!(json["kind"], "alias");
        assert_eq!(json["expansion"], "'sm' | 'lg'");
        assert_eq!(json["rawText"], "type Size = 'sm' | 'lg';");
    }

    #[test]
    fn metadata_name_from_path() {
        let metadata = ComponentMetadata::from_path("src/lib/Button.svelte").with_category("inputs");
        assert_eq!(metadata.name, "Button");
        assert_eq!(metadata.category.as_deref(), Some("inputs"));
    }

    #[test]
    fn import_record_aliases() {
        let mut import = ImportRecord::new("./types", true);
        import.imported_names.push("Local".to_string());
        import
            .renamed
            .insert("Local".to_string(), "Remote".to_string());
        assert!(import.imports("Local"));
        assert_eq!(import.exported_name("Local"), "Remote");
        assert_eq!(import.exported_name("Other"), "Other");
        assert!(import.is_relative());
    }
}
