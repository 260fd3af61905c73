//! Type definition extraction: named types plus import/export inventories.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    BindingPatternKind, ImportDeclarationSpecifier, ImportOrExportKind, ModuleExportName,
    TSEnumDeclaration, TSEnumMemberName, TSSignature,
};
use oxc_span::{GetSpan, SourceType};

use crate::error::{FailureKind, ParseFailure};
use crate::jsdoc::CommentMap;
use crate::model::{
    EnumValueRecord, ExportKind, ExportRecord, ImportRecord, PropertyRecord, TypeDeclaration,
    TypeDefinitions, TypeShape,
};
use crate::parser::{classify, parse_script, source_type_for_path, NodeKind, TopLevelNode};
use crate::sections::split_sections;
use crate::type_expr::{member_signature, normalize, span_text, type_to_string};

/// Extract named type declarations and module inventories from a file.
///
/// Component files contribute their module and instance scripts; anything
/// else is parsed whole with a source type derived from its extension. A
/// failed parse leaves the collections empty and records a syntax failure.
pub fn extract_type_definitions(source: &str, path: &str) -> TypeDefinitions {
    let mut definitions = TypeDefinitions::default();

    if path.ends_with(".svelte") {
        let sections = split_sections(source);
        for script in [sections.module_behavior, sections.behavior] {
            if !script.trim().is_empty() {
                collect_script(script, path, SourceType::ts(), &mut definitions);
            }
        }
    } else {
        collect_script(source, path, source_type_for_path(path), &mut definitions);
    }

    tracing::debug!(
        "{}: {} structs, {} aliases, {} enums, {} imports",
        path,
        definitions.structs.len(),
        definitions.aliases.len(),
        definitions.enums.len(),
        definitions.imports.len()
    );
    definitions
}

fn collect_script(
    source: &str,
    path: &str,
    source_type: SourceType,
    definitions: &mut TypeDefinitions,
) {
    let allocator = Allocator::default();
    let program = match parse_script(&allocator, source, source_type, path) {
        Ok(program) => program,
        Err(failure) => {
            tracing::debug!("{}", failure);
            definitions.failures.push(failure);
            return;
        }
    };

    let collector = Collector {
        source,
        path,
        comments: CommentMap::new(source, program.comments.iter()),
    };
    for statement in &program.body {
        collector.statement(classify(statement), definitions);
    }
}

struct Collector<'s> {
    source: &'s str,
    path: &'s str,
    comments: CommentMap<'s>,
}

impl Collector<'_> {
    fn statement(&self, node: TopLevelNode<'_, '_>, definitions: &mut TypeDefinitions) {
        let description = self.comments.summary_at(node.span.start);
        let raw_text = span_text(self.source, node.declaration_span).to_string();

        match node.kind {
            NodeKind::StructType {
                name,
                members,
                interface,
            } => {
                let properties = self.properties(name, members, definitions);
                definitions.push(TypeDeclaration {
                    name: name.to_string(),
                    raw_text,
                    description,
                    exported: node.exported,
                    shape: TypeShape::Struct { properties },
                });
                let kind = if interface {
                    ExportKind::Interface
                } else {
                    ExportKind::TypeAlias
                };
                self.export_declaration(&node, name, kind, definitions);
            }
            NodeKind::AliasType { name, aliased } => {
                definitions.push(TypeDeclaration {
                    name: name.to_string(),
                    raw_text,
                    description,
                    exported: node.exported,
                    shape: TypeShape::Alias {
                        expansion: type_to_string(aliased, self.source),
                    },
                });
                self.export_declaration(&node, name, ExportKind::TypeAlias, definitions);
            }
            NodeKind::EnumType(enumeration) => {
                let name = enumeration.id.name.as_str();
                let values = self.enum_values(enumeration, definitions);
                definitions.push(TypeDeclaration {
                    name: name.to_string(),
                    raw_text,
                    description,
                    exported: node.exported,
                    shape: TypeShape::Enum { values },
                });
                self.export_declaration(&node, name, ExportKind::Enum, definitions);
            }
            NodeKind::Variables(variables) if node.exported => {
                for declarator in &variables.declarations {
                    if let BindingPatternKind::BindingIdentifier(ident) = &declarator.id.kind {
                        definitions.exports.push(ExportRecord::named(
                            ident.name.as_str(),
                            ExportKind::Variable,
                        ));
                    }
                }
            }
            NodeKind::Function(function) => {
                let name = function.id.as_ref().map(|id| id.name.as_str());
                self.export_binding(&node, name, ExportKind::Function, definitions);
            }
            NodeKind::Class(class) => {
                let name = class.id.as_ref().map(|id| id.name.as_str());
                self.export_binding(&node, name, ExportKind::Class, definitions);
            }
            NodeKind::Import(import) => {
                let type_only = matches!(import.import_kind, ImportOrExportKind::Type);
                let mut record = ImportRecord::new(import.source.value.as_str(), type_only);
                for specifier in import.specifiers.iter().flatten() {
                    match specifier {
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(default) => {
                            record.imported_names.push(default.local.name.to_string());
                        }
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(namespace) => {
                            record.imported_names.push(namespace.local.name.to_string());
                        }
                        ImportDeclarationSpecifier::ImportSpecifier(named) => {
                            let local = named.local.name.to_string();
                            let imported = export_name(&named.imported);
                            if imported != local {
                                record.renamed.insert(local.clone(), imported);
                            }
                            record.imported_names.push(local);
                        }
                    }
                }
                definitions.imports.push(record);
            }
            NodeKind::ExportList(export) => {
                let kind = if export.source.is_some() {
                    ExportKind::ReExport
                } else {
                    ExportKind::Other
                };
                for specifier in &export.specifiers {
                    definitions
                        .exports
                        .push(ExportRecord::named(export_name(&specifier.exported), kind));
                }
            }
            NodeKind::ExportAll(export) => {
                let name = export
                    .exported
                    .as_ref()
                    .map(export_name)
                    .unwrap_or_else(|| "*".to_string());
                definitions
                    .exports
                    .push(ExportRecord::named(name, ExportKind::ReExport));
            }
            NodeKind::DefaultExpression => {
                definitions.exports.push(ExportRecord {
                    name: "default".to_string(),
                    kind: ExportKind::Other,
                    is_default: true,
                });
            }
            _ => {}
        }
    }

    fn properties(
        &self,
        owner: &str,
        members: &[TSSignature<'_>],
        definitions: &mut TypeDefinitions,
    ) -> Vec<PropertyRecord> {
        let mut properties = Vec::with_capacity(members.len());
        for signature in members {
            let Some(member) = member_signature(signature, self.source) else {
                definitions.failures.push(ParseFailure::new(
                    self.path,
                    FailureKind::Type,
                    format!(
                        "unsupported member `{}` in {}",
                        normalize(span_text(self.source, signature.span())),
                        owner
                    ),
                ));
                continue;
            };
            properties.push(PropertyRecord {
                name: member.name,
                type_expression: member.type_expression,
                optional: member.optional,
                readonly: member.readonly,
                description: self.comments.summary_at(signature.span().start),
            });
        }
        properties
    }

    fn enum_values(
        &self,
        enumeration: &TSEnumDeclaration<'_>,
        definitions: &mut TypeDefinitions,
    ) -> Vec<EnumValueRecord> {
        let mut values = Vec::with_capacity(enumeration.body.members.len());
        for member in &enumeration.body.members {
            let name = match &member.id {
                TSEnumMemberName::Identifier(ident) => ident.name.to_string(),
                TSEnumMemberName::String(literal) => literal.value.to_string(),
                _ => {
                    definitions.failures.push(ParseFailure::new(
                        self.path,
                        FailureKind::Type,
                        format!(
                            "computed member `{}` in enum {}",
                            span_text(self.source, member.span),
                            enumeration.id.name
                        ),
                    ));
                    continue;
                }
            };
            values.push(EnumValueRecord {
                name,
                value: member
                    .initializer
                    .as_ref()
                    .map(|init| normalize(span_text(self.source, init.span()))),
                description: self.comments.summary_at(member.span.start),
            });
        }
        values
    }

    fn export_declaration(
        &self,
        node: &TopLevelNode<'_, '_>,
        name: &str,
        kind: ExportKind,
        definitions: &mut TypeDefinitions,
    ) {
        self.export_binding(node, Some(name), kind, definitions);
    }

    fn export_binding(
        &self,
        node: &TopLevelNode<'_, '_>,
        name: Option<&str>,
        kind: ExportKind,
        definitions: &mut TypeDefinitions,
    ) {
        if !node.exported {
            return;
        }
        let record = if node.is_default {
            ExportRecord {
                name: "default".to_string(),
                kind,
                is_default: true,
            }
        } else {
            let Some(name) = name else {
                return;
            };
            ExportRecord::named(name, kind)
        };
        definitions.exports.push(record);
    }
}

fn export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(literal) => literal.value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_structs_aliases_and_enums() {
        let source = r#"
/** Button configuration. */
export interface ButtonProps {
  /** Visible text. */
  label: string;
  readonly size?: Size;
  onClick(event: MouseEvent): void;
}
export type Size = 'sm' | 'md' | 'lg';
type Theme = { dark: boolean };
export enum Variant { Primary = 'primary', Ghost }
"#;
        let defs = extract_type_definitions(source, "src/types.ts");
        assert!(defs.failures.is_empty());
        assert_eq!(defs.structs.len(), 2);
        assert_eq!(defs.aliases.len(), 1);
        assert_eq!(defs.enums.len(), 1);

        let props = defs.get("ButtonProps").unwrap();
        assert_eq!(props.description.as_deref(), Some("Button configuration."));
        assert!(props.exported);
        assert!(props.raw_text.starts_with("interface ButtonProps"));
        let properties = props.properties().unwrap();
        assert_eq!(properties[0].description.as_deref(), Some("Visible text."));
        assert!(properties[1].readonly && properties[1].optional);
        assert_eq!(properties[1].type_expression, "Size");
        assert_eq!(properties[2].type_expression, "(event: MouseEvent) => void");

        let TypeShape::Alias { expansion } = &defs.get("Size").unwrap().shape else {
            panic!("Size should be an alias");
        };
        assert_eq!(expansion, "'sm' | 'md' | 'lg'");
        assert!(!defs.get("Theme").unwrap().exported);

        let TypeShape::Enum { values } = &defs.get("Variant").unwrap().shape else {
            panic!("Variant should be an enum");
        };
        assert_eq!(values[0].value.as_deref(), Some("'primary'"));
        assert!(values[1].value.is_none());
    }

    #[test]
    fn inventories_imports_and_exports() {
        let source = r#"
import type { Size, Theme as BaseTheme } from './types';
import * as utils from '../utils';
import Icon from './Icon.svelte';
export { helper } from './helper';
export * from './more';
export const VERSION = '1';
export function format() {}
export default class Widget {}
"#;
        let defs = extract_type_definitions(source, "src/index.ts");
        assert_eq!(defs.imports.len(), 3);
        let types = &defs.imports[0];
        assert!(types.is_type_only);
        assert_eq!(types.imported_names, ["Size", "BaseTheme"]);
        assert_eq!(types.exported_name("BaseTheme"), "Theme");
        assert!(!defs.imports[1].is_type_only);
        assert_eq!(defs.imports[1].imported_names, ["utils"]);
        assert_eq!(defs.imports[2].imported_names, ["Icon"]);

        let exports: Vec<(&str, ExportKind, bool)> = defs
            .exports
            .iter()
            .map(|e| (e.name.as_str(), e.kind, e.is_default))
            .collect();
        assert_eq!(
            exports,
            [
                ("helper", ExportKind::ReExport, false),
                ("*", ExportKind::ReExport, false),
                ("VERSION", ExportKind::Variable, false),
                ("format", ExportKind::Function, false),
                ("default", ExportKind::Class, true),
            ]
        );
    }

    #[test]
    fn component_scripts_contribute_types() {
        let source = r#"<script module lang="ts">
export type Tone = 'info' | 'warn';
</script>
<script lang="ts">
interface Props { tone: Tone }
let { tone = 'info' }: Props = $props();
</script>
<p class={tone}><slot /></p>"#;
        let defs = extract_type_definitions(source, "src/Alert.svelte");
        assert!(defs.get("Tone").is_some());
        assert!(defs.get("Props").is_some());
    }

    #[test]
    fn parse_failure_yields_empty_collections() {
        let defs = extract_type_definitions("export interface Broken {", "src/broken.ts");
        assert_eq!(defs.declarations().count(), 0);
        assert_eq!(defs.failures.len(), 1);
        assert_eq!(defs.failures[0].kind, FailureKind::Syntax);
    }

    #[test]
    fn index_signatures_are_type_failures() {
        let defs = extract_type_definitions(
            "interface Bag { [key: string]: number; size: number }",
            "bag.ts",
        );
        assert_eq!(defs.get("Bag").unwrap().properties().unwrap().len(), 1);
        assert_eq!(defs.failures[0].kind, FailureKind::Type);
    }
}
