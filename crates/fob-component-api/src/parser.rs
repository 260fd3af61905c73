//! Structural parser adapter.
//!
//! Wraps `oxc_parser` so that every way a parse can go wrong (diagnostics, an
//! aborted parse, a panic inside the parser) comes back as a [`ParseFailure`]
//! value. Callers use the `Err` branch to switch to the pattern extractor.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Class, Declaration, ExportAllDeclaration, ExportDefaultDeclarationKind,
    ExportNamedDeclaration, Function, ImportDeclaration, Program, Statement, TSEnumDeclaration,
    TSInterfaceDeclaration, TSSignature, TSType, TSTypeAliasDeclaration, VariableDeclaration,
};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};

use crate::error::ParseFailure;

/// Parse a component behavior region.
///
/// Behavior regions are always parsed as TypeScript so that `lang="ts"` and
/// plain scripts share one code path.
pub fn parse_behavior<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    file: &str,
) -> Result<Program<'a>, ParseFailure> {
    parse_script(allocator, source, SourceType::ts(), file)
}

/// Parse a script with an explicit source type.
pub fn parse_script<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    source_type: SourceType,
    file: &str,
) -> Result<Program<'a>, ParseFailure> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        Parser::new(allocator, source, source_type).parse()
    }));

    let parsed = match outcome {
        Ok(parsed) => parsed,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!("Parser panicked on {}: {}", file, message);
            return Err(ParseFailure::syntax(file, &[message]));
        }
    };

    if !parsed.errors.is_empty() {
        let diagnostics: Vec<String> = parsed.errors.iter().map(|e| e.to_string()).collect();
        return Err(ParseFailure::syntax(file, &diagnostics));
    }
    if parsed.panicked {
        return Err(ParseFailure::syntax(
            file,
            &["parser aborted before the end of input".to_string()],
        ));
    }

    Ok(parsed.program)
}

/// Source type for a standalone file, TypeScript when the extension is unknown.
pub fn source_type_for_path(path: &str) -> SourceType {
    SourceType::from_path(path).unwrap_or_else(|_| SourceType::ts())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "parser panicked".to_string()
    }
}

/// The statement kinds extraction cares about.
#[derive(Debug, Clone, Copy)]
pub enum NodeKind<'n, 'a> {
    /// Interface, or type alias to an object literal type.
    StructType {
        name: &'n str,
        members: &'n [TSSignature<'a>],
        /// Declared with `interface` rather than `type … = { … }`.
        interface: bool,
    },
    /// Type alias to any other type expression.
    AliasType {
        name: &'n str,
        aliased: &'n TSType<'a>,
    },
    EnumType(&'n TSEnumDeclaration<'a>),
    Variables(&'n VariableDeclaration<'a>),
    Function(&'n Function<'a>),
    Class(&'n Class<'a>),
    Import(&'n ImportDeclaration<'a>),
    /// `export { a, b as c }`, with or without a source module.
    ExportList(&'n ExportNamedDeclaration<'a>),
    ExportAll(&'n ExportAllDeclaration<'a>),
    /// `export default <expression>`.
    DefaultExpression,
    Unsupported,
}

/// A classified top-level statement.
#[derive(Debug, Clone, Copy)]
pub struct TopLevelNode<'n, 'a> {
    pub kind: NodeKind<'n, 'a>,
    /// Declared inside an `export` wrapper.
    pub exported: bool,
    /// `export default …`.
    pub is_default: bool,
    /// Span of the whole statement, where leading JSDoc is attached.
    pub span: Span,
    /// Span of the declaration without its export wrapper.
    pub declaration_span: Span,
}

impl<'n, 'a> TopLevelNode<'n, 'a> {
    fn new(kind: NodeKind<'n, 'a>, span: Span) -> Self {
        Self {
            kind,
            exported: false,
            is_default: false,
            span,
            declaration_span: span,
        }
    }

    fn exported(mut self, declaration_span: Span) -> Self {
        self.exported = true;
        self.declaration_span = declaration_span;
        self
    }
}

/// Map a top-level statement to its [`NodeKind`], unwrapping exports.
pub fn classify<'n, 'a>(statement: &'n Statement<'a>) -> TopLevelNode<'n, 'a> {
    let span = statement.span();
    match statement {
        Statement::ExportNamedDeclaration(export) => match &export.declaration {
            Some(declaration) => TopLevelNode::new(classify_declaration(declaration), span)
                .exported(declaration.span()),
            None => TopLevelNode::new(NodeKind::ExportList(export), span),
        },
        Statement::ExportDefaultDeclaration(export) => {
            let kind = match &export.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(function) => {
                    NodeKind::Function(function)
                }
                ExportDefaultDeclarationKind::ClassDeclaration(class) => NodeKind::Class(class),
                ExportDefaultDeclarationKind::TSInterfaceDeclaration(interface) => {
                    interface_kind(interface)
                }
                _ => NodeKind::DefaultExpression,
            };
            let mut node = TopLevelNode::new(kind, span).exported(export.declaration.span());
            node.is_default = true;
            node
        }
        Statement::ExportAllDeclaration(export) => {
            TopLevelNode::new(NodeKind::ExportAll(export), span)
        }
        Statement::ImportDeclaration(import) => TopLevelNode::new(NodeKind::Import(import), span),
        Statement::VariableDeclaration(variables) => {
            TopLevelNode::new(NodeKind::Variables(variables), span)
        }
        Statement::FunctionDeclaration(function) => {
            TopLevelNode::new(NodeKind::Function(function), span)
        }
        Statement::ClassDeclaration(class) => TopLevelNode::new(NodeKind::Class(class), span),
        Statement::TSInterfaceDeclaration(interface) => {
            TopLevelNode::new(interface_kind(interface), span)
        }
        Statement::TSTypeAliasDeclaration(alias) => TopLevelNode::new(alias_kind(alias), span),
        Statement::TSEnumDeclaration(enumeration) => {
            TopLevelNode::new(NodeKind::EnumType(enumeration), span)
        }
        _ => TopLevelNode::new(NodeKind::Unsupported, span),
    }
}

fn classify_declaration<'n, 'a>(declaration: &'n Declaration<'a>) -> NodeKind<'n, 'a> {
    match declaration {
        Declaration::VariableDeclaration(variables) => NodeKind::Variables(variables),
        Declaration::FunctionDeclaration(function) => NodeKind::Function(function),
        Declaration::ClassDeclaration(class) => NodeKind::Class(class),
        Declaration::TSTypeAliasDeclaration(alias) => alias_kind(alias),
        Declaration::TSInterfaceDeclaration(interface) => interface_kind(interface),
        Declaration::TSEnumDeclaration(enumeration) => NodeKind::EnumType(enumeration),
        _ => NodeKind::Unsupported,
    }
}

fn interface_kind<'n, 'a>(interface: &'n TSInterfaceDeclaration<'a>) -> NodeKind<'n, 'a> {
    NodeKind::StructType {
        name: interface.id.name.as_str(),
        members: &interface.body.body,
        interface: true,
    }
}

fn alias_kind<'n, 'a>(alias: &'n TSTypeAliasDeclaration<'a>) -> NodeKind<'n, 'a> {
    match &alias.type_annotation {
        TSType::TSTypeLiteral(literal) => NodeKind::StructType {
            name: alias.id.name.as_str(),
            members: &literal.members,
            interface: false,
        },
        aliased => NodeKind::AliasType {
            name: alias.id.name.as_str(),
            aliased,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    #[test]
    fn valid_script_parses() {
        let allocator = Allocator::default();
        let program = parse_behavior(&allocator, "let { a = 1 } = $props();", "A.svelte");
        assert!(program.is_ok());
    }

    #[test]
    fn syntax_error_becomes_failure() {
        let allocator = Allocator::default();
        let failure = parse_behavior(&allocator, "interface Props { label: string", "A.svelte")
            .err()
            .unwrap();
        assert_eq!(failure.kind, FailureKind::Syntax);
        assert_eq!(failure.file, "A.svelte");
        assert!(!failure.message.is_empty());
    }

    #[test]
    fn classifies_top_level_statements() {
        let allocator = Allocator::default();
        let source = r#"
import type { Size } from './types';
export interface Props { label: string }
type Theme = { dark: boolean };
export type Size2 = 'sm' | 'lg';
enum Color { Red }
export function focus() {}
export { Theme };
export * from './other';
console.log(1);
"#;
        let program = parse_script(&allocator, source, SourceType::ts(), "a.ts").unwrap();
        let kinds: Vec<_> = program.body.iter().map(classify).collect();

        assert!(matches!(kinds[0].kind, NodeKind::Import(_)));
        assert!(matches!(kinds[1].kind, NodeKind::StructType { name: "Props", .. }));
        assert!(kinds[1].exported);
        assert!(matches!(
            kinds[2].kind,
            NodeKind::StructType { name: "Theme", interface: false, .. }
        ));
        assert!(!kinds[2].exported);
        assert!(matches!(kinds[3].kind, NodeKind::AliasType { name: "Size2", .. }));
        assert!(matches!(kinds[4].kind, NodeKind::EnumType(_)));
        assert!(matches!(kinds[5].kind, NodeKind::Function(_)));
        assert!(matches!(kinds[6].kind, NodeKind::ExportList(_)));
        assert!(matches!(kinds[7].kind, NodeKind::ExportAll(_)));
        assert!(matches!(kinds[8].kind, NodeKind::Unsupported));
    }

    #[test]
    fn export_wrapper_narrows_declaration_span() {
        let allocator = Allocator::default();
        let source = "export interface Props { a: string }";
        let program = parse_script(&allocator, source, SourceType::ts(), "a.ts").unwrap();
        let node = classify(&program.body[0]);
        assert_eq!(node.span.start, 0);
        assert_eq!(node.declaration_span.start, 7);
    }

    #[test]
    fn unknown_extension_falls_back_to_typescript() {
        assert!(source_type_for_path("Button.svelte").is_typescript());
        assert!(source_type_for_path("types.d.ts").is_typescript_definition());
        assert!(!source_type_for_path("util.js").is_typescript());
    }
}
