//! Primary extractor: walks the parsed behavior region.

use oxc_ast::ast::{
    BindingPattern, BindingPatternKind, Expression, FormalParameter, Function, ObjectPattern,
    ObjectPropertyKind, Program, TSSignature, VariableDeclaration, VariableDeclarationKind,
    VariableDeclarator,
};
use oxc_span::GetSpan;
use serde_json::{Map, Value};

use super::{event_name, is_event_name, number_value, source_value, ApiExtractor, ScriptApi};
use crate::config::ExtractOptions;
use crate::jsdoc::{CommentMap, ParsedJsDoc};
use crate::model::{
    EventRecord, EventSource, ExtractionStrategy, OperationRecord, ParameterRecord,
    NO_VALUE_TYPE, UNKNOWN_TYPE,
};
use crate::parser::{classify, NodeKind};
use crate::type_expr::{member_signature, normalize, property_key_name, span_text, type_to_string};

/// Primary extractor walking the parsed behavior region.
pub struct TreeWalkExtractor<'p, 'a> {
    program: &'p Program<'a>,
    source: &'a str,
    options: &'p ExtractOptions,
}

impl<'p, 'a> TreeWalkExtractor<'p, 'a> {
    pub fn new(program: &'p Program<'a>, source: &'a str, options: &'p ExtractOptions) -> Self {
        Self {
            program,
            source,
            options,
        }
    }

    fn collect_props_members(
        &self,
        members: &[TSSignature<'a>],
        comments: &CommentMap<'_>,
        api: &mut ScriptApi,
    ) {
        for signature in members {
            let Some(member) = member_signature(signature, self.source) else {
                api.warn(format!(
                    "Skipping unsupported member `{}` of {}",
                    normalize(span_text(self.source, signature.span())),
                    self.options.props_type_name
                ));
                continue;
            };
            let description = comments.summary_at(signature.span().start);

            if is_event_name(&member.name, &self.options.event_prefix) {
                api.events.push(EventRecord {
                    name: event_name(&member.name, &self.options.event_prefix),
                    type_expression: member.type_expression,
                    description,
                    payload_type: member.payload_type,
                    source: EventSource::Prop,
                });
            } else {
                let mut param =
                    ParameterRecord::new(member.name, member.type_expression, !member.optional);
                param.description = description;
                api.parameters.push(param);
            }
        }
    }

    fn is_props_call(&self, declarator: &VariableDeclarator<'a>) -> bool {
        let Some(Expression::CallExpression(call)) = &declarator.init else {
            return false;
        };
        matches!(
            &call.callee,
            Expression::Identifier(ident) if ident.name.as_str() == self.options.props_rune
        )
    }

    fn apply_destructuring(&self, pattern: &ObjectPattern<'a>, api: &mut ScriptApi) {
        for property in &pattern.properties {
            let Some(name) = property_key_name(&property.key, property.computed) else {
                api.warn(format!(
                    "Skipping computed property in {}() destructuring",
                    self.options.props_rune
                ));
                continue;
            };

            let default = match &property.value.kind {
                BindingPatternKind::AssignmentPattern(assignment) => {
                    Some(evaluate_literal(&assignment.right, self.source))
                }
                _ => None,
            };

            if let Some(param) = api.parameter_mut(&name) {
                if let Some(value) = default {
                    param.apply_default(value);
                }
                continue;
            }

            if is_event_name(&name, &self.options.event_prefix) {
                let event = event_name(&name, &self.options.event_prefix);
                if api.events.iter().any(|record| record.name == event) {
                    continue;
                }
            }

            tracing::trace!("{} is destructured but not declared", name);
            let mut param = ParameterRecord::new(name, UNKNOWN_TYPE, default.is_none());
            if let Some(value) = default {
                param.apply_default(value);
            }
            api.parameters.push(param);
        }
    }

    fn legacy_props(
        &self,
        variables: &VariableDeclaration<'a>,
        description: Option<String>,
        api: &mut ScriptApi,
    ) {
        if variables.kind != VariableDeclarationKind::Let {
            return;
        }
        for declarator in &variables.declarations {
            let BindingPatternKind::BindingIdentifier(ident) = &declarator.id.kind else {
                api.warn(format!(
                    "Skipping destructured export `{}`",
                    span_text(self.source, declarator.id.span()).trim()
                ));
                continue;
            };
            let default = declarator
                .init
                .as_ref()
                .map(|init| evaluate_literal(init, self.source));

            // Declared in Props already: the export only contributes its default
            if let Some(param) = api.parameter_mut(ident.name.as_str()) {
                if let Some(value) = default {
                    param.apply_default(value);
                }
                if param.description.is_none() {
                    param.description = description.clone();
                }
                continue;
            }

            let ty = declarator
                .id
                .type_annotation
                .as_ref()
                .map(|a| type_to_string(&a.type_annotation, self.source))
                .unwrap_or_else(|| UNKNOWN_TYPE.to_string());
            let mut param = ParameterRecord::new(ident.name.as_str(), ty, true);
            param.description = description.clone();
            if let Some(value) = default {
                param.apply_default(value);
            }
            api.parameters.push(param);
        }
    }

    fn operation(
        &self,
        function: &Function<'a>,
        comments: &CommentMap<'_>,
        statement_start: u32,
    ) -> Option<OperationRecord> {
        let name = function.id.as_ref()?.name.to_string();
        let doc = comments.doc_at(statement_start).unwrap_or_default();

        let mut parameters: Vec<ParameterRecord> = function
            .params
            .items
            .iter()
            .filter_map(|param| self.operation_parameter(param, &doc))
            .collect();
        if let Some(rest) = &function.params.rest {
            if let Some(param) = binding_name(&rest.argument) {
                let ty = rest
                    .argument
                    .type_annotation
                    .as_ref()
                    .map(|a| type_to_string(&a.type_annotation, self.source))
                    .unwrap_or_else(|| UNKNOWN_TYPE.to_string());
                parameters.push(ParameterRecord::new(format!("...{param}"), ty, false));
            }
        }

        let return_type = function
            .return_type
            .as_ref()
            .map(|a| type_to_string(&a.type_annotation, self.source))
            .or(doc.returns_type)
            .unwrap_or_else(|| NO_VALUE_TYPE.to_string());

        let description = doc.summary.unwrap_or_else(|| {
            let names: Vec<&str> = parameters.iter().map(|p| p.name.as_str()).collect();
            format!("Calls {}({})", name, names.join(", "))
        });

        Some(OperationRecord {
            name,
            parameters,
            return_type,
            description,
        })
    }

    fn operation_parameter(
        &self,
        param: &FormalParameter<'a>,
        doc: &ParsedJsDoc,
    ) -> Option<ParameterRecord> {
        let pattern = &param.pattern;
        let name = binding_name(pattern)?;
        let tag = doc.param(&name);

        let annotation = match &pattern.kind {
            BindingPatternKind::AssignmentPattern(assignment) => assignment
                .left
                .type_annotation
                .as_ref()
                .or(pattern.type_annotation.as_ref()),
            _ => pattern.type_annotation.as_ref(),
        };
        let ty = annotation
            .map(|a| type_to_string(&a.type_annotation, self.source))
            .or_else(|| tag.and_then(|tag| tag.type_hint.clone()))
            .unwrap_or_else(|| UNKNOWN_TYPE.to_string());

        let mut record = ParameterRecord::new(name, ty, !pattern.optional);
        if let BindingPatternKind::AssignmentPattern(assignment) = &pattern.kind {
            record.apply_default(evaluate_literal(&assignment.right, self.source));
        }
        record.description = tag.and_then(|tag| tag.description.clone());
        Some(record)
    }
}

impl<'p, 'a> ApiExtractor for TreeWalkExtractor<'p, 'a> {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::TreeWalk
    }

    fn extract(&self) -> ScriptApi {
        let comments = CommentMap::new(self.source, self.program.comments.iter());
        let mut api = ScriptApi::default();
        let mut props_found = false;
        let mut destructured: Vec<&ObjectPattern<'a>> = Vec::new();
        let mut legacy: Vec<(&VariableDeclaration<'a>, u32)> = Vec::new();

        for statement in &self.program.body {
            let node = classify(statement);
            match node.kind {
                NodeKind::StructType { name, members, .. }
                    if !props_found && name == self.options.props_type_name =>
                {
                    props_found = true;
                    self.collect_props_members(members, &comments, &mut api);
                }
                NodeKind::Variables(variables) => {
                    for declarator in &variables.declarations {
                        if !self.is_props_call(declarator) {
                            continue;
                        }
                        match &declarator.id.kind {
                            BindingPatternKind::ObjectPattern(pattern) => {
                                destructured.push(pattern)
                            }
                            _ => api.warn(format!(
                                "{}() result is not destructured",
                                self.options.props_rune
                            )),
                        }
                    }
                    if node.exported {
                        legacy.push((variables, node.span.start));
                    }
                }
                NodeKind::Function(function) => {
                    if let Some(operation) = self.operation(function, &comments, node.span.start)
                    {
                        api.operations.push(operation);
                    }
                }
                _ => {}
            }
        }

        if props_found {
            tracing::debug!(
                "{} declares {} parameters and {} events",
                self.options.props_type_name,
                api.parameters.len(),
                api.events.len()
            );
        }

        for pattern in &destructured {
            self.apply_destructuring(pattern, &mut api);
        }

        if destructured.is_empty() {
            for (variables, start) in legacy {
                self.legacy_props(variables, comments.summary_at(start), &mut api);
            }
        }

        api
    }
}

fn binding_name(pattern: &BindingPattern<'_>) -> Option<String> {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(ident) => Some(ident.name.to_string()),
        BindingPatternKind::AssignmentPattern(assignment) => binding_name(&assignment.left),
        _ => None,
    }
}

/// Evaluate a default-value expression to JSON.
///
/// Literals, arrays and object literals of literals are evaluated; any other
/// expression is kept as its source text.
pub(crate) fn evaluate_literal(expression: &Expression<'_>, source: &str) -> Value {
    match expression {
        Expression::StringLiteral(literal) => Value::String(literal.value.to_string()),
        Expression::NumericLiteral(literal) => number_value(literal.value),
        Expression::BooleanLiteral(literal) => Value::Bool(literal.value),
        Expression::NullLiteral(_) => Value::Null,
        Expression::TemplateLiteral(template) if template.expressions.is_empty() => {
            let text = span_text(source, template.span);
            Value::String(text.trim_matches('`').to_string())
        }
        Expression::ArrayExpression(array) => Value::Array(
            array
                .elements
                .iter()
                .map(|element| match element.as_expression() {
                    Some(expression) => evaluate_literal(expression, source),
                    None => Value::String(span_text(source, element.span()).to_string()),
                })
                .collect(),
        ),
        Expression::ObjectExpression(object) => {
            let mut map = Map::new();
            for property in &object.properties {
                if let ObjectPropertyKind::ObjectProperty(property) = property {
                    if let Some(key) = property_key_name(&property.key, property.computed) {
                        map.insert(key, evaluate_literal(&property.value, source));
                    }
                }
            }
            Value::Object(map)
        }
        Expression::ParenthesizedExpression(inner) => evaluate_literal(&inner.expression, source),
        Expression::TSAsExpression(inner) => evaluate_literal(&inner.expression, source),
        other => source_value(span_text(source, other.span())),
    }
}
