//! Stringification of TypeScript type expressions.

use oxc_ast::ast::{FormalParameters, PropertyKey, TSFunctionType, TSSignature, TSType};
use oxc_span::{GetSpan, Span};

use crate::model::{NO_VALUE_TYPE, UNKNOWN_TYPE};

/// Source text covered by `span`, empty when the span is out of range.
pub fn span_text(source: &str, span: Span) -> &str {
    source
        .get(span.start as usize..span.end as usize)
        .unwrap_or_default()
}

/// Collapse whitespace runs into single spaces.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render a type expression as a single-line string.
///
/// Unions, intersections, arrays, parenthesized types, function types and
/// inline object types are rebuilt from their parts; keywords, literal types,
/// references (with their type arguments) and anything else keep their source
/// text.
pub fn type_to_string(ty: &TSType<'_>, source: &str) -> String {
    match ty {
        TSType::TSUnionType(union) => join_types(&union.types, " | ", source),
        TSType::TSIntersectionType(intersection) => {
            join_types(&intersection.types, " & ", source)
        }
        TSType::TSArrayType(array) => {
            let element = type_to_string(&array.element_type, source);
            if matches!(
                array.element_type,
                TSType::TSUnionType(_) | TSType::TSIntersectionType(_) | TSType::TSFunctionType(_)
            ) {
                format!("({element})[]")
            } else {
                format!("{element}[]")
            }
        }
        TSType::TSParenthesizedType(inner) => {
            format!("({})", type_to_string(&inner.type_annotation, source))
        }
        TSType::TSFunctionType(function) => function_type_to_string(function, source),
        TSType::TSTypeLiteral(literal) => members_to_string(&literal.members, source),
        other => normalize(span_text(source, other.span())),
    }
}

fn join_types(types: &[TSType<'_>], separator: &str, source: &str) -> String {
    types
        .iter()
        .map(|ty| type_to_string(ty, source))
        .collect::<Vec<_>>()
        .join(separator)
}

/// `(a: T, b?: U) => R`
pub fn function_type_to_string(function: &TSFunctionType<'_>, source: &str) -> String {
    format!(
        "{} => {}",
        params_to_string(&function.params, source),
        type_to_string(&function.return_type.type_annotation, source)
    )
}

/// `(a: T, ...rest: U[])`, each parameter kept as written.
pub fn params_to_string(params: &FormalParameters<'_>, source: &str) -> String {
    let mut rendered: Vec<String> = params
        .items
        .iter()
        .map(|param| normalize(span_text(source, param.span)))
        .collect();
    if let Some(rest) = &params.rest {
        rendered.push(normalize(span_text(source, rest.span)));
    }
    format!("({})", rendered.join(", "))
}

/// Type of the first parameter of a function type, looking through parentheses.
pub fn first_parameter_type(ty: &TSType<'_>, source: &str) -> Option<String> {
    match ty {
        TSType::TSParenthesizedType(inner) => first_parameter_type(&inner.type_annotation, source),
        TSType::TSFunctionType(function) => {
            let first = function.params.items.first()?;
            let annotation = first.pattern.type_annotation.as_ref()?;
            Some(type_to_string(&annotation.type_annotation, source))
        }
        _ => None,
    }
}

/// `{ a: T; b?: U }`
fn members_to_string(members: &[TSSignature<'_>], source: &str) -> String {
    if members.is_empty() {
        return "{}".to_string();
    }
    let rendered: Vec<String> = members
        .iter()
        .map(|member| signature_to_string(member, source))
        .collect();
    format!("{{ {} }}", rendered.join("; "))
}

fn signature_to_string(signature: &TSSignature<'_>, source: &str) -> String {
    match member_signature(signature, source) {
        Some(member) => format!(
            "{}{}{}: {}",
            if member.readonly { "readonly " } else { "" },
            member.name,
            if member.optional { "?" } else { "" },
            member.type_expression
        ),
        None => normalize(span_text(source, signature.span()).trim_end_matches([';', ','])),
    }
}

/// A property or method member of a structured type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSignature {
    pub name: String,
    pub type_expression: String,
    pub optional: bool,
    pub readonly: bool,
    /// Type of the first parameter when the member is callable.
    pub payload_type: Option<String>,
}

/// Property and method signatures with a static key.
///
/// Methods render as function types. Index, call and construct signatures and
/// computed keys yield `None`.
pub fn member_signature(signature: &TSSignature<'_>, source: &str) -> Option<MemberSignature> {
    match signature {
        TSSignature::TSPropertySignature(property) => {
            let name = property_key_name(&property.key, property.computed)?;
            let annotation = property.type_annotation.as_ref();
            Some(MemberSignature {
                name,
                type_expression: annotation
                    .map(|a| type_to_string(&a.type_annotation, source))
                    .unwrap_or_else(|| UNKNOWN_TYPE.to_string()),
                optional: property.optional,
                readonly: property.readonly,
                payload_type: annotation
                    .and_then(|a| first_parameter_type(&a.type_annotation, source)),
            })
        }
        TSSignature::TSMethodSignature(method) => {
            let name = property_key_name(&method.key, method.computed)?;
            let return_type = method
                .return_type
                .as_ref()
                .map(|a| type_to_string(&a.type_annotation, source))
                .unwrap_or_else(|| NO_VALUE_TYPE.to_string());
            Some(MemberSignature {
                name,
                type_expression: format!(
                    "{} => {}",
                    params_to_string(&method.params, source),
                    return_type
                ),
                optional: method.optional,
                readonly: false,
                payload_type: method
                    .params
                    .items
                    .first()
                    .and_then(|param| param.pattern.type_annotation.as_ref())
                    .map(|a| type_to_string(&a.type_annotation, source)),
            })
        }
        _ => None,
    }
}

/// Static name of a member key; `None` for computed keys.
pub fn property_key_name(key: &PropertyKey<'_>, computed: bool) -> Option<String> {
    if computed {
        return None;
    }
    key.static_name().map(|name| name.into_owned())
}
