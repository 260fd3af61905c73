//! Component API extraction.
//!
//! A component's behavior region is handled by one of two [`ApiExtractor`]
//! implementations: [`TreeWalkExtractor`] when the structural parse succeeds,
//! [`PatternExtractor`] when it fails. The template region is scanned
//! independently and the results are merged into one [`ComponentApi`].

mod pattern;
mod tree_walk;

pub use pattern::PatternExtractor;
pub use tree_walk::TreeWalkExtractor;

use oxc_allocator::Allocator;
use serde_json::{Number, Value};

use crate::config::ExtractOptions;
use crate::model::{
    ComponentApi, ComponentMetadata, EventRecord, ExtractionStrategy, OperationRecord,
    ParameterRecord,
};
use crate::parser::parse_behavior;
use crate::sections::split_sections;
use crate::template::TemplateScanner;

/// Records recovered from a behavior region.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScriptApi {
    pub parameters: Vec<ParameterRecord>,
    pub events: Vec<EventRecord>,
    pub operations: Vec<OperationRecord>,
    /// Members that were skipped.
    pub warnings: Vec<String>,
}

impl ScriptApi {
    pub(crate) fn warn(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }

    pub(crate) fn parameter_mut(&mut self, name: &str) -> Option<&mut ParameterRecord> {
        self.parameters.iter_mut().find(|param| param.name == name)
    }
}

/// A strategy for turning a behavior region into API records.
pub trait ApiExtractor {
    /// Strategy reported in [`ComponentApi::strategy`].
    fn strategy(&self) -> ExtractionStrategy;

    /// Extract parameters, events and operations.
    fn extract(&self) -> ScriptApi;
}

/// Extract the API of one component.
///
/// Never fails: parse problems are recorded in `failures` and the pattern
/// extractor takes over; skipped members are listed in `warnings`.
pub fn extract_component_api(
    source: &str,
    metadata: &ComponentMetadata,
    options: &ExtractOptions,
) -> ComponentApi {
    let sections = split_sections(source);
    let mut api = ComponentApi {
        metadata: metadata.clone(),
        ..ComponentApi::default()
    };

    if sections.has_behavior() {
        tracing::trace!("{} behavior declared as lang={}", metadata.path, sections.lang);
        let allocator = Allocator::default();
        let script = match parse_behavior(&allocator, sections.behavior, &metadata.path) {
            Ok(program) => {
                let extractor = TreeWalkExtractor::new(&program, sections.behavior, options);
                run(&extractor, &mut api)
            }
            Err(failure) => {
                tracing::warn!("{}; falling back to pattern extraction", failure);
                api.failures.push(failure);
                let extractor = PatternExtractor::new(sections.behavior, options);
                run(&extractor, &mut api)
            }
        };

        api.parameters = script.parameters;
        api.events = script.events;
        api.operations = script.operations;
        api.warnings = script.warnings;
    } else {
        tracing::debug!("{} has no behavior region", metadata.path);
    }

    let template = TemplateScanner::new(options).scan(&sections.template, sections.behavior);
    api.slots = template.slots;
    api.description = template.description;
    for event in template.events {
        if api.event(&event.name).is_none() {
            api.events.push(event);
        }
    }

    api
}

fn run(extractor: &dyn ApiExtractor, api: &mut ComponentApi) -> ScriptApi {
    api.strategy = extractor.strategy();
    tracing::debug!(
        "Extracting {} with {:?} strategy",
        api.metadata.name,
        api.strategy
    );
    extractor.extract()
}

/// Returns `true` when `name` is the event prefix followed by at least one
/// character.
pub(crate) fn is_event_name(name: &str, prefix: &str) -> bool {
    name.len() > prefix.len() && name.starts_with(prefix)
}

/// Event name for a callback member: the rest of the name, lowercased.
pub(crate) fn event_name(name: &str, prefix: &str) -> String {
    name[prefix.len()..].to_lowercase()
}

/// JSON number for a parsed numeric literal; integral values stay integers.
pub(crate) fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Value for a default whose expression could not be evaluated: a number when
/// the text is numeric, otherwise the source text itself.
pub(crate) fn source_value(text: &str) -> Value {
    let text = text.trim();
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => number_value(value),
        _ => Value::String(text.to_string()),
    }
}

/// Best-effort evaluation of literal source text.
pub(crate) fn literal_from_text(text: &str) -> Value {
    let text = text.trim();
    match text {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }

    for quote in ['"', '\'', '`'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return Value::String(text[1..text.len() - 1].to_string());
        }
    }

    if text.starts_with('[') || text.starts_with('{') {
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            return value;
        }
    }

    source_value(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_prefix_rule() {
        assert!(is_event_name("onClose", "on"));
        assert!(is_event_name("onclick", "on"));
        assert!(!is_event_name("on", "on"));
        assert!(!is_event_name("label", "on"));
        assert_eq!(event_name("onValueChange", "on"), "valuechange");
    }

    #[test]
    fn numbers_keep_integers() {
        assert_eq!(number_value(3.0), Value::from(3));
        assert_eq!(number_value(0.5), Value::from(0.5));
    }

    #[test]
    fn literal_text_evaluation() {
        assert_eq!(literal_from_text("'primary'"), Value::from("primary"));
        assert_eq!(literal_from_text("\"x\""), Value::from("x"));
        assert_eq!(literal_from_text("false"), Value::Bool(false));
        assert_eq!(literal_from_text("-2"), Value::from(-2));
        assert_eq!(literal_from_text("[1, 2]"), serde_json::json!([1, 2]));
        assert_eq!(literal_from_text("{ a: 1 }"), Value::from("{ a: 1 }"));
        assert_eq!(literal_from_text("undefined"), Value::from("undefined"));
    }
}
