//! Template scanning for slots, snippet renders and dispatched events.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::ExtractOptions;
use crate::model::{EventRecord, SlotRecord};

static SLOT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<slot(\s[^>]*?)?\s*/?>").expect("slot pattern is valid"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][\w:.-]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|\{([^}]*)\}|([^\s"'>/]+)))?"#)
        .expect("attribute pattern is valid")
});

static RENDER_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{@render\s+([A-Za-z_$][\w$]*)\s*(?:\?\.)?\s*\(").expect("render pattern is valid")
});

static COMPONENT_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--\s*@component\b(.*?)-->").expect("component comment pattern is valid")
});

/// Records found in a template region.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TemplateApi {
    pub slots: Vec<SlotRecord>,
    pub events: Vec<EventRecord>,
    /// Text of the `<!-- @component … -->` comment.
    pub description: Option<String>,
}

/// Regex scanner over template (and behavior) text.
#[derive(Debug, Clone)]
pub struct TemplateScanner {
    dispatch: Option<Regex>,
}

impl TemplateScanner {
    pub fn new(options: &ExtractOptions) -> Self {
        let pattern = format!(
            r#"\b{}\s*\(\s*(?:"([^"]+)"|'([^']+)'|`([^`$]+)`)"#,
            regex::escape(&options.dispatch_function)
        );
        Self {
            dispatch: Regex::new(&pattern).ok(),
        }
    }

    /// Scan the template for slots and the component description, and both
    /// regions for dispatch call sites.
    pub fn scan(&self, template: &str, behavior: &str) -> TemplateApi {
        let mut api = TemplateApi {
            description: component_description(template),
            ..TemplateApi::default()
        };

        for captures in SLOT_TAG.captures_iter(template) {
            let attributes = captures.get(1).map_or("", |m| m.as_str());
            let slot = slot_from_attributes(attributes);
            push_slot(&mut api.slots, slot);
        }

        for captures in RENDER_TAG.captures_iter(template) {
            push_slot(&mut api.slots, SlotRecord::new(&captures[1]));
        }

        if let Some(dispatch) = &self.dispatch {
            for text in [template, behavior] {
                for captures in dispatch.captures_iter(text) {
                    let Some(name) = (1..=3).find_map(|group| captures.get(group)) else {
                        continue;
                    };
                    let name = name.as_str();
                    if !api.events.iter().any(|event| event.name == name) {
                        api.events.push(EventRecord::dispatched(name));
                    }
                }
            }
        }

        tracing::trace!(
            "Template declares {} slots and {} dispatched events",
            api.slots.len(),
            api.events.len()
        );
        api
    }
}

fn push_slot(slots: &mut Vec<SlotRecord>, slot: SlotRecord) {
    match slots.iter_mut().find(|existing| existing.name == slot.name) {
        Some(existing) if existing.props.is_none() => existing.props = slot.props,
        Some(_) => {}
        None => slots.push(slot),
    }
}

fn slot_from_attributes(attributes: &str) -> SlotRecord {
    let mut name = None;
    let mut props = BTreeMap::new();

    for captures in ATTRIBUTE.captures_iter(attributes) {
        let key = &captures[1];
        let value = (2..=5)
            .find_map(|group| captures.get(group))
            .map_or_else(|| key.to_string(), |m| m.as_str().trim().to_string());
        if key == "name" {
            name = Some(value);
        } else {
            props.insert(key.to_string(), value);
        }
    }

    let mut slot = SlotRecord::new(name.unwrap_or_else(|| "default".to_string()));
    if !props.is_empty() {
        slot.props = Some(props);
    }
    slot
}

fn component_description(template: &str) -> Option<String> {
    let captures = COMPONENT_COMMENT.captures(template)?;
    let lines: Vec<&str> = captures[1].lines().map(str::trim_end).collect();
    let text = dedent(&lines);
    (!text.is_empty()).then_some(text)
}

fn dedent(lines: &[&str]) -> String {
    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|line| line.get(indent..).unwrap_or_else(|| line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
