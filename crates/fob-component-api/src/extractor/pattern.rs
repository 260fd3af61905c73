//! Regex-based fallback extractor for behavior regions that fail to parse.

use std::sync::LazyLock;

use regex::Regex;

use super::{event_name, is_event_name, literal_from_text, ApiExtractor, ScriptApi};
use crate::config::ExtractOptions;
use crate::model::{
    EventRecord, EventSource, ExtractionStrategy, OperationRecord, ParameterRecord,
    NO_VALUE_TYPE, UNKNOWN_TYPE,
};
use crate::type_expr::normalize;

static PROPERTY_MEMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)^(?:readonly\s+)?([A-Za-z_$][\w$]*|'[^']*'|"[^"]*")(\?)?\s*:\s*(.+)$"#)
        .expect("property member pattern is valid")
});

static METHOD_MEMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^([A-Za-z_$][\w$]*)(\?)?\s*\((.*)\)\s*:\s*(.+)$")
        .expect("method member pattern is valid")
});

static DESTRUCTURING_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:let|const|var)\s*\{").expect("destructuring pattern is valid")
});

static BINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(\.\.\.)?([A-Za-z_$][\w$]*)(\?)?\s*(?::\s*(.+))?$")
        .expect("binding pattern is valid")
});

static LEGACY_PROP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*export\s+let\s+([A-Za-z_$][\w$]*)\s*(?::\s*([^=;\n]+?))?\s*(?:=\s*([^;\n]+?))?\s*;?[ \t]*$")
        .expect("legacy prop pattern is valid")
});

static FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:export\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)\s*(?:<[^>(]*>)?\s*\(([^)]*)\)\s*(?::\s*([^{]+?))?\s*\{")
        .expect("function pattern is valid")
});

/// Regex recovery used when the behavior region does not parse.
///
/// Produces the same record shapes as the tree walk with lower fidelity:
/// nested generics are only delimited by bracket depth and multi-line member
/// descriptions are dropped.
pub struct PatternExtractor<'a> {
    source: &'a str,
    options: &'a ExtractOptions,
}

impl<'a> PatternExtractor<'a> {
    pub fn new(source: &'a str, options: &'a ExtractOptions) -> Self {
        Self { source, options }
    }

    /// Body of the props type declaration, between its braces.
    fn props_body(&self) -> Option<&'a str> {
        let name = regex::escape(&self.options.props_type_name);
        let header = Regex::new(&format!(
            r"(?:^|[^\w$])(?:(interface)\s+{name}\b|type\s+{name}\s*=\s*\{{)"
        ))
        .ok()?;
        let captures = header.captures(self.source)?;
        let end = captures.get(0)?.end();
        let body_start = if captures.get(1).is_some() {
            interface_body_start(self.source, end)?
        } else {
            end
        };
        balanced_block(self.source, body_start).map(|(body, _)| body)
    }

    fn collect_members(&self, body: &str, api: &mut ScriptApi) {
        let prefix = &self.options.event_prefix;
        for (text, description) in member_lines(body) {
            let member = if let Some(captures) = PROPERTY_MEMBER.captures(&text) {
                (
                    unquote(&captures[1]).to_string(),
                    captures.get(2).is_some(),
                    clean_type(&captures[3]),
                )
            } else if let Some(captures) = METHOD_MEMBER.captures(&text) {
                (
                    captures[1].to_string(),
                    captures.get(2).is_some(),
                    format!(
                        "({}) => {}",
                        normalize(&captures[3]),
                        clean_type(&captures[4])
                    ),
                )
            } else {
                api.warn(format!(
                    "Skipping unrecognized member `{}` of {}",
                    text, self.options.props_type_name
                ));
                continue;
            };

            let (name, optional, type_expression) = member;
            if is_event_name(&name, prefix) {
                api.events.push(EventRecord {
                    name: event_name(&name, prefix),
                    type_expression,
                    description,
                    payload_type: None,
                    source: EventSource::Prop,
                });
            } else {
                let mut param = ParameterRecord::new(name, type_expression, !optional);
                param.description = description;
                api.parameters.push(param);
            }
        }
    }

    /// Merge defaults from every `{ … } = $props()` destructuring.
    fn apply_destructuring(&self, api: &mut ScriptApi) -> bool {
        let rune = regex::escape(&self.options.props_rune);
        let Ok(initializer) = Regex::new(&format!(
            r"^\s*(?::\s*[^=]+?)?\s*=\s*{rune}\s*(?:<[^>]*>)?\s*\("
        )) else {
            return false;
        };

        let mut found = false;
        for start in DESTRUCTURING_START.find_iter(self.source) {
            let Some((content, after)) = balanced_block(self.source, start.end()) else {
                continue;
            };
            if !initializer.is_match(&self.source[after..]) {
                continue;
            }
            found = true;

            for entry in split_top_level(content, &[',']) {
                let entry = entry.trim();
                let (binding, default) = split_default(entry);
                let Some(captures) = BINDING.captures(binding.trim()) else {
                    continue;
                };
                if captures.get(1).is_some() {
                    continue;
                }
                let name = &captures[2];
                let default = default.map(literal_from_text);

                if let Some(param) = api.parameter_mut(name) {
                    if let Some(value) = default {
                        param.apply_default(value);
                    }
                    continue;
                }
                if is_event_name(name, &self.options.event_prefix) {
                    let event = event_name(name, &self.options.event_prefix);
                    if api.events.iter().any(|record| record.name == event) {
                        continue;
                    }
                }

                let mut param = ParameterRecord::new(name, UNKNOWN_TYPE, default.is_none());
                if let Some(value) = default {
                    param.apply_default(value);
                }
                api.parameters.push(param);
            }
        }
        found
    }

    fn legacy_props(&self, api: &mut ScriptApi) {
        for captures in LEGACY_PROP.captures_iter(self.source) {
            let ty = captures
                .get(2)
                .map(|ty| clean_type(ty.as_str()))
                .unwrap_or_else(|| UNKNOWN_TYPE.to_string());
            let mut param = ParameterRecord::new(&captures[1], ty, true);
            if let Some(default) = captures.get(3) {
                param.apply_default(literal_from_text(default.as_str()));
            }
            api.parameters.push(param);
        }
    }

    fn operations(&self, api: &mut ScriptApi) {
        for captures in FUNCTION.captures_iter(self.source) {
            let name = captures[1].to_string();
            let parameters: Vec<ParameterRecord> = split_top_level(&captures[2], &[','])
                .into_iter()
                .filter_map(|text| {
                    let (binding, default) = split_default(text.trim());
                    let captures = BINDING.captures(binding.trim())?;
                    let rest = captures.get(1).is_some();
                    let name = format!("{}{}", if rest { "..." } else { "" }, &captures[2]);
                    let ty = captures
                        .get(4)
                        .map(|ty| clean_type(ty.as_str()))
                        .unwrap_or_else(|| UNKNOWN_TYPE.to_string());
                    let required = !rest && captures.get(3).is_none();
                    let mut param = ParameterRecord::new(name, ty, required);
                    if let Some(default) = default {
                        param.apply_default(literal_from_text(default));
                    }
                    Some(param)
                })
                .collect();
            let return_type = captures
                .get(3)
                .map(|ty| clean_type(ty.as_str()))
                .unwrap_or_else(|| NO_VALUE_TYPE.to_string());
            let names: Vec<&str> = parameters.iter().map(|p| p.name.as_str()).collect();
            let description = format!("Calls {}({})", name, names.join(", "));

            api.operations.push(OperationRecord {
                name,
                parameters,
                return_type,
                description,
            });
        }
    }
}

impl ApiExtractor for PatternExtractor<'_> {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Pattern
    }

    fn extract(&self) -> ScriptApi {
        let mut api = ScriptApi::default();

        match self.props_body() {
            Some(body) => self.collect_members(body, &mut api),
            None => tracing::debug!(
                "No {} declaration found by pattern",
                self.options.props_type_name
            ),
        }

        if !self.apply_destructuring(&mut api) {
            self.legacy_props(&mut api);
        }
        self.operations(&mut api);

        api
    }
}

/// Content of the block opened just before `start`, and the index after its
/// closing brace. Quoted strings are skipped.
/// Offset just past the `{` opening an interface body.
///
/// Type arguments in the heritage clause (`extends Base<{ x: 1 }>`) are
/// skipped; a `;` before the body means there is none.
fn interface_body_start(source: &str, from: usize) -> Option<usize> {
    let mut angle = 0usize;
    let mut previous = ' ';
    for (offset, c) in source.get(from..)?.char_indices() {
        match c {
            '<' => angle += 1,
            '>' if previous != '=' => angle = angle.saturating_sub(1),
            '{' if angle == 0 => return Some(from + offset + 1),
            ';' if angle == 0 => return None,
            _ => {}
        }
        previous = c;
    }
    None
}

fn balanced_block(source: &str, start: usize) -> Option<(&str, usize)> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, c) in source.get(start..)?.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == open {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset;
                    return Some((&source[start..end], end + 1));
                }
            }
            _ => {}
        }
    }
    None
}

/// Split `text` on `separators` outside brackets and quotes. `=>` never
/// closes an angle bracket.
fn split_top_level<'t>(text: &'t str, separators: &[char]) -> Vec<&'t str> {
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut previous = '\0';
    let mut piece_start = 0;

    for (index, c) in text.char_indices() {
        if let Some(open) = quote {
            if c == open && previous != '\\' {
                quote = None;
            }
            previous = c;
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '(' | '[' | '{' | '<' => depth += 1,
            '>' if previous == '=' => {}
            ')' | ']' | '}' | '>' => depth = (depth - 1).max(0),
            c if depth == 0 && separators.contains(&c) => {
                pieces.push(&text[piece_start..index]);
                piece_start = index + c.len_utf8();
            }
            _ => {}
        }
        previous = c;
    }
    pieces.push(&text[piece_start..]);
    pieces
}

/// Split `name: T = value` at its top-level default `=`.
fn split_default(text: &str) -> (&str, Option<&str>) {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    for (index, &byte) in bytes.iter().enumerate() {
        match byte {
            b'(' | b'[' | b'{' | b'<' => depth += 1,
            b'>' if index > 0 && bytes[index - 1] == b'=' => {}
            b')' | b']' | b'}' | b'>' => depth -= 1,
            b'=' if depth == 0 => {
                let next = bytes.get(index + 1).copied();
                let prev = index.checked_sub(1).map(|i| bytes[i]);
                if next != Some(b'>')
                    && next != Some(b'=')
                    && !matches!(prev, Some(b'=' | b'!' | b'<' | b'>'))
                {
                    return (&text[..index], Some(text[index + 1..].trim()));
                }
            }
            _ => {}
        }
    }
    (text, None)
}

/// Member declarations of a type body with their single-line doc comments.
fn member_lines(body: &str) -> Vec<(String, Option<String>)> {
    let body = strip_multiline_comments(body);
    let mut members: Vec<(String, Option<String>)> = Vec::new();
    let mut pending: Option<String> = None;

    for piece in split_top_level(&body, &[';', ',', '\n']) {
        let mut text = piece.trim();
        if let Some(rest) = text.strip_prefix("/**") {
            let Some((comment, after)) = rest.split_once("*/") else {
                continue;
            };
            let comment = comment.trim();
            if !comment.is_empty() {
                pending = Some(comment.to_string());
            }
            text = after.trim();
        }
        if text.is_empty() || text.starts_with("//") || text.starts_with("/*") {
            continue;
        }

        let continues_previous = text.starts_with('|')
            || text.starts_with('&')
            || members.last().is_some_and(|(last, _)| {
                last.ends_with('|') || last.ends_with('&') || last.ends_with(':') || last.ends_with("=>")
            });
        if continues_previous {
            if let Some((last, _)) = members.last_mut() {
                last.push(' ');
                last.push_str(text);
                continue;
            }
        }

        let text = match text.find("//") {
            Some(index) if !text[..index].contains(['\'', '"']) => text[..index].trim(),
            _ => text,
        };
        members.push((text.to_string(), pending.take()));
    }
    members
}

/// Drop block comments that span lines; single-line ones stay.
fn strip_multiline_comments(body: &str) -> String {
    let mut output = String::with_capacity(body.len());
    let mut rest = body;
    while let Some(start) = rest.find("/*") {
        let Some(length) = rest[start..].find("*/") else {
            break;
        };
        let end = start + length + 2;
        output.push_str(&rest[..start]);
        let comment = &rest[start..end];
        if !comment.contains('\n') {
            output.push_str(comment);
        }
        rest = &rest[end..];
    }
    output.push_str(rest);
    output
}

fn clean_type(text: &str) -> String {
    normalize(text.trim().trim_end_matches([';', ',']).trim_start_matches('|'))
}

fn unquote(text: &str) -> &str {
    text.trim_matches(|c| c == '\'' || c == '"')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn extract(source: &str) -> ScriptApi {
        let options = ExtractOptions::default();
        PatternExtractor::new(source, &options).extract()
    }

    #[test]
    fn generic_arguments_in_extends_are_not_the_body() {
        let api = extract(
            r#"
interface Props extends Base<{ x: 1 }> { label: string }
const broken = ;
"#,
        );
        assert_eq!(api.parameters.len(), 1);
        assert_eq!(api.parameters[0].name, "label");
        assert_eq!(api.parameters[0].type_expression, "string");
        assert!(api.parameters[0].required);
    }

    #[test]
    fn recovers_props_and_defaults() {
        let api = extract(
            r#"
interface Props { label: string; onClose?: () => void }
let { label = "x" } = $props();
const broken = ;
"#,
        );
        assert_eq!(api.parameters.len(), 1);
        assert_eq!(api.parameters[0].name, "label");
        assert_eq!(api.parameters[0].type_expression, "string");
        assert!(!api.parameters[0].required);
        assert_eq!(api.parameters[0].default_value, Some(Value::from("x")));
        assert_eq!(api.events[0].name, "close");
        assert_eq!(api.events[0].type_expression, "() => void");
    }

    #[test]
    fn multiline_members_and_unions() {
        let api = extract(
            r#"
type Props = {
  /** Size of the button */
  size?:
    | 'sm'
    | 'lg';
  /**
   * Multi-line descriptions are dropped.
   */
  items: Array<{ id: string, label: string }>;
  readonly count: number // trailing note
  onSelect(item: string): void
};
"#,
        );
        let names: Vec<&str> = api.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["size", "items", "count"]);
        assert_eq!(api.parameters[0].type_expression, "'sm' | 'lg'");
        assert_eq!(
            api.parameters[0].description.as_deref(),
            Some("Size of the button")
        );
        assert!(api.parameters[1].description.is_none());
        assert_eq!(
            api.parameters[1].type_expression,
            "Array<{ id: string, label: string }>"
        );
        assert_eq!(api.parameters[2].type_expression, "number");
        assert_eq!(api.events[0].type_expression, "(item: string) => void");
    }

    #[test]
    fn destructuring_without_props_type() {
        let api = extract(
            "let { variant = 'primary', onClick = () => {}, ...rest }: Props = $props<Props>(;",
        );
        assert_eq!(api.parameters.len(), 2);
        assert_eq!(api.parameters[0].default_value, Some(Value::from("primary")));
        assert_eq!(api.parameters[1].name, "onClick");
        assert_eq!(api.parameters[1].default_value, Some(Value::from("() => {}")));
    }

    #[test]
    fn legacy_exports_and_functions() {
        let api = extract(
            r#"
export let title: string = 'Hi';
export let open;
export function toggle(force?: boolean, delay: number = 10): void {
  open = force ?? !open
"#,
        );
        assert_eq!(api.parameters.len(), 2);
        assert_eq!(api.parameters[0].default_value, Some(Value::from("Hi")));
        assert!(api.parameters[1].required);

        let toggle = &api.operations[0];
        assert_eq!(toggle.return_type, "void");
        assert!(!toggle.parameters[0].required);
        assert_eq!(toggle.parameters[1].default_value, Some(Value::from(10)));
        assert_eq!(toggle.description, "Calls toggle(force, delay)");
    }

    #[test]
    fn splitting_respects_nesting() {
        assert_eq!(
            split_top_level("a: Map<K, V>, b: (x, y) => void", &[',']),
            ["a: Map<K, V>", " b: (x, y) => void"]
        );
        assert_eq!(split_default("cb = () => {}"), ("cb ", Some("() => {}")));
        assert_eq!(split_default("cb: () => void"), ("cb: () => void", None));
    }
}
