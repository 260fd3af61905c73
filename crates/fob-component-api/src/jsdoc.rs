//! JSDoc comment parsing.

use oxc_ast::Comment;
use oxc_span::Span;
use rustc_hash::FxHashMap;

/// The parts of a JSDoc block that extraction consumes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedJsDoc {
    /// Free text before the first tag, lines joined with spaces.
    pub summary: Option<String>,
    /// `@param` tags in declaration order.
    pub params: Vec<JsDocParam>,
    /// Type hint of `@returns {T}`.
    pub returns_type: Option<String>,
}

impl ParsedJsDoc {
    pub fn param(&self, name: &str) -> Option<&JsDocParam> {
        self.params.iter().find(|param| param.name == name)
    }
}

/// A `@param {T} name description` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsDocParam {
    /// Parameter name, without the brackets and default of `[name=value]`.
    pub name: String,
    pub type_hint: Option<String>,
    pub description: Option<String>,
}

/// Parse the content of a `/** … */` comment.
///
/// Lines following a tag continue its text until the next tag. Tags other
/// than `@param` and `@returns` are ignored.
pub fn parse_jsdoc(raw: &str) -> ParsedJsDoc {
    let mut doc = ParsedJsDoc::default();
    let mut summary = String::new();
    let mut current: Option<(&str, String)> = None;

    for line in raw.lines().map(strip_gutter) {
        if let Some(tagged) = line.strip_prefix('@') {
            if let Some((tag, text)) = current.take() {
                apply_tag(&mut doc, tag, &text);
            }
            let (tag, text) = tagged.split_once(char::is_whitespace).unwrap_or((tagged, ""));
            current = Some((tag, text.trim().to_string()));
            continue;
        }
        let target = match current.as_mut() {
            Some((_, text)) => text,
            None => &mut summary,
        };
        append_word_run(target, line);
    }
    if let Some((tag, text)) = current {
        apply_tag(&mut doc, tag, &text);
    }

    doc.summary = (!summary.is_empty()).then_some(summary);
    doc
}

/// Trim a comment line and its leading `*`.
fn strip_gutter(line: &str) -> &str {
    let line = line.trim();
    line.strip_prefix('*').map_or(line, str::trim_start)
}

fn append_word_run(target: &mut String, line: &str) {
    if line.is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(line);
}

fn apply_tag(doc: &mut ParsedJsDoc, tag: &str, text: &str) {
    match tag {
        "param" | "arg" | "argument" => {
            let (type_hint, rest) = braced_type(text);
            let (name, description) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let name = name
                .trim_start_matches('[')
                .split(['=', ']'])
                .next()
                .unwrap_or_default();
            if name.is_empty() {
                return;
            }
            let description = description.trim().trim_start_matches('-').trim();
            doc.params.push(JsDocParam {
                name: name.to_string(),
                type_hint,
                description: (!description.is_empty()).then(|| description.to_string()),
            });
        }
        "returns" | "return" => doc.returns_type = braced_type(text).0,
        _ => {}
    }
}

/// Split a leading `{T}` off `text`.
fn braced_type(text: &str) -> (Option<String>, &str) {
    let Some(inner) = text.strip_prefix('{') else {
        return (None, text);
    };
    match inner.split_once('}') {
        Some((ty, rest)) => {
            let ty = ty.trim();
            ((!ty.is_empty()).then(|| ty.to_string()), rest.trim_start())
        }
        None => (None, text),
    }
}

/// JSDoc comments of one parsed program keyed by the position of the node
/// they document.
#[derive(Debug, Default)]
pub struct CommentMap<'a> {
    source: &'a str,
    comments: FxHashMap<u32, Span>,
}

impl<'a> CommentMap<'a> {
    /// Indexes every `/** … */` comment by its attachment point.
    pub fn new<'c, I>(source: &'a str, comments: I) -> Self
    where
        I: IntoIterator<Item = &'c Comment>,
    {
        let mut map = FxHashMap::default();
        for comment in comments {
            if comment.is_jsdoc() {
                map.insert(comment.attached_to, comment.content_span());
            }
        }
        Self {
            source,
            comments: map,
        }
    }

    /// Parsed JSDoc attached to the node starting at `start`.
    pub fn doc_at(&self, start: u32) -> Option<ParsedJsDoc> {
        let span = self.comments.get(&start)?;
        let raw = self.source.get(span.start as usize..span.end as usize)?;
        Some(parse_jsdoc(raw))
    }

    /// Summary of the JSDoc attached to the node starting at `start`.
    pub fn summary_at(&self, start: u32) -> Option<String> {
        self.doc_at(start).and_then(|doc| doc.summary)
    }
}
