//! Section splitting for Svelte component files.
//!
//! A component is divided into a behavior region (the instance `<script>`
//! block), a style region (the `<style>` block) and the template (everything
//! else). Tags are located with memchr rather than regular expressions.

use memchr::memmem;

/// The regions of one component source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections<'a> {
    /// Content of the instance `<script>` block.
    pub behavior: &'a str,
    /// `lang` attribute of the instance script (`js` when absent).
    pub lang: &'a str,
    /// Content of the module-context `<script>` block.
    pub module_behavior: &'a str,
    /// Everything outside the recognized script and style blocks.
    pub template: String,
    /// Content of the `<style>` block.
    pub style: &'a str,
}

impl Sections<'_> {
    /// Returns `true` when the component has an instance script.
    pub fn has_behavior(&self) -> bool {
        !self.behavior.trim().is_empty()
    }
}

/// A located `<tag …>…</tag>` block.
#[derive(Debug, Clone, Copy)]
struct Block<'a> {
    /// Byte range of the whole block, tags included.
    outer: (usize, usize),
    content: &'a str,
    attributes: &'a str,
}

/// Split a component source into behavior, template and style regions.
///
/// At most one instance script and one style block are recognized; later
/// blocks of the same kind stay in the template. A module-context script is
/// exposed separately and removed from the template. Unterminated blocks are
/// ignored.
pub fn split_sections(source: &str) -> Sections<'_> {
    let mut sections = Sections {
        lang: "js",
        ..Sections::default()
    };
    let mut removed: Vec<(usize, usize)> = Vec::new();
    let mut have_instance = false;
    let mut have_module = false;

    let mut pointer = 0;
    while let Some(block) = find_block(source, b"script", &mut pointer) {
        if is_module_context(block.attributes) {
            if have_module {
                continue;
            }
            have_module = true;
            sections.module_behavior = block.content;
        } else {
            if have_instance {
                continue;
            }
            have_instance = true;
            sections.behavior = block.content;
            sections.lang = extract_lang_attribute(block.attributes);
        }
        removed.push(block.outer);
    }

    // `<style>` text inside a script block is script content
    let mut pointer = 0;
    while let Some(block) = find_block(source, b"style", &mut pointer) {
        let start = block.outer.0;
        if let Some(&(_, end)) = removed.iter().find(|(from, to)| (*from..*to).contains(&start)) {
            pointer = end;
            continue;
        }
        sections.style = block.content;
        removed.push(block.outer);
        break;
    }

    removed.sort_unstable();
    let mut template = String::with_capacity(source.len());
    let mut cursor = 0;
    for (start, end) in removed {
        if start < cursor {
            continue;
        }
        template.push_str(&source[cursor..start]);
        cursor = end;
    }
    template.push_str(&source[cursor..]);
    sections.template = template;

    sections
}

/// Finds the next `<tag …>…</tag>` block at or after `pointer`.
fn find_block<'a>(source: &'a str, tag: &[u8], pointer: &mut usize) -> Option<Block<'a>> {
    let bytes = source.as_bytes();
    let mut open = Vec::with_capacity(tag.len() + 1);
    open.push(b'<');
    open.extend_from_slice(tag);
    let mut close = Vec::with_capacity(tag.len() + 3);
    close.extend_from_slice(b"</");
    close.extend_from_slice(tag);
    close.push(b'>');

    loop {
        let start = *pointer + memmem::find(bytes.get(*pointer..)?, &open)?;
        let after_name = start + open.len();
        *pointer = after_name;

        // Reject `<scripts>`, `<styled-box>` and similar
        match bytes.get(after_name) {
            Some(b' ' | b'\t' | b'\n' | b'\r' | b'>' | b'/') => {}
            _ => continue,
        }

        let tag_end = find_closing_angle(bytes, after_name)?;
        let attributes = &source[after_name..tag_end];

        if tag_end > 0 && bytes[tag_end - 1] == b'/' {
            *pointer = tag_end + 1;
            return Some(Block {
                outer: (start, tag_end + 1),
                content: "",
                attributes: attributes.trim_end_matches('/'),
            });
        }

        let content_start = tag_end + 1;
        let content_end = content_start + memmem::find(&bytes[content_start..], &close)?;
        *pointer = content_end + close.len();

        return Some(Block {
            outer: (start, content_end + close.len()),
            content: &source[content_start..content_end],
            attributes,
        });
    }
}

/// Finds the closing `>` of an opening tag, skipping quoted attribute values.
fn find_closing_angle(bytes: &[u8], start: usize) -> Option<usize> {
    let mut in_quote = false;
    let mut quote_char = 0u8;

    for (i, &byte) in bytes[start..].iter().enumerate() {
        match byte {
            b'"' | b'\'' => {
                if !in_quote {
                    in_quote = true;
                    quote_char = byte;
                } else if byte == quote_char {
                    in_quote = false;
                }
            }
            b'>' if !in_quote => return Some(start + i),
            _ => {}
        }
    }

    None
}

/// Svelte 4 `context="module"` and Svelte 5 bare `module` attribute.
fn is_module_context(attributes: &str) -> bool {
    attributes.contains("context=\"module\"")
        || attributes.contains("context='module'")
        || attributes
            .split_whitespace()
            .any(|attribute| attribute == "module")
}

/// Extracts the `lang` attribute value from a tag.
fn extract_lang_attribute(attributes: &str) -> &str {
    let Some(lang_pos) = attributes.find("lang=") else {
        return "js";
    };
    let value = attributes[lang_pos + 5..].trim_start();

    let Some(quote_char) = value.chars().next() else {
        return "js";
    };
    let lang = if quote_char == '"' || quote_char == '\'' {
        match value[1..].find(quote_char) {
            Some(end_quote) => &value[1..=end_quote],
            None => "",
        }
    } else {
        let end = value
            .find(|c: char| c.is_whitespace() || c == '>')
            .unwrap_or(value.len());
        &value[..end]
    };

    if lang.is_empty() {
        "js"
    } else {
        lang
    }
}
