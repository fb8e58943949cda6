//! Selector parsing and matching.
//!
//! Supports selector lists of compound selectors:
//!
//! ```text
//! button            tag
//! *                 universal
//! #save             id
//! .toast.is-open    classes
//! [data-dismiss]    attribute present
//! [role=dialog]     attribute equals (value may be quoted)
//! a, button.close   list
//! ```
//!
//! Combinators (descendant, `>`, `+`, `~`) are rejected. Delegation walks
//! ancestors itself, so compound matching is all it needs.

use std::fmt;

use crate::error::SelectorError;

use super::Document;
use crate::types::NodeId;

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Compound>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeMatch {
    name: String,
    value: Option<String>,
}

impl Selector {
    /// Parse a selector list.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        if input.trim().is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut alternatives = Vec::new();
        for (offset, part) in split_list(input) {
            alternatives.push(parse_compound(part, input, offset)?);
        }

        Ok(Self {
            source: input.to_string(),
            alternatives,
        })
    }

    /// The text this selector was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Does `node` match any alternative?
    pub fn matches(&self, document: &Document, node: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|compound| compound.matches(document, node))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Compound {
    fn matches(&self, document: &Document, node: NodeId) -> bool {
        if let Some(tag) = &self.tag {
            match document.tag_name(node) {
                Some(actual) if actual.eq_ignore_ascii_case(tag) => {}
                _ => return false,
            }
        }

        if let Some(id) = &self.id {
            if document.attribute(node, "id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }

        if !self.classes.iter().all(|class| document.has_class(node, class)) {
            return false;
        }

        self.attributes.iter().all(|attr| {
            match (document.attribute(node, &attr.name), &attr.value) {
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == *expected,
                (None, _) => false,
            }
        })
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Split on commas that are outside brackets and quotes.
/// Yields `(byte offset, trimmed part)`.
fn split_list(input: &str) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_brackets = false;
    let mut quote: Option<char> = None;

    for (i, ch) in input.char_indices() {
        match (ch, quote) {
            ('"' | '\'', None) if in_brackets => quote = Some(ch),
            (c, Some(q)) if c == q => quote = None,
            ('[', None) => in_brackets = true,
            (']', None) => in_brackets = false,
            (',', None) if !in_brackets => {
                parts.push(trim_with_offset(input, start, i));
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(trim_with_offset(input, start, input.len()));
    parts
}

fn trim_with_offset(input: &str, start: usize, end: usize) -> (usize, &str) {
    let slice = &input[start..end];
    let leading = slice.len() - slice.trim_start().len();
    (start + leading, slice.trim())
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_'
}

fn parse_compound(part: &str, full: &str, base: usize) -> Result<Compound, SelectorError> {
    if part.is_empty() {
        return Err(SelectorError::Empty);
    }

    let unexpected = |offset: usize, found: char| SelectorError::Unexpected {
        selector: full.to_string(),
        found,
        offset: base + offset,
    };

    let mut compound = Compound::default();
    let chars: Vec<(usize, char)> = part.char_indices().collect();
    let mut i = 0;

    // Reads an identifier starting at `start`; returns it and the next index.
    let read_ident = |start: usize| -> (String, usize) {
        let mut end = start;
        let mut ident = String::new();
        while end < chars.len() && is_ident_char(chars[end].1) {
            ident.push(chars[end].1);
            end += 1;
        }
        (ident, end)
    };

    while i < chars.len() {
        let (offset, ch) = chars[i];
        match ch {
            '*' if i == 0 => i += 1,
            '#' | '.' => {
                let (ident, next) = read_ident(i + 1);
                if ident.is_empty() {
                    let (off, found) = chars.get(i + 1).copied().unwrap_or((offset, ch));
                    return Err(unexpected(off, found));
                }
                if ch == '#' {
                    compound.id = Some(ident);
                } else {
                    compound.classes.push(ident);
                }
                i = next;
            }
            '[' => {
                let (attribute, next) = parse_attribute(&chars, i, full, base)?;
                compound.attributes.push(attribute);
                i = next;
            }
            c if c.is_whitespace() || matches!(c, '>' | '+' | '~') => {
                return Err(SelectorError::Combinator {
                    selector: full.to_string(),
                });
            }
            c if i == 0 && is_ident_char(c) => {
                let (ident, next) = read_ident(i);
                compound.tag = Some(ident.to_ascii_lowercase());
                i = next;
            }
            c => return Err(unexpected(offset, c)),
        }
    }

    Ok(compound)
}

/// Parse `[name]` / `[name=value]` starting at the `[` in `chars[open]`.
fn parse_attribute(
    chars: &[(usize, char)],
    open: usize,
    full: &str,
    base: usize,
) -> Result<(AttributeMatch, usize), SelectorError> {
    let mut quote: Option<char> = None;
    let mut close = None;
    for (j, &(_, ch)) in chars.iter().enumerate().skip(open + 1) {
        match (ch, quote) {
            ('"' | '\'', None) => quote = Some(ch),
            (c, Some(q)) if c == q => quote = None,
            (']', None) => {
                close = Some(j);
                break;
            }
            _ => {}
        }
    }
    let Some(close) = close else {
        return Err(SelectorError::UnterminatedAttribute {
            selector: full.to_string(),
        });
    };

    let inner: String = chars[open + 1..close].iter().map(|&(_, c)| c).collect();
    let (name, value) = match inner.split_once('=') {
        Some((name, value)) => {
            let value = value.trim();
            let unquoted = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            (name.trim().to_string(), Some(unquoted.to_string()))
        }
        None => (inner.trim().to_string(), None),
    };

    if name.is_empty() || !name.chars().all(is_ident_char) {
        let (offset, found) = chars[open + 1];
        return Err(SelectorError::Unexpected {
            selector: full.to_string(),
            found,
            offset: base + offset,
        });
    }

    Ok((AttributeMatch { name, value }, close + 1))
}
