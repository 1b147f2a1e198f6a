//! Placeholder and resolved-content wire format.
//!
//! The client reconciler relies on these shapes byte for byte:
//!
//! - placeholder: `<slot id="{id}">{loading}</slot>`
//! - wrapper: `<template id="{id}_content">{markup}</template>`
//!
//! Slot ids are restricted to `[A-Za-z0-9_-]` and are written unescaped.

use crate::escape::escape_html_into;

/// Suffix appended to a slot id to form its wrapper id.
pub const CONTENT_SUFFIX: &str = "_content";

/// Error text shown when failure details are hidden.
pub const DEFAULT_ERROR_MESSAGE: &str = "Failed to load content";

const SLOT_OPEN: &str = "<slot id=\"";
const WRAPPER_OPEN: &str = "<template id=\"";

pub fn write_placeholder(out: &mut String, slot_id: &str, loading: &str) {
    out.push_str(SLOT_OPEN);
    out.push_str(slot_id);
    out.push_str("\">");
    out.push_str(loading);
    out.push_str("</slot>");
}

pub fn placeholder(slot_id: &str, loading: &str) -> String {
    let mut out = String::with_capacity(slot_id.len() + loading.len() + 24);
    write_placeholder(&mut out, slot_id, loading);
    out
}

pub fn write_wrapper(out: &mut String, slot_id: &str, content: &str) {
    out.push_str(WRAPPER_OPEN);
    out.push_str(slot_id);
    out.push_str(CONTENT_SUFFIX);
    out.push_str("\">");
    out.push_str(content);
    out.push_str("</template>");
}

pub fn wrapper(slot_id: &str, content: &str) -> String {
    let mut out = String::with_capacity(slot_id.len() + content.len() + 40);
    write_wrapper(&mut out, slot_id, content);
    out
}

/// Inline fragment rendered in place of a failed value. `message` is escaped.
pub fn error_fragment(message: &str) -> String {
    let mut out = String::from("<div class=\"slot-error\" role=\"alert\">");
    escape_html_into(&mut out, message);
    out.push_str("</div>");
    out
}

/// Extract the id of the first placeholder in `markup`.
pub fn parse_slot_id(markup: &str) -> Option<&str> {
    attribute_after(markup, SLOT_OPEN)
}

/// Extract the slot id addressed by the first wrapper in `markup`.
pub fn parse_wrapper_id(markup: &str) -> Option<&str> {
    attribute_after(markup, WRAPPER_OPEN)?.strip_suffix(CONTENT_SUFFIX)
}

/// Every placeholder id in `markup`, in document order.
pub fn slot_ids(markup: &str) -> Vec<&str> {
    let mut ids = Vec::new();
    let mut rest = markup;
    while let Some(start) = rest.find(SLOT_OPEN) {
        rest = &rest[start..];
        match attribute_after(rest, SLOT_OPEN) {
            Some(id) => ids.push(id),
            None => break,
        }
        rest = &rest[SLOT_OPEN.len()..];
    }
    ids
}

fn attribute_after<'a>(markup: &'a str, open: &str) -> Option<&'a str> {
    let start = markup.find(open)? + open.len();
    let len = markup[start..].find('"')?;
    Some(&markup[start..start + len])
}
