use std::borrow::Cow;

use regex::{Regex, Replacer};

/// Whitespace as the filters understand it: ASCII only, including VT.
pub(crate) fn is_space(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\x0B' | '\x0C' | '\r' | ' ')
}

/// Runs `re.replace_all` over `text`, reporting whether anything changed.
pub(crate) fn replace_all_in<R: Replacer>(re: &Regex, text: &mut String, rep: R) -> bool {
    let replaced = match re.replace_all(text, rep) {
        Cow::Owned(s) => s,
        Cow::Borrowed(_) => return false,
    };
    *text = replaced;
    true
}

/// Replaces every literal `from` with `to`.
pub(crate) fn replace_literal_in(text: &mut String, from: &str, to: &str) -> bool {
    if from.is_empty() || !text.contains(from) {
        return false;
    }
    *text = text.replace(from, to);
    true
}

/// Applies literal replacements in order, each over the whole text.
pub(crate) fn replace_literals_in(text: &mut String, pairs: &[(&str, &str)]) -> bool {
    let mut changed = false;
    for (from, to) in pairs {
        changed |= replace_literal_in(text, from, to);
    }
    changed
}

/// Rebuilds `text` left to right from the spans `edit` rewrites.
///
/// `edit` is called with the current position and returns the next span
/// to rewrite as `(start, end, replacement)`, or `None` when done.
pub(crate) fn splice<F>(text: &str, mut edit: F) -> Option<String>
where
    F: FnMut(usize) -> Option<(usize, usize, String)>,
{
    let mut out: Option<String> = None;
    let mut pos = 0;
    while pos <= text.len() {
        let Some((start, end, replacement)) = edit(pos) else {
            break;
        };
        let buf = out.get_or_insert_with(|| String::with_capacity(text.len()));
        buf.push_str(&text[pos..start]);
        buf.push_str(&replacement);
        if end == pos && start == end {
            // Empty edit: step over one char so the scan always advances.
            match text[end..].chars().next() {
                Some(c) => {
                    buf.push(c);
                    pos = end + c.len_utf8();
                }
                None => {
                    pos = end;
                    break;
                }
            }
        } else {
            pos = end;
        }
    }
    let mut buf = out?;
    buf.push_str(&text[pos.min(text.len())..]);
    Some(buf)
}
