//! Text normalization run before any filter looks at the input.
//!
//! Attackers hide payloads behind control characters, percent-encoding and
//! (possibly nested) character references. Everything here undoes those
//! layers so the filters only ever see the text a browser would see.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::text::{is_space, replace_all_in, splice};

/// Upper bound on decode rounds. Every productive round shrinks the text,
/// so honest input settles long before this.
const MAX_DECODE_ROUNDS: usize = 64;

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in normalization pattern")
}

static INVISIBLE_ENCODED: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)%0[0-8bcef]|%1[0-9a-f]"));
static INVISIBLE_RAW: LazyLock<Regex> = LazyLock::new(|| compile(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]+"));
static SPACED_PERCENT: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)%(?:(?-u:\s)*[0-9a-f]){2,}"));
static QUOTED_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?is)[^a-z0-9>]+[a-z0-9]+=(?:".*?"|'.*?')"#));
static TAG_START: LazyLock<Regex> = LazyLock::new(|| compile(r"<[A-Za-z0-9_]"));
static QUERY_PARAMETER: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)&[a-z_0-9\-]+=[a-z_0-9\-/]+"));

/// Strips control characters, raw or percent-encoded, until none remain.
///
/// TAB, LF and CR survive; they are meaningful whitespace.
pub(crate) fn remove_invisible(text: &str, url_encoded: bool) -> String {
    let mut text = text.to_owned();
    loop {
        let mut changed = false;
        if url_encoded {
            changed |= replace_all_in(&INVISIBLE_ENCODED, &mut text, "");
        }
        changed |= replace_all_in(&INVISIBLE_RAW, &mut text, "");
        if !changed {
            return text;
        }
    }
}

/// Percent-decodes until stable, including `%` sequences split by whitespace.
pub(crate) fn percent_decode(text: String) -> String {
    if !text.contains('%') {
        return text;
    }
    let mut text = text;
    for _ in 0..MAX_DECODE_ROUNDS {
        let mut next = raw_url_decode(&text);
        replace_all_in(&SPACED_PERCENT, &mut next, |caps: &Captures<'_>| {
            let run = &caps[0];
            let compact: String = run.chars().filter(|&c| !is_space(c)).collect();
            if compact == run {
                compact
            } else {
                raw_url_decode(&compact)
            }
        });
        if next == text {
            break;
        }
        text = next;
    }
    text
}

fn raw_url_decode(text: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(text.as_bytes())).into_owned()
}

/// Escapes `<`, `>` and `\` inside quoted attribute values, before entity
/// decoding can turn encoded brackets into live ones.
pub(crate) fn escape_quoted_attributes(text: &mut String) -> bool {
    replace_all_in(&QUOTED_ATTRIBUTE, text, |caps: &Captures<'_>| {
        caps[0].replace('>', "&gt;").replace('<', "&lt;").replace('\\', "\\\\")
    })
}

/// Decodes character references inside each tag opening, from `<name`
/// up to the next `<` or `>`. Text between tags is left alone, as are
/// `&name=value` query parameters inside a tag.
pub(crate) fn decode_markup_entities(text: &mut String) -> bool {
    let source = text.as_str();
    let decoded = splice(source, |from| {
        let start = TAG_START.find_at(source, from)?.start();
        let end = source[start + 1..]
            .find(['<', '>'])
            .map_or(source.len(), |offset| start + 1 + offset);
        Some((start, end, decode_tag_zone(&source[start..end])))
    });
    match decoded {
        Some(next) if next != *text => {
            *text = next;
            true
        }
        _ => false,
    }
}

fn decode_tag_zone(zone: &str) -> String {
    let mut decoded = String::with_capacity(zone.len());
    let mut pos = 0;
    for param in QUERY_PARAMETER.find_iter(zone) {
        decoded.push_str(&decode_entities(&zone[pos..param.start()]));
        decoded.push_str(param.as_str());
        pos = param.end();
    }
    decoded.push_str(&decode_entities(&zone[pos..]));
    decoded
}

/// Decodes character references repeatedly so nested encodings such as
/// `&#38;#60;` collapse all the way to `<`.
pub fn decode_entities(text: &str) -> String {
    let mut text = text.to_owned();
    if !text.contains('&') {
        return text;
    }
    for _ in 0..MAX_DECODE_ROUNDS {
        let bare = decode_bare_named(&text).unwrap_or_else(|| text.clone());
        let terminated = terminate_bare_numeric(&bare).unwrap_or(bare);
        let next = decode_references(&terminated);
        if next == text {
            break;
        }
        text = next;
    }
    text
}

/// Resolves one HTML5 named reference, `name` given without `&` and `;`.
fn lookup_named(name: &str) -> Option<String> {
    let reference = format!("&{name};");
    match html_escape::decode_html_entities(&reference) {
        // Every named reference expands to one or two code points; anything
        // longer is a legacy prefix like `&lt` decoded out of `&ltx;`.
        Cow::Owned(value) if value.chars().count() <= 2 => Some(value),
        _ => None,
    }
}

/// Decodes `&name` written without its semicolon, e.g. `&lt` or `&colon`.
///
/// Only runs of two or more letters that end the word count, and the
/// name is matched lowercased.
fn decode_bare_named(text: &str) -> Option<String> {
    splice(text, |from| {
        let mut search = from;
        loop {
            let amp = search + text[search..].find('&')?;
            let name_start = amp + 1;
            let len = text[name_start..].bytes().take_while(u8::is_ascii_alphabetic).count();
            let name_end = name_start + len;
            let terminated = text[name_end..].starts_with(';');
            if len >= 2 && !terminated {
                let name = text[name_start..name_end].to_ascii_lowercase();
                if let Some(value) = lookup_named(&name) {
                    return Some((amp, name_end, value));
                }
            }
            search = name_start;
        }
    })
}

/// Appends the missing `;` to numeric references like `&#106` or `&#x6A`.
fn terminate_bare_numeric(text: &str) -> Option<String> {
    splice(text, |from| {
        let mut search = from;
        loop {
            let amp = search + text[search..].find("&#")?;
            let body = amp + 2;
            let bytes = text.as_bytes();
            let hex = matches!(bytes.get(body), Some(b'x' | b'X'));
            let (digits_start, max_significant): (usize, usize) = if hex { (body + 1, 5) } else { (body, 4) };
            let run = text[digits_start..]
                .bytes()
                .take_while(|b| if hex { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
                .count();
            let digits = &text[digits_start..digits_start + run];
            let significant = digits.trim_start_matches('0').len();
            let end = digits_start + run;
            if run >= 2 && significant <= max_significant && bytes.get(end) != Some(&b';') {
                return Some((amp, end, format!("{};", &text[amp..end])));
            }
            search = body;
        }
    })
}

/// One left-to-right pass of standard reference decoding.
fn decode_references(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        match decode_reference_at(candidate) {
            Some((value, consumed)) => {
                out.push_str(&value);
                rest = &candidate[consumed..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decodes the reference `candidate` starts with, returning the text and
/// the number of bytes consumed.
fn decode_reference_at(candidate: &str) -> Option<(String, usize)> {
    let body = &candidate[1..];
    if let Some(numeric) = body.strip_prefix('#') {
        let (radix, digits) = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => (16, hex),
            None => (10, numeric),
        };
        let len = digits.bytes().take_while(|b| (*b as char).is_digit(radix)).count();
        if len == 0 || digits.as_bytes().get(len) != Some(&b';') {
            return None;
        }
        let significant = digits[..len].trim_start_matches('0');
        let code = if significant.is_empty() {
            0
        } else {
            u32::from_str_radix(significant, radix).ok()?
        };
        if !numeric_allowed(code) {
            return None;
        }
        let consumed = candidate.len() - digits.len() + len + 1;
        return char::from_u32(code).map(|c| (c.to_string(), consumed));
    }
    let len = body.bytes().take_while(u8::is_ascii_alphanumeric).count();
    if len == 0 || body.as_bytes().get(len) != Some(&b';') {
        return None;
    }
    let value = lookup_named(&body[..len])?;
    // Single quotes stay encoded so quoted attribute values keep their shape.
    if value == "'" {
        return None;
    }
    Some((value, len + 2))
}

/// Code points a browser accepts from a numeric reference. CR decodes so
/// that `jav&#13;ascript:` is seen as the split keyword it is.
fn numeric_allowed(code: u32) -> bool {
    if code == u32::from(b'\'') {
        return false;
    }
    matches!(code, 0x20..=0x7E | 0x09 | 0x0A | 0x0C | 0x0D | 0xA0..=0xD7FF)
        || ((0xE000..=0x0010_FFFF).contains(&code) && (code & 0xFFFF) < 0xFFFE && !(0xFDD0..=0xFDEF).contains(&code))
}
