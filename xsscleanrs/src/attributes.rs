use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

#[cfg(feature = "smallvec")]
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::text::{is_space, splice};

#[cfg(feature = "smallvec")]
type AttributeList<'a> = SmallVec<[&'a str; 4]>;
#[cfg(not(feature = "smallvec"))]
type AttributeList<'a> = Vec<&'a str>;

/// Tags whose markup is escaped outright.
pub const DEFAULT_NAUGHTY_TAGS: &[&str] = &[
    "alert", "area", "prompt", "confirm", "applet", "audio", "basefont", "base", "behavior", "bgsound",
    "blink", "body", "embed", "expression", "form", "frameset", "frame", "head", "html", "ilayer",
    "iframe", "input", "button", "select", "isindex", "layer", "link", "meta", "keygen", "object",
    "plaintext", "style", "script", "textarea", "title", "math", "video", "svg", "xml", "xss",
];

/// Attribute-name patterns that are always stripped. Each must match the
/// whole name, case-insensitively; `on\w*` anchors at the name start so
/// `prefixOnAttribute` is left alone.
pub const DEFAULT_EVIL_ATTRIBUTES: &[&str] = &[
    r"on\w*", "style", "xmlns", "formaction", "form", "xlink:href", "FSCommand", "seekSegmentTime",
];

#[allow(clippy::expect_used)]
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?is)<(",
        // tag start and name; anything else runs to the end of the text
        r"(?P<slash>/*(?-u:\s)*)(?:(?P<tag>[a-z0-9]+)|.+)",
        // a valid attribute character right after the name is a separator
        r#"[^\t\n\x0B\x0C\r "'a-z0-9>/=]*"#,
        r#"(?P<attributes>(?:[\t\n\x0B\x0C\r "'/=]*"#,
        r#"[^\t\n\x0B\x0C\r "'>/=]+"#,
        // optional value: unquoted, double, single or empty
        r#"(?:(?-u:\s)*=(?:[^\t\n\x0B\x0C\r "'=><`]+|(?-u:\s)*"[^"]*"|(?-u:\s)*'[^']*'|(?-u:\s)*[^\t\n\x0B\x0C\r "'=><`]*?))?"#,
        r")*)",
        r"[^>]*)(?P<close>>)?",
    ))
    .expect("built-in tag pattern")
});

#[allow(clippy::expect_used)]
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?i)(?P<name>[^\t\n\x0B\x0C\r "'>/=]+)"#,
        r#"(?-u:\s)*=(?P<value>[^\t\n\x0B\x0C\r "'=><`]+|(?-u:\s)*"[^"]*"|(?-u:\s)*'[^']*'|(?-u:\s)*[^\t\n\x0B\x0C\r "'=><`]*?)"#,
    ))
    .expect("built-in attribute pattern")
});

/// Characters trimmed before deciding a value is empty.
const VALUE_TRIM: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

/// Rewrite rounds per pass. A rebuilt tag is stable after one more round.
const MAX_ROUNDS: usize = 8;

/// Rewrites every tag-like construct: unclosed ones are escaped, naughty
/// tags are escaped whole, and other tags are rebuilt with each evil
/// attribute swapped for the attribute marker.
#[derive(Debug, Clone)]
pub(crate) struct MarkupFilter {
    naughty_tags: HashSet<String>,
    evil_attribute: Regex,
    attribute_marker: String,
}

impl MarkupFilter {
    pub(crate) fn new<T, A>(naughty_tags: T, evil_attributes: A, attribute_marker: String) -> Result<Self>
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        let naughty_tags = naughty_tags
            .into_iter()
            .map(|tag| tag.as_ref().to_ascii_lowercase())
            .collect();
        let alternatives: Vec<String> = evil_attributes
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                // Compile each fragment alone so a bad one is reported by name.
                Regex::new(pattern).map_err(|source| Error::InvalidPattern {
                    pattern: pattern.to_owned(),
                    source,
                })?;
                Ok(format!("(?:{pattern})"))
            })
            .collect::<Result<_>>()?;
        let joined = if alternatives.is_empty() {
            // Matches no attribute name: names are never empty.
            String::from("(?i)^$")
        } else {
            format!("(?i)^(?:{})$", alternatives.join("|"))
        };
        let evil_attribute = Regex::new(&joined).map_err(|source| Error::InvalidPattern {
            pattern: joined.clone(),
            source,
        })?;
        Ok(Self {
            naughty_tags,
            evil_attribute,
            attribute_marker,
        })
    }

    /// Applies the rewrite until the text stops changing.
    pub(crate) fn sanitize(&self, text: &mut String) -> bool {
        let mut changed = false;
        for _ in 0..MAX_ROUNDS {
            match self.rewrite_round(text) {
                Some(next) if next != *text => {
                    *text = next;
                    changed = true;
                }
                _ => break,
            }
        }
        changed
    }

    /// One left-to-right rewrite. An opener that never closes only has its
    /// own `<` escaped, and the scan picks up right after it.
    fn rewrite_round(&self, source: &str) -> Option<String> {
        let last_close = source.rfind('>');
        splice(source, |from| {
            let open = from + source[from..].find('<')?;
            let after = open + 1;
            if after >= source.len() {
                return None;
            }
            let escape = Some((open, after, String::from("&lt;")));
            if !names_tag(&source[after..]) || last_close.map_or(true, |close| close < after) {
                return escape;
            }
            let Some(found) = TAG.find_at(source, open) else {
                return escape;
            };
            if found.start() != open || !found.as_str().ends_with('>') {
                return escape;
            }
            // The closed match is the same one found in the text cut at its end.
            let Some(caps) = TAG.captures_at(&source[..found.end()], open) else {
                return escape;
            };
            Some((open, found.end(), self.rewrite_tag(&caps)))
        })
    }

    fn is_naughty(&self, tag: &str) -> bool {
        self.naughty_tags.contains(&tag.to_ascii_lowercase())
    }

    fn rewrite_tag(&self, caps: &Captures<'_>) -> String {
        let inner = caps.get(1).map_or("", |m| m.as_str());
        if caps.name("close").is_none() {
            return format!("&lt;{inner}");
        }
        let tag = caps.name("tag").map_or("", |m| m.as_str());
        if self.is_naughty(tag) {
            return format!("&lt;{inner}&gt;");
        }
        let slash = caps.name("slash").map_or("", |m| m.as_str());
        let attributes = self.filter_attributes(caps.name("attributes").map_or("", |m| m.as_str()));

        let mut out = String::with_capacity(inner.len() + 2);
        out.push('<');
        out.push_str(slash);
        out.push_str(tag);
        for attribute in &attributes {
            out.push(' ');
            out.push_str(attribute);
        }
        out.push('>');
        out
    }

    /// Walks the attribute run one `name=value` pair at a time. Anything
    /// that does not parse as a pair is dropped.
    fn filter_attributes<'a>(&'a self, mut rest: &'a str) -> AttributeList<'a> {
        let mut kept = AttributeList::new();
        loop {
            // Browsers mis-parse junk before an attribute name; drop it.
            rest = rest.trim_start_matches(|c: char| !c.is_ascii_alphabetic());
            let Some(attribute) = ATTRIBUTE.captures(rest) else {
                break;
            };
            let Some(whole) = attribute.get(0) else {
                break;
            };
            let name = attribute.name("name").map_or("", |m| m.as_str());
            let value = attribute.name("value").map_or("", |m| m.as_str());
            if self.evil_attribute.is_match(name) || value.trim_matches(VALUE_TRIM).is_empty() {
                kept.push(self.attribute_marker.as_str());
            } else {
                kept.push(whole.as_str());
            }
            rest = &rest[whole.end()..];
            if rest.is_empty() {
                break;
            }
        }
        kept
    }
}

/// Whether the text after a `<` opens a named tag, slashes and
/// whitespace allowed in between.
fn names_tag(rest: &str) -> bool {
    rest.trim_start_matches('/')
        .trim_start_matches(is_space)
        .starts_with(|c: char| c.is_ascii_alphanumeric())
}
