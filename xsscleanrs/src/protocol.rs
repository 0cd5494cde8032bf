use std::sync::LazyLock;

use regex::Regex;

use crate::text::{replace_all_in, replace_literal_in, splice};

/// What a never-allowed literal is replaced with.
#[derive(Debug, Clone, Copy)]
enum Substitute {
    /// The engine's removal marker.
    Marker,
    Text(&'static str),
}

/// Literal fragments that are never allowed through, in replacement order.
const NEVER_ALLOWED_LITERALS: &[(&str, Substitute)] = &[
    ("document.cookie", Substitute::Marker),
    ("(document).cookie", Substitute::Marker),
    ("document.write", Substitute::Marker),
    ("(document).write", Substitute::Marker),
    (".parentNode", Substitute::Marker),
    (".innerHTML", Substitute::Marker),
    ("-moz-binding", Substitute::Marker),
    ("<!--", Substitute::Text("&lt;!--")),
    ("-->", Substitute::Text("--&gt;")),
    ("<![CDATA[", Substitute::Text("&lt;![CDATA[")),
    ("<comment>", Substitute::Text("&lt;comment&gt;")),
    ("<%", Substitute::Text("&lt;&#37;")),
];

/// Scheme and script-access patterns, matched case-insensitively.
const NEVER_ALLOWED_PATTERNS: &[&str] = &[
    r"javascript(?-u:\s)*:",
    r"(?:\(?document\)?|\(?window\)?(?:\.document)?)\.(?:location|on[a-z0-9_]*)",
    r"expression(?-u:\s)*(?:\(|&#40;)",
    r"vbscript(?-u:\s)*:",
    r"wscript(?-u:\s)*:",
    r"jscript(?-u:\s)*:",
    r"vbs(?-u:\s)*:",
    r"Redirect(?-u:\s)+30[0-9]",
];

#[allow(clippy::expect_used)]
static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    NEVER_ALLOWED_PATTERNS
        .iter()
        .map(|p| Regex::new(&format!("(?is){p}")).expect("built-in protocol pattern"))
        .collect()
});

// A base64 `data:` payload, optionally opened by a quote. The closing
// quote, when it directly follows, is consumed separately.
#[allow(clippy::expect_used)]
static DATA_BASE64: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)(["'])?data(?-u:\s)*:.*?base64.*?,"#).expect("built-in data pattern"));

/// Neutralizes fragments that must never survive, wherever they appear:
/// executable schemes, script access to the document, comment and CDATA
/// openers. Matching schemes are replaced by `marker`; what follows the
/// scheme is kept so later filters still see it.
pub(crate) fn remove_never_allowed(text: &mut String, marker: &str) -> bool {
    let mut changed = false;
    for (literal, substitute) in NEVER_ALLOWED_LITERALS {
        let to = match substitute {
            Substitute::Marker => marker,
            Substitute::Text(t) => t,
        };
        changed |= replace_literal_in(text, literal, to);
    }
    for pattern in PATTERNS.iter() {
        changed |= replace_all_in(pattern, text, marker);
    }
    if let Some(next) = remove_base64_data(text, marker) {
        *text = next;
        changed = true;
    }
    changed
}

fn remove_base64_data(text: &str, marker: &str) -> Option<String> {
    splice(text, |from| {
        let caps = DATA_BASE64.captures_at(text, from)?;
        let whole = caps.get(0)?;
        let mut end = whole.end();
        if let Some(quote) = caps.get(1) {
            if text[end..].starts_with(quote.as_str()) {
                end += 1;
            }
        }
        Some((whole.start(), end, marker.to_owned()))
    })
}
