use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::text::{is_space, replace_all_in, replace_literals_in, splice};

/// Keywords that get re-joined when split by whitespace (`j a v a s c r i p t`).
pub(crate) const EXPLODED_WORDS: &[&str] = &[
    "javascript", "expression", "vbscript", "jscript", "wscript",
    "vbs", "script", "base64", "applet", "alert", "document",
    "write", "cookie", "window", "confirm", "prompt", "eval",
];

/// Rounds of anchor, image and script removal per pass.
const MAX_ROUNDS: usize = 8;

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in structural pattern")
}

static EXPLODED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    EXPLODED_WORDS
        .iter()
        .map(|word| {
            let spaced = word
                .chars()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(r"(?-u:\s)*");
            compile(&format!(r"(?is)({spaced})([^A-Za-z0-9_])"))
        })
        .collect()
});

static PHP_OPEN: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)<\?(php)"));
static ANCHOR_PROBE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)<a"));
static IMG_PROBE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)<img"));
static SCRIPT_PROBE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)script|xss"));
static ANCHOR_TAG: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?is)<a(?:rea)?[^a-z0-9>]+([^>]*?)(?:>|\z)"));
static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?is)<img[^a-z0-9]+([^>]*?)(?:(?-u:\s)?/?>|\z)"));
static SCRIPT_TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"(?is)</*(?:script|xss).*?>"));
static UNSAFE_HREF: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?is)href=.*?(?:(?:alert|prompt|confirm)(?:\(|&#40;|`|&#96;)|javascript:|livescript:|mocha:|charset=|window\.|\(?document\)?\.|\.cookie|<script|<xss|d(?-u:\s)*a(?-u:\s)*t(?-u:\s)*a(?-u:\s)*:)",
    )
});
static UNSAFE_SRC: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?is)src=.*?(?:(?:alert|prompt|confirm|eval)(?:\(|&#40;|`|&#96;)|javascript:|livescript:|mocha:|charset=|window\.|\(?document\)?\.|\.cookie|<script|<xss|base64(?-u:\s)*,)",
    )
});
static QUOTED_PAIR: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?is)(?-u:\s)*[a-z\-:]+(?-u:\s)*=(?-u:\s)*(?:".*?"|'.*?')"#));
static INLINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| compile(r"(?s)/\*.*?\*/"));

/// Escapes processing-instruction brackets. For image content only the
/// `<?php` opener is touched, so binary data is not rewritten.
pub(crate) fn escape_processing_instructions(text: &mut String, image: bool) -> bool {
    if image {
        replace_all_in(&PHP_OPEN, text, "&lt;?$1")
    } else {
        replace_literals_in(text, &[("<?", "&lt;?"), ("?>", "?&gt;")])
    }
}

/// Re-joins keywords split by whitespace when followed by a non-word
/// character, so `dealer to` stays intact but `a l e r t (` does not.
pub(crate) fn compact_exploded_words(text: &mut String) -> bool {
    let mut changed = false;
    for pattern in EXPLODED.iter() {
        changed |= replace_all_in(pattern, text, |caps: &Captures<'_>| {
            let word: String = caps[1].chars().filter(|c| !is_space(*c)).collect();
            format!("{word}{}", &caps[2])
        });
    }
    changed
}

/// Strips script-bearing `href` values from anchors and `src` values from
/// images, then replaces every `<script…>`/`<xss…>` opening or closing run
/// with `marker`. Repeats, up to a fixed number of rounds, while a removal
/// exposes another.
pub(crate) fn remove_script_elements(text: &mut String, marker: &str) -> bool {
    let mut changed = false;
    for _ in 0..MAX_ROUNDS {
        let mut round_changed = false;
        if ANCHOR_PROBE.is_match(text) {
            round_changed |= rewrite_tags(text, &ANCHOR_TAG, |attributes| {
                UNSAFE_HREF.replace_all(&quoted_attributes(attributes), "").into_owned()
            });
        }
        if IMG_PROBE.is_match(text) {
            round_changed |= rewrite_tags(text, &IMG_TAG, |attributes| {
                QUOTED_PAIR
                    .replace_all(attributes, |pair: &Captures<'_>| {
                        if UNSAFE_SRC.is_match(&pair[0]) {
                            String::new()
                        } else {
                            pair[0].to_owned()
                        }
                    })
                    .into_owned()
            });
        }
        if SCRIPT_PROBE.is_match(text) {
            round_changed |= replace_all_in(&SCRIPT_TAG, text, marker);
        }
        changed |= round_changed;
        if !round_changed {
            break;
        }
    }
    changed
}

/// Replaces the attribute run of each tag matched by `tag` with what
/// `filter` makes of it.
fn rewrite_tags<F>(text: &mut String, tag: &Regex, filter: F) -> bool
where
    F: Fn(&str) -> String,
{
    let source = text.as_str();
    let rewritten = splice(source, |from| {
        let caps = tag.captures_at(source, from)?;
        let whole = caps.get(0)?;
        let run = caps.get(1)?;
        let mut attributes = run.as_str();
        // A bare end-of-text match stops short of one trailing newline.
        if whole.end() == source.len() && !whole.as_str().ends_with('>') {
            attributes = attributes.strip_suffix('\n').unwrap_or(attributes);
        }
        if attributes.is_empty() {
            return Some((whole.start(), whole.end(), whole.as_str().to_owned()));
        }
        let attributes_end = run.start() + attributes.len();
        let mut replacement = String::with_capacity(whole.len());
        replacement.push_str(&source[whole.start()..run.start()]);
        replacement.push_str(&filter(attributes));
        replacement.push_str(&source[attributes_end..whole.end()]);
        Some((whole.start(), whole.end(), replacement))
    });
    match rewritten {
        Some(next) if next != *text => {
            *text = next;
            true
        }
        _ => false,
    }
}

/// Keeps only well-formed quoted `name="value"` pairs, minus `/* */` comments.
/// Namespaced names such as `xlink:href` are kept whole.
/// Anchors are rebuilt from these alone; unquoted attributes are dropped.
fn quoted_attributes(attributes: &str) -> String {
    QUOTED_PAIR
        .find_iter(attributes)
        .map(|pair| INLINE_COMMENT.replace_all(pair.as_str(), "").into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script_pass(input: &str) -> String {
        let mut text = input.to_owned();
        remove_script_elements(&mut text, "[removed]");
        text
    }

    #[test]
    fn test_exploded_keywords_are_compacted() {
        let mut text = String::from("j a v a s c r i p t :alert(1) and dealer to");
        assert!(compact_exploded_words(&mut text));
        assert_eq!(text, "javascript :alert(1) and dealer to");

        let mut plain = String::from("a l e r tx");
        assert!(!compact_exploded_words(&mut plain));
    }

    #[test]
    fn test_processing_instructions_are_escaped() {
        let mut text = String::from("<?php echo 1 ?>");
        assert!(escape_processing_instructions(&mut text, false));
        assert_eq!(text, "&lt;?php echo 1 ?&gt;");

        let mut image = String::from("<?PHP x ?>");
        assert!(escape_processing_instructions(&mut image, true));
        assert_eq!(image, "&lt;?PHP x ?>");
    }

    #[test]
    fn test_script_runs_become_markers() {
        assert_eq!(
            script_pass("a <script>alert('x');</script> b"),
            "a [removed]alert('x');[removed] b"
        );
        assert_eq!(script_pass("http://www.<script abc>x</script .com>"), "http://www.[removed]x[removed]");
        assert_eq!(script_pass("<xss>"), "[removed]");
        assert_eq!(script_pass("just a script word"), "just a script word");
    }

    #[test]
    fn test_anchor_hrefs_with_script_are_cut() {
        assert_eq!(script_pass(r#"<a href="javascript:alert(1)">x</a>"#), "<a >x</a>");
        assert_eq!(script_pass(r#"<a href="http://example.com/">x</a>"#), r#"<a href="http://example.com/">x</a>"#);
        assert_eq!(script_pass(r#"<a title="t" href=javascript:x>y"#), r#"<a title="t">y"#);
        assert_eq!(script_pass("<a>x</a>"), "<a>x</a>");
    }

    #[test]
    fn test_anchor_attributes_that_repeat_the_tag_name() {
        assert_eq!(script_pass("<area a>"), "<area >");
        assert_eq!(script_pass("<a a>x</a>"), "<a >x</a>");
        assert_eq!(script_pass(r#"<a title="a" href="b">a</a>"#), r#"<a title="a" href="b">a</a>"#);
    }

    #[test]
    fn test_namespaced_pairs_keep_their_name() {
        assert_eq!(
            script_pass(r#"<a xlink:href = "http://x/">y</a>"#),
            r#"<a xlink:href = "http://x/">y</a>"#
        );
        assert_eq!(script_pass(r#"<a xlink:href="javascript:x">y</a>"#), "<a >y</a>");
    }

    #[test]
    fn test_image_sources_with_script_are_cut() {
        assert_eq!(script_pass(r#"<img src="x" alt="/*c*/y">"#), r#"<img src="x" alt="/*c*/y">"#);
        assert_eq!(script_pass(r#"<img alt="a" src="javascript:alert(1)">"#), r#"<img alt="a">"#);
        assert_eq!(script_pass(r#"<img/id="a" src='x.png?q=alert(1)'>"#), r#"<img/id="a">"#);
    }

    #[test]
    fn test_unquoted_image_attributes_are_left_for_the_markup_pass() {
        assert_eq!(script_pass("<img src=xxx:x onerror=go>"), "<img src=xxx:x onerror=go>");
        assert_eq!(script_pass("<img/src= id=confirm(1)"), "<img/src= id=confirm(1)");
    }
}
