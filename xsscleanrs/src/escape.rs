use std::sync::LazyLock;

use regex::Regex;

use crate::text::replace_all_in;

const CALLABLES: &str =
    "alert|prompt|confirm|cmd|passthru|eval|exec|expression|system|fopen|fsockopen|file|file_get_contents|readfile|unlink";

#[allow(clippy::expect_used)]
static PAREN_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?is)({CALLABLES})((?-u:\s)*)\((.*?)\)")).expect("built-in call pattern")
});

#[allow(clippy::expect_used)]
static BACKTICK_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?is)({CALLABLES})((?-u:\s)*)`(.*?)`")).expect("built-in call pattern")
});

/// Encodes the call delimiters of script-ish functions, so `alert(1)`
/// reads `alert&#40;1&#41;` and can no longer execute.
pub(crate) fn neutralize_calls(text: &mut String) -> bool {
    let parens = replace_all_in(&PAREN_CALL, text, "${1}${2}&#40;${3}&#41;");
    let backticks = replace_all_in(&BACKTICK_CALL, text, "${1}${2}&#96;${3}&#96;");
    parens || backticks
}
