use tracing::{debug, trace};

use crate::attributes::{MarkupFilter, DEFAULT_EVIL_ATTRIBUTES, DEFAULT_NAUGHTY_TAGS};
use crate::error::{Error, Result};
use crate::value::Sanitize;
use crate::{escape, normalize, protocol, structural};

/// Marker substituted for removed content and schemes.
pub const DEFAULT_REMOVED_MARKER: &str = "[removed]";
/// Marker substituted for each stripped attribute.
pub const DEFAULT_ATTRIBUTE_MARKER: &str = "xss=removed";
/// Whole-pipeline passes attempted before settling for the last output.
pub const DEFAULT_MAX_PASSES: usize = 5;

/// The sanitization engine.
///
/// An engine holds a fixed policy (naughty tags, evil attributes, markers,
/// pass cap) and is immutable once built, so one instance can be shared
/// freely across threads.
///
/// # Examples
///
/// ```
/// use xsscleanrs::Security;
///
/// let security = Security::default();
/// assert_eq!(
///     security.clean_str("<foo onclick=\"go()\">hi</foo>"),
///     "<foo xss=removed>hi</foo>"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Security {
    markup: MarkupFilter,
    removed_marker: String,
    max_passes: usize,
}

impl Default for Security {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        SecurityBuilder::default()
            .build()
            .expect("built-in policy is valid")
    }
}

impl Security {
    /// Starts a custom policy from the defaults.
    pub fn builder() -> SecurityBuilder {
        SecurityBuilder::default()
    }

    /// Sanitizes a text value or every text leaf of a composite value.
    pub fn clean<T: Sanitize>(&self, value: T) -> T {
        value.sanitize(self)
    }

    /// Decodes `input` once, then runs the filters over it until their
    /// output stops changing or the pass cap is reached, in which case the
    /// last output is returned.
    pub fn clean_str(&self, input: &str) -> String {
        let mut current = normalize_input(input);
        for pass in 1..=self.max_passes {
            let next = self.filter(&current, false);
            trace!(pass, before = current.len(), after = next.len(), "sanitize pass");
            if next == current {
                return current;
            }
            current = next;
        }
        debug!(max_passes = self.max_passes, "pass cap reached before a fixed point");
        current
    }

    /// Checks uploaded file content for XSS vectors.
    ///
    /// Returns `true` when one filter pass over the decoded content finds
    /// nothing to remove. Only the `<?php` opener is treated as a
    /// processing instruction here, so ordinary binary content is not
    /// flagged for containing `<?`.
    pub fn is_image_safe(&self, content: &[u8]) -> bool {
        let normalized = normalize_input(&String::from_utf8_lossy(content));
        self.filter(&normalized, true) == normalized
    }

    fn filter(&self, input: &str, image: bool) -> String {
        let mut text = input.to_owned();
        protocol::remove_never_allowed(&mut text, &self.removed_marker);
        structural::escape_processing_instructions(&mut text, image);
        structural::compact_exploded_words(&mut text);
        structural::remove_script_elements(&mut text, &self.removed_marker);
        self.markup.sanitize(&mut text);
        escape::neutralize_calls(&mut text);
        protocol::remove_never_allowed(&mut text, &self.removed_marker);
        text
    }
}

/// Undoes control-character, percent and character-reference obfuscation
/// so the filters see what a browser would.
fn normalize_input(input: &str) -> String {
    let text = normalize::remove_invisible(input, true);
    let mut text = normalize::percent_decode(text);
    normalize::escape_quoted_attributes(&mut text);
    normalize::decode_markup_entities(&mut text);
    normalize::remove_invisible(&text, true).replace('\t', " ")
}

/// Builder for a [`Security`] engine with a non-default policy.
///
/// ```
/// use xsscleanrs::Security;
///
/// let security = Security::builder()
///     .naughty_tags(["marquee"])
///     .attribute_marker("data-stripped=1")
///     .build()
///     .unwrap();
/// assert_eq!(security.clean_str("<marquee>x"), "&lt;marquee&gt;x");
/// assert_eq!(security.clean_str("<b onclick=x>"), "<b data-stripped=1>");
/// ```
#[derive(Debug, Clone)]
pub struct SecurityBuilder {
    naughty_tags: Vec<String>,
    evil_attributes: Vec<String>,
    removed_marker: String,
    attribute_marker: String,
    max_passes: usize,
}

impl Default for SecurityBuilder {
    fn default() -> Self {
        Self {
            naughty_tags: DEFAULT_NAUGHTY_TAGS.iter().map(|t| (*t).to_owned()).collect(),
            evil_attributes: DEFAULT_EVIL_ATTRIBUTES.iter().map(|a| (*a).to_owned()).collect(),
            removed_marker: DEFAULT_REMOVED_MARKER.to_owned(),
            attribute_marker: DEFAULT_ATTRIBUTE_MARKER.to_owned(),
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

impl SecurityBuilder {
    /// Replaces the tags whose markup is escaped outright.
    pub fn naughty_tags<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.naughty_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the evil attribute-name patterns. Each is a regex fragment
    /// matched against the whole name, case-insensitively.
    pub fn evil_attributes<I>(mut self, patterns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.evil_attributes = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn removed_marker(mut self, marker: impl Into<String>) -> Self {
        self.removed_marker = marker.into();
        self
    }

    pub fn attribute_marker(mut self, marker: impl Into<String>) -> Self {
        self.attribute_marker = marker.into();
        self
    }

    /// Caps the number of whole-pipeline passes. `1` runs a single pass.
    pub fn max_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes;
        self
    }

    pub fn build(self) -> Result<Security> {
        if self.max_passes == 0 {
            return Err(Error::InvalidConfig("max_passes must be at least 1"));
        }
        if self.removed_marker.is_empty() {
            return Err(Error::InvalidConfig("removed marker must not be empty"));
        }
        if self.attribute_marker.is_empty() {
            return Err(Error::InvalidConfig("attribute marker must not be empty"));
        }
        if self.removed_marker.contains(['<', '>']) || self.attribute_marker.contains(['<', '>']) {
            return Err(Error::InvalidConfig("markers must not contain angle brackets"));
        }
        let markup = MarkupFilter::new(&self.naughty_tags, &self.evil_attributes, self.attribute_marker)?;
        Ok(Security {
            markup,
            removed_marker: self.removed_marker,
            max_passes: self.max_passes,
        })
    }
}
