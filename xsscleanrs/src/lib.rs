#![doc = include_str!("../README.md")]
//!
//! ## API Guide
//!
//! Most applications only need the crate-level functions:
//!
//! - [`clean`] - Sanitize a string or every string inside a composite value
//! - [`version`] - Library version information
//!
//! A [`Security`] engine built through [`Security::builder`] carries a
//! custom policy (naughty tags, evil attributes, markers, pass cap) and
//! additionally exposes [`Security::is_image_safe`] for uploaded content.
//!
//! [`decode_entities`] is the character-reference decoder the engine runs
//! internally, exposed for callers that need to compare decoded text.

use std::sync::LazyLock;

mod attributes;
mod error;
mod escape;
mod normalize;
mod protocol;
mod security;
mod structural;
mod text;
mod value;

#[cfg(test)]
mod tests;

pub use attributes::{DEFAULT_EVIL_ATTRIBUTES, DEFAULT_NAUGHTY_TAGS};
pub use error::{Error, Result};
pub use normalize::decode_entities;
pub use security::{
    Security, SecurityBuilder, DEFAULT_ATTRIBUTE_MARKER, DEFAULT_MAX_PASSES, DEFAULT_REMOVED_MARKER,
};
pub use value::Sanitize;

static DEFAULT_ENGINE: LazyLock<Security> = LazyLock::new(Security::default);

/// Sanitizes untrusted text with the default policy.
///
/// Strings are cleaned; sequences, maps and options are rebuilt with every
/// string inside them cleaned, keeping their shape and keys.
///
/// # Examples
///
/// ```
/// use xsscleanrs::clean;
///
/// assert_eq!(clean(String::from("Hello, World!")), "Hello, World!");
/// assert_eq!(
///     clean(String::from("<script>alert('Hack');</script>")),
///     "[removed]alert&#40;'Hack'&#41;;[removed]"
/// );
///
/// let items = clean(vec![String::from("test"), String::from("<xss>")]);
/// assert_eq!(items, ["test", "[removed]"]);
/// ```
pub fn clean<T: Sanitize>(value: T) -> T {
    DEFAULT_ENGINE.clean(value)
}

/// Returns the version of the library.
///
/// # Examples
///
/// ```
/// use xsscleanrs::version;
///
/// println!("xsscleanrs version: {}", version());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
