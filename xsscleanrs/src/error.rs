use thiserror::Error;

/// Errors raised while building a custom [`Security`](crate::Security) engine.
///
/// Cleaning itself never fails: every input produces some output.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied evil-attribute pattern is not a valid regex.
    #[error("invalid attribute pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    /// A policy setting makes no sense (zero pass cap, empty marker, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;
