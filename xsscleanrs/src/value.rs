use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::{BuildHasher, Hash};

use crate::security::Security;

/// A value whose text can be sanitized.
///
/// Text leaves are run through [`Security::clean_str`]; containers are
/// rebuilt with every element sanitized in place and their shape, order
/// and keys unchanged. Map keys are never touched.
pub trait Sanitize: Sized {
    fn sanitize(self, security: &Security) -> Self;
}

impl Sanitize for String {
    fn sanitize(self, security: &Security) -> Self {
        security.clean_str(&self)
    }
}

impl Sanitize for Box<str> {
    fn sanitize(self, security: &Security) -> Self {
        security.clean_str(&self).into_boxed_str()
    }
}

impl Sanitize for Cow<'_, str> {
    /// Stays borrowed when the text is already clean.
    fn sanitize(self, security: &Security) -> Self {
        let cleaned = security.clean_str(&self);
        if cleaned == *self {
            self
        } else {
            Cow::Owned(cleaned)
        }
    }
}

impl<T: Sanitize> Sanitize for Option<T> {
    fn sanitize(self, security: &Security) -> Self {
        self.map(|value| value.sanitize(security))
    }
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn sanitize(self, security: &Security) -> Self {
        self.into_iter().map(|value| value.sanitize(security)).collect()
    }
}

impl<T: Sanitize> Sanitize for VecDeque<T> {
    fn sanitize(self, security: &Security) -> Self {
        self.into_iter().map(|value| value.sanitize(security)).collect()
    }
}

impl<K: Ord, V: Sanitize> Sanitize for BTreeMap<K, V> {
    fn sanitize(self, security: &Security) -> Self {
        self.into_iter()
            .map(|(key, value)| (key, value.sanitize(security)))
            .collect()
    }
}

impl<K, V, S> Sanitize for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: Sanitize,
    S: BuildHasher + Default,
{
    fn sanitize(self, security: &Security) -> Self {
        self.into_iter()
            .map(|(key, value)| (key, value.sanitize(security)))
            .collect()
    }
}

#[cfg(feature = "serde_json")]
impl Sanitize for serde_json::Value {
    /// Sanitizes string leaves; numbers, booleans, nulls and object keys
    /// pass through.
    fn sanitize(self, security: &Security) -> Self {
        use serde_json::Value;

        match self {
            Value::String(text) => Value::String(text.sanitize(security)),
            Value::Array(items) => Value::Array(items.sanitize(security)),
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, value.sanitize(security)))
                    .collect(),
            ),
            other => other,
        }
    }
}
