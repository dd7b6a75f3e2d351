//! Label keys and values admitted into the registry.
//!
//! Keys are a closed enum, so no metric can grow a label that was not
//! declared here. Values are cleaned at the boundary: control characters
//! are dropped and the result is cut to [`MAX_LABEL_VALUE_LEN`] characters.

use std::collections::BTreeMap;
use std::fmt;

pub const MAX_LABEL_VALUE_LEN: usize = 64;

/// Stand-in for empty label values.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LabelKey {
    // HTTP
    Method,
    Route,
    StatusCode,
    ErrorClass,
    // Orders
    Category,
    Currency,
    Reason,
    // Users
    SignupMethod,
    UserType,
    // Client-reported metrics
    Client,
    Vital,
    Rating,
    // Data store
    Operation,
    Collection,
}

impl LabelKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelKey::Method => "method",
            LabelKey::Route => "route",
            LabelKey::StatusCode => "status_code",
            LabelKey::ErrorClass => "error_class",
            LabelKey::Category => "category",
            LabelKey::Currency => "currency",
            LabelKey::Reason => "reason",
            LabelKey::SignupMethod => "signup_method",
            LabelKey::UserType => "user_type",
            LabelKey::Client => "client",
            LabelKey::Vital => "vital",
            LabelKey::Rating => "rating",
            LabelKey::Operation => "operation",
            LabelKey::Collection => "collection",
        }
    }
}

impl fmt::Display for LabelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered set of sanitized label pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    pairs: BTreeMap<LabelKey, String>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: LabelKey, value: impl AsRef<str>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: LabelKey, value: impl AsRef<str>) {
        self.pairs
            .insert(key, sanitize_label_value(value.as_ref()));
    }

    pub fn get(&self, key: LabelKey) -> Option<&str> {
        self.pairs.get(&key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LabelKey, &str)> {
        self.pairs.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Comma-separated key names, used in error messages.
    pub fn describe_keys(&self) -> String {
        describe_keys(self.pairs.keys().copied())
    }
}

pub(crate) fn describe_keys(keys: impl Iterator<Item = LabelKey>) -> String {
    keys.map(|k| k.as_str()).collect::<Vec<_>>().join(",")
}

/// Strip control characters, trim, and cut to [`MAX_LABEL_VALUE_LEN`] chars.
pub fn sanitize_label_value(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_LABEL_VALUE_LEN)
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        UNKNOWN.to_string()
    } else {
        trimmed.to_string()
    }
}
