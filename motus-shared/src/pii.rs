use serde::{Deserialize, Serialize};
use std::fmt;

/// Wrapper for passenger contact data. Keeps the real value for storage and
/// API responses but masks everything except the last two characters in
/// Debug output, so `tracing::debug!("{:?}", booking)` never leaks a phone
/// number into logs.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Masked(pub String);

impl fmt::Debug for Masked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tail: String = self
            .0
            .chars()
            .rev()
            .take(2)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        write!(f, "***{}", tail)
    }
}

impl fmt::Display for Masked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Masked {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for Masked {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Masked {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
