//! Sensitive data marker for automatic redaction
//!
//! The fragment-cache signing secret is loaded from configuration and must
//! never show up in a log line or a `Debug` dump of the config.

use serde::{Deserialize, Deserializer};
use std::fmt;

const REDACTED: &str = "***REDACTED***";

/// Wrapper for sensitive data that redacts itself in Debug and Display
///
/// # Example
///
/// ```
/// use folio_core_types::Sensitive;
///
/// let secret = Sensitive::new("fragment-signing-key");
/// assert_eq!(format!("{:?}", secret), "***REDACTED***");
/// assert_eq!(secret.expose(), &"fragment-signing-key");
/// ```
#[derive(Clone, Default)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying value; only at the point of use
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T: PartialEq> Sensitive<T> {
    /// Compare without exposing the value
    pub fn is(&self, other: &T) -> bool {
        self.0 == *other
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sensitive<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Sensitive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_debug_and_display_redact() {
        let secret = Sensitive::new("s3cr3t");
        assert_eq!(format!("{:?}", secret), "***REDACTED***");
        assert_eq!(format!("{}", secret), "***REDACTED***");
    }

    #[test]
    fn test_sensitive_deserializes_inner_value() {
        #[derive(Debug, serde::Deserialize)]
        struct Cfg {
            secret: Sensitive<String>,
        }

        let cfg: Cfg = serde_yaml::from_str("secret: hunter2").unwrap();
        assert_eq!(cfg.secret.expose(), "hunter2");
        assert!(!format!("{:?}", cfg).contains("hunter2"));
    }

    #[test]
    fn test_default_is_empty_and_comparable() {
        let secret: Sensitive<String> = Sensitive::default();
        assert!(secret.is(&String::new()));
        assert_eq!(Sensitive::new(String::from("k")).into_inner(), "k");
    }
}
