// src/version/mod.rs

//! Pack version triples
//!
//! Bedrock manifests and world configs carry versions as `[major, minor,
//! patch]` integer arrays. The triple is total-ordered lexicographically;
//! the zero triple means "unspecified" where the field is optional.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A three-component pack version
///
/// Components are decoded as signed integers so that negative values reach
/// the validator (which rejects them with a named field) instead of failing
/// opaquely at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackVersion(pub [i32; 3]);

impl PackVersion {
    /// The "unspecified" version
    pub const ZERO: PackVersion = PackVersion([0, 0, 0]);

    pub fn new(major: i32, minor: i32, patch: i32) -> Self {
        PackVersion([major, minor, patch])
    }

    /// True when every component is non-negative
    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|v| *v >= 0)
    }

    /// True for the zero triple
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Index of the first negative component, if any
    pub fn first_negative(&self) -> Option<usize> {
        self.0.iter().position(|v| *v < 0)
    }
}

impl fmt::Display for PackVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0[0], self.0[1], self.0[2])
    }
}

impl From<[i32; 3]> for PackVersion {
    fn from(v: [i32; 3]) -> Self {
        PackVersion(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_lexicographic() {
        assert!(PackVersion::new(1, 0, 0) < PackVersion::new(1, 0, 1));
        assert!(PackVersion::new(1, 2, 0) < PackVersion::new(2, 0, 0));
        assert!(PackVersion::new(0, 9, 9) < PackVersion::new(1, 0, 0));
        assert_eq!(PackVersion::new(1, 2, 3), PackVersion::new(1, 2, 3));
    }

    #[test]
    fn test_validity() {
        assert!(PackVersion::new(0, 0, 0).is_valid());
        assert!(PackVersion::new(1, 2, 3).is_valid());
        assert!(!PackVersion::new(-1, 0, 0).is_valid());
        assert_eq!(PackVersion::new(0, -2, 0).first_negative(), Some(1));
    }

    #[test]
    fn test_zero_means_unspecified() {
        assert!(PackVersion::ZERO.is_zero());
        assert!(!PackVersion::new(0, 0, 1).is_zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(PackVersion::new(1, 20, 4).to_string(), "1.20.4");
    }

    #[test]
    fn test_serde_round_trip() {
        let v: PackVersion = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(v, PackVersion::new(1, 2, 3));
        assert_eq!(serde_json::to_string(&v).unwrap(), "[1,2,3]");

        // Negative components decode; validation happens later
        let v: PackVersion = serde_json::from_str("[-1, 0, 0]").unwrap();
        assert!(!v.is_valid());
    }
}
