//! Host application version: a total-ordered `(major, minor, patch)` triple and
//! the range predicate used by `Targeting::VersionInRange`.

use crate::errors::CoreError;
use alloc::string::{String, ToString};
use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version { major, minor, patch }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let (Some(maj), Some(min), Some(pat), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CoreError::InvalidVersion);
        };
        let major = maj.parse().map_err(|_| CoreError::InvalidVersion)?;
        let minor = min.parse().map_err(|_| CoreError::InvalidVersion)?;
        let patch = pat.parse().map_err(|_| CoreError::InvalidVersion)?;
        Ok(Version { major, minor, patch })
    }
}

impl TryFrom<String> for Version {
    type Error = CoreError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Version> for String {
    fn from(v: Version) -> String {
        v.to_string()
    }
}

/// A version range used to gate a rule by host app version.
///
/// Both bounds are **inclusive** where present (resolved ambiguity: a
/// half-open range would silently exclude a pinned edge version from a
/// targeting rule written to include it).
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VersionRange {
    Unbounded,
    LeftBound { min: Version },
    RightBound { max: Version },
    FullyBound { min: Version, max: Version },
}

impl VersionRange {
    pub fn contains(&self, v: &Version) -> bool {
        match self {
            VersionRange::Unbounded => true,
            VersionRange::LeftBound { min } => v >= min,
            VersionRange::RightBound { max } => v <= max,
            VersionRange::FullyBound { min, max } => v >= min && v <= max,
        }
    }
}
