//! Advertised RPC API versions and the compatibility gate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A semantic version advertised by a remote RPC server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SemVer {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SemVer {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

/// Check whether an advertised API version satisfies a required one.
///
/// The major versions must match and the advertised minor version must be at
/// least the required one. Patch is not compared.
pub fn semver_compatible(required: SemVer, actual: SemVer) -> bool {
    required.major == actual.major && actual.minor >= required.minor
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemVer {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(3, '.');
        let mut next = || -> Result<u32, TypesError> {
            parts
                .next()
                .ok_or_else(|| TypesError::Version(s.to_string()))?
                .parse()
                .map_err(|_| TypesError::Version(s.to_string()))
        };
        Ok(Self::new(next()?, next()?, next()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatibility_table() {
        let required = SemVer::new(5, 0, 0);
        let cases = [
            (SemVer::new(5, 0, 0), true),
            (SemVer::new(5, 1, 2), true),
            (SemVer::new(5, 0, 9), true),
            (SemVer::new(6, 0, 0), false),
            (SemVer::new(4, 9, 9), false),
        ];
        for (advertised, expected) in cases {
            assert_eq!(
                semver_compatible(required, advertised),
                expected,
                "required {required} advertised {advertised}"
            );
        }
    }

    #[test]
    fn lower_minor_is_incompatible() {
        assert!(!semver_compatible(SemVer::new(5, 2, 0), SemVer::new(5, 1, 7)));
    }

    #[test]
    fn parses_dotted_form() {
        assert_eq!("5.1.2".parse::<SemVer>().unwrap(), SemVer::new(5, 1, 2));
        assert!("5.1".parse::<SemVer>().is_err());
        assert!("a.b.c".parse::<SemVer>().is_err());
    }

    #[test]
    fn displays_dotted_form() {
        assert_eq!(SemVer::new(5, 0, 1).to_string(), "5.0.1");
    }
}
