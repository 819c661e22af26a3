//! Four-component application versions (`major.minor.build.revision`).
//!
//! Every pipeline step declares the oldest application version able to
//! interpret it. Versions are compared component-wise, persisted as their
//! dotted string form, and parsed leniently: missing trailing components are
//! treated as zero so `"19"` and `"19.0.0.0"` are the same version.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub revision: u32,
}

/// Oldest version that understands pipelines at all. Steps that don't
/// declare anything newer require this.
pub const PIPELINE_MIN_VERSION: Version = Version::new(10, 0, 0, 0);

/// Version of the running application, used for compatibility checks.
pub const APP_VERSION: Version = Version::new(20, 0, 0, 0);

impl Version {
    pub const fn new(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Shorthand for `major.0.0.0`.
    pub const fn major(major: u32) -> Self {
        Self::new(major, 0, 0, 0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("version string is empty".into());
        }

        let mut parts = [0u32; 4];
        let mut count = 0;
        for component in trimmed.split('.') {
            if count == parts.len() {
                return Err(format!("version \"{trimmed}\" has more than 4 components"));
            }
            parts[count] = component
                .parse::<u32>()
                .map_err(|e| format!("invalid version component \"{component}\" in \"{trimmed}\": {e}"))?;
            count += 1;
        }

        Ok(Self::new(parts[0], parts[1], parts[2], parts[3]))
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
