// Copyright 2018-2023 the Deno authors. All rights reserved. MIT license.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use monch::with_failure_handling;
use monch::ParseErrorFailureError;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

mod common;
mod constraint;
mod part;

pub use self::constraint::Clause;
pub use self::constraint::ConstraintParseError;
pub use self::constraint::Constraints;
pub use self::constraint::Op;
pub use self::part::Part;

/// Constraints that match any version.
pub static WILDCARD_CONSTRAINTS: Lazy<Constraints> =
  Lazy::new(|| Constraints::parse("*").unwrap());

#[derive(Error, Debug, Clone)]
#[error("Invalid version '{text}'. {source}")]
pub struct VersionParseError {
  text: String,
  #[source]
  source: ParseErrorFailureError,
}

/// A semantic version whose components may be wildcards (`1.2.x`, `*`).
///
/// Wildcard parts compare equal to any value at their position, which is
/// what makes a boundary like `2.x` behave as "any 2.y.z" during range
/// evaluation.
#[derive(Clone, Debug)]
pub struct Version {
  pub major: Part,
  pub minor: Part,
  pub patch: Part,
  pub pre: Vec<String>,
  pub build: Vec<String>,
}

impl Version {
  /// Parses a version. Accepts npm's loose forms: a leading `=` or `v`,
  /// surrounding whitespace, wildcard components and missing components
  /// (which parse as wildcards, never as zero).
  pub fn parse(text: &str) -> Result<Version, VersionParseError> {
    let text = text.trim();
    with_failure_handling(common::loose_version)(text).map_err(|source| {
      VersionParseError {
        text: text.to_string(),
        source,
      }
    })
  }

  /// The version with every part wildcarded. Compares equal to anything.
  pub fn any() -> Version {
    Version {
      major: Part::Wildcard,
      minor: Part::Wildcard,
      patch: Part::Wildcard,
      pre: Vec::new(),
      build: Vec::new(),
    }
  }

  fn bare(major: u64, minor: u64, patch: u64) -> Version {
    Version {
      major: Part::Num(major),
      minor: Part::Num(minor),
      patch: Part::Num(patch),
      pre: Vec::new(),
      build: Vec::new(),
    }
  }

  pub fn is_pre_release(&self) -> bool {
    !self.pre.is_empty()
  }

  /// Whether every component is a wildcard.
  pub fn is_any(&self) -> bool {
    self.major.is_wildcard()
      && self.minor.is_wildcard()
      && self.patch.is_wildcard()
  }

  /// This version with pre-release and build metadata stripped.
  pub fn release(&self) -> Version {
    Version {
      major: self.major,
      minor: self.minor,
      patch: self.patch,
      pre: Vec::new(),
      build: Vec::new(),
    }
  }

  /// Exclusive upper bound of the `~` range anchored at this version.
  ///
  /// Bumps the minor part when it is given (`~1.2.3` < `1.3.0`), otherwise
  /// the major part (`~2` < `3.0.0`). Returns `None` when the major part is
  /// a wildcard: `~*` has no finite upper bound.
  pub fn tilde_bump(&self) -> Option<Version> {
    let major = self.major.num()?;
    match self.minor.num() {
      None => Some(Version::bare(major + 1, 0, 0)),
      Some(minor) => Some(Version::bare(major, minor + 1, 0)),
    }
  }

  /// Exclusive upper bound of the `^` range anchored at this version: the
  /// next version that would be a breaking change, bumping the leftmost
  /// non-zero part (`^1.2.3` < `2.0.0`, `^0.2.3` < `0.3.0`, `^0.0.3` <
  /// `0.0.4`). Returns `None` when the major part is a wildcard.
  pub fn caret_bump(&self) -> Option<Version> {
    let major = self.major.num()?;
    if major > 0 {
      return Some(Version::bare(major + 1, 0, 0));
    }
    let minor = match self.minor.num() {
      None => return Some(Version::bare(1, 0, 0)),
      Some(minor) => minor,
    };
    if minor > 0 {
      return Some(Version::bare(0, minor + 1, 0));
    }
    match self.patch.num() {
      None => Some(Version::bare(0, 1, 0)),
      Some(patch) => Some(Version::bare(0, 0, patch + 1)),
    }
  }
}

impl Serialize for Version {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de> for Version {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let text = String::deserialize(deserializer)?;
    match Version::parse(&text) {
      Ok(version) => Ok(version),
      Err(err) => Err(serde::de::Error::custom(err)),
    }
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    // trailing wildcard parts are suppressed so versions render the way
    // they are written ("1.2", "*"); non-wildcard versions round-trip
    write!(f, "{}", self.major)?;
    if !self.minor.is_wildcard() || !self.patch.is_wildcard() {
      write!(f, ".{}", self.minor)?;
      if !self.patch.is_wildcard() {
        write!(f, ".{}", self.patch)?;
      }
    }
    if !self.pre.is_empty() {
      write!(f, "-")?;
      for (i, part) in self.pre.iter().enumerate() {
        if i > 0 {
          write!(f, ".")?;
        }
        write!(f, "{part}")?;
      }
    }
    if !self.build.is_empty() {
      write!(f, "+")?;
      for (i, part) in self.build.iter().enumerate() {
        if i > 0 {
          write!(f, ".")?;
        }
        write!(f, "{part}")?;
      }
    }
    Ok(())
  }
}

impl FromStr for Version {
  type Err = VersionParseError;

  fn from_str(text: &str) -> Result<Self, Self::Err> {
    Version::parse(text)
  }
}

impl std::cmp::PartialEq for Version {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl std::cmp::Eq for Version {}

impl std::cmp::PartialOrd for Version {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl std::cmp::Ord for Version {
  fn cmp(&self, other: &Self) -> Ordering {
    let cmp_result = self.major.compare(&other.major);
    if cmp_result != Ordering::Equal {
      return cmp_result;
    }

    let cmp_result = self.minor.compare(&other.minor);
    if cmp_result != Ordering::Equal {
      return cmp_result;
    }

    let cmp_result = self.patch.compare(&other.patch);
    if cmp_result != Ordering::Equal {
      return cmp_result;
    }

    // only compare the pre-release and not the build as node-semver does
    if self.pre.is_empty() && other.pre.is_empty() {
      Ordering::Equal
    } else if !self.pre.is_empty() && other.pre.is_empty() {
      Ordering::Less
    } else if self.pre.is_empty() && !other.pre.is_empty() {
      Ordering::Greater
    } else {
      let mut i = 0;
      loop {
        match (self.pre.get(i), other.pre.get(i)) {
          (None, None) => return Ordering::Equal,
          (None, Some(_)) => return Ordering::Less,
          (Some(_), None) => return Ordering::Greater,
          (Some(a), Some(b)) => {
            // numeric identifiers sort below alphanumeric ones
            let cmp_result = match (a.parse::<u64>(), b.parse::<u64>()) {
              (Ok(a_num), Ok(b_num)) => a_num.cmp(&b_num),
              (Ok(_), Err(_)) => Ordering::Less,
              (Err(_), Ok(_)) => Ordering::Greater,
              (Err(_), Err(_)) => a.cmp(b),
            };
            if cmp_result != Ordering::Equal {
              return cmp_result;
            }
            i += 1;
          }
        }
      }
    }
  }
}
