// Copyright 2018-2023 the Deno authors. All rights reserved. MIT license.

use std::cmp::Ordering;
use std::fmt;

/// A version component that is either a concrete number or a wildcard
/// (`x`, `X` or `*`) matching any value at that position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
  Wildcard,
  Num(u64),
}

impl Part {
  /// Compares two parts for range purposes. A wildcard compares equal
  /// to anything.
  pub fn compare(&self, other: &Part) -> Ordering {
    match (self, other) {
      (Part::Wildcard, _) | (_, Part::Wildcard) => Ordering::Equal,
      (Part::Num(a), Part::Num(b)) => a.cmp(b),
    }
  }

  pub fn is_wildcard(&self) -> bool {
    matches!(self, Part::Wildcard)
  }

  /// The concrete value, if any.
  pub fn num(&self) -> Option<u64> {
    match self {
      Part::Wildcard => None,
      Part::Num(value) => Some(*value),
    }
  }
}

impl fmt::Display for Part {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Part::Wildcard => write!(f, "*"),
      Part::Num(value) => write!(f, "{value}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn part_compare() {
    assert_eq!(Part::Num(1).compare(&Part::Num(2)), Ordering::Less);
    assert_eq!(Part::Num(2).compare(&Part::Num(2)), Ordering::Equal);
    assert_eq!(Part::Num(3).compare(&Part::Num(2)), Ordering::Greater);
    assert_eq!(Part::Wildcard.compare(&Part::Num(9)), Ordering::Equal);
    assert_eq!(Part::Num(9).compare(&Part::Wildcard), Ordering::Equal);
    assert_eq!(Part::Wildcard.compare(&Part::Wildcard), Ordering::Equal);
  }

  #[test]
  fn part_display() {
    assert_eq!(Part::Wildcard.to_string(), "*");
    assert_eq!(Part::Num(42).to_string(), "42");
  }
}
