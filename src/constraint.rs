// Copyright 2018-2023 the Deno authors. All rights reserved. MIT license.

use std::fmt;
use std::str::FromStr;

use monch::*;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::common;
use crate::Version;

#[derive(Error, Debug, Clone)]
#[error("Invalid constraint '{text}'. {source}")]
pub struct ConstraintParseError {
  text: String,
  #[source]
  source: ParseErrorFailureError,
}

/// Comparison operator of a single constraint clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
  Equal,
  GreaterThan,
  LessThan,
  GreaterThanOrEqual,
  LessThanOrEqual,
  Tilde,
  Caret,
}

impl Op {
  /// Evaluates the operator for a candidate version against a clause
  /// boundary. The pre-release gate has already run at this point.
  fn matches(&self, version: &Version, boundary: &Version) -> bool {
    match self {
      Op::Equal => matches_equal(version, boundary),
      Op::GreaterThan => matches_greater_than(version, boundary),
      Op::LessThan => matches_less_than(version, boundary),
      Op::GreaterThanOrEqual => {
        matches_greater_than_or_equal(version, boundary)
      }
      Op::LessThanOrEqual => matches_less_than_or_equal(version, boundary),
      Op::Tilde => matches_tilde(version, boundary),
      Op::Caret => matches_caret(version, boundary),
    }
  }

  fn token(&self) -> &'static str {
    match self {
      Op::Equal => "",
      Op::GreaterThan => ">",
      Op::LessThan => "<",
      Op::GreaterThanOrEqual => ">=",
      Op::LessThanOrEqual => "<=",
      Op::Tilde => "~",
      Op::Caret => "^",
    }
  }
}

fn matches_equal(v: &Version, c: &Version) -> bool {
  v == c
}

fn matches_greater_than(v: &Version, c: &Version) -> bool {
  if v.is_pre_release() && c.is_pre_release() {
    return v.release() == c.release() && v > c;
  }
  v > c
}

fn matches_less_than(v: &Version, c: &Version) -> bool {
  if v.is_pre_release() && c.is_pre_release() {
    return v.release() == c.release() && v < c;
  }
  v < c
}

fn matches_greater_than_or_equal(v: &Version, c: &Version) -> bool {
  if v.is_pre_release() && c.is_pre_release() {
    return v.release() == c.release() && v >= c;
  }
  v >= c
}

fn matches_less_than_or_equal(v: &Version, c: &Version) -> bool {
  if v.is_pre_release() && c.is_pre_release() {
    return v.release() == c.release() && v <= c;
  }
  v <= c
}

fn matches_tilde(v: &Version, c: &Version) -> bool {
  // ~2, ~2.x --> >=2.0.0, <3.0.0
  // ~1.2, ~1.2.x --> >=1.2.0, <1.3.0
  // ~1.2.3 --> >=1.2.3, <1.3.0
  // ~* --> any
  if v.is_pre_release() && c.is_pre_release() {
    return v >= c && *v < c.release();
  }
  match c.tilde_bump() {
    Some(bound) => v >= c && *v < bound,
    None => v >= c,
  }
}

fn matches_caret(v: &Version, c: &Version) -> bool {
  // ^1.2.3 --> >=1.2.3, <2.0.0
  // ^0.2.3 --> >=0.2.3, <0.3.0
  // ^0.0.3 --> >=0.0.3, <0.0.4
  // ^0.0 --> >=0.0.0, <0.1.0
  // ^0 --> >=0.0.0, <1.0.0
  // ^* --> any
  if v.is_pre_release() && c.is_pre_release() {
    return v >= c && *v < c.release();
  }
  match c.caret_bump() {
    Some(bound) => v >= c && *v < bound,
    None => v >= c,
  }
}

/// A single `operator boundary` test within a range expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
  pub op: Op,
  pub boundary: Version,
}

impl Clause {
  /// Parses one constraint fragment (no `,` or `||`). The empty fragment
  /// is the match-any clause.
  pub fn parse(text: &str) -> Result<Clause, ConstraintParseError> {
    if text.is_empty() {
      return Ok(Clause {
        op: Op::Equal,
        boundary: Version::any(),
      });
    }
    with_failure_handling(clause)(text).map_err(|source| {
      ConstraintParseError {
        text: text.to_string(),
        source,
      }
    })
  }

  /// Whether the version passes this clause.
  pub fn check(&self, version: &Version) -> bool {
    // npm semantics: a pre-release candidate only qualifies when the
    // boundary itself pins a pre-release, and a pre-release on an
    // all-wildcard boundary is unsatisfiable
    if version.is_pre_release() && !self.boundary.is_pre_release() {
      return false;
    }
    if self.boundary.is_pre_release() && self.boundary.is_any() {
      return false;
    }
    self.op.matches(version, &self.boundary)
  }
}

impl fmt::Display for Clause {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}", self.op.token(), self.boundary)
  }
}

// clause ::= ( ' ' )* operator? ( ' ' )* version ( ' ' )*
fn clause(input: &str) -> ParseResult<Clause> {
  let (input, _) = skip_whitespace(input)?;
  let (input, op) = maybe(operator)(input)?;
  let (input, _) = skip_whitespace(input)?;
  let (input, boundary) = common::version(input)?;
  let (input, _) = skip_whitespace(input)?;
  Ok((
    input,
    Clause {
      op: op.unwrap_or(Op::Equal),
      boundary,
    },
  ))
}

// operator ::= '>=' | '=>' | '<=' | '=<' | '>' | '<' | '=' | '~' | '^'
// two character tokens come first so `<=` is never truncated to `<`
fn operator(input: &str) -> ParseResult<Op> {
  or(
    or5(
      map(tag(">="), |_| Op::GreaterThanOrEqual),
      map(tag("=>"), |_| Op::GreaterThanOrEqual),
      map(tag("<="), |_| Op::LessThanOrEqual),
      map(tag("=<"), |_| Op::LessThanOrEqual),
      map(ch('>'), |_| Op::GreaterThan),
    ),
    or4(
      map(ch('<'), |_| Op::LessThan),
      map(ch('~'), |_| Op::Tilde),
      map(ch('^'), |_| Op::Caret),
      map(ch('='), |_| Op::Equal),
    ),
  )(input)
}

/// One or more constraints a version can be checked against: a
/// disjunction (`||`) of conjunctions (`,`) of clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraints {
  groups: Vec<Vec<Clause>>,
}

impl Constraints {
  /// Parses a range expression like `>= 1.0, < 1.4 || > 2.0`. The first
  /// invalid fragment aborts the whole parse.
  pub fn parse(text: &str) -> Result<Constraints, ConstraintParseError> {
    let mut groups = Vec::new();
    for group_text in text.split("||") {
      let mut clauses = Vec::new();
      for fragment in group_text.split(',') {
        clauses.push(Clause::parse(fragment)?);
      }
      groups.push(clauses);
    }
    Ok(Constraints { groups })
  }

  /// Whether the version satisfies every clause of at least one group.
  pub fn check(&self, version: &Version) -> bool {
    self
      .groups
      .iter()
      .any(|clauses| clauses.iter().all(|clause| clause.check(version)))
  }

  /// The parsed OR-groups, each a list of AND-ed clauses.
  pub fn groups(&self) -> &[Vec<Clause>] {
    &self.groups
  }
}

impl fmt::Display for Constraints {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, clauses) in self.groups.iter().enumerate() {
      if i > 0 {
        write!(f, " || ")?;
      }
      for (j, clause) in clauses.iter().enumerate() {
        if j > 0 {
          write!(f, ", ")?;
        }
        write!(f, "{clause}")?;
      }
    }
    Ok(())
  }
}

impl FromStr for Constraints {
  type Err = ConstraintParseError;

  fn from_str(text: &str) -> Result<Self, Self::Err> {
    Constraints::parse(text)
  }
}

impl Serialize for Constraints {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de> for Constraints {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let text = String::deserialize(deserializer)?;
    match Constraints::parse(&text) {
      Ok(constraints) => Ok(constraints),
      Err(err) => Err(serde::de::Error::custom(err)),
    }
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn version(text: &str) -> Version {
    Version::parse(text).unwrap()
  }

  #[test]
  fn constraints_parse() {
    let fixtures = &[
      (">= 1.1", true),
      (">40.50.60, < 50.70", true),
      ("2.0", true),
      ("2.3.5-20161202202307-sha.e8fc5e5", true),
      (">= bar", false),
      ("BAR >= 1.2.3", false),
      (">= 1.2.3, < 2.0", true),
      (">= 1.2.3, < 2.0 || => 3.0, < 4", true),
      ("", true),
      (">= 1.0,", true),
      (",", true),
      ("~1.2.x", true),
      ("^ 1.2", true),
      ("= 2.x", true),
      ("=> 1.0", true),
      ("=< 1.0", true),
      ("v1.2.3", true),
      ("1 - 2", false),
      ("<>1.0", false),
      ("~>1.2", false),
      ("   ", false),
      (">= 1.0 || ", false),
      ("1.2.3-", false),
      ("1.2.3.4", false),
    ];
    for (input, ok) in fixtures {
      assert_eq!(
        Constraints::parse(input).is_ok(),
        *ok,
        "parsing '{input}'"
      );
    }
  }

  #[test]
  fn constraints_structure() {
    let constraints =
      Constraints::parse(">= 1.0, < 1.4 || > 2.0").unwrap();
    let groups = constraints.groups();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(groups[0][0].op, Op::GreaterThanOrEqual);
    assert_eq!(groups[0][1].op, Op::LessThan);
    assert_eq!(groups[1].len(), 1);
    assert_eq!(groups[1][0].op, Op::GreaterThan);
    assert_eq!(groups[1][0].boundary, version("2.0"));
  }

  #[test]
  fn constraints_check_satisfied() {
    let fixtures = &[
      ("1.0.0", "1.0.0"),
      ("=1.0.0", "1.0.0"),
      ("1.0", "1.0.5"),
      ("2.0", "2.0.0"),
      ("= 2.x", "2.5.0"),
      ("*", "1.2.3"),
      ("", "1.0.0"),
      ("x", "0.1.2"),
      (">=1.0.0", "1.0.0"),
      (">=1.0.0", "1.1.0"),
      ("=>1.0.0", "1.1.0"),
      (">1.0.0", "1.0.1"),
      (">2.x", "3.0.0"),
      ("<2.0.0", "1.9999.9999"),
      ("< 1.2", "1.1.1"),
      ("<=2.0.0", "2.0.0"),
      ("=<2.0.0", "1.2.3"),
      ("~1.2.3", "1.2.3"),
      ("~1.2.3", "1.2.9"),
      ("~1.2", "1.2.0"),
      ("~1", "1.9.9"),
      ("~2", "2.0.9"),
      ("~*", "5.0.0"),
      ("~1.2.3-beta.2", "1.2.3-beta.4"),
      ("~1.2.3-beta.2", "1.2.4"),
      ("^1.2.3", "1.8.1"),
      ("^0.2.3", "0.2.9"),
      ("^0.0.3", "0.0.3"),
      ("^0.0", "0.0.7"),
      ("^0", "0.9.9"),
      ("^*", "9.9.9"),
      ("^1.2.3-alpha", "1.2.3-beta"),
      ("^1.2.3-alpha", "1.3.0"),
      (">1.2.3-alpha", "1.2.3-beta"),
      (">1.2.3-alpha", "1.2.4"),
      (">=1.2.3-alpha", "1.2.3-alpha"),
      (">=1.2.3-alpha", "1.2.3"),
      ("<1.2.3-beta", "1.2.3-alpha"),
      ("<1.2.3-beta", "1.2.2"),
      ("<=1.2.3-beta", "1.2.3-alpha"),
      ("1.2.3-alpha", "1.2.3-alpha"),
      ("1.2.3-alpha", "1.2.3-alpha+build.5"),
      (">= 1.0, < 1.4 || > 2.0", "2.1.0"),
      (">= 1.0, < 1.4 || > 2.0", "1.2.0"),
      (">= 1.0,", "1.2.0"),
      ("1.2.x || 2.x", "2.1.3"),
      ("1.2.x || 2.x", "1.2.3"),
      (">= 1.2.3, < 2.0 || => 3.0, < 4", "3.5.0"),
      (">40.50.60, < 50.70", "45.0.0"),
    ];
    for (constraint_text, version_text) in fixtures {
      let constraints = Constraints::parse(constraint_text).unwrap();
      assert!(
        constraints.check(&version(version_text)),
        "'{version_text}' should satisfy '{constraint_text}'"
      );
    }
  }

  #[test]
  fn constraints_check_not_satisfied() {
    let fixtures = &[
      ("1.0.0", "1.0.1"),
      ("2.0", "2.1.0"),
      ("1.0.0", "1.0.0-alpha"),
      ("*", "1.2.3-alpha"),
      ("", "1.0.0-alpha"),
      (">=1.0.0", "0.9.9"),
      (">1.0.0", "1.0.0"),
      (">2.x", "2.9.9"),
      ("<1", "1.0.0"),
      ("<1.2", "1.2.0"),
      ("<=2.0.0", "2.0.1"),
      ("~1.2.3", "1.3.0"),
      ("~1.2.3", "1.2.2"),
      ("~2.0", "2.1.0"),
      ("~1", "2.0.0"),
      ("~*", "1.0.0-alpha"),
      ("^1.2.3", "2.0.0"),
      ("^1.2.3", "1.2.2"),
      ("^0.2.3", "0.3.0"),
      ("^0.0.3", "0.0.4"),
      ("^0.0.1", "0.0.2"),
      ("^1.2.3", "1.2.3-beta"),
      ("^1.2.3-alpha", "1.2.4-beta"),
      (">1.2.3-alpha", "1.2.4-beta"),
      ("<1.2.3-beta", "1.2.2-alpha"),
      (">=*-alpha", "1.2.3"),
      (">= 1.0, < 1.4 || > 2.0", "1.5.0"),
      (">= 1.0,", "1.2.0-alpha"),
      ("1.2.x || 2.x", "3.0.0"),
    ];
    for (constraint_text, version_text) in fixtures {
      let constraints = Constraints::parse(constraint_text).unwrap();
      assert!(
        !constraints.check(&version(version_text)),
        "'{version_text}' should not satisfy '{constraint_text}'"
      );
    }
  }

  #[test]
  fn pre_release_gate_rejects_every_operator() {
    // a pre-release candidate never matches a release boundary, even
    // when the raw comparison would hold
    let candidate = version("1.2.3-alpha");
    for op_text in ["", "=", ">", "<", ">=", "<=", "=>", "=<", "~", "^"] {
      let constraints =
        Constraints::parse(&format!("{op_text} 1.2.3")).unwrap();
      assert!(
        !constraints.check(&candidate),
        "'1.2.3-alpha' should not satisfy '{op_text} 1.2.3'"
      );
    }
  }

  #[test]
  fn constraints_display() {
    #[track_caller]
    fn run_test(input: &str, expected: &str) {
      let constraints = Constraints::parse(input).unwrap();
      let output = constraints.to_string();
      assert_eq!(output, expected);
      let reparsed = Constraints::parse(&output).unwrap();
      assert_eq!(reparsed, constraints);
    }

    run_test(">= 1.0, < 1.4 || > 2.0", ">=1.0, <1.4 || >2.0");
    run_test("=> 3.0, =< 4", ">=3.0, <=4");
    run_test("1.2.3", "1.2.3");
    run_test("v1.2.3", "1.2.3");
    run_test("~1.2", "~1.2");
    run_test("^0.2.3", "^0.2.3");
    run_test("= 2.x", "2");
    run_test("*", "*");
    run_test("", "*");
    run_test(">= 1.0,", ">=1.0, *");
    run_test("1.2.3-alpha.1+build.5", "1.2.3-alpha.1+build.5");
  }

  #[test]
  fn constraints_from_str() {
    let constraints: Constraints = ">= 1.0".parse().unwrap();
    assert!(constraints.check(&version("1.0.0")));
    assert!(">= bar".parse::<Constraints>().is_err());
  }

  #[test]
  fn constraint_error_carries_fragment() {
    let err = Constraints::parse(">= 1.0, >= bar").unwrap_err();
    assert!(err.to_string().contains(">= bar"), "got: {err}");
  }

  #[test]
  fn serialize_deserialize() {
    let constraints: Constraints =
      serde_json::from_str("\">= 1.0, < 1.4 || > 2.0\"").unwrap();
    let json = serde_json::to_string(&constraints).unwrap();
    assert_eq!(json, "\">=1.0, <1.4 || >2.0\"");
    let reparsed: Constraints = serde_json::from_str(&json).unwrap();
    assert_eq!(reparsed, constraints);
  }
}
