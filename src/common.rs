// Copyright 2018-2023 the Deno authors. All rights reserved. MIT license.

use monch::*;

use crate::part::Part;
use crate::Version;

// version ::= 'v'? xr ( '.' xr ( '.' xr )? )? ( '-' pre )? ( '+' build )?
pub fn version(input: &str) -> ParseResult<Version> {
  let (input, _) = maybe(ch('v'))(input)?;
  let (input, major) = xr(input)?;
  let (input, maybe_minor) = maybe(preceded(ch('.'), xr))(input)?;
  let (input, maybe_patch) = if maybe_minor.is_some() {
    maybe(preceded(ch('.'), xr))(input)?
  } else {
    (input, None)
  };
  let (input, pre) = maybe(preceded(ch('-'), parts))(input)?;
  let (input, build) = maybe(preceded(ch('+'), parts))(input)?;
  Ok((
    input,
    Version {
      major,
      // a missing component is a wildcard, never zero
      minor: maybe_minor.unwrap_or(Part::Wildcard),
      patch: maybe_patch.unwrap_or(Part::Wildcard),
      pre: pre.unwrap_or_default(),
      build: build.unwrap_or_default(),
    },
  ))
}

// loose version ::= '='? ( ' ' )* version
pub fn loose_version(input: &str) -> ParseResult<Version> {
  let (input, _) = maybe(ch('='))(input)?;
  let (input, _) = skip_whitespace(input)?;
  version(input)
}

// xr ::= 'x' | 'X' | '*' | nr
fn xr(input: &str) -> ParseResult<Part> {
  or(
    map(or3(tag("x"), tag("X"), tag("*")), |_| Part::Wildcard),
    map(nr, Part::Num),
  )(input)
}

// nr ::= ['0'-'9']+
fn nr(input: &str) -> ParseResult<u64> {
  // we do loose parsing to support people doing stuff like 01.02.03
  let (input, result) =
    if_not_empty(substring(skip_while(|c| c.is_ascii_digit())))(input)?;
  let val = match result.parse::<u64>() {
    Ok(val) => val,
    Err(err) => {
      return ParseError::fail(
        input,
        format!("Error parsing '{result}' to u64.\n\n{err:#}"),
      )
    }
  };
  Ok((input, val))
}

// parts ::= part ( '.' part ) *
fn parts(input: &str) -> ParseResult<Vec<String>> {
  if_not_empty(map(separated_list(part, ch('.')), |text| {
    text.into_iter().map(ToOwned::to_owned).collect()
  }))(input)
}

// part ::= [-0-9A-Za-z]+
fn part(input: &str) -> ParseResult<&str> {
  // nr is in the other set, so don't bother checking for it
  if_true(
    take_while(|c| c.is_ascii_alphanumeric() || c == '-'),
    |result| !result.is_empty(),
  )(input)
}
