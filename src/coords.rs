// Copyright 2023 Viktor Reusch
//
// This file is part of rally_gpx.
//
// rally_gpx is free software: you can redistribute it and/or modify it under
// the terms of the GNU Affero General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// rally_gpx is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more
// details.
//
// You should have received a copy of the GNU Affero General Public License
// along with rally_gpx. If not, see <https://www.gnu.org/licenses/>.

//! Parsing of the free-form coordinate strings found in bonus records.
//!
//! Rally masters type coordinates in whatever notation their source uses:
//! decimal degrees (`51.5,-0.1`), degrees and minutes (`51°30'N 0°10'W`) or
//! degrees, minutes and seconds. [`parse`] cleans up the usual glyphs and
//! hands the result to [`parse_geo_coordinate`].

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use thiserror::Error;

/// Markers which are replaced by a space before parsing.
///
/// The mis-encoded degree sign (UTF-8 read as Latin-1) must come before the
/// plain one. Typographic primes are accepted next to the ASCII quotes.
const MARKERS: &[&str] = &[
    "\u{c2}\u{b0}",
    "\u{b0}",
    "'",
    "\u{2032}",
    "\"",
    "\u{2033}",
];

/// Signed decimal number.
const SIGNED: &str = r"([+-]?\d+(?:\.\d+)?)";
/// Degrees with optional minutes and optional seconds.
const ANGLE: &str = r"(\d+(?:\.\d+)?)(?:\s+(\d+(?:\.\d+)?)(?:\s+(\d+(?:\.\d+)?))?)?";

lazy_static! {
    /// `51.5,-0.1`, `51.5 -0.1`, `51.5;-0.1`
    static ref DECIMAL: Regex =
        Regex::new(&format!(r"^\s*{SIGNED}\s*[,;:\s]\s*{SIGNED}\s*$")).unwrap();
    /// `N 51 30 W 0 10`
    static ref PREFIXED: Regex =
        Regex::new(&format!(r"(?i)^\s*([NS])\s*{ANGLE}\s*,?\s*([EW])\s*{ANGLE}\s*$")).unwrap();
    /// `51 30 N 0 10 W`
    static ref SUFFIXED: Regex =
        Regex::new(&format!(r"(?i)^\s*{ANGLE}\s*([NS])\s*,?\s*{ANGLE}\s*([EW])\s*$")).unwrap();
}

/// A position in signed degrees. South and west are negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinate {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Reason why a coordinate string was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Nothing left after cleaning up the input.
    #[error("no coordinates given")]
    Empty,
    /// None of the known notations matched.
    #[error("unrecognized coordinate notation")]
    Unrecognized,
    /// Degrees, minutes or seconds do not fit together.
    #[error("invalid {unit} value {value}")]
    Component { unit: &'static str, value: f64 },
    /// Latitude or longitude beyond the globe.
    #[error("coordinates {latitude},{longitude} are out of range")]
    OutOfRange { latitude: f64, longitude: f64 },
}

/// Parse a raw coordinate string as stored in a bonus record.
///
/// Degree signs, apostrophes and seconds marks are replaced by spaces (see
/// [`normalize`]) before the string is handed to [`parse_geo_coordinate`].
pub fn parse(raw: &str) -> Result<Coordinate, ParseError> {
    let (latitude, longitude) = parse_geo_coordinate(&normalize(raw))?;
    Ok(Coordinate {
        latitude,
        longitude,
    })
}

/// Replace degree, minute and second markers with spaces.
pub fn normalize(raw: &str) -> String {
    MARKERS
        .iter()
        .fold(raw.to_string(), |s, marker| s.replace(marker, " "))
}

/// Parse a `(latitude, longitude)` pair.
///
/// Accepts decimal pairs with optional signs and hemisphere notations in
/// degrees, degrees-minutes or degrees-minutes-seconds with the hemisphere
/// letter before or after each half. The first half is always the latitude.
pub fn parse_geo_coordinate(s: &str) -> Result<(f64, f64), ParseError> {
    if s.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let (latitude, longitude) = if let Some(caps) = DECIMAL.captures(s) {
        (number(&caps[1])?, number(&caps[2])?)
    } else if let Some(caps) = PREFIXED.captures(s) {
        (
            hemisphere(&caps[1], angle(&caps, 2)?),
            hemisphere(&caps[5], angle(&caps, 6)?),
        )
    } else if let Some(caps) = SUFFIXED.captures(s) {
        (
            hemisphere(&caps[4], angle(&caps, 1)?),
            hemisphere(&caps[8], angle(&caps, 5)?),
        )
    } else {
        return Err(ParseError::Unrecognized);
    };

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(ParseError::OutOfRange {
            latitude,
            longitude,
        });
    }
    Ok((latitude, longitude))
}

fn number(s: &str) -> Result<f64, ParseError> {
    s.parse().map_err(|_| ParseError::Unrecognized)
}

/// Combine the degrees, minutes and seconds captured from `first` onwards.
fn angle(caps: &Captures<'_>, first: usize) -> Result<f64, ParseError> {
    let mut parts = [None; 3];
    for (i, part) in parts.iter_mut().enumerate() {
        if let Some(m) = caps.get(first + i) {
            *part = Some(number(m.as_str())?);
        }
    }

    match parts {
        [Some(degrees), None, None] => Ok(degrees),
        [Some(degrees), Some(minutes), None] => {
            whole("degrees", degrees)?;
            sexagesimal("minutes", minutes)?;
            Ok(degrees + minutes / 60.0)
        }
        [Some(degrees), Some(minutes), Some(seconds)] => {
            whole("degrees", degrees)?;
            whole("minutes", minutes)?;
            sexagesimal("minutes", minutes)?;
            sexagesimal("seconds", seconds)?;
            Ok(degrees + minutes / 60.0 + seconds / 3600.0)
        }
        _ => Err(ParseError::Unrecognized),
    }
}

fn whole(unit: &'static str, value: f64) -> Result<(), ParseError> {
    if value.fract() == 0.0 {
        Ok(())
    } else {
        Err(ParseError::Component { unit, value })
    }
}

fn sexagesimal(unit: &'static str, value: f64) -> Result<(), ParseError> {
    if value < 60.0 {
        Ok(())
    } else {
        Err(ParseError::Component { unit, value })
    }
}

/// Apply the sign of a hemisphere letter.
fn hemisphere(letter: &str, value: f64) -> f64 {
    if letter.eq_ignore_ascii_case("s") || letter.eq_ignore_ascii_case("w") {
        -value
    } else {
        value
    }
}
