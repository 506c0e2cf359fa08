//! String encodings used by serialized facets.
//!
//! Every encoding here is URL-safe and round-trips through [`fmt::Display`]
//! and [`FromStr`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FacetParseError;

/// Numeric interval encoded as `"<min>:<max>"`; an empty side is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumericBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumericBounds {
    #[must_use]
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

impl fmt::Display for NumericBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(min) = self.min {
            write!(f, "{min}")?;
        }
        f.write_str(":")?;
        if let Some(max) = self.max {
            write!(f, "{max}")?;
        }
        Ok(())
    }
}

impl FromStr for NumericBounds {
    type Err = FacetParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (min, max) = raw
            .split_once(':')
            .ok_or_else(|| FacetParseError::Range(raw.to_string()))?;
        let bounds = Self::new(parse_bound(min)?, parse_bound(max)?);
        if bounds.is_unbounded() {
            return Err(FacetParseError::Range(raw.to_string()));
        }
        Ok(bounds)
    }
}

fn parse_bound(raw: &str) -> Result<Option<f64>, FacetParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_number(trimmed).map(Some)
}

/// Parse a finite number.
pub fn parse_number(raw: &str) -> Result<f64, FacetParseError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| FacetParseError::Number(raw.to_string()))
}

/// A geographic point encoded as `"lat,lng"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

impl FromStr for LatLng {
    type Err = FacetParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let coordinates = parse_coordinates(raw, 2)
            .ok_or_else(|| FacetParseError::Position(raw.to_string()))?;
        Ok(Self::new(coordinates[0], coordinates[1]))
    }
}

/// Rectangle defined by two diagonally opposite corners, encoded as
/// `"lat1,lng1,lat2,lng2"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub north_east: LatLng,
    pub south_west: LatLng,
}

impl BoundingBox {
    #[must_use]
    pub fn new(north_east: LatLng, south_west: LatLng) -> Self {
        Self {
            north_east,
            south_west,
        }
    }

    #[must_use]
    pub fn contains(&self, point: LatLng) -> bool {
        let (lat_low, lat_high) = ordered(self.north_east.lat, self.south_west.lat);
        let (lng_low, lng_high) = ordered(self.north_east.lng, self.south_west.lng);
        (lat_low..=lat_high).contains(&point.lat) && (lng_low..=lng_high).contains(&point.lng)
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.north_east, self.south_west)
    }
}

impl FromStr for BoundingBox {
    type Err = FacetParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let c = parse_coordinates(raw, 4)
            .ok_or_else(|| FacetParseError::BoundingBox(raw.to_string()))?;
        Ok(Self::new(LatLng::new(c[0], c[1]), LatLng::new(c[2], c[3])))
    }
}

fn parse_coordinates(raw: &str, expected: usize) -> Option<Vec<f64>> {
    let values = raw
        .split(',')
        .map(|part| parse_number(part).ok())
        .collect::<Option<Vec<_>>>()?;
    (values.len() == expected).then_some(values)
}

/// Expand a full hierarchical path into its cumulative levels.
///
/// `"Audio > Headphones"` becomes `["Audio", "Audio > Headphones"]`.
#[must_use]
pub fn hierarchical_levels(path: &str, separator: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }
    let mut levels = Vec::new();
    let mut current = String::new();
    for segment in path.split(separator) {
        if !current.is_empty() {
            current.push_str(separator);
        }
        current.push_str(segment);
        levels.push(current.clone());
    }
    levels
}

/// Validate cumulative levels and return the deepest path.
///
/// Each level must equal the previous level plus `separator` plus one segment.
pub fn hierarchical_path(levels: &[String], separator: &str) -> Result<Option<String>, FacetParseError> {
    let mut parent: Option<&str> = None;
    for level in levels {
        let extends = match parent {
            None => !level.is_empty() && !level.contains(separator),
            Some(parent) => level
                .strip_prefix(parent)
                .and_then(|rest| rest.strip_prefix(separator))
                .is_some_and(|segment| !segment.is_empty() && !segment.contains(separator)),
        };
        if !extends {
            return Err(FacetParseError::Hierarchy {
                parent: parent.unwrap_or_default().to_string(),
                level: level.clone(),
            });
        }
        parent = Some(level.as_str());
    }
    Ok(parent.map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_bounds_accept_open_sides() {
        assert_eq!(":5".parse::<NumericBounds>(), Ok(NumericBounds::new(None, Some(5.0))));
        assert_eq!("5:10".parse::<NumericBounds>(), Ok(NumericBounds::new(Some(5.0), Some(10.0))));
        assert_eq!("10:".parse::<NumericBounds>(), Ok(NumericBounds::new(Some(10.0), None)));
    }

    #[test]
    fn numeric_bounds_format_without_trailing_zeroes() {
        assert_eq!(NumericBounds::new(None, Some(5.0)).to_string(), ":5");
        assert_eq!(NumericBounds::new(Some(5.5), Some(10.0)).to_string(), "5.5:10");
        assert_eq!(NumericBounds::new(Some(10.0), None).to_string(), "10:");
    }

    #[test]
    fn malformed_numeric_bounds_are_rejected() {
        assert!("5".parse::<NumericBounds>().is_err());
        assert!(":".parse::<NumericBounds>().is_err());
        assert!("a:b".parse::<NumericBounds>().is_err());
        assert!("1:NaN".parse::<NumericBounds>().is_err());
    }

    #[test]
    fn bounding_box_round_trips() {
        let raw = "47.3165,4.9665,47.3424,5.0201";
        let parsed: BoundingBox = raw.parse().expect("valid bounding box");
        assert_eq!(parsed.north_east, LatLng::new(47.3165, 4.9665));
        assert_eq!(parsed.to_string(), raw);
        assert!(parsed.contains(LatLng::new(47.33, 5.0)));
        assert!("47.3165,4.9665,47.3424".parse::<BoundingBox>().is_err());
    }

    #[test]
    fn position_round_trips() {
        let parsed: LatLng = "48.8546,2.3477".parse().expect("valid position");
        assert_eq!(parsed.to_string(), "48.8546,2.3477");
        assert!("48.8546".parse::<LatLng>().is_err());
    }

    #[test]
    fn hierarchical_levels_accumulate_segments() {
        assert_eq!(
            hierarchical_levels("Audio > Headphones", " > "),
            vec!["Audio".to_string(), "Audio > Headphones".to_string()]
        );
        assert!(hierarchical_levels("", " > ").is_empty());
    }

    #[test]
    fn hierarchical_path_requires_each_level_to_extend_the_previous() {
        let levels = vec!["Audio".to_string(), "Audio > Headphones".to_string()];
        assert_eq!(
            hierarchical_path(&levels, " > "),
            Ok(Some("Audio > Headphones".to_string()))
        );

        let broken = vec!["Audio".to_string(), "Video > TV".to_string()];
        assert!(hierarchical_path(&broken, " > ").is_err());
        assert_eq!(hierarchical_path(&[], " > "), Ok(None));
    }
}
