//! Coordinate reference system codes, hemispheric regions and source kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PrepError;

/// Well-known CRS codes used by the preparation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 geographic (lat, lon in degrees)
    Epsg4326,
    /// NSIDC EASE-Grid North (Lambert azimuthal equal-area, meters)
    Epsg3408,
    /// NSIDC EASE-Grid South
    Epsg3409,
    /// NSIDC Sea Ice Polar Stereographic North
    Epsg3411,
    /// NSIDC Sea Ice Polar Stereographic South
    Epsg3412,
}

impl CrsCode {
    /// Parse an `EPSG:nnnn` string (case-insensitive).
    pub fn from_epsg_string(s: &str) -> Result<Self, PrepError> {
        match s.trim().to_uppercase().as_str() {
            "EPSG:4326" | "CRS:84" => Ok(CrsCode::Epsg4326),
            "EPSG:3408" => Ok(CrsCode::Epsg3408),
            "EPSG:3409" => Ok(CrsCode::Epsg3409),
            "EPSG:3411" => Ok(CrsCode::Epsg3411),
            "EPSG:3412" => Ok(CrsCode::Epsg3412),
            _ => Err(PrepError::configuration(format!("unsupported CRS: {}", s))),
        }
    }

    /// Numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3408 => 3408,
            CrsCode::Epsg3409 => 3409,
            CrsCode::Epsg3411 => 3411,
            CrsCode::Epsg3412 => 3412,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Hemispheric processing domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "NH")]
    North,
    #[serde(rename = "SH")]
    South,
}

impl Region {
    /// Upper-case tag used in directory names ("NH" / "SH").
    pub fn tag(&self) -> &'static str {
        match self {
            Region::North => "NH",
            Region::South => "SH",
        }
    }

    /// Lower-case tag used inside product file names ("nh" / "sh").
    pub fn file_tag(&self) -> &'static str {
        match self {
            Region::North => "nh",
            Region::South => "sh",
        }
    }

    /// EASE-Grid CRS that serves as the common target mesh for this region.
    pub fn target_crs(&self) -> CrsCode {
        match self {
            Region::North => CrsCode::Epsg3408,
            Region::South => CrsCode::Epsg3409,
        }
    }
}

impl FromStr for Region {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NH" => Ok(Region::North),
            "SH" => Ok(Region::South),
            _ => Err(PrepError::configuration(format!("unknown region: {}", s))),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Kind of data source feeding the pipeline.
///
/// The kind decides which native CRS the source coordinates live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Daily gridded ice-drift vectors
    Motion,
    /// Atmospheric reanalysis on a regular lat/lon grid
    Reanalysis,
    /// Passive-microwave swath concentration with geographic coordinates
    SwathConcentration,
    /// Daily analysis concentration on the polar stereographic grid
    DailyConcentration,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Motion => "motion",
            SourceKind::Reanalysis => "reanalysis",
            SourceKind::SwathConcentration => "swath_concentration",
            SourceKind::DailyConcentration => "daily_concentration",
        }
    }
}

impl FromStr for SourceKind {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "motion" => Ok(SourceKind::Motion),
            "reanalysis" | "era5" => Ok(SourceKind::Reanalysis),
            "swath_concentration" | "amsr" => Ok(SourceKind::SwathConcentration),
            "daily_concentration" | "noaa" => Ok(SourceKind::DailyConcentration),
            _ => Err(PrepError::configuration(format!("unknown source kind: {}", s))),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(CrsCode::from_epsg_string("EPSG:3408").unwrap(), CrsCode::Epsg3408);
        assert_eq!(CrsCode::from_epsg_string("epsg:4326").unwrap(), CrsCode::Epsg4326);
        assert!(CrsCode::from_epsg_string("EPSG:3857").is_err());
        assert_eq!(CrsCode::Epsg3412.to_string(), "EPSG:3412");
    }

    #[test]
    fn test_region_tags() {
        assert_eq!("nh".parse::<Region>().unwrap(), Region::North);
        assert_eq!("SH".parse::<Region>().unwrap(), Region::South);
        assert!("EQ".parse::<Region>().is_err());
        assert_eq!(Region::South.file_tag(), "sh");
        assert_eq!(Region::North.target_crs(), CrsCode::Epsg3408);
    }

    #[test]
    fn test_source_kind_aliases() {
        assert_eq!("noaa".parse::<SourceKind>().unwrap(), SourceKind::DailyConcentration);
        assert_eq!("AMSR".parse::<SourceKind>().unwrap(), SourceKind::SwathConcentration);
        assert!("radar".parse::<SourceKind>().is_err());
    }
}
