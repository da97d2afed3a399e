//! EPSG coordinate reference system codes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::VelocityError;

/// EPSG code of WGS84 geographic coordinates (lon/lat degrees).
pub const EPSG_WGS84: u32 = 4326;

/// An EPSG code identifying a geographic or projected CRS.
///
/// The catalog stores codes either as integers or as strings
/// (`"3413"`, `"EPSG:3413"`); both deserialize to the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EpsgCode(pub u32);

impl EpsgCode {
    /// WGS84 geographic.
    pub const WGS84: EpsgCode = EpsgCode(EPSG_WGS84);
    /// NSIDC Sea Ice Polar Stereographic North.
    pub const POLAR_NORTH: EpsgCode = EpsgCode(3413);
    /// Antarctic Polar Stereographic.
    pub const POLAR_SOUTH: EpsgCode = EpsgCode(3031);

    pub fn new(code: u32) -> Self {
        Self(code)
    }

    /// The numeric code.
    pub fn code(&self) -> u32 {
        self.0
    }

    /// Parse a CRS string.
    ///
    /// Accepts formats like:
    /// - "EPSG:3413"
    /// - "epsg:3413"
    /// - "3413"
    pub fn parse(s: &str) -> Result<Self, VelocityError> {
        let trimmed = s.trim();
        let digits = match trimmed.split_once(':') {
            Some((authority, code)) if authority.eq_ignore_ascii_case("epsg") => code,
            Some(_) => return Err(VelocityError::InvalidEpsg(s.to_string())),
            None => trimmed,
        };

        digits
            .trim()
            .parse::<u32>()
            .map(EpsgCode)
            .map_err(|_| VelocityError::InvalidEpsg(s.to_string()))
    }

    /// Check if this is WGS84 geographic.
    pub fn is_geographic(&self) -> bool {
        self.0 == EPSG_WGS84
    }
}

impl fmt::Display for EpsgCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

impl FromStr for EpsgCode {
    type Err = VelocityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EpsgCode::parse(s)
    }
}

impl From<u32> for EpsgCode {
    fn from(code: u32) -> Self {
        EpsgCode(code)
    }
}

impl Serialize for EpsgCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> Deserialize<'de> for EpsgCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(code) => Ok(EpsgCode(code)),
            Raw::Text(text) => EpsgCode::parse(&text).map_err(serde::de::Error::custom),
        }
    }
}
