/*!
 * An existing business, the raw data that everything else is computed from.
 */

use crate::geo::{Geo, GeoPoint};
use std::fmt::{self, Display};

/// The land use zoning of the lot a business sits on.
///
/// Zone names are matched exactly, so "commercial" is an `Other` zone and not `Commercial`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ZoneType {
    Commercial,
    Residential,
    /// Any zoning the data layer uses besides the two above, e.g. "Industrial".
    Other(String),
}

impl ZoneType {
    /// The name stored in the database and shown to users.
    pub fn name(&self) -> &str {
        match self {
            ZoneType::Commercial => "Commercial",
            ZoneType::Residential => "Residential",
            ZoneType::Other(name) => name,
        }
    }
}

impl From<&str> for ZoneType {
    fn from(name: &str) -> Self {
        match name {
            "Commercial" => ZoneType::Commercial,
            "Residential" => ZoneType::Residential,
            other => ZoneType::Other(other.to_owned()),
        }
    }
}

impl Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}", self.name())
    }
}

/// A single existing business as supplied by the data layer.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessRecord {
    /// Unique identifier assigned by the data layer.
    pub id: i64,
    pub name: String,
    /// Free form category, e.g. "Cafe" or "Sari-Sari Store". Compared without regard to case.
    pub category: String,
    pub street: String,
    pub zone: ZoneType,
    pub location: GeoPoint,
}

impl BusinessRecord {
    /// Test if this business is in category, ignoring case.
    pub fn is_category(&self, category: &str) -> bool {
        self.category.to_lowercase() == category.to_lowercase()
    }

    pub fn is_commercial(&self) -> bool {
        self.zone == ZoneType::Commercial
    }
}

impl Geo for BusinessRecord {
    fn location(&self) -> GeoPoint {
        self.location
    }
}
