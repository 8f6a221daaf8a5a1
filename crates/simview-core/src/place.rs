//! Places of the simulated city.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Kind of a place. The set is fixed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceKind {
    House,
    Work,
    Park,
    Leisure,
}

impl PlaceKind {
    /// All kinds, in the order the server emits them.
    pub const ALL: [PlaceKind; 4] = [Self::House, Self::Work, Self::Park, Self::Leisure];

    /// Returns the tag used on the wire.
    pub fn wire_tag(&self) -> &'static str {
        match self {
            Self::House => "MAISON",
            Self::Work => "TRAVAIL",
            Self::Park => "PARC",
            Self::Leisure => "LOISIR",
        }
    }

    /// Parses a wire tag. Matching is exact (case-sensitive).
    pub fn from_wire_tag(tag: &str) -> Option<Self> {
        match tag {
            "MAISON" => Some(Self::House),
            "TRAVAIL" => Some(Self::Work),
            "PARC" => Some(Self::Park),
            "LOISIR" => Some(Self::Leisure),
            _ => None,
        }
    }

    /// Returns a descriptive label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::House => "House",
            Self::Work => "Work",
            Self::Park => "Park",
            Self::Leisure => "Leisure",
        }
    }
}

impl fmt::Display for PlaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for PlaceKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire_tag(s).ok_or_else(|| DomainError::UnknownPlaceKind { tag: s.to_string() })
    }
}

/// One place cell. A multi-cell place (a park, an office) is sent as one
/// `Place` per cell, each with its own occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Place {
    pub kind: PlaceKind,
    pub x: i32,
    pub y: i32,
    pub occupied: bool,
}

impl Place {
    pub fn new(kind: PlaceKind, x: i32, y: i32, occupied: bool) -> Self {
        Self { kind, x, y, occupied }
    }
}
