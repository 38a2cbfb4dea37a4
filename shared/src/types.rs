//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Units of measure for ingredient lines and inventory items
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Piece,
    G,
    Kg,
    Mg,
    Ml,
    L,
    Oz,
    Lb,
    Cup,
    Tbsp,
    Tsp,
    Dozen,
    Pack,
    Box,
    Bottle,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Piece => "piece",
            Unit::G => "g",
            Unit::Kg => "kg",
            Unit::Mg => "mg",
            Unit::Ml => "ml",
            Unit::L => "l",
            Unit::Oz => "oz",
            Unit::Lb => "lb",
            Unit::Cup => "cup",
            Unit::Tbsp => "tbsp",
            Unit::Tsp => "tsp",
            Unit::Dozen => "dozen",
            Unit::Pack => "pack",
            Unit::Box => "box",
            Unit::Bottle => "bottle",
        }
    }

    /// Parse a stored unit string. Unknown strings yield `None`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "piece" | "pcs" | "pc" => Some(Unit::Piece),
            "g" => Some(Unit::G),
            "kg" => Some(Unit::Kg),
            "mg" => Some(Unit::Mg),
            "ml" => Some(Unit::Ml),
            "l" => Some(Unit::L),
            "oz" => Some(Unit::Oz),
            "lb" => Some(Unit::Lb),
            "cup" => Some(Unit::Cup),
            "tbsp" => Some(Unit::Tbsp),
            "tsp" => Some(Unit::Tsp),
            "dozen" => Some(Unit::Dozen),
            "pack" => Some(Unit::Pack),
            "box" => Some(Unit::Box),
            "bottle" => Some(Unit::Bottle),
            _ => None,
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
