use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Apartment,
    TownHouse,
    VillaPalace,
    WholeBuilding,
    FarmChalet,
    Studio,
    Land,
    Commercial,
}

impl PropertyType {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Apartment,
            Self::TownHouse,
            Self::VillaPalace,
            Self::WholeBuilding,
            Self::FarmChalet,
            Self::Studio,
            Self::Land,
            Self::Commercial,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Apartment => "apartment",
            Self::TownHouse => "town_house",
            Self::VillaPalace => "villa_palace",
            Self::WholeBuilding => "whole_building",
            Self::FarmChalet => "farm_chalet",
            Self::Studio => "studio",
            Self::Land => "land",
            Self::Commercial => "commercial",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Apartment => "Apartment",
            Self::TownHouse => "Town House",
            Self::VillaPalace => "Villa / Palace",
            Self::WholeBuilding => "Whole Building",
            Self::FarmChalet => "Farm / Chalet",
            Self::Studio => "Studio",
            Self::Land => "Land",
            Self::Commercial => "Commercial",
        }
    }

    /// Resolves free-text type names, including listing-site plurals, to a type.
    pub fn parse(raw: &str) -> Option<Self> {
        property_type_map().get(&fold(raw)).copied()
    }

    /// Category the price model was trained on. Several listing types share one.
    pub const fn model_class(self) -> ModelPropertyClass {
        match self {
            Self::Apartment | Self::Studio | Self::Land | Self::Commercial => {
                ModelPropertyClass::Apartment
            }
            Self::TownHouse => ModelPropertyClass::TownHouse,
            Self::VillaPalace => ModelPropertyClass::VillasAndPalaces,
            Self::WholeBuilding => ModelPropertyClass::WholeBuilding,
            Self::FarmChalet => ModelPropertyClass::FarmsAndChalets,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Property classes understood by the trained model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelPropertyClass {
    Apartment,
    TownHouse,
    VillasAndPalaces,
    WholeBuilding,
    FarmsAndChalets,
}

impl ModelPropertyClass {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Apartment => "apartment",
            Self::TownHouse => "town house",
            Self::VillasAndPalaces => "villas and palaces",
            Self::WholeBuilding => "whole building",
            Self::FarmsAndChalets => "farms and chalets",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    Sale,
    Rent,
}

impl ListingKind {
    pub const fn ordered() -> [Self; 2] {
        [Self::Sale, Self::Rent]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Rent => "rent",
        }
    }

    /// `buy` and `sale` collapse to the same canonical value.
    pub fn parse(raw: &str) -> Option<Self> {
        match fold(raw).as_str() {
            "sale" | "buy" | "sell" | "for sale" | "purchase" => Some(Self::Sale),
            "rent" | "rental" | "lease" | "for rent" => Some(Self::Rent),
            _ => None,
        }
    }
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Furnishing {
    Furnished,
    Unfurnished,
    SemiFurnished,
}

impl Furnishing {
    pub const fn key(self) -> &'static str {
        match self {
            Self::Furnished => "furnished",
            Self::Unfurnished => "unfurnished",
            Self::SemiFurnished => "semi_furnished",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match fold(raw).as_str() {
            "furnished" | "fully furnished" => Some(Self::Furnished),
            "unfurnished" | "not furnished" => Some(Self::Unfurnished),
            "semi furnished" | "semifurnished" | "semi" | "partially furnished" => {
                Some(Self::SemiFurnished)
            }
            _ => None,
        }
    }

    /// Numeric encoding used by the price model.
    pub const fn level(self) -> f64 {
        match self {
            Self::Unfurnished => 0.0,
            Self::SemiFurnished => 0.5,
            Self::Furnished => 1.0,
        }
    }
}

impl fmt::Display for Furnishing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Bedroom count, or the `studio` sentinel that listings use instead of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bedrooms {
    Studio,
    Count(u32),
}

impl Bedrooms {
    pub fn parse(raw: &str) -> Option<Self> {
        let folded = fold(raw);
        if folded == "studio" {
            return Some(Self::Studio);
        }
        folded.parse::<u32>().ok().map(Self::Count)
    }

    /// Count used for filtering, where a studio is equivalent to zero bedrooms.
    pub const fn effective_count(self) -> u32 {
        match self {
            Self::Studio => 0,
            Self::Count(count) => count,
        }
    }

    /// Numeric encoding used by the price model.
    pub fn model_value(self) -> f64 {
        match self {
            Self::Studio => 0.5,
            Self::Count(count) => f64::from(count),
        }
    }
}

impl fmt::Display for Bedrooms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Studio => f.write_str("studio"),
            Self::Count(count) => write!(f, "{count}"),
        }
    }
}

impl Serialize for Bedrooms {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Bedrooms {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Bedrooms::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid bedroom value '{raw}'")))
    }
}

/// Lowercases, trims, and folds `-`, `_` and `/` separators into single spaces.
pub(crate) fn fold(value: &str) -> String {
    let cleaned = value
        .replace(['\u{feff}', '\u{200b}'], "")
        .replace(['-', '_', '/'], " ");
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

static PROPERTY_TYPE_MAP: OnceLock<HashMap<String, PropertyType>> = OnceLock::new();

fn property_type_map() -> &'static HashMap<String, PropertyType> {
    PROPERTY_TYPE_MAP.get_or_init(|| {
        const NAME_TO_TYPE: &[(&str, PropertyType)] = &[
            ("apartment", PropertyType::Apartment),
            ("apartments", PropertyType::Apartment),
            ("flat", PropertyType::Apartment),
            ("apt", PropertyType::Apartment),
            ("town house", PropertyType::TownHouse),
            ("town houses", PropertyType::TownHouse),
            ("townhouse", PropertyType::TownHouse),
            ("townhouses", PropertyType::TownHouse),
            ("villa", PropertyType::VillaPalace),
            ("villas", PropertyType::VillaPalace),
            ("palace", PropertyType::VillaPalace),
            ("villa palace", PropertyType::VillaPalace),
            ("villas and palaces", PropertyType::VillaPalace),
            ("whole building", PropertyType::WholeBuilding),
            ("building", PropertyType::WholeBuilding),
            ("buildings", PropertyType::WholeBuilding),
            ("farm", PropertyType::FarmChalet),
            ("farms", PropertyType::FarmChalet),
            ("chalet", PropertyType::FarmChalet),
            ("chalets", PropertyType::FarmChalet),
            ("farm chalet", PropertyType::FarmChalet),
            ("farms and chalets", PropertyType::FarmChalet),
            ("studio", PropertyType::Studio),
            ("studios", PropertyType::Studio),
            ("land", PropertyType::Land),
            ("lands", PropertyType::Land),
            ("plot", PropertyType::Land),
            ("commercial", PropertyType::Commercial),
            ("shop", PropertyType::Commercial),
            ("office", PropertyType::Commercial),
            ("store", PropertyType::Commercial),
            ("warehouse", PropertyType::Commercial),
            ("showroom", PropertyType::Commercial),
        ];

        NAME_TO_TYPE
            .iter()
            .map(|(name, property_type)| (fold(name), *property_type))
            .collect()
    })
}
