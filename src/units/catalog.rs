//! Unit catalog - static balance data
//!
//! Loaded once at start-up (built-in defaults or a TOML file) and shared
//! read-only with the combat engine and travel-time derivation.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::types::UnitKind;
use crate::units::roster::Roster;

/// Battle domain a unit fights in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Land,
    Naval,
}

/// Balance values for one unit kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    pub attack: f64,
    pub defense: f64,
    /// Distance units per hour before the world-speed factor
    pub speed: f64,
    pub domain: Domain,
    /// Mythical units are never wounded, they are lost outright
    #[serde(default)]
    pub mythical: bool,
    /// Opposing kinds this unit is strong against
    #[serde(default)]
    pub counters: Vec<UnitKind>,
}

impl UnitStats {
    fn new(attack: f64, defense: f64, speed: f64, domain: Domain) -> Self {
        Self {
            attack,
            defense,
            speed,
            domain,
            mythical: false,
            counters: Vec::new(),
        }
    }

    fn mythical(mut self) -> Self {
        self.mythical = true;
        self
    }

    fn countering(mut self, kinds: &[&str]) -> Self {
        self.counters = kinds.iter().map(|k| UnitKind::new(*k)).collect();
        self
    }

    pub fn counters_kind(&self, kind: &UnitKind) -> bool {
        self.counters.contains(kind)
    }

    /// Whether losses of this unit can turn into wounded
    pub fn can_be_wounded(&self) -> bool {
        self.domain == Domain::Land && !self.mythical
    }
}

/// Error type for catalog loading
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Duplicate unit kind: {0}")]
    DuplicateUnit(String),

    #[error("Invalid stats for {0}: {1}")]
    InvalidStats(String, String),
}

/// Catalog of all unit kinds
#[derive(Debug, Clone, Default)]
pub struct UnitCatalog {
    units: AHashMap<UnitKind, UnitStats>,
}

impl UnitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in balance table
    pub fn with_defaults() -> Self {
        use Domain::*;

        let mut catalog = Self::new();
        let mut add = |name: &str, stats: UnitStats| {
            catalog.units.insert(UnitKind::new(name), stats);
        };

        // Land
        add("swordsman", UnitStats::new(5.0, 14.0, 8.0, Land));
        add("slinger", UnitStats::new(23.0, 7.0, 14.0, Land).countering(&["hoplite"]));
        add("archer", UnitStats::new(8.0, 12.0, 12.0, Land).countering(&["slinger"]));
        add("hoplite", UnitStats::new(16.0, 18.0, 6.0, Land).countering(&["swordsman", "horseman"]));
        add("horseman", UnitStats::new(60.0, 18.0, 22.0, Land).countering(&["archer", "slinger"]));
        add("chariot", UnitStats::new(56.0, 76.0, 18.0, Land).countering(&["swordsman"]));
        add("catapult", UnitStats::new(100.0, 30.0, 2.0, Land));

        // Mythical (fight on land)
        add("minotaur", UnitStats::new(650.0, 750.0, 10.0, Land).mythical());
        add("manticore", UnitStats::new(1010.0, 170.0, 22.0, Land).mythical().countering(&["pegasus"]));
        add("cyclops", UnitStats::new(1035.0, 1050.0, 8.0, Land).mythical());
        add("medusa", UnitStats::new(425.0, 480.0, 6.0, Land).mythical().countering(&["hoplite"]));
        add("centaur", UnitStats::new(134.0, 195.0, 18.0, Land).mythical().countering(&["horseman"]));
        add("harpy", UnitStats::new(295.0, 105.0, 28.0, Land).mythical());
        add("pegasus", UnitStats::new(100.0, 750.0, 35.0, Land).mythical().countering(&["harpy"]));

        // Naval
        add("transport_ship", UnitStats::new(0.0, 0.0, 8.0, Naval));
        add("fast_transport", UnitStats::new(0.0, 0.0, 15.0, Naval));
        add("bireme", UnitStats::new(24.0, 160.0, 15.0, Naval).countering(&["attack_ship"]));
        add("attack_ship", UnitStats::new(200.0, 60.0, 13.0, Naval).countering(&["trireme"]));
        add("trireme", UnitStats::new(200.0, 250.0, 15.0, Naval).countering(&["bireme"]));
        add("colony_ship", UnitStats::new(0.0, 0.0, 3.0, Naval));

        catalog
    }

    /// Get stats for a kind
    pub fn get(&self, kind: &UnitKind) -> Option<&UnitStats> {
        self.units.get(kind)
    }

    pub fn contains(&self, kind: &UnitKind) -> bool {
        self.units.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn domain_of(&self, kind: &UnitKind) -> Option<Domain> {
        self.get(kind).map(|s| s.domain)
    }

    /// Units of `roster` that fight in `domain`
    ///
    /// Kinds missing from the catalog take no part in combat.
    pub fn in_domain(&self, roster: &Roster, domain: Domain) -> Roster {
        roster.filtered(|kind| self.domain_of(kind) == Some(domain))
    }

    /// Speed of the slowest known unit in the roster
    pub fn slowest_speed(&self, roster: &Roster) -> Option<f64> {
        roster
            .kinds()
            .filter_map(|kind| self.get(kind))
            .map(|stats| stats.speed)
            .fold(None, |slowest: Option<f64>, speed| match slowest {
                Some(s) if s <= speed => Some(s),
                _ => Some(speed),
            })
    }

    /// Load a catalog from a TOML file
    pub fn load_from_toml(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse a catalog from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, CatalogError> {
        let toml_data: TomlCatalog = toml::from_str(content)?;

        let mut catalog = Self::new();
        for unit in toml_data.units {
            let name = unit.name.clone();
            let stats = unit.into_stats()?;
            if catalog.units.insert(UnitKind::new(name.clone()), stats).is_some() {
                return Err(CatalogError::DuplicateUnit(name));
            }
        }
        Ok(catalog)
    }
}

/// TOML representation of a catalog file
#[derive(Debug, Deserialize)]
struct TomlCatalog {
    units: Vec<TomlUnit>,
}

/// TOML representation of a single unit
#[derive(Debug, Deserialize)]
struct TomlUnit {
    name: String,
    attack: f64,
    defense: f64,
    speed: f64,
    domain: Domain,
    #[serde(default)]
    mythical: bool,
    #[serde(default)]
    counters: Vec<String>,
}

impl TomlUnit {
    fn into_stats(self) -> Result<UnitStats, CatalogError> {
        if self.attack < 0.0 || self.defense < 0.0 {
            return Err(CatalogError::InvalidStats(self.name, "attack and defense must be >= 0".into()));
        }
        if self.speed <= 0.0 || !self.speed.is_finite() {
            return Err(CatalogError::InvalidStats(self.name, "speed must be positive".into()));
        }

        Ok(UnitStats {
            attack: self.attack,
            defense: self.defense,
            speed: self.speed,
            domain: self.domain,
            mythical: self.mythical,
            counters: self.counters.into_iter().map(UnitKind::new).collect(),
        })
    }
}
