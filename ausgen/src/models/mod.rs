//! Domain models shared by the steps.
//!
//! - [`State`] - the eight Australian states and territories
//! - [`Jurisdiction`] - a state or the national total
//! - [`Technology`] - renewable technology category
//! - [`POPULATION_JUNE_2024`] - ABS estimated resident population

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// States and territories
// =============================================================================

/// Australian state or territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum State {
    NewSouthWales,
    Victoria,
    Queensland,
    SouthAustralia,
    WesternAustralia,
    Tasmania,
    NorthernTerritory,
    AustralianCapitalTerritory,
}

impl State {
    /// All jurisdictions in ABS publication order.
    pub const ALL: [State; 8] = [
        State::NewSouthWales,
        State::Victoria,
        State::Queensland,
        State::SouthAustralia,
        State::WesternAustralia,
        State::Tasmania,
        State::NorthernTerritory,
        State::AustralianCapitalTerritory,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            State::NewSouthWales => "New South Wales",
            State::Victoria => "Victoria",
            State::Queensland => "Queensland",
            State::SouthAustralia => "South Australia",
            State::WesternAustralia => "Western Australia",
            State::Tasmania => "Tasmania",
            State::NorthernTerritory => "Northern Territory",
            State::AustralianCapitalTerritory => "Australian Capital Territory",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            State::NewSouthWales => "NSW",
            State::Victoria => "VIC",
            State::Queensland => "QLD",
            State::SouthAustralia => "SA",
            State::WesternAustralia => "WA",
            State::Tasmania => "TAS",
            State::NorthernTerritory => "NT",
            State::AustralianCapitalTerritory => "ACT",
        }
    }

    /// Parse a full name or abbreviation, including the short forms used in
    /// Australian Energy Statistics headers (`Vic`, `Qld`, `Tas`).
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = label.trim().trim_end_matches('.').to_lowercase();
        let state = match normalized.as_str() {
            "nsw" | "new south wales" => State::NewSouthWales,
            "vic" | "victoria" => State::Victoria,
            "qld" | "queensland" => State::Queensland,
            "sa" | "south australia" => State::SouthAustralia,
            "wa" | "western australia" => State::WesternAustralia,
            "tas" | "tasmania" => State::Tasmania,
            "nt" | "northern territory" => State::NorthernTerritory,
            "act" | "australian capital territory" => State::AustralianCapitalTerritory,
            _ => return None,
        };
        Some(state)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Jurisdiction (state or national total)
// =============================================================================

/// Column heading in a state summary: a state or the national total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Jurisdiction {
    State(State),
    Australia,
}

impl Jurisdiction {
    pub fn parse(label: &str) -> Option<Self> {
        if let Some(state) = State::parse(label) {
            return Some(Jurisdiction::State(state));
        }
        match label.trim().trim_end_matches('.').to_lowercase().as_str() {
            "australia" | "aust" | "aus" | "total australia" => Some(Jurisdiction::Australia),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Jurisdiction::State(s) => s.name(),
            Jurisdiction::Australia => "Australia",
        }
    }
}

// =============================================================================
// Technology
// =============================================================================

/// Renewable technology category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Technology {
    Solar,
    Wind,
    Hydro,
    Bioenergy,
}

impl Technology {
    pub fn label(&self) -> &'static str {
        match self {
            Technology::Solar => "Solar",
            Technology::Wind => "Wind",
            Technology::Hydro => "Hydro",
            Technology::Bioenergy => "Bioenergy",
        }
    }

    /// Classify a free-text fuel source field.
    ///
    /// Rules are applied in order and a later match overrides an earlier one,
    /// so `"Solar, Biomass"` is Bioenergy.
    pub fn classify_fuel_source(fuel: &str) -> Option<Self> {
        const RULES: [(&str, Technology); 3] = [
            ("Solar", Technology::Solar),
            ("Hydro", Technology::Hydro),
            ("Biomass", Technology::Bioenergy),
        ];
        RULES
            .iter()
            .filter(|(needle, _)| fuel.contains(needle))
            .map(|(_, tech)| *tech)
            .last()
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Population
// =============================================================================

/// ABS estimated resident population, June 2024.
pub const POPULATION_JUNE_2024: [(State, u64); 8] = [
    (State::NewSouthWales, 8_484_400),
    (State::Victoria, 6_981_400),
    (State::Queensland, 5_586_300),
    (State::SouthAustralia, 1_878_000),
    (State::WesternAustralia, 2_965_200),
    (State::Tasmania, 575_400),
    (State::NorthernTerritory, 255_100),
    (State::AustralianCapitalTerritory, 474_100),
];
