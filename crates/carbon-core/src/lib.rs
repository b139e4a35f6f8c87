#![deny(warnings)]

//! Core domain types for the carbon calculator.
//!
//! This crate defines the fixed lever/sector table, the lever level newtype
//! that guarantees the `[1, 4]` range, and the serializable scenario shapes
//! shared by the model and its callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 1990 economy-wide emissions in MtCO2e. Reduction percentages are always
/// measured against this value.
pub const BASELINE_1990_MT: f64 = 700.0;

/// Years plotted on the emissions pathway chart.
pub const PATHWAY_YEARS: [u16; 7] = [1990, 2000, 2010, 2020, 2030, 2040, 2050];

/// Historical emissions for 1990, 2000, 2010 and 2020 in MtCO2e.
pub const HISTORICAL_PATHWAY: [f64; 4] = [700.0, 650.0, 580.0, 520.0];

/// Errors raised when addressing or setting a lever.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LeverError {
    /// Identifier does not name one of the 24 levers.
    #[error("unknown lever: {0}")]
    UnknownLever(String),
    /// Level outside `[1, 4]` where clamping is not applied.
    #[error("lever level {0} is out of range [1, 4]")]
    LevelOutOfRange(i64),
}

/// Validation errors for saved scenarios.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Scenario name is empty or whitespace.
    #[error("scenario name must not be blank")]
    BlankName,
    /// A lever is absent from the saved mapping.
    #[error("scenario is missing lever: {0}")]
    MissingLever(Lever),
    /// The snapshot could not be parsed.
    #[error("malformed snapshot: {0}")]
    Malformed(String),
}

/// One of the six emissions sectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sector {
    Transport,
    Buildings,
    Industry,
    Electricity,
    Co2Removal,
    LandUse,
}

impl Sector {
    /// All sectors in display order.
    pub const ALL: [Sector; 6] = [
        Sector::Transport,
        Sector::Buildings,
        Sector::Industry,
        Sector::Electricity,
        Sector::Co2Removal,
        Sector::LandUse,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Sector::Transport => "transport",
            Sector::Buildings => "buildings",
            Sector::Industry => "industry",
            Sector::Electricity => "electricity",
            Sector::Co2Removal => "co2-removal",
            Sector::LandUse => "land-use",
        }
    }

    /// Static baseline, floor and lever weights for this sector.
    pub fn profile(self) -> &'static SectorProfile {
        match self {
            Sector::Transport => &TRANSPORT,
            Sector::Buildings => &BUILDINGS,
            Sector::Industry => &INDUSTRY,
            Sector::Electricity => &ELECTRICITY,
            Sector::Co2Removal => &CO2_REMOVAL,
            Sector::LandUse => &LAND_USE,
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A policy or technology dial. Each lever belongs to exactly one sector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Lever {
    // Transport
    ElectricCars,
    PublicTransport,
    ActiveTravel,
    Aviation,
    Freight,
    // Buildings
    BuildingTemp,
    Insulation,
    HeatPumps,
    DistrictHeat,
    Appliances,
    // Industry
    IndustrialEfficiency,
    Steel,
    Cement,
    Chemicals,
    // Electricity
    Wind,
    Solar,
    Nuclear,
    Storage,
    // CO2 removal
    DirectAirCapture,
    Ccs,
    Methane,
    // Land use
    Afforestation,
    Bioenergy,
    Agriculture,
}

impl Lever {
    pub const ALL: [Lever; 24] = [
        Lever::ElectricCars,
        Lever::PublicTransport,
        Lever::ActiveTravel,
        Lever::Aviation,
        Lever::Freight,
        Lever::BuildingTemp,
        Lever::Insulation,
        Lever::HeatPumps,
        Lever::DistrictHeat,
        Lever::Appliances,
        Lever::IndustrialEfficiency,
        Lever::Steel,
        Lever::Cement,
        Lever::Chemicals,
        Lever::Wind,
        Lever::Solar,
        Lever::Nuclear,
        Lever::Storage,
        Lever::DirectAirCapture,
        Lever::Ccs,
        Lever::Methane,
        Lever::Afforestation,
        Lever::Bioenergy,
        Lever::Agriculture,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Lever::ElectricCars => "electric-cars",
            Lever::PublicTransport => "public-transport",
            Lever::ActiveTravel => "active-travel",
            Lever::Aviation => "aviation",
            Lever::Freight => "freight",
            Lever::BuildingTemp => "building-temp",
            Lever::Insulation => "insulation",
            Lever::HeatPumps => "heat-pumps",
            Lever::DistrictHeat => "district-heat",
            Lever::Appliances => "appliances",
            Lever::IndustrialEfficiency => "industrial-efficiency",
            Lever::Steel => "steel",
            Lever::Cement => "cement",
            Lever::Chemicals => "chemicals",
            Lever::Wind => "wind",
            Lever::Solar => "solar",
            Lever::Nuclear => "nuclear",
            Lever::Storage => "storage",
            Lever::DirectAirCapture => "direct-air-capture",
            Lever::Ccs => "ccs",
            Lever::Methane => "methane",
            Lever::Afforestation => "afforestation",
            Lever::Bioenergy => "bioenergy",
            Lever::Agriculture => "agriculture",
        }
    }

    /// The sector whose emissions this lever affects.
    pub fn sector(self) -> Sector {
        match self {
            Lever::ElectricCars
            | Lever::PublicTransport
            | Lever::ActiveTravel
            | Lever::Aviation
            | Lever::Freight => Sector::Transport,
            Lever::BuildingTemp
            | Lever::Insulation
            | Lever::HeatPumps
            | Lever::DistrictHeat
            | Lever::Appliances => Sector::Buildings,
            Lever::IndustrialEfficiency | Lever::Steel | Lever::Cement | Lever::Chemicals => {
                Sector::Industry
            }
            Lever::Wind | Lever::Solar | Lever::Nuclear | Lever::Storage => Sector::Electricity,
            Lever::DirectAirCapture | Lever::Ccs | Lever::Methane => Sector::Co2Removal,
            Lever::Afforestation | Lever::Bioenergy | Lever::Agriculture => Sector::LandUse,
        }
    }

    /// Per-step impact of this lever on its sector.
    pub fn impact(self) -> Impact {
        self.sector()
            .profile()
            .levers
            .iter()
            .find(|(l, _)| *l == self)
            .map(|(_, impact)| *impact)
            .unwrap_or(Impact::Percent(0.0))
    }
}

impl fmt::Display for Lever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lever {
    type Err = LeverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim();
        Lever::ALL
            .iter()
            .copied()
            .find(|l| l.as_str() == id)
            .ok_or_else(|| LeverError::UnknownLever(id.to_string()))
    }
}

/// Ambition level of a lever, always within `[1, 4]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LeverLevel(u8);

impl LeverLevel {
    /// Minimal effort.
    pub const MIN: LeverLevel = LeverLevel(1);
    /// Maximum ambition.
    pub const MAX: LeverLevel = LeverLevel(4);

    /// Build a level, clamping anything outside `[1, 4]` to the nearest bound.
    pub fn clamped(level: i64) -> Self {
        LeverLevel(level.clamp(Self::MIN.0 as i64, Self::MAX.0 as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Number of steps above level 1; this is what lever weights multiply.
    pub fn steps_above_min(self) -> u8 {
        self.0 - Self::MIN.0
    }

    /// Fill fraction of the lever's progress ring, `level / 4`.
    pub fn ambition_fraction(self) -> f64 {
        f64::from(self.0) / f64::from(Self::MAX.0)
    }
}

impl Default for LeverLevel {
    fn default() -> Self {
        Self::MIN
    }
}

impl TryFrom<u8> for LeverLevel {
    type Error = LeverError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN.0..=Self::MAX.0).contains(&value) {
            Ok(LeverLevel(value))
        } else {
            Err(LeverError::LevelOutOfRange(value as i64))
        }
    }
}

impl From<LeverLevel> for u8 {
    fn from(level: LeverLevel) -> Self {
        level.0
    }
}

impl fmt::Display for LeverLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Effect of one lever step on the owning sector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Impact {
    /// Percentage points of the sector baseline removed per step.
    Percent(f64),
    /// MtCO2e subtracted directly per step.
    Removal(f64),
}

/// Fixed constants describing how a sector responds to its levers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectorProfile {
    pub sector: Sector,
    /// Emissions with every lever at level 1. `None` for pure-removal sectors.
    pub baseline: Option<f64>,
    /// Lowest value the sector may reach. `None` means unbounded below.
    pub floor: Option<f64>,
    pub levers: &'static [(Lever, Impact)],
}

static TRANSPORT: SectorProfile = SectorProfile {
    sector: Sector::Transport,
    baseline: Some(180.0),
    floor: Some(20.0),
    levers: &[
        (Lever::ElectricCars, Impact::Percent(15.0)),
        (Lever::PublicTransport, Impact::Percent(8.0)),
        (Lever::ActiveTravel, Impact::Percent(5.0)),
        (Lever::Aviation, Impact::Percent(10.0)),
        (Lever::Freight, Impact::Percent(7.0)),
    ],
};

static BUILDINGS: SectorProfile = SectorProfile {
    sector: Sector::Buildings,
    baseline: Some(120.0),
    floor: Some(15.0),
    levers: &[
        (Lever::BuildingTemp, Impact::Percent(5.0)),
        (Lever::Insulation, Impact::Percent(12.0)),
        (Lever::HeatPumps, Impact::Percent(15.0)),
        (Lever::DistrictHeat, Impact::Percent(8.0)),
        (Lever::Appliances, Impact::Percent(6.0)),
    ],
};

static INDUSTRY: SectorProfile = SectorProfile {
    sector: Sector::Industry,
    baseline: Some(160.0),
    floor: Some(25.0),
    levers: &[
        (Lever::IndustrialEfficiency, Impact::Percent(8.0)),
        (Lever::Steel, Impact::Percent(12.0)),
        (Lever::Cement, Impact::Percent(10.0)),
        (Lever::Chemicals, Impact::Percent(9.0)),
    ],
};

static ELECTRICITY: SectorProfile = SectorProfile {
    sector: Sector::Electricity,
    baseline: Some(150.0),
    floor: Some(5.0),
    levers: &[
        (Lever::Wind, Impact::Percent(20.0)),
        (Lever::Solar, Impact::Percent(15.0)),
        (Lever::Nuclear, Impact::Percent(18.0)),
        (Lever::Storage, Impact::Percent(5.0)),
    ],
};

static CO2_REMOVAL: SectorProfile = SectorProfile {
    sector: Sector::Co2Removal,
    baseline: None,
    floor: None,
    levers: &[
        (Lever::DirectAirCapture, Impact::Removal(20.0)),
        (Lever::Ccs, Impact::Removal(15.0)),
        (Lever::Methane, Impact::Removal(8.0)),
    ],
};

static LAND_USE: SectorProfile = SectorProfile {
    sector: Sector::LandUse,
    baseline: Some(50.0),
    floor: Some(-20.0),
    levers: &[
        (Lever::Afforestation, Impact::Removal(15.0)),
        (Lever::Bioenergy, Impact::Percent(8.0)),
        (Lever::Agriculture, Impact::Percent(6.0)),
    ],
};

/// Level of every lever. Missing entries read as level 1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeverSettings(BTreeMap<Lever, LeverLevel>);

impl Default for LeverSettings {
    fn default() -> Self {
        Self::uniform(LeverLevel::MIN)
    }
}

impl LeverSettings {
    /// Every lever at the same level.
    pub fn uniform(level: LeverLevel) -> Self {
        LeverSettings(Lever::ALL.iter().map(|&l| (l, level)).collect())
    }

    pub fn get(&self, lever: Lever) -> LeverLevel {
        self.0.get(&lever).copied().unwrap_or(LeverLevel::MIN)
    }

    /// Store a level, returning the previous one.
    pub fn set(&mut self, lever: Lever, level: LeverLevel) -> LeverLevel {
        self.0.insert(lever, level).unwrap_or(LeverLevel::MIN)
    }

    /// Levers in table order with their current levels.
    pub fn iter(&self) -> impl Iterator<Item = (Lever, LeverLevel)> + '_ {
        Lever::ALL.iter().map(move |&l| (l, self.get(l)))
    }

    /// First lever with no explicit entry, if any.
    pub fn first_missing(&self) -> Option<Lever> {
        Lever::ALL.iter().copied().find(|l| !self.0.contains_key(l))
    }

    /// Mean level over all 24 levers, in `[1, 4]`.
    pub fn mean_level(&self) -> f64 {
        let sum: u32 = self.iter().map(|(_, lvl)| u32::from(lvl.get())).sum();
        f64::from(sum) / Lever::ALL.len() as f64
    }
}

/// A named, timestamped copy of the full lever mapping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSnapshot {
    pub name: String,
    pub saved_at: DateTime<Utc>,
    pub levers: LeverSettings,
}

impl ScenarioSnapshot {
    /// Parse and validate a snapshot from JSON.
    pub fn from_json(text: &str) -> Result<Self, ValidationError> {
        let snap: ScenarioSnapshot =
            serde_json::from_str(text).map_err(|e| ValidationError::Malformed(e.to_string()))?;
        validate_snapshot(&snap)?;
        Ok(snap)
    }

    pub fn to_json_pretty(&self) -> Result<String, ValidationError> {
        serde_json::to_string_pretty(self).map_err(|e| ValidationError::Malformed(e.to_string()))
    }
}

/// Validate a saved scenario: non-blank name and all 24 levers present.
pub fn validate_snapshot(snap: &ScenarioSnapshot) -> Result<(), ValidationError> {
    if snap.name.trim().is_empty() {
        return Err(ValidationError::BlankName);
    }
    if let Some(lever) = snap.levers.first_missing() {
        return Err(ValidationError::MissingLever(lever));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn snapshot(name: &str) -> ScenarioSnapshot {
        ScenarioSnapshot {
            name: name.to_string(),
            saved_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            levers: LeverSettings::default(),
        }
    }

    #[test]
    fn sector_membership_matches_table() {
        let counts: Vec<usize> = Sector::ALL
            .iter()
            .map(|s| s.profile().levers.len())
            .collect();
        assert_eq!(counts, vec![5, 5, 4, 4, 3, 3]);
        for sector in Sector::ALL {
            let profile = sector.profile();
            assert_eq!(profile.sector, sector);
            for (lever, _) in profile.levers {
                assert_eq!(lever.sector(), sector, "{lever} listed under {sector}");
            }
        }
        let total: usize = counts.iter().sum();
        assert_eq!(total, Lever::ALL.len());
    }

    #[test]
    fn lever_ids_parse_and_match_serde() {
        for lever in Lever::ALL {
            assert_eq!(lever.as_str().parse::<Lever>().unwrap(), lever);
            let json = serde_json::to_string(&lever).unwrap();
            assert_eq!(json, format!("\"{}\"", lever.as_str()));
        }
        for sector in Sector::ALL {
            let json = serde_json::to_string(&sector).unwrap();
            assert_eq!(json, format!("\"{}\"", sector.as_str()));
        }
    }

    #[test]
    fn unknown_lever_is_rejected() {
        assert_eq!(
            "hyperloop".parse::<Lever>(),
            Err(LeverError::UnknownLever("hyperloop".to_string()))
        );
    }

    #[test]
    fn removal_sectors_have_expected_bounds() {
        let co2 = Sector::Co2Removal.profile();
        assert!(co2.baseline.is_none() && co2.floor.is_none());
        assert_eq!(Sector::LandUse.profile().floor, Some(-20.0));
        assert_eq!(Lever::Afforestation.impact(), Impact::Removal(15.0));
        assert_eq!(Lever::Wind.impact(), Impact::Percent(20.0));
    }

    #[test]
    fn level_try_from_rejects_out_of_range() {
        assert!(LeverLevel::try_from(0).is_err());
        assert!(LeverLevel::try_from(5).is_err());
        assert_eq!(LeverLevel::try_from(3).unwrap().get(), 3);
        assert!(serde_json::from_str::<LeverLevel>("7").is_err());
    }

    #[test]
    fn default_settings_are_minimal() {
        let settings = LeverSettings::default();
        assert!(settings.first_missing().is_none());
        assert!(settings.iter().all(|(_, lvl)| lvl == LeverLevel::MIN));
        assert_eq!(settings.mean_level(), 1.0);
        assert_eq!(LeverSettings::uniform(LeverLevel::MAX).mean_level(), 4.0);
    }

    #[test]
    fn snapshot_json_roundtrip_validates() {
        let mut snap = snapshot("Windy");
        snap.levers.set(Lever::Wind, LeverLevel::MAX);
        let text = snap.to_json_pretty().unwrap();
        assert!(text.contains("\"wind\": 4"));
        let back = ScenarioSnapshot::from_json(&text).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn snapshot_validation_errors() {
        assert_eq!(
            validate_snapshot(&snapshot("   ")),
            Err(ValidationError::BlankName)
        );
        let partial = r#"{"name":"x","saved_at":"2024-03-01T12:00:00Z","levers":{"wind":2}}"#;
        assert_eq!(
            ScenarioSnapshot::from_json(partial),
            Err(ValidationError::MissingLever(Lever::ElectricCars))
        );
        let bad_level = r#"{"name":"x","saved_at":"2024-03-01T12:00:00Z","levers":{"wind":9}}"#;
        assert!(matches!(
            ScenarioSnapshot::from_json(bad_level),
            Err(ValidationError::Malformed(_))
        ));
    }

    proptest! {
        #[test]
        fn clamped_is_always_in_range(raw in any::<i64>()) {
            let lvl = LeverLevel::clamped(raw);
            prop_assert!((1..=4).contains(&lvl.get()));
            if (1..=4).contains(&raw) {
                prop_assert_eq!(i64::from(lvl.get()), raw);
            }
        }

        #[test]
        fn mean_level_is_bounded(levels in proptest::collection::vec(1u8..=4, 24)) {
            let mut settings = LeverSettings::default();
            for (lever, lvl) in Lever::ALL.iter().zip(levels) {
                settings.set(*lever, LeverLevel::try_from(lvl).unwrap());
            }
            let mean = settings.mean_level();
            prop_assert!((1.0..=4.0).contains(&mean));
        }
    }
}
