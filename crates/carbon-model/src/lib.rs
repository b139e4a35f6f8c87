#![deny(warnings)]

//! Scenario emissions model for the carbon calculator.
//!
//! Maps lever levels to per-sector emissions, the economy-wide total, the
//! reduction against 1990 and a display pathway for charting.
//!
//! Reductions within a sector are additive percentages applied once to the
//! baseline, not compounded. At high ambition the summed percentage can pass
//! 100%, and the sector floor is what keeps the result bounded. This is a
//! deliberate simplification carried over from the calculator, not a
//! physical law.

use carbon_core::{
    Impact, Lever, LeverError, LeverLevel, LeverSettings, ScenarioSnapshot, Sector, SectorProfile,
    BASELINE_1990_MT, HISTORICAL_PATHWAY, PATHWAY_YEARS,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Round half-way values toward positive infinity, e.g. `-2.5 -> -2`, `2.5 -> 3`.
///
/// Displayed figures use this convention rather than `f64::round`, which
/// rounds half-way values away from zero.
pub fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Emissions of one sector for the given lever settings.
///
/// `baseline * (1 - pct / 100) - removal`, clamped at the floor when the
/// sector has one. `pct` sums `Percent` weights and `removal` sums `Removal`
/// amounts, each multiplied by the lever's steps above level 1. A sector with
/// no baseline starts from zero, so it can only go negative.
pub fn apply_reduction(profile: &SectorProfile, settings: &LeverSettings) -> f64 {
    let mut pct = 0.0;
    let mut removal = 0.0;
    for (lever, impact) in profile.levers {
        let steps = f64::from(settings.get(*lever).steps_above_min());
        match impact {
            Impact::Percent(w) => pct += steps * w,
            Impact::Removal(mt) => removal += steps * mt,
        }
    }
    let baseline = profile.baseline.unwrap_or(0.0);
    let value = baseline * (1.0 - pct / 100.0) - removal;
    match profile.floor {
        Some(floor) => value.max(floor),
        None => value,
    }
}

/// Reduction against the 1990 baseline, in whole percent.
///
/// Positive means below 1990. Can exceed 100 or go negative.
pub fn reduction_percent_for(total_mt: f64) -> i64 {
    round_half_up((BASELINE_1990_MT - total_mt) / BASELINE_1990_MT * 100.0)
}

pub fn is_net_zero_total(total_mt: f64) -> bool {
    total_mt <= 0.0
}

/// Emissions per sector in MtCO2e.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SectorEmissions {
    pub transport: f64,
    pub buildings: f64,
    pub industry: f64,
    pub electricity: f64,
    pub co2_removal: f64,
    pub land_use: f64,
}

impl SectorEmissions {
    pub fn get(&self, sector: Sector) -> f64 {
        match sector {
            Sector::Transport => self.transport,
            Sector::Buildings => self.buildings,
            Sector::Industry => self.industry,
            Sector::Electricity => self.electricity,
            Sector::Co2Removal => self.co2_removal,
            Sector::LandUse => self.land_use,
        }
    }

    fn set(&mut self, sector: Sector, value: f64) {
        let slot = match sector {
            Sector::Transport => &mut self.transport,
            Sector::Buildings => &mut self.buildings,
            Sector::Industry => &mut self.industry,
            Sector::Electricity => &mut self.electricity,
            Sector::Co2Removal => &mut self.co2_removal,
            Sector::LandUse => &mut self.land_use,
        };
        *slot = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Sector, f64)> + '_ {
        Sector::ALL.iter().map(move |&s| (s, self.get(s)))
    }

    /// Sum of all six sectors. Not clamped.
    pub fn total(&self) -> f64 {
        self.iter().map(|(_, v)| v).sum()
    }

    /// Bar widths for the sector breakdown, as a percent of the largest
    /// positive sector. CO2 removal has no bar; negative values show as 0.
    pub fn bar_shares(&self) -> Vec<(Sector, f64)> {
        let max_positive = self
            .iter()
            .map(|(_, v)| v)
            .filter(|v| *v > 0.0)
            .fold(0.0_f64, f64::max);
        self.iter()
            .filter(|(s, _)| *s != Sector::Co2Removal)
            .map(|(s, v)| {
                let share = if max_positive > 0.0 {
                    v.max(0.0) / max_positive * 100.0
                } else {
                    0.0
                };
                (s, share)
            })
            .collect()
    }
}

/// Seven-point emissions series for [`PATHWAY_YEARS`], rounded to whole MtCO2e.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pathway(pub [i64; 7]);

impl Pathway {
    pub fn values(&self) -> &[i64; 7] {
        &self.0
    }

    /// `(year, emissions)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (u16, i64)> + '_ {
        PATHWAY_YEARS.iter().copied().zip(self.0.iter().copied())
    }
}

/// Chart pathway ending at `final_mt`.
///
/// The first four points are historical. 2030 and 2040 are interpolated from
/// 2020 toward the final value at a rate driven by mean ambition across all
/// levers. This is cosmetic smoothing for display, not a physical projection.
pub fn pathway(final_mt: f64, average_ambition: f64) -> Pathway {
    if !final_mt.is_finite() {
        warn!(final_mt, "non-finite pathway endpoint");
    }
    let current_2020 = HISTORICAL_PATHWAY[3];
    let rate = 0.5 + (average_ambition - 1.0) * 0.3;
    let gap = current_2020 - final_mt;
    let raw = [
        HISTORICAL_PATHWAY[0],
        HISTORICAL_PATHWAY[1],
        HISTORICAL_PATHWAY[2],
        current_2020,
        current_2020 - gap * 0.3 * rate,
        current_2020 - gap * 0.7 * rate,
        final_mt,
    ];
    Pathway(raw.map(round_half_up))
}

/// Progress bands used to colour the reduction gauge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetBand {
    /// Below an 80% reduction.
    Insufficient,
    /// At least 80% but short of 100%.
    EightyPercent,
    /// 100% or more.
    NetZero,
}

impl TargetBand {
    pub fn from_reduction_percent(pct: i64) -> Self {
        if pct >= 100 {
            TargetBand::NetZero
        } else if pct >= 80 {
            TargetBand::EightyPercent
        } else {
            TargetBand::Insufficient
        }
    }
}

/// Gauge needle angle: -90 at or above 1990 levels, +90 at net zero.
pub fn meter_angle_degrees(reduction_pct: i64) -> f64 {
    if reduction_pct <= 0 {
        -90.0
    } else if reduction_pct >= 100 {
        90.0
    } else {
        -90.0 + reduction_pct as f64 / 100.0 * 180.0
    }
}

/// Everything a caller needs to render a scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub sectors: SectorEmissions,
    pub total_mt: f64,
    pub reduction_percent: i64,
    pub net_zero: bool,
    pub band: TargetBand,
    pub meter_angle_deg: f64,
    pub average_ambition: f64,
    pub pathway: Pathway,
}

/// Live scenario state: the level of every lever.
///
/// All figures are recomputed from the lever map on each query, so the model
/// cannot hold stale or inconsistent results.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmissionsModel {
    levers: LeverSettings,
}

impl EmissionsModel {
    /// All levers at level 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a model from a saved scenario by replaying each lever.
    pub fn from_snapshot(snap: &ScenarioSnapshot) -> Self {
        let mut model = Self::new();
        model.apply_snapshot(snap);
        model
    }

    pub fn apply_snapshot(&mut self, snap: &ScenarioSnapshot) {
        for (lever, level) in snap.levers.iter() {
            self.set_lever(lever, i64::from(level.get()));
        }
    }

    pub fn snapshot(&self, name: impl Into<String>, saved_at: DateTime<Utc>) -> ScenarioSnapshot {
        ScenarioSnapshot {
            name: name.into(),
            saved_at,
            levers: self.levers.clone(),
        }
    }

    pub fn settings(&self) -> &LeverSettings {
        &self.levers
    }

    pub fn level(&self, lever: Lever) -> LeverLevel {
        self.levers.get(lever)
    }

    /// Set one lever, clamping `level` into `[1, 4]`. Returns the stored level.
    pub fn set_lever(&mut self, lever: Lever, level: i64) -> LeverLevel {
        let accepted = LeverLevel::clamped(level);
        if i64::from(accepted.get()) != level {
            warn!(%lever, requested = level, accepted = accepted.get(), "lever level clamped");
        }
        let previous = self.levers.set(lever, accepted);
        debug!(%lever, from = previous.get(), to = accepted.get(), "lever set");
        accepted
    }

    /// Set a lever by its string id. Unknown ids leave the state untouched.
    pub fn set_lever_by_id(&mut self, id: &str, level: i64) -> Result<LeverLevel, LeverError> {
        let lever: Lever = id.parse().map_err(|e| {
            warn!(id, "ignoring unknown lever");
            e
        })?;
        Ok(self.set_lever(lever, level))
    }

    pub fn reset_all(&mut self) {
        self.levers = LeverSettings::uniform(LeverLevel::MIN);
        debug!("all levers reset");
    }

    pub fn set_max_ambition(&mut self) {
        self.levers = LeverSettings::uniform(LeverLevel::MAX);
        debug!("all levers at maximum ambition");
    }

    pub fn sector_emissions(&self) -> SectorEmissions {
        let mut out = SectorEmissions::default();
        for sector in Sector::ALL {
            out.set(sector, apply_reduction(sector.profile(), &self.levers));
        }
        out
    }

    pub fn total_emissions(&self) -> f64 {
        self.sector_emissions().total()
    }

    pub fn reduction_percent(&self) -> i64 {
        reduction_percent_for(self.total_emissions())
    }

    pub fn is_net_zero(&self) -> bool {
        is_net_zero_total(self.total_emissions())
    }

    /// Mean level over all 24 levers, regardless of sector.
    pub fn average_ambition(&self) -> f64 {
        self.levers.mean_level()
    }

    /// Chart pathway ending at `final_mt`, shaped by the current levers.
    pub fn pathway(&self, final_mt: f64) -> Pathway {
        pathway(final_mt, self.average_ambition())
    }

    pub fn report(&self) -> ScenarioReport {
        let sectors = self.sector_emissions();
        let total_mt = sectors.total();
        let reduction_percent = reduction_percent_for(total_mt);
        ScenarioReport {
            sectors,
            total_mt,
            reduction_percent,
            net_zero: is_net_zero_total(total_mt),
            band: TargetBand::from_reduction_percent(reduction_percent),
            meter_angle_deg: meter_angle_degrees(reduction_percent),
            average_ambition: self.average_ambition(),
            pathway: self.pathway(total_mt),
        }
    }
}
