//! What-if scenario simulation
//!
//! Each scenario perturbs exactly one factor of a vessel's baseline score and
//! reports the projected composite score. Stored vessel data is never touched.

use crate::error::{Result, ValidationError};
use crate::factors::compute_age_factor;
use crate::scoring::RiskScoreEngine;
use crate::types::{RiskLevel, VesselRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// History factor multiplier for crew training (20% reduction)
pub const TRAINING_HISTORY_MULTIPLIER: f64 = 0.8;
/// History factor multiplier for enhanced maintenance (30% reduction)
pub const MAINTENANCE_HISTORY_MULTIPLIER: f64 = 0.7;
/// MOU factor multiplier under a stricter regime
pub const STRICTER_MOU_MULTIPLIER: f64 = 1.15;
/// MOU factor multiplier under a relaxed regime
pub const RELAXED_MOU_MULTIPLIER: f64 = 0.85;

/// Hypothetical change to one risk factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scenario {
    /// Crew training program
    Training,
    /// Enhanced maintenance program
    Maintenance,
    /// Change in regulatory regime
    Regulatory {
        /// Stricter (true) or relaxed (false)
        stricter: bool,
    },
    /// Vessel grows older
    Aging {
        /// Years added to the vessel's age
        delta_years: f64,
    },
}

impl Scenario {
    /// Stable scenario name
    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Training => "training",
            Scenario::Maintenance => "maintenance",
            Scenario::Regulatory { stricter: true } => "regulatory_stricter",
            Scenario::Regulatory { stricter: false } => "regulatory_relaxed",
            Scenario::Aging { .. } => "aging",
        }
    }

    /// Program cost when the scenario is a mitigation measure
    pub fn mitigation_cost(&self, roi: &RoiConfig) -> Option<Decimal> {
        match self {
            Scenario::Training => Some(roi.training_cost),
            Scenario::Maintenance => Some(roi.maintenance_cost),
            Scenario::Regulatory { stricter: false } => Some(roi.regulatory_cost),
            Scenario::Regulatory { stricter: true } | Scenario::Aging { .. } => None,
        }
    }
}

/// Cost model for mitigation return-on-investment estimates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    /// Crew training program cost
    pub training_cost: Decimal,
    /// Enhanced maintenance program cost
    pub maintenance_cost: Decimal,
    /// Flag / regulatory change cost
    pub regulatory_cost: Decimal,
    /// Annual savings per point of risk reduction
    pub savings_per_point: Decimal,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            training_cost: Decimal::from(50_000),
            maintenance_cost: Decimal::from(200_000),
            regulatory_cost: Decimal::from(25_000),
            savings_per_point: Decimal::from(5_000),
        }
    }
}

/// Outcome of one scenario on one vessel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario applied
    pub scenario_name: String,
    /// Vessel id
    pub vessel_id: String,
    /// Baseline composite score
    pub original_score: u8,
    /// Composite score after the change
    pub projected_score: u8,
    /// projected - original; negative means risk went down
    pub delta: i16,
    /// Baseline level
    pub original_level: RiskLevel,
    /// Level after the change
    pub projected_level: RiskLevel,
}

impl ScenarioResult {
    /// True when the scenario lowers the score
    pub fn is_improvement(&self) -> bool {
        self.delta < 0
    }
}

/// Return on investment of a mitigation scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiEstimate {
    /// Program cost
    pub estimated_cost: Decimal,
    /// Savings per year from the average risk reduction
    pub annual_savings: Decimal,
    /// Years to recover the cost; absent without savings
    pub payback_period_years: Option<Decimal>,
    /// Five-year return in percent
    pub roi_5_year_pct: Decimal,
}

impl RoiEstimate {
    fn estimate(cost: Decimal, average_reduction: Decimal, config: &RoiConfig) -> Self {
        let annual_savings = (average_reduction * config.savings_per_point).round_dp(0);

        let payback_period_years = if annual_savings > Decimal::ZERO {
            Some((cost / annual_savings).round_dp(1))
        } else {
            None
        };

        let roi_5_year_pct = if cost > Decimal::ZERO {
            ((annual_savings * Decimal::from(5) - cost) / cost * Decimal::from(100)).round_dp(1)
        } else {
            Decimal::ZERO
        };

        Self {
            estimated_cost: cost,
            annual_savings,
            payback_period_years,
            roi_5_year_pct,
        }
    }
}

/// How many vessels moved between risk levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelChanges {
    /// Projected level below the baseline level
    pub improved: usize,
    /// Same level before and after
    pub unchanged: usize,
    /// Projected level above the baseline level
    pub worsened: usize,
}

impl LevelChanges {
    fn tally(results: &[ScenarioResult]) -> Self {
        results.iter().fold(Self::default(), |mut changes, result| {
            match result.projected_level.cmp(&result.original_level) {
                Ordering::Less => changes.improved += 1,
                Ordering::Equal => changes.unchanged += 1,
                Ordering::Greater => changes.worsened += 1,
            }
            changes
        })
    }
}

/// Fleet-wide outcome of one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    /// Scenario applied
    pub scenario_name: String,
    /// Per-vessel outcomes
    pub results: Vec<ScenarioResult>,
    /// Vessels simulated
    pub total_vessels: usize,
    /// Vessels whose score went down
    pub vessels_improved: usize,
    /// Share of vessels improved, percent
    pub improvement_rate_pct: Decimal,
    /// Sum of all deltas
    pub total_delta: i64,
    /// Mean delta
    pub average_delta: Decimal,
    /// Risk level movements across the fleet
    pub level_changes: LevelChanges,
    /// Present for mitigation scenarios
    pub roi: Option<RoiEstimate>,
}

/// Re-runs the scoring formula under hypothetical factor changes
#[derive(Debug, Clone, Default)]
pub struct ScenarioSimulator {
    engine: RiskScoreEngine,
    roi: RoiConfig,
}

impl ScenarioSimulator {
    /// Create simulator
    pub fn new(engine: RiskScoreEngine, roi: RoiConfig) -> Self {
        Self { engine, roi }
    }

    /// Apply any scenario to one vessel
    pub fn simulate(&self, vessel: &VesselRecord, scenario: Scenario) -> Result<ScenarioResult> {
        if let Scenario::Aging { delta_years } = scenario {
            if !delta_years.is_finite() {
                return Err(ValidationError::NonFiniteParameter("delta_years").into());
            }
        }
        Ok(self.project(vessel, scenario))
    }

    fn project(&self, vessel: &VesselRecord, scenario: Scenario) -> ScenarioResult {
        let baseline = self.engine.compute_score(vessel, None);
        let mut factors = baseline.factors;

        match scenario {
            Scenario::Training => factors.history_factor *= TRAINING_HISTORY_MULTIPLIER,
            Scenario::Maintenance => factors.history_factor *= MAINTENANCE_HISTORY_MULTIPLIER,
            Scenario::Regulatory { stricter } => {
                let multiplier = if stricter {
                    STRICTER_MOU_MULTIPLIER
                } else {
                    RELAXED_MOU_MULTIPLIER
                };
                factors.mou_factor = (factors.mou_factor * multiplier).clamp(0.0, 1.0);
            }
            Scenario::Aging { delta_years } => {
                factors.age_factor = compute_age_factor(vessel.age_years() + delta_years);
            }
        }

        let projected = self.engine.score_factors(vessel.vessel_id(), factors);
        let original_score = baseline.composite_score.score();
        let projected_score = projected.composite_score.score();

        ScenarioResult {
            scenario_name: scenario.name().to_string(),
            vessel_id: vessel.vessel_id().to_string(),
            original_score,
            projected_score,
            delta: i16::from(projected_score) - i16::from(original_score),
            original_level: baseline.risk_level,
            projected_level: projected.risk_level,
        }
    }

    /// History factor reduced by 20%
    pub fn simulate_training(&self, vessel: &VesselRecord) -> ScenarioResult {
        self.project(vessel, Scenario::Training)
    }

    /// History factor reduced by 30%
    pub fn simulate_maintenance(&self, vessel: &VesselRecord) -> ScenarioResult {
        self.project(vessel, Scenario::Maintenance)
    }

    /// MOU factor scaled up 15% (stricter) or down 15% (relaxed)
    pub fn simulate_regulatory(&self, vessel: &VesselRecord, stricter: bool) -> ScenarioResult {
        self.project(vessel, Scenario::Regulatory { stricter })
    }

    /// Age factor recomputed at `age + delta_years`
    pub fn simulate_aging(&self, vessel: &VesselRecord, delta_years: f64) -> Result<ScenarioResult> {
        self.simulate(vessel, Scenario::Aging { delta_years })
    }

    /// Apply a scenario to every vessel and summarize the impact
    pub fn simulate_fleet(
        &self,
        vessels: &[VesselRecord],
        scenario: Scenario,
    ) -> Result<ScenarioSummary> {
        let results = vessels
            .iter()
            .map(|vessel| self.simulate(vessel, scenario))
            .collect::<Result<Vec<_>>>()?;

        let total_vessels = results.len();
        let vessels_improved = results.iter().filter(|r| r.is_improvement()).count();
        let total_delta: i64 = results.iter().map(|r| i64::from(r.delta)).sum();
        let level_changes = LevelChanges::tally(&results);

        let (average_delta, improvement_rate_pct) = if total_vessels > 0 {
            let n = Decimal::from(total_vessels as u64);
            (
                (Decimal::from(total_delta) / n).round_dp(2),
                (Decimal::from(vessels_improved as u64) * Decimal::from(100) / n).round_dp(1),
            )
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };

        let roi = scenario
            .mitigation_cost(&self.roi)
            .map(|cost| RoiEstimate::estimate(cost, -average_delta, &self.roi));

        tracing::info!(
            scenario = scenario.name(),
            vessels = total_vessels,
            improved = vessels_improved,
            total_delta,
            level_improved = level_changes.improved,
            level_worsened = level_changes.worsened,
            "Fleet scenario simulated"
        );

        Ok(ScenarioSummary {
            scenario_name: scenario.name().to_string(),
            results,
            total_vessels,
            vessels_improved,
            improvement_rate_pct,
            total_delta,
            average_delta,
            level_changes,
            roi,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::InspectionHistory;
    use std::str::FromStr;

    fn vessel(id: &str, age: f64, flag: &str, history: (i64, i64, i64)) -> VesselRecord {
        let history = InspectionHistory::new(history.0, history.1, history.2).unwrap();
        VesselRecord::new(id, id, age, flag, "Bulk", history).unwrap()
    }

    #[test]
    fn test_training_and_maintenance_reduce_risk() {
        let simulator = ScenarioSimulator::default();
        let v = vessel("YS", 33.5, "Panama", (1, 8, 1));

        let training = simulator.simulate_training(&v);
        assert_eq!(training.original_score, 86);
        // H 1.0 -> 0.8: 0.335 + 0.32 + 0.12
        assert_eq!(training.projected_score, 78);
        assert_eq!(training.delta, -8);
        assert!(training.is_improvement());
        assert_eq!(training.projected_level, RiskLevel::High);

        let maintenance = simulator.simulate_maintenance(&v);
        assert_eq!(maintenance.projected_score, 74);
        assert!(maintenance.projected_score <= training.projected_score);
    }

    #[test]
    fn test_regulatory_scales_mou() {
        let simulator = ScenarioSimulator::default();
        let v = vessel("YS", 33.5, "Panama", (1, 8, 1));

        let stricter = simulator.simulate_regulatory(&v, true);
        let relaxed = simulator.simulate_regulatory(&v, false);
        assert_eq!(stricter.scenario_name, "regulatory_stricter");
        assert!(stricter.delta >= 0);
        assert!(relaxed.delta <= 0);
    }

    #[test]
    fn test_aging_clamps_at_reference_lifetime() {
        let simulator = ScenarioSimulator::default();
        let v = vessel("OLD", 39.0, "Korea", (2, 0, 0));

        // A 0.975 -> 1.0
        let result = simulator.simulate_aging(&v, 1.0).unwrap();
        assert_eq!(result.original_score, 41);
        assert_eq!(result.projected_score, 42);
        assert_eq!(result.delta, 1);

        // already saturated at 40
        let at_limit = vessel("LIMIT", 40.0, "Korea", (2, 0, 0));
        assert_eq!(simulator.simulate_aging(&at_limit, 5.0).unwrap().delta, 0);
    }

    #[test]
    fn test_aging_rejects_non_finite_delta() {
        let simulator = ScenarioSimulator::default();
        let v = vessel("V", 10.0, "Korea", (2, 0, 0));
        assert!(matches!(
            simulator.simulate_aging(&v, f64::INFINITY),
            Err(Error::Validation(ValidationError::NonFiniteParameter("delta_years")))
        ));
    }

    #[test]
    fn test_fleet_summary_with_roi() {
        let simulator = ScenarioSimulator::default();
        let fleet = vec![
            vessel("YS", 33.5, "Panama", (1, 8, 1)),
            vessel("SJ", 15.6, "Korea", (2, 0, 0)),
        ];

        let summary = simulator.simulate_fleet(&fleet, Scenario::Training).unwrap();
        assert_eq!(summary.total_vessels, 2);
        // SJ has H = 0, so only YS improves
        assert_eq!(summary.vessels_improved, 1);
        assert_eq!(summary.total_delta, -8);
        assert_eq!(summary.average_delta, Decimal::from(-4));
        assert_eq!(summary.improvement_rate_pct, Decimal::from(50));
        // YS drops from Critical to High; SJ stays Low
        assert_eq!(
            summary.level_changes,
            LevelChanges {
                improved: 1,
                unchanged: 1,
                worsened: 0,
            }
        );

        let roi = summary.roi.unwrap();
        assert_eq!(roi.estimated_cost, Decimal::from(50_000));
        assert_eq!(roi.annual_savings, Decimal::from(20_000));
        assert_eq!(roi.payback_period_years, Some(Decimal::from_str("2.5").unwrap()));
        assert_eq!(roi.roi_5_year_pct, Decimal::from(100));
    }

    #[test]
    fn test_aging_has_no_roi() {
        let simulator = ScenarioSimulator::default();
        let fleet = vec![
            vessel("V", 10.0, "Korea", (2, 0, 0)),
            vessel("W", 38.0, "Korea", (2, 0, 0)),
        ];
        let summary = simulator
            .simulate_fleet(&fleet, Scenario::Aging { delta_years: 5.0 })
            .unwrap();
        assert!(summary.roi.is_none());
        assert_eq!(summary.vessels_improved, 0);
        // W crosses from Moderate (40) into Elevated (42)
        assert_eq!(summary.level_changes.worsened, 1);
        assert_eq!(summary.level_changes.unchanged, 1);
        assert_eq!(summary.level_changes.improved, 0);
    }

    #[test]
    fn test_no_savings_means_no_payback() {
        let roi = RoiEstimate::estimate(Decimal::from(50_000), Decimal::ZERO, &RoiConfig::default());
        assert_eq!(roi.annual_savings, Decimal::ZERO);
        assert!(roi.payback_period_years.is_none());
        assert_eq!(roi.roi_5_year_pct, Decimal::from(-100));
    }
}
