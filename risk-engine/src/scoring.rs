//! Risk scoring engine

use crate::factors::{FlagRiskTable, RiskFactorCalculator};
use crate::types::{
    CompositeScore, FactorBreakdown, InspectionHistory, RiskFactors, RiskLevel, RiskScore,
    VesselRecord,
};

/// Weight of the age factor
pub const AGE_WEIGHT: f64 = 0.4;
/// Weight of the history factor
pub const HISTORY_WEIGHT: f64 = 0.4;
/// Weight of the MOU factor
pub const MOU_WEIGHT: f64 = 0.2;

fn to_points(value: f64, scale: f64) -> u8 {
    (value * scale).round().clamp(0.0, 255.0) as u8
}

/// Combine factors into the 0-100 composite score
///
/// Factors are clamped to [0, 1] first, so the result never leaves range.
pub fn compose(factors: &RiskFactors) -> CompositeScore {
    let a = factors.age_factor.clamp(0.0, 1.0);
    let h = factors.history_factor.clamp(0.0, 1.0);
    let m = factors.mou_factor.clamp(0.0, 1.0);

    let weighted = a * AGE_WEIGHT + h * HISTORY_WEIGHT + m * MOU_WEIGHT;
    CompositeScore::new(to_points(weighted, 100.0))
}

/// Per-factor points, each rounded independently
pub fn breakdown(factors: &RiskFactors) -> FactorBreakdown {
    FactorBreakdown {
        age: to_points(factors.age_factor.clamp(0.0, 1.0), AGE_WEIGHT * 100.0),
        history: to_points(factors.history_factor.clamp(0.0, 1.0), HISTORY_WEIGHT * 100.0),
        mou: to_points(factors.mou_factor.clamp(0.0, 1.0), MOU_WEIGHT * 100.0),
    }
}

/// Risk scorer
#[derive(Debug, Clone, Default)]
pub struct RiskScoreEngine {
    calculator: RiskFactorCalculator,
}

impl RiskScoreEngine {
    /// Create new risk scorer with the default flag table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create scorer over a custom flag table
    pub fn with_flags(flags: FlagRiskTable) -> Self {
        Self {
            calculator: RiskFactorCalculator::new(flags),
        }
    }

    /// Factor calculator in use
    pub fn calculator(&self) -> &RiskFactorCalculator {
        &self.calculator
    }

    /// Score one vessel, optionally against a hypothetical inspection history
    pub fn compute_score(
        &self,
        vessel: &VesselRecord,
        history_override: Option<&InspectionHistory>,
    ) -> RiskScore {
        let assessment = self.calculator.compute(vessel, history_override);
        let score = self.score_factors(vessel.vessel_id(), assessment.factors);

        tracing::debug!(
            vessel_id = vessel.vessel_id(),
            score = score.composite_score.score(),
            level = %score.risk_level,
            "Risk score calculated"
        );

        RiskScore {
            warnings: assessment.warnings,
            ..score
        }
    }

    /// Build a score from already-derived factors
    pub fn score_factors(&self, vessel_id: &str, factors: RiskFactors) -> RiskScore {
        let composite_score = compose(&factors);

        RiskScore {
            vessel_id: vessel_id.to_string(),
            composite_score,
            risk_level: RiskLevel::from(composite_score),
            factors,
            factor_breakdown: breakdown(&factors),
            warnings: Vec::new(),
        }
    }

    /// Score every vessel, highest risk first, ties by vessel id
    pub fn rank_fleet(&self, vessels: &[VesselRecord]) -> Vec<RiskScore> {
        let mut scores: Vec<RiskScore> = vessels
            .iter()
            .map(|vessel| self.compute_score(vessel, None))
            .collect();

        sort_by_risk(&mut scores);
        scores
    }
}

/// Order scores by composite score descending, then vessel id ascending
pub fn sort_by_risk(scores: &mut [RiskScore]) {
    scores.sort_by(|a, b| {
        b.composite_score
            .cmp(&a.composite_score)
            .then_with(|| a.vessel_id.cmp(&b.vessel_id))
    });
}
