//! Core types for risk engine

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// PSC inspection record for one vessel
///
/// Counts are validated on construction: none may be negative and
/// detentions never exceed inspections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "RawInspectionHistory")]
pub struct InspectionHistory {
    total_inspections: u32,
    total_deficiencies: u32,
    detention_count: u32,
}

#[derive(Deserialize)]
struct RawInspectionHistory {
    total_inspections: i64,
    total_deficiencies: i64,
    detention_count: i64,
}

impl TryFrom<RawInspectionHistory> for InspectionHistory {
    type Error = ValidationError;

    fn try_from(raw: RawInspectionHistory) -> Result<Self, Self::Error> {
        Self::new(raw.total_inspections, raw.total_deficiencies, raw.detention_count)
    }
}

fn checked_count(field: &'static str, value: i64) -> Result<u32, ValidationError> {
    if value < 0 {
        return Err(ValidationError::NegativeCount { field, value });
    }
    u32::try_from(value).map_err(|_| ValidationError::CountOutOfRange { field, value })
}

impl InspectionHistory {
    /// Create a validated history
    pub fn new(
        total_inspections: i64,
        total_deficiencies: i64,
        detention_count: i64,
    ) -> Result<Self, ValidationError> {
        let total_inspections = checked_count("total_inspections", total_inspections)?;
        let total_deficiencies = checked_count("total_deficiencies", total_deficiencies)?;
        let detention_count = checked_count("detention_count", detention_count)?;

        if detention_count > total_inspections {
            return Err(ValidationError::DetentionsExceedInspections {
                detentions: detention_count,
                inspections: total_inspections,
            });
        }

        Ok(Self {
            total_inspections,
            total_deficiencies,
            detention_count,
        })
    }

    /// History of a vessel never inspected
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of inspections
    pub fn total_inspections(&self) -> u32 {
        self.total_inspections
    }

    /// Number of deficiencies across all inspections
    pub fn total_deficiencies(&self) -> u32 {
        self.total_deficiencies
    }

    /// Number of detentions
    pub fn detention_count(&self) -> u32 {
        self.detention_count
    }

    /// True when the vessel has no inspection record
    pub fn is_empty(&self) -> bool {
        self.total_inspections == 0
    }

    /// Deficiencies per inspection, `None` without inspections
    pub fn average_deficiencies(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.total_deficiencies as f64 / self.total_inspections as f64)
    }

    /// Share of inspections ending in detention, `None` without inspections
    pub fn detention_rate(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.detention_count as f64 / self.total_inspections as f64)
    }
}

/// Reference facts about one ship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawVesselRecord")]
pub struct VesselRecord {
    vessel_id: String,
    vessel_name: String,
    age_years: f64,
    flag_state: String,
    vessel_type: String,
    inspection_history: InspectionHistory,
}

#[derive(Deserialize)]
struct RawVesselRecord {
    vessel_id: String,
    vessel_name: String,
    age_years: f64,
    flag_state: String,
    vessel_type: String,
    inspection_history: InspectionHistory,
}

impl TryFrom<RawVesselRecord> for VesselRecord {
    type Error = ValidationError;

    fn try_from(raw: RawVesselRecord) -> Result<Self, Self::Error> {
        Self::new(
            raw.vessel_id,
            raw.vessel_name,
            raw.age_years,
            raw.flag_state,
            raw.vessel_type,
            raw.inspection_history,
        )
    }
}

impl VesselRecord {
    /// Create a validated vessel record
    pub fn new(
        vessel_id: impl Into<String>,
        vessel_name: impl Into<String>,
        age_years: f64,
        flag_state: impl Into<String>,
        vessel_type: impl Into<String>,
        inspection_history: InspectionHistory,
    ) -> Result<Self, ValidationError> {
        let vessel_id = vessel_id.into();
        if vessel_id.trim().is_empty() {
            return Err(ValidationError::EmptyVesselId);
        }
        if !age_years.is_finite() {
            return Err(ValidationError::NonFiniteAge);
        }
        if age_years < 0.0 {
            return Err(ValidationError::NegativeAge(age_years));
        }

        Ok(Self {
            vessel_id,
            vessel_name: vessel_name.into(),
            age_years,
            flag_state: flag_state.into(),
            vessel_type: vessel_type.into(),
            inspection_history,
        })
    }

    /// Unique vessel id
    pub fn vessel_id(&self) -> &str {
        &self.vessel_id
    }

    /// Display name
    pub fn vessel_name(&self) -> &str {
        &self.vessel_name
    }

    /// Age in years
    pub fn age_years(&self) -> f64 {
        self.age_years
    }

    /// Flag state name
    pub fn flag_state(&self) -> &str {
        &self.flag_state
    }

    /// Vessel type, e.g. "PC(T)C" or "Bulk"
    pub fn vessel_type(&self) -> &str {
        &self.vessel_type
    }

    /// Recorded inspection history
    pub fn inspection_history(&self) -> &InspectionHistory {
        &self.inspection_history
    }
}

/// Normalized Age / History / MOU factors, each within [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    /// Age factor (A)
    pub age_factor: f64,
    /// Inspection history factor (H)
    pub history_factor: f64,
    /// Flag state / MOU factor (M)
    pub mou_factor: f64,
}

/// Composite risk score (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct CompositeScore(u8);

impl From<u8> for CompositeScore {
    fn from(score: u8) -> Self {
        Self::new(score)
    }
}

impl From<CompositeScore> for u8 {
    fn from(score: CompositeScore) -> Self {
        score.0
    }
}

impl CompositeScore {
    /// Create new score, saturating at 100
    pub fn new(score: u8) -> Self {
        Self(score.min(100))
    }

    /// Get raw score
    pub fn score(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for CompositeScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Five-band risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// 0-20
    Low,
    /// 21-40
    Moderate,
    /// 41-60
    Elevated,
    /// 61-80
    High,
    /// 81-100
    Critical,
}

impl RiskLevel {
    /// All levels, lowest first
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Low,
        RiskLevel::Moderate,
        RiskLevel::Elevated,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Level name
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::Elevated => "Elevated",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

impl From<CompositeScore> for RiskLevel {
    fn from(score: CompositeScore) -> Self {
        match score.score() {
            s if s >= 81 => RiskLevel::Critical,
            s if s >= 61 => RiskLevel::High,
            s if s >= 41 => RiskLevel::Elevated,
            s if s >= 21 => RiskLevel::Moderate,
            _ => RiskLevel::Low,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Points each factor contributes to the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    /// round(A * 40)
    pub age: u8,
    /// round(H * 40)
    pub history: u8,
    /// round(M * 20)
    pub mou: u8,
}

impl FactorBreakdown {
    /// Sum of all contributions
    pub fn total(&self) -> u16 {
        u16::from(self.age) + u16::from(self.history) + u16::from(self.mou)
    }
}

/// Non-fatal diagnostic raised while scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreWarning {
    /// Flag state missing from the risk table; default prior used
    UnknownFlagState {
        /// Flag as supplied
        flag_state: String,
        /// Base risk applied instead
        fallback: f64,
    },
}

/// Risk assessment result for one vessel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    /// Vessel id
    pub vessel_id: String,

    /// Composite score
    pub composite_score: CompositeScore,

    /// Risk level
    pub risk_level: RiskLevel,

    /// Factors the score was built from
    pub factors: RiskFactors,

    /// Per-factor contribution
    pub factor_breakdown: FactorBreakdown,

    /// Diagnostics raised while scoring
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ScoreWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_rejects_negative_counts() {
        let err = InspectionHistory::new(-1, 0, 0).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NegativeCount {
                field: "total_inspections",
                value: -1
            }
        );
        assert!(InspectionHistory::new(1, -3, 0).is_err());
        assert!(InspectionHistory::new(1, 0, -1).is_err());
    }

    #[test]
    fn test_history_rejects_detentions_above_inspections() {
        let err = InspectionHistory::new(2, 5, 3).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::DetentionsExceedInspections {
                detentions: 3,
                inspections: 2
            }
        ));
    }

    #[test]
    fn test_history_rates() {
        let history = InspectionHistory::new(4, 10, 1).unwrap();
        assert_eq!(history.average_deficiencies(), Some(2.5));
        assert_eq!(history.detention_rate(), Some(0.25));

        let empty = InspectionHistory::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.average_deficiencies(), None);
        assert_eq!(empty.detention_rate(), None);
    }

    #[test]
    fn test_vessel_rejects_bad_age_and_id() {
        let history = InspectionHistory::empty();
        assert_eq!(
            VesselRecord::new("V1", "A", -0.5, "Korea", "Bulk", history).unwrap_err(),
            ValidationError::NegativeAge(-0.5)
        );
        assert_eq!(
            VesselRecord::new("V1", "A", f64::NAN, "Korea", "Bulk", history).unwrap_err(),
            ValidationError::NonFiniteAge
        );
        assert_eq!(
            VesselRecord::new("  ", "A", 3.0, "Korea", "Bulk", history).unwrap_err(),
            ValidationError::EmptyVesselId
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{
            "vessel_id": "V1",
            "vessel_name": "TEST",
            "age_years": 10.0,
            "flag_state": "Korea",
            "vessel_type": "Bulk",
            "inspection_history": {
                "total_inspections": 1,
                "total_deficiencies": -2,
                "detention_count": 0
            }
        }"#;
        let err = serde_json::from_str::<VesselRecord>(json).unwrap_err();
        assert!(err.to_string().contains("total_deficiencies"));
    }

    #[test]
    fn test_risk_level_bands() {
        let level = |s| RiskLevel::from(CompositeScore::new(s));
        assert_eq!(level(0), RiskLevel::Low);
        assert_eq!(level(20), RiskLevel::Low);
        assert_eq!(level(21), RiskLevel::Moderate);
        assert_eq!(level(41), RiskLevel::Elevated);
        assert_eq!(level(61), RiskLevel::High);
        assert_eq!(level(80), RiskLevel::High);
        assert_eq!(level(81), RiskLevel::Critical);
        assert_eq!(level(255), RiskLevel::Critical);
    }

    #[test]
    fn test_composite_score_saturates() {
        assert_eq!(CompositeScore::new(150).score(), 100);
    }

    #[test]
    fn test_composite_score_deserialize_saturates() {
        let score: CompositeScore = serde_json::from_str("200").unwrap();
        assert_eq!(score.score(), 100);
        assert_eq!(serde_json::to_string(&CompositeScore::new(86)).unwrap(), "86");

        let json = r#"{
            "vessel_id": "V1",
            "composite_score": 200,
            "risk_level": "Critical",
            "factors": {"age_factor": 1.0, "history_factor": 1.0, "mou_factor": 1.0},
            "factor_breakdown": {"age": 40, "history": 40, "mou": 20}
        }"#;
        let parsed: RiskScore = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.composite_score.score(), 100);
        assert!(parsed.warnings.is_empty());
    }
}
