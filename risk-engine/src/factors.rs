//! Age, history and MOU risk factors

use crate::error::ValidationError;
use crate::types::{InspectionHistory, RiskFactors, ScoreWarning, VesselRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Age at which the age factor saturates
pub const REFERENCE_LIFETIME_YEARS: f64 = 40.0;

/// History factor assumed for a vessel with no inspections
pub const NO_HISTORY_PRIOR: f64 = 0.3;

/// Flag-state base risk used when the flag is not in the table
pub const DEFAULT_FLAG_RISK: f64 = 0.5;

/// Deficiencies per inspection at which the deficiency term saturates
const DEFICIENCY_SATURATION: f64 = 10.0;

/// Weight of the detention rate in the history factor
const DETENTION_PENALTY: f64 = 0.5;

/// MOU nudge applied for a poor (> 3) or clean (0) deficiency record
const MOU_ADJUSTMENT: f64 = 0.1;
const MOU_POOR_RECORD_THRESHOLD: f64 = 3.0;

const DEFAULT_FLAG_RISKS: [(&str, f64); 6] = [
    ("Korea", 0.2),
    ("Japan", 0.2),
    ("Singapore", 0.2),
    ("Norway", 0.2),
    ("Panama", 0.5),
    ("Marshall Islands", 0.5),
];

fn flag_key(flag_state: &str) -> String {
    flag_state.trim().to_lowercase()
}

/// Base risk of a flag state lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlagLookup {
    /// Base risk in [0, 1]
    pub base_risk: f64,
    /// False when the default prior was used
    pub known: bool,
}

/// Static flag-state performance table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagRiskTable {
    entries: BTreeMap<String, f64>,
    default_risk: f64,
}

impl Default for FlagRiskTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_FLAG_RISKS
                .iter()
                .map(|(flag, risk)| (flag_key(flag), *risk))
                .collect(),
            default_risk: DEFAULT_FLAG_RISK,
        }
    }
}

impl FlagRiskTable {
    /// Default table with a different fallback for unknown flags
    pub fn with_default_risk(default_risk: f64) -> Result<Self, ValidationError> {
        let default_risk = check_risk("<default>", default_risk)?;
        Ok(Self {
            default_risk,
            ..Self::default()
        })
    }

    /// Add or replace the base risk of one flag state
    pub fn set_flag_risk(&mut self, flag_state: &str, risk: f64) -> Result<(), ValidationError> {
        let risk = check_risk(flag_state, risk)?;
        self.entries.insert(flag_key(flag_state), risk);
        Ok(())
    }

    /// Base risk for a flag state, case-insensitive
    pub fn lookup(&self, flag_state: &str) -> FlagLookup {
        match self.entries.get(&flag_key(flag_state)) {
            Some(risk) => FlagLookup {
                base_risk: *risk,
                known: true,
            },
            None => FlagLookup {
                base_risk: self.default_risk,
                known: false,
            },
        }
    }

    /// Known flags and their base risks, ordered by lowercased flag name
    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(flag, risk)| (flag.as_str(), *risk))
    }

    /// Fallback risk for unknown flags
    pub fn default_risk(&self) -> f64 {
        self.default_risk
    }
}

fn check_risk(flag_state: &str, value: f64) -> Result<f64, ValidationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::FlagRiskOutOfRange {
            flag_state: flag_state.to_string(),
            value,
        });
    }
    Ok(value)
}

/// Age factor: `min(age / 40, 1)`, zero for non-positive ages
pub fn compute_age_factor(age_years: f64) -> f64 {
    if age_years <= 0.0 {
        return 0.0;
    }
    (age_years / REFERENCE_LIFETIME_YEARS).min(1.0)
}

/// History factor from deficiency density plus a detention penalty
pub fn compute_history_factor(history: &InspectionHistory) -> f64 {
    match (history.average_deficiencies(), history.detention_rate()) {
        (Some(avg_deficiencies), Some(detention_rate)) => {
            let base = (avg_deficiencies / DEFICIENCY_SATURATION).min(1.0);
            let penalty = detention_rate * DETENTION_PENALTY;
            (base + penalty).clamp(0.0, 1.0)
        }
        _ => NO_HISTORY_PRIOR,
    }
}

/// Nudge a flag base risk by the vessel's own deficiency record
pub fn adjust_mou_factor(base_risk: f64, history: &InspectionHistory) -> f64 {
    let adjusted = match history.average_deficiencies() {
        Some(avg) if avg > MOU_POOR_RECORD_THRESHOLD => base_risk + MOU_ADJUSTMENT,
        Some(avg) if avg == 0.0 => base_risk - MOU_ADJUSTMENT,
        _ => base_risk,
    };
    adjusted.clamp(0.0, 1.0)
}

/// Factors for one vessel along with any diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct FactorAssessment {
    /// Computed factors
    pub factors: RiskFactors,
    /// Diagnostics raised
    pub warnings: Vec<ScoreWarning>,
}

/// Converts vessel facts into normalized A/H/M factors
#[derive(Debug, Clone, Default)]
pub struct RiskFactorCalculator {
    flags: FlagRiskTable,
}

impl RiskFactorCalculator {
    /// Create calculator over a flag table
    pub fn new(flags: FlagRiskTable) -> Self {
        Self { flags }
    }

    /// Flag table in use
    pub fn flags(&self) -> &FlagRiskTable {
        &self.flags
    }

    /// Age factor (A)
    pub fn age_factor(&self, age_years: f64) -> f64 {
        compute_age_factor(age_years)
    }

    /// History factor (H)
    pub fn history_factor(&self, history: &InspectionHistory) -> f64 {
        compute_history_factor(history)
    }

    /// MOU factor (M); unknown flags fall back to the table default
    pub fn mou_factor(&self, flag_state: &str, history: &InspectionHistory) -> f64 {
        adjust_mou_factor(self.flags.lookup(flag_state).base_risk, history)
    }

    /// All three factors for a vessel, using `history_override` when given
    pub fn compute(
        &self,
        vessel: &VesselRecord,
        history_override: Option<&InspectionHistory>,
    ) -> FactorAssessment {
        let history = history_override.unwrap_or_else(|| vessel.inspection_history());
        let flag = self.flags.lookup(vessel.flag_state());

        let mut warnings = Vec::new();
        if !flag.known {
            tracing::warn!(
                vessel_id = vessel.vessel_id(),
                flag_state = vessel.flag_state(),
                fallback = flag.base_risk,
                "Unknown flag state, using default MOU prior"
            );
            warnings.push(ScoreWarning::UnknownFlagState {
                flag_state: vessel.flag_state().to_string(),
                fallback: flag.base_risk,
            });
        }

        FactorAssessment {
            factors: RiskFactors {
                age_factor: compute_age_factor(vessel.age_years()),
                history_factor: compute_history_factor(history),
                mou_factor: adjust_mou_factor(flag.base_risk, history),
            },
            warnings,
        }
    }
}
