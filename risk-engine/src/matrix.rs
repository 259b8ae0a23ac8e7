//! 5x5 probability x seriousness risk matrix

use crate::error::Result;
use crate::factors::{compute_age_factor, FlagRiskTable};
use crate::fleet::ensure_unique_ids;
use crate::types::{InspectionHistory, VesselRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Grades run 1 (lowest) to 5 (highest)
pub const GRADES: std::ops::RangeInclusive<u8> = 1..=5;

/// Likelihood labels, indexed by probability grade - 1
pub const PROBABILITY_LABELS: [&str; 5] = ["Very Low", "Low", "Medium", "High", "Very High"];

/// Impact labels, indexed by seriousness grade - 1
pub const SERIOUSNESS_LABELS: [&str; 5] =
    ["Insignificant", "Minor", "Moderate", "Major", "Catastrophic"];

/// Probability grade from deficiency density and detention rate
pub fn compute_probability_grade(history: &InspectionHistory) -> u8 {
    let (avg, detention_rate) = match (history.average_deficiencies(), history.detention_rate()) {
        (Some(avg), Some(rate)) => (avg, rate),
        _ => return 3,
    };

    if avg >= 8.0 || detention_rate > 0.5 {
        5
    } else if avg >= 5.0 || detention_rate > 0.2 {
        4
    } else if avg >= 2.0 || detention_rate > 0.0 {
        3
    } else if avg >= 1.0 {
        2
    } else {
        1
    }
}

/// Seriousness grade from age and the unadjusted flag-state risk
pub fn compute_seriousness_grade(age_years: f64, flag_state: &str, flags: &FlagRiskTable) -> u8 {
    let combined = (compute_age_factor(age_years) + flags.lookup(flag_state).base_risk) / 2.0;

    match combined {
        c if c >= 0.8 => 5,
        c if c >= 0.6 => 4,
        c if c >= 0.4 => 3,
        c if c >= 0.2 => 2,
        _ => 1,
    }
}

/// Presentation band of a cell rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatrixBand {
    /// Rating 1-5
    Low,
    /// Rating 6-15
    Medium,
    /// Rating 16-25
    High,
}

impl MatrixBand {
    /// Band for a `probability * seriousness` rating
    pub fn from_rating(rating: u8) -> Self {
        match rating {
            0..=5 => MatrixBand::Low,
            6..=15 => MatrixBand::Medium,
            _ => MatrixBand::High,
        }
    }
}

/// One cell of the matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskMatrixCell {
    /// Likelihood grade (1-5)
    pub probability_grade: u8,
    /// Impact grade (1-5)
    pub seriousness_grade: u8,
    /// probability * seriousness (1-25)
    pub risk_rating: u8,
    /// Severity band of the rating
    pub band: MatrixBand,
    /// Vessels placed in this cell
    pub vessel_ids: BTreeSet<String>,
}

/// Full 25-cell matrix, ordered by probability then seriousness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskMatrix {
    cells: Vec<RiskMatrixCell>,
}

impl RiskMatrix {
    fn empty() -> Self {
        let cells = GRADES
            .flat_map(|p| GRADES.map(move |s| (p, s)))
            .map(|(p, s)| RiskMatrixCell {
                probability_grade: p,
                seriousness_grade: s,
                risk_rating: p * s,
                band: MatrixBand::from_rating(p * s),
                vessel_ids: BTreeSet::new(),
            })
            .collect();
        Self { cells }
    }

    fn index(probability: u8, seriousness: u8) -> Option<usize> {
        if GRADES.contains(&probability) && GRADES.contains(&seriousness) {
            Some(usize::from(probability - 1) * 5 + usize::from(seriousness - 1))
        } else {
            None
        }
    }

    /// All cells
    pub fn cells(&self) -> &[RiskMatrixCell] {
        &self.cells
    }

    /// Cell at the given grades, `None` outside 1-5
    pub fn cell(&self, probability: u8, seriousness: u8) -> Option<&RiskMatrixCell> {
        Self::index(probability, seriousness).map(|idx| &self.cells[idx])
    }

    /// Vessels placed across all cells
    pub fn total_vessels(&self) -> usize {
        self.cells.iter().map(|cell| cell.vessel_ids.len()).sum()
    }

    /// Vessels in cells of the given band
    pub fn vessels_in_band(&self, band: MatrixBand) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.band == band)
            .map(|cell| cell.vessel_ids.len())
            .sum()
    }

    /// Number of cells in the high band
    pub fn high_risk_cells(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.band == MatrixBand::High)
            .count()
    }

    /// Cell holding a vessel
    pub fn locate(&self, vessel_id: &str) -> Option<&RiskMatrixCell> {
        self.cells
            .iter()
            .find(|cell| cell.vessel_ids.contains(vessel_id))
    }
}

/// Buckets a fleet into the 5x5 grid
#[derive(Debug, Clone, Default)]
pub struct RiskMatrixBuilder {
    flags: FlagRiskTable,
}

impl RiskMatrixBuilder {
    /// Create builder over a flag table
    pub fn new(flags: FlagRiskTable) -> Self {
        Self { flags }
    }

    /// (probability, seriousness) grades of one vessel
    pub fn grades(&self, vessel: &VesselRecord) -> (u8, u8) {
        (
            compute_probability_grade(vessel.inspection_history()),
            compute_seriousness_grade(vessel.age_years(), vessel.flag_state(), &self.flags),
        )
    }

    /// Place every vessel in exactly one cell
    pub fn build_matrix(&self, vessels: &[VesselRecord]) -> Result<RiskMatrix> {
        ensure_unique_ids(vessels)?;

        let mut matrix = RiskMatrix::empty();
        for vessel in vessels {
            let (p, s) = self.grades(vessel);
            // grades are always within 1-5
            if let Some(idx) = RiskMatrix::index(p, s) {
                matrix.cells[idx]
                    .vessel_ids
                    .insert(vessel.vessel_id().to_string());
            }
        }

        tracing::info!(
            vessels = vessels.len(),
            high_band = matrix.vessels_in_band(MatrixBand::High),
            "Risk matrix built"
        );
        Ok(matrix)
    }
}
