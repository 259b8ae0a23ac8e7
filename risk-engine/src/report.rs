//! Fleet risk reports and per-vessel assessments

use crate::cache::ScoreCache;
use crate::error::Result;
use crate::fleet::Fleet;
use crate::matrix::{MatrixBand, RiskMatrix, RiskMatrixBuilder};
use crate::scoring::{sort_by_risk, RiskScoreEngine};
use crate::types::{RiskLevel, RiskScore, VesselRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

const AGE_FACTOR_ALERT: f64 = 0.7;
const HISTORY_FACTOR_ALERT: f64 = 0.6;
const MOU_FACTOR_ALERT: f64 = 0.6;
const AGING_FLEET_YEARS: f64 = 25.0;

/// Report settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Vessels listed under top risks
    pub top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { top_n: 5 }
    }
}

/// Urgency of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    /// Plan within the year
    Medium,
    /// Plan within months
    High,
    /// Act now
    Critical,
}

/// Suggested mitigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Area addressed
    pub category: String,
    /// Urgency
    pub priority: Priority,
    /// What to do
    pub action: String,
    /// Expected window
    pub timeframe: String,
}

impl Recommendation {
    fn new(category: &str, priority: Priority, action: impl Into<String>, timeframe: &str) -> Self {
        Self {
            category: category.to_string(),
            priority,
            action: action.into(),
            timeframe: timeframe.to_string(),
        }
    }
}

/// Position relative to same-type peers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerStanding {
    /// Scores below the peer average
    BetterThanAverage,
    /// Scores at or above the peer average
    WorseThanAverage,
}

/// Comparison against vessels of the same type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerComparison {
    /// Peers found
    pub peer_count: usize,
    /// Mean peer score, absent without peers
    pub average_peer_score: Option<f64>,
    /// Percent of peers scoring higher
    pub percentile: Option<f64>,
    /// Standing, absent without peers
    pub standing: Option<PeerStanding>,
}

/// Single vessel risk profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselAssessment {
    /// Score
    pub score: RiskScore,
    /// Suggested actions
    pub recommendations: Vec<Recommendation>,
    /// Peer comparison
    pub peer_comparison: PeerComparison,
}

/// Fleet headline figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetOverview {
    /// Vessels scored
    pub total_vessels: usize,
    /// Mean composite score, one decimal
    pub average_score: f64,
    /// Vessels per level; every level present
    pub level_distribution: BTreeMap<RiskLevel, usize>,
    /// High or Critical vessels
    pub high_risk_vessels: usize,
    /// Critical vessels
    pub critical_vessels: usize,
}

/// Matrix headline figures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixSummary {
    /// Vessels placed
    pub total_vessels: usize,
    /// Cells in the high band
    pub high_risk_cells: usize,
    /// Vessels in high-band cells
    pub vessels_in_high_risk: usize,
}

/// Full fleet risk report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetReport {
    /// Report id
    pub report_id: Uuid,
    /// Generation timestamp
    pub generated_at: DateTime<Utc>,
    /// Headline figures
    pub overview: FleetOverview,
    /// Highest risk vessels
    pub top_risk_vessels: Vec<RiskScore>,
    /// Matrix headline figures
    pub matrix_summary: MatrixSummary,
    /// Full matrix
    pub risk_matrix: RiskMatrix,
    /// Fleet-level actions
    pub recommendations: Vec<Recommendation>,
}

/// Assembles scores, matrix and recommendations
#[derive(Debug, Clone, Default)]
pub struct FleetReporter {
    engine: RiskScoreEngine,
    matrix_builder: RiskMatrixBuilder,
    config: ReportConfig,
    cache: ScoreCache,
}

impl FleetReporter {
    /// Create reporter
    pub fn new(engine: RiskScoreEngine, config: ReportConfig) -> Self {
        let matrix_builder = RiskMatrixBuilder::new(engine.calculator().flags().clone());
        Self {
            engine,
            matrix_builder,
            config,
            cache: ScoreCache::new(),
        }
    }

    /// Score cache shared by all reports from this reporter
    pub fn cache(&self) -> &ScoreCache {
        &self.cache
    }

    fn score(&self, vessel: &VesselRecord) -> RiskScore {
        self.cache.get_or_compute(&self.engine, vessel, None)
    }

    /// Score, recommendations and peer comparison for one vessel
    pub fn assess_vessel(&self, fleet: &Fleet, vessel_id: &str) -> Result<VesselAssessment> {
        let vessel = fleet.get(vessel_id)?;
        let score = self.score(vessel);

        let peer_scores: Vec<f64> = fleet
            .iter()
            .filter(|peer| {
                peer.vessel_id() != vessel.vessel_id() && peer.vessel_type() == vessel.vessel_type()
            })
            .map(|peer| f64::from(self.score(peer).composite_score.score()))
            .collect();

        Ok(VesselAssessment {
            recommendations: vessel_recommendations(&score),
            peer_comparison: compare_to_peers(f64::from(score.composite_score.score()), &peer_scores),
            score,
        })
    }

    /// Report over the whole fleet
    pub fn fleet_report(&self, fleet: &Fleet) -> Result<FleetReport> {
        let mut scores: Vec<RiskScore> = fleet.iter().map(|vessel| self.score(vessel)).collect();
        sort_by_risk(&mut scores);

        let risk_matrix = self.matrix_builder.build_matrix(fleet.vessels())?;
        let overview = overview(&scores);
        let recommendations = fleet_recommendations(fleet, &scores, &overview);

        let matrix_summary = MatrixSummary {
            total_vessels: risk_matrix.total_vessels(),
            high_risk_cells: risk_matrix.high_risk_cells(),
            vessels_in_high_risk: risk_matrix.vessels_in_band(MatrixBand::High),
        };

        let report = FleetReport {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            overview,
            top_risk_vessels: scores.into_iter().take(self.config.top_n).collect(),
            matrix_summary,
            risk_matrix,
            recommendations,
        };

        tracing::info!(
            report_id = %report.report_id,
            vessels = report.overview.total_vessels,
            critical = report.overview.critical_vessels,
            "Fleet report generated"
        );
        Ok(report)
    }
}

fn overview(scores: &[RiskScore]) -> FleetOverview {
    let mut level_distribution: BTreeMap<RiskLevel, usize> =
        RiskLevel::ALL.iter().map(|level| (*level, 0)).collect();
    for score in scores {
        *level_distribution.entry(score.risk_level).or_default() += 1;
    }

    let average_score = if scores.is_empty() {
        0.0
    } else {
        let total: f64 = scores
            .iter()
            .map(|s| f64::from(s.composite_score.score()))
            .sum();
        (total / scores.len() as f64 * 10.0).round() / 10.0
    };

    let count = |level: RiskLevel| level_distribution.get(&level).copied().unwrap_or(0);

    FleetOverview {
        total_vessels: scores.len(),
        average_score,
        high_risk_vessels: count(RiskLevel::High) + count(RiskLevel::Critical),
        critical_vessels: count(RiskLevel::Critical),
        level_distribution,
    }
}

fn vessel_recommendations(score: &RiskScore) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    let factors = &score.factors;

    if factors.age_factor > AGE_FACTOR_ALERT {
        recommendations.push(Recommendation::new(
            "Age Management",
            Priority::High,
            "Implement enhanced maintenance program",
            "3-6 months",
        ));
    }
    if factors.history_factor > HISTORY_FACTOR_ALERT {
        recommendations.push(Recommendation::new(
            "Operational Excellence",
            Priority::Critical,
            "Crew training and procedures review",
            "1-3 months",
        ));
    }
    if factors.mou_factor > MOU_FACTOR_ALERT {
        recommendations.push(Recommendation::new(
            "Regulatory Compliance",
            Priority::Medium,
            "Flag state and classification review",
            "6-12 months",
        ));
    }
    if score.risk_level == RiskLevel::Critical {
        recommendations.push(Recommendation::new(
            "Emergency Action",
            Priority::Critical,
            "Immediate risk mitigation required before next voyage",
            "Immediate",
        ));
    }

    recommendations
}

fn compare_to_peers(score: f64, peer_scores: &[f64]) -> PeerComparison {
    if peer_scores.is_empty() {
        return PeerComparison {
            peer_count: 0,
            average_peer_score: None,
            percentile: None,
            standing: None,
        };
    }

    let count = peer_scores.len() as f64;
    let average = peer_scores.iter().sum::<f64>() / count;
    let higher = peer_scores.iter().filter(|peer| **peer > score).count() as f64;

    PeerComparison {
        peer_count: peer_scores.len(),
        average_peer_score: Some((average * 10.0).round() / 10.0),
        percentile: Some((higher / count * 1000.0).round() / 10.0),
        standing: Some(if score < average {
            PeerStanding::BetterThanAverage
        } else {
            PeerStanding::WorseThanAverage
        }),
    }
}

fn fleet_recommendations(
    fleet: &Fleet,
    scores: &[RiskScore],
    overview: &FleetOverview,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if overview.critical_vessels > 0 {
        recommendations.push(Recommendation::new(
            "Emergency Fleet Management",
            Priority::Critical,
            format!(
                "Immediate attention required for {} critical risk vessel(s)",
                overview.critical_vessels
            ),
            "Immediate",
        ));
    }

    let aging = fleet
        .iter()
        .filter(|vessel| vessel.age_years() > AGING_FLEET_YEARS)
        .count();
    if aging * 2 > fleet.len() {
        recommendations.push(Recommendation::new(
            "Fleet Modernization",
            Priority::High,
            "Consider fleet renewal strategy for aging vessels",
            "2-5 years",
        ));
    }

    if scores
        .iter()
        .any(|score| score.factors.history_factor > HISTORY_FACTOR_ALERT)
    {
        recommendations.push(Recommendation::new(
            "Operational Excellence",
            Priority::High,
            "Fleet-wide crew training and procedure standardization",
            "3-6 months",
        ));
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::InspectionHistory;

    fn vessel(id: &str, age: f64, flag: &str, kind: &str, history: (i64, i64, i64)) -> VesselRecord {
        let history = InspectionHistory::new(history.0, history.1, history.2).unwrap();
        VesselRecord::new(id, id, age, flag, kind, history).unwrap()
    }

    fn fleet() -> Fleet {
        Fleet::new(vec![
            vessel("YS", 33.5, "Panama", "PC(T)C", (1, 8, 1)),
            vessel("SJ", 15.6, "Korea", "PC(T)C", (2, 0, 0)),
            vessel("GL", 28.0, "Japan", "PC(T)C", (3, 6, 0)),
            vessel("BK", 5.0, "Singapore", "Bulk", (1, 1, 0)),
        ])
        .unwrap()
    }

    #[test]
    fn test_fleet_report_overview() {
        let reporter = FleetReporter::default();
        let report = reporter.fleet_report(&fleet()).unwrap();

        assert_eq!(report.overview.total_vessels, 4);
        assert_eq!(report.overview.critical_vessels, 1);
        assert_eq!(report.overview.level_distribution.len(), 5);
        assert_eq!(
            report.overview.level_distribution.values().sum::<usize>(),
            4
        );
        assert_eq!(report.top_risk_vessels[0].vessel_id, "YS");
        assert_eq!(report.matrix_summary.total_vessels, 4);
        assert_eq!(report.matrix_summary.high_risk_cells, 4);
    }

    #[test]
    fn test_fleet_report_recommendations() {
        let reporter = FleetReporter::default();
        let report = reporter.fleet_report(&fleet()).unwrap();
        let categories: Vec<&str> = report
            .recommendations
            .iter()
            .map(|r| r.category.as_str())
            .collect();

        assert!(categories.contains(&"Emergency Fleet Management"));
        assert!(categories.contains(&"Operational Excellence"));
        // two of four vessels are over 25 years: not a majority
        assert!(!categories.contains(&"Fleet Modernization"));
    }

    #[test]
    fn test_top_n_limits_list() {
        let reporter = FleetReporter::new(RiskScoreEngine::new(), ReportConfig { top_n: 2 });
        let report = reporter.fleet_report(&fleet()).unwrap();
        assert_eq!(report.top_risk_vessels.len(), 2);
    }

    #[test]
    fn test_assess_vessel_recommendations() {
        let reporter = FleetReporter::default();
        let assessment = reporter.assess_vessel(&fleet(), "YS").unwrap();

        let priorities: Vec<(&str, Priority)> = assessment
            .recommendations
            .iter()
            .map(|r| (r.category.as_str(), r.priority))
            .collect();
        assert_eq!(
            priorities,
            vec![
                ("Age Management", Priority::High),
                ("Operational Excellence", Priority::Critical),
                ("Emergency Action", Priority::Critical),
            ]
        );
    }

    #[test]
    fn test_peer_comparison() {
        let reporter = FleetReporter::default();
        let assessment = reporter.assess_vessel(&fleet(), "SJ").unwrap();
        let peers = assessment.peer_comparison;

        assert_eq!(peers.peer_count, 2);
        assert_eq!(peers.percentile, Some(100.0));
        assert_eq!(peers.standing, Some(PeerStanding::BetterThanAverage));

        let lonely = reporter.assess_vessel(&fleet(), "BK").unwrap();
        assert_eq!(lonely.peer_comparison.peer_count, 0);
        assert!(lonely.peer_comparison.standing.is_none());
    }

    #[test]
    fn test_assess_unknown_vessel() {
        let reporter = FleetReporter::default();
        assert!(matches!(
            reporter.assess_vessel(&fleet(), "NOPE"),
            Err(Error::VesselNotFound(_))
        ));
    }

    #[test]
    fn test_reports_reuse_cached_scores() {
        let reporter = FleetReporter::default();
        let fleet = fleet();
        reporter.fleet_report(&fleet).unwrap();
        reporter.assess_vessel(&fleet, "SJ").unwrap();

        let stats = reporter.cache().stats();
        assert_eq!(stats.entries, 4);
        assert_eq!(stats.misses, 4);
        assert_eq!(stats.hits, 3);
    }
}
