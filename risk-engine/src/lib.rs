//! PSC Risk Engine
//!
//! Port State Control inspection risk scoring for merchant fleets.
//!
//! - **Factors**: Age, History and MOU factors normalized to [0, 1]
//! - **Scoring**: weighted composite score (A 40%, H 40%, M 20%) and five-band level
//! - **Matrix**: 5x5 probability x seriousness grid over a fleet
//! - **Scenarios**: what-if projections for training, maintenance, regulation and aging
//!
//! Every computation is a pure function of immutable, validated input.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod error;
pub mod factors;
pub mod fleet;
pub mod matrix;
pub mod report;
pub mod scenario;
pub mod scoring;
pub mod types;

pub use cache::ScoreCache;
pub use config::Config;
pub use error::{Error, Result, ValidationError};
pub use factors::{FlagRiskTable, RiskFactorCalculator};
pub use fleet::Fleet;
pub use matrix::{MatrixBand, RiskMatrix, RiskMatrixBuilder, RiskMatrixCell};
pub use report::{FleetReport, FleetReporter, VesselAssessment};
pub use scenario::{LevelChanges, Scenario, ScenarioResult, ScenarioSimulator, ScenarioSummary};
pub use scoring::RiskScoreEngine;
pub use types::*;
