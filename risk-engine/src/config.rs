//! Configuration for the risk engine

use crate::error::{Error, Result};
use crate::factors::{FlagRiskTable, DEFAULT_FLAG_RISK};
use crate::report::ReportConfig;
use crate::scenario::RoiConfig;
use crate::scoring::RiskScoreEngine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Risk engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fleet JSON file
    pub fleet_path: Option<PathBuf>,

    /// Scoring configuration
    pub engine: EngineConfig,

    /// Report configuration
    pub report: ReportConfig,

    /// Scenario cost model
    pub roi: RoiConfig,

    /// Logging configuration
    pub telemetry: TelemetryConfig,
}

/// Scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base MOU risk for flags missing from the table
    pub unknown_flag_risk: f64,

    /// Extra or replacement flag-state base risks
    pub flag_risks: BTreeMap<String, f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            unknown_flag_risk: DEFAULT_FLAG_RISK,
            flag_risks: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Flag table with configured overrides applied
    pub fn flag_table(&self) -> Result<FlagRiskTable> {
        let mut table = FlagRiskTable::with_default_risk(self.unknown_flag_risk)?;
        for (flag_state, risk) in &self.flag_risks {
            table.set_flag_risk(flag_state, *risk)?;
        }
        Ok(table)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Filter used when RUST_LOG is unset
    pub log_level: String,

    /// Emit JSON log lines
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} has an invalid value: '{}'", name, value)))
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(path) = std::env::var("PSC_RISK_FLEET_PATH") {
            config.fleet_path = Some(PathBuf::from(path));
        }

        if let Ok(risk) = std::env::var("PSC_RISK_UNKNOWN_FLAG_RISK") {
            config.engine.unknown_flag_risk = parse_env("PSC_RISK_UNKNOWN_FLAG_RISK", &risk)?;
        }

        if let Ok(top_n) = std::env::var("PSC_RISK_TOP_N") {
            config.report.top_n = parse_env("PSC_RISK_TOP_N", &top_n)?;
        }

        if let Ok(level) = std::env::var("PSC_RISK_LOG_LEVEL") {
            config.telemetry.log_level = level;
        }

        if let Ok(json) = std::env::var("PSC_RISK_LOG_JSON") {
            config.telemetry.json = parse_env("PSC_RISK_LOG_JSON", &json)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot use
    pub fn validate(&self) -> Result<()> {
        self.engine.flag_table()?;

        if self.report.top_n == 0 {
            return Err(Error::Config("report.top_n must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Scoring engine for this configuration
    pub fn build_engine(&self) -> Result<RiskScoreEngine> {
        Ok(RiskScoreEngine::with_flags(self.engine.flag_table()?))
    }
}
