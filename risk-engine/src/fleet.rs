//! In-memory vessel reference data

use crate::error::{Error, Result};
use crate::types::VesselRecord;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Reject a vessel list that repeats an id
pub(crate) fn ensure_unique_ids(vessels: &[VesselRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(vessels.len());
    for vessel in vessels {
        if !seen.insert(vessel.vessel_id()) {
            return Err(Error::DuplicateVessel(vessel.vessel_id().to_string()));
        }
    }
    Ok(())
}

/// Read-only fleet of vessel records with unique ids
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    vessels: Vec<VesselRecord>,
    index: HashMap<String, usize>,
}

impl Fleet {
    /// Build a fleet, rejecting duplicate ids
    pub fn new(vessels: Vec<VesselRecord>) -> Result<Self> {
        ensure_unique_ids(&vessels)?;

        let index = vessels
            .iter()
            .enumerate()
            .map(|(pos, vessel)| (vessel.vessel_id().to_string(), pos))
            .collect();

        Ok(Self { vessels, index })
    }

    /// Parse a JSON array of vessel records
    pub fn from_json_str(json: &str) -> Result<Self> {
        let vessels: Vec<VesselRecord> = serde_json::from_str(json)?;
        Self::new(vessels)
    }

    /// Load a JSON fleet file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let fleet = Self::from_json_str(&content)?;

        tracing::info!(path = %path.display(), vessels = fleet.len(), "Fleet loaded");
        Ok(fleet)
    }

    /// Vessel by id
    pub fn get(&self, vessel_id: &str) -> Result<&VesselRecord> {
        self.index
            .get(vessel_id)
            .map(|pos| &self.vessels[*pos])
            .ok_or_else(|| Error::VesselNotFound(vessel_id.to_string()))
    }

    /// All vessels in load order
    pub fn vessels(&self) -> &[VesselRecord] {
        &self.vessels
    }

    /// Number of vessels
    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    /// True when the fleet holds no vessels
    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    /// Iterate vessels
    pub fn iter(&self) -> impl Iterator<Item = &VesselRecord> {
        self.vessels.iter()
    }
}
