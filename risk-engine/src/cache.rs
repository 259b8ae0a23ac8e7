//! Read-through score memoization keyed by input content hash

use crate::factors::FlagRiskTable;
use crate::scoring::RiskScoreEngine;
use crate::types::{InspectionHistory, RiskScore, VesselRecord};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// BLAKE3 digest of one scoring input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Hash a vessel, the history it is scored against and the flag table
    /// that prices its flag state
    pub fn for_input(
        flags: &FlagRiskTable,
        vessel: &VesselRecord,
        history_override: Option<&InspectionHistory>,
    ) -> Self {
        let mut hasher = blake3::Hasher::new();

        hash_flags(&mut hasher, flags);
        for field in [
            vessel.vessel_id(),
            vessel.vessel_name(),
            vessel.flag_state(),
            vessel.vessel_type(),
        ] {
            hash_str(&mut hasher, field);
        }
        hasher.update(&vessel.age_years().to_bits().to_le_bytes());
        hash_history(&mut hasher, vessel.inspection_history());

        match history_override {
            Some(history) => {
                hasher.update(&[1]);
                hash_history(&mut hasher, history);
            }
            None => {
                hasher.update(&[0]);
            }
        }

        Self(*hasher.finalize().as_bytes())
    }
}

// length prefix keeps ("ab","c") and ("a","bc") apart
fn hash_str(hasher: &mut blake3::Hasher, field: &str) {
    hasher.update(&(field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

fn hash_flags(hasher: &mut blake3::Hasher, flags: &FlagRiskTable) {
    hasher.update(&flags.default_risk().to_bits().to_le_bytes());
    let mut count = 0u64;
    for (flag, risk) in flags.entries() {
        hash_str(hasher, flag);
        hasher.update(&risk.to_bits().to_le_bytes());
        count += 1;
    }
    hasher.update(&count.to_le_bytes());
}

fn hash_history(hasher: &mut blake3::Hasher, history: &InspectionHistory) {
    hasher.update(&history.total_inspections().to_le_bytes());
    hasher.update(&history.total_deficiencies().to_le_bytes());
    hasher.update(&history.detention_count().to_le_bytes());
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that computed a fresh score
    pub misses: u64,
    /// Entries held
    pub entries: usize,
}

/// Concurrent score cache; entries never go stale because inputs are immutable
#[derive(Debug, Clone, Default)]
pub struct ScoreCache {
    entries: Arc<DashMap<CacheKey, RiskScore>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl ScoreCache {
    /// Create empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached score, computing and storing it on first use
    pub fn get_or_compute(
        &self,
        engine: &RiskScoreEngine,
        vessel: &VesselRecord,
        history_override: Option<&InspectionHistory>,
    ) -> RiskScore {
        let key = CacheKey::for_input(engine.calculator().flags(), vessel, history_override);

        if let Some(score) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return score.value().clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let score = engine.compute_score(vessel, history_override);
        self.entries.entry(key).or_insert(score).value().clone()
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RiskLevel;

    fn vessel(id: &str, deficiencies: i64) -> VesselRecord {
        let history = InspectionHistory::new(2, deficiencies, 0).unwrap();
        VesselRecord::new(id, "NAME", 20.0, "Korea", "Bulk", history).unwrap()
    }

    #[test]
    fn test_key_depends_on_content() {
        let flags = FlagRiskTable::default();
        let a = vessel("A", 1);
        assert_eq!(
            CacheKey::for_input(&flags, &a, None),
            CacheKey::for_input(&flags, &a.clone(), None)
        );
        assert_ne!(
            CacheKey::for_input(&flags, &a, None),
            CacheKey::for_input(&flags, &vessel("A", 2), None)
        );
        assert_ne!(
            CacheKey::for_input(&flags, &a, None),
            CacheKey::for_input(&flags, &a, Some(a.inspection_history()))
        );
    }

    #[test]
    fn test_key_depends_on_flag_table() {
        let a = vessel("A", 1);
        let base = FlagRiskTable::default();

        let mut priced = FlagRiskTable::default();
        priced.set_flag_risk("Liberia", 1.0).unwrap();
        let mut repriced = FlagRiskTable::default();
        repriced.set_flag_risk("Korea", 0.9).unwrap();
        let fallback = FlagRiskTable::with_default_risk(0.7).unwrap();

        let key = CacheKey::for_input(&base, &a, None);
        assert_eq!(key, CacheKey::for_input(&base.clone(), &a, None));
        for other in [&priced, &repriced, &fallback] {
            assert_ne!(key, CacheKey::for_input(other, &a, None));
        }
    }

    #[test]
    fn test_engines_with_different_flags_do_not_share_entries() {
        let history = InspectionHistory::new(2, 4, 0).unwrap();
        let v = VesselRecord::new("L1", "LIBERIAN", 20.0, "Liberia", "Bulk", history).unwrap();

        let default_engine = RiskScoreEngine::new();
        let mut flags = FlagRiskTable::default();
        flags.set_flag_risk("Liberia", 1.0).unwrap();
        let strict_engine = RiskScoreEngine::with_flags(flags);

        let cache = ScoreCache::new();
        let shared = cache.clone();

        let default_score = cache.get_or_compute(&default_engine, &v, None);
        let strict_score = shared.get_or_compute(&strict_engine, &v, None);

        assert_eq!(default_score.composite_score.score(), 38);
        assert_eq!(default_score.warnings.len(), 1);
        assert_eq!(strict_score, strict_engine.compute_score(&v, None));
        assert_eq!(strict_score.composite_score.score(), 48);
        assert_eq!(strict_score.risk_level, RiskLevel::Elevated);
        assert_eq!(strict_score.factors.mou_factor, 1.0);
        assert!(strict_score.warnings.is_empty());

        let stats = cache.stats();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.entries, 2);
    }

    #[test]
    fn test_read_through() {
        let engine = RiskScoreEngine::new();
        let cache = ScoreCache::new();
        let v = vessel("A", 3);

        let first = cache.get_or_compute(&engine, &v, None);
        let second = cache.get_or_compute(&engine, &v, None);
        assert_eq!(first, second);
        assert_eq!(first, engine.compute_score(&v, None));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);

        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_override_cached_separately() {
        let engine = RiskScoreEngine::new();
        let cache = ScoreCache::new();
        let v = vessel("A", 0);
        let worse = InspectionHistory::new(2, 12, 1).unwrap();

        let base = cache.get_or_compute(&engine, &v, None);
        let projected = cache.get_or_compute(&engine, &v, Some(&worse));
        assert_ne!(base.composite_score, projected.composite_score);
        assert_eq!(cache.stats().entries, 2);
    }

    #[test]
    fn test_shared_across_threads() {
        let engine = RiskScoreEngine::new();
        let cache = ScoreCache::new();
        let v = vessel("A", 5);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| cache.get_or_compute(&engine, &v, None));
            }
        });

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits + stats.misses, 4);
    }
}
