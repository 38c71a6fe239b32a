//! Scoring and ranking of evaluated molecules.

use serde::{Deserialize, Serialize};

use molreward_common::PropertyRecord;
use molreward_ranker::RewardAggregator;

/// A molecule with its property record (absent if rejected) and reward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMolecule {
    pub smiles: String,
    pub record: Option<PropertyRecord>,
    pub reward: f64,
}

/// Scorer for evaluating and ranking molecules.
#[derive(Debug, Clone, Default)]
pub struct MoleculeScorer {
    aggregator: RewardAggregator,
}

impl MoleculeScorer {
    pub fn new(aggregator: RewardAggregator) -> Self {
        Self { aggregator }
    }

    pub fn aggregator(&self) -> &RewardAggregator {
        &self.aggregator
    }

    /// Score one molecule. A missing record receives the reward floor.
    pub fn score(&self, smiles: &str, record: Option<PropertyRecord>) -> ScoredMolecule {
        let reward = self.aggregator.reward(record.as_ref());
        ScoredMolecule {
            smiles: smiles.to_string(),
            record,
            reward,
        }
    }

    /// Rank by reward, highest first. Ties keep their input order.
    pub fn rank(&self, mut molecules: Vec<ScoredMolecule>) -> Vec<ScoredMolecule> {
        molecules.sort_by(|a, b| b.reward.partial_cmp(&a.reward).unwrap_or(std::cmp::Ordering::Equal));
        molecules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use molreward_common::SaMethod;

    fn record(qed: f64) -> PropertyRecord {
        PropertyRecord {
            smiles: "CCO".into(),
            qed,
            cns_mpo: 0.5,
            sa_score: 3.0,
            sa_method: SaMethod::Approximate,
            ring_count: 0,
            mol_wt: 46.07,
            bbb_score: 1.0,
            potency: None,
        }
    }

    #[test]
    fn test_missing_record_scores_floor() {
        let scorer = MoleculeScorer::default();
        let scored = scorer.score("garbage", None);
        assert_eq!(scored.reward, 0.01);
        assert!(scored.record.is_none());
    }

    #[test]
    fn test_rank_descending() {
        let scorer = MoleculeScorer::default();
        let ranked = scorer.rank(vec![
            scorer.score("low", Some(record(0.2))),
            scorer.score("bad", None),
            scorer.score("high", Some(record(0.9))),
        ]);
        let order: Vec<&str> = ranked.iter().map(|m| m.smiles.as_str()).collect();
        assert_eq!(order, ["high", "low", "bad"]);
    }
}
