//! Batch orchestration.
//!
//! Evaluates a list of SMILES strings and scores them. Batches larger than
//! the configured threshold are spread over the rayon thread pool when the
//! `parallel` feature is enabled; output order always matches input order.

use tracing::info;

use molreward_common::{PropertyRecord, ScoringConfig};
use molreward_ranker::RewardAggregator;

use crate::evaluator::PropertyEvaluator;
use crate::predictor::PredictorSet;
use crate::scoring::{MoleculeScorer, ScoredMolecule};

/// Receives progress updates as molecules finish.
pub trait ProgressSink: Send + Sync {
    fn advance(&self, n: u64);

    fn finish(&self) {}
}

pub struct MoleculesPipeline {
    evaluator: PropertyEvaluator,
    scorer: MoleculeScorer,
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    parallel_threshold: usize,
    progress: Option<Box<dyn ProgressSink>>,
}

impl MoleculesPipeline {
    pub fn new(evaluator: PropertyEvaluator, aggregator: RewardAggregator, parallel_threshold: usize) -> Self {
        Self {
            evaluator,
            scorer: MoleculeScorer::new(aggregator),
            parallel_threshold,
            progress: None,
        }
    }

    pub fn from_config(config: &ScoringConfig, evaluator: PropertyEvaluator) -> Self {
        Self::new(
            evaluator,
            RewardAggregator::from_config(config),
            config.batch.parallel_threshold,
        )
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn evaluator(&self) -> &PropertyEvaluator {
        &self.evaluator
    }

    pub fn scorer(&self) -> &MoleculeScorer {
        &self.scorer
    }

    /// Records for every molecule that survives evaluation, in input order.
    pub fn evaluate_batch<S>(&self, smiles: &[S], predictors: &PredictorSet) -> Vec<PropertyRecord>
    where
        S: AsRef<str> + Sync,
    {
        let outcomes = self.for_each(smiles, |s| self.evaluator.evaluate(s, predictors));
        let evaluated = outcomes.len();
        let records: Vec<PropertyRecord> = outcomes.into_iter().flatten().collect();
        info!(
            evaluated,
            kept = records.len(),
            dropped = evaluated - records.len(),
            "Batch evaluation complete"
        );
        records
    }

    /// One scored entry per input molecule, in input order. Rejected
    /// molecules are kept with the reward floor.
    pub fn score_batch<S>(&self, smiles: &[S], predictors: &PredictorSet) -> Vec<ScoredMolecule>
    where
        S: AsRef<str> + Sync,
    {
        let scored = self.for_each(smiles, |s| {
            let record = self.evaluator.evaluate(s, predictors);
            self.scorer.score(s, record)
        });
        let valid = scored.iter().filter(|m| m.record.is_some()).count();
        info!(scored = scored.len(), valid, "Batch scoring complete");
        scored
    }

    /// Score and rank, best first.
    pub fn run<S>(&self, smiles: &[S], predictors: &PredictorSet) -> Vec<ScoredMolecule>
    where
        S: AsRef<str> + Sync,
    {
        self.scorer.rank(self.score_batch(smiles, predictors))
    }

    fn for_each<S, T, F>(&self, smiles: &[S], f: F) -> Vec<T>
    where
        S: AsRef<str> + Sync,
        T: Send,
        F: Fn(&str) -> T + Sync + Send,
    {
        let step = |s: &S| {
            let out = f(s.as_ref());
            if let Some(progress) = &self.progress {
                progress.advance(1);
            }
            out
        };

        #[cfg(feature = "parallel")]
        {
            if self.parallel_threshold > 0 && smiles.len() > self.parallel_threshold {
                use rayon::prelude::*;
                let out = smiles.par_iter().map(&step).collect();
                self.finish_progress();
                return out;
            }
        }

        let out = smiles.iter().map(&step).collect();
        self.finish_progress();
        out
    }

    fn finish_progress(&self) {
        if let Some(progress) = &self.progress {
            progress.finish();
        }
    }
}
