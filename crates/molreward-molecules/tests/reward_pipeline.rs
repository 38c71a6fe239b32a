use std::sync::Arc;

use molreward_chem::descriptors::FEATURE_COUNT;
use molreward_chem::AlertCatalog;
use molreward_common::{PredictorFiles, ScoringConfig};
use molreward_molecules::{LinearPredictor, MockPredictor, MoleculesPipeline, PredictorSet, PropertyEvaluator};
use molreward_ranker::{reward, RewardAggregator};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const DRUGS: [&str; 6] = [
    "CC(=O)Oc1ccccc1C(=O)O",
    "Cn1cnc2c1c(=O)n(C)c(=O)n2C",
    "CC(C)Cc1ccc(cc1)C(C)C(=O)O",
    "CC(=O)Nc1ccc(O)cc1",
    "c1ccc2ccccc2c1",
    "CCN(CC)CC",
];

fn mock_set(primary: f64, off_a: f64, off_b: f64) -> PredictorSet {
    PredictorSet::full(
        Arc::new(MockPredictor::new("KEAP1", primary)),
        Arc::new(MockPredictor::new("EGFR", off_a)),
        Arc::new(MockPredictor::new("IKKb", off_b)),
    )
}

#[test]
fn test_ethanol_without_predictors() {
    let evaluator = PropertyEvaluator::default();
    let record = evaluator.evaluate("CCO", &PredictorSet::None).unwrap();
    assert!((record.mol_wt - 46.07).abs() < 0.01);
    assert!(!record.has_potency());

    let value = reward(Some(&record));
    assert!(value > 0.01 && value < 1.0);
}

#[test]
fn test_invalid_inputs_get_floor() {
    let evaluator = PropertyEvaluator::default();
    for smiles in ["", "not_a_smiles", "C1CC", "C(C)(C)(C)(C)C", "Oc1ccccc1O"] {
        let record = evaluator.evaluate(smiles, &PredictorSet::None);
        assert!(record.is_none(), "{smiles} should be rejected");
        assert_eq!(reward(record.as_ref()), 0.01);
    }
}

#[test]
fn test_hypervalent_carbon_with_many_branches_rejected() {
    let evaluator = PropertyEvaluator::default();
    let smiles = format!("C{}", "(C)".repeat(300));
    assert!(!evaluator.is_valid_for_scoring(&smiles));
    assert!(evaluator.evaluate(&smiles, &PredictorSet::None).is_none());
}

#[test]
fn test_evaluation_is_deterministic() {
    let evaluator = PropertyEvaluator::default();
    let predictors = mock_set(7.5, 5.0, 5.5);
    for smiles in DRUGS {
        let a = evaluator.evaluate(smiles, &predictors);
        let b = evaluator.evaluate(smiles, &predictors);
        assert_eq!(a, b);
        assert_eq!(reward(a.as_ref()), reward(b.as_ref()));
    }
}

#[test]
fn test_reward_rises_with_primary_potency() {
    let evaluator = PropertyEvaluator::default();
    let low = evaluator.evaluate(DRUGS[0], &mock_set(5.0, 5.0, 5.0)).unwrap();
    let high = evaluator.evaluate(DRUGS[0], &mock_set(9.0, 5.0, 5.0)).unwrap();
    assert!(reward(Some(&high)) > reward(Some(&low)));
}

#[test]
fn test_failing_predictor_drops_record() {
    let evaluator = PropertyEvaluator::default();
    let predictors = PredictorSet::full(
        Arc::new(MockPredictor::new("KEAP1", 7.0)),
        Arc::new(MockPredictor::failing("EGFR")),
        Arc::new(MockPredictor::new("IKKb", 5.0)),
    );
    assert!(evaluator.evaluate("CCO", &predictors).is_none());
}

#[test]
fn test_alert_catalog_is_injectable() {
    let permissive = PropertyEvaluator::new(Arc::new(AlertCatalog::empty()));
    assert!(permissive.evaluate("Oc1ccccc1O", &PredictorSet::None).is_some());
    assert!(PropertyEvaluator::default().evaluate("Oc1ccccc1O", &PredictorSet::None).is_none());
}

#[test]
fn test_batch_preserves_order_in_parallel() {
    let mut smiles: Vec<String> = DRUGS.iter().cycle().take(200).map(|s| s.to_string()).collect();
    smiles.shuffle(&mut StdRng::seed_from_u64(7));

    let config = ScoringConfig::default();
    let pipeline = MoleculesPipeline::from_config(&config, PropertyEvaluator::default());
    let records = pipeline.evaluate_batch(&smiles, &PredictorSet::None);

    assert_eq!(records.len(), smiles.len());
    for (record, input) in records.iter().zip(&smiles) {
        assert_eq!(&record.smiles, input);
    }
}

#[test]
fn test_batch_drops_rejects() {
    let pipeline = MoleculesPipeline::new(PropertyEvaluator::default(), RewardAggregator::default(), 64);
    let records = pipeline.evaluate_batch(&["CCO", "", "c1ccccc1"], &PredictorSet::None);
    let kept: Vec<&str> = records.iter().map(|r| r.smiles.as_str()).collect();
    assert_eq!(kept, ["CCO", "c1ccccc1"]);
}

#[test]
fn test_linear_predictors_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let n_features = ScoringConfig::default().features.fingerprint_bits + FEATURE_COUNT;
    let mut paths = Vec::new();
    for (target, intercept) in [("KEAP1", 8.0), ("EGFR", 5.0), ("IKKb", 6.0)] {
        let model = LinearPredictor::new(target, intercept, vec![0.0; n_features]);
        let path = dir.path().join(format!("{target}.json"));
        std::fs::write(&path, serde_json::to_string(&model).unwrap()).unwrap();
        paths.push(path);
    }
    let files = PredictorFiles {
        primary: paths[0].clone(),
        off_target_a: paths[1].clone(),
        off_target_b: paths[2].clone(),
    };

    let predictors = PredictorSet::from_files(&files).unwrap();
    assert!(predictors.is_full());

    let record = PropertyEvaluator::default().evaluate("CCO", &predictors).unwrap();
    assert_eq!(record.primary_pic50(), Some(8.0));
    assert_eq!(record.selectivity(), Some(2.0));
    assert_eq!(record.to_row()["pIC50_IKKb"], 6.0);
}

#[test]
fn test_missing_predictor_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let files = PredictorFiles {
        primary: dir.path().join("missing.json"),
        off_target_a: dir.path().join("missing.json"),
        off_target_b: dir.path().join("missing.json"),
    };
    assert!(PredictorSet::from_files(&files).is_err());
}
