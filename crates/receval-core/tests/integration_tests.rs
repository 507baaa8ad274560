//! End-to-end tests for the evaluation pipeline.
//!
//! These tests exercise the full workflow:
//! 1. Loading: delimited text → PreferenceStore
//! 2. Splitting: PreferenceStore → train/test folds (written and re-read)
//! 3. Evaluation: baseline recommender → strategy filter → metrics → report
//!
//! Run with: `cargo test -p receval-core --test integration_tests`

use receval_core::config::EvaluationConfig;
use receval_core::data::{write_store, DelimitedParser, Parser, PreferenceStore};
use receval_core::metrics::MetricKind;
use receval_core::pipeline::Evaluator;
use receval_core::recommend::RecommenderKind;
use receval_core::split::{RandomSplitter, Splitter};
use receval_core::stats::paired_t_test;
use std::fmt::Write as _;

// ============================================================================
// Fixtures
// ============================================================================

/// A MovieLens-style dataset: 30 users, 12 items each, with timestamps.
fn movielens_text() -> String {
    let mut text = String::new();
    for user in 1..=30u64 {
        for item in 1..=12u64 {
            let item_id = (user * 7 + item * 3) % 40 + 1;
            let rating = (user + item_id) % 5 + 1;
            let time = 978_300_000 + user * 100 + item;
            let _ = writeln!(text, "{}::{}::{}::{}", user, item_id, rating, time);
        }
    }
    text
}

fn load() -> PreferenceStore {
    DelimitedParser::movielens()
        .parse_str(&movielens_text())
        .expect("fixture parses")
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_split_files_round_trip() {
    let store = load();
    let dir = tempfile::tempdir().unwrap();

    let outcome = RandomSplitter::new(0.25, true, 20).unwrap().split(&store);
    let fold = &outcome.folds[0];

    let train_path = dir.path().join("train_0.tsv");
    let test_path = dir.path().join("test_0.tsv");
    write_store(&fold.train, &train_path, false).unwrap();
    write_store(&fold.test, &test_path, false).unwrap();

    let parser = DelimitedParser::simple();
    let train = parser.parse_data(&train_path).unwrap();
    let test = parser.parse_data(&test_path).unwrap();

    assert_eq!(train, fold.train);
    assert_eq!(test, fold.test);
    assert_eq!(
        train.num_preferences() + test.num_preferences(),
        store.num_preferences()
    );
    assert!(write_store(&fold.train, &train_path, false).is_err());
}

#[test]
fn test_default_protocol_end_to_end() {
    let store = load();
    let evaluator = Evaluator::new(EvaluationConfig {
        metrics: MetricKind::all().iter().map(|m| m.name().to_string()).collect(),
        ..EvaluationConfig::default()
    })
    .unwrap();

    let report = evaluator
        .run(&store, RecommenderKind::ItemAverage, None)
        .unwrap();

    assert_eq!(report.metrics.len(), 5);
    for name in ["precision", "ndcg", "recall"] {
        let result = &report.metrics[name];
        for k in [1, 5, 10, 20] {
            let value = result.at(k);
            assert!(value.is_nan() || (0.0..=1.0).contains(&value), "{}@{}", name, k);
        }
    }
    let rmse = report.metrics["rmse"].global;
    assert!(rmse.is_finite() && rmse >= 0.0);

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["metrics"]["ndcg"]["per_cutoff"]["10"].is_number());
}

#[test]
fn test_compare_two_recommenders() {
    let store = load();
    let evaluator = Evaluator::new(EvaluationConfig {
        strategy: "all_items".to_string(),
        metrics: vec!["ndcg".to_string()],
        ..EvaluationConfig::default()
    })
    .unwrap();

    let outcome = evaluator.split(&store).unwrap();
    let fold = &outcome.folds[0];
    let a = evaluator.run_fold(fold, RecommenderKind::ItemAverage, Some(20));
    let b = evaluator.run_fold(fold, RecommenderKind::Popularity, Some(20));

    let test = paired_t_test(
        &a.metrics["ndcg"].per_user,
        &b.metrics["ndcg"].per_user,
    );
    if let Some(result) = test {
        assert!((0.0..=1.0).contains(&result.p_value));
    }
}

#[test]
fn test_keep_order_puts_latest_ratings_in_test() {
    let store = load();
    let outcome = RandomSplitter::new(0.25, true, 0)
        .unwrap()
        .with_keep_order(true)
        .split(&store);
    let fold = &outcome.folds[0];

    for user in store.users() {
        let latest_train = fold
            .train
            .user_items(user)
            .into_iter()
            .filter_map(|item| fold.train.timestamp(user, item))
            .max()
            .unwrap();
        let earliest_test = fold
            .test
            .user_items(user)
            .into_iter()
            .filter_map(|item| fold.test.timestamp(user, item))
            .min()
            .unwrap();
        assert!(latest_train < earliest_test);
    }
}
