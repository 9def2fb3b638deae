//! Integration tests for symbolscope-core.
//!
//! These exercise the public entry points end to end: the model-level
//! properties every caller relies on, the engine fan-out, and the JSON
//! shapes handed to presentation layers.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use symbolscope_core::{
    AnalysisConfig, Analyzer, EnsembleConfig, EntropyConfig, GeneratorConfig, LcgParams,
    LcgState, MarkovConfig, ModelKey, PatternConfig, Sequence, Symbol, VariationalConfig,
    chi_square_test, combine, entropy, find_potential_seed, generator, markov, patterns,
    run_variational_inference, window_entropy,
};

/// Deterministic pseudo-random fixture (PCG-style multiplier, high bits).
fn fixture(n: usize, seed: u64) -> Sequence {
    let mut state = seed;
    let values: Vec<i64> = (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) % 4) as i64 + 1
        })
        .collect();
    Sequence::from_values(values).unwrap()
}

fn values(v: &[i64]) -> Sequence {
    Sequence::from_values(v.iter().copied()).unwrap()
}

// ---------------------------------------------------------------------------
// Entropy
// ---------------------------------------------------------------------------

#[test]
fn entropy_stays_within_percentage_range() {
    for seed in 0..20 {
        let seq = fixture(1 + seed as usize * 7, seed);
        let report = entropy::analyze(seq.as_slice(), &EntropyConfig::default()).unwrap();
        assert!(
            (0.0..=100.0).contains(&report.entropy_value),
            "entropy {} out of range",
            report.entropy_value
        );
        for point in &report.historical {
            assert!((0.0..=100.0).contains(&point.entropy_value));
        }
    }
}

#[test]
fn entropy_extremes() {
    assert_eq!(window_entropy(values(&[3, 3, 3, 3, 3]).as_slice()), 0.0);
    assert_eq!(window_entropy(values(&[4, 2, 1, 3]).as_slice()), 100.0);
    assert_eq!(window_entropy(&[]), 0.0);
}

#[test]
fn entropy_history_is_most_recent_first() {
    let seq = values(&[1, 1, 1, 1, 1, 1, 2, 3, 4]);
    let report = entropy::analyze(seq.as_slice(), &EntropyConfig::default()).unwrap();
    assert_eq!(report.historical.len(), 5);
    assert_eq!(report.historical[0].window_end, 9);
    assert_eq!(report.historical[4].window_start, 0);
    assert_eq!(report.historical[4].entropy_value, 0.0);
}

// ---------------------------------------------------------------------------
// Markov
// ---------------------------------------------------------------------------

#[test]
fn transition_rows_sum_to_one_or_zero() {
    for seed in 0..20 {
        let seq = fixture(2 + seed as usize * 3, seed);
        let analysis = markov::analyze(seq.as_slice(), &MarkovConfig::default()).unwrap();
        for row in analysis.transition_matrix {
            let sum: f64 = row.iter().sum();
            assert!(
                sum.abs() < 1e-9 || (sum - 1.0).abs() < 1e-9,
                "row sums to {sum}"
            );
        }
    }
}

#[test]
fn alternating_sequence_always_follows_one_with_two() {
    let alternating = values(&[1, 2, 1, 2, 1, 2, 1, 2, 1, 2]);
    let analysis = markov::analyze(alternating.as_slice(), &MarkovConfig::default()).unwrap();
    assert_eq!(analysis.transition_matrix[0][1], 1.0);
    assert_eq!(analysis.transition_matrix[1][0], 1.0);

    let ends_on_one = values(&[1, 2, 1, 2, 1, 2, 1, 2, 1]);
    let analysis = markov::analyze(ends_on_one.as_slice(), &MarkovConfig::default()).unwrap();
    assert_eq!(analysis.prediction.next_symbol, Symbol::DIAMONDS);
    assert_eq!(analysis.prediction.confidence, 1.0);
}

#[test]
fn markov_needs_two_symbols() {
    let err = markov::analyze(values(&[1]).as_slice(), &MarkovConfig::default()).unwrap_err();
    assert!(err.is_insufficient_data());
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

#[test]
fn pattern_miner_on_alternating_sequence() {
    let report = patterns::analyze(
        values(&[1, 2, 1, 2, 1, 2]).as_slice(),
        &PatternConfig::default(),
    )
    .unwrap();
    let first = &report.patterns[0];
    assert_eq!(first.pattern, vec![Symbol::HEARTS, Symbol::DIAMONDS]);
    assert!(first.occurrences >= 3);
    assert!(report.patterns.iter().all(|p| p.occurrences > 1));
    assert!(report.patterns.len() <= 5);
}

// ---------------------------------------------------------------------------
// Generator search and chi-square
// ---------------------------------------------------------------------------

#[test]
fn uniform_counts_appear_random() {
    let v: Vec<i64> = (0..100).map(|i| i % 4 + 1).collect();
    let result = chi_square_test(Sequence::from_values(v).unwrap().as_slice());
    assert_eq!(result.statistic, 0.0);
    assert!(result.is_random);
    assert_eq!(result.verdict(), "appears random");
    assert_eq!(result.p_value, 1.0);
}

#[test]
fn recovers_the_generator_that_produced_a_sequence() {
    let params = LcgParams::new(69069, 1, 1 << 32);
    let (all, _) = generator::simulate(&params, LcgState::seeded(123), 35);
    let observed = &all[..30];

    let candidate = find_potential_seed(observed, &GeneratorConfig::default()).unwrap();
    assert_eq!(candidate.params, params);
    assert_eq!(candidate.seed, 123);
    assert_eq!(candidate.confidence, 1.0);
    assert_eq!(candidate.matched_length, 30);
    assert_eq!(candidate.predicted_next, all[30..].to_vec());
}

#[test]
fn monte_carlo_needs_ten_symbols() {
    let err = generator::analyze(fixture(9, 1).as_slice(), &GeneratorConfig::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Need at least 10 symbols for Monte Carlo analysis"
    );
}

// ---------------------------------------------------------------------------
// Variational inference
// ---------------------------------------------------------------------------

#[test]
fn variational_posterior_is_normalized_and_deterministic() {
    for seed in 0..10 {
        let seq = fixture(1 + seed as usize * 13, seed);
        let cfg = VariationalConfig::default();
        let a = run_variational_inference(seq.as_slice(), &cfg);
        let b = run_variational_inference(seq.as_slice(), &cfg);
        let sum: f64 = a.symbol_probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "probabilities sum to {sum}");
        assert!(a.iterations <= 100);
        assert_eq!(a, b);
    }
}

// ---------------------------------------------------------------------------
// Ensemble and engine
// ---------------------------------------------------------------------------

#[test]
fn ensemble_never_omits_a_configured_model() {
    let mut cfg = EnsembleConfig::default();
    cfg.weights.insert(ModelKey::HiddenState, 0.1);
    let mut rng = StdRng::seed_from_u64(99);
    let result = combine(&BTreeMap::new(), &cfg, &mut rng);
    assert_eq!(result.predictions.len(), 4);
    for key in ModelKey::ALL {
        assert!(result.predictions[&key].synthetic);
    }
}

#[test]
fn engine_reports_every_branch_even_when_data_is_short() {
    let seq = values(&[2]);
    let report = Analyzer::with_defaults().analyze(&seq);
    assert!(report.entropy.is_ok());
    assert!(report.markov.error.is_some());
    assert!(report.monte_carlo.error.is_some());
    assert!(report.variational.error.is_some());
    assert_eq!(report.ensemble.predictions.len(), 3);
    assert_eq!(report.ensemble.synthetic_count(), 3);
}

#[test]
fn engine_output_matches_standalone_models() {
    let mut config = AnalysisConfig::default();
    config.generator.seed_max = 100;
    let analyzer = Analyzer::new(config.clone()).unwrap();
    let seq = fixture(50, 4);
    let report = analyzer.analyze_with_rng(&seq, &mut StdRng::seed_from_u64(1));

    let markov = markov::analyze(seq.as_slice(), &config.markov).unwrap();
    assert_eq!(report.markov.data.as_ref(), Some(&markov));
    let vi = run_variational_inference(seq.as_slice(), &config.variational);
    assert_eq!(report.variational.data.as_ref(), Some(&vi));
    let mc = generator::analyze(seq.as_slice(), &config.generator).unwrap();
    assert_eq!(report.monte_carlo.data.as_ref(), Some(&mc));
}

#[test]
fn report_json_has_tagged_outcomes() {
    let seq = values(&[1, 2, 1]);
    let report = Analyzer::with_defaults().analyze_with_rng(&seq, &mut StdRng::seed_from_u64(2));
    let json = serde_json::to_value(&report).unwrap();

    for key in [
        "entropy",
        "markov",
        "patterns",
        "monte_carlo",
        "variational",
        "hidden_state",
    ] {
        let branch = &json[key];
        assert!(branch.get("error").is_some(), "{key} lacks error key");
        assert!(branch.get("data").is_some(), "{key} lacks data key");
    }
    assert!(json["variational"]["data"].is_null());
    assert!(json["markov"]["error"].is_null());
    assert_eq!(json["ensemble"]["weights"]["monte_carlo"], 0.3);
    assert_eq!(json["ensemble"]["predictions"]["markov"]["synthetic"], false);
    assert!(json["ensemble"]["consensus"].is_null());

    let back: symbolscope_core::AnalysisReport = serde_json::from_value(json).unwrap();
    assert_eq!(back.total_symbols, 3);
}

#[test]
fn fused_ensemble_reports_consensus() {
    let mut config = AnalysisConfig::default();
    config.generator.seed_max = 20;
    config.ensemble.fuse = true;
    let seq = values(&[1, 3, 1, 3, 1, 3, 1, 3, 1, 3, 1, 3, 1]);
    let report = Analyzer::new(config)
        .unwrap()
        .analyze_with_rng(&seq, &mut StdRng::seed_from_u64(0));
    let consensus = report.ensemble.consensus.expect("fuse enabled");
    let total: f64 = consensus.scores.iter().sum();
    assert!(total > 0.0);
    assert!((0.0..=1.0).contains(&consensus.score_share));
}

#[test]
fn symbols_outside_the_alphabet_are_rejected() {
    assert!(Sequence::from_values([1, 5]).is_err());
    assert!(serde_json::from_str::<Symbol>("0").is_err());
    assert_eq!(Sequence::parse("♥ D 3,4").unwrap().len(), 4);
}
