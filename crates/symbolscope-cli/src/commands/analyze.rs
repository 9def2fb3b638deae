use rand::SeedableRng;
use rand::rngs::StdRng;
use symbolscope_core::{AnalysisReport, Analyzer, Outcome};

use super::{InputArgs, label, pct};

pub struct AnalyzeCommandConfig<'a> {
    pub input: &'a InputArgs,
    pub timeout_ms: Option<u64>,
    pub fuse: bool,
    pub seed: Option<u64>,
}

pub fn run(cfg: AnalyzeCommandConfig<'_>) {
    let (sequence, config) = super::prepare(cfg.input, |c| {
        if cfg.timeout_ms.is_some() {
            c.timeout_ms = cfg.timeout_ms;
        }
        if cfg.fuse {
            c.ensemble.fuse = true;
        }
    });
    let analyzer = Analyzer::new(config).unwrap_or_else(|e| super::fail(e));

    let report = match cfg.seed {
        Some(seed) => analyzer.analyze_with_rng(&sequence, &mut StdRng::seed_from_u64(seed)),
        None => analyzer.analyze(&sequence),
    };

    if cfg.input.json {
        super::print_json(&report);
    } else {
        print_report(&report);
    }
}

fn section<T>(title: &str, outcome: &Outcome<T>, body: impl FnOnce(&T)) {
    print!("  {title:<14}");
    match (&outcome.data, &outcome.error) {
        (Some(data), _) => body(data),
        (None, Some(err)) => println!("unavailable ({err})"),
        (None, None) => println!("unavailable"),
    }
}

fn print_report(report: &AnalysisReport) {
    println!("Analysis of {} symbols\n", report.total_symbols);

    section("Entropy", &report.entropy, |e| {
        println!(
            "{:.1}% (previous {:.1}%, {})",
            e.entropy_value,
            e.previous_value,
            e.trend.as_str()
        );
    });
    section("Markov", &report.markov, |m| {
        println!(
            "next {} at {}",
            label(m.prediction.next_symbol),
            pct(m.prediction.confidence)
        );
    });
    section("Patterns", &report.patterns, |p| match p.patterns.first() {
        Some(top) => {
            let glyphs: String = top.pattern.iter().map(|s| s.glyph()).collect();
            println!(
                "{} repeated, most frequent {glyphs} ×{}",
                p.patterns.len(),
                top.occurrences
            );
        }
        None => println!("none repeated"),
    });
    section("Generator", &report.monte_carlo, |mc| {
        match &mc.candidate {
            Some(c) => print!("seed {} at {} similarity; ", c.seed, pct(c.confidence)),
            None => print!("no candidate; "),
        }
        println!(
            "χ² {:.2} → {}",
            mc.chi_square.statistic,
            mc.chi_square.verdict()
        );
    });
    section("Variational", &report.variational, |v| {
        let probs: Vec<String> = v
            .symbol_probabilities
            .iter()
            .map(|p| format!("{p:.3}"))
            .collect();
        println!(
            "P = [{}], {} iteration(s){}",
            probs.join(", "),
            v.iterations,
            if v.converged { "" } else { ", not converged" }
        );
    });
    section("Hidden state", &report.hidden_state, |h| {
        println!(
            "dominant {} at {}",
            label(h.prediction.next_symbol),
            pct(h.dominance)
        );
    });

    println!("\nEnsemble:");
    println!("  {:<14} {:>6} {:>8} {:>11}", "Model", "Weight", "Next", "Confidence");
    println!("  {}", "-".repeat(42));
    for (key, entry) in &report.ensemble.predictions {
        let weight = report.ensemble.weights.get(key).copied().unwrap_or(0.0);
        println!(
            "  {:<14} {:>6.2} {:>8} {:>11}{}",
            key.as_str(),
            weight,
            label(entry.next_symbol),
            pct(entry.confidence),
            if entry.synthetic { "  (placeholder)" } else { "" }
        );
    }
    if let Some(c) = &report.ensemble.consensus {
        println!(
            "\nConsensus: {} ({} of the weighted vote)",
            label(c.next_symbol),
            pct(c.score_share)
        );
    }
}
