use symbolscope_core::generator::{self, MonteCarloAnalysis};

use super::{InputArgs, label, pct};

pub fn run(input: &InputArgs, seed_max: Option<u64>) {
    let (sequence, config) = super::prepare(input, |c| {
        if let Some(max) = seed_max {
            c.generator.seed_max = max;
        }
    });
    if let Some(grid) = config.generator.grid_size() {
        log::debug!("searching {grid} generator/seed pairs");
    }
    let result = generator::analyze(sequence.as_slice(), &config.generator);
    super::report(input.json, result, print_analysis);
}

fn print_analysis(analysis: &MonteCarloAnalysis) {
    match &analysis.candidate {
        Some(c) => {
            let next: Vec<String> = c.predicted_next.iter().map(|s| label(*s)).collect();
            println!("Closest generator:");
            println!(
                "  LCG a={} c={} m={}  seed {}",
                c.params.multiplier, c.params.increment, c.params.modulus, c.seed
            );
            println!(
                "  similarity {}  ({} of {} symbols)",
                pct(c.confidence),
                c.matched_length,
                analysis.total_symbols
            );
            println!("  continues with: {}", next.join("  "));
        }
        None => println!("No generator in the catalog matched a single position."),
    }

    let chi = &analysis.chi_square;
    println!("\nChi-square uniformity test:");
    println!(
        "  observed {:?}  expected {:.2} each",
        chi.observed, chi.expected
    );
    print!("  statistic {:.3}  p ≈ {:.3}", chi.statistic, chi.p_value);
    if let Some(exact) = chi.exact_p_value {
        print!(" (exact {exact:.4})");
    }
    println!("  → {}", chi.verdict());
}
