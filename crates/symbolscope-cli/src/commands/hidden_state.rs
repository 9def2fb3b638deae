use symbolscope_core::Symbol;
use symbolscope_core::hidden_state::{self, HiddenStateAnalysis};

use super::{InputArgs, label, pct};

pub fn run(input: &InputArgs) {
    let (sequence, config) = super::prepare(input, |_| {});
    let result = hidden_state::analyze(sequence.as_slice(), &config.hidden_state);
    super::report(input.json, result, print_analysis);
}

fn print_analysis(analysis: &HiddenStateAnalysis) {
    println!(
        "Last {} symbols, dominance {}:\n",
        analysis.symbols_considered,
        pct(analysis.dominance)
    );
    println!("  {:<6} {:>6} {:>10} {:>10}", "", "count", "random", "pattern");
    for (i, s) in Symbol::ALL.iter().enumerate() {
        println!(
            "  {:<6} {:>6} {:>10.3} {:>10.3}",
            label(*s),
            analysis.frequencies[i],
            analysis.emission_probs[0][i],
            analysis.emission_probs[1][i]
        );
    }
    println!(
        "\nPredicted next: {} ({})",
        label(analysis.prediction.next_symbol),
        pct(analysis.prediction.confidence)
    );
}
