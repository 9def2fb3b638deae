use symbolscope_core::Symbol;
use symbolscope_core::markov::{self, MarkovAnalysis};

use super::{InputArgs, label, pct};

pub fn run(input: &InputArgs) {
    let (sequence, config) = super::prepare(input, |_| {});
    let result = markov::analyze(sequence.as_slice(), &config.markov);
    super::report(input.json, result, print_analysis);
}

fn print_analysis(analysis: &MarkovAnalysis) {
    println!(
        "Transition matrix ({} symbols), row = current, column = next:\n",
        analysis.total_symbols
    );
    print!("  {:<6}", "");
    for s in Symbol::ALL {
        print!("{:>8}", label(s));
    }
    println!("{:>8}", "n");
    for (from, row) in Symbol::ALL.iter().zip(&analysis.transition_matrix) {
        print!("  {:<6}", label(*from));
        for p in row {
            print!("{p:>8.3}");
        }
        println!("{:>8}", analysis.symbol_counts[from.index()]);
    }

    let p = analysis.prediction;
    if p.confidence == 0.0 {
        println!("\nNo transitions observed from the last symbol yet.");
    } else {
        println!("\nPredicted next: {} ({})", label(p.next_symbol), pct(p.confidence));
    }
}
