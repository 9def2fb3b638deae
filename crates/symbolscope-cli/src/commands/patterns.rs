use symbolscope_core::patterns::{self, PatternReport};

use super::InputArgs;

pub fn run(input: &InputArgs, top: Option<usize>) {
    let (sequence, config) = super::prepare(input, |c| {
        if let Some(n) = top {
            c.patterns.top = n;
        }
    });
    let result = patterns::analyze(sequence.as_slice(), &config.patterns);
    super::report(input.json, result, print_report);
}

fn print_report(report: &PatternReport) {
    if report.patterns.is_empty() {
        println!("No repeated patterns in {} symbols.", report.total_symbols);
        return;
    }
    println!("Repeated patterns in {} symbols:\n", report.total_symbols);
    println!("  {:<12} {:>11}", "Pattern", "Occurrences");
    println!("  {}", "-".repeat(24));
    for p in &report.patterns {
        let glyphs: String = p.pattern.iter().map(|s| s.glyph()).collect();
        println!("  {glyphs:<12} {:>11}", p.occurrences);
    }
}
