use symbolscope_core::entropy::{self, EntropyReport};

use super::InputArgs;

/// History rows shown in the human-readable view.
const HISTORY_ROWS: usize = 10;

pub fn run(input: &InputArgs, window: Option<usize>) {
    let (sequence, config) = super::prepare(input, |c| {
        if let Some(w) = window {
            c.entropy.window = w;
        }
    });
    let result = entropy::analyze(sequence.as_slice(), &config.entropy);
    super::report(input.json, result, print_report);
}

fn print_report(report: &EntropyReport) {
    println!(
        "Entropy (last {} symbols): {:.1}%  previous {:.1}%  trend: {}",
        report.window_size,
        report.entropy_value,
        report.previous_value,
        report.trend.as_str()
    );
    if report.historical.is_empty() {
        println!("\nNot enough symbols for a full window yet.");
        return;
    }

    println!("\n  {:>5}..{:<5} {:>8}  Symbols", "Start", "End", "Entropy");
    println!("  {}", "-".repeat(40));
    for point in report.historical.iter().take(HISTORY_ROWS) {
        let glyphs: String = point.symbols.iter().map(|s| s.glyph()).collect();
        println!(
            "  {:>5}..{:<5} {:>7.1}%  {glyphs}",
            point.window_start, point.window_end, point.entropy_value
        );
    }
    if report.historical.len() > HISTORY_ROWS {
        println!("  ... {} older windows", report.historical.len() - HISTORY_ROWS);
    }
}
