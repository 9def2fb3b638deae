use symbolscope_core::Symbol;
use symbolscope_core::variational::{self, VariationalPosterior};

use super::{InputArgs, label, pct};

pub fn run(input: &InputArgs) {
    let (sequence, config) = super::prepare(input, |_| {});
    let result = variational::analyze(sequence.as_slice(), &config.variational);
    super::report(input.json, result, print_posterior);
}

fn print_posterior(post: &VariationalPosterior) {
    println!(
        "Variational posterior after {} iteration(s) ({}), ELBO {:.4}:\n",
        post.iterations,
        if post.converged { "converged" } else { "not converged" },
        post.elbo
    );
    println!(
        "  {:<6} {:>8} {:>8} {:>8} {:>8} {:>10}",
        "", "P", "alpha", "mean", "spread", "width"
    );
    for (i, s) in Symbol::ALL.iter().enumerate() {
        println!(
            "  {:<6} {:>8.4} {:>8.3} {:>8.3} {:>8.3} {:>10.3}",
            label(*s),
            post.symbol_probabilities[i],
            post.concentration[i],
            post.means[i],
            post.spreads[i],
            post.uncertainty[i]
        );
    }
    println!(
        "\nMost probable next: {} ({})",
        label(post.prediction.next_symbol),
        pct(post.prediction.confidence)
    );
}
