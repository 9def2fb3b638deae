//! CLI for symbolscope: how random are your choices, really?

mod commands;

use clap::{Parser, Subcommand};

use commands::InputArgs;

#[derive(Parser)]
#[command(name = "symbolscope")]
#[command(about = "symbolscope: how random are your choices, really?")]
#[command(version = symbolscope_core::VERSION)]
struct Cli {
    /// Log debug diagnostics to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every model in parallel and print the combined report
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Give up on models that have not finished after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Add a weighted-vote consensus to the ensemble
        #[arg(long)]
        fuse: bool,

        /// Seed for placeholder predictions (reproducible output)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Windowed Shannon entropy with trend and history
    Entropy {
        #[command(flatten)]
        input: InputArgs,

        /// Symbols per window
        #[arg(long)]
        window: Option<usize>,
    },

    /// First-order transition matrix and next-symbol prediction
    Markov {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Most frequent repeated subsequences
    Patterns {
        #[command(flatten)]
        input: InputArgs,

        /// Number of patterns to show
        #[arg(long)]
        top: Option<usize>,
    },

    /// Search for an LCG seed reproducing the sequence, plus chi-square test
    Generator {
        #[command(flatten)]
        input: InputArgs,

        /// Last seed tried per generator (inclusive)
        #[arg(long)]
        seed_max: Option<u64>,
    },

    /// Dirichlet posterior over symbol probabilities
    Variational {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Random vs. pattern-following two-state model
    HiddenState {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Print the effective configuration as JSON
    Config {
        /// Configuration file to load (defaults otherwise)
        #[arg(long)]
        config: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze {
            input,
            timeout_ms,
            fuse,
            seed,
        } => commands::analyze::run(commands::analyze::AnalyzeCommandConfig {
            input: &input,
            timeout_ms,
            fuse,
            seed,
        }),
        Commands::Entropy { input, window } => commands::entropy::run(&input, window),
        Commands::Markov { input } => commands::markov::run(&input),
        Commands::Patterns { input, top } => commands::patterns::run(&input, top),
        Commands::Generator { input, seed_max } => commands::generator::run(&input, seed_max),
        Commands::Variational { input } => commands::variational::run(&input),
        Commands::HiddenState { input } => commands::hidden_state::run(&input),
        Commands::Config { config } => commands::config::run(config.as_deref()),
    }
}
