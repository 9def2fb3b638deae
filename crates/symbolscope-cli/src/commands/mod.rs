pub mod analyze;
pub mod config;
pub mod entropy;
pub mod generator;
pub mod hidden_state;
pub mod markov;
pub mod patterns;
pub mod variational;

use std::io::Read;
use std::path::Path;

use clap::Args;
use serde::Serialize;
use symbolscope_core::{AnalysisConfig, AnalysisError, Outcome, Sequence, Symbol};

/// Where the sequence and configuration come from. Shared by every model command.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Read symbols from a file ("-" for stdin, the default)
    #[arg(long)]
    pub input: Option<String>,

    /// Symbols given inline, e.g. "1 2 3 4", "1,2,3,4", "♥♦♣♠" or "HDCS"
    #[arg(long, conflicts_with = "input")]
    pub symbols: Option<String>,

    /// JSON configuration file; missing keys use defaults
    #[arg(long)]
    pub config: Option<String>,

    /// Print machine-readable JSON ({"error": ..., "data": ...})
    #[arg(long)]
    pub json: bool,
}

/// Print to stderr and exit with status 1.
pub fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

pub fn read_sequence(args: &InputArgs) -> Result<Sequence, String> {
    let text = if let Some(inline) = &args.symbols {
        inline.clone()
    } else {
        match args.input.as_deref() {
            None | Some("-") => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .map_err(|e| format!("failed to read stdin: {e}"))?;
                buf
            }
            Some(path) => std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read {path}: {e}"))?,
        }
    };
    Sequence::parse(&text).map_err(|e| e.to_string())
}

pub fn load_config(path: Option<&str>) -> Result<AnalysisConfig, String> {
    match path {
        Some(p) => AnalysisConfig::from_path(Path::new(p)).map_err(|e| format!("{p}: {e}")),
        None => Ok(AnalysisConfig::default()),
    }
}

/// Load the configuration, apply command-line overrides, and re-validate.
pub fn resolve_config(
    path: Option<&str>,
    overrides: impl FnOnce(&mut AnalysisConfig),
) -> Result<AnalysisConfig, String> {
    let mut config = load_config(path)?;
    overrides(&mut config);
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Sequence plus effective configuration, or exit 1.
pub fn prepare(
    args: &InputArgs,
    overrides: impl FnOnce(&mut AnalysisConfig),
) -> (Sequence, AnalysisConfig) {
    let config = resolve_config(args.config.as_deref(), overrides).unwrap_or_else(|e| fail(e));
    let sequence = read_sequence(args).unwrap_or_else(|e| fail(e));
    log::debug!("read {} symbols", sequence.len());
    (sequence, config)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => fail(format!("failed to serialize output: {e}")),
    }
}

/// Print one model's result. Insufficient data is reported, not an error exit.
pub fn report<T: Serialize>(
    json: bool,
    result: Result<T, AnalysisError>,
    human: impl FnOnce(&T),
) {
    match result {
        Err(e) if !e.is_insufficient_data() => fail(e),
        result if json => print_json(&Outcome::from(result)),
        Ok(data) => human(&data),
        Err(e) => println!("Insufficient data: {e}"),
    }
}

/// "♥ 1" style label.
pub fn label(symbol: Symbol) -> String {
    format!("{} {}", symbol.glyph(), symbol.value())
}

pub fn pct(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}
