//! solver-cli: command-line interface for the class-placement solver.
//!
//! # Commands
//!
//! - `solve`: run a solver (or the portfolio manager) on a school file
//! - `validate`: validate a school/config pair without solving
//! - `baseline`: generate a Random Swap baseline and print its statistics
//! - `schema`: print example JSON for the input/output formats

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use solver_core::config::Config;
use solver_core::constraints::validate_with_min_friends;
use solver_core::domain::School;
use solver_core::initializer::Strategy;
use solver_core::portfolio;
use solver_core::scorer::score;
use solver_core::solver::random_swap::RandomSwapParams;
use solver_core::solver::{Solver, SolverConfig};
use solver_core::baseline;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "solver-cli")]
#[command(version = "0.1.0")]
#[command(about = "Class-placement solver CLI - AI-testable optimization", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a solver (or the full portfolio) on a school file
    Solve {
        /// Input JSON file path (use --stdin to read from stdin)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        #[arg(long)]
        stdin: bool,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        pretty: bool,

        /// Which solver to run
        #[arg(long, value_enum, default_value = "random-swap")]
        solver: SolverArg,

        #[arg(long, default_value_t = 1000)]
        max_iterations: u64,

        /// Auto-initialize unassigned students before solving
        #[arg(long, default_value_t = true)]
        auto_initialize: bool,

        /// Seed for the solver's RNG
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Validate a school file against its config without solving
    Validate {
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        #[arg(long)]
        stdin: bool,
    },

    /// Generate a Random Swap baseline and print its statistics
    Baseline {
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        #[arg(long)]
        stdin: bool,

        #[arg(long, default_value_t = 20)]
        num_runs: usize,

        #[arg(long, default_value_t = 500)]
        max_iterations_per_run: u64,

        #[arg(long)]
        pretty: bool,
    },

    /// Print example input JSON
    Schema,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SolverArg {
    RandomSwap,
    LocalSearch,
    SimulatedAnnealing,
    Genetic,
}

impl From<SolverArg> for Solver {
    fn from(arg: SolverArg) -> Self {
        match arg {
            SolverArg::RandomSwap => Solver::RandomSwap,
            SolverArg::LocalSearch => Solver::LocalSearch,
            SolverArg::SimulatedAnnealing => Solver::SimulatedAnnealing,
            SolverArg::Genetic => Solver::Genetic,
        }
    }
}

/// The CLI's on-disk input shape: a school plus the config it should be
/// scored/solved under. Loading/validating richer roster formats (CSV, an
/// external YAML config loader) is an external collaborator's job, not this
/// binary's.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct SchoolFile {
    school: School,
    #[serde(default)]
    config: Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            input,
            stdin,
            output,
            pretty,
            solver,
            max_iterations,
            auto_initialize,
            seed,
        } => cmd_solve(input, stdin, output, pretty, solver, max_iterations, auto_initialize, seed),

        Commands::Validate { input, stdin } => cmd_validate(input, stdin),

        Commands::Baseline {
            input,
            stdin,
            num_runs,
            max_iterations_per_run,
            pretty,
        } => cmd_baseline(input, stdin, num_runs, max_iterations_per_run, pretty),

        Commands::Schema => cmd_schema(),
    }
}

fn read_input(file: Option<PathBuf>, use_stdin: bool) -> Result<String> {
    if use_stdin {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else if let Some(path) = file {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path))
    } else {
        anyhow::bail!("Either provide an input file or use --stdin")
    }
}

fn load_school_file(input: Option<PathBuf>, stdin: bool) -> Result<SchoolFile> {
    let json_str = read_input(input, stdin)?;
    serde_json::from_str(&json_str).context("Failed to parse input JSON")
}

fn print_json<T: Serialize>(value: &T, pretty: bool, output: Option<PathBuf>) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    if let Some(path) = output {
        fs::write(&path, &text).with_context(|| format!("Failed to write output to {:?}", path))?;
        eprintln!("Result written to {:?}", path);
    } else {
        println!("{text}");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_solve(
    input: Option<PathBuf>,
    stdin: bool,
    output: Option<PathBuf>,
    pretty: bool,
    solver: SolverArg,
    max_iterations: u64,
    auto_initialize: bool,
    seed: Option<u64>,
) -> Result<()> {
    let file = load_school_file(input, stdin)?;
    let solver_config = SolverConfig {
        seed,
        ..SolverConfig::default()
    };

    eprintln!("Running {:?}...", solver);
    let result = portfolio::optimize(
        &file.school,
        &file.config,
        solver.into(),
        max_iterations,
        &solver_config,
        Strategy::Balanced,
        auto_initialize,
        None,
    );

    print_json(&result, pretty, output)
}

fn cmd_validate(input: Option<PathBuf>, stdin: bool) -> Result<()> {
    let file = load_school_file(input, stdin)?;
    let (ok, violations) = validate_with_min_friends(&file.school, &file.config, 0);
    if ok {
        println!("{{\"valid\": true}}");
    } else {
        let violations_json = serde_json::to_string(&violations)?;
        println!("{{\"valid\": false, \"violations\": {violations_json}}}");
    }
    Ok(())
}

fn cmd_baseline(
    input: Option<PathBuf>,
    stdin: bool,
    num_runs: usize,
    max_iterations_per_run: u64,
    pretty: bool,
) -> Result<()> {
    let file = load_school_file(input, stdin)?;
    eprintln!("Running {num_runs} baseline Random Swap passes...");
    let stats = baseline::generate_baseline(
        &file.school,
        &file.config,
        num_runs,
        max_iterations_per_run,
        &RandomSwapParams::default(),
    );
    print_json(&stats, pretty, None)
}

fn cmd_schema() -> Result<()> {
    let school = School::new();
    let config = Config::default();
    let scoring = score(&school, &config);
    let example = SchoolFile { school, config };
    println!("{{\"school_file\": {}, \"scoring_result\": {}}}",
        serde_json::to_string_pretty(&example)?,
        serde_json::to_string_pretty(&scoring)?,
    );
    Ok(())
}
