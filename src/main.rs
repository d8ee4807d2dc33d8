//! Creed Compiler Backend
//!
//! Resolves the types of a parsed Creed declaration tree and lowers it to C.

mod backend;
mod driver;
mod feedback;
mod fixtures;
mod frontend;
mod types;
mod utils;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use driver::Options;
use feedback::{CompilationFeedback, CompilationStats, ErrorReport};

/// Creed Compiler
#[derive(Parser, Debug)]
#[command(name = "creedc")]
#[command(version = "0.1.0")]
#[command(about = "Creed compiler backend - type resolution and C code generation")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input declaration tree (.json)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Skip type resolution before generating code
    #[arg(long, global = true)]
    no_resolve: bool,

    /// Start the output with a generated-by comment
    #[arg(long, global = true)]
    banner: bool,

    /// Report results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a declaration tree to C
    Build {
        /// Input declaration tree
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a declaration tree for errors
    Check {
        /// Input declaration tree
        input: PathBuf,
    },
    /// Run the built-in fixtures
    Selftest,
    /// Print the declaration tree of a built-in fixture as JSON
    Fixture {
        /// Fixture name
        name: String,
    },
    /// Print version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match &cli.command {
        Some(Commands::Build { input, output }) => {
            build_file(input, output.clone().or_else(|| cli.output.clone()), &cli)
        }
        Some(Commands::Check { input }) => check_file(input, &cli),
        Some(Commands::Selftest) => selftest(),
        Some(Commands::Fixture { name }) => print_fixture(name),
        Some(Commands::Version) => {
            println!("creedc 0.1.0");
            println!("Creed Compiler Backend");
            println!("License: Apache-2.0");
            Ok(())
        }
        // Default: compile the input file, or run the fixtures without one
        None => match &cli.input {
            Some(input) => build_file(input, cli.output.clone(), &cli),
            None => selftest(),
        },
    };

    if let Err(e) = outcome {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Print a failure as JSON feedback when requested, then hand it back
fn report(error: utils::Error, input: &Path, cli: &Cli) -> anyhow::Error {
    if cli.json {
        let name = input.display().to_string();
        let report = ErrorReport::from_error(&error, &name);
        println!(
            "{}",
            CompilationFeedback::failure(name, vec![report], CompilationStats::default()).to_json()
        );
    }
    anyhow::Error::new(error).context(format!("failed to compile {}", input.display()))
}

/// Compile a declaration tree to C
fn build_file(input: &Path, output: Option<PathBuf>, cli: &Cli) -> Result<()> {
    let options = Options { resolve: !cli.no_resolve, banner: cli.banner, output };
    if !cli.json {
        println!("Creed Compiler v0.1.0");
        println!("Compiling: {}", input.display());
    }

    let build = driver::build(input, &options).map_err(|e| report(e, input, cli))?;

    if cli.json {
        let name = input.display().to_string();
        println!("{}", CompilationFeedback::success(name, build.stats).to_json());
        return Ok(());
    }
    let stats = &build.stats;
    println!(
        "  [✓] Loaded {} declarations ({} types, {} variables, {} functions)",
        stats.type_count + stats.variable_count + stats.function_count,
        stats.type_count,
        stats.variable_count,
        stats.function_count
    );
    if options.resolve {
        println!("  [✓] Types resolved");
    }
    println!("  [✓] Generated C code ({} bytes)", stats.output_bytes);
    println!("\n✅ Output: {}", build.output.display());
    Ok(())
}

/// Check a declaration tree for errors without generating code
fn check_file(input: &Path, cli: &Cli) -> Result<()> {
    if !cli.json {
        println!("Checking: {}", input.display());
    }

    let stats = driver::check(input).map_err(|e| report(e, input, cli))?;

    if cli.json {
        let name = input.display().to_string();
        println!("{}", CompilationFeedback::success(name, stats).to_json());
    } else {
        println!("✅ No errors found");
    }
    Ok(())
}

fn selftest() -> Result<()> {
    println!("Creed self-test");
    let results = fixtures::run_all();
    let mut failed = 0;
    for (name, outcome) in &results {
        match outcome {
            Ok(()) => println!("  [✓] {}", name),
            Err(reason) => {
                failed += 1;
                println!("  [✗] {}: {}", name, reason);
            }
        }
    }
    if failed > 0 {
        bail!("{} of {} fixtures failed", failed, results.len());
    }
    println!("\n✅ {} fixtures passed", results.len());
    Ok(())
}

fn print_fixture(name: &str) -> Result<()> {
    let fixture = fixtures::find(name).ok_or_else(|| {
        let names: Vec<_> = fixtures::all().iter().map(|f| f.name).collect();
        anyhow!("unknown fixture `{}` (available: {})", name, names.join(", "))
    })?;
    let json = serde_json::to_string_pretty(&(fixture.build)())
        .context("failed to serialize the fixture")?;
    println!("{}", json);
    Ok(())
}
