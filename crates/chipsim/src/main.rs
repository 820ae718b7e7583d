use std::fmt::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chipsim_compile::Compiler;
use chipsim_core::{Row, TruthTableOptions};
use clap::Parser;
use tracing::info;

/// Application configuration.
#[derive(clap::Parser, Debug)]
#[clap(version, about)]
struct Args {
    /// The main command to run.
    #[command(subcommand)]
    subcommand: Subcommand,

    /// The global options.
    #[clap(flatten)]
    global: GlobalArgs,
}

/// Global configuration options.
#[derive(clap::Args, Debug)]
struct GlobalArgs {
    /// More logging; repeat for more.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Subcommand, Debug)]
enum Subcommand {
    /// Print a generated truth table for a chip.
    Table(TableArgs),
    /// Check a chip against the truth table of the built-in chip of the
    /// same name.
    Check(CheckArgs),
    /// List the built-in chips.
    Builtins,
}

#[derive(clap::Args, Debug)]
struct TableArgs {
    #[arg()]
    file: PathBuf,

    /// Sample wide inputs from entropy instead of a fixed seed.
    #[arg(long)]
    random: bool,

    #[arg(long)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct CheckArgs {
    #[arg()]
    file: PathBuf,

    #[arg(long)]
    json: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let log_level = match args.global.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    match args.subcommand {
        Subcommand::Table(table_args) => cmd_table(&table_args),
        Subcommand::Check(check_args) => cmd_check(&check_args),
        Subcommand::Builtins => Ok(cmd_builtins()),
    }
}

fn cmd_table(args: &TableArgs) -> Result<ExitCode> {
    let mut compiler = Compiler::default();
    let definition = compiler
        .compile_file(&args.file)
        .with_context(|| format!("compiling {}", args.file.display()))?;
    let mut circuit = definition.instantiate()?;
    let options = TruthTableOptions::new().with_enforce_random(args.random);
    let table = circuit.generate_truth_table(options)?;
    info!(chip = definition.name(), rows = table.len(), "generated");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&table)?);
    } else {
        print!("{}", render(&table));
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_check(args: &CheckArgs) -> Result<ExitCode> {
    let mut compiler = Compiler::default();
    let definition = compiler
        .compile_file(&args.file)
        .with_context(|| format!("compiling {}", args.file.display()))?;
    let name = definition.name();
    let builtin = compiler
        .registry()
        .get(name)
        .with_context(|| format!("no built-in chip named `{name}` to check against"))?;
    let expected = &builtin.spec().truth_table;
    if expected.is_empty() {
        anyhow::bail!("built-in `{name}` has no truth table");
    }

    let report = definition.instantiate()?.exec_on_data(expected)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.is_clean() {
        println!("{name}: {} rows ok", expected.len());
    } else {
        for conflict in &report.conflicts {
            println!(
                "{name}: row {} differs on {}",
                conflict.row + 1,
                conflict.pins.join(", ")
            );
        }
    }
    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_builtins() -> ExitCode {
    let compiler = Compiler::default();
    for gate in compiler.registry().iter() {
        let marker = if gate.is_clocked() { " (clocked)" } else { "" };
        println!("{}{marker}: {}", gate.name(), gate.spec().description);
    }
    ExitCode::SUCCESS
}

/// Rows as a `| a | b | out |` table. Column names come from the first row.
fn render(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };
    let mut columns = first.iter().map(|(name, _)| name.to_owned()).collect::<Vec<_>>();
    let clocked = first.clock().is_some();
    if clocked {
        columns.insert(0, "time".to_owned());
    }

    let cells = rows
        .iter()
        .map(|row| {
            let clock = row.clock().map(|clock| clock.to_string());
            clock
                .into_iter()
                .chain(row.iter().map(|(_, value)| value.to_string()))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let widths = (0..columns.len())
        .map(|k| {
            cells
                .iter()
                .map(|row| row.get(k).map_or(0, String::len))
                .chain([columns[k].len()])
                .max()
                .unwrap_or(0)
        })
        .collect::<Vec<_>>();

    let mut out = String::new();
    for line in std::iter::once(&columns).chain(&cells) {
        out.push('|');
        for (cell, width) in line.iter().zip(&widths) {
            let _ = write!(out, " {cell:^width$} |");
        }
        out.push('\n');
    }
    out
}
