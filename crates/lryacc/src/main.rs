use anyhow::Context as _;
use clap::Parser;
use lryacc::{first_sets::FirstSets, lr1::Automaton, table, Grammar};
use std::{fs, path::PathBuf, time::Instant};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path of grammar definition file.
    input: PathBuf,

    /// Write the dump to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Include the item sets of the LR(1) automaton in the dump.
    #[arg(long)]
    automaton: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::trace!("CLI args = {:?}", args);

    let grammar = Grammar::<()>::from_file(&args.input)
        .with_context(|| format!("failed to read the grammar from {}", args.input.display()))?;

    let mut empty_expressions = vec![];
    for expr in grammar.expressions() {
        if expr.alternatives().is_empty() {
            empty_expressions.push(expr.name());
        }
    }
    if !empty_expressions.is_empty() {
        eprintln!(
            "[warning] The following expressions have no alternative: {:?}",
            empty_expressions
        );
    }

    let cfg = grammar.cfg();
    let started = Instant::now();
    let first_sets = FirstSets::new(cfg);
    let automaton = Automaton::generate(cfg, &first_sets);
    tracing::debug!("automaton generated in {:?}", started.elapsed());

    let table = table::compile(cfg, &automaton).context("failed to compile the parse table")?;
    tracing::debug!("table compiled in {:?}", started.elapsed());

    let mut dump = grammar.to_string();
    if args.automaton {
        dump.push('\n');
        dump += &automaton.display(cfg).to_string();
    }
    dump.push('\n');
    dump += &table.to_string();

    match &args.output {
        Some(output) => fs::write(output, dump)
            .with_context(|| format!("failed to write the dump to {}", output.display()))?,
        None => print!("{}", dump),
    }

    Ok(())
}
