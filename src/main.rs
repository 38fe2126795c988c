use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::{Parser, ValueEnum};
use log::{error, info, LevelFilter};

use cfgsynth::{
    cfg::Grammar,
    example::{parse_examples, Example},
    synth::{DivideAndConquer, Synthesizer, TopDown},
    task::{self, TaskOutcome},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    TopDown,
    DivideConquer,
    /// Needs the `solver` feature
    ConstraintBased,
}

/// Synthesizes a program over x, y, z that agrees with the given examples.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// File with one `x=1, y=2, z=3 -> 5` example per line
    examples: PathBuf,

    #[arg(short, long, value_enum, default_value_t = Strategy::TopDown)]
    strategy: Strategy,

    /// Cancel the search after this many milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Do not explore terms deeper than this
    #[arg(long)]
    max_depth: Option<usize>,

    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: LevelFilter,
}

fn main() -> ExitCode {
    let args = Args::parse();

    colog::default_builder()
        .filter_level(args.log_level)
        .init();

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        },
    }
}

fn run(args: Args) -> cfgsynth::Result<bool> {
    let text = std::fs::read_to_string(&args.examples)?;
    let examples = parse_examples(&text)?;
    let grammar = Grammar::arithmetic();
    let timeout = args.timeout_ms.map(Duration::from_millis);

    info!("Started {:?} on {} examples", args.strategy, examples.len());

    let outcome = match args.strategy {
        Strategy::TopDown => launch(
            TopDown::new().with_max_depth(args.max_depth),
            grammar,
            examples,
            timeout,
        )?,
        Strategy::DivideConquer => launch(
            DivideAndConquer::new().with_max_depth(args.max_depth),
            grammar,
            examples,
            timeout,
        )?,
        Strategy::ConstraintBased => match constraint_based(args.max_depth, grammar, examples, timeout)? {
            Some(outcome) => outcome,
            None => return Ok(false),
        },
    };

    match &outcome.program {
        Some(program) => println!("{program}"),
        None if outcome.timed_out => println!("<timed out>"),
        None => println!("<no program>"),
    }

    Ok(outcome.program.is_some())
}

fn launch<S>(
    mut synth: S,
    grammar: Grammar,
    examples: Vec<Example>,
    timeout: Option<Duration>,
) -> cfgsynth::Result<TaskOutcome>
where
    S: Synthesizer + Send + 'static,
{
    match timeout {
        Some(timeout) => task::run_with_timeout(synth, grammar, examples, timeout),
        None => task::run(&mut synth, &grammar, &examples),
    }
}

#[cfg(feature = "solver")]
fn constraint_based(
    max_depth: Option<usize>,
    grammar: Grammar,
    examples: Vec<Example>,
    timeout: Option<Duration>,
) -> cfgsynth::Result<Option<TaskOutcome>> {
    let synth = cfgsynth::synth::ConstraintBased::new().with_max_depth(max_depth);

    launch(synth, grammar, examples, timeout).map(Some)
}

#[cfg(not(feature = "solver"))]
fn constraint_based(
    _max_depth: Option<usize>,
    _grammar: Grammar,
    _examples: Vec<Example>,
    _timeout: Option<Duration>,
) -> cfgsynth::Result<Option<TaskOutcome>> {
    error!("cfgsynth was built without the `solver` feature");

    Ok(None)
}
