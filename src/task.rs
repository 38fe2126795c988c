//! Running a strategy with a wall-clock budget.

use std::{
    panic,
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use log::{info, warn};

use crate::{
    cfg::Grammar,
    error::Result,
    example::Example,
    synth::Synthesizer,
    term::Program,
};

#[derive(Debug)]
pub struct TaskOutcome {
    pub program: Option<Program>,
    pub elapsed: Duration,
    pub timed_out: bool,
}

/// Runs `synth` on the current thread.
pub fn run<S: Synthesizer>(
    synth: &mut S,
    grammar: &Grammar,
    examples: &[Example],
) -> Result<TaskOutcome> {
    let start = Instant::now();
    let program = synth.synthesize(grammar, examples)?;
    let elapsed = start.elapsed();

    info!("Time taken: {}ms", elapsed.as_millis());

    Ok(TaskOutcome {
        program,
        elapsed,
        timed_out: false,
    })
}

/// Runs `synth` on a worker thread. Once `timeout` passes, the search is
/// cancelled through its token and joined; it stops at its next frontier
/// pop.
pub fn run_with_timeout<S>(
    mut synth: S,
    grammar: Grammar,
    examples: Vec<Example>,
    timeout: Duration,
) -> Result<TaskOutcome>
where
    S: Synthesizer + Send + 'static,
{
    let cancel = synth.cancel_token();
    let start = Instant::now();
    let (done_tx, done_rx) = mpsc::channel();

    let worker = thread::spawn(move || {
        let res = synth.synthesize(&grammar, &examples);
        // The receiver may be gone if the caller gave up already
        let _ = done_tx.send(());
        res
    });

    let timed_out = match done_rx.recv_timeout(timeout) {
        Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
        Err(RecvTimeoutError::Timeout) => {
            warn!("Synthesis exceeded {}ms, cancelling", timeout.as_millis());
            cancel.cancel();
            true
        },
    };

    let program = match worker.join() {
        Ok(res) => res?,
        Err(payload) => panic::resume_unwind(payload),
    };
    let elapsed = start.elapsed();

    info!("Time taken: {}ms", elapsed.as_millis());

    Ok(TaskOutcome {
        program,
        elapsed,
        timed_out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::TopDown;

    #[test]
    fn quick_search_finishes_before_deadline() {
        let examples = vec![Example::new([("x", 0), ("y", 0), ("z", 0)], 1)];
        let outcome = run_with_timeout(
            TopDown::new(),
            Grammar::arithmetic(),
            examples,
            Duration::from_secs(30),
        ).unwrap();

        assert!(!outcome.timed_out);
        assert_eq!(outcome.program.unwrap().to_string(), "1");
    }

    #[test]
    fn hopeless_search_is_cut_off() {
        let examples = vec![
            Example::new([("x", 1), ("y", 0), ("z", 0)], 1),
            Example::new([("x", 1), ("y", 0), ("z", 0)], 2),
        ];
        let outcome = run_with_timeout(
            TopDown::new(),
            Grammar::arithmetic(),
            examples,
            Duration::from_millis(50),
        ).unwrap();

        assert!(outcome.timed_out);
        assert!(outcome.program.is_none());
    }

    #[test]
    fn inline_run_reports_program() {
        let examples = vec![Example::new([("x", 4), ("y", 0), ("z", 0)], 4)];
        let outcome = run(&mut TopDown::new(), &Grammar::arithmetic(), &examples).unwrap();

        assert_eq!(outcome.program.unwrap().to_string(), "x");
    }
}
