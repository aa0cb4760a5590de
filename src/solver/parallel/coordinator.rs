//! Parallel search coordinator that manages worker threads.

use crate::error::SolveError;
use crate::solver::config::SolverConfig;
use crate::solver::parallel::channel::{
    create_channels, BranchResult, BranchTask, CoordinatorChannels, WorkerChannels, WorkerMessage,
};
use crate::solver::search::{DigitSearch, SearchOutcome};
use crate::solver::statistics::{SolveStatistics, SolverOutcome, Strategy};
use crate::solver::{Objective, Problem};
use crossbeam_channel::RecvTimeoutError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Run the digit search with top-level branches spread over worker threads.
pub fn run_parallel_search(
    problem: Arc<Problem>,
    objective: Objective,
    config: &SolverConfig,
    deadline: Option<Instant>,
) -> Result<SolverOutcome, SolveError> {
    let num_workers = config.parallel.num_workers;
    let tasks = objective
        .digit_order()
        .into_iter()
        .enumerate()
        .map(|(rank, digit)| BranchTask { rank, digit });

    // Create communication channels
    let (coordinator_channels, worker_channels) = create_channels(num_workers, tasks);

    let config = Arc::new(config.clone());

    let worker_handles: Vec<_> = worker_channels
        .into_iter()
        .enumerate()
        .map(|(worker_id, channels)| {
            let problem = Arc::clone(&problem);
            let config = Arc::clone(&config);

            std::thread::spawn(move || {
                run_worker(worker_id, &problem, objective, &config, deadline, channels)
            })
        })
        .collect();

    // Run coordinator loop
    let (results, mut statistics) = run_coordinator(coordinator_channels, num_workers, deadline);

    // Wait for all workers to finish
    for handle in worker_handles {
        if handle.join().is_err() {
            warn!("search worker panicked");
        }
    }

    statistics.workers = num_workers;
    let digits = decide(results)?;
    Ok(SolverOutcome { digits, statistics })
}

/// Coordinator loop that receives branch results from workers.
fn run_coordinator(
    channels: CoordinatorChannels,
    num_workers: usize,
    deadline: Option<Instant>,
) -> (Vec<Option<BranchResult>>, SolveStatistics) {
    let mut results: Vec<Option<BranchResult>> = vec![None; 9];
    let mut statistics = SolveStatistics::new(Strategy::Search);
    let mut finished_count = 0;

    loop {
        // Check if we've exceeded timeout
        if deadline.is_some_and(|d| Instant::now() >= d) && !channels.shared.should_stop() {
            debug!("deadline reached, stopping workers");
            channels.shared.signal_stop();
        }

        // Receive with timeout to allow periodic checks
        match channels.from_workers.recv_timeout(Duration::from_millis(100)) {
            Ok(WorkerMessage::Branch {
                worker_id,
                task,
                result,
                statistics: branch_statistics,
            }) => {
                debug!(
                    worker_id,
                    digit = task.digit,
                    ?result,
                    visited = branch_statistics.nodes_visited,
                    "branch finished"
                );
                match &result {
                    BranchResult::Solved(_) => {
                        channels.shared.try_update(task.rank);
                    }
                    BranchResult::Failed(_) => channels.shared.signal_stop(),
                    BranchResult::Exhausted | BranchResult::Abandoned => {}
                }
                statistics.merge(&branch_statistics);
                if let Some(slot) = results.get_mut(task.rank) {
                    *slot = Some(result);
                }
            }
            Ok(WorkerMessage::Finished { .. }) => {
                finished_count += 1;
                if finished_count >= num_workers {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                // All senders dropped, we're done
                break;
            }
        }
    }

    (results, statistics)
}

/// Pick the answer from per-branch results, in preference order.
///
/// The first solved branch wins only if every better branch was exhausted.
fn decide(results: Vec<Option<BranchResult>>) -> Result<Vec<u8>, SolveError> {
    let stop_reason = results
        .iter()
        .find_map(|r| match r {
            Some(BranchResult::Failed(e)) => Some(e.clone()),
            _ => None,
        })
        .unwrap_or(SolveError::Timeout("wall-clock"));

    for result in results {
        match result {
            Some(BranchResult::Solved(digits)) => return Ok(digits),
            Some(BranchResult::Exhausted) => {}
            Some(BranchResult::Failed(e)) => return Err(e),
            Some(BranchResult::Abandoned) | None => return Err(stop_reason),
        }
    }
    Err(SolveError::NoSolution)
}

/// Worker function that searches branches until the queue is empty.
fn run_worker(
    worker_id: usize,
    problem: &Problem,
    objective: Objective,
    config: &SolverConfig,
    deadline: Option<Instant>,
    channels: WorkerChannels,
) {
    let shared = channels.shared.as_ref();
    let mut search = DigitSearch::new(problem, objective, config, deadline).with_shared(shared);

    for task in channels.tasks.iter() {
        let result = if shared.should_stop() || shared.current_best() < task.rank {
            BranchResult::Abandoned
        } else {
            search.set_rank(task.rank);
            match search.run_from(&[task.digit]) {
                Ok(SearchOutcome::Found(digits)) => {
                    shared.try_update(task.rank);
                    BranchResult::Solved(digits)
                }
                Ok(SearchOutcome::Exhausted) => BranchResult::Exhausted,
                Ok(SearchOutcome::Abandoned) => BranchResult::Abandoned,
                Err(e) => {
                    shared.signal_stop();
                    BranchResult::Failed(e)
                }
            }
        };

        let _ = channels.to_coordinator.send(WorkerMessage::Branch {
            worker_id,
            task,
            result,
            statistics: search.take_statistics(),
        });
    }

    let _ = channels
        .to_coordinator
        .send(WorkerMessage::Finished { worker_id });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::ir::Program;
    use crate::optimizer::{optimize, OptimizerConfig};
    use crate::solver::search::run_search;

    fn problem(text: &str) -> Arc<Problem> {
        let program: Program = text.parse().unwrap();
        let mut built = build(&program).unwrap();
        let root = built.root();
        optimize(&mut built.table, &[root], &OptimizerConfig::default()).unwrap();
        Arc::new(Problem::from_built(built, &program))
    }

    const PROGRAM: &str = "inp w\ninp x\ninp y\nmul w x\nmod w 7\nadd w y\nadd w -8\n\
                           eql w 0\neql w 0\nadd z w";

    #[test]
    fn test_parallel_matches_sequential() {
        let problem = problem(PROGRAM);
        for workers in [2, 4, 9] {
            let config = SolverConfig::default().with_workers(workers);
            for objective in [Objective::Max, Objective::Min] {
                let parallel = run_parallel_search(Arc::clone(&problem), objective, &config, None)
                    .unwrap();
                let sequential = run_search(&problem, objective, &config, None).unwrap();
                assert_eq!(parallel.digits, sequential.digits);
                assert_eq!(parallel.statistics.workers, workers);
            }
        }
    }

    #[test]
    fn test_parallel_no_solution() {
        let problem = problem("inp w\ninp x\nmul w x\nadd z w\nadd z -11");
        let config = SolverConfig::default().with_workers(3);
        assert_eq!(
            run_parallel_search(problem, Objective::Max, &config, None).unwrap_err(),
            SolveError::NoSolution
        );
    }

    #[test]
    fn test_parallel_node_bound() {
        let problem = problem(PROGRAM);
        let config = SolverConfig::default().with_workers(2).with_max_nodes(2);
        assert_eq!(
            run_parallel_search(problem, Objective::Min, &config, None).unwrap_err(),
            SolveError::Timeout("node")
        );
    }

    #[test]
    fn test_decide_requires_better_branches_exhausted() {
        let solved = Some(BranchResult::Solved(vec![8, 1]));
        assert_eq!(
            decide(vec![Some(BranchResult::Exhausted), solved.clone()]),
            Ok(vec![8, 1])
        );
        assert_eq!(
            decide(vec![Some(BranchResult::Abandoned), solved.clone()]),
            Err(SolveError::Timeout("wall-clock"))
        );
        assert_eq!(
            decide(vec![solved, Some(BranchResult::Failed(SolveError::Timeout("node")))]),
            Ok(vec![8, 1])
        );
        assert_eq!(
            decide(vec![Some(BranchResult::Exhausted), None]),
            Err(SolveError::Timeout("wall-clock"))
        );
        assert_eq!(
            decide(vec![Some(BranchResult::Exhausted); 9]),
            Err(SolveError::NoSolution)
        );
    }
}
