pub mod backtrack;
pub mod construct;
pub mod priority;
pub mod repair;

use backtrack::{backtrack, SearchOutcome, SearchReport};
use construct::construct;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use repair::{repair, RepairConfig};
use sched_core::scoring::compute_soft_scores;
use sched_core::{
    audit, validate, DemandUnit, Model, ScheduleState, SolveEnvelope, SolveResult, SolveStatus,
    Solver,
};
use tracing::{error, info, warn};
use types::{Instance, SolveParams};

pub struct HeurSolver;
impl HeurSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HeurSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for HeurSolver {
    fn solve(&self, env: SolveEnvelope) -> anyhow::Result<SolveResult> {
        validate(&env.instance)?;
        Ok(solve_instance(&env.instance, &env.params))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Method {
    Greedy,
    GreedyRepair,
    Backtracking,
    /// Nothing succeeded; the most complete greedy schedule is reported.
    BestEffort,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Method::Greedy => "greedy",
            Method::GreedyRepair => "greedy+repair",
            Method::Backtracking => "backtracking",
            Method::BestEffort => "best-effort",
        }
    }
}

#[derive(Debug, Default)]
struct RunStats {
    attempts: u32,
    relocations: usize,
    search: Option<SearchReport>,
}

/// Construct, repair and retry, then fall back to backtracking.
///
/// The instance is assumed valid (see [`sched_core::validate`]). The same
/// instance and params always produce the same result.
pub fn solve_instance(inst: &Instance, params: &SolveParams) -> SolveResult {
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let model = Model::new(inst).with_adjacency_bonus(params.adjacency_bonus);
    let mut state = ScheduleState::new(&model);
    let cfg = RepairConfig {
        rounds: params.repair_rounds,
        sample: params.repair_sample as usize,
    };
    let mut stats = RunStats::default();
    let mut best: Option<ScheduleState> = None;

    info!(
        classrooms = model.classrooms,
        teachers = model.teachers,
        demand = model.demand_per_classroom(),
        slots = model.slots_per_classroom(),
        seed = params.seed,
        "solving"
    );

    for attempt in 1..=params.attempts {
        stats.attempts = attempt;
        state.reset();

        let mut unresolved = construct(&mut state, &mut rng);
        info!(attempt, unresolved = unresolved.len(), "greedy pass finished");
        if unresolved.is_empty() {
            return finish(inst, &state, Method::Greedy, &stats, params);
        }

        if params.repair {
            let out = repair(&mut state, unresolved, &cfg, &mut rng);
            stats.relocations += out.relocations;
            unresolved = out.unresolved;
            info!(
                attempt,
                direct = out.direct,
                relocations = out.relocations,
                unresolved = unresolved.len(),
                "repair pass finished"
            );
            if unresolved.is_empty() && state.is_complete() {
                return finish(inst, &state, Method::GreedyRepair, &stats, params);
            }
        }

        if best
            .as_ref()
            .map_or(true, |b| missing(&state) < missing(b))
        {
            best = Some(state.clone());
        }
    }

    if params.backtracking {
        state.reset();
        let search = backtrack(&mut state, params.backtrack_node_limit, &mut rng);
        stats.search = Some(search);
        info!(
            outcome = search.outcome.as_str(),
            nodes = search.nodes,
            "backtracking finished"
        );
        if search.outcome == SearchOutcome::Solved {
            return finish(inst, &state, Method::Backtracking, &stats, params);
        }
    }

    let best = best.unwrap_or(state);
    warn!(missing = missing(&best), "no complete schedule found");
    finish(inst, &best, Method::BestEffort, &stats, params)
}

fn missing(state: &ScheduleState) -> u32 {
    (0..state.model().classrooms)
        .map(|c| state.demand_left(c))
        .sum()
}

/// One [`DemandUnit`] per missing period, classroom by classroom.
pub fn unresolved_units(inst: &Instance, state: &ScheduleState) -> Vec<DemandUnit> {
    let mut out = Vec::new();
    for (c, classroom) in inst.classrooms.iter().enumerate() {
        for (s, subject) in inst.subjects.iter().enumerate() {
            for _ in 0..state.remaining(c, s) {
                out.push(DemandUnit {
                    classroom_id: classroom.clone(),
                    subject_id: subject.id.clone(),
                });
            }
        }
    }
    out
}

fn finish(
    inst: &Instance,
    state: &ScheduleState,
    method: Method,
    stats: &RunStats,
    params: &SolveParams,
) -> SolveResult {
    let timetables = state.to_timetables(inst);
    let report = audit(inst, &timetables);
    if !report.is_consistent() {
        error!(method = method.as_str(), ?report, "schedule breaks hard constraints");
    } else if method != Method::BestEffort && !report.is_complete() {
        error!(method = method.as_str(), ?report, "claimed success with quotas unmet");
    }

    let status = if report.is_valid() {
        SolveStatus::Solved
    } else {
        SolveStatus::Infeasible
    };
    let scores = compute_soft_scores(inst, &timetables);
    let stats = serde_json::json!({
        "method": method.as_str(),
        "seed": params.seed,
        "attempts": stats.attempts,
        "relocations": stats.relocations,
        "backtracking": stats.search.map(|s| serde_json::json!({
            "outcome": s.outcome.as_str(),
            "nodes": s.nodes,
            "maxDepth": s.max_depth,
        })),
        "missing": report.missing_periods(),
        "windows": scores.windows_total,
        "lastPeriodLessons": scores.last_period_lessons,
        "loadImbalance": scores.load_imbalance,
        "objective": scores.objective,
    });

    SolveResult {
        status,
        unresolved: unresolved_units(inst, state),
        timetables,
        report,
        stats,
    }
}
