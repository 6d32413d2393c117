pub mod audit;
pub mod demo;
pub mod feasibility;
pub mod model;
pub mod scoring;
pub mod state;

use std::collections::HashSet;
use thiserror::Error;

pub use audit::audit;
pub use model::{Model, Rules, Slot};
pub use state::{Mutation, Placement, ScheduleState, Trail};
pub use types::{
    ClassroomTimetable, DemandUnit, Instance, SolveEnvelope, SolveParams, SolveResult,
    SolveStatus, ValidationReport,
};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid instance: {0}")]
    Msg(String),
}

pub fn validate(inst: &Instance) -> Result<(), ValidationError> {
    let mut errors: Vec<String> = Vec::new();

    if inst.days == 0 {
        errors.push("days must be positive".into());
    }
    if inst.periods_per_day == 0 {
        errors.push("periodsPerDay must be positive".into());
    }
    if inst.policy.max_daily_load == 0 {
        errors.push("maxDailyLoad must be positive".into());
    }
    if !inst.policy.strict_adjacency && inst.policy.max_consecutive == 0 {
        errors.push("maxConsecutive must be positive unless strictAdjacency is set".into());
    }

    fn chk_unique<'a>(name: &str, ids: impl Iterator<Item = &'a str>, errors: &mut Vec<String>) {
        let mut seen = HashSet::new();
        for id in ids {
            if id.is_empty() {
                errors.push(format!("empty {name} id"));
            } else if !seen.insert(id) {
                errors.push(format!("duplicate {name} id: {id}"));
            }
        }
    }
    chk_unique(
        "teacher",
        inst.teachers.iter().map(|x| x.0.as_str()),
        &mut errors,
    );
    chk_unique(
        "subject",
        inst.subjects.iter().map(|x| x.id.0.as_str()),
        &mut errors,
    );
    chk_unique(
        "classroom",
        inst.classrooms.iter().map(|x| x.0.as_str()),
        &mut errors,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Msg(errors.join("; ")))
    }
}

/// A complete solve run: instance and parameters in, timetables and report out.
///
/// Implementations return `Err` only for malformed input. An instance that
/// cannot be fully scheduled yields `Ok` with [`SolveStatus::Infeasible`].
pub trait Solver {
    fn solve(&self, env: SolveEnvelope) -> anyhow::Result<SolveResult>;
}
