//! Chronological backtracking over every (classroom, slot) cell.
//!
//! The recursion of a textbook backtracker is kept as an explicit stack of
//! [`Frame`]s, one per visited cell, each holding the choices not yet tried.
//! Memory is bounded by the number of cells and the search can stop after a
//! caller-supplied node budget. A branch is cut as soon as some classroom
//! has more demand left than unvisited cells.

use crate::priority::rank_needed_subjects;
use rand::seq::SliceRandom;
use rand::Rng;
use sched_core::feasibility::rank_available_teachers;
use sched_core::{Mutation, Placement, ScheduleState, Slot};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    Solved,
    /// Every branch failed; the instance has no complete schedule.
    Exhausted,
    /// The node budget ran out first.
    NodeLimit,
}

impl SearchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchOutcome::Solved => "solved",
            SearchOutcome::Exhausted => "exhausted",
            SearchOutcome::NodeLimit => "node_limit",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub nodes: u64,
    pub max_depth: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Choice {
    Teach { teacher: usize, subject: usize },
    Leave,
}

struct Frame {
    index: usize,
    choices: Vec<Choice>,
    next: usize,
    applied: Option<Mutation>,
}

impl Frame {
    /// Applies the next untried choice. `false` once all are used up.
    fn advance(&mut self, state: &mut ScheduleState, classroom: usize, slot: Slot) -> bool {
        let Some(&choice) = self.choices.get(self.next) else {
            return false;
        };
        self.next += 1;
        self.applied = match choice {
            Choice::Teach { teacher, subject } => Some(state.assign(Placement {
                classroom,
                slot,
                teacher,
                subject,
            })),
            Choice::Leave => None,
        };
        true
    }
}

/// Searches for a complete schedule starting from an empty `state`.
///
/// On success the state holds the schedule. Otherwise every tentative
/// assignment has been undone and the state is empty again.
pub fn backtrack<R: Rng + ?Sized>(
    state: &mut ScheduleState,
    node_limit: Option<u64>,
    rng: &mut R,
) -> SearchReport {
    debug_assert_eq!(state.filled(), 0, "backtracking expects a reset state");
    let model = state.model().clone();

    let mut order: Vec<(usize, Slot)> = (0..model.classrooms)
        .flat_map(|c| model.slots().map(move |s| (c, s)))
        .collect();
    order.shuffle(rng);

    // unvisited[c][i]: cells of classroom c at positions >= i
    let mut unvisited = vec![vec![0u32; order.len() + 1]; model.classrooms];
    for i in (0..order.len()).rev() {
        for (c, row) in unvisited.iter_mut().enumerate() {
            row[i] = row[i + 1] + u32::from(order[i].0 == c);
        }
    }

    let mut stack: Vec<Frame> = Vec::with_capacity(order.len());
    let mut index = 0usize;
    let mut nodes = 0u64;
    let mut max_depth = 0usize;

    let outcome = loop {
        let viable = (0..model.classrooms).all(|c| state.demand_left(c) <= unvisited[c][index]);
        if !viable {
            match retreat(&mut stack, state, &order) {
                Some(next) => {
                    index = next;
                    continue;
                }
                None => break SearchOutcome::Exhausted,
            }
        }
        if index == order.len() {
            break SearchOutcome::Solved;
        }
        if node_limit.is_some_and(|limit| nodes >= limit) {
            unwind(&mut stack, state);
            break SearchOutcome::NodeLimit;
        }
        nodes += 1;

        let (classroom, slot) = order[index];
        let subjects = rank_needed_subjects(state, classroom, rng);
        let teachers = if subjects.is_empty() {
            Vec::new()
        } else {
            rank_available_teachers(state, slot, rng)
        };

        let mut choices: Vec<Choice> = teachers
            .iter()
            .flat_map(|&teacher| {
                subjects
                    .iter()
                    .map(move |&subject| Choice::Teach { teacher, subject })
            })
            .collect();
        // leaving the cell free is always the last resort
        if choices.is_empty() || state.demand_left(classroom) < unvisited[classroom][index] {
            choices.push(Choice::Leave);
        }

        let mut frame = Frame {
            index,
            choices,
            next: 0,
            applied: None,
        };
        frame.advance(state, classroom, slot);
        stack.push(frame);
        max_depth = max_depth.max(stack.len());
        index += 1;
    };

    debug!(outcome = outcome.as_str(), nodes, max_depth, "backtracking finished");
    SearchReport {
        outcome,
        nodes,
        max_depth,
    }
}

/// Undoes the newest decision and moves to its next alternative, popping
/// frames that have none left. Returns the index to continue from.
fn retreat(
    stack: &mut Vec<Frame>,
    state: &mut ScheduleState,
    order: &[(usize, Slot)],
) -> Option<usize> {
    while let Some(frame) = stack.last_mut() {
        if let Some(m) = frame.applied.take() {
            state.revert(m);
        }
        let (classroom, slot) = order[frame.index];
        if frame.advance(state, classroom, slot) {
            return Some(frame.index + 1);
        }
        stack.pop();
    }
    None
}

fn unwind(stack: &mut Vec<Frame>, state: &mut ScheduleState) {
    while let Some(mut frame) = stack.pop() {
        if let Some(m) = frame.applied.take() {
            state.revert(m);
        }
    }
}
