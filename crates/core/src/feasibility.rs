//! Teacher availability and preference ranking for a single slot.
//!
//! Nothing in here mutates state or fails: callers get booleans and scores
//! and decide what to do with them.

use crate::model::Slot;
use crate::state::ScheduleState;
use rand::Rng;

/// Spread of the uniform noise added to teacher preference scores.
pub const TEACHER_JITTER: f64 = 2.0;

/// Adds `uniform[0, spread)` to `score`. Used to break ties between equally
/// ranked choices so repeated runs do not always favour the same candidates.
pub fn jittered<R: Rng + ?Sized>(score: f64, spread: f64, rng: &mut R) -> f64 {
    score + rng.gen::<f64>() * spread
}

/// Length of the teacher's occupied run through `slot` if `slot` were taken.
pub fn consecutive_run(state: &ScheduleState, teacher: usize, slot: Slot) -> u32 {
    let periods = state.model().periods;
    let busy = |p: usize| state.teacher_at(teacher, Slot::new(slot.day, p)).is_some();
    let before = (0..slot.period).rev().take_while(|&p| busy(p)).count();
    let after = (slot.period + 1..periods).take_while(|&p| busy(p)).count();
    (1 + before + after) as u32
}

fn has_neighbour(state: &ScheduleState, teacher: usize, slot: Slot) -> bool {
    let periods = state.model().periods;
    let prev = slot.period > 0
        && state
            .teacher_at(teacher, Slot::new(slot.day, slot.period - 1))
            .is_some();
    let next = slot.period + 1 < periods
        && state
            .teacher_at(teacher, Slot::new(slot.day, slot.period + 1))
            .is_some();
    prev || next
}

pub fn is_available(state: &ScheduleState, teacher: usize, slot: Slot) -> bool {
    let rules = state.model().rules;
    if state.teacher_at(teacher, slot).is_some() {
        return false;
    }
    if state.daily_load(teacher, slot.day) >= rules.max_daily_load {
        return false;
    }
    if rules.strict_adjacency {
        !has_neighbour(state, teacher, slot)
    } else {
        consecutive_run(state, teacher, slot) <= rules.max_consecutive
    }
}

pub fn preference_score(state: &ScheduleState, teacher: usize, slot: Slot) -> i32 {
    let model = state.model();
    let mut score = 0;

    // below the teacher's own weekly average, compared without division
    let load = state.daily_load(teacher, slot.day) as usize;
    if load * model.days < state.weekly_load(teacher) as usize {
        score += 10;
    }
    if model.is_middle_period(slot.period) {
        score += 5;
    }
    if model.rules.adjacency_bonus
        && !model.rules.strict_adjacency
        && has_neighbour(state, teacher, slot)
    {
        score += 2;
    }
    score
}

pub fn available_count(state: &ScheduleState, slot: Slot) -> usize {
    (0..state.model().teachers)
        .filter(|&t| is_available(state, t, slot))
        .count()
}

pub fn any_available(state: &ScheduleState, slot: Slot) -> bool {
    (0..state.model().teachers).any(|t| is_available(state, t, slot))
}

/// Available teachers for `slot`, best first.
pub fn rank_available_teachers<R: Rng + ?Sized>(
    state: &ScheduleState,
    slot: Slot,
    rng: &mut R,
) -> Vec<usize> {
    let mut ranked: Vec<(usize, f64)> = (0..state.model().teachers)
        .filter(|&t| is_available(state, t, slot))
        .map(|t| {
            let score = preference_score(state, t, slot) as f64;
            (t, jittered(score, TEACHER_JITTER, rng))
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().map(|(t, _)| t).collect()
}
