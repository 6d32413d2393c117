use crate::priority::{demand_units, Unit};
use rand::Rng;
use sched_core::feasibility::{available_count, jittered, rank_available_teachers};
use sched_core::{Placement, ScheduleState, Slot};
use tracing::debug;

pub const SLOT_JITTER: f64 = 5.0;

/// Desirability of an empty slot: middle periods and middle days first, then
/// slots where many teachers are still free.
pub fn slot_score(state: &ScheduleState, slot: Slot) -> i32 {
    let model = state.model();
    let mut score = 0;
    if model.is_middle_period(slot.period) {
        score += 10;
    }
    if model.is_middle_day(slot.day) {
        score += 5;
    }
    score + 2 * available_count(state, slot) as i32
}

/// Free slots of `classroom`, most desirable first.
pub fn rank_free_slots<R: Rng + ?Sized>(
    state: &ScheduleState,
    classroom: usize,
    rng: &mut R,
) -> Vec<Slot> {
    let mut ranked: Vec<(Slot, f64)> = state
        .free_slots(classroom)
        .into_iter()
        .map(|slot| {
            let key = jittered(slot_score(state, slot) as f64, SLOT_JITTER, rng);
            (slot, key)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().map(|(s, _)| s).collect()
}

/// Places one period of `unit` at the best free slot that has a teacher.
pub fn place_unit<R: Rng + ?Sized>(state: &mut ScheduleState, unit: Unit, rng: &mut R) -> bool {
    if state.remaining(unit.classroom, unit.subject) == 0 {
        return false;
    }
    for slot in rank_free_slots(state, unit.classroom, rng) {
        if let Some(&teacher) = rank_available_teachers(state, slot, rng).first() {
            state.place(Placement {
                classroom: unit.classroom,
                slot,
                teacher,
                subject: unit.subject,
            });
            return true;
        }
    }
    false
}

/// Greedy pass over all outstanding demand. Returns the units that found no slot.
pub fn construct<R: Rng + ?Sized>(state: &mut ScheduleState, rng: &mut R) -> Vec<Unit> {
    let units = demand_units(state, rng);
    let total = units.len();
    let mut unresolved = Vec::new();
    for unit in units {
        if !place_unit(state, unit, rng) {
            unresolved.push(unit);
        }
    }
    debug!(total, unresolved = unresolved.len(), "greedy construction done");
    unresolved
}
