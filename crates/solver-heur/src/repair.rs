//! Resolves leftover demand by moving an existing lesson out of the way.
//!
//! A trial removes a donor lesson, moves it to another free slot of its own
//! classroom and gives the freed slot to the unit being repaired. Every
//! partial step is recorded on a [`Trail`] so a failed trial leaves the state
//! exactly as it found it.

use crate::construct::place_unit;
use crate::priority::Unit;
use rand::seq::SliceRandom;
use rand::Rng;
use sched_core::feasibility::{any_available, is_available, rank_available_teachers};
use sched_core::{Placement, ScheduleState, Slot, Trail};
use tracing::debug;

#[derive(Clone, Copy, Debug)]
pub struct RepairConfig {
    /// Reshuffles of the donor list per unit.
    pub rounds: u32,
    /// Donors tried per reshuffle.
    pub sample: usize,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            rounds: 100,
            sample: 20,
        }
    }
}

#[derive(Debug, Default)]
pub struct RepairOutcome {
    pub unresolved: Vec<Unit>,
    pub direct: usize,
    pub relocations: usize,
}

pub fn repair<R: Rng + ?Sized>(
    state: &mut ScheduleState,
    units: Vec<Unit>,
    cfg: &RepairConfig,
    rng: &mut R,
) -> RepairOutcome {
    let mut out = RepairOutcome::default();
    for unit in units {
        if state.remaining(unit.classroom, unit.subject) == 0 {
            continue;
        }
        // earlier repairs may have opened a slot already
        if place_unit(state, unit, rng) {
            out.direct += 1;
            continue;
        }
        if relocate_for(state, unit, cfg, rng) {
            out.relocations += 1;
            debug!(
                classroom = unit.classroom,
                subject = unit.subject,
                "resolved through relocation"
            );
        } else {
            debug!(
                classroom = unit.classroom,
                subject = unit.subject,
                "could not resolve"
            );
            out.unresolved.push(unit);
        }
    }
    out
}

fn relocate_for<R: Rng + ?Sized>(
    state: &mut ScheduleState,
    unit: Unit,
    cfg: &RepairConfig,
    rng: &mut R,
) -> bool {
    for _ in 0..cfg.rounds {
        let mut donors = state.filled_cells();
        if donors.is_empty() {
            return false;
        }
        donors.shuffle(rng);
        for &(classroom, slot) in donors.iter().take(cfg.sample) {
            if try_relocate(state, classroom, slot, unit, rng) {
                return true;
            }
        }
    }
    false
}

/// One relocation trial. On failure the state is restored bit for bit.
pub fn try_relocate<R: Rng + ?Sized>(
    state: &mut ScheduleState,
    donor_classroom: usize,
    freed: Slot,
    target: Unit,
    rng: &mut R,
) -> bool {
    let Some(removed) = state.unassign(donor_classroom, freed) else {
        return false;
    };
    let displaced = removed.placement();
    let mut trail = Trail::new();
    trail.push(removed);

    if state.is_free(target.classroom, freed) && any_available(state, freed) {
        let homes: Vec<Slot> = state.model().slots().filter(|&s| s != freed).collect();
        for home in homes {
            if !state.is_free(donor_classroom, home)
                || !is_available(state, displaced.teacher, home)
            {
                continue;
            }
            let moved = state.assign(Placement {
                slot: home,
                ..displaced
            });

            // the move may have consumed the only teacher for the freed slot
            if state.is_free(target.classroom, freed) {
                if let Some(&teacher) = rank_available_teachers(state, freed, rng).first() {
                    trail.push(moved);
                    trail.push(state.assign(Placement {
                        classroom: target.classroom,
                        slot: freed,
                        teacher,
                        subject: target.subject,
                    }));
                    trail.commit();
                    return true;
                }
            }
            state.revert(moved);
        }
    }

    trail.rollback(state);
    false
}
