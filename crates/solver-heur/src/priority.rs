use rand::Rng;
use sched_core::feasibility::jittered;
use sched_core::ScheduleState;

/// One missing period of `subject` in `classroom`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Unit {
    pub classroom: usize,
    pub subject: usize,
}

pub const UNIT_JITTER: f64 = 5.0;
pub const SUBJECT_JITTER: f64 = 1.0;

/// Higher means more urgent. `None` once the quota is met.
///
/// `remaining * 10 + bonus + quota`, with a bonus of 20 below half the quota
/// and 10 below 80% of it.
pub fn urgency(quota: u32, fulfilled: u32) -> Option<u32> {
    let remaining = quota.checked_sub(fulfilled).filter(|&r| r > 0)?;
    let (f, q) = (u64::from(fulfilled), u64::from(quota));
    // fulfilled / quota < 0.5  <=>  2 * fulfilled < quota
    let bonus = if 2 * f < q {
        20
    } else if 5 * f < 4 * q {
        10
    } else {
        0
    };
    Some(
        remaining
            .saturating_mul(10)
            .saturating_add(bonus)
            .saturating_add(quota),
    )
}

pub fn subject_urgency(state: &ScheduleState, classroom: usize, subject: usize) -> Option<u32> {
    urgency(
        state.model().quotas[subject],
        state.fulfilled(classroom, subject),
    )
}

/// Subjects the classroom still needs, most urgent first.
pub fn rank_needed_subjects<R: Rng + ?Sized>(
    state: &ScheduleState,
    classroom: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut ranked: Vec<(usize, f64)> = (0..state.model().subjects())
        .filter_map(|s| {
            subject_urgency(state, classroom, s)
                .map(|score| (s, jittered(score as f64, SUBJECT_JITTER, rng)))
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().map(|(s, _)| s).collect()
}

/// Every outstanding demand unit, in processing order.
pub fn demand_units<R: Rng + ?Sized>(state: &ScheduleState, rng: &mut R) -> Vec<Unit> {
    let model = state.model();
    let mut units: Vec<(Unit, f64)> = Vec::new();
    for classroom in 0..model.classrooms {
        for subject in 0..model.subjects() {
            let Some(score) = subject_urgency(state, classroom, subject) else {
                continue;
            };
            for _ in 0..state.remaining(classroom, subject) {
                let key = jittered(score as f64, UNIT_JITTER, rng);
                units.push((Unit { classroom, subject }, key));
            }
        }
    }
    units.sort_by(|a, b| b.1.total_cmp(&a.1));
    units.into_iter().map(|(u, _)| u).collect()
}
