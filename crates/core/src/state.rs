//! Mutable schedule grids and their derived counters.
//!
//! [`ScheduleState::assign`] and [`ScheduleState::unassign`] are the only
//! operations that change the grids. Both update the teacher occupancy, the
//! teacher daily load and the classroom subject count together and hand back
//! a [`Mutation`] that [`ScheduleState::revert`] undoes exactly.

use crate::model::{Model, Slot};
use types::{ClassroomTimetable, Instance, Lesson};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    pub classroom: usize,
    pub slot: Slot,
    pub teacher: usize,
    pub subject: usize,
}

/// Undo token for one grid mutation.
#[must_use = "dropping a mutation loses the ability to undo it"]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutation {
    Assigned(Placement),
    Removed(Placement),
}

impl Mutation {
    pub fn placement(&self) -> Placement {
        match *self {
            Mutation::Assigned(p) | Mutation::Removed(p) => p,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleState {
    model: Model,
    /// `[teacher][day][period]` -> classroom
    teacher_grid: Vec<Option<usize>>,
    /// `[classroom][day][period]` -> (teacher, subject)
    class_grid: Vec<Option<(usize, usize)>>,
    /// `[classroom][subject]`
    subject_counts: Vec<u32>,
    /// `[teacher][day]`
    daily_load: Vec<u32>,
    filled: usize,
}

impl ScheduleState {
    pub fn new(model: &Model) -> Self {
        let cells = model.days * model.periods;
        Self {
            model: model.clone(),
            teacher_grid: vec![None; model.teachers * cells],
            class_grid: vec![None; model.classrooms * cells],
            subject_counts: vec![0; model.classrooms * model.subjects()],
            daily_load: vec![0; model.teachers * model.days],
            filled: 0,
        }
    }

    pub fn reset(&mut self) {
        self.teacher_grid.fill(None);
        self.class_grid.fill(None);
        self.subject_counts.fill(0);
        self.daily_load.fill(0);
        self.filled = 0;
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    fn cell(&self, owner: usize, slot: Slot) -> usize {
        (owner * self.model.days + slot.day) * self.model.periods + slot.period
    }

    pub fn lesson(&self, classroom: usize, slot: Slot) -> Option<(usize, usize)> {
        self.class_grid[self.cell(classroom, slot)]
    }

    pub fn is_free(&self, classroom: usize, slot: Slot) -> bool {
        self.lesson(classroom, slot).is_none()
    }

    /// Classroom the teacher is booked into at `slot`, if any.
    pub fn teacher_at(&self, teacher: usize, slot: Slot) -> Option<usize> {
        self.teacher_grid[self.cell(teacher, slot)]
    }

    pub fn daily_load(&self, teacher: usize, day: usize) -> u32 {
        self.daily_load[teacher * self.model.days + day]
    }

    pub fn weekly_load(&self, teacher: usize) -> u32 {
        let start = teacher * self.model.days;
        self.daily_load[start..start + self.model.days].iter().sum()
    }

    pub fn fulfilled(&self, classroom: usize, subject: usize) -> u32 {
        self.subject_counts[classroom * self.model.subjects() + subject]
    }

    pub fn remaining(&self, classroom: usize, subject: usize) -> u32 {
        self.model.quotas[subject].saturating_sub(self.fulfilled(classroom, subject))
    }

    pub fn demand_left(&self, classroom: usize) -> u32 {
        (0..self.model.subjects())
            .map(|s| self.remaining(classroom, s))
            .sum()
    }

    pub fn is_complete(&self) -> bool {
        (0..self.model.classrooms).all(|c| self.demand_left(c) == 0)
    }

    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Every occupied `(classroom, slot)` pair.
    pub fn filled_cells(&self) -> Vec<(usize, Slot)> {
        let mut out = Vec::with_capacity(self.filled);
        for c in 0..self.model.classrooms {
            for slot in self.model.slots() {
                if !self.is_free(c, slot) {
                    out.push((c, slot));
                }
            }
        }
        out
    }

    pub fn free_slots(&self, classroom: usize) -> Vec<Slot> {
        self.model
            .slots()
            .filter(|&s| self.is_free(classroom, s))
            .collect()
    }

    /// Books `p`. The classroom slot must be free and the teacher unbooked
    /// at that slot; callers check with the feasibility oracle first.
    ///
    /// # Panics
    ///
    /// When either cell is already taken. Overwriting would corrupt the
    /// counters, so this holds in release builds too.
    pub fn assign(&mut self, p: Placement) -> Mutation {
        let ci = self.cell(p.classroom, p.slot);
        let ti = self.cell(p.teacher, p.slot);
        assert!(self.class_grid[ci].is_none(), "classroom slot already taken");
        assert!(self.teacher_grid[ti].is_none(), "teacher already booked");
        self.class_grid[ci] = Some((p.teacher, p.subject));
        self.teacher_grid[ti] = Some(p.classroom);
        self.subject_counts[p.classroom * self.model.subjects() + p.subject] += 1;
        self.daily_load[p.teacher * self.model.days + p.slot.day] += 1;
        self.filled += 1;
        Mutation::Assigned(p)
    }

    /// Assigns without keeping the undo token.
    pub fn place(&mut self, p: Placement) {
        let _ = self.assign(p);
    }

    pub fn unassign(&mut self, classroom: usize, slot: Slot) -> Option<Mutation> {
        let ci = self.cell(classroom, slot);
        let (teacher, subject) = self.class_grid[ci].take()?;
        let ti = self.cell(teacher, slot);
        self.teacher_grid[ti] = None;
        self.subject_counts[classroom * self.model.subjects() + subject] -= 1;
        self.daily_load[teacher * self.model.days + slot.day] -= 1;
        self.filled -= 1;
        Some(Mutation::Removed(Placement {
            classroom,
            slot,
            teacher,
            subject,
        }))
    }

    pub fn revert(&mut self, m: Mutation) {
        match m {
            Mutation::Assigned(p) => {
                let undone = self.unassign(p.classroom, p.slot);
                debug_assert_eq!(undone.map(|u| u.placement()), Some(p));
            }
            Mutation::Removed(p) => {
                let _ = self.assign(p);
            }
        }
    }

    pub fn to_timetables(&self, inst: &Instance) -> Vec<ClassroomTimetable> {
        inst.classrooms
            .iter()
            .enumerate()
            .map(|(c, id)| ClassroomTimetable {
                classroom_id: id.clone(),
                cells: (0..self.model.days)
                    .map(|d| {
                        (0..self.model.periods)
                            .map(|p| {
                                self.lesson(c, Slot::new(d, p)).map(|(t, s)| Lesson {
                                    teacher_id: inst.teachers[t].clone(),
                                    subject_id: inst.subjects[s].id.clone(),
                                })
                            })
                            .collect()
                    })
                    .collect(),
            })
            .collect()
    }
}

/// Ordered log of mutations that can be undone as one unit.
#[derive(Debug, Default)]
pub struct Trail {
    ops: Vec<Mutation>,
}

impl Trail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, m: Mutation) {
        self.ops.push(m);
    }

    pub fn pop(&mut self) -> Option<Mutation> {
        self.ops.pop()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn rollback(mut self, state: &mut ScheduleState) {
        while let Some(m) = self.ops.pop() {
            state.revert(m);
        }
    }

    /// Keep every recorded mutation.
    pub fn commit(self) {}
}
