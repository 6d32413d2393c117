//! Re-checks a finished set of timetables against the hard constraints.
//!
//! The report is computed from the exported timetables alone, never from
//! solver internals, and iterates in a fixed order so repeated runs on the
//! same input produce identical reports.

use std::collections::{BTreeMap, BTreeSet};
use types::{
    ClassroomId, ClassroomTimetable, ConsecutiveViolation, Instance, LoadViolation,
    QuotaShortfall, StructureIssue, SubjectId, TeacherConflict, TeacherId, ValidationReport,
};

pub fn audit(inst: &Instance, timetables: &[ClassroomTimetable]) -> ValidationReport {
    let mut report = ValidationReport::default();
    let by_classroom = check_structure(inst, timetables, &mut report);
    check_quotas(inst, &by_classroom, &mut report);
    check_teachers(inst, timetables, &mut report);
    report
}

/// Matches timetables to instance classrooms and flags anything that does
/// not fit the instance grid or roster.
fn check_structure<'a>(
    inst: &Instance,
    timetables: &'a [ClassroomTimetable],
    report: &mut ValidationReport,
) -> BTreeMap<&'a ClassroomId, &'a ClassroomTimetable> {
    let listed: BTreeSet<&ClassroomId> = inst.classrooms.iter().collect();
    let roster: BTreeSet<&TeacherId> = inst.teachers.iter().collect();
    let mut by_classroom: BTreeMap<&ClassroomId, &ClassroomTimetable> = BTreeMap::new();
    let issues = &mut report.structure_issues;

    for tt in timetables {
        if !listed.contains(&tt.classroom_id) || by_classroom.contains_key(&tt.classroom_id) {
            issues.push(StructureIssue::StrayTimetable {
                classroom_id: tt.classroom_id.clone(),
            });
        } else {
            by_classroom.insert(&tt.classroom_id, tt);
        }

        if tt.cells.len() != inst.days as usize {
            issues.push(StructureIssue::GridSize {
                classroom_id: tt.classroom_id.clone(),
                day: None,
                expected: inst.days,
                found: tt.cells.len() as u32,
            });
        }
        for (day, row) in tt.cells.iter().enumerate() {
            if row.len() != inst.periods_per_day as usize {
                issues.push(StructureIssue::GridSize {
                    classroom_id: tt.classroom_id.clone(),
                    day: Some(day as u32),
                    expected: inst.periods_per_day,
                    found: row.len() as u32,
                });
            }
        }
        for (day, period, lesson) in tt.lessons() {
            if !roster.contains(&lesson.teacher_id) {
                issues.push(StructureIssue::UnknownTeacher {
                    teacher_id: lesson.teacher_id.clone(),
                    classroom_id: tt.classroom_id.clone(),
                    day: day as u32,
                    period: period as u32,
                });
            }
        }
    }

    for classroom in &inst.classrooms {
        if !by_classroom.contains_key(classroom) {
            issues.push(StructureIssue::MissingClassroom {
                classroom_id: classroom.clone(),
            });
        }
    }
    by_classroom
}

/// Every instance classroom against every quota. A classroom without a
/// timetable is short by its whole demand.
fn check_quotas(
    inst: &Instance,
    by_classroom: &BTreeMap<&ClassroomId, &ClassroomTimetable>,
    report: &mut ValidationReport,
) {
    for classroom in &inst.classrooms {
        let mut counts: BTreeMap<&SubjectId, u32> = BTreeMap::new();
        if let Some(tt) = by_classroom.get(classroom) {
            for (_, _, lesson) in tt.lessons() {
                *counts.entry(&lesson.subject_id).or_default() += 1;
            }
        }
        for subject in &inst.subjects {
            let assigned = counts.remove(&subject.id).unwrap_or(0);
            if assigned != subject.quota {
                report.quota_shortfalls.push(QuotaShortfall {
                    classroom_id: classroom.clone(),
                    subject_id: subject.id.clone(),
                    required: subject.quota,
                    assigned,
                });
            }
        }
        // lessons for subjects the instance does not know about
        for (subject_id, assigned) in counts {
            report.quota_shortfalls.push(QuotaShortfall {
                classroom_id: classroom.clone(),
                subject_id: subject_id.clone(),
                required: 0,
                assigned,
            });
        }
    }
}

fn check_teachers(
    inst: &Instance,
    timetables: &[ClassroomTimetable],
    report: &mut ValidationReport,
) {
    // (teacher, day, period) -> classrooms
    let mut booked: BTreeMap<(&TeacherId, usize, usize), Vec<&ClassroomId>> = BTreeMap::new();
    // (teacher, day) -> lessons, double bookings included
    let mut loads: BTreeMap<(&TeacherId, usize), u32> = BTreeMap::new();
    for tt in timetables {
        for (day, period, lesson) in tt.lessons() {
            booked
                .entry((&lesson.teacher_id, day, period))
                .or_default()
                .push(&tt.classroom_id);
            *loads.entry((&lesson.teacher_id, day)).or_default() += 1;
        }
    }

    for ((teacher, day, period), classrooms) in &booked {
        if classrooms.len() > 1 {
            report.teacher_conflicts.push(TeacherConflict {
                teacher_id: (*teacher).clone(),
                day: *day as u32,
                period: *period as u32,
                classroom_ids: classrooms.iter().map(|c| (*c).clone()).collect(),
            });
        }
    }

    let policy = &inst.policy;
    for ((teacher, day), &load) in &loads {
        if load > policy.max_daily_load {
            report.load_violations.push(LoadViolation {
                teacher_id: (*teacher).clone(),
                day: *day as u32,
                load,
                max: policy.max_daily_load,
            });
        }
    }

    // (teacher, day) -> distinct occupied periods, ascending
    let mut days: BTreeMap<(&TeacherId, usize), Vec<usize>> = BTreeMap::new();
    for &(teacher, day, period) in booked.keys() {
        days.entry((teacher, day)).or_default().push(period);
    }
    let run_limit = if policy.strict_adjacency {
        1
    } else {
        policy.max_consecutive
    };
    for ((teacher, day), periods) in &days {
        let run = longest_run(periods);
        if run > run_limit {
            report.consecutive_violations.push(ConsecutiveViolation {
                teacher_id: (*teacher).clone(),
                day: *day as u32,
                run,
                limit: run_limit,
            });
        }
    }
}

fn longest_run(sorted_periods: &[usize]) -> u32 {
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<usize> = None;
    for &p in sorted_periods {
        run = match prev {
            Some(q) if q + 1 == p => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(p);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::weekly_demo;
    use types::Lesson;

    fn empty(inst: &Instance) -> Vec<ClassroomTimetable> {
        inst.classrooms
            .iter()
            .map(|c| ClassroomTimetable {
                classroom_id: c.clone(),
                cells: vec![vec![None; inst.periods_per_day as usize]; inst.days as usize],
            })
            .collect()
    }

    fn put(tts: &mut [ClassroomTimetable], c: usize, d: usize, p: usize, t: &str, s: &str) {
        tts[c].cells[d][p] = Some(Lesson {
            teacher_id: t.into(),
            subject_id: s.into(),
        });
    }

    #[test]
    fn empty_schedule_is_consistent_but_short() {
        let inst = weekly_demo();
        let report = audit(&inst, &empty(&inst));
        assert!(report.is_consistent());
        assert!(!report.is_complete());
        assert_eq!(report.quota_shortfalls.len(), 18);
        assert_eq!(report.missing_periods(), 90);
    }

    #[test]
    fn detects_double_booking() {
        let inst = weekly_demo();
        let mut tts = empty(&inst);
        put(&mut tts, 0, 1, 2, "T1", "S1");
        put(&mut tts, 2, 1, 2, "T1", "S2");
        let report = audit(&inst, &tts);
        assert_eq!(report.teacher_conflicts.len(), 1);
        let c = &report.teacher_conflicts[0];
        assert_eq!((c.day, c.period), (1, 2));
        assert_eq!(
            c.classroom_ids,
            vec![ClassroomId::from("Class_A"), ClassroomId::from("Class_C")]
        );
        assert!(!report.is_consistent());
    }

    #[test]
    fn detects_load_and_runs() {
        let inst = weekly_demo();
        let mut tts = empty(&inst);
        for p in 0..5 {
            put(&mut tts, p % 3, 0, p, "T2", "S3");
        }
        let report = audit(&inst, &tts);
        assert_eq!(report.load_violations.len(), 1);
        assert_eq!(report.load_violations[0].load, 5);
        assert_eq!(report.consecutive_violations.len(), 1);
        assert_eq!(report.consecutive_violations[0].run, 5);
        assert_eq!(report.consecutive_violations[0].limit, 2);
    }

    #[test]
    fn strict_mode_flags_adjacent_pair() {
        let mut inst = weekly_demo();
        inst.policy.strict_adjacency = true;
        let mut tts = empty(&inst);
        put(&mut tts, 0, 3, 0, "T4", "S1");
        put(&mut tts, 1, 3, 1, "T4", "S1");
        let report = audit(&inst, &tts);
        assert_eq!(report.consecutive_violations.len(), 1);
        assert_eq!(report.consecutive_violations[0].limit, 1);
    }

    #[test]
    fn overrun_breaks_consistency() {
        let mut inst = weekly_demo();
        inst.subjects.truncate(1);
        inst.subjects[0].quota = 1;
        let mut tts = empty(&inst);
        put(&mut tts, 0, 0, 0, "T1", "S1");
        put(&mut tts, 0, 1, 0, "T1", "S1");
        let report = audit(&inst, &tts);
        let overrun = report
            .quota_shortfalls
            .iter()
            .find(|s| s.classroom_id.0 == "Class_A")
            .unwrap();
        assert!(overrun.is_overrun());
        assert!(!report.is_consistent());
    }

    #[test]
    fn report_is_idempotent() {
        let inst = weekly_demo();
        let mut tts = empty(&inst);
        put(&mut tts, 0, 0, 0, "T1", "S1");
        put(&mut tts, 1, 0, 0, "T1", "S1");
        assert_eq!(audit(&inst, &tts), audit(&inst, &tts));
    }

    #[test]
    fn missing_classrooms_count_as_full_shortfall() {
        let inst = weekly_demo();
        let report = audit(&inst, &[]);
        assert!(!report.is_valid());
        assert_eq!(report.missing_periods(), 90);
        assert_eq!(report.structure_issues.len(), 3);

        let mut tts = empty(&inst);
        tts.remove(1);
        let report = audit(&inst, &tts);
        assert_eq!(
            report.structure_issues,
            vec![StructureIssue::MissingClassroom {
                classroom_id: "Class_B".into()
            }]
        );
        assert!(!report.is_consistent());
        assert_eq!(report.missing_periods(), 90);
    }

    #[test]
    fn stray_and_duplicate_timetables_are_flagged() {
        let inst = weekly_demo();
        let mut tts = empty(&inst);
        let mut extra = tts[0].clone();
        tts.push(extra.clone());
        extra.classroom_id = "Class_Z".into();
        tts.push(extra);
        let report = audit(&inst, &tts);
        assert_eq!(
            report.structure_issues,
            vec![
                StructureIssue::StrayTimetable {
                    classroom_id: "Class_A".into()
                },
                StructureIssue::StrayTimetable {
                    classroom_id: "Class_Z".into()
                },
            ]
        );
        // quotas only look at the first Class_A timetable
        assert_eq!(report.quota_shortfalls.len(), 18);
    }

    #[test]
    fn oversized_grid_and_unknown_teacher_are_inconsistent() {
        let inst = weekly_demo();
        let mut tts = empty(&inst);
        tts[0].cells = vec![vec![None; 9]; 9];
        put(&mut tts, 0, 8, 8, "Ghost", "S1");
        let report = audit(&inst, &tts);
        assert!(!report.is_consistent());
        assert!(report.structure_issues.contains(&StructureIssue::GridSize {
            classroom_id: "Class_A".into(),
            day: None,
            expected: 5,
            found: 9,
        }));
        assert!(report.structure_issues.contains(&StructureIssue::GridSize {
            classroom_id: "Class_A".into(),
            day: Some(8),
            expected: 6,
            found: 9,
        }));
        assert!(report.structure_issues.contains(&StructureIssue::UnknownTeacher {
            teacher_id: "Ghost".into(),
            classroom_id: "Class_A".into(),
            day: 8,
            period: 8,
        }));
    }

    #[test]
    fn double_booking_counts_towards_daily_load() {
        let mut inst = weekly_demo();
        inst.policy.max_daily_load = 1;
        let mut tts = empty(&inst);
        put(&mut tts, 0, 0, 0, "T1", "S1");
        put(&mut tts, 1, 0, 0, "T1", "S1");
        let report = audit(&inst, &tts);
        assert_eq!(report.teacher_conflicts.len(), 1);
        assert_eq!(
            report.load_violations,
            vec![LoadViolation {
                teacher_id: "T1".into(),
                day: 0,
                load: 2,
                max: 1,
            }]
        );
        // one distinct period, so no run
        assert!(report.consecutive_violations.is_empty());
    }

    #[test]
    fn longest_run_handles_gaps() {
        assert_eq!(longest_run(&[]), 0);
        assert_eq!(longest_run(&[0, 2, 4]), 1);
        assert_eq!(longest_run(&[0, 1, 3, 4, 5]), 3);
    }
}
