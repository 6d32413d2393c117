use proptest::prelude::*;
use sched_core::demo::{demo_envelope, weekly_demo};
use sched_core::{audit, Solver};
use solver_heur::{solve_instance, HeurSolver};
use std::collections::BTreeMap;
use types::{
    ClassroomId, ClassroomTimetable, Instance, Policy, SolveParams, SolveResult, SolveStatus,
    Subject, SubjectId, TeacherId,
};

fn quick() -> SolveParams {
    SolveParams {
        attempts: 2,
        repair_rounds: 3,
        repair_sample: 5,
        backtrack_node_limit: Some(2_000),
        ..SolveParams::default()
    }
}

fn assigned_counts(timetables: &[ClassroomTimetable]) -> BTreeMap<(ClassroomId, SubjectId), u32> {
    let mut counts = BTreeMap::new();
    for tt in timetables {
        for (_, _, lesson) in tt.lessons() {
            *counts
                .entry((tt.classroom_id.clone(), lesson.subject_id.clone()))
                .or_default() += 1;
        }
    }
    counts
}

/// Unresolved units must be exactly the missing periods, nothing more.
fn assert_precise(inst: &Instance, res: &SolveResult) {
    let assigned = assigned_counts(&res.timetables);
    let mut unresolved: BTreeMap<(ClassroomId, SubjectId), u32> = BTreeMap::new();
    for u in &res.unresolved {
        *unresolved
            .entry((u.classroom_id.clone(), u.subject_id.clone()))
            .or_default() += 1;
    }
    for c in &inst.classrooms {
        for s in &inst.subjects {
            let key = (c.clone(), s.id.clone());
            let got = assigned.get(&key).copied().unwrap_or(0);
            let open = unresolved.get(&key).copied().unwrap_or(0);
            assert!(got <= s.quota, "{key:?} overcounted: {got} > {}", s.quota);
            assert_eq!(got + open, s.quota, "{key:?}");
        }
    }
}

fn assert_no_adjacent_repeats(res: &SolveResult, days: usize, periods: usize) {
    for day in 0..days {
        for period in 1..periods {
            let at = |p: usize| -> Vec<&TeacherId> {
                res.timetables
                    .iter()
                    .filter_map(|tt| tt.cells[day][p].as_ref().map(|l| &l.teacher_id))
                    .collect()
            };
            let before = at(period - 1);
            for t in at(period) {
                assert!(!before.contains(&t), "{t:?} teaches back to back on day {day}");
            }
        }
    }
}

#[test]
fn weekly_demo_is_solved_exactly() {
    let inst = weekly_demo();
    for seed in [0, 1, 42] {
        let res = solve_instance(
            &inst,
            &SolveParams {
                seed,
                ..SolveParams::default()
            },
        );
        assert_eq!(res.status, SolveStatus::Solved, "seed {seed}: {:?}", res.report);
        assert!(res.report.is_valid());
        assert!(res.unresolved.is_empty());
        for tt in &res.timetables {
            assert_eq!(tt.cells.len(), 5);
            assert!(tt.cells.iter().all(|row| row.len() == 6));
        }
        for ((_, subject), n) in assigned_counts(&res.timetables) {
            assert_eq!(Some(n), inst.quota_of(&subject));
        }
    }
}

#[test]
fn load_cap_of_one_reports_precise_shortfall() {
    let mut inst = weekly_demo();
    inst.policy.max_daily_load = 1;
    let res = solve_instance(&inst, &quick());
    assert_eq!(res.status, SolveStatus::Infeasible);
    assert!(res.report.is_consistent(), "{:?}", res.report);
    // six teachers, one lesson a day each
    let placed: usize = res.timetables.iter().map(|tt| tt.lessons().count()).sum();
    assert!(placed <= 30);
    assert_eq!(res.unresolved.len(), 90 - placed);
    assert_eq!(res.report.missing_periods() as usize, res.unresolved.len());
    assert_precise(&inst, &res);
}

#[test]
fn zero_teachers_gives_an_empty_schedule() {
    let mut env = demo_envelope();
    env.instance.teachers.clear();
    let res = HeurSolver::new().solve(env).unwrap();
    assert_eq!(res.status, SolveStatus::Infeasible);
    assert_eq!(res.unresolved.len(), 90);
    assert!(res
        .timetables
        .iter()
        .all(|tt| tt.cells.iter().flatten().all(Option::is_none)));
    assert_eq!(res.report.quota_shortfalls.len(), 18);
}

#[test]
fn strict_mode_never_puts_a_teacher_back_to_back() {
    let mut inst = weekly_demo();
    inst.policy.strict_adjacency = true;
    let res = solve_instance(&inst, &quick());
    assert!(res.report.is_consistent(), "{:?}", res.report);
    assert!(res.report.consecutive_violations.is_empty());
    assert_no_adjacent_repeats(&res, 5, 6);
    assert_precise(&inst, &res);
}

#[test]
fn same_seed_same_result() {
    let inst = weekly_demo();
    let params = SolveParams {
        seed: 7,
        ..SolveParams::default()
    };
    assert_eq!(solve_instance(&inst, &params), solve_instance(&inst, &params));

    let mut capped = inst.clone();
    capped.policy.max_daily_load = 1;
    assert_eq!(
        solve_instance(&capped, &quick()),
        solve_instance(&capped, &quick())
    );
}

#[test]
fn report_matches_a_fresh_audit() {
    let inst = weekly_demo();
    let res = solve_instance(&inst, &SolveParams::default());
    let first = audit(&inst, &res.timetables);
    let second = audit(&inst, &res.timetables);
    assert_eq!(first, second);
    assert_eq!(first, res.report);
}

#[test]
fn backtracking_alone_solves_a_small_instance() {
    let inst = Instance {
        teachers: vec!["T1".into(), "T2".into(), "T3".into()],
        subjects: vec![
            Subject {
                id: "Math".into(),
                quota: 2,
            },
            Subject {
                id: "Art".into(),
                quota: 1,
            },
        ],
        classrooms: vec!["A".into(), "B".into()],
        days: 1,
        periods_per_day: 3,
        policy: Policy {
            max_daily_load: 2,
            ..Policy::default()
        },
    };
    let params = SolveParams {
        attempts: 0,
        ..SolveParams::default()
    };
    let res = solve_instance(&inst, &params);
    assert!(res.is_success(), "{:?}", res.report);
    assert_eq!(res.stats["method"], "backtracking");
}

fn instance() -> impl Strategy<Value = Instance> {
    (
        0..5usize,
        prop::collection::vec(0..4u32, 1..4),
        1..4usize,
        1..3u32,
        1..5u32,
        1..4u32,
        1..3u32,
        any::<bool>(),
    )
        .prop_map(
            |(teachers, quotas, classrooms, days, periods, load, run, strict)| Instance {
                teachers: (0..teachers)
                    .map(|i| TeacherId(format!("T{i}")))
                    .collect(),
                subjects: quotas
                    .into_iter()
                    .enumerate()
                    .map(|(i, quota)| Subject {
                        id: SubjectId(format!("S{i}")),
                        quota,
                    })
                    .collect(),
                classrooms: (0..classrooms)
                    .map(|i| ClassroomId(format!("C{i}")))
                    .collect(),
                days,
                periods_per_day: periods,
                policy: Policy {
                    max_daily_load: load,
                    max_consecutive: run,
                    strict_adjacency: strict,
                    ..Policy::default()
                },
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn small_instances_never_break_hard_constraints(inst in instance(), seed in any::<u64>()) {
        let params = SolveParams { seed, backtrack_node_limit: Some(500), ..quick() };
        let res = HeurSolver::new()
            .solve(types::SolveEnvelope { instance: inst.clone(), params })
            .unwrap();
        prop_assert!(res.report.is_consistent(), "{:?}", res.report);
        prop_assert_eq!(res.is_success(), res.report.is_valid());
        prop_assert_eq!(res.is_success(), res.unresolved.is_empty());
        assert_precise(&inst, &res);
        if inst.policy.strict_adjacency {
            assert_no_adjacent_repeats(&res, inst.days as usize, inst.periods_per_day as usize);
        }
    }
}
