use std::collections::{BTreeMap, HashMap};
use types::{ClassroomTimetable, Instance};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scores {
    /// Idle periods between a teacher's first and last lesson, summed over the week.
    pub windows_teachers: BTreeMap<String, i64>,
    pub windows_total: i64,
    pub last_period_lessons: i64,
    pub weekly_loads: BTreeMap<String, i64>,
    /// Heaviest weekly load minus the lightest.
    pub load_imbalance: i64,
    pub objective: f64,
}

pub fn compute_soft_scores(inst: &Instance, timetables: &[ClassroomTimetable]) -> Scores {
    let periods = inst.periods_per_day as usize;

    let mut occ_teacher: HashMap<(&str, usize), Vec<usize>> = HashMap::new();
    let mut last_period = 0i64;
    for tt in timetables {
        for (day, period, lesson) in tt.lessons() {
            occ_teacher
                .entry((lesson.teacher_id.0.as_str(), day))
                .or_default()
                .push(period);
            if period + 1 == periods {
                last_period += 1;
            }
        }
    }

    let mut windows_teachers: BTreeMap<String, i64> = BTreeMap::new();
    let mut weekly_loads: BTreeMap<String, i64> = BTreeMap::new();
    for t in &inst.teachers {
        weekly_loads.insert(t.0.clone(), 0);
    }

    for ((tid, _day), slots) in &occ_teacher {
        *weekly_loads.entry(tid.to_string()).or_default() += slots.len() as i64;
        let (Some(first), Some(last)) = (slots.iter().min(), slots.iter().max()) else {
            continue;
        };
        let span = (last - first + 1) as i64;
        let idle = span - slots.len() as i64;
        if idle > 0 {
            *windows_teachers.entry(tid.to_string()).or_default() += idle;
        }
    }

    let windows_total: i64 = windows_teachers.values().sum();
    let load_imbalance = match (weekly_loads.values().max(), weekly_loads.values().min()) {
        (Some(hi), Some(lo)) => hi - lo,
        _ => 0,
    };

    let w = &inst.policy.soft_weights;
    let objective =
        w.windows as f64 * windows_total as f64 + w.last_period as f64 * last_period as f64;

    Scores {
        windows_teachers,
        windows_total,
        last_period_lessons: last_period,
        weekly_loads,
        load_imbalance,
        objective,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::weekly_demo;
    use types::Lesson;

    #[test]
    fn counts_windows_and_last_period() {
        let mut inst = weekly_demo();
        inst.policy.soft_weights.windows = 3;
        inst.policy.soft_weights.last_period = 1;
        let mut cells = vec![vec![None; 6]; 5];
        let lesson = |t: &str| {
            Some(Lesson {
                teacher_id: t.into(),
                subject_id: "S1".into(),
            })
        };
        cells[0][0] = lesson("T1");
        cells[0][3] = lesson("T1");
        cells[0][5] = lesson("T2");
        let tts = vec![ClassroomTimetable {
            classroom_id: "Class_A".into(),
            cells,
        }];

        let s = compute_soft_scores(&inst, &tts);
        assert_eq!(s.windows_teachers.get("T1"), Some(&2));
        assert_eq!(s.windows_total, 2);
        assert_eq!(s.last_period_lessons, 1);
        assert_eq!(s.weekly_loads["T1"], 2);
        assert_eq!(s.weekly_loads["T3"], 0);
        assert_eq!(s.load_imbalance, 2);
        assert_eq!(s.objective, 7.0);
    }
}
