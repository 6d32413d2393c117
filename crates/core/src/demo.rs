use types::{ClassroomId, Instance, Policy, SolveEnvelope, SolveParams, Subject, TeacherId};

/// Six teachers, six subjects and three classrooms over a five-day week of
/// six periods. Every classroom needs exactly 30 lessons, one per slot.
pub fn weekly_demo() -> Instance {
    let quotas = [("S1", 5), ("S2", 4), ("S3", 7), ("S4", 6), ("S5", 4), ("S6", 4)];
    Instance {
        teachers: (1..=6).map(|i| TeacherId(format!("T{i}"))).collect(),
        subjects: quotas
            .iter()
            .map(|&(id, quota)| Subject {
                id: id.into(),
                quota,
            })
            .collect(),
        classrooms: ["Class_A", "Class_B", "Class_C"]
            .into_iter()
            .map(ClassroomId::from)
            .collect(),
        days: 5,
        periods_per_day: 6,
        policy: Policy {
            max_daily_load: 4,
            max_consecutive: 2,
            strict_adjacency: false,
            ..Policy::default()
        },
    }
}

pub fn demo_envelope() -> SolveEnvelope {
    SolveEnvelope {
        instance: weekly_demo(),
        params: SolveParams::default(),
    }
}
