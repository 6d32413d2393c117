use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Hash, PartialOrd, Ord,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}
id_newtype!(TeacherId);
id_newtype!(SubjectId);
id_newtype!(ClassroomId);

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
pub struct Subject {
    pub id: SubjectId,
    /// Required periods per week, per classroom.
    pub quota: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Default, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SoftWeights {
    #[serde(default)]
    pub windows: i32,
    #[serde(default)]
    pub last_period: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    #[serde(default = "default_max_daily_load")]
    pub max_daily_load: u32,
    /// Longest allowed run of back-to-back periods. Ignored under strict adjacency.
    #[serde(default = "default_max_consecutive")]
    pub max_consecutive: u32,
    /// When set, a teacher may never teach two adjacent periods.
    #[serde(default)]
    pub strict_adjacency: bool,
    #[serde(default)]
    pub soft_weights: SoftWeights,
}

fn default_max_daily_load() -> u32 {
    4
}

fn default_max_consecutive() -> u32 {
    2
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            max_daily_load: default_max_daily_load(),
            max_consecutive: default_max_consecutive(),
            strict_adjacency: false,
            soft_weights: SoftWeights::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub teachers: Vec<TeacherId>,
    pub subjects: Vec<Subject>,
    pub classrooms: Vec<ClassroomId>,
    pub days: u32,
    pub periods_per_day: u32,
    #[serde(default)]
    pub policy: Policy,
}

impl Instance {
    pub fn slots_per_classroom(&self) -> u32 {
        self.days * self.periods_per_day
    }

    pub fn demand_per_classroom(&self) -> u32 {
        self.subjects.iter().map(|s| s.quota).sum()
    }

    pub fn quota_of(&self, subject: &SubjectId) -> Option<u32> {
        self.subjects
            .iter()
            .find(|s| &s.id == subject)
            .map(|s| s.quota)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SolveParams {
    #[serde(default)]
    pub seed: u64,
    /// Number of construct+repair cycles before falling back to backtracking.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_true")]
    pub repair: bool,
    #[serde(default = "default_repair_rounds")]
    pub repair_rounds: u32,
    #[serde(default = "default_repair_sample")]
    pub repair_sample: u32,
    #[serde(default = "default_true")]
    pub backtracking: bool,
    /// Upper bound on backtracking node expansions. `None` runs unbounded.
    #[serde(default = "default_backtrack_node_limit")]
    pub backtrack_node_limit: Option<u64>,
    #[serde(default = "default_true")]
    pub adjacency_bonus: bool,
}

fn default_true() -> bool {
    true
}

fn default_attempts() -> u32 {
    5
}

fn default_repair_rounds() -> u32 {
    100
}

fn default_repair_sample() -> u32 {
    20
}

fn default_backtrack_node_limit() -> Option<u64> {
    Some(200_000)
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            seed: 0,
            attempts: default_attempts(),
            repair: true,
            repair_rounds: default_repair_rounds(),
            repair_sample: default_repair_sample(),
            backtracking: true,
            backtrack_node_limit: default_backtrack_node_limit(),
            adjacency_bonus: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
pub struct SolveEnvelope {
    pub instance: Instance,
    #[serde(default)]
    pub params: SolveParams,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub teacher_id: TeacherId,
    pub subject_id: SubjectId,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassroomTimetable {
    pub classroom_id: ClassroomId,
    /// Indexed `[day][period]`.
    pub cells: Vec<Vec<Option<Lesson>>>,
}

impl ClassroomTimetable {
    pub fn lessons(&self) -> impl Iterator<Item = (usize, usize, &Lesson)> + '_ {
        self.cells.iter().enumerate().flat_map(|(day, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(period, cell)| cell.as_ref().map(|l| (day, period, l)))
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct DemandUnit {
    pub classroom_id: ClassroomId,
    pub subject_id: SubjectId,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuotaShortfall {
    pub classroom_id: ClassroomId,
    pub subject_id: SubjectId,
    pub required: u32,
    pub assigned: u32,
}

impl QuotaShortfall {
    pub fn is_overrun(&self) -> bool {
        self.assigned > self.required
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoadViolation {
    pub teacher_id: TeacherId,
    pub day: u32,
    pub load: u32,
    pub max: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeacherConflict {
    pub teacher_id: TeacherId,
    pub day: u32,
    pub period: u32,
    pub classroom_ids: Vec<ClassroomId>,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsecutiveViolation {
    pub teacher_id: TeacherId,
    pub day: u32,
    pub run: u32,
    pub limit: u32,
}

/// A timetable set whose shape or contents do not match the instance.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StructureIssue {
    /// No timetable for a classroom of the instance.
    #[serde(rename_all = "camelCase")]
    MissingClassroom { classroom_id: ClassroomId },
    /// A timetable for an unknown classroom, or a second one for the same classroom.
    #[serde(rename_all = "camelCase")]
    StrayTimetable { classroom_id: ClassroomId },
    /// `found` days (`day` unset) or `found` periods on `day`, where the
    /// instance has `expected`.
    #[serde(rename_all = "camelCase")]
    GridSize {
        classroom_id: ClassroomId,
        day: Option<u32>,
        expected: u32,
        found: u32,
    },
    #[serde(rename_all = "camelCase")]
    UnknownTeacher {
        teacher_id: TeacherId,
        classroom_id: ClassroomId,
        day: u32,
        period: u32,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, Default, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    #[serde(default)]
    pub structure_issues: Vec<StructureIssue>,
    #[serde(default)]
    pub quota_shortfalls: Vec<QuotaShortfall>,
    #[serde(default)]
    pub load_violations: Vec<LoadViolation>,
    #[serde(default)]
    pub teacher_conflicts: Vec<TeacherConflict>,
    #[serde(default)]
    pub consecutive_violations: Vec<ConsecutiveViolation>,
}

impl ValidationReport {
    /// No hard constraint is broken. Quotas may still be short.
    pub fn is_consistent(&self) -> bool {
        self.structure_issues.is_empty()
            && self.load_violations.is_empty()
            && self.teacher_conflicts.is_empty()
            && self.consecutive_violations.is_empty()
            && !self.quota_shortfalls.iter().any(QuotaShortfall::is_overrun)
    }

    pub fn is_complete(&self) -> bool {
        self.quota_shortfalls.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        self.is_consistent() && self.is_complete()
    }

    pub fn missing_periods(&self) -> u32 {
        self.quota_shortfalls
            .iter()
            .map(|s| s.required.saturating_sub(s.assigned))
            .sum()
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Solved,
    Infeasible,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub timetables: Vec<ClassroomTimetable>,
    #[serde(default)]
    pub unresolved: Vec<DemandUnit>,
    pub report: ValidationReport,
    pub stats: serde_json::Value,
}

impl SolveResult {
    pub fn is_success(&self) -> bool {
        self.status == SolveStatus::Solved
    }
}
