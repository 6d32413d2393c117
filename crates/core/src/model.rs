use types::Instance;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub day: usize,
    pub period: usize,
}

impl Slot {
    pub fn new(day: usize, period: usize) -> Self {
        Self { day, period }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rules {
    pub max_daily_load: u32,
    pub max_consecutive: u32,
    pub strict_adjacency: bool,
    /// Reward slots next to a period the teacher already teaches.
    pub adjacency_bonus: bool,
}

/// Index-based view of an [`Instance`]. Teachers, subjects and classrooms are
/// addressed by their position in the instance vectors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Model {
    pub teachers: usize,
    pub classrooms: usize,
    pub days: usize,
    pub periods: usize,
    pub quotas: Vec<u32>,
    pub rules: Rules,
}

impl Model {
    pub fn new(inst: &Instance) -> Self {
        Self {
            teachers: inst.teachers.len(),
            classrooms: inst.classrooms.len(),
            days: inst.days as usize,
            periods: inst.periods_per_day as usize,
            quotas: inst.subjects.iter().map(|s| s.quota).collect(),
            rules: Rules {
                max_daily_load: inst.policy.max_daily_load,
                max_consecutive: inst.policy.max_consecutive,
                strict_adjacency: inst.policy.strict_adjacency,
                adjacency_bonus: true,
            },
        }
    }

    pub fn with_adjacency_bonus(mut self, enabled: bool) -> Self {
        self.rules.adjacency_bonus = enabled;
        self
    }

    pub fn subjects(&self) -> usize {
        self.quotas.len()
    }

    pub fn slots_per_classroom(&self) -> usize {
        self.days * self.periods
    }

    pub fn demand_per_classroom(&self) -> u32 {
        self.quotas.iter().sum()
    }

    /// All slots in day-major order.
    pub fn slots(&self) -> impl Iterator<Item = Slot> {
        let periods = self.periods;
        (0..self.days).flat_map(move |d| (0..periods).map(move |p| Slot::new(d, p)))
    }

    pub fn is_middle_period(&self, period: usize) -> bool {
        period > 0 && period + 1 < self.periods
    }

    pub fn is_middle_day(&self, day: usize) -> bool {
        day > 0 && day + 1 < self.days
    }
}
