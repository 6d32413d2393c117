//! Plain-text tables for terminals.

use sched_core::scoring::compute_soft_scores;
use std::fmt::Write as _;
use types::{ClassroomTimetable, Instance, StructureIssue, ValidationReport};

const DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const DAY_COL: usize = 6;

fn day_name(day: usize) -> String {
    DAY_NAMES
        .get(day)
        .map_or_else(|| format!("D{}", day + 1), |d| d.to_string())
}

fn finish(lines: Vec<String>) -> String {
    lines
        .iter()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

/// One classroom as a day-by-period grid, `FREE` for empty cells.
pub fn render_timetable(tt: &ClassroomTimetable) -> String {
    let labels: Vec<Vec<String>> = tt
        .cells
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Some(l) => format!("{}/{}", l.teacher_id, l.subject_id),
                    None => "FREE".to_string(),
                })
                .collect()
        })
        .collect();
    let periods = labels.first().map_or(0, Vec::len);
    let width = labels.iter().flatten().map(String::len).max().unwrap_or(4) + 2;

    let mut lines = vec![tt.classroom_id.to_string()];
    let mut header = format!("{:<DAY_COL$}", "");
    for p in 0..periods {
        let _ = write!(header, "{:<width$}", format!("P{}", p + 1));
    }
    lines.push(header);
    for (day, row) in labels.iter().enumerate() {
        let mut line = format!("{:<DAY_COL$}", day_name(day));
        for label in row {
            let _ = write!(line, "{label:<width$}");
        }
        lines.push(line);
    }
    finish(lines)
}

/// Daily loads, weekly total and idle windows per teacher.
pub fn render_teachers(inst: &Instance, timetables: &[ClassroomTimetable]) -> String {
    let days = inst.days as usize;
    let scores = compute_soft_scores(inst, timetables);
    let name_col = inst
        .teachers
        .iter()
        .map(|t| t.0.len())
        .chain(["teacher".len()])
        .max()
        .unwrap_or(0)
        + 2;

    let mut header = format!("{:<name_col$}", "teacher");
    for d in 0..days {
        let _ = write!(header, "{:<5}", day_name(d));
    }
    header.push_str("total  windows");
    let mut lines = vec![header];

    for teacher in &inst.teachers {
        let mut loads = vec![0u32; days];
        for tt in timetables {
            for (day, _, lesson) in tt.lessons() {
                if &lesson.teacher_id == teacher && day < days {
                    loads[day] += 1;
                }
            }
        }
        let mut line = format!("{:<name_col$}", teacher.0);
        for load in &loads {
            let _ = write!(line, "{load:<5}");
        }
        let total: u32 = loads.iter().sum();
        let windows = scores.windows_teachers.get(&teacher.0).copied().unwrap_or(0);
        let _ = write!(line, "{total:<7}{windows}");
        lines.push(line);
    }
    finish(lines)
}

fn structure_line(issue: &StructureIssue) -> String {
    match issue {
        StructureIssue::MissingClassroom { classroom_id } => {
            format!("missing   {classroom_id}: no timetable")
        }
        StructureIssue::StrayTimetable { classroom_id } => {
            format!("stray     {classroom_id}: unknown or repeated classroom")
        }
        StructureIssue::GridSize {
            classroom_id,
            day: None,
            expected,
            found,
        } => format!("grid      {classroom_id}: {found} days, expected {expected}"),
        StructureIssue::GridSize {
            classroom_id,
            day: Some(day),
            expected,
            found,
        } => format!(
            "grid      {classroom_id} {}: {found} periods, expected {expected}",
            day_name(*day as usize)
        ),
        StructureIssue::UnknownTeacher {
            teacher_id,
            classroom_id,
            day,
            period,
        } => format!(
            "teacher   {teacher_id} not on the roster: {classroom_id} {} P{}",
            day_name(*day as usize),
            period + 1
        ),
    }
}

pub fn render_report(report: &ValidationReport) -> String {
    if report.is_valid() {
        return "all checks passed".to_string();
    }
    let mut lines: Vec<String> = report.structure_issues.iter().map(structure_line).collect();
    for s in &report.quota_shortfalls {
        lines.push(format!(
            "quota     {} {}: {}/{}",
            s.classroom_id, s.subject_id, s.assigned, s.required
        ));
    }
    for c in &report.teacher_conflicts {
        let classrooms: Vec<String> = c.classroom_ids.iter().map(|r| r.to_string()).collect();
        lines.push(format!(
            "conflict  {} {} P{}: {}",
            c.teacher_id,
            day_name(c.day as usize),
            c.period + 1,
            classrooms.join(", ")
        ));
    }
    for l in &report.load_violations {
        lines.push(format!(
            "load      {} {}: {} > {}",
            l.teacher_id,
            day_name(l.day as usize),
            l.load,
            l.max
        ));
    }
    for v in &report.consecutive_violations {
        lines.push(format!(
            "run       {} {}: {} > {}",
            v.teacher_id,
            day_name(v.day as usize),
            v.run,
            v.limit
        ));
    }
    finish(lines)
}
