//! Hook Inventory Report
//!
//! Columnar text dump of a map's hooks for operators. Has no effect on
//! dispatch.
//!
//! ```text
//! init*                           get*      ...
//! ------------------------        ------------------------
//! initDoors
//!
//! stepMapStart*()                 stepSpriteStart*(sprite)        ...
//! ------------------------        ------------------------
//! stepMapStartClock/50            stepSpriteStartReset/10
//! ```

use std::fmt::Write;

use crate::step::phase::PhaseKind;

const COLUMN: usize = 32;
const RULE: &str = "------------------------";
const RESIDUAL_GROUPS: [&str; 4] = ["init", "get", "set", "del"];

/// Everything the report shows.
pub struct Inventory<'a> {
    /// `(phase, [(name, priority)])` for each tick phase, in execution order
    pub phases: Vec<(PhaseKind, Vec<(&'a str, i32)>)>,
    /// Other named members: init hooks and mechanic names
    pub members: Vec<&'a str>,
    /// Priority entries that name no registered hook
    pub unmatched: Vec<(PhaseKind, &'a str, i32)>,
}

/// Render the inventory.
pub fn render(inventory: &Inventory<'_>) -> String {
    let mut out = render_members(&inventory.members);
    out.push('\n');
    out.push_str(&render_phases(&inventory.phases));

    if !inventory.unmatched.is_empty() {
        out.push_str("\nunmatched priorities\n");
        out.push_str(RULE);
        out.push('\n');
        for (phase, name, priority) in &inventory.unmatched {
            let _ = writeln!(out, "{}/{} ({})", name, priority, phase);
        }
    }

    out
}

/// Residual members grouped `init* get* set* del* other`.
fn render_members(members: &[&str]) -> String {
    let mut columns: [Vec<&str>; 5] = Default::default();
    let mut sorted = members.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    for name in sorted {
        let group = RESIDUAL_GROUPS
            .iter()
            .position(|prefix| name.starts_with(prefix))
            .unwrap_or(RESIDUAL_GROUPS.len());
        columns[group].push(name);
    }

    let mut out = String::from("\n");
    for prefix in RESIDUAL_GROUPS {
        push_cell(&mut out, &format!("{}*", prefix));
    }
    push_cell(&mut out, "other");
    out.push('\n');
    push_rules(&mut out, columns.len());

    let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
    for row in 0..rows {
        for column in &columns {
            push_cell(&mut out, column.get(row).copied().unwrap_or(""));
        }
        out.push('\n');
    }

    out
}

/// Tick phase hooks, one column per phase, `name/priority` cells.
fn render_phases(phases: &[(PhaseKind, Vec<(&str, i32)>)]) -> String {
    let mut out = String::new();
    for (phase, _) in phases {
        push_cell(&mut out, &phase.signature());
    }
    out.push('\n');
    push_rules(&mut out, phases.len());

    let rows = phases.iter().map(|(_, hooks)| hooks.len()).max().unwrap_or(0);
    for row in 0..rows {
        for (_, hooks) in phases {
            let cell = hooks
                .get(row)
                .map(|(name, priority)| format!("{}/{}", name, priority))
                .unwrap_or_default();
            push_cell(&mut out, &cell);
        }
        out.push('\n');
    }

    out
}

fn push_cell(out: &mut String, text: &str) {
    let _ = write!(out, "{:width$}", text, width = COLUMN);
}

fn push_rules(out: &mut String, count: usize) {
    for _ in 0..count {
        push_cell(out, RULE);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::phase::TICK_PHASES;

    fn empty_phases<'a>() -> Vec<(PhaseKind, Vec<(&'a str, i32)>)> {
        TICK_PHASES.iter().map(|phase| (*phase, Vec::new())).collect()
    }

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.trim_end().to_string()).collect()
    }

    #[test]
    fn test_phase_columns() {
        let mut phases = empty_phases();
        phases[0].1 = vec![("stepMapStartClock", 50)];
        phases[3].1 = vec![("stepMoveWalk", 10), ("stepMoveSwim", 50)];

        let text = render_phases(&phases);
        let lines = lines(&text);

        assert!(lines[0].starts_with("stepMapStart*()"));
        assert!(lines[0].contains("trigger*(trigger, sprite)"));
        assert_eq!(&lines[2][..20], "stepMapStartClock/50");
        assert_eq!(&lines[2][3 * COLUMN..3 * COLUMN + 15], "stepMoveWalk/10");
        assert_eq!(lines[3].trim_start(), "stepMoveSwim/50");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_member_groups() {
        let text = render_members(&["initDoors", "getExit", "Walk", "delSprite", "setTile", "initAlpha"]);
        let lines = lines(&text);

        // Leading blank line, header, rule, then rows
        assert_eq!(lines[0], "");
        assert!(lines[1].starts_with("init*"));
        assert!(lines[1].ends_with("other"));
        assert!(lines[3].starts_with("initAlpha"));
        assert_eq!(&lines[3][COLUMN..COLUMN + 7], "getExit");
        assert_eq!(&lines[3][2 * COLUMN..2 * COLUMN + 7], "setTile");
        assert_eq!(&lines[3][3 * COLUMN..3 * COLUMN + 9], "delSprite");
        assert_eq!(&lines[3][4 * COLUMN..], "Walk");
        assert_eq!(lines[4], "initDoors");
    }

    #[test]
    fn test_unmatched_section() {
        let inventory = Inventory {
            phases: empty_phases(),
            members: vec![],
            unmatched: vec![(PhaseKind::Move, "stepMoveWlak", 5)],
        };
        let text = render(&inventory);
        assert!(text.contains("unmatched priorities"));
        assert!(text.contains("stepMoveWlak/5 (Move)"));
    }

    #[test]
    fn test_no_unmatched_section_when_clean() {
        let inventory = Inventory {
            phases: empty_phases(),
            members: vec!["initDoors"],
            unmatched: vec![],
        };
        assert!(!render(&inventory).contains("unmatched"));
    }
}
