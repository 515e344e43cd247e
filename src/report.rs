//! Plain-text rendering of roster, presence, and rotations.

use std::fmt::Write as _;

use crate::models::{PresenceSummary, Role, RotationRecord, StaffId, StaffMember};

/// Placeholder for a role column with nobody in it.
pub const NONE_LABEL: &str = "(none)";

fn members_with_role(staff: &[StaffMember], role: Role) -> impl Iterator<Item = &StaffMember> {
    staff.iter().filter(move |s| s.role == role)
}

/// Roster grouped by role, with short ids for later commands.
pub fn roster(staff: &[StaffMember]) -> String {
    let mut out = String::new();

    for role in Role::ALL {
        let members: Vec<_> = members_with_role(staff, role).collect();
        let _ = writeln!(out, "{} ({})", role.label(), members.len());
        if members.is_empty() {
            let _ = writeln!(out, "  {NONE_LABEL}");
        }
        for member in members {
            let _ = writeln!(out, "  {:<8}  {}", member.id.short(), member.name);
        }
    }

    out
}

/// Presence checklist with per-role counts.
pub fn presence(staff: &[StaffMember], present: &[StaffId], summary: &PresenceSummary) -> String {
    let mut out = String::new();

    for role in Role::ALL {
        let _ = writeln!(out, "{} {}", role.label(), summary.for_role(role));
        let mut any = false;
        for member in members_with_role(staff, role) {
            any = true;
            let mark = if present.contains(&member.id) { "x" } else { " " };
            let _ = writeln!(out, "  [{mark}] {:<8}  {}", member.id.short(), member.name);
        }
        if !any {
            let _ = writeln!(out, "  {NONE_LABEL}");
        }
    }

    out
}

/// One rotation as numbered columns.
pub fn rotation(record: &RotationRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Generated: {}", record.timestamp);

    for role in Role::ALL {
        let _ = writeln!(out, "{}", role.label());
        let order = record.order_for(role);
        if order.is_empty() {
            let _ = writeln!(out, "  {NONE_LABEL}");
        }
        for (idx, name) in order.iter().enumerate() {
            let _ = writeln!(out, "  {:>2}. {}", idx + 1, name);
        }
    }

    out
}

/// History, most recent first. `limit` caps the number of records shown.
pub fn history(records: &[RotationRecord], limit: Option<usize>) -> String {
    if records.is_empty() {
        return "No rotation history\n".to_string();
    }

    let shown = limit.unwrap_or(records.len()).min(records.len());
    let blocks: Vec<String> = records[..shown].iter().map(rotation).collect();
    let mut out = blocks.join("\n");

    if shown < records.len() {
        let _ = writeln!(out, "\n... {} older record(s) not shown", records.len() - shown);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoleCount;

    fn member(id: &str, name: &str, role: Role) -> StaffMember {
        StaffMember {
            id: StaffId::from(id),
            name: name.to_string(),
            role,
        }
    }

    #[test]
    fn test_roster_groups_by_role() {
        let staff = vec![
            member("aaaa1111bbbb", "Aoki", Role::Pharmacist),
            member("cccc2222dddd", "Baba", Role::Pharmacist),
        ];
        let text = roster(&staff);
        assert!(text.contains("Pharmacists (2)"));
        assert!(text.contains("aaaa1111  Aoki"));
        assert!(text.contains("Clerks (0)\n  (none)"));
    }

    #[test]
    fn test_presence_marks() {
        let staff = vec![member("p1", "Aoki", Role::Pharmacist), member("c1", "Chiba", Role::Clerk)];
        let summary = PresenceSummary {
            pharmacists: RoleCount { present: 1, total: 1 },
            clerks: RoleCount { present: 0, total: 1 },
        };
        let text = presence(&staff, &[StaffId::from("p1")], &summary);
        assert!(text.contains("Pharmacists 1/1"));
        assert!(text.contains("[x] p1"));
        assert!(text.contains("Clerks 0/1"));
        assert!(text.contains("[ ] c1"));
    }

    #[test]
    fn test_rotation_numbering() {
        let record = RotationRecord::new(
            "2025/12/02 12:00:00".to_string(),
            vec!["B".to_string(), "A".to_string()],
            Vec::new(),
        );
        let text = rotation(&record);
        assert!(text.starts_with("Generated: 2025/12/02 12:00:00\n"));
        assert!(text.contains(" 1. B\n"));
        assert!(text.contains(" 2. A\n"));
        assert!(text.contains("Clerks\n  (none)"));
    }

    #[test]
    fn test_history_limit() {
        assert_eq!(history(&[], None), "No rotation history\n");

        let records: Vec<_> = (0..3)
            .map(|i| RotationRecord::new(format!("t{i}"), vec!["A".to_string()], Vec::new()))
            .collect();
        let text = history(&records, Some(1));
        assert!(text.contains("Generated: t0"));
        assert!(!text.contains("Generated: t1"));
        assert!(text.contains("2 older record(s) not shown"));
    }
}
