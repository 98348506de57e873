//! Obsolete department detection
//!
//! A department path is obsolete when the current snapshot no longer backs
//! it: nobody is listed under it, or it has no active employee while one of
//! its secondary keys now belongs to another path that does.

use std::collections::HashMap;

use crate::hierarchy::segment::DepartmentPath;
use crate::source::SourceRow;

/// Rows grouped by normalized department path
pub struct ObsolescenceDetector<'a> {
    by_path: HashMap<String, Vec<&'a SourceRow>>,
    keyed: Vec<(String, &'a SourceRow)>,
    active_marker: &'a str,
}

impl<'a> ObsolescenceDetector<'a> {
    pub fn new(rows: &'a [SourceRow], active_marker: &'a str) -> Self {
        let keyed: Vec<(String, &SourceRow)> = rows
            .iter()
            .filter_map(|row| DepartmentPath::parse(row.path()).map(|p| (p.code().to_string(), row)))
            .collect();

        let mut by_path: HashMap<String, Vec<&SourceRow>> = HashMap::new();
        for (code, row) in &keyed {
            by_path.entry(code.clone()).or_default().push(*row);
        }
        Self {
            by_path,
            keyed,
            active_marker: active_marker.trim(),
        }
    }

    pub fn is_obsolete(&self, path: &str) -> bool {
        let Some(target) = DepartmentPath::parse(path) else {
            return true;
        };
        let target = target.code();
        let Some(records) = self.by_path.get(target) else {
            return true;
        };

        if records.iter().any(|r| r.is_active(self.active_marker)) {
            return false;
        }

        // No active employee left: obsolete only if another active path took over a key
        let dep_nos: Vec<&str> = records
            .iter()
            .map(|r| r.dep_no.trim())
            .filter(|k| !k.is_empty())
            .collect();
        let dep_codes: Vec<&str> = records
            .iter()
            .map(|r| r.dep_code.trim())
            .filter(|k| !k.is_empty())
            .collect();

        self.keyed
            .iter()
            .filter(|(code, r)| code != target && r.is_active(self.active_marker))
            .any(|(_, r)| dep_nos.contains(&r.dep_no.trim()) || dep_codes.contains(&r.dep_code.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::row;

    const ACTIVE: &str = "在職";

    #[test]
    fn test_absent_path_is_obsolete() {
        let rows = vec![row("A", "1", "D1", ACTIVE, "W1")];
        let d = ObsolescenceDetector::new(&rows, ACTIVE);
        assert!(d.is_obsolete("B"));
    }

    #[test]
    fn test_active_path_is_kept() {
        let rows = vec![
            row("A", "1", "D1", "留停", "W1"),
            row("A", "1", "D1", ACTIVE, "W2"),
        ];
        let d = ObsolescenceDetector::new(&rows, ACTIVE);
        assert!(!d.is_obsolete(" A "));
    }

    #[test]
    fn test_spelling_variants_share_one_group() {
        let rows = vec![
            row("Sales - North", "7", "D7", "留停", "W1"),
            row("Sales-North", "7", "D7", ACTIVE, "W2"),
        ];
        let d = ObsolescenceDetector::new(&rows, ACTIVE);
        // The active row backs both spellings; it is not a successor of itself
        assert!(!d.is_obsolete("Sales - North"));
        assert!(!d.is_obsolete("Sales-North"));
    }

    #[test]
    fn test_superseded_by_numeric_key() {
        let rows = vec![
            row("Old Name", "7", "D7", "留停", "W1"),
            row("New Name", "7", "D99", ACTIVE, "W2"),
        ];
        let d = ObsolescenceDetector::new(&rows, ACTIVE);
        assert!(d.is_obsolete("Old Name"));
        assert!(!d.is_obsolete("New Name"));
    }

    #[test]
    fn test_superseded_by_short_code() {
        let rows = vec![
            row("Old Name", "7", "D7", "留停", "W1"),
            row("New Name", "8", "D7", ACTIVE, "W2"),
        ];
        let d = ObsolescenceDetector::new(&rows, ACTIVE);
        assert!(d.is_obsolete("Old Name"));
    }

    #[test]
    fn test_inactive_without_successor_is_kept() {
        let rows = vec![
            row("Quiet", "7", "D7", "留停", "W1"),
            row("Busy", "8", "D8", ACTIVE, "W2"),
        ];
        let d = ObsolescenceDetector::new(&rows, ACTIVE);
        assert!(!d.is_obsolete("Quiet"));
    }

    #[test]
    fn test_successor_without_active_rows_does_not_count() {
        let rows = vec![
            row("Old Name", "7", "D7", "留停", "W1"),
            row("New Name", "7", "D7", "留停", "W2"),
        ];
        let d = ObsolescenceDetector::new(&rows, ACTIVE);
        assert!(!d.is_obsolete("Old Name"));
    }

    #[test]
    fn test_blank_keys_never_match() {
        let rows = vec![
            row("Old Name", "", "D7", "留停", "W1"),
            row("New Name", "", "D8", ACTIVE, "W2"),
        ];
        let d = ObsolescenceDetector::new(&rows, ACTIVE);
        assert!(!d.is_obsolete("Old Name"));
    }
}
