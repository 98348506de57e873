//! Department path segmentation
//!
//! A path such as `總經理直轄-法令遵循部-法令遵循二科` names a department
//! by its chain of ancestors. Segments are trimmed and rejoined with a bare
//! separator, so `Sales - North` and `Sales-North` share one business key.

use crate::config::ParentOverride;

pub const PATH_SEPARATOR: char = '-';

/// A parsed, non-empty department path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentPath {
    code: String,
    segments: Vec<String>,
}

impl DepartmentPath {
    /// Returns `None` for blank input
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let segments: Vec<String> = raw
            .split(PATH_SEPARATOR)
            .map(|s| s.trim().to_string())
            .collect();
        let sep = PATH_SEPARATOR.to_string();
        Some(Self {
            code: segments.join(sep.as_str()),
            segments,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn short_name(&self) -> &str {
        // parse() never yields an empty segment list
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// All but the last segment, rejoined; `None` for a single segment
    pub fn parent_path(&self) -> Option<String> {
        if self.segments.len() < 2 {
            return None;
        }
        let sep = PATH_SEPARATOR.to_string();
        Some(self.segments[..self.segments.len() - 1].join(sep.as_str()))
    }

    /// Parent path after applying the "direct report" override table.
    ///
    /// Overrides only apply to two-segment paths and match on the first segment.
    pub fn parent_path_with(&self, overrides: &[ParentOverride]) -> Option<String> {
        if self.segments.len() == 2 {
            if let Some(ov) = overrides
                .iter()
                .find(|ov| ov.prefix.trim() == self.segments[0])
            {
                return DepartmentPath::parse(&ov.parent).map(|p| p.code);
            }
        }
        self.parent_path()
    }

    /// Segment count plus `offset`
    pub fn level(&self, offset: i32) -> i32 {
        self.segments.len() as i32 + offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn overrides() -> Vec<ParentOverride> {
        vec![ParentOverride {
            prefix: "CEO Direct".to_string(),
            parent: "CEO".to_string(),
        }]
    }

    #[test]
    fn test_parse_single_segment() {
        let p = DepartmentPath::parse("  Sales ").unwrap();
        assert_eq!(p.code(), "Sales");
        assert_eq!(p.short_name(), "Sales");
        assert_eq!(p.parent_path(), None);
        assert_eq!(p.level(1), 2);
    }

    #[test]
    fn test_parse_trims_segments() {
        let p = DepartmentPath::parse("Sales - North -East").unwrap();
        assert_eq!(p.code(), "Sales-North-East");
        assert_eq!(p.short_name(), "East");
        assert_eq!(p.parent_path().as_deref(), Some("Sales-North"));
        assert_eq!(p.level(1), 4);
    }

    #[test]
    fn test_spacing_does_not_change_the_key() {
        let spaced = DepartmentPath::parse(" Sales - North ").unwrap();
        let bare = DepartmentPath::parse("Sales-North").unwrap();
        assert_eq!(spaced, bare);

        let child = DepartmentPath::parse("Sales - North - East").unwrap();
        assert_eq!(child.parent_path().as_deref(), Some(spaced.code()));
    }

    #[test]
    fn test_blank_is_none() {
        assert_eq!(DepartmentPath::parse("   "), None);
    }

    #[test]
    fn test_override_applies_to_two_segments_only() {
        let two = DepartmentPath::parse("CEO Direct-Legal").unwrap();
        assert_eq!(two.parent_path_with(&overrides()).as_deref(), Some("CEO"));

        let three = DepartmentPath::parse("CEO Direct-Legal-Team 2").unwrap();
        assert_eq!(
            three.parent_path_with(&overrides()).as_deref(),
            Some("CEO Direct-Legal")
        );

        let other = DepartmentPath::parse("Sales-North").unwrap();
        assert_eq!(other.parent_path_with(&overrides()).as_deref(), Some("Sales"));

        let spaced = vec![ParentOverride {
            prefix: " CEO Direct ".to_string(),
            parent: "Board - CEO".to_string(),
        }];
        assert_eq!(two.parent_path_with(&spaced).as_deref(), Some("Board-CEO"));
    }

    proptest! {
        #[test]
        fn prop_parent_chain_is_nested_prefixes(parts in prop::collection::vec("[a-z]{1,4}", 1..6)) {
            let raw = parts.join(" - ");
            let p = DepartmentPath::parse(&raw).unwrap();
            prop_assert_eq!(p.code(), parts.join("-"));

            let mut steps = 0;
            let mut current = p.clone();
            while let Some(parent) = current.parent_path() {
                let pp = DepartmentPath::parse(&parent).unwrap();
                prop_assert_eq!(pp.level(1), current.level(1) - 1);
                prop_assert!(p.code().starts_with(pp.code()));
                current = pp;
                steps += 1;
            }
            prop_assert_eq!(steps, parts.len() - 1);
            prop_assert_eq!(current.level(1), 2);
        }
    }
}
