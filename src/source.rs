//! Snapshot source rows
//!
//! Parses the HR snapshot file into [`SourceRow`]s and applies the
//! eligibility filter and depth ordering used by a batch.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::SyncResult;
use crate::hierarchy::segment::PATH_SEPARATOR;

const DATE_FORMAT: &str = "%Y%m%d";

/// One employee/department-membership observation from the snapshot.
///
/// Every column is kept as the trimmed cell text; blank cells are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceRow {
    #[serde(rename = "CPNYID")]
    pub company_key: String,
    /// Numeric secondary department key
    #[serde(rename = "DEP_NO")]
    pub dep_no: String,
    /// Short-code secondary department key
    #[serde(rename = "DEP_CODE")]
    pub dep_code: String,
    /// Dash-delimited department path
    #[serde(rename = "DEP_NAME")]
    pub dep_name: String,
    #[serde(rename = "STATE_NO")]
    pub state_no: String,
    #[serde(rename = "STATE_NAME")]
    pub state_name: String,
    #[serde(rename = "EMP_ID")]
    pub emp_id: String,
    #[serde(rename = "EMP_NAME")]
    pub emp_name: String,
    /// Login key of the employee
    #[serde(rename = "WORKCARD")]
    pub workcard: String,
    #[serde(rename = "INADATE")]
    pub hire_date: String,
    #[serde(rename = "QUITDATE")]
    pub quit_date: String,
    #[serde(rename = "STOP_W")]
    pub stop_w: String,
    #[serde(rename = "START_W")]
    pub start_w: String,
    #[serde(rename = "MDATE")]
    pub modified_date: String,
    #[serde(rename = "POSITION_NAME")]
    pub position_name: String,
    #[serde(rename = "MOBILE")]
    pub mobile: String,
    #[serde(rename = "TITLE_NAME")]
    pub title_name: String,
    #[serde(rename = "WORKPLACE_NAME")]
    pub workplace_name: String,
}

impl SourceRow {
    /// Trimmed department path
    pub fn path(&self) -> &str {
        self.dep_name.trim()
    }

    /// Number of path separators, used to order parents before children
    pub fn depth(&self) -> usize {
        self.path().matches(PATH_SEPARATOR).count()
    }

    pub fn is_active(&self, active_marker: &str) -> bool {
        self.state_name.trim() == active_marker
    }

    /// Rows without a short code, a name, or an enabled state are not reconciled
    pub fn is_eligible(&self, enabled_states: &HashSet<&str>) -> bool {
        !self.dep_code.trim().is_empty()
            && !self.emp_name.trim().is_empty()
            && enabled_states.contains(self.state_no.trim())
    }

    /// JSON snapshot of the row for the error log
    pub fn payload(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// `None` for blank cells and for anything that is not `yyyyMMdd`
pub fn parse_compact_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            tracing::debug!("Unparseable date value: {}", value);
            None
        }
    }
}

/// Blank cells become `None`
pub fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a snapshot file body. A leading UTF-8 BOM is ignored.
pub fn parse_rows(content: &str) -> SyncResult<Vec<SourceRow>> {
    let content = content.trim_start_matches('\u{feff}');
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for rec in rdr.deserialize() {
        let row: SourceRow = rec?;
        rows.push(row);
    }
    Ok(rows)
}

/// Keep eligible rows, ordered shallow paths first and then by path
pub fn eligible_rows(rows: &[SourceRow], enabled_states: &[String]) -> Vec<SourceRow> {
    let enabled: HashSet<&str> = enabled_states.iter().map(|s| s.trim()).collect();
    let mut valid: Vec<SourceRow> = rows
        .iter()
        .filter(|r| r.is_eligible(&enabled))
        .cloned()
        .collect();
    valid.sort_by(|a, b| a.depth().cmp(&b.depth()).then_with(|| a.path().cmp(b.path())));
    valid
}

/// First row for every distinct non-blank path, in input order
pub fn unique_by_path(rows: &[SourceRow]) -> Vec<&SourceRow> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|r| !r.path().is_empty())
        .filter(|r| seen.insert(r.path()))
        .collect()
}

#[cfg(test)]
pub(crate) fn row(path: &str, dep_no: &str, dep_code: &str, state_name: &str, workcard: &str) -> SourceRow {
    SourceRow {
        company_key: "C1".to_string(),
        dep_no: dep_no.to_string(),
        dep_code: dep_code.to_string(),
        dep_name: path.to_string(),
        state_no: "A".to_string(),
        state_name: state_name.to_string(),
        emp_name: format!("Emp {}", workcard),
        workcard: workcard.to_string(),
        mobile: "0900000000".to_string(),
        ..Default::default()
    }
}
