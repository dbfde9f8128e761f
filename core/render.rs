pub mod csv;
pub mod markdown;

use crate::extract::ExtractionKind;

pub(crate) fn timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// "Constants and Class Methods Report"
pub(crate) fn default_title(kinds: &[ExtractionKind]) -> String {
    if kinds.is_empty() {
        return "Class Analysis Report".to_string();
    }
    let label = kinds
        .iter()
        .map(ExtractionKind::heading)
        .collect::<Vec<_>>()
        .join(" and ");
    format!("{} Report", label)
}
