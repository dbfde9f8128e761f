use serde::{Deserialize, Serialize};

/// How the missing-behaviors summary is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStyle {
    /// One section per class listing its missing behaviors.
    #[default]
    Grouped,
    /// One bullet line per class.
    Flat,
    /// Grouped with per-class counts and an overall total.
    Detailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStyle {
    #[default]
    Standard,
    /// Narrow columns, long values truncated with an ellipsis.
    Compact,
    /// No upper bound on column width.
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FooterStyle {
    #[default]
    Default,
    Minimal,
    Detailed,
}

/// Markdown renderer options. Every field has a serde default so partial
/// config files work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownOptions {
    pub title: Option<String>,
    pub show_metadata: bool,
    pub show_classes: bool,
    pub show_extraction_info: bool,
    pub show_missing_summary: bool,
    pub summary_style: SummaryStyle,
    pub table_style: TableStyle,
    pub min_column_width: usize,
    pub max_column_width: usize,
    pub show_footer: bool,
    pub footer_style: FooterStyle,
    pub show_timestamp: bool,
    pub custom_footer: Option<String>,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            title: None,
            show_metadata: true,
            show_classes: true,
            show_extraction_info: true,
            show_missing_summary: false,
            summary_style: SummaryStyle::default(),
            table_style: TableStyle::default(),
            min_column_width: 3,
            max_column_width: 50,
            show_footer: true,
            footer_style: FooterStyle::default(),
            show_timestamp: false,
            custom_footer: None,
        }
    }
}

impl MarkdownOptions {
    /// Default sections plus the missing-behaviors summary.
    pub fn report() -> Self {
        Self {
            show_missing_summary: true,
            ..Self::default()
        }
    }

    /// Table and footer only, no header sections.
    pub fn bare() -> Self {
        Self {
            show_metadata: false,
            show_classes: false,
            show_extraction_info: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    pub title: Option<String>,
    pub show_metadata: bool,
    pub separator: char,
    pub quote_char: char,
    pub flatten_hashes: bool,
    pub null_value: String,
    pub comment_char: char,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            title: None,
            show_metadata: true,
            separator: ',',
            quote_char: '"',
            flatten_hashes: true,
            null_value: String::new(),
            comment_char: '#',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_behavior() {
        let md = MarkdownOptions::default();
        // Header sections are on by default; the missing summary is opt-in.
        assert!(md.show_metadata);
        assert!(md.show_classes);
        assert!(md.show_extraction_info);
        assert!(!md.show_missing_summary);
        assert!(md.show_footer);
        assert!(!md.show_timestamp);
        assert_eq!(md.min_column_width, 3);
        assert_eq!(md.max_column_width, 50);

        let csv = CsvOptions::default();
        assert_eq!(csv.separator, ',');
        assert!(csv.flatten_hashes);
        assert_eq!(csv.null_value, "");
    }

    #[test]
    fn partial_config_deserializes_over_defaults() {
        let md: MarkdownOptions =
            serde_json::from_str(r#"{"title": "Audit", "summary_style": "detailed"}"#).unwrap();
        assert_eq!(md.title.as_deref(), Some("Audit"));
        assert_eq!(md.summary_style, SummaryStyle::Detailed);
        assert_eq!(md.max_column_width, 50);

        let csv: CsvOptions = serde_json::from_str(r#"{"separator": ";"}"#).unwrap();
        assert_eq!(csv.separator, ';');
        assert!(csv.show_metadata);
    }
}
