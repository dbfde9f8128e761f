use crate::display::ValueProcessor;
use crate::extract::{Cell, ExtractionKind, RawTable};
use crate::options::{FooterStyle, MarkdownOptions, SummaryStyle, TableStyle};
use crate::table::{DisplayTable, ExpansionFlags, TableBuilder};
use indexmap::IndexMap;

/// Assembles the markdown report: header, comparison table, optional
/// missing-behaviors summary and footer, separated by blank lines.
pub(crate) struct MarkdownRenderer<'a> {
    table: &'a RawTable,
    kinds: &'a [ExtractionKind],
    options: &'a MarkdownOptions,
    flags: ExpansionFlags,
    show_source: bool,
}

impl<'a> MarkdownRenderer<'a> {
    pub fn new(
        table: &'a RawTable,
        kinds: &'a [ExtractionKind],
        options: &'a MarkdownOptions,
        flags: ExpansionFlags,
        show_source: bool,
    ) -> Self {
        Self {
            table,
            kinds,
            options,
            flags,
            show_source,
        }
    }

    pub fn render(&self) -> String {
        if self.table.is_empty() {
            return String::new();
        }

        let display = TableBuilder::new(
            self.table,
            ValueProcessor::markdown(self.show_source),
            self.flags,
        )
        .build_expanded();

        let mut lines: Vec<String> = Vec::new();
        lines.extend(self.header_lines());
        lines.extend(table_lines(&display, self.options));
        lines.extend(self.missing_summary_lines());
        lines.extend(self.footer_lines());

        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }
        lines.join("\n")
    }

    fn header_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if self.options.title.is_some() || self.options.show_metadata {
            let title = self
                .options
                .title
                .clone()
                .unwrap_or_else(|| super::default_title(self.kinds));
            lines.push(format!("# {}", title));
            lines.push(String::new());
        }

        if self.options.show_classes {
            lines.push("## Classes Analyzed".to_string());
            lines.push(String::new());
            for class in &self.table.classes {
                lines.push(format!("- **{}**", class));
            }
            lines.push(String::new());
        }

        if self.options.show_extraction_info && !self.kinds.is_empty() {
            lines.push("## Extraction Types".to_string());
            lines.push(String::new());
            for kind in self.kinds {
                lines.push(kind.legend());
            }
            lines.push(String::new());
        }

        lines
    }

    fn missing_summary_lines(&self) -> Vec<String> {
        if !self.options.show_missing_summary {
            return Vec::new();
        }

        let missing = self.track_missing();
        let total: usize = missing.values().map(IndexMap::len).sum();
        if total == 0 {
            return Vec::new();
        }

        match self.options.summary_style {
            SummaryStyle::Grouped => grouped_summary(&missing),
            SummaryStyle::Flat => flat_summary(&missing),
            SummaryStyle::Detailed => detailed_summary(&missing, total),
        }
    }

    /// Class -> behavior -> rendered marker, in column order. Null cells
    /// count as missing alongside tagged error cells.
    fn track_missing(&self) -> IndexMap<String, IndexMap<String, String>> {
        let processor = ValueProcessor::markdown(false);
        let mut missing: IndexMap<String, IndexMap<String, String>> = self
            .table
            .classes
            .iter()
            .map(|class| (class.clone(), IndexMap::new()))
            .collect();

        for row in &self.table.rows {
            for (class, cell) in self.table.classes.iter().zip(&row.cells) {
                let message = match cell {
                    Cell::Error(marker) => processor.error(marker),
                    Cell::Value { value, .. } if value.is_null() => {
                        "\u{1f6ab} Not defined".to_string()
                    }
                    Cell::Value { .. } => continue,
                };
                missing
                    .entry(class.clone())
                    .or_default()
                    .insert(row.behavior.clone(), message);
            }
        }

        missing
    }

    fn footer_lines(&self) -> Vec<String> {
        if !self.options.show_footer {
            return Vec::new();
        }

        let mut lines = vec!["---".to_string()];
        match self.options.footer_style {
            FooterStyle::Minimal => lines.push("*Generated by classcomp*".to_string()),
            FooterStyle::Detailed => {
                lines.push("## Report Information".to_string());
                lines.push(String::new());
                lines.push(format!(
                    "- **Generated by**: classcomp {}",
                    env!("CARGO_PKG_VERSION")
                ));
                lines.push(format!("- **Generated at**: {}", super::timestamp()));
                if let Some(note) = &self.options.custom_footer {
                    lines.push(format!("- **Note**: {}", note));
                }
            }
            FooterStyle::Default => {
                let text = self
                    .options
                    .custom_footer
                    .clone()
                    .unwrap_or_else(|| "*Report generated by classcomp*".to_string());
                lines.push(text);
                if self.options.show_timestamp {
                    lines.push(String::new());
                    lines.push(format!("*Generated at: {}*", super::timestamp()));
                }
            }
        }
        lines
    }
}

fn table_lines(display: &DisplayTable, options: &MarkdownOptions) -> Vec<String> {
    let widths = column_widths(display, options);
    let mut lines = Vec::with_capacity(display.rows.len() + 3);
    lines.push(pipe_row(&display.headers, &widths, options));
    lines.push(separator_row(&widths));
    for row in &display.rows {
        lines.push(pipe_row(row, &widths, options));
    }
    lines.push(String::new());
    lines
}

fn column_widths(display: &DisplayTable, options: &MarkdownOptions) -> Vec<usize> {
    let mut widths: Vec<usize> = display
        .headers
        .iter()
        .map(|header| header.chars().count())
        .collect();

    for row in &display.rows {
        for (index, cell) in row.iter().enumerate() {
            if index >= widths.len() {
                continue;
            }
            let mut width = cell.chars().count();
            if options.table_style == TableStyle::Compact {
                width = width.min(options.max_column_width);
            }
            widths[index] = widths[index].max(width);
        }
    }

    widths
        .into_iter()
        .map(|width| width.max(options.min_column_width))
        .collect()
}

fn pipe_row(cells: &[String], widths: &[usize], options: &MarkdownOptions) -> String {
    let formatted: Vec<String> = cells
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            let width = widths.get(index).copied().unwrap_or(10);
            let content = truncate_cell(cell, options);
            let pad = width.saturating_sub(content.chars().count());
            format!(" {}{} ", content, " ".repeat(pad))
        })
        .collect();
    format!("|{}|", formatted.join("|"))
}

fn truncate_cell(cell: &str, options: &MarkdownOptions) -> String {
    let length = cell.chars().count();
    if options.table_style != TableStyle::Compact || length <= options.max_column_width {
        return cell.to_string();
    }
    let keep = options.max_column_width.saturating_sub(3);
    let truncated: String = cell.chars().take(keep).collect();
    format!("{}...", truncated)
}

fn separator_row(widths: &[usize]) -> String {
    let segments: Vec<String> = widths.iter().map(|width| "-".repeat(width + 2)).collect();
    format!("|{}|", segments.join("|"))
}

fn grouped_summary(missing: &IndexMap<String, IndexMap<String, String>>) -> Vec<String> {
    let mut lines = vec![
        "## Missing Behaviors Summary".to_string(),
        String::new(),
        "The following behaviors are not defined in some classes:".to_string(),
        String::new(),
    ];
    for (class, behaviors) in missing {
        if behaviors.is_empty() {
            continue;
        }
        lines.push(format!("### {}", class));
        for (behavior, message) in behaviors {
            lines.push(format!("- `{}` - {}", behavior, message));
        }
        lines.push(String::new());
    }
    lines
}

fn flat_summary(missing: &IndexMap<String, IndexMap<String, String>>) -> Vec<String> {
    let mut lines = vec!["## Missing Behaviors".to_string(), String::new()];
    let mut bullets: Vec<String> = missing
        .iter()
        .flat_map(|(class, behaviors)| {
            behaviors
                .iter()
                .map(move |(behavior, message)| {
                    format!("- **{}**: `{}` - {}", class, behavior, message)
                })
        })
        .collect();
    bullets.sort();
    lines.extend(bullets);
    lines.push(String::new());
    lines
}

fn detailed_summary(
    missing: &IndexMap<String, IndexMap<String, String>>,
    total: usize,
) -> Vec<String> {
    let mut lines = vec![
        "## Missing Behaviors Analysis".to_string(),
        String::new(),
        format!(
            "**Summary**: {} missing behaviors across {} classes",
            total,
            missing.len()
        ),
        String::new(),
    ];

    // Group by marker prefix, e.g. "🚫 Not" or "⚠️ Error:".
    let mut by_prefix: IndexMap<String, Vec<String>> = IndexMap::new();
    for (class, behaviors) in missing {
        for (behavior, message) in behaviors {
            let prefix = message.split_whitespace().take(2).collect::<Vec<_>>().join(" ");
            by_prefix
                .entry(prefix)
                .or_default()
                .push(format!("- **{}**: `{}` - {}", class, behavior, message));
        }
    }

    for (prefix, items) in by_prefix {
        lines.push(format!("### {} ({} items)", prefix, items.len()));
        lines.push(String::new());
        lines.extend(items);
        lines.push(String::new());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ErrorMarker, RawRow};
    use crate::value::Value;

    fn fixture_table() -> RawTable {
        RawTable {
            label_header: "Constant".to_string(),
            classes: vec!["ServiceA".to_string(), "ServiceB".to_string()],
            has_kind_column: false,
            rows: vec![
                RawRow {
                    kind: None,
                    behavior: "NAME".to_string(),
                    cells: vec![Cell::value(Value::from("a")), Cell::value(Value::from("b"))],
                },
                RawRow {
                    kind: None,
                    behavior: "RETRIES".to_string(),
                    cells: vec![
                        Cell::Error(ErrorMarker::missing_constant()),
                        Cell::value(Value::Int(3)),
                    ],
                },
            ],
        }
    }

    fn render(options: &MarkdownOptions) -> String {
        let table = fixture_table();
        MarkdownRenderer::new(
            &table,
            &[ExtractionKind::Constants],
            options,
            ExpansionFlags::default(),
            false,
        )
        .render()
    }

    #[test]
    fn default_options_render_header_sections() {
        let output = render(&MarkdownOptions::default());
        assert!(output.starts_with("# Constants Report"));
        assert!(output.contains("## Classes Analyzed"));
        assert!(output.contains("- **ServiceA**"));
        assert!(output.contains("## Extraction Types"));
        assert!(output.contains("| NAME     | a             | b        |"));
        assert!(output.ends_with("---\n*Report generated by classcomp*"));
        // The missing summary stays opt-in.
        assert!(!output.contains("## Missing Behaviors"));
    }

    #[test]
    fn bare_options_render_table_and_footer_only() {
        let output = render(&MarkdownOptions::bare());
        assert!(output.starts_with("| Constant |"));
        assert!(output.contains("| NAME     | a             | b        |"));
        assert!(!output.contains("## Classes Analyzed"));
        assert!(!output.contains("# Constants Report"));
    }

    #[test]
    fn column_widths_pad_to_widest_cell() {
        let output = render(&MarkdownOptions::bare());
        let lines: Vec<&str> = output.lines().collect();
        // Header, separator and data rows all share the same width.
        assert_eq!(lines[0].len(), lines[1].len());
        assert_eq!(lines[0].len(), lines[2].len());
        assert!(lines[1].starts_with("|----------|"));
    }

    #[test]
    fn report_mode_emits_all_sections() {
        let output = render(&MarkdownOptions::report());
        assert!(output.starts_with("# Constants Report"));
        assert!(output.contains("## Classes Analyzed"));
        assert!(output.contains("- **ServiceA**"));
        assert!(output.contains("## Extraction Types"));
        assert!(output.contains("- **Constants**: Class constants and their values"));
        assert!(output.contains("## Missing Behaviors Summary"));
        assert!(output.contains("### ServiceA"));
        assert!(output.contains("- `RETRIES` - \u{1f6ab} Not defined"));
    }

    #[test]
    fn custom_title_overrides_the_generated_one() {
        let options = MarkdownOptions {
            title: Some("Service Audit".to_string()),
            ..MarkdownOptions::default()
        };
        assert!(render(&options).starts_with("# Service Audit"));
    }

    #[test]
    fn null_cells_count_as_missing_in_the_summary() {
        let mut table = fixture_table();
        table.rows[0].cells[1] = Cell::value(Value::Null);
        let options = MarkdownOptions {
            show_missing_summary: true,
            summary_style: SummaryStyle::Flat,
            ..MarkdownOptions::default()
        };
        let output = MarkdownRenderer::new(
            &table,
            &[ExtractionKind::Constants],
            &options,
            ExpansionFlags::default(),
            false,
        )
        .render();
        assert!(output.contains("## Missing Behaviors"));
        assert!(output.contains("- **ServiceB**: `NAME` - \u{1f6ab} Not defined"));
    }

    #[test]
    fn detailed_summary_groups_by_marker_prefix() {
        let mut table = fixture_table();
        table.rows[0].cells[0] = Cell::Error(ErrorMarker::invocation("boom happened here"));
        let options = MarkdownOptions {
            show_missing_summary: true,
            summary_style: SummaryStyle::Detailed,
            ..MarkdownOptions::default()
        };
        let output = MarkdownRenderer::new(
            &table,
            &[ExtractionKind::Constants],
            &options,
            ExpansionFlags::default(),
            false,
        )
        .render();
        assert!(output.contains("**Summary**: 2 missing behaviors across 2 classes"));
        assert!(output.contains("### \u{26a0}\u{fe0f} Error: (1 items)"));
        assert!(output.contains("### \u{1f6ab} Not (1 items)"));
    }

    #[test]
    fn compact_style_truncates_long_cells() {
        let mut table = fixture_table();
        table.rows[0].cells[0] = Cell::value(Value::from("x".repeat(80)));
        let options = MarkdownOptions {
            table_style: TableStyle::Compact,
            max_column_width: 10,
            ..MarkdownOptions::default()
        };
        let output = MarkdownRenderer::new(
            &table,
            &[ExtractionKind::Constants],
            &options,
            ExpansionFlags::default(),
            false,
        )
        .render();
        assert!(output.contains("xxxxxxx..."));
        assert!(!output.contains(&"x".repeat(11)));
    }

    #[test]
    fn empty_table_renders_nothing() {
        let table = RawTable::default();
        let output = MarkdownRenderer::new(
            &table,
            &[],
            &MarkdownOptions::default(),
            ExpansionFlags::default(),
            false,
        )
        .render();
        assert_eq!(output, "");
    }
}
