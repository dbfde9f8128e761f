use crate::display::ValueProcessor;
use crate::error::{CompError, Result};
use crate::extract::{ExtractionKind, RawTable};
use crate::options::CsvOptions;
use crate::table::{ExpansionFlags, TableBuilder};

/// Emits the CSV report: `#`-prefixed metadata comments followed by the
/// table, quoted and escaped by the csv writer.
pub(crate) struct CsvRenderer<'a> {
    table: &'a RawTable,
    kinds: &'a [ExtractionKind],
    options: &'a CsvOptions,
    flags: ExpansionFlags,
    show_source: bool,
}

impl<'a> CsvRenderer<'a> {
    pub fn new(
        table: &'a RawTable,
        kinds: &'a [ExtractionKind],
        options: &'a CsvOptions,
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

    pub fn render(&self) -> Result<String> {
        if self.table.is_empty() {
            return Ok(String::new());
        }

        let mut output = String::new();
        if self.options.show_metadata {
            for line in self.metadata_lines() {
                output.push_str(&line);
                output.push('\n');
            }
        }
        output.push_str(&self.table_body()?);
        Ok(output)
    }

    fn metadata_lines(&self) -> Vec<String> {
        let comment = self.options.comment_char;
        let title = self
            .options
            .title
            .clone()
            .unwrap_or_else(|| super::default_title(self.kinds));

        let mut lines = vec![
            format!("{} {}", comment, title),
            format!("{} Classes: {}", comment, self.table.classes.join(", ")),
        ];
        if !self.kinds.is_empty() {
            let headings: Vec<String> = self.kinds.iter().map(ExtractionKind::heading).collect();
            lines.push(format!(
                "{} Extraction Types: {}",
                comment,
                headings.join(", ")
            ));
        }
        lines.push(format!("{} Generated: {}", comment, super::timestamp()));
        lines.push(comment.to_string());
        lines
    }

    fn table_body(&self) -> Result<String> {
        let separator = ascii_byte(self.options.separator, "separator")?;
        let quote = ascii_byte(self.options.quote_char, "quote_char")?;

        let processor = ValueProcessor::csv(self.options.null_value.clone(), self.show_source);
        let builder = TableBuilder::new(self.table, processor, self.flags);
        let display = if self.flags.expand_hashes && self.options.flatten_hashes {
            builder.build_flattened()
        } else {
            builder.build_expanded()
        };

        let mut writer = csv::WriterBuilder::new()
            .delimiter(separator)
            .quote(quote)
            .from_writer(Vec::new());
        writer.write_record(&display.headers)?;
        for row in &display.rows {
            writer.write_record(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| CompError::Csv(err.to_string()))?;
        Ok(String::from_utf8(bytes)?)
    }
}

fn ascii_byte(c: char, field: &str) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(CompError::InvalidArgument(format!(
            "{} must be an ASCII character",
            field
        )))
    }
}
