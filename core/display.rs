use crate::extract::{Cell, ErrorKind, ErrorMarker};
use crate::value::Value;

/// Placeholder for an expansion key a class's map does not carry.
pub(crate) const MISSING_KEY: &str = "\u{2014}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenderFlavor {
    Markdown,
    Csv,
}

/// Turns cells into display strings. Glyphs and null substitutes exist only
/// here; everything upstream works on tagged cells.
#[derive(Debug, Clone)]
pub(crate) struct ValueProcessor {
    flavor: RenderFlavor,
    null_value: String,
    show_source: bool,
}

impl ValueProcessor {
    pub fn markdown(show_source: bool) -> Self {
        Self {
            flavor: RenderFlavor::Markdown,
            null_value: String::new(),
            show_source,
        }
    }

    pub fn csv(null_value: impl Into<String>, show_source: bool) -> Self {
        Self {
            flavor: RenderFlavor::Csv,
            null_value: null_value.into(),
            show_source,
        }
    }

    pub fn cell(&self, cell: &Cell) -> String {
        match cell {
            Cell::Value { value, source } => {
                let rendered = self.value(value);
                match source {
                    Some(source) if self.show_source && !rendered.is_empty() => {
                        format!("{} (from {})", rendered, source.label)
                    }
                    _ => rendered,
                }
            }
            Cell::Error(marker) => self.error(marker),
        }
    }

    pub fn value(&self, value: &Value) -> String {
        match (self.flavor, value) {
            (RenderFlavor::Markdown, Value::Null) => "\u{274c}".to_string(),
            (RenderFlavor::Markdown, Value::Bool(true)) => "\u{2705}".to_string(),
            (RenderFlavor::Markdown, Value::Bool(false)) => "\u{274c}".to_string(),
            (RenderFlavor::Csv, Value::Null) => self.null_value.clone(),
            (RenderFlavor::Csv, Value::Bool(true)) => "TRUE".to_string(),
            (RenderFlavor::Csv, Value::Bool(false)) => "FALSE".to_string(),
            (RenderFlavor::Csv, Value::Str(s)) => strip_glyphs(s),
            (_, Value::Str(s)) => s.clone(),
            (RenderFlavor::Markdown, Value::Seq(items)) => join_items(self, items, ", "),
            (RenderFlavor::Csv, Value::Seq(items)) => join_items(self, items, "; "),
            (_, Value::Map(_)) => value.inspect(),
            (_, other) => other.to_string(),
        }
    }

    pub fn error(&self, marker: &ErrorMarker) -> String {
        if self.flavor == RenderFlavor::Csv {
            return self.null_value.clone();
        }
        match marker.kind {
            ErrorKind::MissingConstant => "\u{1f6ab} Not defined".to_string(),
            ErrorKind::MissingMethod => "\u{1f6ab} No method".to_string(),
            ErrorKind::Invocation => {
                let brief: Vec<&str> = marker.message.split_whitespace().take(3).collect();
                format!("\u{26a0}\u{fe0f} Error: {}", brief.join(" "))
            }
        }
    }

    pub fn null_value(&self) -> &str {
        &self.null_value
    }

    /// Marker for an expansion key absent from a class's map.
    pub fn missing_key(&self) -> String {
        match self.flavor {
            RenderFlavor::Markdown => MISSING_KEY.to_string(),
            RenderFlavor::Csv => self.null_value.clone(),
        }
    }
}

fn join_items(processor: &ValueProcessor, items: &[Value], separator: &str) -> String {
    items
        .iter()
        .map(|item| processor.value(item))
        .collect::<Vec<_>>()
        .join(separator)
}

/// CSV output stays plain text: status glyphs picked up from string values
/// are dropped.
fn strip_glyphs(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '\u{2705}' | '\u{274c}' | '\u{1f6ab}' | '\u{26a0}' | '\u{fe0f}'))
        .collect::<String>()
        .trim()
        .to_string()
}
