use crate::display::ValueProcessor;
use crate::extract::{Cell, ErrorKind, ErrorMarker, RawRow, RawTable};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Hash-cell display mode. Defaults show only the summarized main row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionFlags {
    pub expand_hashes: bool,
    pub hide_main_row: bool,
    pub hide_key_rows: bool,
}

impl Default for ExpansionFlags {
    fn default() -> Self {
        Self {
            expand_hashes: false,
            hide_main_row: false,
            hide_key_rows: true,
        }
    }
}

impl ExpansionFlags {
    pub fn only_main() -> Self {
        Self {
            expand_hashes: true,
            hide_main_row: false,
            hide_key_rows: true,
        }
    }

    pub fn only_keys() -> Self {
        Self {
            expand_hashes: true,
            hide_main_row: true,
            hide_key_rows: false,
        }
    }

    pub fn expanded_details() -> Self {
        Self {
            expand_hashes: true,
            hide_main_row: false,
            hide_key_rows: false,
        }
    }
}

/// Fully stringified table, ready for a renderer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DisplayTable {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }
}

/// Turns a raw table into display rows: plain stringification, per-key row
/// expansion, or per-key column flattening.
pub(crate) struct TableBuilder<'a> {
    table: &'a RawTable,
    processor: ValueProcessor,
    flags: ExpansionFlags,
}

impl<'a> TableBuilder<'a> {
    pub fn new(table: &'a RawTable, processor: ValueProcessor, flags: ExpansionFlags) -> Self {
        Self {
            table,
            processor,
            flags,
        }
    }

    pub fn build_simple(&self) -> DisplayTable {
        DisplayTable {
            headers: self.table.headers(),
            rows: self
                .table
                .rows
                .iter()
                .map(|row| self.simple_row(row))
                .collect(),
        }
    }

    /// Rows whose cells hold maps fan out into a main row plus one
    /// `behavior.key` row per distinct key, subject to the display flags.
    pub fn build_expanded(&self) -> DisplayTable {
        if !self.flags.expand_hashes {
            return self.build_simple();
        }

        let mut rows = Vec::new();
        for row in &self.table.rows {
            let keys = row_map_keys(row);
            if keys.is_empty() {
                rows.push(self.simple_row(row));
                continue;
            }
            if !self.flags.hide_main_row {
                rows.push(self.simple_row(row));
            }
            if !self.flags.hide_key_rows {
                for key in &keys {
                    rows.push(self.key_row(row, key));
                }
            }
        }

        DisplayTable {
            headers: self.table.headers(),
            rows,
        }
    }

    /// One column per `behavior.key.class` triple, appended after the base
    /// columns. Every row carries every flattened column so records stay
    /// rectangular; rows fill foreign behaviors' columns with the null
    /// substitute.
    pub fn build_flattened(&self) -> DisplayTable {
        if !self.flags.expand_hashes {
            return self.build_simple();
        }

        // Behavior -> union of its map keys, in row order.
        let mut keys_by_behavior: IndexMap<String, BTreeSet<String>> = IndexMap::new();
        for row in &self.table.rows {
            let keys = row_map_keys(row);
            if !keys.is_empty() {
                keys_by_behavior
                    .entry(row.behavior.clone())
                    .or_default()
                    .extend(keys);
            }
        }

        let mut headers = self.table.headers();
        for (behavior, keys) in &keys_by_behavior {
            for key in keys {
                for class in &self.table.classes {
                    headers.push(format!("{}.{}.{}", behavior, key, class));
                }
            }
        }

        let rows = self
            .table
            .rows
            .iter()
            .map(|row| {
                let mut cells = self.simple_row(row);
                for (behavior, keys) in &keys_by_behavior {
                    for key in keys {
                        for index in 0..self.table.classes.len() {
                            cells.push(if *behavior == row.behavior {
                                self.flattened_cell(&row.cells[index], key)
                            } else {
                                self.processor.null_value().to_string()
                            });
                        }
                    }
                }
                cells
            })
            .collect();

        DisplayTable { headers, rows }
    }

    fn simple_row(&self, row: &RawRow) -> Vec<String> {
        let mut cells = Vec::with_capacity(row.cells.len() + 2);
        if self.table.has_kind_column {
            cells.push(row.kind.clone().unwrap_or_default());
        }
        cells.push(row.behavior.clone());
        cells.extend(row.cells.iter().map(|cell| self.processor.cell(cell)));
        cells
    }

    fn key_row(&self, row: &RawRow, key: &str) -> Vec<String> {
        let mut cells = Vec::with_capacity(row.cells.len() + 2);
        if self.table.has_kind_column {
            cells.push(row.kind.clone().unwrap_or_default());
        }
        cells.push(format!("{}.{}", row.behavior, key));
        cells.extend(row.cells.iter().map(|cell| self.key_cell(cell, key)));
        cells
    }

    /// Cell for one `behavior.key` row. Absence of the key renders the
    /// missing-key dash, distinct from a real `false` stored under the key.
    fn key_cell(&self, cell: &Cell, key: &str) -> String {
        match cell {
            Cell::Value { value, .. } => match value.as_map() {
                Some(map) => match map.get(key) {
                    Some(entry) => self.processor.value(entry),
                    None => self.processor.missing_key(),
                },
                // Scalars have no sub-keys.
                None => self.processor.missing_key(),
            },
            // Missing-origin cells keep signalling "not defined" on every
            // key row; invocation errors have no key detail to offer.
            Cell::Error(marker) => match marker.kind {
                ErrorKind::MissingConstant | ErrorKind::MissingMethod => self
                    .processor
                    .error(&ErrorMarker::missing_constant()),
                ErrorKind::Invocation => self.processor.missing_key(),
            },
        }
    }

    fn flattened_cell(&self, cell: &Cell, key: &str) -> String {
        match cell.as_map().and_then(|map| map.get(key)) {
            Some(entry) => self.processor.value(entry),
            None => self.processor.null_value().to_string(),
        }
    }
}

fn row_map_keys(row: &RawRow) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    for cell in &row.cells {
        if let Some(map) = cell.as_map() {
            keys.extend(map.keys().cloned());
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::MISSING_KEY;
    use crate::value::Value;
    use serde_json::json;

    fn config_table() -> RawTable {
        RawTable {
            label_header: "Constant".to_string(),
            classes: vec!["ServiceA".to_string(), "ServiceB".to_string()],
            has_kind_column: false,
            rows: vec![
                RawRow {
                    kind: None,
                    behavior: "CONFIG".to_string(),
                    cells: vec![
                        Cell::value(Value::from(json!({"timeout": 30, "ssl": true}))),
                        Cell::value(Value::from(json!({"timeout": 60, "ssl": false}))),
                    ],
                },
                RawRow {
                    kind: None,
                    behavior: "NAME".to_string(),
                    cells: vec![
                        Cell::value(Value::from("a")),
                        Cell::value(Value::Null),
                    ],
                },
            ],
        }
    }

    fn builder(table: &RawTable, flags: ExpansionFlags) -> TableBuilder<'_> {
        TableBuilder::new(table, ValueProcessor::markdown(false), flags)
    }

    #[test]
    fn simple_build_keeps_one_row_per_behavior() {
        let table = config_table();
        let display = builder(&table, ExpansionFlags::default()).build_simple();
        assert_eq!(display.headers, ["Constant", "ServiceA", "ServiceB"]);
        assert_eq!(display.rows.len(), 2);
        assert_eq!(
            display.rows[0],
            ["CONFIG", "{timeout: 30, ssl: true}", "{timeout: 60, ssl: false}"]
        );
        assert_eq!(display.rows[1], ["NAME", "a", "\u{274c}"]);
    }

    #[test]
    fn default_expansion_shows_only_main_rows() {
        let table = config_table();
        let display = builder(&table, ExpansionFlags::only_main()).build_expanded();
        let names: Vec<&str> = display.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(names, ["CONFIG", "NAME"]);
    }

    #[test]
    fn expanded_details_fan_out_sorted_key_rows() {
        let table = config_table();
        let display = builder(&table, ExpansionFlags::expanded_details()).build_expanded();
        let names: Vec<&str> = display.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(names, ["CONFIG", "CONFIG.ssl", "CONFIG.timeout", "NAME"]);
        // ssl: true vs false render as glyphs on the key row.
        assert_eq!(display.rows[1][1], "\u{2705}");
        assert_eq!(display.rows[1][2], "\u{274c}");
    }

    #[test]
    fn missing_key_dash_is_distinct_from_false() {
        let mut table = config_table();
        // ServiceB's map lacks `ssl` entirely; a dash, not the false glyph.
        table.rows[0].cells[1] = Cell::value(Value::from(json!({"timeout": 60})));
        let display = builder(&table, ExpansionFlags::only_keys()).build_expanded();
        let ssl_row = display.rows.iter().find(|r| r[0] == "CONFIG.ssl").unwrap();
        assert_eq!(ssl_row[1], "\u{2705}");
        assert_eq!(ssl_row[2], MISSING_KEY);
    }

    #[test]
    fn error_cells_propagate_into_key_rows() {
        let mut table = config_table();
        table.rows[0].cells[1] = Cell::Error(ErrorMarker::missing_constant());
        let display = builder(&table, ExpansionFlags::only_keys()).build_expanded();
        let ssl_row = display.rows.iter().find(|r| r[0] == "CONFIG.ssl").unwrap();
        assert_eq!(ssl_row[2], "\u{1f6ab} Not defined");
    }

    #[test]
    fn missing_method_cells_also_read_not_defined_on_key_rows() {
        let mut table = config_table();
        table.rows[0].cells[1] = Cell::Error(ErrorMarker::missing_method());
        let display = builder(&table, ExpansionFlags::only_keys()).build_expanded();
        let ssl_row = display.rows.iter().find(|r| r[0] == "CONFIG.ssl").unwrap();
        // Not the "no method" wording the plain cell would carry.
        assert_eq!(ssl_row[2], "\u{1f6ab} Not defined");
    }

    #[test]
    fn invocation_error_cells_fall_back_to_the_dash_on_key_rows() {
        let mut table = config_table();
        table.rows[0].cells[1] = Cell::Error(ErrorMarker::invocation("boom"));
        let display = builder(&table, ExpansionFlags::only_keys()).build_expanded();
        let ssl_row = display.rows.iter().find(|r| r[0] == "CONFIG.ssl").unwrap();
        assert_eq!(ssl_row[2], MISSING_KEY);
    }

    #[test]
    fn kind_column_is_preserved_on_key_rows() {
        let mut table = config_table();
        table.has_kind_column = true;
        for row in &mut table.rows {
            row.kind = Some("Constant".to_string());
        }
        table.label_header = "Behavior".to_string();
        let display = builder(&table, ExpansionFlags::expanded_details()).build_expanded();
        let key_row = display.rows.iter().find(|r| r[1] == "CONFIG.ssl").unwrap();
        assert_eq!(key_row[0], "Constant");
    }

    #[test]
    fn flattened_records_stay_rectangular() {
        let table = config_table();
        let builder = TableBuilder::new(
            &table,
            ValueProcessor::csv("null", false),
            ExpansionFlags::only_main(),
        );
        let display = builder.build_flattened();
        assert_eq!(
            display.headers,
            [
                "Constant",
                "ServiceA",
                "ServiceB",
                "CONFIG.ssl.ServiceA",
                "CONFIG.ssl.ServiceB",
                "CONFIG.timeout.ServiceA",
                "CONFIG.timeout.ServiceB",
            ]
        );
        for row in &display.rows {
            assert_eq!(row.len(), display.headers.len());
        }
        // The NAME row has no map cells; its flattened columns hold nulls.
        let name_row = display.rows.iter().find(|r| r[0] == "NAME").unwrap();
        assert_eq!(&name_row[3..], ["null", "null", "null", "null"]);
        let config_row = display.rows.iter().find(|r| r[0] == "CONFIG").unwrap();
        assert_eq!(&config_row[3..], ["TRUE", "FALSE", "30", "60"]);
    }
}
