use crate::error::{CompError, Result};
use crate::filter::{Filter, apply_filters};
use crate::introspect::{ClassId, ClassIntrospector};
use crate::resolve::{MemberResolver, MemberSource};
use crate::scope::{MemberCollector, ScopeConfig};
use crate::value::Value;
use std::collections::BTreeSet;
use std::str::FromStr;

/// What gets compared across classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionKind {
    Constants,
    ClassMethods,
    /// Unrecognized kinds are tolerated in multi-kind runs: they contribute
    /// a titleized label and no rows.
    Other(String),
}

impl ExtractionKind {
    /// Row label in the `Type` column.
    pub fn label(&self) -> String {
        match self {
            ExtractionKind::Constants => "Constant".to_string(),
            ExtractionKind::ClassMethods => "Class Method".to_string(),
            ExtractionKind::Other(s) => titleize(s),
        }
    }

    /// Plural heading used in report titles and legends.
    pub fn heading(&self) -> String {
        match self {
            ExtractionKind::Constants => "Constants".to_string(),
            ExtractionKind::ClassMethods => "Class Methods".to_string(),
            ExtractionKind::Other(s) => titleize(s),
        }
    }

    pub fn legend(&self) -> String {
        match self {
            ExtractionKind::Constants => {
                "- **Constants**: Class constants and their values".to_string()
            }
            ExtractionKind::ClassMethods => {
                "- **Class Methods**: Class method results and return values".to_string()
            }
            ExtractionKind::Other(s) => format!("- **{}**", titleize(s)),
        }
    }
}

impl FromStr for ExtractionKind {
    type Err = CompError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "constants" => Ok(ExtractionKind::Constants),
            "class_methods" => Ok(ExtractionKind::ClassMethods),
            other => Err(CompError::UnknownKind(other.to_string())),
        }
    }
}

/// `module_methods` -> `Module Methods`.
pub(crate) fn titleize(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Why a cell has no usable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    MissingConstant,
    MissingMethod,
    Invocation,
}

/// Tagged error sentinel. Cells are either values or markers; renderers
/// pattern-match the tag, the glyph strings only exist at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMarker {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorMarker {
    pub fn missing_constant() -> Self {
        Self {
            kind: ErrorKind::MissingConstant,
            message: String::new(),
        }
    }

    pub fn missing_method() -> Self {
        Self {
            kind: ErrorKind::MissingMethod,
            message: String::new(),
        }
    }

    pub fn invocation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Invocation,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Value {
        value: Value,
        source: Option<MemberSource>,
    },
    Error(ErrorMarker),
}

impl Cell {
    pub fn value(value: Value) -> Self {
        Cell::Value {
            value,
            source: None,
        }
    }

    pub fn sourced(value: Value, source: MemberSource) -> Self {
        Cell::Value {
            value,
            source: Some(source),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Cell::Value { value, .. } => Some(value),
            Cell::Error(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&indexmap::IndexMap<String, Value>> {
        self.as_value().and_then(Value::as_map)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Cell::Error(_))
    }
}

/// One comparison row: a behavior name and one cell per class, optionally
/// prefixed with the extraction kind label in multi-kind runs.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub kind: Option<String>,
    pub behavior: String,
    pub cells: Vec<Cell>,
}

/// Raw comparison table: unprocessed cells, class columns in caller order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub label_header: String,
    pub classes: Vec<String>,
    pub has_kind_column: bool,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() || self.rows.is_empty()
    }

    pub fn headers(&self) -> Vec<String> {
        let mut headers = Vec::with_capacity(self.classes.len() + 2);
        if self.has_kind_column {
            headers.push("Type".to_string());
        }
        headers.push(self.label_header.clone());
        headers.extend(self.classes.iter().cloned());
        headers
    }
}

/// Shared extraction settings, owned by the public builder.
#[derive(Debug, Clone)]
pub(crate) struct ExtractionSettings {
    pub classes: Vec<ClassId>,
    pub filters: Vec<Filter>,
    pub handle_errors: bool,
    pub scope: ScopeConfig,
    pub show_source: bool,
}

impl ExtractionSettings {
    fn label_header(&self, base: &str) -> String {
        if self.show_source {
            format!("{} (Source)", base)
        } else {
            base.to_string()
        }
    }

    fn member_names(
        &self,
        introspector: &dyn ClassIntrospector,
        collect: impl Fn(&MemberCollector<'_>, ClassId) -> BTreeSet<String>,
    ) -> Vec<String> {
        let collector = MemberCollector::new(introspector, self.scope);
        let mut names = BTreeSet::new();
        for &class in &self.classes {
            names.extend(collect(&collector, class));
        }
        apply_filters(names.into_iter().collect(), &self.filters)
    }
}

pub(crate) struct ConstantsExtractor<'a> {
    pub introspector: &'a dyn ClassIntrospector,
    pub settings: &'a ExtractionSettings,
}

impl ConstantsExtractor<'_> {
    pub fn extract(&self) -> Result<RawTable> {
        let settings = self.settings;
        if settings.classes.is_empty() {
            return Ok(RawTable::default());
        }

        let names = settings.member_names(self.introspector, |c, class| c.constant_names(class));
        log::debug!("Extracting {} constant(s)", names.len());

        let resolver = MemberResolver::new(self.introspector, settings.scope);
        let mut rows = Vec::with_capacity(names.len());
        for name in names {
            let mut cells = Vec::with_capacity(settings.classes.len());
            for &class in &settings.classes {
                let cell = match resolver.resolve_constant(class, &name) {
                    Some(binding) => Cell::sourced(binding.value, binding.source),
                    // Union across siblings: a name can be absent here. With
                    // error handling off the cell degrades to a null value.
                    None if settings.handle_errors => Cell::Error(ErrorMarker::missing_constant()),
                    None => Cell::value(Value::Null),
                };
                cells.push(cell);
            }
            rows.push(RawRow {
                kind: None,
                behavior: name,
                cells,
            });
        }

        Ok(RawTable {
            label_header: settings.label_header("Constant"),
            classes: class_names(self.introspector, &settings.classes),
            has_kind_column: false,
            rows,
        })
    }
}

pub(crate) struct MethodsExtractor<'a> {
    pub introspector: &'a dyn ClassIntrospector,
    pub settings: &'a ExtractionSettings,
}

impl MethodsExtractor<'_> {
    pub fn extract(&self) -> Result<RawTable> {
        let settings = self.settings;
        if settings.classes.is_empty() {
            return Ok(RawTable::default());
        }

        let names = settings.member_names(self.introspector, |c, class| c.method_names(class));
        log::debug!("Extracting {} class method(s)", names.len());

        let resolver = MemberResolver::new(self.introspector, settings.scope);
        let mut rows = Vec::with_capacity(names.len());
        for name in names {
            let mut cells = Vec::with_capacity(settings.classes.len());
            for &class in &settings.classes {
                cells.push(self.call_method(&resolver, class, &name)?);
            }
            rows.push(RawRow {
                kind: None,
                behavior: name,
                cells,
            });
        }

        Ok(RawTable {
            label_header: settings.label_header("Method"),
            classes: class_names(self.introspector, &settings.classes),
            has_kind_column: false,
            rows,
        })
    }

    /// The single point where user code runs. With error handling on,
    /// failures are classified per cell; off, the first failure aborts the
    /// whole extraction.
    fn call_method(
        &self,
        resolver: &MemberResolver<'_>,
        class: ClassId,
        name: &str,
    ) -> Result<Cell> {
        let settings = self.settings;
        let Some(binding) = resolver.resolve_method(class, name) else {
            return Ok(if settings.handle_errors {
                Cell::Error(ErrorMarker::missing_method())
            } else {
                Cell::value(Value::Null)
            });
        };

        match self.introspector.invoke(binding.target, name) {
            Ok(value) => Ok(Cell::sourced(value, binding.source)),
            Err(err) if settings.handle_errors => {
                log::debug!(
                    "Invocation of {}.{} failed: {}",
                    self.introspector.class_name(class),
                    name,
                    err.message
                );
                Ok(Cell::Error(ErrorMarker::invocation(err.message)))
            }
            Err(err) => Err(CompError::Invocation {
                class: self.introspector.class_name(class),
                method: name.to_string(),
                message: err.message,
            }),
        }
    }
}

/// Runs one extractor per kind and merges the results under a `Type`
/// column. Kinds are never interleaved: all rows of the first kind come
/// before any row of the second.
pub(crate) struct MultiTypeExtractor<'a> {
    pub introspector: &'a dyn ClassIntrospector,
    pub settings: &'a ExtractionSettings,
    pub kinds: &'a [ExtractionKind],
}

impl MultiTypeExtractor<'_> {
    pub fn extract(&self) -> Result<RawTable> {
        if self.settings.classes.is_empty() || self.kinds.is_empty() {
            return Ok(RawTable::default());
        }

        let mut rows = Vec::new();
        for kind in self.kinds {
            let table = extract_single_kind(self.introspector, self.settings, kind)?;
            let label = kind.label();
            rows.extend(table.rows.into_iter().map(|row| RawRow {
                kind: Some(label.clone()),
                ..row
            }));
        }

        Ok(RawTable {
            label_header: self.settings.label_header("Behavior"),
            classes: class_names(self.introspector, &self.settings.classes),
            has_kind_column: true,
            rows,
        })
    }
}

pub(crate) fn extract_single_kind(
    introspector: &dyn ClassIntrospector,
    settings: &ExtractionSettings,
    kind: &ExtractionKind,
) -> Result<RawTable> {
    match kind {
        ExtractionKind::Constants => ConstantsExtractor {
            introspector,
            settings,
        }
        .extract(),
        ExtractionKind::ClassMethods => MethodsExtractor {
            introspector,
            settings,
        }
        .extract(),
        ExtractionKind::Other(name) => {
            log::warn!("Skipping unrecognized extraction kind '{}'", name);
            Ok(RawTable::default())
        }
    }
}

fn class_names(introspector: &dyn ClassIntrospector, classes: &[ClassId]) -> Vec<String> {
    classes
        .iter()
        .map(|&class| introspector.class_name(class))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::service_registry;

    fn settings(registry: &crate::introspect::Registry, classes: &[&str]) -> ExtractionSettings {
        ExtractionSettings {
            classes: classes
                .iter()
                .map(|name| registry.resolve(name).unwrap())
                .collect(),
            filters: Vec::new(),
            handle_errors: false,
            scope: ScopeConfig::default().strict(),
            show_source: false,
        }
    }

    #[test]
    fn rows_are_the_sorted_union_of_applicable_names() {
        let registry = service_registry();
        let settings = settings(&registry, &["ServiceA", "ServiceB"]);
        let extractor = ConstantsExtractor {
            introspector: &registry,
            settings: &settings,
        };

        let table = extractor.extract().unwrap();
        let names: Vec<&str> = table.rows.iter().map(|r| r.behavior.as_str()).collect();
        // Sorted union, no duplicates; CONFIG is on both classes but appears once.
        assert_eq!(names, ["CONFIG", "NAME", "RETRIES"]);
        assert_eq!(table.headers(), ["Constant", "ServiceA", "ServiceB"]);
        for row in &table.rows {
            assert_eq!(row.cells.len(), table.classes.len());
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let registry = service_registry();
        let settings = settings(&registry, &["ServiceB", "ServiceA"]);
        let extractor = ConstantsExtractor {
            introspector: &registry,
            settings: &settings,
        };
        let first = extractor.extract().unwrap();
        let second = extractor.extract().unwrap();
        assert_eq!(first, second);
        // Class list order defines column order.
        assert_eq!(first.classes, ["ServiceB", "ServiceA"]);
    }

    #[test]
    fn sibling_gap_yields_null_without_error_handling() {
        let registry = service_registry();
        let settings = settings(&registry, &["ServiceA", "ServiceB"]);
        let extractor = ConstantsExtractor {
            introspector: &registry,
            settings: &settings,
        };
        let table = extractor.extract().unwrap();
        // RETRIES exists only on ServiceB.
        let row = table.rows.iter().find(|r| r.behavior == "RETRIES").unwrap();
        assert_eq!(row.cells[0], Cell::value(Value::Null));
        assert!(row.cells[1].as_value().is_some());
    }

    #[test]
    fn sibling_gap_yields_marker_with_error_handling() {
        let registry = service_registry();
        let mut settings = settings(&registry, &["ServiceA", "ServiceB"]);
        settings.handle_errors = true;
        let extractor = ConstantsExtractor {
            introspector: &registry,
            settings: &settings,
        };
        let table = extractor.extract().unwrap();
        let row = table.rows.iter().find(|r| r.behavior == "RETRIES").unwrap();
        assert_eq!(row.cells[0], Cell::Error(ErrorMarker::missing_constant()));
    }

    #[test]
    fn raising_method_aborts_extraction_without_error_handling() {
        let registry = service_registry();
        let mut settings = settings(&registry, &["ServiceA", "ServiceB"]);
        settings.filters = vec![Filter::from("failing")];
        let extractor = MethodsExtractor {
            introspector: &registry,
            settings: &settings,
        };
        let err = extractor.extract().unwrap_err();
        assert!(matches!(err, CompError::Invocation { .. }));
    }

    #[test]
    fn error_handling_isolates_the_bad_cell() {
        let registry = service_registry();
        let mut settings = settings(&registry, &["ServiceA", "ServiceB"]);
        settings.filters = vec![Filter::from("failing")];
        settings.handle_errors = true;
        let extractor = MethodsExtractor {
            introspector: &registry,
            settings: &settings,
        };
        let table = extractor.extract().unwrap();
        assert_eq!(table.rows.len(), 1);
        let row = &table.rows[0];
        // ServiceA does not define `failing` at all; ServiceB's raises.
        assert_eq!(row.cells[0], Cell::Error(ErrorMarker::missing_method()));
        match &row.cells[1] {
            Cell::Error(marker) => {
                assert_eq!(marker.kind, ErrorKind::Invocation);
                assert!(marker.message.contains("boom"));
            }
            other => panic!("expected invocation marker, got {:?}", other),
        }
    }

    #[test]
    fn multi_kind_merge_keeps_kinds_contiguous() {
        let registry = service_registry();
        let mut settings = settings(&registry, &["ServiceA", "ServiceB"]);
        settings.filters = vec![Filter::from(regex::Regex::new("^(NAME|status)$").unwrap())];
        let kinds = [ExtractionKind::Constants, ExtractionKind::ClassMethods];
        let extractor = MultiTypeExtractor {
            introspector: &registry,
            settings: &settings,
            kinds: &kinds,
        };
        let table = extractor.extract().unwrap();
        assert_eq!(
            table.headers(),
            ["Type", "Behavior", "ServiceA", "ServiceB"]
        );
        let labels: Vec<(&str, &str)> = table
            .rows
            .iter()
            .map(|r| (r.kind.as_deref().unwrap(), r.behavior.as_str()))
            .collect();
        assert_eq!(
            labels,
            [("Constant", "NAME"), ("Class Method", "status")]
        );
    }

    #[test]
    fn unknown_kind_labels_titleize() {
        assert_eq!(
            ExtractionKind::Other("module_methods".to_string()).label(),
            "Module Methods"
        );
        assert!(matches!(
            "instance_methods".parse::<ExtractionKind>(),
            Err(CompError::UnknownKind(_))
        ));
        assert_eq!(
            "class_methods".parse::<ExtractionKind>().unwrap(),
            ExtractionKind::ClassMethods
        );
    }

    #[test]
    fn show_source_suffixes_the_label_header() {
        let registry = service_registry();
        let mut settings = settings(&registry, &["ServiceA"]);
        settings.show_source = true;
        let extractor = ConstantsExtractor {
            introspector: &registry,
            settings: &settings,
        };
        let table = extractor.extract().unwrap();
        assert_eq!(table.label_header, "Constant (Source)");
    }
}
