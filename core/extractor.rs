use crate::error::{CompError, Result};
use crate::extract::{
    ExtractionKind, ExtractionSettings, MultiTypeExtractor, RawTable, extract_single_kind,
};
use crate::filter::Filter;
use crate::introspect::{ClassId, ClassIntrospector};
use crate::options::{CsvOptions, MarkdownOptions};
use crate::render::csv::CsvRenderer;
use crate::render::markdown::MarkdownRenderer;
use crate::scope::ScopeConfig;
use crate::table::ExpansionFlags;
use std::fmt;
use std::fs;
use std::path::Path;

/// Entry point: builds an [`Extractor`] over the given introspector for one
/// or more extraction kinds.
///
/// ```no_run
/// use classcomp_core::{ExtractionKind, Registry, extract};
///
/// # fn demo(registry: &Registry) -> classcomp_core::Result<()> {
/// let report = extract(registry, [ExtractionKind::Constants])
///     .from(&["ServiceA", "ServiceB"])?
///     .filter("TIMEOUT")
///     .handle_errors()
///     .to_markdown()?;
/// # let _ = report;
/// # Ok(())
/// # }
/// ```
pub fn extract<'a>(
    introspector: &'a dyn ClassIntrospector,
    kinds: impl IntoIterator<Item = ExtractionKind>,
) -> Extractor<'a> {
    Extractor {
        introspector,
        kinds: kinds.into_iter().collect(),
        settings: ExtractionSettings {
            classes: Vec::new(),
            filters: Vec::new(),
            handle_errors: false,
            scope: ScopeConfig::default(),
            show_source: false,
        },
        flags: ExpansionFlags::default(),
    }
}

/// Chainable comparison builder. Configuration methods consume and return
/// the builder; `to_markdown`/`to_csv` run the extraction and render.
pub struct Extractor<'a> {
    introspector: &'a dyn ClassIntrospector,
    kinds: Vec<ExtractionKind>,
    settings: ExtractionSettings,
    flags: ExpansionFlags,
}

impl fmt::Debug for Extractor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("kinds", &self.kinds)
            .field("classes", &self.settings.classes)
            .field("filters", &self.settings.filters)
            .field("scope", &self.settings.scope)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl<'a> Extractor<'a> {
    /// Sets the classes to compare, in column order. Names are resolved
    /// immediately so a typo fails here rather than at render time.
    pub fn from(mut self, names: &[&str]) -> Result<Self> {
        self.settings.classes = names
            .iter()
            .map(|name| {
                self.introspector
                    .resolve(name)
                    .ok_or_else(|| CompError::ClassNotFound((*name).to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self)
    }

    /// Sets the classes to compare from handles already in hand, bypassing
    /// name resolution.
    pub fn from_classes(mut self, classes: &[ClassId]) -> Self {
        self.settings.classes = classes.to_vec();
        self
    }

    /// Narrows the behavior list. Repeatable; filters apply in sequence.
    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.settings.filters.push(filter.into());
        self
    }

    /// Own members only, no inheritance or module traversal.
    pub fn strict(mut self) -> Self {
        self.settings.scope = self.settings.scope.strict();
        self
    }

    /// Adds private members to the discovery scope.
    pub fn with_private(mut self) -> Self {
        self.settings.scope = self.settings.scope.with_private();
        self
    }

    pub fn include_inherited(mut self) -> Self {
        self.settings.scope = self.settings.scope.comprehensive();
        self
    }

    pub fn include_modules(mut self) -> Self {
        self.settings.scope = self.settings.scope.comprehensive();
        self
    }

    /// Comprehensive traversal plus private members.
    pub fn include_all(mut self) -> Self {
        self.settings.scope = self.settings.scope.comprehensive().with_private();
        self
    }

    /// Annotates each cell with where its member was found.
    pub fn show_source(mut self) -> Self {
        self.settings.show_source = true;
        self
    }

    /// Classifies per-cell failures instead of aborting on the first one.
    pub fn handle_errors(mut self) -> Self {
        self.settings.handle_errors = true;
        self
    }

    /// Enables hash expansion with the default main-row-only display.
    pub fn expand_hashes(mut self) -> Self {
        self.flags.expand_hashes = true;
        self
    }

    pub fn show_only_main(mut self) -> Self {
        self.flags = ExpansionFlags::only_main();
        self
    }

    pub fn show_only_keys(mut self) -> Self {
        self.flags = ExpansionFlags::only_keys();
        self
    }

    /// Main rows plus one `behavior.key` row per hash key.
    pub fn show_expanded_details(mut self) -> Self {
        self.flags = ExpansionFlags::expanded_details();
        self
    }

    pub fn hide_main_row(mut self, hide: bool) -> Self {
        self.flags.hide_main_row = hide;
        self
    }

    pub fn hide_key_rows(mut self, hide: bool) -> Self {
        self.flags.hide_key_rows = hide;
        self
    }

    /// Runs the extraction and returns the raw table. A single kind yields
    /// no Type column; multiple kinds are merged under one.
    pub fn extract_table(&self) -> Result<RawTable> {
        log::debug!(
            "Extracting {:?} across {} class(es)",
            self.kinds,
            self.settings.classes.len()
        );
        match self.kinds.as_slice() {
            [] => Ok(RawTable::default()),
            [kind] => extract_single_kind(self.introspector, &self.settings, kind),
            kinds => MultiTypeExtractor {
                introspector: self.introspector,
                settings: &self.settings,
                kinds,
            }
            .extract(),
        }
    }

    pub fn to_markdown(&self) -> Result<String> {
        self.to_markdown_with(&MarkdownOptions::default())
    }

    pub fn to_markdown_with(&self, options: &MarkdownOptions) -> Result<String> {
        let table = self.extract_table()?;
        Ok(MarkdownRenderer::new(
            &table,
            &self.kinds,
            options,
            self.flags,
            self.settings.show_source,
        )
        .render())
    }

    /// Renders and also persists the report to `path`.
    pub fn to_markdown_file(
        &self,
        path: impl AsRef<Path>,
        options: &MarkdownOptions,
    ) -> Result<String> {
        let output = self.to_markdown_with(options)?;
        write_report(path.as_ref(), &output)?;
        Ok(output)
    }

    pub fn to_csv(&self) -> Result<String> {
        self.to_csv_with(&CsvOptions::default())
    }

    pub fn to_csv_with(&self, options: &CsvOptions) -> Result<String> {
        let table = self.extract_table()?;
        CsvRenderer::new(
            &table,
            &self.kinds,
            options,
            self.flags,
            self.settings.show_source,
        )
        .render()
    }

    pub fn to_csv_file(&self, path: impl AsRef<Path>, options: &CsvOptions) -> Result<String> {
        let output = self.to_csv_with(options)?;
        write_report(path.as_ref(), &output)?;
        Ok(output)
    }
}

fn write_report(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| CompError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Report saved to {}", path.display());
    Ok(())
}
