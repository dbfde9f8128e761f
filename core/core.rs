mod display;
pub mod error;
pub mod extract;
pub mod extractor;
pub mod filter;
pub mod introspect;
pub mod options;
mod render;
pub mod resolve;
pub mod scope;
pub mod table;
pub mod value;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{CompError, Result};
pub use extract::{Cell, ErrorKind, ErrorMarker, ExtractionKind, RawRow, RawTable};
pub use extractor::{Extractor, extract};
pub use filter::Filter;
pub use introspect::{
    ClassDescriptor, ClassId, ClassIntrospector, InvokeError, MethodFn, ModuleDescriptor,
    ModuleId, Registry,
};
pub use options::{CsvOptions, FooterStyle, MarkdownOptions, SummaryStyle, TableStyle};
pub use resolve::{ConstantBinding, MemberResolver, MemberSource, MethodBinding, SourceKind};
pub use scope::{MemberCollector, Scope, ScopeConfig};
pub use table::{DisplayTable, ExpansionFlags};
pub use value::Value;
