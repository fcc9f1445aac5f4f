//! Extraction engine for cinema program pages
//!
//! This module holds the building blocks a field-by-field scraper is made
//! of: the hierarchical parsing context, placeholder templating, declarative
//! value grabbing, table layout, date normalization and tab iteration.

pub mod config;
pub mod context;
pub mod date_format;
pub mod date_parser;
pub mod date_words;
pub mod dom;
pub mod error;
pub mod table_boundaries;
pub mod table_matrix;
pub mod tabs_parser;
pub mod templater;
pub mod value_grabber;

// Re-export public types
pub use config::{
    CellContent, DateConfig, FieldConfig, FieldSpec, IterationCap, MatrixOptions, OneOrMany, TableConfig,
    TabsConfig,
};
pub use context::{ContextValue, ParsingContext, ScrapeWarning};
pub use date_parser::{parse_date, DateInput, DateParser, NormalizedDate};
pub use error::{ParsingError, ParsingResult};
pub use table_boundaries::TableBoundaries;
pub use table_matrix::{CellRef, TableMatrix, TableMatrixBuilder};
pub use tabs_parser::{TabContexts, TabVisitor, TabsParser};
pub use templater::Templater;
pub use value_grabber::{FieldSource, Mapper, ValueGrabber};

use scraper::ElementRef;

/// Parser that extracts something from a document node in a context
pub trait ContextualParser {
    type Output;

    /// Parse `node` with contextual information
    fn parse_with_context(&self, node: ElementRef<'_>, context: &ParsingContext) -> ParsingResult<Self::Output>;
}
