//! Infrastructure layer for parsing, configuration and logging
//!
//! This module provides the extraction engine used by the cinema scrapers
//! together with the configuration loading and tracing setup around it.

pub mod parsing_error; // Error types of the extraction engine
pub mod parsing; // Extraction engine
pub mod config; // Layered scraper configuration
pub mod logging; // Logging infrastructure

// Re-export commonly used items
pub use config::{ConfigError, LoggingConfig, ScraperConfig};
pub use logging::{filter_directive, init_logging};
pub use parsing::{
    ContextualParser, DateParser, FieldSource, IterationCap, NormalizedDate, ParsingContext, ParsingError,
    ParsingResult, ScrapeWarning, TableBoundaries, TableMatrix, TableMatrixBuilder, TabVisitor, TabsParser,
    Templater, ValueGrabber,
};
