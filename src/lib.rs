//! Showtime Scraper - extraction engine for cinema program pages
//!
//! The crate turns loosely structured cinema websites into structured
//! showtime data. It provides a hierarchical parsing context, placeholder
//! templating, declarative value grabbing, table layout with row/column
//! spans, multilingual date normalization and sequential tab iteration.
//! Fetching pages and assembling final records is left to the caller.

pub mod infrastructure;

pub use infrastructure::*;
