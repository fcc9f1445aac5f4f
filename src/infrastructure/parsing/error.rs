//! Error module re-export
//!
//! The parsing error types live next to the other infrastructure errors.

pub use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
