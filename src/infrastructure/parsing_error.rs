//! Parsing error types for the extraction engine
//!
//! Extraction misses (a selector matching nothing, a missing attribute, an
//! unresolved placeholder) are not errors and never show up here. This enum
//! only covers the failures that are surfaced to the caller: malformed
//! inputs and failures reported by caller-supplied iterators.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Unsupported date value at index {index}: {value}")]
    UnsupportedDateValue { index: usize, value: String },

    #[error("Empty date value at index {index}")]
    EmptyDateValue { index: usize },

    #[error("Tab button {index} failed: {source}")]
    TabButtonFailed {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Tab card '{tab_id}' failed: {source}")]
    TabCardFailed {
        tab_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String, field: String },
}

impl ParsingError {
    /// Create an invalid selector error
    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an unsupported date value error for the element at `index`
    pub fn unsupported_date_value(index: usize, value: impl ToString) -> Self {
        Self::UnsupportedDateValue {
            index,
            value: value.to_string(),
        }
    }

    /// Create a configuration error pointing at a config field
    pub fn configuration(field: &str, message: &str) -> Self {
        Self::ConfigurationError {
            message: message.to_string(),
            field: field.to_string(),
        }
    }

    /// Check if extraction of the surrounding record can continue
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidSelector { .. } => true,
            Self::UnsupportedDateValue { .. } => false,
            Self::EmptyDateValue { .. } => false,
            Self::TabButtonFailed { .. } => false,
            Self::TabCardFailed { .. } => false,
            Self::ConfigurationError { .. } => false,
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_offending_value() {
        let err = ParsingError::unsupported_date_value(3, "{\"a\":1}");
        assert_eq!(err.to_string(), "Unsupported date value at index 3: {\"a\":1}");

        let err = ParsingError::EmptyDateValue { index: 0 };
        assert!(err.to_string().contains("index 0"));
    }

    #[test]
    fn test_recoverability() {
        assert!(ParsingError::invalid_selector("a[", "unexpected end").is_recoverable());
        assert!(!ParsingError::configuration("cells.rowLimit", "must be positive").is_recoverable());

        let err = ParsingError::TabCardFailed {
            tab_id: "mon".to_string(),
            source: anyhow::anyhow!("boom"),
        };
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("'mon'"));
    }
}
