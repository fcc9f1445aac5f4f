//! Parsing configuration fragments
//!
//! These are the declarative pieces of a scraper config that the extraction
//! engine consumes: field declarations, date settings, table layout and
//! tab structure. Field names follow the camelCase keys used in the JSON
//! config files.

use serde::{Deserialize, Serialize};

/// Operator-supplied cap on every list and table iteration.
///
/// `None` means unbounded. The cap is passed explicitly to the components
/// that iterate instead of living in process-wide state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationCap(pub Option<usize>);

impl IterationCap {
    pub const UNBOUNDED: Self = Self(None);

    pub fn new(limit: usize) -> Self {
        Self(Some(limit))
    }

    /// Smaller of the configured limit and the cap, whichever are set
    pub fn clamp(self, configured: Option<usize>) -> Option<usize> {
        match (configured, self.0) {
            (Some(limit), Some(cap)) => Some(limit.min(cap)),
            (Some(limit), None) => Some(limit),
            (None, cap) => cap,
        }
    }
}

/// Declarative field config as it appears in a config file.
///
/// `"h2.title"`, `"a @href"`, `"@data-id"` or `{ "selector": ..., "attribute": ... }`.
/// Absent fields are represented by `Option<FieldConfig>::None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldConfig {
    Shorthand(String),
    Spec(FieldSpec),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub attribute: Option<String>,
}

/// A value that may be written as a single item or a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(item) => std::slice::from_ref(item),
            Self::Many(items) => items,
        }
    }
}

/// Date parsing settings of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateConfig {
    /// moment-style format(s), tried in order
    #[serde(alias = "date_format")]
    pub date_format: OneOrMany<String>,

    /// Locale code such as `de` or `fr-CH`
    #[serde(default = "default_locale", alias = "date_locale")]
    pub date_locale: String,

    /// Keep the parsed year even when the format has no year token
    #[serde(default, alias = "preserve_year")]
    pub preserve_year: bool,
}

fn default_locale() -> String {
    "en".to_string()
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            date_format: OneOrMany::One("YYYY-MM-DD".to_string()),
            date_locale: default_locale(),
            preserve_year: false,
        }
    }
}

impl DateConfig {
    pub fn new(format: &str, locale: &str) -> Self {
        Self {
            date_format: OneOrMany::One(format.to_string()),
            date_locale: locale.to_string(),
            preserve_year: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderConfig {
    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellsConfig {
    #[serde(default)]
    pub row_limit: Option<usize>,
    #[serde(default)]
    pub column_limit: Option<usize>,
}

/// Table layout config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    #[serde(default)]
    pub header_row: Option<HeaderConfig>,
    #[serde(default)]
    pub header_column: Option<HeaderConfig>,
    #[serde(default)]
    pub cells: Option<CellsConfig>,
}

/// What a matrix cell holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellContent {
    /// Trimmed text content
    #[default]
    Text,
    /// Serialized inner markup
    Markup,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixOptions {
    #[serde(default)]
    pub duplicate_rowspan: bool,
    #[serde(default)]
    pub duplicate_colspan: bool,
    #[serde(default)]
    pub mode: CellContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabButtonsConfig {
    #[serde(rename = "box")]
    pub box_selector: String,
    #[serde(default)]
    pub id: Option<FieldConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabCardsConfig {
    #[serde(rename = "box")]
    pub box_selector: String,
}

/// Two-phase tab structure: buttons first, then one card container per tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabsConfig {
    pub buttons: TabButtonsConfig,
    #[serde(default)]
    pub cards: Option<TabCardsConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_iteration_cap_clamp() {
        assert_eq!(IterationCap::new(5).clamp(Some(10)), Some(5));
        assert_eq!(IterationCap::new(5).clamp(Some(3)), Some(3));
        assert_eq!(IterationCap::new(5).clamp(None), Some(5));
        assert_eq!(IterationCap::UNBOUNDED.clamp(Some(7)), Some(7));
        assert_eq!(IterationCap::UNBOUNDED.clamp(None), None);
    }

    #[test]
    fn test_field_config_shapes() {
        let short: FieldConfig = serde_json::from_value(json!("a.title @href")).unwrap();
        assert_eq!(short, FieldConfig::Shorthand("a.title @href".to_string()));

        let spec: FieldConfig = serde_json::from_value(json!({ "selector": "img", "attribute": "src" })).unwrap();
        assert_eq!(
            spec,
            FieldConfig::Spec(FieldSpec {
                selector: Some("img".to_string()),
                attribute: Some("src".to_string()),
            })
        );

        let absent: Option<FieldConfig> = serde_json::from_value(json!(null)).unwrap();
        assert!(absent.is_none());
    }

    #[test]
    fn test_date_config_accepts_format_lists() {
        let config: DateConfig = serde_json::from_value(json!({
            "dateFormat": ["DD.MM.YYYY", "DD.MM"],
            "dateLocale": "de",
        }))
        .unwrap();
        assert_eq!(config.date_format.as_slice().len(), 2);
        assert!(!config.preserve_year);
    }

    #[test]
    fn test_table_and_tabs_config() {
        let table: TableConfig = serde_json::from_value(json!({
            "headerRow": { "offset": 1 },
            "cells": { "rowLimit": 4 },
        }))
        .unwrap();
        assert_eq!(table.header_row.map(|h| h.offset), Some(1));
        assert_eq!(table.cells.and_then(|c| c.row_limit), Some(4));
        assert!(table.header_column.is_none());

        let tabs: TabsConfig = serde_json::from_value(json!({
            "buttons": { "box": "ul.days li", "id": "@data-day" },
            "cards": { "box": "#day-:tabId:" },
        }))
        .unwrap();
        assert_eq!(tabs.buttons.box_selector, "ul.days li");
        assert_eq!(tabs.cards.map(|c| c.box_selector).as_deref(), Some("#day-:tabId:"));

        let options: MatrixOptions = serde_json::from_value(json!({ "mode": "markup" })).unwrap();
        assert_eq!(options.mode, CellContent::Markup);
    }
}
