//! Placeholder resolution against a parsing context
//!
//! Templates contain `:path:` or `:path(args):` tokens, e.g.
//! `"#day-:indexes.tab: .movie"` or `"/program?page=:page(1,5):"`. Each
//! token is looked up in the context; misses leave the token in place.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use tracing::debug;

use super::config::IterationCap;
use super::context::{ContextValue, ParsingContext};
use super::date_format::{locale, DateFormat};

static TOKEN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r":([A-Za-z_$][A-Za-z0-9_$.\[\]]*)(\([^():]*\))?:").ok());

/// Upper bound on the values a single page range expands to
pub const MAX_PAGES: usize = 1000;

static PAGE_RANGE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r":page\((?:\s*(\d+)\s*,\s*(\d+)\s*|\[([^\]]*)\])\):").ok());

/// Resolves placeholder tokens in strings and JSON values
#[derive(Debug, Default, Clone, Copy)]
pub struct Templater;

impl Templater {
    /// Resolve every token of `template`.
    ///
    /// All tokens are looked up against the original string, so a
    /// substituted value that itself looks like a token is never expanded.
    pub fn resolve(template: &str, context: &ParsingContext) -> String {
        let Some(token) = (*TOKEN).as_ref().filter(|_| template.contains(':')) else {
            return template.to_string();
        };
        token
            .replace_all(template, |caps: &Captures<'_>| {
                let path = &caps[1];
                match context.lookup(path).and_then(|value| render(value, context)) {
                    Some(rendered) => rendered,
                    None => {
                        debug!("Placeholder '{}' not found in context", path);
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }

    /// Resolve tokens in every string and object key of a JSON value
    pub fn resolve_value(template: &Value, context: &ParsingContext) -> Value {
        match template {
            Value::String(text) => Value::String(Self::resolve(text, context)),
            Value::Array(items) => Value::Array(items.iter().map(|item| Self::resolve_value(item, context)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (Self::resolve(key, context), Self::resolve_value(value, context)))
                    .collect::<Map<String, Value>>(),
            ),
            other => other.clone(),
        }
    }

    /// Page values described by the first `:page(A,B):` or
    /// `:page([v1,v2,...]):` token, or `None` when there is none.
    ///
    /// At most [`MAX_PAGES`] values are produced, fewer when `cap` is lower.
    pub fn parse_page_range(template: &str, cap: IterationCap) -> Option<Vec<String>> {
        let caps = (*PAGE_RANGE).as_ref()?.captures(template)?;
        let limit = cap.clamp(Some(MAX_PAGES)).unwrap_or(MAX_PAGES);

        let pages: Vec<String> = if let Some(list) = caps.get(3) {
            list.as_str().split(',').map(|v| v.trim().to_string()).take(limit).collect()
        } else {
            let from: u64 = caps.get(1)?.as_str().parse().ok()?;
            let to: u64 = caps.get(2)?.as_str().parse().ok()?;
            (from..=to).take(limit).map(|page| page.to_string()).collect()
        };

        if pages.len() == limit {
            debug!("Page range in '{}' limited to {} pages", template, limit);
        }
        Some(pages)
    }

    /// One resolved template per page value, with `page` set in a branched
    /// context so the page token itself resolves to the current page
    pub fn expand_pages(template: &str, context: &ParsingContext, cap: IterationCap) -> Option<Vec<String>> {
        let pages = Self::parse_page_range(template, cap)?;
        Some(
            pages
                .into_iter()
                .map(|page| {
                    let mut page_context = context.branch();
                    page_context.set_var("page", page);
                    Self::resolve(template, &page_context)
                })
                .collect(),
        )
    }
}

fn render(value: ContextValue, context: &ParsingContext) -> Option<String> {
    match value {
        ContextValue::Date(date) => {
            Some(DateFormat::compile(&context.date_format).format(&date, locale(&context.date_locale)))
        }
        ContextValue::Json(Value::Null) => None,
        ContextValue::Json(Value::String(text)) => Some(text),
        ContextValue::Json(other) => Some(other.to_string()),
    }
}
