//! Declarative value extraction from a document node
//!
//! A field is declared as a selector plus an optional attribute and mapper.
//! The declaration is compiled once into a [`ValueGrabber`], which can then
//! be run against any number of nodes:
//!
//! ```text
//! "h2.title"               text of every h2.title below the node
//! "a.detail @href"         href attribute of every a.detail
//! "@data-id"               data-id attribute of the node itself
//! ".times li, .extra li"   both lists, in selector order
//! "#day-:indexes.tab: p"   selector resolved against the context first
//! ```

use std::fmt;
use std::sync::Arc;

use scraper::ElementRef;
use serde_json::Value;
use tracing::debug;

use super::config::{FieldConfig, FieldSpec};
use super::context::ParsingContext;
use super::dom::{compile_selector, inner_markup, own_text, text_content};
use super::templater::Templater;
use super::{ContextualParser, ParsingResult};

/// Selector token meaning "the node itself"
pub const SELF_SELECTOR: &str = "_self";
/// Attribute token selecting the serialized inner markup
pub const INNER_HTML_ATTRIBUTE: &str = "_html";
/// Attribute token selecting direct text-node children only
pub const OWN_TEXT_ATTRIBUTE: &str = "_ownText";

/// Transforms a raw extracted string into the final field value
pub type Mapper = Arc<dyn Fn(&str, &ParsingContext) -> Value + Send + Sync>;

/// Fully custom extraction
pub type CustomGrab = Arc<dyn Fn(ElementRef<'_>, &ParsingContext) -> Value + Send + Sync>;

/// The shapes a field declaration can take
#[derive(Clone)]
pub enum FieldSource {
    /// Nothing declared; grabs yield `null`
    Empty,
    Custom(CustomGrab),
    /// `"<selector> @<attribute>"`, `"<selector>"` or `"@<attribute>"`
    Shorthand(String),
    Spec {
        selector: Option<String>,
        attribute: Option<String>,
        mapper: Option<Mapper>,
    },
}

impl FieldSource {
    pub fn custom<F>(grab: F) -> Self
    where
        F: Fn(ElementRef<'_>, &ParsingContext) -> Value + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(grab))
    }
}

/// Wrap a closure as a [`Mapper`]
pub fn mapper<F>(map: F) -> Mapper
where
    F: Fn(&str, &ParsingContext) -> Value + Send + Sync + 'static,
{
    Arc::new(map)
}

impl fmt::Debug for FieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Custom(_) => f.write_str("Custom(..)"),
            Self::Shorthand(shorthand) => f.debug_tuple("Shorthand").field(shorthand).finish(),
            Self::Spec { selector, attribute, mapper } => f
                .debug_struct("Spec")
                .field("selector", selector)
                .field("attribute", attribute)
                .field("mapper", &mapper.as_ref().map(|_| ".."))
                .finish(),
        }
    }
}

impl From<FieldConfig> for FieldSource {
    fn from(config: FieldConfig) -> Self {
        match config {
            FieldConfig::Shorthand(shorthand) => Self::Shorthand(shorthand),
            FieldConfig::Spec(FieldSpec { selector, attribute }) => Self::Spec {
                selector,
                attribute,
                mapper: None,
            },
        }
    }
}

/// Split a shorthand into its selector and attribute parts.
///
/// The attribute is introduced by an `@` at the start of the string or
/// after whitespace, so `a[href^="mailto:x@y"]` stays a plain selector.
pub fn parse_shorthand(shorthand: &str) -> FieldSpec {
    let shorthand = shorthand.trim();
    let marker = shorthand
        .char_indices()
        .filter(|(i, c)| *c == '@' && (*i == 0 || shorthand[..*i].ends_with(char::is_whitespace)))
        .map(|(i, _)| i)
        .last();

    let (selector, attribute) = match marker {
        Some(at) => (shorthand[..at].trim(), Some(shorthand[at + 1..].trim())),
        None => (shorthand, None),
    };

    FieldSpec {
        selector: Some(selector).filter(|s| !s.is_empty()).map(str::to_string),
        attribute: attribute.filter(|a| !a.is_empty()).map(str::to_string),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttributeTarget {
    Text,
    InnerHtml,
    OwnText,
    Named(String),
}

impl AttributeTarget {
    fn compile(attribute: Option<&str>) -> Self {
        match attribute {
            None => Self::Text,
            Some(INNER_HTML_ATTRIBUTE) => Self::InnerHtml,
            Some(OWN_TEXT_ATTRIBUTE) => Self::OwnText,
            Some(name) => Self::Named(name.to_string()),
        }
    }

    fn extract(&self, element: ElementRef<'_>) -> Option<String> {
        match self {
            Self::Text => Some(text_content(element)),
            Self::InnerHtml => Some(inner_markup(element)),
            Self::OwnText => Some(own_text(element)),
            Self::Named(name) => element.value().attr(name).map(str::to_string),
        }
    }
}

struct SelectDirective {
    /// Comma-separated parts, placeholders unresolved; empty means the node itself
    selectors: Vec<String>,
    attribute: AttributeTarget,
    mapper: Option<Mapper>,
}

enum Directive {
    Empty,
    Custom(CustomGrab),
    Select(SelectDirective),
}

/// Compiled field declaration
pub struct ValueGrabber {
    directive: Directive,
}

impl fmt::Debug for ValueGrabber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.directive {
            Directive::Empty => f.write_str("ValueGrabber(empty)"),
            Directive::Custom(_) => f.write_str("ValueGrabber(custom)"),
            Directive::Select(select) => f
                .debug_struct("ValueGrabber")
                .field("selectors", &select.selectors)
                .field("attribute", &select.attribute)
                .field("mapped", &select.mapper.is_some())
                .finish(),
        }
    }
}

impl ValueGrabber {
    pub fn new(source: FieldSource) -> Self {
        let directive = match source {
            FieldSource::Empty => Directive::Empty,
            FieldSource::Custom(grab) => Directive::Custom(grab),
            FieldSource::Shorthand(shorthand) => {
                let FieldSpec { selector, attribute } = parse_shorthand(&shorthand);
                Directive::Select(SelectDirective::compile(selector.as_deref(), attribute.as_deref(), None))
            }
            FieldSource::Spec { selector, attribute, mapper } => {
                Directive::Select(SelectDirective::compile(selector.as_deref(), attribute.as_deref(), mapper))
            }
        };
        Self { directive }
    }

    pub fn from_config(config: Option<&FieldConfig>) -> Self {
        match config {
            Some(config) => Self::new(config.clone().into()),
            None => Self::new(FieldSource::Empty),
        }
    }

    /// Selector parts after compilation, placeholders still unresolved
    pub fn selectors(&self) -> &[String] {
        match &self.directive {
            Directive::Select(select) => &select.selectors,
            _ => &[],
        }
    }

    /// Attribute name after compilation; `None` means text content
    pub fn attribute(&self) -> Option<&str> {
        match &self.directive {
            Directive::Select(select) => match &select.attribute {
                AttributeTarget::Text => None,
                AttributeTarget::InnerHtml => Some(INNER_HTML_ATTRIBUTE),
                AttributeTarget::OwnText => Some(OWN_TEXT_ATTRIBUTE),
                AttributeTarget::Named(name) => Some(name),
            },
            _ => None,
        }
    }

    /// One value per matched element, in selector then document order
    pub fn grab_all(&self, node: ElementRef<'_>, context: &ParsingContext) -> Vec<Value> {
        match &self.directive {
            Directive::Empty => vec![Value::Null],
            Directive::Custom(grab) => match grab(node, context) {
                Value::Array(items) => items.into_iter().map(normalize).collect(),
                value => vec![normalize(value)],
            },
            Directive::Select(select) => select.grab_all(node, context),
        }
    }

    /// `null` for no match, the value for one match, an array otherwise
    pub fn grab(&self, node: ElementRef<'_>, context: &ParsingContext) -> Value {
        let mut values = self.grab_all(node, context);
        match values.len() {
            0 => Value::Null,
            1 => values.pop().unwrap_or(Value::Null),
            _ => Value::Array(values),
        }
    }

    pub fn grab_first(&self, node: ElementRef<'_>, context: &ParsingContext) -> Value {
        self.grab_all(node, context).into_iter().next().unwrap_or(Value::Null)
    }
}

impl From<FieldSource> for ValueGrabber {
    fn from(source: FieldSource) -> Self {
        Self::new(source)
    }
}

impl ContextualParser for ValueGrabber {
    type Output = Value;

    fn parse_with_context(&self, node: ElementRef<'_>, context: &ParsingContext) -> ParsingResult<Value> {
        Ok(self.grab(node, context))
    }
}

impl SelectDirective {
    fn compile(selector: Option<&str>, attribute: Option<&str>, mapper: Option<Mapper>) -> Self {
        let selectors = selector
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            selectors,
            attribute: AttributeTarget::compile(attribute),
            mapper,
        }
    }

    fn value_boxes<'a>(&self, node: ElementRef<'a>, context: &ParsingContext) -> Vec<ElementRef<'a>> {
        if self.selectors.is_empty() {
            return vec![node];
        }

        let mut boxes = Vec::new();
        for selector in &self.selectors {
            let resolved = Templater::resolve(selector, context);
            if resolved == SELF_SELECTOR {
                boxes.push(node);
                continue;
            }
            let Some(compiled) = compile_selector(&resolved, context) else {
                continue;
            };
            let before = boxes.len();
            boxes.extend(node.select(&compiled));
            if boxes.len() == before {
                debug!("Selector '{}' matched nothing", resolved);
            }
        }
        boxes
    }

    fn grab_all(&self, node: ElementRef<'_>, context: &ParsingContext) -> Vec<Value> {
        self.value_boxes(node, context)
            .into_iter()
            .map(|element| match self.attribute.extract(element) {
                Some(raw) => normalize(match &self.mapper {
                    Some(mapper) => mapper(&raw, context),
                    None => Value::String(raw.trim().to_string()),
                }),
                None => Value::Null,
            })
            .collect()
    }
}

/// Collapse whitespace runs in strings and turn empty strings into `null`
fn normalize(value: Value) -> Value {
    match value {
        Value::String(text) => {
            let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if collapsed.is_empty() {
                Value::Null
            } else {
                Value::String(collapsed)
            }
        }
        other => other,
    }
}
