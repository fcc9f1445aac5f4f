//! Parsing context carried through every extraction step
//!
//! A context is created once per crawl and branched once per iteration
//! step (cinema, date, movie, tab, table cell, ...). Branching deep-copies
//! the mutable state so sibling branches never see each other's changes,
//! while warnings flow upward to every ancestor through a shared scope chain.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// A warning recorded during extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeWarning {
    pub code: String,
    pub message: String,
    /// Call stack at the time the warning was raised, joined with ` > `
    pub location: String,
}

/// Warning list of one context plus the link to its parent's list
#[derive(Debug, Default)]
struct WarningScope {
    parent: Option<Arc<WarningScope>>,
    warnings: Mutex<Vec<ScrapeWarning>>,
}

impl WarningScope {
    fn child_of(parent: &Arc<Self>) -> Self {
        Self {
            parent: Some(Arc::clone(parent)),
            warnings: Mutex::new(Vec::new()),
        }
    }

    /// First warning per code wins, at every level of the chain
    fn record(&self, warning: &ScrapeWarning) {
        let mut scope = Some(self);
        while let Some(current) = scope {
            {
                let mut warnings = current.warnings.lock().unwrap_or_else(PoisonError::into_inner);
                if !warnings.iter().any(|w| w.code == warning.code) {
                    warnings.push(warning.clone());
                }
            }
            scope = current.parent.as_deref();
        }
    }

    fn snapshot(&self) -> Vec<ScrapeWarning> {
        self.warnings.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Result of a context path lookup
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Json(Value),
    Date(NaiveDateTime),
}

/// Hierarchical extraction state
#[derive(Debug)]
pub struct ParsingContext {
    scope: Arc<WarningScope>,

    /// Current index per iteration dimension (`tab`, `row`, `col`, ...)
    pub indexes: BTreeMap<String, usize>,

    /// Date currently being parsed
    pub date: Option<NaiveDateTime>,

    /// Movie record currently being built
    pub movie: Option<Value>,

    vars: Map<String, Value>,
    call_stack: Vec<String>,

    /// moment-style format used when a date is rendered into a template
    pub date_format: String,
    pub date_locale: String,
}

impl Default for ParsingContext {
    fn default() -> Self {
        Self::root()
    }
}

impl ParsingContext {
    /// Create the crawl-level context
    pub fn root() -> Self {
        Self {
            scope: Arc::new(WarningScope::default()),
            indexes: BTreeMap::new(),
            date: None,
            movie: None,
            vars: Map::new(),
            call_stack: Vec::new(),
            date_format: "YYYY-MM-DD".to_string(),
            date_locale: "en".to_string(),
        }
    }

    /// Set the date rendering format and locale
    pub fn with_date_format(mut self, format: &str, locale: &str) -> Self {
        self.date_format = format.to_string();
        self.date_locale = locale.to_string();
        self
    }

    /// Branch a child context for one iteration step.
    ///
    /// The source is left untouched; the child's warnings are forwarded to
    /// the source and all of its ancestors.
    pub fn branch(&self) -> Self {
        Self {
            scope: Arc::new(WarningScope::child_of(&self.scope)),
            indexes: self.indexes.clone(),
            date: self.date,
            movie: self.movie.clone(),
            vars: self.vars.clone(),
            call_stack: self.call_stack.clone(),
            date_format: self.date_format.clone(),
            date_locale: self.date_locale.clone(),
        }
    }

    pub fn has_parent(&self) -> bool {
        self.scope.parent.is_some()
    }

    pub fn index(&self, dimension: &str) -> Option<usize> {
        self.indexes.get(dimension).copied()
    }

    pub fn set_index(&mut self, dimension: &str, value: usize) {
        self.indexes.insert(dimension.to_string(), value);
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn set_var(&mut self, name: &str, value: impl Into<Value>) {
        self.vars.insert(name.to_string(), value.into());
    }

    pub fn push_frame(&mut self, frame: &str) {
        self.call_stack.push(frame.to_string());
    }

    pub fn pop_frame(&mut self) -> Option<String> {
        self.call_stack.pop()
    }

    pub fn call_stack(&self) -> &[String] {
        &self.call_stack
    }

    /// Record a warning here and on every ancestor
    pub fn add_warning(&self, code: &str, message: impl Into<String>) {
        let warning = ScrapeWarning {
            code: code.to_string(),
            message: message.into(),
            location: self.call_stack.join(" > "),
        };
        warn!(code = %warning.code, location = %warning.location, "{}", warning.message);
        self.scope.record(&warning);
    }

    /// Warnings recorded on this context or any of its descendants
    pub fn warnings(&self) -> Vec<ScrapeWarning> {
        self.scope.snapshot()
    }

    /// Resolve a dotted path such as `indexes.tab`, `movie.title`,
    /// `cinema.rooms[0].name` or `date`
    pub fn lookup(&self, path: &str) -> Option<ContextValue> {
        let mut segments = split_path(path).into_iter();
        let head = segments.next()?;
        let rest: Vec<PathSegment> = segments.collect();

        match head {
            PathSegment::Key(key) if key == "date" && rest.is_empty() => self.date.map(ContextValue::Date),
            PathSegment::Key(key) if key == "indexes" => match rest.as_slice() {
                [] => Some(ContextValue::Json(
                    serde_json::to_value(&self.indexes).unwrap_or(Value::Null),
                )),
                [PathSegment::Key(dimension)] => self.index(dimension).map(|i| ContextValue::Json(Value::from(i))),
                _ => None,
            },
            PathSegment::Key(key) if key == "movie" => {
                walk(self.movie.as_ref()?, &rest).cloned().map(ContextValue::Json)
            }
            PathSegment::Key(key) => walk(self.vars.get(&key)?, &rest).cloned().map(ContextValue::Json),
            PathSegment::Index(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Key(String),
    Index(usize),
}

fn split_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    for part in path.split('.').filter(|p| !p.is_empty()) {
        let mut rest = part;
        if let Some(open) = rest.find('[') {
            if open > 0 {
                segments.push(PathSegment::Key(rest[..open].to_string()));
            }
            rest = &rest[open..];
            while let Some(stripped) = rest.strip_prefix('[') {
                let Some(close) = stripped.find(']') else { break };
                let inner = &stripped[..close];
                match inner.parse::<usize>() {
                    Ok(index) => segments.push(PathSegment::Index(index)),
                    Err(_) => segments.push(PathSegment::Key(inner.trim_matches(['"', '\'']).to_string())),
                }
                rest = &stripped[close + 1..];
            }
        } else {
            segments.push(PathSegment::Key(rest.to_string()));
        }
    }
    segments
}

fn walk<'a>(value: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, segment| match segment {
        PathSegment::Key(key) => match current {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        },
        PathSegment::Index(index) => current.as_array().and_then(|items| items.get(*index)),
    })
}
