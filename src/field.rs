use crate::caller::CallerInfo;
use crate::error::{LogError, Result};
use crate::record::{LogRecord, Severity, CALLER, DATA, MESSAGE, TIMESTAMP, TYPE};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Turns a raw field value into the text placed in the log line.
pub type FieldRenderer = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Field name to renderer.
///
/// A logger holds two of these, one for required and one for optional
/// fields, and the union of their names is everything a record may carry.
#[derive(Clone, Default)]
pub struct FieldRegistry {
    renderers: BTreeMap<String, FieldRenderer>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the renderer for `name`.
    pub fn insert<F>(&mut self, name: impl Into<String>, renderer: F) -> &mut Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.renderers.insert(name.into(), Arc::new(renderer));
        self
    }

    pub fn with<F>(mut self, name: impl Into<String>, renderer: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.insert(name, renderer);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldRenderer> {
        self.renderers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.renderers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.renderers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    /// Move every entry of `other` into `self`, failing on the first name
    /// both registries define.
    pub fn merge(&mut self, other: FieldRegistry) -> Result<()> {
        if let Some(name) = other.names().find(|name| self.contains(name)) {
            return Err(LogError::DuplicateField(name.to_string()));
        }
        self.renderers.extend(other.renderers);
        Ok(())
    }

    /// First name present in both registries, if any.
    pub fn overlap<'a>(&'a self, other: &FieldRegistry) -> Option<&'a str> {
        self.names().find(|name| other.contains(name))
    }
}

impl fmt::Debug for FieldRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Resolved field strings for one record, keyed by field name.
pub type RenderedFields = BTreeMap<String, String>;

/// Validate `record` against the registries and render every field it
/// carries.
///
/// Required fields missing from the record fail with
/// [`LogError::MissingRequiredField`]; record keys known to neither registry
/// fail with [`LogError::UnknownField`]. Optional fields the record does not
/// carry are simply left out of the result.
pub fn resolve(
    record: &LogRecord,
    required: &FieldRegistry,
    optional: &FieldRegistry,
) -> Result<RenderedFields> {
    if let Some(missing) = required.names().find(|name| record.get(name).is_none()) {
        return Err(LogError::MissingRequiredField(missing.to_string()));
    }

    let mut rendered = RenderedFields::new();
    for (name, value) in record.iter() {
        let renderer = required
            .get(name)
            .or_else(|| optional.get(name))
            .ok_or_else(|| LogError::UnknownField(name.clone()))?;
        rendered.insert(name.clone(), renderer(value));
    }
    Ok(rendered)
}

/// Plain text for a raw value: strings without quotes, null as empty,
/// everything else as JSON.
pub fn plain_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Remove every space, CR and LF so multi-line dumps fit one log line.
pub fn strip_whitespace(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, ' ' | '\r' | '\n'))
        .collect()
}

/// Renderer for `type`: one of the severity strings, else `info`.
pub fn render_type(value: &Value) -> String {
    Severity::normalize(&plain_text(value)).as_str().to_string()
}

/// Renderer for `message`: the text as-is.
pub fn render_message(value: &Value) -> String {
    plain_text(value)
}

/// Renderer for `data`: pretty-printed, then collapsed onto one line.
pub fn render_data(value: &Value) -> String {
    let text = match value {
        Value::Null => return String::new(),
        Value::Array(items) if items.is_empty() => return String::new(),
        Value::Object(map) if map.is_empty() => return String::new(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    strip_whitespace(&text)
}

/// Renderer for `timestamp`: verbatim when set, otherwise `now()`.
pub fn timestamp_renderer<F>(now: F) -> impl Fn(&Value) -> String + Send + Sync + 'static
where
    F: Fn() -> String + Send + Sync + 'static,
{
    move |value| match plain_text(value) {
        ts if ts.is_empty() => now(),
        ts => ts,
    }
}

/// Renderer for `caller`: verbatim when set, otherwise the call site at
/// `depth` as reported by `info`, or empty when the stack is too shallow.
pub fn caller_renderer(
    info: Arc<dyn CallerInfo>,
    depth: usize,
) -> impl Fn(&Value) -> String + Send + Sync + 'static {
    move |value| match plain_text(value) {
        caller if caller.is_empty() => info
            .caller_at(depth)
            .map(|site| site.to_string())
            .unwrap_or_default(),
        caller => caller,
    }
}

/// Registry of the five fields every logger requires, wired to the given
/// clock and caller provider.
pub fn default_required<F>(now: F, caller_info: Arc<dyn CallerInfo>, depth: usize) -> FieldRegistry
where
    F: Fn() -> String + Send + Sync + 'static,
{
    FieldRegistry::new()
        .with(TIMESTAMP, timestamp_renderer(now))
        .with(TYPE, render_type)
        .with(CALLER, caller_renderer(caller_info, depth))
        .with(MESSAGE, render_message)
        .with(DATA, render_data)
}
