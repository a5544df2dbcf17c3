use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Field names every record must carry.
pub const TIMESTAMP: &str = "timestamp";
pub const TYPE: &str = "type";
pub const CALLER: &str = "caller";
pub const MESSAGE: &str = "message";
pub const DATA: &str = "data";

/// The three severities a log entry can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    /// Case-sensitive parse; anything unrecognized is [`Severity::Info`].
    pub fn normalize(raw: &str) -> Severity {
        match raw {
            "warning" => Severity::Warning,
            "error" => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical log event: field name to raw value.
///
/// Values are kept raw (`serde_json::Value`) until a logger resolves them
/// through its field registries. `Value::Null` stands for "absent but
/// present as a key", which is how an empty `data` is passed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogRecord {
    pub fields: BTreeMap<String, Value>,
}

impl LogRecord {
    /// Empty record with no fields at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record with all required fields pre-filled: empty timestamp and
    /// caller (generated/inferred at write time) and null data.
    pub fn entry(severity: Severity, message: impl Into<String>) -> Self {
        Self::new()
            .with_field(TIMESTAMP, "")
            .with_field(TYPE, severity.as_str())
            .with_field(CALLER, "")
            .with_field(MESSAGE, Value::String(message.into()))
            .with_field(DATA, Value::Null)
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_timestamp(self, timestamp: impl Into<String>) -> Self {
        self.with_field(TIMESTAMP, Value::String(timestamp.into()))
    }

    pub fn with_caller(self, caller: impl Into<String>) -> Self {
        self.with_field(CALLER, Value::String(caller.into()))
    }

    pub fn with_data(self, data: impl Into<Value>) -> Self {
        self.with_field(DATA, data)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for LogRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
