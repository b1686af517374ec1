use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Key/value pairs loaded from an inlist
pub type InlistMap = BTreeMap<String, InlistValue>;

/// A typed inlist value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InlistValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<InlistValue>),
    Tuple(Vec<InlistValue>),
    Table(InlistMap),
}

impl InlistValue {
    /// Short type name used in logs and diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            InlistValue::None => "none",
            InlistValue::Bool(_) => "bool",
            InlistValue::Int(_) => "int",
            InlistValue::Float(_) => "float",
            InlistValue::Str(_) => "string",
            InlistValue::List(_) => "list",
            InlistValue::Tuple(_) => "tuple",
            InlistValue::Table(_) => "table",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, InlistValue::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            InlistValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            InlistValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, and integers widened to floats
    pub fn as_float(&self) -> Option<f64> {
        match self {
            InlistValue::Float(f) => Some(*f),
            InlistValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            InlistValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a list or a tuple
    pub fn as_slice(&self) -> Option<&[InlistValue]> {
        match self {
            InlistValue::List(items) | InlistValue::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&InlistMap> {
        match self {
            InlistValue::Table(t) => Some(t),
            _ => None,
        }
    }
}

impl From<bool> for InlistValue {
    fn from(v: bool) -> Self {
        InlistValue::Bool(v)
    }
}

impl From<i64> for InlistValue {
    fn from(v: i64) -> Self {
        InlistValue::Int(v)
    }
}

impl From<f64> for InlistValue {
    fn from(v: f64) -> Self {
        InlistValue::Float(v)
    }
}

impl From<&str> for InlistValue {
    fn from(v: &str) -> Self {
        InlistValue::Str(v.to_string())
    }
}

impl From<String> for InlistValue {
    fn from(v: String) -> Self {
        InlistValue::Str(v)
    }
}

impl<T: Into<InlistValue>> From<Vec<T>> for InlistValue {
    fn from(v: Vec<T>) -> Self {
        InlistValue::List(v.into_iter().map(Into::into).collect())
    }
}

/// A loaded inlist together with where it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlistDocument {
    pub values: InlistMap,
    pub meta: InlistMetadata,
}

/// Metadata about a loaded inlist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlistMetadata {
    pub source: InlistSource,
    /// Id of the backend that produced the values
    pub format: String,
    /// Defaults file layered underneath the values, if any
    pub defaults_path: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Source of the loaded inlist
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InlistSource {
    LocalPath(String),
    Uploaded { original_name: String },
}

/// Builder for constructing an InlistDocument in a fluent style
pub struct DocumentBuilder {
    source: InlistSource,
    format: String,
    defaults_path: Option<String>,
    loaded_at: Option<DateTime<Utc>>,
    values: InlistMap,
}

impl DocumentBuilder {
    /// Create a new builder for values read from `source` by backend `format`
    pub fn new<F: Into<String>>(source: InlistSource, format: F) -> Self {
        Self {
            source,
            format: format.into(),
            defaults_path: None,
            loaded_at: Some(Utc::now()),
            values: InlistMap::new(),
        }
    }

    /// Record the defaults file applied beneath the values
    pub fn defaults_path<T: Into<String>>(mut self, path: T) -> Self {
        self.defaults_path = Some(path.into());
        self
    }

    /// Override the load timestamp
    pub fn loaded_at(mut self, loaded_at: DateTime<Utc>) -> Self {
        self.loaded_at = Some(loaded_at);
        self
    }

    /// Set the loaded values
    pub fn values(mut self, values: InlistMap) -> Self {
        self.values = values;
        self
    }

    pub fn build(self) -> InlistDocument {
        InlistDocument {
            values: self.values,
            meta: InlistMetadata {
                source: self.source,
                format: self.format,
                defaults_path: self.defaults_path,
                loaded_at: self.loaded_at,
            },
        }
    }
}
