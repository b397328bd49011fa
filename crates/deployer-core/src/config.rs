use crate::error::{DeployerError, Result};
use crate::types::{Address, Amount};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Caller-supplied deployment configuration.
///
/// Top-level keys are either component names (an override address, or a
/// parameter block) or plain values such as an existing token address. The
/// document is only checked for shape on load; each step asks for the fields
/// it needs when it runs, and a missing field is reported by its dotted path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    entries: Map<String, Value>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| DeployerError::ConfigSource {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let parsed = if is_yaml {
            Self::from_yaml_str(&data)
        } else {
            Self::from_json_str(&data)
        };
        parsed.map_err(|e| DeployerError::ConfigSource {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn from_json_str(data: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(data)?;
        Self::from_value(value)
    }

    pub fn from_yaml_str(data: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(data)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            Value::Null => Ok(Self::default()),
            other => Err(DeployerError::config(
                "<root>",
                format!("expected a keyed mapping, found {}", type_name(&other)),
            )),
        }
    }

    /// Builder-style setter, mostly for tests and programmatic callers.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    // -----------------------------------------------------------------------
    // Overrides
    // -----------------------------------------------------------------------

    /// The pre-existing address configured for `component`, if any.
    ///
    /// Empty strings, `null` and `false` mean "deploy it". A parameter block
    /// is not an override.
    pub fn override_for(&self, component: &str) -> Result<Option<Address>> {
        match self.entries.get(component) {
            Some(Value::String(s)) if !s.trim().is_empty() => Address::parse(s)
                .map(Some)
                .map_err(|_| {
                    DeployerError::config(component, format!("override '{s}' is not an address"))
                }),
            _ => Ok(None),
        }
    }

    // -----------------------------------------------------------------------
    // Path lookups
    // -----------------------------------------------------------------------

    /// Resolve a dotted path (`farm_param.fund`). Unset values (`null`, `""`)
    /// are reported as absent.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.entries.get(first)?;
        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        if is_unset(current) {
            None
        } else {
            Some(current)
        }
    }

    /// Truthiness of a value: absent, `false`, `0` and `"0"` are all unset.
    pub fn is_set(&self, path: &str) -> bool {
        match self.lookup(path) {
            Some(Value::Bool(b)) => *b,
            Some(v) => !Amount::from_value(v).is_some_and(|a| a.is_zero()),
            None => false,
        }
    }

    pub fn require(&self, path: &str) -> Result<&Value> {
        self.lookup(path)
            .ok_or_else(|| DeployerError::config(path, "required field is missing"))
    }

    pub fn require_address(&self, path: &str) -> Result<Address> {
        value_as_address(path, self.require(path)?)
    }

    pub fn require_amount(&self, path: &str) -> Result<Amount> {
        value_as_amount(path, self.require(path)?)
    }

    pub fn require_u64(&self, path: &str) -> Result<u64> {
        value_as_u64(path, self.require(path)?)
    }

    pub fn optional_u64(&self, path: &str) -> Result<Option<u64>> {
        self.lookup(path).map(|v| value_as_u64(path, v)).transpose()
    }

    pub fn require_list(&self, path: &str) -> Result<&[Value]> {
        match self.require(path)? {
            Value::Array(items) => Ok(items),
            other => Err(DeployerError::config(
                path,
                format!("expected a list, found {}", type_name(other)),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Value coercions (shared with per-item arguments)
// ---------------------------------------------------------------------------

pub(crate) fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

pub(crate) fn value_as_address(path: &str, value: &Value) -> Result<Address> {
    match value {
        Value::String(s) => Address::parse(s)
            .map_err(|_| DeployerError::config(path, format!("'{s}' is not an address"))),
        other => Err(DeployerError::config(
            path,
            format!("expected an address, found {}", type_name(other)),
        )),
    }
}

pub(crate) fn value_as_amount(path: &str, value: &Value) -> Result<Amount> {
    Amount::from_value(value).ok_or_else(|| {
        DeployerError::config(
            path,
            "expected a non-negative integer (use a string for values above 2^64)",
        )
    })
}

pub(crate) fn value_as_u64(path: &str, value: &Value) -> Result<u64> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| DeployerError::config(path, "expected an unsigned 64-bit integer"))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
