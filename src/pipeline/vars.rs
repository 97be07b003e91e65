//! Variable bindings and the parameter manifest.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Value bound to a model variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    /// Boolean literal.
    Boolean(bool),
    /// Numeric literal.
    Number(f64),
    /// String literal.
    String(String),
    /// Vector of values.
    Array(Vec<VarValue>),
}

/// Variable bindings keyed by name, in a stable order.
pub type VarBindings = BTreeMap<String, VarValue>;

impl fmt::Display for VarValue {
    /// Render as a tool literal: strings quoted, arrays bracketed and
    /// comma-joined, everything else as its literal text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write_number(f, *n),
            Self::String(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    if matches!(c, '"' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")
            }
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Number literal as the tool's own number printer spells it.
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        // Negative zero prints as plain zero.
        f.write_str("0")
    } else {
        write!(f, "{n}")
    }
}

impl From<bool> for VarValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for VarValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for VarValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for VarValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for VarValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for VarValue {
    fn from(value: Vec<T>) -> Self {
        Self::Array(value.into_iter().map(Into::into).collect())
    }
}

/// Format a value as a tool literal.
#[must_use]
pub fn format_value(value: &VarValue) -> String {
    value.to_string()
}

/// `-D<name>=<literal>` arguments for every binding.
#[must_use]
pub fn define_args(vars: &VarBindings) -> Vec<String> {
    vars.iter()
        .map(|(name, value)| format!("-D{name}={value}"))
        .collect()
}

/// Kind of a customizable parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    /// Free text.
    String,
    /// Number, possibly a vector of numbers.
    Number,
    /// Checkbox.
    Boolean,
}

/// One selectable option of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterOption {
    /// Label shown to the user.
    pub name: String,
    /// Value bound when selected.
    pub value: VarValue,
}

/// One customizable parameter declared by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Variable name.
    pub name: String,
    /// Value kind.
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    /// Description comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Group (tab) the parameter belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Value in the source.
    pub initial: VarValue,
    /// Lower bound for numbers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound for numbers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Step for numbers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    /// Allowed values, when the parameter is a dropdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ParameterOption>>,
}

/// Parameter manifest emitted by the syntax-check mode of the tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    /// Manifest title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Declared parameters.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl ParameterSet {
    /// Parse a manifest from its serialized form.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the content is malformed.
    pub fn from_json_slice(content: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(content)
    }

    /// Find a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}
