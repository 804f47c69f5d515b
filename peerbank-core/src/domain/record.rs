//! Raw records as they arrive from the remote source or the fallback generator.
//!
//! A record is kept in its wire shape (field code → JSON value) so that the
//! cache file is byte-compatible with what the API returned. Typed access goes
//! through [`crate::domain::fields::PeriodFields`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Report date field code (`YYYYMMDD`).
pub const REPORT_DATE_CODE: &str = "REPDTE";
/// Institution certificate number field code.
pub const CERT_CODE: &str = "CERT";
/// Institution legal name field code.
pub const NAME_CODE: &str = "NAME";

/// One raw record: a mapping of field code to raw value.
///
/// Used both for institution records (`NAME`, `CERT`) and for quarterly
/// period records (`REPDTE` plus the financial field codes).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

/// A quarterly financial snapshot for one entity.
pub type RawPeriodRecord = RawRecord;

/// An institution lookup record.
pub type InstitutionRecord = RawRecord;

impl RawRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a JSON object. Returns `None` for any other JSON value.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, code: &str) -> Option<&Value> {
        self.0.get(code)
    }

    pub fn insert(&mut self, code: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(code.into(), value.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, code: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(code, value);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field value rendered as text. Numbers are rendered without a fraction
    /// when integral, so `33124` and `"33124"` read the same.
    pub fn text(&self, code: &str) -> Option<String> {
        match self.0.get(code)? {
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Some(i.to_string()),
                (None, Some(u)) => Some(u.to_string()),
                _ => n.as_f64().map(|f| {
                    if f.fract() == 0.0 {
                        format!("{f:.0}")
                    } else {
                        f.to_string()
                    }
                }),
            },
            _ => None,
        }
    }

    /// Raw report date (`REPDTE`) as text.
    pub fn report_date(&self) -> Option<String> {
        self.text(REPORT_DATE_CODE)
    }

    /// Safe numeric read of a field: see [`safe_numeric`].
    pub fn numeric(&self, code: &str) -> Option<f64> {
        self.0.get(code).and_then(safe_numeric)
    }
}

/// Coerce a raw JSON value to a finite number.
///
/// Numbers pass through; strings are trimmed and parsed. Nulls, booleans,
/// containers, unparsable text and non-finite results all yield `None`.
pub fn safe_numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Total coercion: anything that is not a finite number becomes `0.0`.
pub fn safe_float(value: Option<&Value>) -> f64 {
    value.and_then(safe_numeric).unwrap_or(0.0)
}
