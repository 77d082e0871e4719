pub mod canonical;
pub mod key;
pub mod policy;

use rocket::http::RawStr;
use serde::Serialize;
use serde_json::{Map, Value};

pub use key::CacheKey;
pub use policy::Bypass;

/// A single query parameter after best-effort JSON parsing.
pub type ParameterValue = Value;

/// How query values are unescaped before they are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeMode {
    /// Values are used exactly as the HTTP layer decoded them.
    Standard,
    /// Values are percent-decoded one more time, for clients that
    /// double-encode their query strings.
    Overescape,
}

/// The generation parameters of one request, keyed by parameter name.
///
/// Serializes as a plain JSON object, which is the body sent upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParameterSet(Map<String, ParameterValue>);

impl ParameterSet {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Fold decoded query pairs into a parameter set. Later duplicates win.
    pub fn from_query<I, K, V>(pairs: I, mode: EscapeMode) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut params = Self::new();
        for (name, raw) in pairs {
            let raw = raw.as_ref();
            let value = match mode {
                EscapeMode::Standard => parse_value(raw),
                EscapeMode::Overescape => parse_value(&RawStr::new(raw).percent_decode_lossy()),
            };
            params.insert(name, value);
        }
        params
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParameterValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<ParameterValue> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterValue)> {
        self.0.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, ParameterValue)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (K, ParameterValue)>>(iter: T) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

/// Interpret a raw query value as a JSON literal, keeping the raw string
/// when it is not one.
///
/// Integer literals outside the 64-bit range are kept as strings rather than
/// rounded to a float, so seeds and similar ids are never altered.
pub fn parse_value(raw: &str) -> ParameterValue {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) if value.is_f64() && is_integer_literal(raw) => Value::String(raw.to_string()),
        Ok(value) => value,
        Err(_) => Value::String(raw.to_string()),
    }
}

fn is_integer_literal(raw: &str) -> bool {
    let digits = raw.trim();
    let digits = digits.strip_prefix('-').unwrap_or(digits);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
