use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Market region code (`"caiso"`, `"pjm"`, ...).
///
/// Codes are stored lowercase so `"PJM"` and `"pjm"` name the same region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IsoCode(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IsoCodeError {
    #[error("empty ISO code")]
    Empty,
    #[error("invalid character {ch:?} in ISO code {code:?}")]
    InvalidChar { code: String, ch: char },
}

impl IsoCode {
    pub fn parse(raw: &str) -> Result<Self, IsoCodeError> {
        let code = raw.trim().to_ascii_lowercase();
        if code.is_empty() {
            return Err(IsoCodeError::Empty);
        }
        // Codes travel unescaped inside a comma-separated query value.
        if let Some(ch) = code
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(IsoCodeError::InvalidChar { code, ch });
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IsoCode {
    type Error = IsoCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        IsoCode::parse(&value)
    }
}

impl From<IsoCode> for String {
    fn from(value: IsoCode) -> Self {
        value.0
    }
}

impl fmt::Display for IsoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a rendered feature, as carried in vector tiles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(u64),
    Text(String),
}

impl FeatureId {
    /// Reads an id from a JSON value; floats, negatives and empty strings have no id.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_u64().map(FeatureId::Number),
            serde_json::Value::String(s) if !s.is_empty() => Some(FeatureId::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FeatureId::Number(n) => serde_json::Value::from(*n),
            FeatureId::Text(s) => serde_json::Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Number(n) => write!(f, "{n}"),
            FeatureId::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FeatureId, IsoCode, IsoCodeError};
    use serde_json::json;

    #[test]
    fn iso_codes_normalize_to_lowercase() {
        let code = IsoCode::parse(" PJM ").expect("valid");
        assert_eq!(code.as_str(), "pjm");
        assert_eq!(code, IsoCode::parse("pjm").expect("valid"));
    }

    #[test]
    fn iso_codes_reject_query_metacharacters() {
        assert_eq!(IsoCode::parse(""), Err(IsoCodeError::Empty));
        assert!(matches!(
            IsoCode::parse("pjm,miso"),
            Err(IsoCodeError::InvalidChar { ch: ',', .. })
        ));
        assert!(IsoCode::parse("a&b").is_err());
    }

    #[test]
    fn iso_code_deserializes_through_validation() {
        let ok: IsoCode = serde_json::from_value(json!("CAISO")).expect("valid");
        assert_eq!(ok.as_str(), "caiso");
        assert!(serde_json::from_value::<IsoCode>(json!("x y")).is_err());
    }

    #[test]
    fn feature_id_from_json() {
        assert_eq!(FeatureId::from_json(&json!(7)), Some(FeatureId::Number(7)));
        assert_eq!(
            FeatureId::from_json(&json!("sub-1")),
            Some(FeatureId::Text("sub-1".into()))
        );
        assert_eq!(FeatureId::from_json(&json!(-1)), None);
        assert_eq!(FeatureId::from_json(&json!("")), None);
        assert_eq!(FeatureId::from_json(&json!(null)), None);
    }
}
