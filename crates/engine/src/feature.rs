use foundation::{FeatureId, LatLng};
use serde_json::{Map, Value};

/// Address of one feature for feature-state updates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureRef {
    pub source: String,
    pub source_layer: Option<String>,
    pub id: FeatureId,
}

/// A feature as reported by a hit-test or a pointer event.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFeature {
    /// Style layer the feature was rendered by.
    pub layer: String,
    pub source: String,
    pub source_layer: Option<String>,
    pub id: Option<FeatureId>,
    pub properties: Map<String, Value>,
    /// Point geometry, when the feature is a point.
    pub position: Option<LatLng>,
}

impl RenderedFeature {
    pub fn new(layer: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            source: source.into(),
            source_layer: None,
            id: None,
            properties: Map::new(),
            position: None,
        }
    }

    pub fn with_source_layer(mut self, source_layer: impl Into<String>) -> Self {
        self.source_layer = Some(source_layer.into());
        self
    }

    pub fn with_id(mut self, id: FeatureId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn with_position(mut self, position: LatLng) -> Self {
        self.position = Some(position);
        self
    }

    /// Feature-state address, if the feature carries an id.
    pub fn feature_ref(&self) -> Option<FeatureRef> {
        Some(FeatureRef {
            source: self.source.clone(),
            source_layer: self.source_layer.clone(),
            id: self.id.clone()?,
        })
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key).filter(|v| !v.is_null())
    }

    /// String form of a scalar property; numbers are formatted without quotes.
    pub fn property_text(&self, key: &str) -> Option<String> {
        match self.property(key)? {
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

impl Cursor {
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Default => "",
            Cursor::Pointer => "pointer",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub at: LatLng,
    pub html: String,
}
